//! Opening balances record how much money an account held at the start of
//! a calendar month. The monthly summary applies that month's transactions
//! on top of them.

pub mod core;
pub mod endpoints;

pub use core::{
    OpeningBalance, create_balance_table, get_opening, get_opening_for_month, list_balances,
    map_row_to_balance, set_opening,
};
pub use endpoints::{get_opening_endpoint, list_balances_endpoint, set_opening_endpoint};
