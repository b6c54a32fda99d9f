//! Accounts are the named bank accounts and credit cards that opening
//! balances and transactions are recorded against.

pub mod core;
pub mod endpoints;

pub use core::{
    Account, AccountType, AccountUpdate, NewAccount, count_account_transactions, create_account,
    create_account_table, delete_account, list_accounts, map_row_to_account, update_account,
};
pub use endpoints::{
    create_account_endpoint, delete_account_endpoint, list_accounts_endpoint,
    update_account_endpoint,
};
