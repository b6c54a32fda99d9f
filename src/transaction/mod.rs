//! Transactions are the income and expense events recorded against
//! accounts. Amounts are stored as non-negative magnitudes; the direction
//! of the money flow comes from the transaction type combined with the
//! account type.

pub mod bulk_edit;
pub mod core;
pub mod endpoints;
pub mod query;

pub use bulk_edit::{BulkEditOutcome, BulkEditRow, apply_bulk_edit};
pub use core::{
    NewTransaction, Transaction, TransactionType, TransactionUpdate, create_transaction,
    create_transaction_table, delete_transaction, map_row_to_transaction, update_transaction,
};
pub use endpoints::{
    bulk_edit_endpoint, create_transaction_endpoint, delete_transaction_endpoint,
    query_transactions_endpoint, update_transaction_endpoint,
};
pub use query::{MAX_QUERY_ROWS, TransactionFilter, TransactionTableRow, query_transactions};
