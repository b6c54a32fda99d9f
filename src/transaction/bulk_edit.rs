//! Applies a bulk edit of the transactions table in one call.
//!
//! The presentation layer shows an editable table of transaction rows and
//! submits the whole edited set back. Rows without a transaction ID are new
//! and get inserted; rows that were shown but are missing from the
//! submission were removed by the user and get deleted; everything else is
//! a full-field update.

use std::collections::HashSet;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::{
    Error,
    database_id::AccountId,
    transaction::core::{
        NewTransaction, TransactionType, TransactionUpdate, create_transaction,
        delete_transaction, update_transaction,
    },
    user::UserID,
};

/// One submitted row of a bulk edit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BulkEditRow {
    /// The ID of an existing transaction, or `None` for a newly added row.
    #[serde(default)]
    pub transaction_id: Option<Uuid>,
    /// When the transaction happened.
    pub date: Date,
    /// The account the money moved through.
    pub account_id: AccountId,
    /// The spending category.
    pub category: String,
    /// A text description of what the transaction was for.
    #[serde(default)]
    pub description: String,
    /// Whether money was spent or received.
    pub transaction_type: TransactionType,
    /// The amount of money, must be greater than zero.
    pub amount: f64,
}

/// What a bulk edit did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkEditOutcome {
    /// The number of newly inserted transactions.
    pub created: usize,
    /// The number of updated transactions.
    pub updated: usize,
    /// The number of deleted transactions.
    pub deleted: usize,
}

/// Apply a bulk edit for `owner`.
///
/// `previous_ids` are the transaction IDs that were shown to the user;
/// any of them missing from `rows` is deleted. Rows with no
/// `transaction_id` are inserted as new transactions; the rest are updated
/// in full. The whole edit is applied inside one SQL transaction so a
/// failing row leaves the store unchanged.
///
/// Rows that carry an ID which no longer matches anything (e.g. deleted
/// from another session) are skipped rather than treated as errors.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if any row's amount is zero or negative,
/// - [Error::NotFound] if any row references an account that does not
///   exist or belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn apply_bulk_edit(
    previous_ids: &[Uuid],
    rows: &[BulkEditRow],
    owner: UserID,
    connection: &Connection,
) -> Result<BulkEditOutcome, Error> {
    let submitted_ids: HashSet<Uuid> = rows
        .iter()
        .filter_map(|row| row.transaction_id)
        .collect();

    let sql_transaction = connection.unchecked_transaction()?;
    let mut outcome = BulkEditOutcome::default();

    for id in previous_ids {
        if !submitted_ids.contains(id)
            && delete_transaction(*id, owner, &sql_transaction)?.is_some()
        {
            outcome.deleted += 1;
        }
    }

    for row in rows {
        match row.transaction_id {
            None => {
                create_transaction(
                    &NewTransaction {
                        date: row.date,
                        account_id: row.account_id,
                        category: row.category.clone(),
                        description: row.description.clone(),
                        transaction_type: row.transaction_type,
                        amount: row.amount,
                    },
                    owner,
                    &sql_transaction,
                )?;
                outcome.created += 1;
            }
            Some(id) => {
                let changes = TransactionUpdate {
                    date: Some(row.date),
                    account_id: Some(row.account_id),
                    category: Some(row.category.clone()),
                    description: Some(row.description.clone()),
                    transaction_type: Some(row.transaction_type),
                    amount: Some(row.amount),
                };

                if update_transaction(id, &changes, owner, &sql_transaction)?.is_some() {
                    outcome.updated += 1;
                }
            }
        }
    }

    sql_transaction.commit()?;

    Ok(outcome)
}
