//! Filtered queries over transactions, joined with the owning account's
//! name for display.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::{
    Error,
    database_id::AccountId,
    period::Period,
    transaction::core::TransactionType,
    user::UserID,
};

/// The maximum number of rows a single query returns.
///
/// There is no pagination; results beyond this cap are silently truncated.
pub const MAX_QUERY_ROWS: u64 = 10_000;

/// The composable filters for [query_transactions].
///
/// All supplied filters apply together (AND semantics). A `period` is
/// translated into the month's first/last day range; when explicit
/// `start_date`/`end_date` bounds are also given, both range sets apply and
/// the narrower result wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Include only transactions within this calendar month.
    pub period: Option<Period>,
    /// Include only transactions on or after this date.
    pub start_date: Option<Date>,
    /// Include only transactions on or before this date.
    pub end_date: Option<Date>,
    /// Include only transactions for these accounts.
    pub account_ids: Option<Vec<AccountId>>,
    /// Include only transactions of these types.
    pub types: Option<Vec<TransactionType>>,
}

/// One row of the transactions table: a transaction joined with the name of
/// the account it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionTableRow {
    /// The ID of the transaction. Presentation layers must round-trip this
    /// as an opaque, non-editable column for bulk edits to work.
    pub transaction_id: Uuid,
    /// When the transaction happened.
    pub date: Date,
    /// The account the money moved through.
    pub account_id: AccountId,
    /// The name of that account.
    pub account_name: String,
    /// The spending category.
    pub category: String,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Whether money was spent or received.
    pub transaction_type: TransactionType,
    /// The amount of money as a non-negative magnitude.
    pub amount: f64,
}

fn map_row_to_table_row(row: &Row) -> Result<TransactionTableRow, rusqlite::Error> {
    let raw_id: String = row.get(0)?;
    let transaction_id = Uuid::parse_str(&raw_id).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(TransactionTableRow {
        transaction_id,
        date: row.get(1)?,
        account_id: row.get(2)?,
        account_name: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        transaction_type: row.get(6)?,
        amount: row.get(7)?,
    })
}

/// Get the transactions belonging to `owner` that match `filter`, newest
/// first.
///
/// `year` is the calendar year a `period` filter is resolved against;
/// callers pass the current local year.
///
/// # Errors
/// Returns [Error::SqlError] if there is an unexpected SQL error.
pub fn query_transactions(
    filter: &TransactionFilter,
    year: i32,
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<TransactionTableRow>, Error> {
    let mut conditions = vec!["\"transaction\".user_id = ?".to_owned()];
    let mut sql_params: Vec<Value> = vec![Value::Integer(owner.as_i64())];

    if let Some(period) = filter.period {
        conditions.push("\"transaction\".date >= ?".to_owned());
        sql_params.push(Value::Text(period.first_day(year).to_string()));
        conditions.push("\"transaction\".date <= ?".to_owned());
        sql_params.push(Value::Text(period.last_day(year).to_string()));
    }

    if let Some(start_date) = filter.start_date {
        conditions.push("\"transaction\".date >= ?".to_owned());
        sql_params.push(Value::Text(start_date.to_string()));
    }

    if let Some(end_date) = filter.end_date {
        conditions.push("\"transaction\".date <= ?".to_owned());
        sql_params.push(Value::Text(end_date.to_string()));
    }

    if let Some(account_ids) = &filter.account_ids {
        let placeholders = vec!["?"; account_ids.len()].join(", ");
        conditions.push(format!("\"transaction\".account_id IN ({placeholders})"));
        sql_params.extend(account_ids.iter().map(|id| Value::Integer(*id)));
    }

    if let Some(types) = &filter.types {
        let placeholders = vec!["?"; types.len()].join(", ");
        conditions.push(format!("\"transaction\".transaction_type IN ({placeholders})"));
        sql_params.extend(
            types
                .iter()
                .map(|transaction_type| Value::Text(transaction_type.as_str().to_owned())),
        );
    }

    // Sort by date, and then ID to keep transaction order stable after updates.
    let query = format!(
        "SELECT \"transaction\".id, \"transaction\".date, \"transaction\".account_id, \
         account.name, category, description, transaction_type, amount \
         FROM \"transaction\" \
         INNER JOIN account ON \"transaction\".account_id = account.id \
         WHERE {} \
         ORDER BY \"transaction\".date DESC, \"transaction\".id ASC \
         LIMIT {MAX_QUERY_ROWS}",
        conditions.join(" AND ")
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(sql_params), map_row_to_table_row)?
        .map(|row_result| row_result.map_err(Error::SqlError))
        .collect()
}
