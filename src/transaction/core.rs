//! Defines the core data model and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, params, params_from_iter,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::{Error, database_id::AccountId, user::UserID};

/// Whether a transaction records money leaving or entering an account.
///
/// On a credit account an "income" transaction records a payment toward the
/// card rather than literal income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money spent.
    Expense,
    /// Money received, or a payment toward a credit card.
    Income,
}

impl TransactionType {
    /// The transaction type as the lowercase string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            _ => Err(Error::InvalidTransactionType(value.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            other => Err(FromSqlError::Other(
                format!("\"{other}\" is not a valid transaction type").into(),
            )),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Transactions are identified by a UUID rather than a sequential key so
/// that inserts and deletes during bulk edits cannot collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: Uuid,
    /// When the transaction happened.
    pub date: Date,
    /// The account the money moved through.
    pub account_id: AccountId,
    /// The spending category, e.g. "Food", "Rent", "Salary".
    pub category: String,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Whether money was spent or received.
    pub transaction_type: TransactionType,
    /// The amount of money as a non-negative magnitude.
    pub amount: f64,
    /// The ID of the user that owns the transaction.
    pub user_id: UserID,
}

/// The fields needed to create a new transaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTransaction {
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

/// A partial update to a transaction.
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionUpdate {
    /// A new date.
    pub date: Option<Date>,
    /// A new account.
    pub account_id: Option<AccountId>,
    /// A new category.
    pub category: Option<String>,
    /// A new description.
    pub description: Option<String>,
    /// A new transaction type.
    pub transaction_type: Option<TransactionType>,
    /// A new amount, must be greater than zero.
    pub amount: Option<f64>,
}

impl TransactionUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.account_id.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.transaction_type.is_none()
            && self.amount.is_none()
    }
}

/// Create the transaction table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            account_id INTEGER NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            transaction_type TEXT NOT NULL,
            amount REAL NOT NULL,
            user_id INTEGER NOT NULL,
            FOREIGN KEY (account_id) REFERENCES account (id),
            FOREIGN KEY (user_id) REFERENCES user (id)
        )",
        (),
    )?;

    Ok(())
}

/// Convert a database row into a [Transaction].
///
/// Expects the columns `id, date, account_id, category, description,
/// transaction_type, amount, user_id` in order.
pub fn map_row_to_transaction(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_id: String = row.get(0)?;
    let id = Uuid::parse_str(&raw_id).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(error))
    })?;

    let date = row.get(1)?;
    let account_id = row.get(2)?;
    let category = row.get(3)?;
    let description = row.get(4)?;
    let transaction_type = row.get(5)?;
    let amount = row.get(6)?;
    let user_id: i64 = row.get(7)?;

    Ok(Transaction {
        id,
        date,
        account_id,
        category,
        description,
        transaction_type,
        amount,
        user_id: UserID::new(user_id),
    })
}

const TRANSACTION_COLUMNS: &str =
    "id, date, account_id, category, description, transaction_type, amount, user_id";

/// Check that `account_id` exists and belongs to `owner`.
///
/// # Errors
/// Returns [Error::NotFound] otherwise; a missing account and another
/// user's account are indistinguishable on purpose.
pub(crate) fn assert_account_ownership(
    account_id: AccountId,
    owner: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match connection
        .prepare("SELECT id FROM account WHERE id = ?1 AND user_id = ?2")?
        .query_row(params![account_id, owner.as_i64()], |row| {
            row.get::<_, AccountId>(0)
        }) {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::NotFound),
        Err(error) => Err(error.into()),
    }
}

/// Create a new transaction for `owner` with a freshly generated UUID.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - [Error::NotFound] if the referenced account does not exist or belongs
///   to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    form: &NewTransaction,
    owner: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if !(form.amount > 0.0) {
        return Err(Error::NonPositiveAmount(form.amount));
    }

    assert_account_ownership(form.account_id, owner, connection)?;

    let id = Uuid::new_v4();

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (id, date, account_id, category, description, transaction_type, amount, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                id.to_string(),
                form.date,
                form.account_id,
                form.category,
                form.description,
                form.transaction_type,
                form.amount,
                owner.as_i64()
            ],
            map_row_to_transaction,
        )
        .map_err(Error::from)
}

/// Update the transaction matching both `id` and `owner`.
///
/// Returns `Ok(None)` without touching the store when `changes` is empty,
/// and `Ok(None)` when no row matches, i.e. the transaction does not exist
/// or belongs to another user.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if a new amount is zero or negative,
/// - [Error::NotFound] if a new account does not exist or belongs to
///   another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: Uuid,
    changes: &TransactionUpdate,
    owner: UserID,
    connection: &Connection,
) -> Result<Option<Transaction>, Error> {
    if changes.is_empty() {
        return Ok(None);
    }

    if let Some(amount) = changes.amount
        && !(amount > 0.0)
    {
        return Err(Error::NonPositiveAmount(amount));
    }

    if let Some(account_id) = changes.account_id {
        assert_account_ownership(account_id, owner, connection)?;
    }

    let mut set_clauses = Vec::new();
    let mut sql_params: Vec<Value> = Vec::new();

    if let Some(date) = changes.date {
        set_clauses.push("date = ?");
        sql_params.push(Value::Text(date.to_string()));
    }

    if let Some(account_id) = changes.account_id {
        set_clauses.push("account_id = ?");
        sql_params.push(Value::Integer(account_id));
    }

    if let Some(category) = &changes.category {
        set_clauses.push("category = ?");
        sql_params.push(Value::Text(category.clone()));
    }

    if let Some(description) = &changes.description {
        set_clauses.push("description = ?");
        sql_params.push(Value::Text(description.clone()));
    }

    if let Some(transaction_type) = changes.transaction_type {
        set_clauses.push("transaction_type = ?");
        sql_params.push(Value::Text(transaction_type.as_str().to_owned()));
    }

    if let Some(amount) = changes.amount {
        set_clauses.push("amount = ?");
        sql_params.push(Value::Real(amount));
    }

    sql_params.push(Value::Text(id.to_string()));
    sql_params.push(Value::Integer(owner.as_i64()));

    let query = format!(
        "UPDATE \"transaction\" SET {} WHERE id = ? AND user_id = ? RETURNING {TRANSACTION_COLUMNS}",
        set_clauses.join(", ")
    );

    match connection
        .prepare(&query)?
        .query_row(params_from_iter(sql_params), map_row_to_transaction)
    {
        Ok(transaction) => Ok(Some(transaction)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Delete the transaction matching both `id` and `owner`.
///
/// Returns the deleted transaction, or `None` when no row matches.
///
/// # Errors
/// Returns [Error::SqlError] if there is an unexpected SQL error.
pub fn delete_transaction(
    id: Uuid,
    owner: UserID,
    connection: &Connection,
) -> Result<Option<Transaction>, Error> {
    match connection
        .prepare(&format!(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2 RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(params![id.to_string(), owner.as_i64()], map_row_to_transaction)
    {
        Ok(transaction) => Ok(Some(transaction)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}
