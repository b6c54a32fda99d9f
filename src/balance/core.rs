//! Defines the core data model and database queries for opening balances.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AccountId, BalanceId},
    period::Period,
    user::UserID,
};

/// The amount of money an account held at the start of a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningBalance {
    /// The ID of the opening balance row.
    pub id: BalanceId,
    /// The month the balance applies to.
    pub month: Period,
    /// The account the balance belongs to.
    pub account_id: AccountId,
    /// The amount of money at the start of the month.
    pub opening: f64,
    /// The ID of the user that owns the balance.
    pub user_id: UserID,
}

/// Create the balance table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_balance_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS balance (
            id INTEGER PRIMARY KEY,
            month INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            opening REAL NOT NULL,
            user_id INTEGER NOT NULL,
            FOREIGN KEY (account_id) REFERENCES account (id),
            FOREIGN KEY (user_id) REFERENCES user (id)
        )",
        (),
    )?;

    Ok(())
}

/// Convert a database row into an [OpeningBalance].
///
/// Expects the columns `id, month, account_id, opening, user_id` in order.
pub fn map_row_to_balance(row: &Row) -> Result<OpeningBalance, rusqlite::Error> {
    let id = row.get(0)?;
    let month = row.get(1)?;
    let account_id = row.get(2)?;
    let opening = row.get(3)?;
    let user_id: i64 = row.get(4)?;

    Ok(OpeningBalance {
        id,
        month,
        account_id,
        opening,
        user_id: UserID::new(user_id),
    })
}

const BALANCE_COLUMNS: &str = "id, month, account_id, opening, user_id";

/// Get the opening balance recorded for `period`, `account_id` and `owner`.
///
/// The period may be a month name such as "November" (any casing) or a
/// numeric string such as "11". An unrecognized period is treated as "no
/// opening recorded" and yields `0.0`. This read path never fails on bad
/// input so the monthly summary stays resilient to malformed historical
/// data.
///
/// # Errors
/// Returns [Error::SqlError] if there is an unexpected SQL error.
pub fn get_opening(
    period: &str,
    account_id: AccountId,
    owner: UserID,
    connection: &Connection,
) -> Result<f64, Error> {
    match Period::parse_lenient(period) {
        Some(month) => get_opening_for_month(month, account_id, owner, connection),
        None => {
            tracing::warn!("unrecognized period {period:?}, treating as no opening balance");
            Ok(0.0)
        }
    }
}

/// Get the opening balance recorded for an already-normalized month.
///
/// Returns `0.0` when no balance has been recorded or the stored amount
/// cannot be read as a number. If duplicate rows exist for the same key,
/// the most recently inserted one (highest ID) wins.
///
/// # Errors
/// Returns [Error::SqlError] if there is an unexpected SQL error.
pub fn get_opening_for_month(
    month: Period,
    account_id: AccountId,
    owner: UserID,
    connection: &Connection,
) -> Result<f64, Error> {
    let result = connection
        .prepare(
            "SELECT opening FROM balance
             WHERE month = ?1 AND account_id = ?2 AND user_id = ?3
             ORDER BY id DESC
             LIMIT 1",
        )?
        .query_row(params![month, account_id, owner.as_i64()], |row| {
            Ok(row.get::<_, f64>(0).unwrap_or(0.0))
        });

    match result {
        Ok(opening) => Ok(opening),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0.0),
        Err(error) => Err(error.into()),
    }
}

/// Record the opening balance for `period`, `account_id` and `owner`,
/// overwriting any existing record for the same key.
///
/// This is an upsert: repeated calls with the same key leave exactly one
/// row. Unlike [get_opening], this write path rejects unrecognized periods.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidPeriod] if `period` is not a recognizable month,
/// - [Error::NegativeOpeningBalance] if `opening` is negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_opening(
    period: &str,
    account_id: AccountId,
    opening: f64,
    owner: UserID,
    connection: &Connection,
) -> Result<OpeningBalance, Error> {
    let month = Period::parse(period)?;

    if opening < 0.0 || opening.is_nan() {
        return Err(Error::NegativeOpeningBalance(opening));
    }

    let existing_id = match connection
        .prepare(
            "SELECT id FROM balance
             WHERE month = ?1 AND account_id = ?2 AND user_id = ?3
             ORDER BY id DESC
             LIMIT 1",
        )?
        .query_row(params![month, account_id, owner.as_i64()], |row| {
            row.get::<_, BalanceId>(0)
        }) {
        Ok(id) => Some(id),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(error) => return Err(error.into()),
    };

    match existing_id {
        Some(id) => connection
            .prepare(&format!(
                "UPDATE balance SET opening = ?1 WHERE id = ?2 RETURNING {BALANCE_COLUMNS}"
            ))?
            .query_row(params![opening, id], map_row_to_balance)
            .map_err(Error::from),
        None => connection
            .prepare(&format!(
                "INSERT INTO balance (month, account_id, opening, user_id)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING {BALANCE_COLUMNS}"
            ))?
            .query_row(
                params![month, account_id, opening, owner.as_i64()],
                map_row_to_balance,
            )
            .map_err(Error::from),
    }
}

/// Get all opening balances belonging to `owner`, ordered by month.
///
/// # Errors
/// Returns [Error::SqlError] if there is an unexpected SQL error.
pub fn list_balances(owner: UserID, connection: &Connection) -> Result<Vec<OpeningBalance>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BALANCE_COLUMNS} FROM balance WHERE user_id = :user_id ORDER BY month, id"
        ))?
        .query_map(&[(":user_id", &owner.as_i64())], map_row_to_balance)?
        .map(|balance_result| balance_result.map_err(Error::SqlError))
        .collect()
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_balance_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_balance_table(&connection));
    }
}
