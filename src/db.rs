//! Database initialization for the application's domain models.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, account::create_account_table, balance::create_balance_table,
    transaction::create_transaction_table, user::create_user_table,
};

/// Create the tables for the domain models.
///
/// The tables are created inside a single exclusive transaction so a
/// half-initialized database is never left behind.
///
/// # Errors
/// Returns an error if a table could not be created or if there is an SQL
/// error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&sql_transaction)?;
    create_account_table(&sql_transaction)?;
    create_balance_table(&sql_transaction)?;
    create_transaction_table(&sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn creates_all_tables() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), initialize(&connection));
    }

    #[test]
    fn is_idempotent() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        initialize(&connection).unwrap();

        assert_eq!(Ok(()), initialize(&connection));
    }
}
