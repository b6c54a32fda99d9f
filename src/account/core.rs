//! Defines the core data model and database queries for accounts.

use rusqlite::{
    Connection, Row, params, params_from_iter,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::AccountId, user::UserID};

/// Whether an account holds the user's own money or borrowed money.
///
/// The distinction drives the sign convention in the monthly summary: a
/// debit account's balance grows with income, a credit account's
/// outstanding balance grows with spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// A bank account holding the user's own money.
    Debit,
    /// A credit card whose balance is money owed.
    Credit,
}

impl AccountType {
    /// The account type as the lowercase string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Debit => "debit",
            AccountType::Credit => "credit",
        }
    }
}

impl ToSql for AccountType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "debit" => Ok(AccountType::Debit),
            "credit" => Ok(AccountType::Credit),
            other => Err(FromSqlError::Other(
                format!("\"{other}\" is not a valid account type").into(),
            )),
        }
    }
}

/// A bank account or credit card that transactions are recorded against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The account name, unique per user.
    pub name: String,
    /// Whether this is a debit account or a credit card.
    pub account_type: AccountType,
    /// Free-form notes about the account.
    pub notes: String,
    /// The ID of the user that owns the account.
    pub user_id: UserID,
}

/// The fields needed to create a new account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAccount {
    /// The account name.
    pub name: String,
    /// Whether this is a debit account or a credit card.
    pub account_type: AccountType,
    /// Free-form notes about the account.
    #[serde(default)]
    pub notes: String,
}

/// A partial update to an account.
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AccountUpdate {
    /// A new account name.
    pub name: Option<String>,
    /// A new account type.
    pub account_type: Option<AccountType>,
    /// New notes.
    pub notes: Option<String>,
}

impl AccountUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.account_type.is_none() && self.notes.is_none()
    }
}

/// Create the account table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT '',
            user_id INTEGER NOT NULL,
            UNIQUE (name, user_id),
            FOREIGN KEY (user_id) REFERENCES user (id)
        )",
        (),
    )?;

    Ok(())
}

/// Convert a database row into an [Account].
///
/// Expects the columns `id, name, account_type, notes, user_id` in order.
pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let account_type = row.get(2)?;
    let notes = row.get(3)?;
    let user_id: i64 = row.get(4)?;

    Ok(Account {
        id,
        name,
        account_type,
        notes,
        user_id: UserID::new(user_id),
    })
}

const ACCOUNT_COLUMNS: &str = "id, name, account_type, notes, user_id";

/// Get all accounts belonging to `owner`, ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if there is an unexpected SQL error.
pub fn list_accounts(owner: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE user_id = :user_id ORDER BY name"
        ))?
        .query_map(&[(":user_id", &owner.as_i64())], map_row_to_account)?
        .map(|account_result| account_result.map_err(Error::SqlError))
        .collect()
}

/// Create a new account for `owner`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyAccountName] if the trimmed name is empty,
/// - [Error::DuplicateAccountName] if `owner` already has an account with
///   the same name,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    form: &NewAccount,
    owner: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = form.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    connection
        .prepare(&format!(
            "INSERT INTO account (name, account_type, notes, user_id)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {ACCOUNT_COLUMNS}"
        ))?
        .query_row(
            params![name, form.account_type, form.notes, owner.as_i64()],
            map_row_to_account,
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 2067 => {
                Error::DuplicateAccountName(name.to_owned())
            }
            error => error.into(),
        })
}

/// Update the account matching both `id` and `owner`.
///
/// Returns `Ok(None)` without touching the store when `changes` is empty,
/// and `Ok(None)` when no row matches, i.e. the account does not exist or
/// belongs to another user. The two cases are deliberately not
/// distinguishable from the result.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyAccountName] if a new name is given and its trimmed form
///   is empty,
/// - [Error::DuplicateAccountName] if a new name collides with another of
///   the owner's accounts,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_account(
    id: AccountId,
    changes: &AccountUpdate,
    owner: UserID,
    connection: &Connection,
) -> Result<Option<Account>, Error> {
    if changes.is_empty() {
        return Ok(None);
    }

    let mut set_clauses = Vec::new();
    let mut sql_params: Vec<Value> = Vec::new();
    let mut new_name = None;

    if let Some(name) = &changes.name {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::EmptyAccountName);
        }

        set_clauses.push("name = ?");
        sql_params.push(Value::Text(name.to_owned()));
        new_name = Some(name.to_owned());
    }

    if let Some(account_type) = changes.account_type {
        set_clauses.push("account_type = ?");
        sql_params.push(Value::Text(account_type.as_str().to_owned()));
    }

    if let Some(notes) = &changes.notes {
        set_clauses.push("notes = ?");
        sql_params.push(Value::Text(notes.clone()));
    }

    sql_params.push(Value::Integer(id));
    sql_params.push(Value::Integer(owner.as_i64()));

    let query = format!(
        "UPDATE account SET {} WHERE id = ? AND user_id = ? RETURNING {ACCOUNT_COLUMNS}",
        set_clauses.join(", ")
    );

    match connection
        .prepare(&query)?
        .query_row(params_from_iter(sql_params), map_row_to_account)
    {
        Ok(account) => Ok(Some(account)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(rusqlite::Error::SqliteFailure(sql_error, Some(_)))
            if sql_error.extended_code == 2067 =>
        {
            Err(Error::DuplicateAccountName(new_name.unwrap_or_default()))
        }
        Err(error) => Err(error.into()),
    }
}

/// Get the number of transactions that reference `account_id`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an unexpected SQL error.
pub fn count_account_transactions(
    account_id: AccountId,
    connection: &Connection,
) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE account_id = ?1",
            params![account_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Delete the account matching both `id` and `owner`.
///
/// Returns the deleted account, or `None` when no row matches, i.e. the
/// account does not exist or belongs to another user.
///
/// # Errors
/// This function will return a:
/// - [Error::AccountHasTransactions] if any transaction still references
///   the account; the account is left untouched,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_account(
    id: AccountId,
    owner: UserID,
    connection: &Connection,
) -> Result<Option<Account>, Error> {
    if count_account_transactions(id, connection)? > 0 {
        return Err(Error::AccountHasTransactions);
    }

    match connection
        .prepare(&format!(
            "DELETE FROM account WHERE id = ?1 AND user_id = ?2 RETURNING {ACCOUNT_COLUMNS}"
        ))?
        .query_row(params![id, owner.as_i64()], map_row_to_account)
    {
        Ok(account) => Ok(Some(account)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}


#[cfg(test)]
mod account_tests {
    use rusqlite::Connection;

    use crate::{
        Error, initialize_db,
        user::{UserID, create_user},
    };

    use super::{
        AccountType, AccountUpdate, NewAccount, create_account, delete_account, list_accounts,
        update_account,
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize_db(&conn).unwrap();

        let user = create_user(
            "foo@bar.baz".parse().unwrap(),
            crate::PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }

    fn checking_account_form() -> NewAccount {
        NewAccount {
            name: "Checking".to_owned(),
            account_type: AccountType::Debit,
            notes: "everyday spending".to_owned(),
        }
    }

    #[test]
    fn create_account_succeeds() {
        let (conn, owner) = get_test_connection();

        let account = create_account(&checking_account_form(), owner, &conn).unwrap();

        assert!(account.id > 0);
        assert_eq!(account.name, "Checking");
        assert_eq!(account.account_type, AccountType::Debit);
        assert_eq!(account.notes, "everyday spending");
        assert_eq!(account.user_id, owner);
    }

    #[test]
    fn create_account_rejects_empty_name() {
        let (conn, owner) = get_test_connection();
        let form = NewAccount {
            name: "   ".to_owned(),
            account_type: AccountType::Debit,
            notes: String::new(),
        };

        assert_eq!(
            create_account(&form, owner, &conn),
            Err(Error::EmptyAccountName)
        );
    }

    #[test]
    fn create_account_rejects_duplicate_name_for_same_owner() {
        let (conn, owner) = get_test_connection();
        create_account(&checking_account_form(), owner, &conn).unwrap();

        let result = create_account(&checking_account_form(), owner, &conn);

        assert_eq!(
            result,
            Err(Error::DuplicateAccountName("Checking".to_owned()))
        );
    }

    #[test]
    fn create_account_allows_same_name_for_different_owners() {
        let (conn, owner) = get_test_connection();
        let other_owner = create_user(
            "other@bar.baz".parse().unwrap(),
            crate::PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap()
        .id;

        create_account(&checking_account_form(), owner, &conn).unwrap();
        let result = create_account(&checking_account_form(), other_owner, &conn);

        assert!(result.is_ok(), "got {result:?}");
    }

    #[test]
    fn list_accounts_orders_by_name_and_scopes_to_owner() {
        let (conn, owner) = get_test_connection();
        let other_owner = create_user(
            "other@bar.baz".parse().unwrap(),
            crate::PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap()
        .id;

        for name in ["Visa", "Checking", "Savings"] {
            create_account(
                &NewAccount {
                    name: name.to_owned(),
                    account_type: AccountType::Debit,
                    notes: String::new(),
                },
                owner,
                &conn,
            )
            .unwrap();
        }
        create_account(&checking_account_form(), other_owner, &conn).unwrap();

        let accounts = list_accounts(owner, &conn).unwrap();

        let names: Vec<&str> = accounts.iter().map(|account| account.name.as_str()).collect();
        assert_eq!(names, vec!["Checking", "Savings", "Visa"]);
    }

    #[test]
    fn update_account_changes_only_supplied_fields() {
        let (conn, owner) = get_test_connection();
        let account = create_account(&checking_account_form(), owner, &conn).unwrap();

        let updated = update_account(
            account.id,
            &AccountUpdate {
                name: Some("Everyday".to_owned()),
                ..Default::default()
            },
            owner,
            &conn,
        )
        .unwrap()
        .expect("want updated account");

        assert_eq!(updated.name, "Everyday");
        assert_eq!(updated.account_type, account.account_type);
        assert_eq!(updated.notes, account.notes);
    }

    #[test]
    fn update_account_with_no_fields_is_a_no_op() {
        let (conn, owner) = get_test_connection();
        let account = create_account(&checking_account_form(), owner, &conn).unwrap();

        let result = update_account(account.id, &AccountUpdate::default(), owner, &conn).unwrap();

        assert_eq!(result, None);
        assert_eq!(list_accounts(owner, &conn).unwrap(), vec![account]);
    }

    #[test]
    fn update_account_for_other_owner_affects_zero_rows() {
        let (conn, owner) = get_test_connection();
        let account = create_account(&checking_account_form(), owner, &conn).unwrap();
        let other_owner = create_user(
            "other@bar.baz".parse().unwrap(),
            crate::PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap()
        .id;

        let result = update_account(
            account.id,
            &AccountUpdate {
                name: Some("Hijacked".to_owned()),
                ..Default::default()
            },
            other_owner,
            &conn,
        )
        .unwrap();

        assert_eq!(result, None);
        assert_eq!(list_accounts(owner, &conn).unwrap()[0].name, "Checking");
    }

    #[test]
    fn delete_account_returns_deleted_row() {
        let (conn, owner) = get_test_connection();
        let account = create_account(&checking_account_form(), owner, &conn).unwrap();

        let deleted = delete_account(account.id, owner, &conn).unwrap();

        assert_eq!(deleted, Some(account));
        assert!(list_accounts(owner, &conn).unwrap().is_empty());
    }

    #[test]
    fn delete_account_for_other_owner_affects_zero_rows() {
        let (conn, owner) = get_test_connection();
        let account = create_account(&checking_account_form(), owner, &conn).unwrap();
        let other_owner = create_user(
            "other@bar.baz".parse().unwrap(),
            crate::PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap()
        .id;

        let result = delete_account(account.id, other_owner, &conn).unwrap();

        assert_eq!(result, None);
        assert_eq!(list_accounts(owner, &conn).unwrap().len(), 1);
    }
}
