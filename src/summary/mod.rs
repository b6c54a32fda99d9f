//! The monthly summary reconciles each account's opening balance with that
//! month's transactions. This is the computational core of the
//! application; everything else is bookkeeping around it.

pub mod core;
pub mod endpoints;

use std::collections::HashMap;

use rusqlite::Connection;

use crate::{
    Error,
    account::list_accounts,
    balance::get_opening_for_month,
    period::Period,
    transaction::{TransactionFilter, query_transactions},
    user::UserID,
};

pub use core::{AccountSummary, MonthlySummary, SummaryTotals, summarize_month};
pub use endpoints::get_summary_endpoint;

/// Fetch the inputs for `owner` and `period` from the store and compute the
/// monthly summary.
///
/// `year` is the calendar year the period is resolved against; callers pass
/// the current local year.
///
/// # Errors
/// Returns [Error::SqlError] if there is an unexpected SQL error.
pub fn get_monthly_summary(
    period: Period,
    year: i32,
    owner: UserID,
    connection: &Connection,
) -> Result<MonthlySummary, Error> {
    let accounts = list_accounts(owner, connection)?;

    let mut openings = HashMap::new();
    for account in &accounts {
        let opening = get_opening_for_month(period, account.id, owner, connection)?;
        openings.insert(account.id, opening);
    }

    let filter = TransactionFilter {
        period: Some(period),
        ..Default::default()
    };
    let transactions = query_transactions(&filter, year, owner, connection)?;

    Ok(summarize_month(&accounts, &openings, &transactions))
}

#[cfg(test)]
mod get_monthly_summary_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        initialize_db,
        account::{AccountType, NewAccount, create_account},
        balance::set_opening,
        period::Period,
        transaction::{NewTransaction, TransactionType, create_transaction},
        user::{UserID, create_user},
    };

    use super::get_monthly_summary;

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize_db(&conn).unwrap();

        let owner = create_user(
            "foo@bar.baz".parse().unwrap(),
            crate::PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap()
        .id;

        (conn, owner)
    }

    #[test]
    fn summary_combines_openings_and_transactions() {
        let (conn, owner) = get_test_connection();
        let account = create_account(
            &NewAccount {
                name: "Checking".to_owned(),
                account_type: AccountType::Debit,
                notes: String::new(),
            },
            owner,
            &conn,
        )
        .unwrap();
        set_opening("November", account.id, 1000.0, owner, &conn).unwrap();
        create_transaction(
            &NewTransaction {
                date: date!(2025 - 11 - 05),
                account_id: account.id,
                category: "Salary".to_owned(),
                description: String::new(),
                transaction_type: TransactionType::Income,
                amount: 200.0,
            },
            owner,
            &conn,
        )
        .unwrap();
        create_transaction(
            &NewTransaction {
                date: date!(2025 - 11 - 10),
                account_id: account.id,
                category: "Rent".to_owned(),
                description: String::new(),
                transaction_type: TransactionType::Expense,
                amount: 300.0,
            },
            owner,
            &conn,
        )
        .unwrap();
        // A transaction outside the period must not count.
        create_transaction(
            &NewTransaction {
                date: date!(2025 - 10 - 31),
                account_id: account.id,
                category: "Rent".to_owned(),
                description: String::new(),
                transaction_type: TransactionType::Expense,
                amount: 999.0,
            },
            owner,
            &conn,
        )
        .unwrap();

        let summary =
            get_monthly_summary(Period::parse("November").unwrap(), 2025, owner, &conn).unwrap();

        assert_eq!(summary.accounts.len(), 1);
        assert_eq!(summary.accounts[0].opening, 1000.0);
        assert_eq!(summary.accounts[0].income, 200.0);
        assert_eq!(summary.accounts[0].expense, 300.0);
        assert_eq!(summary.accounts[0].remaining, 900.0);
        assert_eq!(summary.transaction_count, 2);
    }

    #[test]
    fn owner_with_no_accounts_gets_an_empty_summary() {
        let (conn, owner) = get_test_connection();

        let summary =
            get_monthly_summary(Period::parse("May").unwrap(), 2025, owner, &conn).unwrap();

        assert!(summary.accounts.is_empty());
        assert_eq!(summary.total.opening, 0.0);
        assert_eq!(summary.total.remaining, 0.0);
        assert_eq!(summary.spending_to_income_ratio, 0.0);
    }
}
