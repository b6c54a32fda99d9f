//! The monthly aggregation over accounts, opening balances and
//! transactions.
//!
//! The computation here is pure: the same snapshot of inputs always yields
//! the same summary, and no ordering of the inputs changes the result
//! beyond floating-point rounding at the cent level.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    account::{Account, AccountType},
    database_id::AccountId,
    transaction::{TransactionTableRow, TransactionType},
};

/// The reconciled figures for one account in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    /// The ID of the account.
    pub account_id: AccountId,
    /// The name of the account.
    pub account_name: String,
    /// Whether this is a debit account or a credit card.
    pub account_type: AccountType,
    /// The opening balance recorded for the month, `0.0` when unset.
    pub opening: f64,
    /// The month's income, or payments for a credit account.
    pub income: f64,
    /// The month's spending.
    pub expense: f64,
    /// The balance after applying the month's transactions to the opening.
    ///
    /// For a debit account this is `opening + income - expense`. For a
    /// credit account the outstanding balance grows with spending and
    /// shrinks with payments, so it is `opening + expense - income`.
    pub remaining: f64,
}

/// Aggregate figures over a group of account summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTotals {
    /// The summed opening balances.
    pub opening: f64,
    /// The summed income.
    pub income: f64,
    /// The summed expenses.
    pub expense: f64,
    /// The summed remaining balances.
    pub remaining: f64,
}

/// The reconciled figures for all of a user's accounts in one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// One row per account, in the order the accounts were supplied.
    pub accounts: Vec<AccountSummary>,
    /// Subtotals over the debit accounts.
    pub debit: SummaryTotals,
    /// Subtotals over the credit accounts.
    pub credit: SummaryTotals,
    /// Portfolio-level totals.
    ///
    /// The total opening nets the debit openings against the credit
    /// openings (money owed is not money held), and the total remaining is
    /// that net opening plus all income minus all expenses.
    pub total: SummaryTotals,
    /// Spending as a percentage of income, `0.0` when there is no income.
    pub spending_to_income_ratio: f64,
    /// Income minus expenses across all accounts.
    pub net_flow: f64,
    /// The number of transactions that went into the summary.
    pub transaction_count: usize,
}

/// Compute the monthly summary for a snapshot of accounts, their opening
/// balances and the month's transaction rows.
///
/// Accounts missing from `openings` are treated as having an opening of
/// `0.0`. An account with no matching transactions contributes
/// `income = expense = 0` and keeps its opening as the remaining balance.
/// No accounts yield an empty summary with all totals at `0.0`.
pub fn summarize_month(
    accounts: &[Account],
    openings: &HashMap<AccountId, f64>,
    transactions: &[TransactionTableRow],
) -> MonthlySummary {
    let mut summary = MonthlySummary::default();

    for account in accounts {
        let opening = openings.get(&account.id).copied().unwrap_or(0.0);

        let mut income = 0.0;
        let mut expense = 0.0;

        for row in transactions
            .iter()
            .filter(|row| row.account_id == account.id)
        {
            match row.transaction_type {
                TransactionType::Income => income += row.amount,
                TransactionType::Expense => expense += row.amount,
            }
        }

        let remaining = match account.account_type {
            AccountType::Debit => opening + income - expense,
            AccountType::Credit => opening + expense - income,
        };

        let subtotals = match account.account_type {
            AccountType::Debit => &mut summary.debit,
            AccountType::Credit => &mut summary.credit,
        };
        subtotals.opening += opening;
        subtotals.income += income;
        subtotals.expense += expense;
        subtotals.remaining += remaining;

        summary.accounts.push(AccountSummary {
            account_id: account.id,
            account_name: account.name.clone(),
            account_type: account.account_type,
            opening,
            income,
            expense,
            remaining,
        });
    }

    summary.total.opening = summary.debit.opening - summary.credit.opening;
    summary.total.income = summary.debit.income + summary.credit.income;
    summary.total.expense = summary.debit.expense + summary.credit.expense;
    summary.total.remaining =
        summary.total.opening + summary.total.income - summary.total.expense;

    summary.spending_to_income_ratio = if summary.total.income > 0.0 {
        summary.total.expense / summary.total.income * 100.0
    } else {
        0.0
    };
    summary.net_flow = summary.total.income - summary.total.expense;
    summary.transaction_count = transactions.len();

    summary
}

#[cfg(test)]
mod summarize_month_tests {
    use std::collections::HashMap;

    use time::macros::date;
    use uuid::Uuid;

    use crate::{
        account::{Account, AccountType},
        database_id::AccountId,
        transaction::{TransactionTableRow, TransactionType},
        user::UserID,
    };

    use super::summarize_month;

    const EPSILON: f64 = 1e-6;

    #[track_caller]
    fn assert_close(got: f64, want: f64) {
        assert!(
            (got - want).abs() < EPSILON,
            "got {got}, want {want} (within {EPSILON})"
        );
    }

    fn account(id: AccountId, name: &str, account_type: AccountType) -> Account {
        Account {
            id,
            name: name.to_owned(),
            account_type,
            notes: String::new(),
            user_id: UserID::new(1),
        }
    }

    fn row(
        account_id: AccountId,
        account_name: &str,
        transaction_type: TransactionType,
        amount: f64,
    ) -> TransactionTableRow {
        TransactionTableRow {
            transaction_id: Uuid::new_v4(),
            date: date!(2025 - 11 - 05),
            account_id,
            account_name: account_name.to_owned(),
            category: "Other".to_owned(),
            description: String::new(),
            transaction_type,
            amount,
        }
    }

    #[test]
    fn debit_account_balance_grows_with_income() {
        let accounts = vec![account(1, "Checking", AccountType::Debit)];
        let openings = HashMap::from([(1, 1000.0)]);
        let transactions = vec![
            row(1, "Checking", TransactionType::Income, 200.0),
            row(1, "Checking", TransactionType::Expense, 300.0),
        ];

        let summary = summarize_month(&accounts, &openings, &transactions);

        assert_close(summary.accounts[0].remaining, 900.0);
    }

    #[test]
    fn credit_account_balance_grows_with_spending() {
        let accounts = vec![account(1, "Visa", AccountType::Credit)];
        let openings = HashMap::from([(1, 1000.0)]);
        let transactions = vec![
            row(1, "Visa", TransactionType::Income, 200.0),
            row(1, "Visa", TransactionType::Expense, 300.0),
        ];

        let summary = summarize_month(&accounts, &openings, &transactions);

        assert_close(summary.accounts[0].remaining, 1100.0);
    }

    #[test]
    fn account_without_transactions_keeps_its_opening() {
        let accounts = vec![account(1, "Checking", AccountType::Debit)];
        let openings = HashMap::from([(1, 1000.0)]);

        let summary = summarize_month(&accounts, &openings, &[]);

        assert_close(summary.accounts[0].income, 0.0);
        assert_close(summary.accounts[0].expense, 0.0);
        assert_close(summary.accounts[0].remaining, 1000.0);
    }

    #[test]
    fn account_without_recorded_opening_defaults_to_zero() {
        let accounts = vec![account(1, "Checking", AccountType::Debit)];

        let summary = summarize_month(&accounts, &HashMap::new(), &[]);

        assert_close(summary.accounts[0].opening, 0.0);
        assert_close(summary.accounts[0].remaining, 0.0);
    }

    #[test]
    fn total_opening_nets_credit_against_debit() {
        let accounts = vec![
            account(1, "Checking", AccountType::Debit),
            account(2, "Visa", AccountType::Credit),
        ];
        let openings = HashMap::from([(1, 1500.0), (2, 400.0)]);

        let summary = summarize_month(&accounts, &openings, &[]);

        assert_close(summary.total.opening, 1100.0);
        assert_close(summary.total.remaining, 1100.0);
        assert_close(summary.debit.opening, 1500.0);
        assert_close(summary.credit.opening, 400.0);
    }

    #[test]
    fn subtotals_group_accounts_by_type() {
        let accounts = vec![
            account(1, "Checking", AccountType::Debit),
            account(2, "Savings", AccountType::Debit),
            account(3, "Visa", AccountType::Credit),
        ];
        let openings = HashMap::from([(1, 100.0), (2, 200.0), (3, 50.0)]);
        let transactions = vec![
            row(1, "Checking", TransactionType::Expense, 25.0),
            row(2, "Savings", TransactionType::Income, 75.0),
            row(3, "Visa", TransactionType::Expense, 10.0),
        ];

        let summary = summarize_month(&accounts, &openings, &transactions);

        assert_close(summary.debit.expense, 25.0);
        assert_close(summary.debit.income, 75.0);
        assert_close(summary.debit.remaining, 350.0);
        assert_close(summary.credit.expense, 10.0);
        assert_close(summary.credit.remaining, 60.0);
    }

    #[test]
    fn ratio_is_spending_over_income_as_percentage() {
        let accounts = vec![account(1, "Checking", AccountType::Debit)];
        let transactions = vec![
            row(1, "Checking", TransactionType::Income, 1000.0),
            row(1, "Checking", TransactionType::Expense, 250.0),
        ];

        let summary = summarize_month(&accounts, &HashMap::new(), &transactions);

        assert_close(summary.spending_to_income_ratio, 25.0);
    }

    #[test]
    fn ratio_is_zero_when_there_is_no_income() {
        let accounts = vec![account(1, "Checking", AccountType::Debit)];
        let transactions = vec![row(1, "Checking", TransactionType::Expense, 500.0)];

        let summary = summarize_month(&accounts, &HashMap::new(), &transactions);

        assert_close(summary.spending_to_income_ratio, 0.0);
    }

    #[test]
    fn no_accounts_yield_an_empty_summary() {
        let summary = summarize_month(&[], &HashMap::new(), &[]);

        assert!(summary.accounts.is_empty());
        assert_close(summary.total.opening, 0.0);
        assert_close(summary.total.income, 0.0);
        assert_close(summary.total.expense, 0.0);
        assert_close(summary.total.remaining, 0.0);
        assert_close(summary.net_flow, 0.0);
        assert_eq!(summary.transaction_count, 0);
    }

    #[test]
    fn result_does_not_depend_on_transaction_order() {
        let accounts = vec![
            account(1, "Checking", AccountType::Debit),
            account(2, "Visa", AccountType::Credit),
        ];
        let openings = HashMap::from([(1, 123.45), (2, 678.90)]);
        let mut transactions = vec![
            row(1, "Checking", TransactionType::Income, 0.1),
            row(1, "Checking", TransactionType::Expense, 0.2),
            row(2, "Visa", TransactionType::Expense, 0.3),
            row(1, "Checking", TransactionType::Income, 100.4),
            row(2, "Visa", TransactionType::Income, 50.5),
            row(2, "Visa", TransactionType::Expense, 0.6),
        ];

        let forward = summarize_month(&accounts, &openings, &transactions);
        transactions.reverse();
        let reversed = summarize_month(&accounts, &openings, &transactions);

        assert_eq!(forward.accounts.len(), reversed.accounts.len());
        for (a, b) in forward.accounts.iter().zip(reversed.accounts.iter()) {
            assert_eq!(a.account_id, b.account_id);
            assert_close(a.remaining, b.remaining);
            assert_close(a.income, b.income);
            assert_close(a.expense, b.expense);
        }
        assert_close(forward.total.remaining, reversed.total.remaining);
        assert_close(
            forward.spending_to_income_ratio,
            reversed.spending_to_income_ratio,
        );
    }

    #[test]
    fn calling_twice_on_the_same_snapshot_is_identical() {
        let accounts = vec![account(1, "Checking", AccountType::Debit)];
        let openings = HashMap::from([(1, 1000.0)]);
        let transactions = vec![
            row(1, "Checking", TransactionType::Income, 200.0),
            row(1, "Checking", TransactionType::Expense, 300.0),
        ];

        let first = summarize_month(&accounts, &openings, &transactions);
        let second = summarize_month(&accounts, &openings, &transactions);

        assert_eq!(first, second);
    }
}
