//! The API endpoint URIs.
//!
//! The acting owner appears as an explicit `{user_id}` path parameter
//! rather than being carried in ambient session state; the presentation
//! layer supplies the ID it received from sign-in.

/// The route for registering a new user.
pub const USERS: &str = "/api/users";
/// The route for signing in.
pub const SIGN_IN: &str = "/api/sign_in";
/// The route to list and create a user's accounts.
pub const ACCOUNTS: &str = "/api/users/{user_id}/accounts";
/// The route to update and delete a single account.
pub const ACCOUNT: &str = "/api/users/{user_id}/accounts/{account_id}";
/// The route to list a user's opening balances.
pub const BALANCES: &str = "/api/users/{user_id}/balances";
/// The route to read and record a single opening balance.
pub const OPENING_BALANCE: &str = "/api/users/{user_id}/balances/opening";
/// The route to query and create a user's transactions.
pub const TRANSACTIONS: &str = "/api/users/{user_id}/transactions";
/// The route to update and delete a single transaction.
pub const TRANSACTION: &str = "/api/users/{user_id}/transactions/{transaction_id}";
/// The route to apply a bulk edit of the transactions table.
pub const TRANSACTIONS_BULK: &str = "/api/users/{user_id}/transactions/bulk";
/// The route to compute the monthly summary.
pub const SUMMARY: &str = "/api/users/{user_id}/summary";
