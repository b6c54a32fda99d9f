//! Ledgerly is a service for tracking personal finances.
//!
//! Users manage named debit and credit accounts, record an opening balance
//! for each account at the start of a month, and log income and expense
//! transactions against those accounts. The monthly summary reconciles the
//! opening balances with that month's transactions to produce per-account
//! and portfolio-level figures.
//!
//! This library provides the domain services and a JSON REST API that an
//! external presentation layer renders.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

pub mod account;
pub mod auth;
pub mod balance;
mod database_id;
mod db;
pub mod endpoints;
mod password;
pub mod period;
mod routing;
mod state;
pub mod summary;
mod timezone;
pub mod transaction;
pub mod user;

pub use database_id::{AccountId, BalanceId, DatabaseId};
pub use db::initialize as initialize_db;
pub use password::{PasswordHash, ValidatedPassword};
pub use period::Period;
pub use routing::build_router;
pub use state::AppState;
pub use timezone::local_today;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create or rename an account.
    #[error("account name cannot be empty")]
    EmptyAccountName,

    /// The specified account name already exists for this user.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// Tried to delete an account that still has transactions linked to it.
    #[error("cannot delete an account that has transactions")]
    AccountHasTransactions,

    /// A zero or negative amount was used to create or update a transaction.
    ///
    /// Transaction amounts are magnitudes, the direction of the money flow
    /// comes from the transaction type.
    #[error("{0} is not a valid transaction amount, amounts must be greater than zero")]
    NonPositiveAmount(f64),

    /// A negative amount was used as an opening balance.
    #[error("{0} is not a valid opening balance, amounts must not be negative")]
    NegativeOpeningBalance(f64),

    /// A string could not be parsed as a calendar month on a write path.
    ///
    /// Read paths (e.g. opening balance lookups) degrade to an amount of
    /// zero instead of returning this error.
    #[error("\"{0}\" is not a recognized calendar month")]
    InvalidPeriod(String),

    /// A string could not be parsed as a transaction type.
    #[error("\"{0}\" is not a valid transaction type, expected \"expense\" or \"income\"")]
    InvalidTransactionType(String),

    /// A query string could not be parsed as a list of account IDs.
    #[error("\"{0}\" is not a valid account ID list")]
    InvalidAccountIds(String),

    /// A string could not be parsed as an email address during sign-up.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email used to sign up is already registered.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The user provided an email and password combination that does not
    /// match a registered user.
    ///
    /// An unknown email and a wrong password both produce this error so the
    /// two cases cannot be told apart from the outside.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The requested resource was not found.
    ///
    /// Updates and deletes that match zero rows also surface this error:
    /// a row that does not exist and a row owned by another user are
    /// deliberately indistinguishable.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match &self {
            Error::EmptyAccountName
            | Error::NonPositiveAmount(_)
            | Error::NegativeOpeningBalance(_)
            | Error::InvalidPeriod(_)
            | Error::InvalidTransactionType(_)
            | Error::InvalidAccountIds(_)
            | Error::InvalidEmail(_)
            | Error::TooWeak(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::DuplicateAccountName(_) | Error::DuplicateEmail | Error::AccountHasTransactions => {
                StatusCode::CONFLICT
            }
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "an unexpected error occurred" })),
                )
                    .into_response();
            }
        };

        (status_code, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    #[test]
    fn validation_errors_are_unprocessable_entity() {
        let response = Error::EmptyAccountName.into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn conflict_errors_are_conflict() {
        let response = Error::AccountHasTransactions.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn sql_errors_are_hidden_behind_internal_server_error() {
        let response = Error::SqlError(rusqlite::Error::InvalidQuery).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
