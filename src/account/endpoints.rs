//! Defines the JSON endpoints for managing accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::core::{
        AccountUpdate, NewAccount, create_account, delete_account, list_accounts, update_account,
    },
    database_id::AccountId,
    user::UserID,
};

/// The state needed by the account endpoints.
#[derive(Debug, Clone)]
pub struct AccountsState {
    /// The database connection for managing accounts.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing a user's accounts.
pub async fn list_accounts_endpoint(
    State(state): State<AccountsState>,
    Path(user_id): Path<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match list_accounts(user_id, &connection) {
        Ok(accounts) => Json(accounts).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for creating an account.
pub async fn create_account_endpoint(
    State(state): State<AccountsState>,
    Path(user_id): Path<UserID>,
    Json(form): Json<NewAccount>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_account(&form, user_id, &connection) {
        Ok(account) => (StatusCode::CREATED, Json(account)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for updating an account.
///
/// An update with no fields is a no-op and responds with 204 NO CONTENT; an
/// update that matches no row responds with 404 NOT FOUND whether the
/// account is missing or owned by someone else.
pub async fn update_account_endpoint(
    State(state): State<AccountsState>,
    Path((user_id, account_id)): Path<(UserID, AccountId)>,
    Json(changes): Json<AccountUpdate>,
) -> Response {
    if changes.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_account(account_id, &changes, user_id, &connection) {
        Ok(Some(account)) => Json(account).into_response(),
        Ok(None) => Error::NotFound.into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for deleting an account.
///
/// Responds with 409 CONFLICT while any transaction still references the
/// account.
pub async fn delete_account_endpoint(
    State(state): State<AccountsState>,
    Path((user_id, account_id)): Path<(UserID, AccountId)>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_account(account_id, user_id, &connection) {
        Ok(Some(account)) => Json(account).into_response(),
        Ok(None) => Error::NotFound.into_response(),
        Err(error) => {
            tracing::error!("Could not delete account {account_id}: {error}");
            error.into_response()
        }
    }
}
