//! Defines the JSON endpoints for recording and reading opening balances.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    balance::core::{get_opening, list_balances, set_opening},
    database_id::AccountId,
    user::UserID,
};

/// The state needed by the balance endpoints.
#[derive(Debug, Clone)]
pub struct BalancesState {
    /// The database connection for managing opening balances.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BalancesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for reading a single opening balance.
#[derive(Debug, Deserialize)]
pub struct OpeningQuery {
    /// The month to read, as a name or number.
    pub period: String,
    /// The account to read the balance for.
    pub account_id: AccountId,
}

/// The response body for a single opening balance lookup.
#[derive(Debug, Serialize)]
pub struct OpeningResponse {
    /// The period as supplied by the caller.
    pub period: String,
    /// The account the balance belongs to.
    pub account_id: AccountId,
    /// The recorded amount, `0.0` when nothing is recorded.
    pub opening: f64,
}

/// A route handler for reading the opening balance of one account in one
/// month.
///
/// An unrecognized period responds with an opening of `0.0` rather than an
/// error.
pub async fn get_opening_endpoint(
    State(state): State<BalancesState>,
    Path(user_id): Path<UserID>,
    Query(query): Query<OpeningQuery>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_opening(&query.period, query.account_id, user_id, &connection) {
        Ok(opening) => Json(OpeningResponse {
            period: query.period,
            account_id: query.account_id,
            opening,
        })
        .into_response(),
        Err(error) => error.into_response(),
    }
}

/// The request body for recording an opening balance.
#[derive(Debug, Deserialize)]
pub struct SetOpeningRequest {
    /// The month to record, as a name or number.
    pub period: String,
    /// The account the balance belongs to.
    pub account_id: AccountId,
    /// The amount of money at the start of the month.
    pub opening: f64,
}

/// A route handler for recording an opening balance.
///
/// Saving the same key twice updates the existing record in place.
pub async fn set_opening_endpoint(
    State(state): State<BalancesState>,
    Path(user_id): Path<UserID>,
    Json(request): Json<SetOpeningRequest>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match set_opening(
        &request.period,
        request.account_id,
        request.opening,
        user_id,
        &connection,
    ) {
        Ok(balance) => Json(balance).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for listing all of a user's opening balances.
pub async fn list_balances_endpoint(
    State(state): State<BalancesState>,
    Path(user_id): Path<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match list_balances(user_id, &connection) {
        Ok(balances) => Json(balances).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod endpoint_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState,
        account::{AccountType, NewAccount, create_account},
        build_router,
        database_id::AccountId,
        user::create_user,
    };

    fn get_test_server() -> (TestServer, i64, AccountId) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state =
            AppState::new(connection, "Etc/UTC").expect("Could not create application state");

        let (user_id, account_id) = {
            let connection = state.db_connection.lock().unwrap();
            let owner = create_user(
                "foo@bar.baz".parse().unwrap(),
                crate::PasswordHash::new_unchecked("hunter2"),
                &connection,
            )
            .unwrap()
            .id;

            let account = create_account(
                &NewAccount {
                    name: "Checking".to_owned(),
                    account_type: AccountType::Debit,
                    notes: String::new(),
                },
                owner,
                &connection,
            )
            .unwrap();

            (owner.as_i64(), account.id)
        };

        let server = TestServer::new(build_router(state));

        (server, user_id, account_id)
    }

    #[tokio::test]
    async fn set_then_get_opening() {
        let (server, user_id, account_id) = get_test_server();

        server
            .put(&format!("/api/users/{user_id}/balances/opening"))
            .json(&json!({ "period": "November", "account_id": account_id, "opening": 1000.0 }))
            .await
            .assert_status_ok();

        let response = server
            .get(&format!("/api/users/{user_id}/balances/opening"))
            .add_query_param("period", "november")
            .add_query_param("account_id", account_id)
            .await;

        response.assert_status_ok();
        response.assert_json_contains(&json!({ "opening": 1000.0 }));
    }

    #[tokio::test]
    async fn get_opening_with_garbage_period_is_zero_not_an_error() {
        let (server, user_id, account_id) = get_test_server();

        let response = server
            .get(&format!("/api/users/{user_id}/balances/opening"))
            .add_query_param("period", "Movember")
            .add_query_param("account_id", account_id)
            .await;

        response.assert_status_ok();
        response.assert_json_contains(&json!({ "opening": 0.0 }));
    }

    #[tokio::test]
    async fn set_opening_with_garbage_period_is_rejected() {
        let (server, user_id, account_id) = get_test_server();

        server
            .put(&format!("/api/users/{user_id}/balances/opening"))
            .json(&json!({ "period": "Movember", "account_id": account_id, "opening": 1.0 }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
