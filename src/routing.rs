//! Application router configuration.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, list_accounts_endpoint,
        update_account_endpoint,
    },
    auth::{register_user_endpoint, sign_in_endpoint},
    balance::{get_opening_endpoint, list_balances_endpoint, set_opening_endpoint},
    endpoints,
    summary::get_summary_endpoint,
    transaction::{
        bulk_edit_endpoint, create_transaction_endpoint, delete_transaction_endpoint,
        query_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::USERS, post(register_user_endpoint))
        .route(endpoints::SIGN_IN, post(sign_in_endpoint))
        .route(
            endpoints::ACCOUNTS,
            get(list_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT,
            put(update_account_endpoint).delete(delete_account_endpoint),
        )
        .route(endpoints::BALANCES, get(list_balances_endpoint))
        .route(
            endpoints::OPENING_BALANCE,
            get(get_opening_endpoint).put(set_opening_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(query_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::TRANSACTIONS_BULK, post(bulk_edit_endpoint))
        .route(endpoints::SUMMARY, get(get_summary_endpoint))
        .with_state(state)
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::AppState;

    use super::build_router;

    fn get_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state =
            AppState::new(connection, "Etc/UTC").expect("Could not create application state");

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_round_trip() {
        let server = get_test_server();

        let response = server
            .post("/api/users")
            .json(&json!({ "email": "foo@bar.baz", "password": "averysecureandlongpassword" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/sign_in")
            .json(&json!({ "email": "foo@bar.baz", "password": "averysecureandlongpassword" }))
            .await;
        response.assert_status_ok();
        response.assert_json_contains(&json!({ "email": "foo@bar.baz" }));
    }

    #[tokio::test]
    async fn sign_in_with_unknown_email_is_unauthorized() {
        let server = get_test_server();

        server
            .post("/api/sign_in")
            .json(&json!({ "email": "nobody@bar.baz", "password": "whatever" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        server
            .get("/api/users/1/nonsense")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
