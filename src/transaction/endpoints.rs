//! Defines the JSON endpoints for managing and querying transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use crate::{
    AppState, Error,
    database_id::AccountId,
    period::Period,
    timezone::local_today,
    transaction::{
        bulk_edit::{BulkEditRow, apply_bulk_edit},
        core::{
            NewTransaction, TransactionType, TransactionUpdate, create_transaction,
            delete_transaction, update_transaction,
        },
        query::{TransactionFilter, query_transactions},
    },
    user::UserID,
};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    local_timezone: String,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query string parameters accepted by [query_transactions_endpoint].
///
/// `account_ids` and `types` are comma-separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQueryParams {
    /// A month name or number to restrict the query to.
    pub period: Option<String>,
    /// The earliest date to include.
    pub start_date: Option<Date>,
    /// The latest date to include.
    pub end_date: Option<Date>,
    /// Comma-separated account IDs to include.
    pub account_ids: Option<String>,
    /// Comma-separated transaction types to include.
    pub types: Option<String>,
}

impl TransactionQueryParams {
    fn into_filter(self) -> Result<TransactionFilter, Error> {
        let period = match &self.period {
            Some(raw) => Some(Period::parse(raw)?),
            None => None,
        };

        let account_ids = match &self.account_ids {
            Some(raw) => Some(
                raw.split(',')
                    .map(|id| {
                        id.trim()
                            .parse::<AccountId>()
                            .map_err(|_| Error::InvalidAccountIds(raw.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        let types = match &self.types {
            Some(raw) => Some(
                raw.split(',')
                    .map(|value| value.parse::<TransactionType>())
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        Ok(TransactionFilter {
            period,
            start_date: self.start_date,
            end_date: self.end_date,
            account_ids,
            types,
        })
    }
}

/// A route handler for querying a user's transactions, newest first.
pub async fn query_transactions_endpoint(
    State(state): State<TransactionsState>,
    Path(user_id): Path<UserID>,
    Query(params): Query<TransactionQueryParams>,
) -> Response {
    let filter = match params.into_filter() {
        Ok(filter) => filter,
        Err(error) => return error.into_response(),
    };

    let year = match local_today(&state.local_timezone) {
        Ok(today) => today.year(),
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match query_transactions(&filter, year, user_id, &connection) {
        Ok(rows) => Json(rows).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for creating a transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionsState>,
    Path(user_id): Path<UserID>,
    Json(form): Json<NewTransaction>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_transaction(&form, user_id, &connection) {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for updating a transaction.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionsState>,
    Path((user_id, transaction_id)): Path<(UserID, Uuid)>,
    Json(changes): Json<TransactionUpdate>,
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

    match update_transaction(transaction_id, &changes, user_id, &connection) {
        Ok(Some(transaction)) => Json(transaction).into_response(),
        Ok(None) => Error::NotFound.into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionsState>,
    Path((user_id, transaction_id)): Path<(UserID, Uuid)>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_transaction(transaction_id, user_id, &connection) {
        Ok(Some(transaction)) => Json(transaction).into_response(),
        Ok(None) => Error::NotFound.into_response(),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_response()
        }
    }
}

/// The request body for a bulk edit.
#[derive(Debug, Deserialize)]
pub struct BulkEditRequest {
    /// The transaction IDs that were shown to the user before editing.
    #[serde(default)]
    pub previous_ids: Vec<Uuid>,
    /// The full edited row set.
    pub rows: Vec<BulkEditRow>,
}

/// A route handler for applying a bulk edit of the transactions table.
pub async fn bulk_edit_endpoint(
    State(state): State<TransactionsState>,
    Path(user_id): Path<UserID>,
    Json(request): Json<BulkEditRequest>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match apply_bulk_edit(&request.previous_ids, &request.rows, user_id, &connection) {
        Ok(outcome) => Json(outcome).into_response(),
        Err(error) => error.into_response(),
    }
}
