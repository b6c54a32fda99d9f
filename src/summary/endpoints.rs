//! Defines the JSON endpoint for the monthly summary.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    period::Period,
    summary::get_monthly_summary,
    timezone::local_today,
    user::UserID,
};

/// The state needed by the summary endpoint.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for reading summary inputs.
    db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    local_timezone: String,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query string parameters accepted by [get_summary_endpoint].
#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    /// A month name or number; defaults to the current local month.
    pub period: Option<String>,
}

/// A route handler for computing the monthly summary.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
    Path(user_id): Path<UserID>,
    Query(params): Query<SummaryParams>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let period = match &params.period {
        Some(raw) => match Period::parse(raw) {
            Ok(period) => period,
            Err(error) => return error.into_response(),
        },
        None => Period::from(today),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_monthly_summary(period, today.year(), user_id, &connection) {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => error.into_response(),
    }
}
