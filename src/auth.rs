//! The credential provider: signing up and signing in with an email and
//! password.
//!
//! There is no session state here. A successful sign-in returns the user's
//! ID and email; holding onto that identity between requests is the
//! presentation layer's job.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    user::{User, UserID, create_user, get_user_by_email},
};

/// The identity of a signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// The user's ID, used to scope all subsequent service calls.
    pub user_id: UserID,
    /// The email the user signed in with.
    pub email: String,
}

/// Register a new user.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidEmail] if `email` cannot be parsed,
/// - [Error::TooWeak] if the password is too easy to guess,
/// - [Error::DuplicateEmail] if the email is already registered,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn sign_up(email: &str, password: &str, connection: &Connection) -> Result<User, Error> {
    let email = email
        .parse::<EmailAddress>()
        .map_err(|_| Error::InvalidEmail(email.to_owned()))?;

    let password = ValidatedPassword::new(password)?;
    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    create_user(email, password_hash, connection)
}

/// Check an email and password against the registered users.
///
/// # Errors
/// Returns [Error::InvalidCredentials] when the email is unknown or the
/// password does not match. The two cases are indistinguishable on purpose.
pub fn sign_in(
    email: &str,
    password: &str,
    connection: &Connection,
) -> Result<AuthenticatedUser, Error> {
    let user = match get_user_by_email(email, connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    if user.password_hash.verify(password)? {
        Ok(AuthenticatedUser {
            user_id: user.id,
            email: user.email.to_string(),
        })
    } else {
        Err(Error::InvalidCredentials)
    }
}

/// The state needed by the credential endpoints.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The database connection for managing users.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for signing up or signing in.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// The user's email address.
    pub email: String,
    /// The user's plain-text password.
    pub password: String,
}

/// A route handler for registering a new user.
pub async fn register_user_endpoint(
    State(state): State<AuthState>,
    Json(credentials): Json<Credentials>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match sign_up(&credentials.email, &credentials.password, &connection) {
        Ok(user) => (
            StatusCode::CREATED,
            Json(AuthenticatedUser {
                user_id: user.id,
                email: user.email.to_string(),
            }),
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for signing in.
pub async fn sign_in_endpoint(
    State(state): State<AuthState>,
    Json(credentials): Json<Credentials>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match sign_in(&credentials.email, &credentials.password, &connection) {
        Ok(authenticated_user) => Json(authenticated_user).into_response(),
        Err(error) => error.into_response(),
    }
}
