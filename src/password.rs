//! This file defines types that handle password validation and hashing.
//! `ValidatedPassword` wraps a string and ensures it is a strong password.
//! `PasswordHash` converts a `ValidatedPassword` into a salted and hashed password.

use std::fmt::Display;

use bcrypt::{hash, verify};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that has been validated, but not yet hashed.
///
/// This struct can be used to construct a [PasswordHash].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Create and validate a new password from a string.
    ///
    /// # Errors
    ///
    /// This function will return an error if the password is considered too weak.
    /// The error message will explain why the password is considered too weak and suggest how to make it stronger.
    pub fn new(raw_password_string: &str) -> Result<Self, Error> {
        let password_analysis = zxcvbn(raw_password_string, &[]);

        match password_analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password_string.to_string())),
            _ => Err(Error::TooWeak(
                password_analysis
                    .feedback()
                    .unwrap_or(&Feedback::default())
                    .to_string(),
            )),
        }
    }

    /// Create a new `ValidatedPassword` without any validation.
    ///
    /// The caller should ensure that `raw_password_string` is a valid and secure password.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid password is provided it may cause incorrect behaviour but will not affect memory safety.
    pub fn new_unchecked(raw_password_string: &str) -> Self {
        Self(raw_password_string.to_string())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Create a hashed password from a validated password with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to verify a password.
    /// A value of at least 12 is recommended. Pass in [PasswordHash::DEFAULT_COST] to use the recommended cost.
    ///
    /// # Errors
    ///
    /// This function will return an error if the password could not be hashed.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        match hash(&password.0, cost) {
            Ok(password_hash) => Ok(Self(password_hash)),
            Err(e) => Err(Error::HashingError(e.to_string())),
        }
    }

    /// Create a new `PasswordHash` without any validation or hashing.
    ///
    /// The caller should ensure that `hash_string` is a valid bcrypt hash,
    /// e.g. a hash retrieved from the application database.
    pub fn new_unchecked(hash_string: &str) -> Self {
        Self(hash_string.to_string())
    }

    /// Check whether `raw_password` matches this hash.
    ///
    /// # Errors
    ///
    /// This function will return an error if the stored hash could not be
    /// parsed by the hashing library.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod validated_password_tests {
    use crate::Error;

    use super::ValidatedPassword;

    #[test]
    fn accepts_strong_password() {
        assert!(ValidatedPassword::new("averysecureandlongpassword").is_ok());
    }

    #[test]
    fn rejects_weak_password() {
        let result = ValidatedPassword::new("hunter2");

        assert!(matches!(result, Err(Error::TooWeak(_))), "got {result:?}");
    }

    #[test]
    fn display_redacts_password() {
        let password = ValidatedPassword::new_unchecked("hunter2");

        assert_eq!(password.to_string(), "********");
    }
}

#[cfg(test)]
mod password_hash_tests {
    use super::{PasswordHash, ValidatedPassword};

    // The minimum cost keeps these tests fast, production code should use
    // PasswordHash::DEFAULT_COST.
    const TEST_COST: u32 = 4;

    #[test]
    fn verify_accepts_matching_password() {
        let hash =
            PasswordHash::new(ValidatedPassword::new_unchecked("hunter2"), TEST_COST).unwrap();

        assert_eq!(hash.verify("hunter2"), Ok(true));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash =
            PasswordHash::new(ValidatedPassword::new_unchecked("hunter2"), TEST_COST).unwrap();

        assert_eq!(hash.verify("hunter3"), Ok(false));
    }

    #[test]
    fn hashing_salts_passwords() {
        let first =
            PasswordHash::new(ValidatedPassword::new_unchecked("hunter2"), TEST_COST).unwrap();
        let second =
            PasswordHash::new(ValidatedPassword::new_unchecked("hunter2"), TEST_COST).unwrap();

        assert_ne!(first, second);
    }
}
