//! Authentication service.
//!
//! Username/password accounts with Argon2id hashes.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use greenshop_core::Email;

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::user::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Data needed to open an account.
#[derive(Debug, Clone)]
pub struct Registration<'r> {
    pub username: &'r str,
    pub email: &'r str,
    pub password: &'r str,
    pub is_staff: bool,
}

/// Authentication service.
///
/// Handles user registration and password login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user (with an empty profile).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidUsername` if the username is malformed.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username is already registered.
    pub async fn register(&self, registration: &Registration<'_>) -> Result<User, AuthError> {
        let email = Email::parse(registration.email)?;

        if let Some(problem) = username_problem(registration.username) {
            return Err(AuthError::InvalidUsername(problem.to_owned()));
        }
        if let Some(problem) = password_problems(registration.password, registration.username)
            .into_iter()
            .next()
        {
            return Err(AuthError::WeakPassword(problem.to_owned()));
        }

        let password_hash = hash_password(registration.password)?;

        let user = self
            .users
            .create_with_profile(&NewUser {
                username: registration.username.to_owned(),
                email: email.into_inner(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash,
                is_staff: registration.is_staff,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, is_staff = user.is_staff, "User registered");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong
    /// and `AuthError::InactiveUser` if the account was deactivated.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }

        Ok(user)
    }
}

/// Why a username is unacceptable, if it is.
///
/// Usernames are 1 to 150 characters of letters, digits and `@.+-_`.
#[must_use]
pub fn username_problem(username: &str) -> Option<&'static str> {
    if username.is_empty() {
        return Some("This field is required.");
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Some("Ensure this value has at most 150 characters.");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Some(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
    None
}

/// Every rule a new password breaks.
#[must_use]
pub fn password_problems(password: &str, username: &str) -> Vec<&'static str> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push("This password is too short. It must contain at least 8 characters.");
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.");
    }
    if !username.is_empty() && password.to_lowercase() == username.to_lowercase() {
        problems.push("The password is too similar to the username.");
    }
    problems
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_problems() {
        assert!(password_problems("s3cure-pass", "anna").is_empty());
        assert_eq!(password_problems("short", "anna").len(), 1);
        assert_eq!(
            password_problems("12345678", "anna"),
            vec!["This password is entirely numeric."]
        );
        assert_eq!(
            password_problems("AnnaSmith", "annasmith"),
            vec!["The password is too similar to the username."]
        );
        assert_eq!(password_problems("1234", "anna").len(), 2);
    }

    #[test]
    fn test_username_problem() {
        assert_eq!(username_problem("anna.p+shop@x-y_z"), None);
        assert_eq!(username_problem("анна"), None);
        assert!(username_problem("").is_some());
        assert!(username_problem("anna petrova").is_some());
        assert!(username_problem("anna!").is_some());
        assert!(username_problem(&"a".repeat(151)).is_some());
        assert_eq!(username_problem(&"a".repeat(150)), None);
    }
}
