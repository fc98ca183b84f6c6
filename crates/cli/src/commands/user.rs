//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! gs-cli user create-staff -u admin -e admin@example.com -p 'long password'
//! ```

use thiserror::Error;

use greenshop_storefront::services::auth::{AuthError, AuthService, Registration};

use super::CommandError;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a staff user together with their empty profile.
///
/// The same username, email and password rules as the registration form
/// apply.
///
/// # Errors
///
/// Returns an error if the input is rejected, the username is taken, or the
/// database is unreachable.
pub async fn create_staff(username: &str, email: &str, password: &str) -> Result<(), UserError> {
    let pool = super::connect().await?;

    let user = AuthService::new(&pool)
        .register(&Registration {
            username,
            email,
            password,
            is_staff: true,
        })
        .await?;

    tracing::info!(
        "Staff user created successfully! ID: {}, Username: {}",
        user.id,
        user.username
    );
    Ok(())
}
