//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in user (or a staff user) in
//! route handlers.

use axum::{
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;

/// Extractor that requires authentication.
///
/// If the user is not logged in, returns a redirect to the login page that
/// brings them back to the requested page afterwards.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
pub enum AuthRejection {
    /// Redirect to the login page, carrying the original location.
    RedirectToLogin(String),
    /// No session layer in front of the handler.
    Unauthorized,
    /// Logged in, but not staff.
    Forbidden,
    /// The account could not be reloaded.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(next) => Redirect::to(&login_url(&next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to access this page",
            )
                .into_response(),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Login page URL that returns to `next` afterwards.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("/login?next={}", urlencoding::encode(next))
}

/// Path and query of the request, for `next` redirects.
///
/// Nested routers see a stripped URI, so the original one wins when present.
fn requested_location(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |OriginalUri(uri)| uri);
    uri.path_and_query()
        .map_or_else(|| uri.path().to_owned(), ToString::to_string)
}

async fn session_user(parts: &Parts) -> Result<Option<CurrentUser>, AuthRejection> {
    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    Ok(session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten())
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)
            .await?
            .ok_or_else(|| AuthRejection::RedirectToLogin(requested_location(parts)))?;

        Ok(Self(user))
    }
}

/// Extractor that requires a staff user.
///
/// Anonymous visitors are redirected to login; logged-in users without the
/// staff flag get 403 Forbidden. The account is reloaded on every request,
/// so demoting or deactivating a user takes effect without a new login.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_handler(
///     RequireStaff(user): RequireStaff,
/// ) -> impl IntoResponse {
///     format!("Hello staff member {}!", user.username)
/// }
/// ```
pub struct RequireStaff(pub CurrentUser);

/// Outcome of checking a reloaded account for admin access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffAccess {
    Granted,
    /// The account is gone or inactive; the session no longer identifies anyone.
    SignedOut,
    Denied,
}

impl StaffAccess {
    #[must_use]
    pub fn of(account: Option<&User>) -> Self {
        match account {
            Some(user) if user.is_active && user.is_staff => Self::Granted,
            Some(user) if user.is_active => Self::Denied,
            _ => Self::SignedOut,
        }
    }
}

impl<S> FromRequestParts<S> for RequireStaff
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        let app_state = AppState::from_ref(state);
        let account = UserRepository::new(app_state.pool())
            .get_by_id(user.id)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to reload staff account");
                AuthRejection::Internal
            })?;

        match StaffAccess::of(account.as_ref()) {
            StaffAccess::Granted => Ok(Self(user)),
            StaffAccess::Denied => {
                tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-staff user denied admin access");
                Err(AuthRejection::Forbidden)
            }
            StaffAccess::SignedOut => {
                tracing::warn!(user_id = %user.id, "Inactive or deleted account signed out");
                if let Some(session) = parts.extensions.get::<Session>() {
                    clear_current_user(session)
                        .await
                        .map_err(|_| AuthRejection::Internal)?;
                }
                Err(AuthRejection::RedirectToLogin(requested_location(parts)))
            }
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the user is not logged in.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     OptionalAuth(user): OptionalAuth,
/// ) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.username),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await.ok().flatten()))
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
