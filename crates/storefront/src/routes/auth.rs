//! Authentication route handlers.
//!
//! Handles registration, login and logout with username/password accounts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use crate::db::UserRepository;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::{FormErrors, INVALID_EMAIL, clean};
use crate::middleware::{PageContext, set_current_user};
use crate::models::{CurrentUser, Flash, FlashLevel, User};
use crate::services::auth::{
    AuthError, AuthService, Registration, password_problems, username_problem,
};
use crate::state::AppState;

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
const INACTIVE_ACCOUNT: &str = "This account is inactive.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";
const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegisterForm {
    /// Field errors that need no database access.
    #[must_use]
    pub fn errors(&self) -> FormErrors {
        let mut errors = FormErrors::validate(self);

        if let Some(problem) = username_problem(&self.username) {
            errors.add("username", problem);
        }
        errors.require("username", &self.username);
        errors.require("email", &self.email);

        let has_password1 = errors.require("password1", &self.password1);
        let has_password2 = errors.require("password2", &self.password2);
        if has_password1 && has_password2 {
            if self.password1 == self.password2 {
                for problem in password_problems(&self.password2, &self.username) {
                    errors.add("password2", problem);
                }
            } else {
                errors.add("password2", PASSWORD_MISMATCH);
            }
        }

        errors
    }

    /// The form as redisplayed: passwords are never echoed back.
    #[must_use]
    pub fn without_passwords(&self) -> Self {
        Self {
            username: self.username.clone(),
            email: self.email.clone(),
            password1: String::new(),
            password2: String::new(),
        }
    }
}

// =============================================================================
// Query Types
// =============================================================================

/// `next` parameter carried through the login form.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Where to go after login: `next` if it is a local path, else `/account`.
///
/// Only paths starting with a single `/` are accepted so the parameter
/// cannot send the user to another host.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    next.map(str::trim)
        .filter(|next| {
            next.starts_with('/')
                && !next.starts_with("//")
                && !next.starts_with("/\\")
                && !next.chars().any(char::is_control)
        })
        .unwrap_or("/account")
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub username: String,
    pub next: String,
    pub errors: FormErrors,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub form: RegisterForm,
    pub errors: FormErrors,
}

// =============================================================================
// Session helpers
// =============================================================================

/// Put `user` into a fresh session id.
async fn start_session(session: &Session, user: &User) -> Result<CurrentUser> {
    let current = user.to_current();
    session.cycle_id().await?;
    set_current_user(session, &current).await?;
    set_sentry_user(&current.id, &current.username);
    Ok(current)
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(ctx: PageContext, Query(query): Query<NextQuery>) -> impl IntoResponse {
    LoginTemplate {
        ctx,
        username: String::new(),
        next: query.next.unwrap_or_default(),
        errors: FormErrors::new(),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let username = clean(&form.username);
    let next = form.next.unwrap_or_default();

    let mut errors = FormErrors::new();
    errors.require("username", &username);
    errors.require("password", &form.password);

    if errors.is_empty() {
        match AuthService::new(state.pool())
            .login(&username, &form.password)
            .await
        {
            Ok(user) => {
                start_session(&session, &user).await?;
                tracing::info!(user_id = %user.id, "User logged in");
                return Ok(Redirect::to(safe_next(Some(next.as_str()))).into_response());
            }
            Err(AuthError::InvalidCredentials) => {
                tracing::warn!("Login failed: invalid credentials");
                errors.add_non_field(INVALID_LOGIN);
            }
            Err(AuthError::InactiveUser) => {
                tracing::warn!("Login failed: inactive account");
                errors.add_non_field(INACTIVE_ACCOUNT);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(LoginTemplate {
        ctx: PageContext::from_session(&session).await,
        username,
        next,
        errors,
    }
    .into_response())
}

/// Handle logout: drop the whole session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    session.flush().await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(ctx: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        ctx,
        form: RegisterForm::default(),
        errors: FormErrors::new(),
    }
}

/// Handle registration form submission.
///
/// Creates the user and an empty profile, logs the new user in and sends
/// them to the home page.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let form = RegisterForm {
        username: clean(&form.username),
        email: clean(&form.email),
        ..form
    };

    let mut errors = form.errors();
    if !errors.has("username")
        && UserRepository::new(state.pool())
            .username_exists(&form.username)
            .await?
    {
        errors.add("username", USERNAME_TAKEN);
    }

    if errors.is_empty() {
        let registration = Registration {
            username: &form.username,
            email: &form.email,
            password: &form.password1,
            is_staff: false,
        };
        match AuthService::new(state.pool()).register(&registration).await {
            Ok(user) => {
                start_session(&session, &user).await?;
                Flash::push(&session, FlashLevel::Success, "Welcome to GreenShop!").await?;
                return Ok(Redirect::to("/").into_response());
            }
            // Lost a race with another sign-up for the same name
            Err(AuthError::UserAlreadyExists) => errors.add("username", USERNAME_TAKEN),
            Err(AuthError::InvalidEmail(_)) => errors.add("email", INVALID_EMAIL),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(RegisterTemplate {
        ctx: PageContext::from_session(&session).await,
        form: form.without_passwords(),
        errors,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::REQUIRED;

    fn valid_form() -> RegisterForm {
        RegisterForm {
            username: "anna".to_owned(),
            email: "anna@example.com".to_owned(),
            password1: "green-leaf-42".to_owned(),
            password2: "green-leaf-42".to_owned(),
        }
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(None), "/account");
        assert_eq!(safe_next(Some("")), "/account");
        assert_eq!(safe_next(Some("/checkout")), "/checkout");
        assert_eq!(safe_next(Some("/catalog?page=2")), "/catalog?page=2");
        assert_eq!(safe_next(Some("//evil.example")), "/account");
        assert_eq!(safe_next(Some("/\\evil.example")), "/account");
        assert_eq!(safe_next(Some("https://evil.example/")), "/account");
        assert_eq!(safe_next(Some("account")), "/account");
    }

    #[test]
    fn test_valid_registration() {
        assert!(valid_form().errors().is_empty());
    }

    #[test]
    fn test_registration_password_rules() {
        let form = RegisterForm {
            password2: "green-leaf-43".to_owned(),
            ..valid_form()
        };
        assert_eq!(form.errors().get("password2"), [PASSWORD_MISMATCH]);

        let form = RegisterForm {
            password1: "12345678".to_owned(),
            password2: "12345678".to_owned(),
            ..valid_form()
        };
        assert_eq!(
            form.errors().get("password2"),
            ["This password is entirely numeric."]
        );
    }

    #[test]
    fn test_registration_required_and_username() {
        let errors = RegisterForm::default().errors();
        for field in ["username", "email", "password1", "password2"] {
            assert_eq!(errors.get(field), [REQUIRED], "{field}");
        }

        let form = RegisterForm {
            username: "anna petrova".to_owned(),
            ..valid_form()
        };
        assert!(form.errors().has("username"));
    }

    #[test]
    fn test_without_passwords() {
        let form = valid_form().without_passwords();
        assert_eq!(form.username, "anna");
        assert!(form.password1.is_empty() && form.password2.is_empty());
    }
}
