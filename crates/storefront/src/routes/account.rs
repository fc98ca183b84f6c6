//! Account area route handlers (login required).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use greenshop_core::Price;

use crate::db::users::ProfileInput;
use crate::db::{OrderRepository, UserRepository};
use crate::error::Result;
use crate::filters;
use crate::forms::{FormErrors, clean};
use crate::middleware::{PageContext, RequireAuth};
use crate::models::{Flash, FlashLevel, OrderWithItems, UserProfile};
use crate::state::AppState;

/// Orders listed on the dashboard.
const RECENT_ORDERS: i64 = 5;

// =============================================================================
// Form Types
// =============================================================================

/// Editable contact details.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileForm {
    #[validate(length(max = 20, message = "Ensure this value has at most 20 characters."))]
    #[serde(default)]
    pub phone: String,
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    #[serde(default)]
    pub address: String,
    #[validate(length(max = 120, message = "Ensure this value has at most 120 characters."))]
    #[serde(default)]
    pub city: String,
    #[validate(length(max = 20, message = "Ensure this value has at most 20 characters."))]
    #[serde(default)]
    pub postal_code: String,
}

impl ProfileForm {
    #[must_use]
    pub fn cleaned(&self) -> Self {
        Self {
            phone: clean(&self.phone),
            address: clean(&self.address),
            city: clean(&self.city),
            postal_code: clean(&self.postal_code),
        }
    }

    fn to_input(&self) -> ProfileInput {
        ProfileInput {
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
        }
    }
}

impl From<UserProfile> for ProfileForm {
    fn from(profile: UserProfile) -> Self {
        Self {
            phone: profile.phone,
            address: profile.address,
            city: profile.city,
            postal_code: profile.postal_code,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Account dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "account/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub orders: Vec<OrderWithItems>,
    pub orders_count: i64,
    pub total_spent: String,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<OrderWithItems>,
}

/// Profile form template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub form: ProfileForm,
    pub errors: FormErrors,
}

// =============================================================================
// Handlers
// =============================================================================

/// Account overview: recent orders and lifetime totals.
#[instrument(skip(state, user, ctx), fields(user_id = %user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool());
    let recent = orders.for_user(user.id, Some(RECENT_ORDERS)).await?;
    let stats = orders.customer_stats(user.id).await?;

    Ok(DashboardTemplate {
        ctx,
        orders: recent,
        orders_count: stats.orders_count,
        total_spent: Price::store(stats.total_spent).display(),
    })
}

/// Full order history.
#[instrument(skip(state, user, ctx), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .for_user(user.id, None)
        .await?;
    Ok(OrdersTemplate { ctx, orders })
}

/// Display the profile form.
#[instrument(skip(state, user, ctx), fields(user_id = %user.id))]
pub async fn profile_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let profile = UserRepository::new(state.pool())
        .get_or_create_profile(user.id)
        .await?;

    Ok(ProfileTemplate {
        ctx,
        form: profile.into(),
        errors: FormErrors::new(),
    })
}

/// Save the profile form.
#[instrument(skip(state, user, session, form), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let form = form.cleaned();
    let errors = FormErrors::validate(&form);
    if !errors.is_empty() {
        return Ok(ProfileTemplate {
            ctx: PageContext::from_session(&session).await,
            form,
            errors,
        }
        .into_response());
    }

    UserRepository::new(state.pool())
        .update_profile(user.id, &form.to_input())
        .await?;
    tracing::info!("Profile updated");

    Flash::push(&session, FlashLevel::Success, "Profile updated.").await?;
    Ok(Redirect::to("/account/profile").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_form_is_optional() {
        assert!(FormErrors::validate(&ProfileForm::default()).is_empty());
    }

    #[test]
    fn test_profile_form_lengths() {
        let form = ProfileForm {
            postal_code: "1".repeat(21),
            ..ProfileForm::default()
        };
        assert_eq!(
            FormErrors::validate(&form).get("postal_code"),
            ["Ensure this value has at most 20 characters."]
        );
    }

    #[test]
    fn test_cleaned_trims() {
        let form = ProfileForm {
            city: "  Kazan ".to_owned(),
            ..ProfileForm::default()
        };
        assert_eq!(form.cleaned().city, "Kazan");
    }
}
