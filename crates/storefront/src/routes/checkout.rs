//! Checkout and order confirmation route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use greenshop_core::{Email, OrderId, Price};

use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{FormErrors, INVALID_EMAIL, clean};
use crate::middleware::{OptionalAuth, PageContext};
use crate::models::{CartItem, CurrentUser, Flash, FlashLevel, NewOrder, OrderWithItems};
use crate::services::cart::CartService;
use crate::services::checkout::{CheckoutError, CheckoutService, can_view_order, placed_orders};
use crate::state::AppState;

const EMPTY_CART: &str = "Your cart is empty.";

// =============================================================================
// Form Types
// =============================================================================

/// Buyer details submitted at checkout.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CheckoutForm {
    #[validate(length(max = 120, message = "Ensure this value has at most 120 characters."))]
    #[serde(default)]
    pub first_name: String,
    #[validate(length(max = 120, message = "Ensure this value has at most 120 characters."))]
    #[serde(default)]
    pub last_name: String,
    /// Checked with [`Email::parse`], like account emails.
    #[serde(default)]
    pub email: String,
    #[validate(length(max = 30, message = "Ensure this value has at most 30 characters."))]
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
    #[serde(default)]
    pub notes: String,
}

impl CheckoutForm {
    /// Trim every field.
    #[must_use]
    pub fn cleaned(&self) -> Self {
        Self {
            first_name: clean(&self.first_name),
            last_name: clean(&self.last_name),
            email: clean(&self.email),
            phone: clean(&self.phone),
            address: clean(&self.address),
            city: clean(&self.city),
            postal_code: clean(&self.postal_code),
            notes: clean(&self.notes),
        }
    }

    /// Field errors; every field but `notes` is required.
    #[must_use]
    pub fn errors(&self) -> FormErrors {
        let mut errors = FormErrors::validate(self);
        if !self.email.is_empty() && Email::parse(&self.email).is_err() {
            errors.add("email", INVALID_EMAIL);
        }
        errors.require("first_name", &self.first_name);
        errors.require("last_name", &self.last_name);
        errors.require("email", &self.email);
        errors.require("phone", &self.phone);
        errors.require("address", &self.address);
        errors.require("city", &self.city);
        errors.require("postal_code", &self.postal_code);
        errors
    }

    /// The order to create from this form. The email is stored normalized.
    #[must_use]
    pub fn to_new_order(&self, user: Option<&CurrentUser>) -> NewOrder {
        NewOrder {
            user_id: user.map(|user| user.id),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: Email::parse(&self.email)
                .map_or_else(|_| self.email.clone(), Email::into_inner),
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            notes: self.notes.clone(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "order/checkout.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub form: CheckoutForm,
    pub errors: FormErrors,
    pub items: Vec<CartItem>,
    pub total: String,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "order/confirmation.html")]
pub struct ConfirmationTemplate {
    pub ctx: PageContext,
    pub order: OrderWithItems,
}

// =============================================================================
// Handlers
// =============================================================================

async fn empty_cart_redirect(session: &Session) -> Result<Response> {
    Flash::push(session, FlashLevel::Warning, EMPTY_CART).await?;
    Ok(Redirect::to("/catalog").into_response())
}

/// Cart lines that still resolve to a product, or `None` when there are none.
///
/// An empty session cart is answered without touching the catalog.
async fn checkout_items(state: &AppState, session: &Session) -> Result<Option<Vec<CartItem>>> {
    let service = CartService::new(state.pool(), session);
    let cart = service.load().await?;
    if cart.is_empty() {
        return Ok(None);
    }
    let items = service.items(&cart).await?;
    Ok((!items.is_empty()).then_some(items))
}

/// Sum of the resolved lines at their captured prices.
fn items_total(items: &[CartItem]) -> Decimal {
    items.iter().map(|item| item.line_total).sum()
}

async fn render_checkout(
    session: &Session,
    form: CheckoutForm,
    errors: FormErrors,
    items: Vec<CartItem>,
) -> Result<Response> {
    let total = Price::store(items_total(&items)).display();
    Ok(CheckoutTemplate {
        ctx: PageContext::from_session(session).await,
        form,
        errors,
        items,
        total,
    }
    .into_response())
}

/// Prefill values for a logged-in buyer from their account and profile.
async fn initial_form(state: &AppState, user: Option<&CurrentUser>) -> Result<CheckoutForm> {
    let Some(current) = user else {
        return Ok(CheckoutForm::default());
    };

    let users = UserRepository::new(state.pool());
    let Some(account) = users.get_by_id(current.id).await? else {
        return Ok(CheckoutForm::default());
    };
    let profile = users.get_or_create_profile(current.id).await?;

    Ok(CheckoutForm {
        first_name: account.first_name,
        last_name: account.last_name,
        email: account.email,
        phone: profile.phone,
        address: profile.address,
        city: profile.city,
        postal_code: profile.postal_code,
        notes: String::new(),
    })
}

/// Display the checkout form.
#[instrument(skip(state, session, user))]
pub async fn checkout_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let Some(items) = checkout_items(&state, &session).await? else {
        return empty_cart_redirect(&session).await;
    };

    let form = initial_form(&state, user.as_ref()).await?;
    render_checkout(&session, form, FormErrors::new(), items).await
}

/// Place the order.
#[instrument(skip(state, session, user, form))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let Some(items) = checkout_items(&state, &session).await? else {
        return empty_cart_redirect(&session).await;
    };

    let form = form.cleaned();
    let errors = form.errors();
    if !errors.is_empty() {
        return render_checkout(&session, form, errors, items).await;
    }

    let order = match CheckoutService::new(state.pool(), &session)
        .place_order(&form.to_new_order(user.as_ref()))
        .await
    {
        Ok(order) => order,
        Err(CheckoutError::EmptyCart) => return empty_cart_redirect(&session).await,
        Err(e) => return Err(e.into()),
    };

    Flash::push(&session, FlashLevel::Success, "Order placed.").await?;
    Ok(Redirect::to(&format!("/order/{}/confirmation", order.id)).into_response())
}

/// Display an order confirmation.
#[instrument(skip(state, session, user))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Response> {
    let order = OrderRepository::new(state.pool())
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    let placed = placed_orders(&session).await?;
    if !can_view_order(&order.order, user.as_ref(), &placed) {
        tracing::warn!(%order_id, "Order confirmation access denied");
        Flash::push(
            &session,
            FlashLevel::Error,
            "You do not have access to this order.",
        )
        .await?;
        return Ok(Redirect::to("/").into_response());
    }

    Ok(ConfirmationTemplate {
        ctx: PageContext::from_session(&session).await,
        order,
    }
    .into_response())
}
