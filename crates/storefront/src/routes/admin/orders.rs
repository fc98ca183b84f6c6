//! Admin order list, detail and status changes.

use std::borrow::Borrow;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use greenshop_core::{OrderId, OrderStatus};

use super::search_term;
use crate::db::orders::{CreatedRange, OrderFilter, OrderListRow, SalesStats};
use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireStaff};
use crate::models::{Flash, FlashLevel, OrderWithItems};
use crate::state::AppState;

/// `?status=&created=&q=` on the order list.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub created: Option<String>,
    pub q: Option<String>,
}

impl OrderListQuery {
    /// Unknown status or range values mean "any".
    #[must_use]
    pub fn filter(&self) -> OrderFilter {
        OrderFilter {
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            created: self.created.as_deref().and_then(CreatedRange::parse),
            query: search_term(self.q.as_ref()),
        }
    }
}

/// Status change form on the detail page.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders/index.html")]
pub struct OrdersIndexTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub orders: Vec<OrderListRow>,
    pub stats: SalesStats,
    pub active_status: Option<OrderStatus>,
    pub active_created: Option<CreatedRange>,
    pub query: String,
}

impl OrdersIndexTemplate {
    #[must_use]
    pub fn statuses(&self) -> [OrderStatus; 5] {
        OrderStatus::ALL
    }

    #[must_use]
    pub fn ranges(&self) -> [CreatedRange; 4] {
        CreatedRange::ALL
    }

    #[must_use]
    pub fn is_status(&self, status: impl Borrow<OrderStatus>) -> bool {
        self.active_status.as_ref() == Some(status.borrow())
    }

    #[must_use]
    pub fn is_range(&self, range: impl Borrow<CreatedRange>) -> bool {
        self.active_created.as_ref() == Some(range.borrow())
    }
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders/show.html")]
pub struct OrderShowTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub order: OrderWithItems,
    pub customer: Option<String>,
}

impl OrderShowTemplate {
    #[must_use]
    pub fn statuses(&self) -> [OrderStatus; 5] {
        OrderStatus::ALL
    }

    /// Whether `status` is the order's current status.
    #[must_use]
    pub fn is_current(&self, status: impl Borrow<OrderStatus>) -> bool {
        *status.borrow() == self.order.order.status
    }
}

/// Order list with filters, search and sales statistics.
#[instrument(skip(state, staff, ctx, query), fields(user_id = %staff.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ctx: PageContext,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.filter();
    let now = Utc::now();
    let repo = OrderRepository::new(state.pool());
    let (orders, stats) = tokio::try_join!(
        repo.admin_list(&filter, now),
        repo.sales_stats(&filter, now),
    )?;

    Ok(OrdersIndexTemplate {
        ctx,
        current_path: "/admin/orders",
        orders,
        stats,
        active_status: filter.status,
        active_created: filter.created,
        query: filter.query.unwrap_or_default(),
    })
}

/// Order detail page.
#[instrument(skip(state, staff, ctx), fields(user_id = %staff.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ctx: PageContext,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let customer = match order.order.user_id {
        Some(user_id) => UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await?
            .map(|user| user.username),
        None => None,
    };

    Ok(OrderShowTemplate {
        ctx,
        current_path: "/admin/orders",
        order,
        customer,
    })
}

/// Change an order's status.
#[instrument(skip(state, staff, session, form), fields(user_id = %staff.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let Ok(status) = form.status.parse::<OrderStatus>() else {
        Flash::push(&session, FlashLevel::Error, "Select a valid status.").await?;
        return Ok(Redirect::to(&format!("/admin/orders/{id}")).into_response());
    };

    OrderRepository::new(state.pool())
        .update_status(id, status)
        .await?;
    tracing::info!(order_id = %id, status = %status, "Order status changed");

    Flash::push(
        &session,
        FlashLevel::Success,
        format!("Order #{id} is now {}.", status.label()),
    )
    .await?;
    Ok(Redirect::to(&format!("/admin/orders/{id}")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_filter() {
        let query = OrderListQuery {
            status: Some("shipped".to_owned()),
            created: Some("past_7_days".to_owned()),
            q: Some("petrova".to_owned()),
        };
        let filter = query.filter();
        assert_eq!(filter.status, Some(OrderStatus::Shipped));
        assert_eq!(filter.created, Some(CreatedRange::Past7Days));
        assert_eq!(filter.query.as_deref(), Some("petrova"));
    }

    #[test]
    fn test_unknown_filter_values_are_ignored() {
        let query = OrderListQuery {
            status: Some("lost".to_owned()),
            created: Some("last_century".to_owned()),
            q: Some(String::new()),
        };
        let filter = query.filter();
        assert_eq!(filter.status, None);
        assert_eq!(filter.created, None);
        assert_eq!(filter.query, None);
    }
}
