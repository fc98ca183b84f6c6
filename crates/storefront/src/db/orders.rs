//! Order repository.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use greenshop_core::{OrderId, OrderStatus, ProductId, UserId};

use super::{RepositoryError, like_pattern};
use crate::models::order::{NewOrder, Order, OrderItemDetail, OrderWithItems};

const ORDER_COLUMNS: &str = "id, user_id, first_name, last_name, email, phone, address, city, \
     postal_code, notes, status, created_at, updated_at";

const ITEM_DETAIL_SELECT: &str = r"
SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.unit_price,
       p.name AS product_name, p.slug AS product_slug
FROM order_items oi
JOIN products p ON p.id = oi.product_id
";

/// One line to insert with a new order.
#[derive(Debug, Clone, Copy)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Preset windows for the admin "created" filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatedRange {
    Today,
    Past7Days,
    ThisMonth,
    ThisYear,
}

impl CreatedRange {
    pub const ALL: [Self; 4] = [Self::Today, Self::Past7Days, Self::ThisMonth, Self::ThisYear];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Past7Days => "past_7_days",
            Self::ThisMonth => "this_month",
            Self::ThisYear => "this_year",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Past7Days => "Past 7 days",
            Self::ThisMonth => "This month",
            Self::ThisYear => "This year",
        }
    }

    /// Parse the query-string value; unknown values mean "any date".
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|range| range.as_str() == value)
    }

    /// Half-open `[start, end)` window containing `now` (UTC calendar).
    #[must_use]
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.date_naive();
        let tomorrow = today.succ_opt().unwrap_or(today);
        let (start, end) = match self {
            Self::Today => (today, tomorrow),
            Self::Past7Days => (today - Duration::days(7), tomorrow),
            Self::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                let next = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
                };
                (first, next.unwrap_or(tomorrow))
            }
            Self::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap_or(tomorrow),
            ),
        };
        (midnight(start), midnight(end))
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Admin order list filters.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub created: Option<CreatedRange>,
    /// Matches first name, last name, email or phone.
    pub query: Option<String>,
}

/// Order row with its computed total, for list pages.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderListRow {
    #[sqlx(flatten)]
    pub order: Order,
    pub total_amount: Decimal,
    pub item_count: i64,
}

impl OrderListRow {
    #[must_use]
    pub fn total_display(&self) -> String {
        greenshop_core::Price::store(self.total_amount).display()
    }
}

/// Aggregate sales figures over a set of orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct SalesStats {
    pub orders: i64,
    pub revenue: Decimal,
    pub items_sold: i64,
}

impl SalesStats {
    #[must_use]
    pub fn revenue_display(&self) -> String {
        greenshop_core::Price::store(self.revenue).display()
    }
}

/// Lifetime figures for a customer's account page.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct CustomerStats {
    pub orders_count: i64,
    pub total_spent: Decimal,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its lines in one transaction.
    ///
    /// Nothing is written if any insert fails.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails and
    /// `RepositoryError::Protected` if a line references a missing product.
    pub async fn create_with_items(
        &self,
        order: &NewOrder,
        lines: &[NewOrderLine],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (user_id, first_name, last_name, email, phone, address, city, \
             postal_code, notes) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.user_id)
        .bind(&order.first_name)
        .bind(&order.last_name)
        .bind(&order.email)
        .bind(&order.phone)
        .bind(&order.address)
        .bind(&order.city)
        .bind(&order.postal_code)
        .bind(&order.notes)
        .fetch_one(&mut *tx)
        .await?;

        for line in lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(created.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_write(e, "order item"))?;
        }

        tx.commit().await?;
        Ok(created)
    }

    /// An order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError> {
        let Some(order) = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = self.items_for(&[order.id]).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    /// A user's orders, newest first, each with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn for_user(
        &self,
        user_id: UserId,
        limit: Option<i64>,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<OrderId> = orders.iter().map(|order| order.id).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let (mine, rest): (Vec<_>, Vec<_>) = items
                    .drain(..)
                    .partition(|detail| detail.item.order_id == order.id);
                items = rest;
                OrderWithItems { order, items: mine }
            })
            .collect())
    }

    /// Order count and lifetime spend for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_stats(&self, user_id: UserId) -> Result<CustomerStats, RepositoryError> {
        let stats = sqlx::query_as::<_, CustomerStats>(
            r"
            SELECT
                (SELECT COUNT(*) FROM orders WHERE user_id = $1) AS orders_count,
                COALESCE(SUM(oi.unit_price * oi.quantity), 0) AS total_spent
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(stats)
    }

    async fn items_for(&self, ids: &[OrderId]) -> Result<Vec<OrderItemDetail>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(OrderId::as_i32).collect();
        let items = sqlx::query_as::<_, OrderItemDetail>(&format!(
            "{ITEM_DETAIL_SELECT} WHERE oi.order_id = ANY($1) ORDER BY oi.order_id, oi.id"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Filtered order list with totals, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_list(
        &self,
        filter: &OrderFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderListRow>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r"
            SELECT o.id, o.user_id, o.first_name, o.last_name, o.email, o.phone, o.address,
                   o.city, o.postal_code, o.notes, o.status, o.created_at, o.updated_at,
                   COALESCE(SUM(oi.unit_price * oi.quantity), 0) AS total_amount,
                   COALESCE(SUM(oi.quantity), 0)::BIGINT AS item_count
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            ",
        );
        push_order_filters(&mut qb, filter, now);
        qb.push(" GROUP BY o.id ORDER BY o.created_at DESC, o.id DESC");
        Ok(qb
            .build_query_as::<OrderListRow>()
            .fetch_all(self.pool)
            .await?)
    }

    /// Sales statistics over the orders matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_stats(
        &self,
        filter: &OrderFilter,
        now: DateTime<Utc>,
    ) -> Result<SalesStats, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r"
            SELECT COUNT(DISTINCT o.id) AS orders,
                   COALESCE(SUM(oi.unit_price * oi.quantity), 0) AS revenue,
                   COALESCE(SUM(oi.quantity), 0)::BIGINT AS items_sold
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            ",
        );
        push_order_filters(&mut qb, filter, now);
        Ok(qb
            .build_query_as::<SalesStats>()
            .fetch_one(self.pool)
            .await?)
    }

    /// Change an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?)
    }
}

/// Append the admin order `WHERE` clause.
fn push_order_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter, now: DateTime<Utc>) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND o.status = ").push_bind(status);
    }
    if let Some(range) = filter.created {
        let (start, end) = range.bounds(now);
        qb.push(" AND o.created_at >= ")
            .push_bind(start)
            .push(" AND o.created_at < ")
            .push_bind(end);
    }
    if let Some(query) = &filter.query {
        let pattern = like_pattern(query);
        qb.push(" AND (o.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_created_range_today() {
        let (start, end) = CreatedRange::Today.bounds(at("2026-03-15T13:45:00Z"));
        assert_eq!(start, at("2026-03-15T00:00:00Z"));
        assert_eq!(end, at("2026-03-16T00:00:00Z"));
    }

    #[test]
    fn test_created_range_past_7_days() {
        let (start, end) = CreatedRange::Past7Days.bounds(at("2026-03-15T13:45:00Z"));
        assert_eq!(start, at("2026-03-08T00:00:00Z"));
        assert_eq!(end, at("2026-03-16T00:00:00Z"));
    }

    #[test]
    fn test_created_range_this_month_rolls_over_december() {
        let (start, end) = CreatedRange::ThisMonth.bounds(at("2026-12-31T23:59:00Z"));
        assert_eq!(start, at("2026-12-01T00:00:00Z"));
        assert_eq!(end, at("2027-01-01T00:00:00Z"));
    }

    #[test]
    fn test_created_range_this_year() {
        let (start, end) = CreatedRange::ThisYear.bounds(at("2026-06-01T00:00:00Z"));
        assert_eq!(start, at("2026-01-01T00:00:00Z"));
        assert_eq!(end, at("2027-01-01T00:00:00Z"));
    }

    #[test]
    fn test_created_range_parse() {
        assert_eq!(CreatedRange::parse("this_month"), Some(CreatedRange::ThisMonth));
        assert_eq!(CreatedRange::parse("yesterday"), None);
    }

    #[test]
    fn test_order_filters_sql() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Shipped),
            created: None,
            query: Some("anna".to_owned()),
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM orders o");
        push_order_filters(&mut qb, &filter, Utc::now());
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM orders o WHERE TRUE AND o.status = $1 AND (o.first_name ILIKE $2 \
             OR o.last_name ILIKE $3 OR o.email ILIKE $4 OR o.phone ILIKE $5)"
        );
    }
}
