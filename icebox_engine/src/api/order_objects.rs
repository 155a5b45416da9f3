use chrono::{DateTime, Utc};
use icebox_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db_types::{Customer, Driver, Order, OrderId, OrderStatus};

//--------------------------------------     OrderLine      ---------------------------------------------------------
/// An order item joined with the product it was taken from. The price is the snapshot recorded at
/// order time, not the product's current price.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderLine {
    pub fn subtotal(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------   DriverSummary    ---------------------------------------------------------
/// The driver fields exposed on order aggregates. Credentials never leave the drivers table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSummary {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    pub vehicle_color: Option<String>,
    pub rating: f64,
    pub is_online: bool,
}

impl From<Driver> for DriverSummary {
    fn from(d: Driver) -> Self {
        Self {
            id: d.id,
            name: d.full_name(),
            phone: d.phone,
            vehicle_type: d.vehicle_type,
            license_plate: d.license_plate,
            vehicle_color: d.vehicle_color,
            rating: d.rating,
            is_online: d.is_online,
        }
    }
}

//--------------------------------------     FullOrder      ---------------------------------------------------------
/// A fully-hydrated order: the row itself, the owning customer, the item lines with product
/// names, and the bound driver when one exists. Every read surface (admin, customer app, driver
/// app, tracking) is served from this one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullOrder {
    pub order: Order,
    pub customer: Customer,
    pub items: Vec<OrderLine>,
    pub driver: Option<DriverSummary>,
}

impl FullOrder {
    /// The sum of the snapshotted line subtotals. Matches `order.total` unless the order was
    /// externally priced at creation.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(OrderLine::subtotal).sum()
    }
}

//--------------------------------------  OrderQueryFilter  ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub statuses: Vec<OrderStatus>,
    pub customer_id: Option<i64>,
    pub driver_id: Option<i64>,
    pub order_id: Option<OrderId>,
    /// Matched against the order number with `LIKE`.
    pub search: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl OrderQueryFilter {
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_driver_id(mut self, driver_id: i64) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_search<S: Into<String>>(mut self, term: S) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn paged(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
            && self.customer_id.is_none()
            && self.driver_id.is_none()
            && self.order_id.is_none()
            && self.search.is_none()
            && self.since.is_none()
            && self.until.is_none()
    }
}

//-------------------------------------- ProductQueryFilter ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQueryFilter {
    pub category_id: Option<i64>,
    /// Matched against the product name with `LIKE`.
    pub search: Option<String>,
    /// The mobile catalog only shows active products; admin views show everything.
    pub active_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProductQueryFilter {
    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_search<S: Into<String>>(mut self, term: S) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub fn paged(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}
