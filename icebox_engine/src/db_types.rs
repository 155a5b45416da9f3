use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use icebox_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------      OrderId       ---------------------------------------------------------
/// A lightweight wrapper around the database id of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------    OrderStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// The order has been created and no driver has claimed it yet.
    Pending,
    /// A driver has claimed the order and is delivering it.
    InProgress,
    /// The assigned driver has handed the order to the customer. Terminal.
    Delivered,
    /// The order was cancelled by the customer or an operator. Terminal.
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether the invariant requires a driver to be bound to an order in this status.
    pub fn requires_driver(&self) -> bool {
        matches!(self, OrderStatus::InProgress | OrderStatus::Delivered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------       Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable unique order number, e.g. `ORD-000042`. Derived from the row id inside the
    /// insert transaction, so it is unique even under concurrent creation.
    pub order_number: String,
    pub customer_id: i64,
    pub driver_id: Option<i64>,
    pub status: OrderStatus,
    pub total: Money,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The core lifecycle invariant: a driver is bound to the order exactly when the order is
    /// in progress or delivered.
    pub fn driver_binding_is_consistent(&self) -> bool {
        self.status.requires_driver() == self.driver_id.is_some()
    }
}

//--------------------------------------     OrderItem      ---------------------------------------------------------
/// A single line of an order. `unit_price` is snapshotted at order time and never re-read from the
/// product catalog, so historical totals are immune to later price changes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderItem {
    pub fn subtotal(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------      NewOrder      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i64,
}

/// How the creating surface identifies the customer. Admin tooling references an existing record;
/// the mobile checkout supplies contact details and the customer is created on first order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CustomerSelector {
    Id(i64),
    Contact(NewCustomer),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer: CustomerSelector,
    pub delivery_address: String,
    pub items: Vec<NewOrderItem>,
    pub notes: Option<String>,
    /// Externally-priced orders (mobile checkout) supply their total verbatim. When absent, the
    /// total is the sum of the snapshotted item subtotals.
    pub total_override: Option<Money>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(customer: CustomerSelector, delivery_address: S) -> Self {
        Self {
            customer,
            delivery_address: delivery_address.into(),
            items: Vec::new(),
            notes: None,
            total_override: None,
        }
    }

    pub fn with_item(mut self, product_id: i64, quantity: i64) -> Self {
        self.items.push(NewOrderItem { product_id, quantity });
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_total_override(mut self, total: Money) -> Self {
        self.total_override = Some(total);
        self
    }
}

//--------------------------------------     OrderActor     ---------------------------------------------------------
/// The identity on whose behalf a cancellation is performed. Customers may only cancel their own
/// orders; operators may cancel any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderActor {
    /// A customer, identified by their (already authenticated) email address.
    Customer(String),
    /// An operator using the admin tooling.
    Operator,
}

impl Display for OrderActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderActor::Customer(email) => write!(f, "customer {email}"),
            OrderActor::Operator => write!(f, "operator"),
        }
    }
}

impl OrderActor {
    /// The audit line appended to the order notes when this actor cancels an order.
    pub fn cancellation_note(&self, reason: Option<&str>) -> String {
        let actor = match self {
            OrderActor::Customer(_) => "CANCELLED BY CUSTOMER",
            OrderActor::Operator => "CANCELLED BY OPERATOR",
        };
        match reason {
            Some(reason) => format!("{actor}: {reason}"),
            None => actor.to_string(),
        }
    }
}

//--------------------------------------    OrderUpdate     ---------------------------------------------------------
/// Direct field edits for the admin escape hatch. These bypass the claim/deliver guards but the
/// backend still re-validates the driver-binding invariant before committing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    /// `Some(Some(id))` assigns a driver, `Some(None)` clears the assignment, `None` leaves it.
    pub driver_id: Option<Option<i64>>,
    pub notes: Option<String>,
}

impl OrderUpdate {
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_driver(mut self, driver_id: Option<i64>) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.driver_id.is_none() && self.notes.is_none()
    }
}

//--------------------------------------      Product       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub image_url: Option<String>,
    pub category_id: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Money, stock: i64, category_id: i64) -> Self {
        Self { name: name.into(), description: None, price, stock, image_url: None, category_id }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url<S: Into<String>>(mut self, url: S) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// Catalog field edits. Stock is deliberately absent: it is only ever mutated through the
/// inventory ledger as part of an order transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
    pub category_id: Option<i64>,
}

impl ProductUpdate {
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
            && self.is_active.is_none()
            && self.category_id.is_none()
    }
}

//--------------------------------------      Category      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      Customer      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl NewCustomer {
    pub fn new<S1, S2, S3>(first_name: S1, last_name: S2, email: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into().trim().to_ascii_lowercase(),
            phone: None,
            address: None,
            city: None,
            postal_code: None,
        }
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address<S: Into<String>>(mut self, address: S) -> Self {
        self.address = Some(address.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub is_active: Option<bool>,
}

impl CustomerUpdate {
    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into().trim().to_ascii_lowercase());
        self
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.postal_code.is_none()
            && self.is_active.is_none()
    }
}

//--------------------------------------       Driver       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Driver {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 password hash. Never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: String,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    pub vehicle_color: Option<String>,
    pub is_online: bool,
    pub is_verified: bool,
    pub is_active: bool,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDriver {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    pub vehicle_color: Option<String>,
}

impl NewDriver {
    pub fn new<S1, S2, S3, S4, S5>(
        first_name: S1,
        last_name: S2,
        email: S3,
        password_hash: S4,
        phone: S5,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
        S5: Into<String>,
    {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into().trim().to_ascii_lowercase(),
            password_hash: password_hash.into(),
            phone: phone.into(),
            vehicle_type: None,
            license_plate: None,
            vehicle_color: None,
        }
    }

    pub fn with_vehicle<S: Into<String>>(mut self, vehicle_type: S) -> Self {
        self.vehicle_type = Some(vehicle_type.into());
        self
    }

    pub fn with_license_plate<S: Into<String>>(mut self, plate: S) -> Self {
        self.license_plate = Some(plate.into());
        self
    }
}

/// Admin edits to a driver record. Email and credentials are deliberately absent; those change
/// through the auth flows, not the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    pub vehicle_color: Option<String>,
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
}

impl DriverUpdate {
    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_vehicle<S: Into<String>>(mut self, vehicle_type: S) -> Self {
        self.vehicle_type = Some(vehicle_type.into());
        self
    }

    pub fn with_verified(mut self, verified: bool) -> Self {
        self.is_verified = Some(verified);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.vehicle_type.is_none()
            && self.license_plate.is_none()
            && self.vehicle_color.is_none()
            && self.is_verified.is_none()
            && self.is_active.is_none()
    }
}
