use std::fmt::Display;

use icebox_common::Money;
use icebox_engine::{
    db_types::{CustomerSelector, NewCustomer, NewDriver, NewOrder, NewOrderItem, OrderStatus},
    order_objects::{DriverSummary, FullOrder, OrderQueryFilter, ProductQueryFilter},
};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body for order creation. Admin callers reference an existing customer by id; the mobile
/// checkout supplies the customer's contact details instead, and may carry its own total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_id: Option<i64>,
    pub customer: Option<NewCustomer>,
    pub delivery_address: String,
    pub items: Vec<NewOrderItem>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub total: Option<Money>,
}

impl OrderRequest {
    pub fn into_new_order(self) -> Result<NewOrder, ServerError> {
        let customer = match (self.customer_id, self.customer) {
            (Some(id), None) => CustomerSelector::Id(id),
            (None, Some(contact)) => CustomerSelector::Contact(contact),
            _ => {
                return Err(ServerError::InvalidRequestBody(
                    "supply exactly one of customer_id or customer".into(),
                ))
            },
        };
        Ok(NewOrder {
            customer,
            delivery_address: self.delivery_address,
            items: self.items,
            notes: self.notes,
            total_override: self.total,
        })
    }
}

/// Body for `POST /api/orders/{id}/cancel`. The endpoint is unauthenticated, so `email` is
/// mandatory and is checked against the order's owner before anything changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub vehicle_color: Option<String>,
}

impl DriverSignupRequest {
    pub fn into_new_driver(self, password_hash: String) -> NewDriver {
        NewDriver {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email.trim().to_ascii_lowercase(),
            password_hash,
            phone: self.phone,
            vehicle_type: self.vehicle_type,
            license_plate: self.license_plate,
            vehicle_color: self.vehicle_color,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub driver: DriverSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverStatusRequest {
    pub is_online: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The public tracking view of an order. No customer contact details, no pricing internals beyond
/// the total the customer already knows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub order_number: String,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub total: Money,
    pub driver: Option<DriverSummary>,
}

impl From<FullOrder> for TrackingResponse {
    fn from(full: FullOrder) -> Self {
        Self {
            order_number: full.order.order_number,
            status: full.order.status,
            delivery_address: full.order.delivery_address,
            total: full.order.total,
            driver: full.driver,
        }
    }
}

const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 500)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or_default().max(0)
    }
}

/// Query parameters for `GET /api/orders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchParams {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<i64>,
    pub driver_id: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<OrderSearchParams> for OrderQueryFilter {
    fn from(params: OrderSearchParams) -> Self {
        OrderQueryFilter {
            statuses: params.status.into_iter().collect(),
            customer_id: params.customer_id,
            driver_id: params.driver_id,
            order_id: None,
            search: params.search,
            since: None,
            until: None,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

/// Query parameters for `GET /api/products`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSearchParams {
    pub category_id: Option<i64>,
    pub search: Option<String>,
    #[serde(default)]
    pub active_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ProductSearchParams> for ProductQueryFilter {
    fn from(params: ProductSearchParams) -> Self {
        ProductQueryFilter {
            category_id: params.category_id,
            search: params.search,
            active_only: params.active_only,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

/// Query parameters for the driver's own order list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverOrderParams {
    pub status: Option<OrderStatus>,
}

/// Query parameters for the mobile order history lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerOrderParams {
    pub email: String,
}
