use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    db_types::{NewOrder, OrderActor, OrderId, OrderStatus, OrderUpdate},
    helpers::{Clock, SystemClock},
    order_objects::{FullOrder, OrderQueryFilter},
    traits::{OrderFlowDatabase, OrderFlowError},
};

/// Drivers only see orders created within this window; anything older has gone stale.
pub const DEFAULT_AVAILABILITY_WINDOW_DAYS: i64 = 7;

/// The order lifecycle API.
///
/// `OrderFlowApi` validates requests and applies the policy that does not belong in storage (the
/// availability window, input validation), then delegates the atomic state changes to the backend.
pub struct OrderFlowApi<B> {
    db: B,
    clock: Arc<dyn Clock>,
    availability_window: Duration,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self::with_clock(db, Arc::new(SystemClock), DEFAULT_AVAILABILITY_WINDOW_DAYS)
    }

    pub fn with_clock(db: B, clock: Arc<dyn Clock>, window_days: i64) -> Self {
        Self { db, clock, availability_window: Duration::days(window_days) }
    }

    /// The oldest creation time a claimable order may have, as of now.
    pub fn availability_cutoff(&self) -> DateTime<Utc> {
        self.clock.now() - self.availability_window
    }
}

impl<B> OrderFlowApi<B>
where B: OrderFlowDatabase
{
    /// Validates and creates a new order. See [`OrderFlowDatabase::create_order`] for the
    /// transactional guarantees.
    pub async fn create_order(&self, order: NewOrder) -> Result<FullOrder, OrderFlowError> {
        if order.items.is_empty() {
            return Err(OrderFlowError::Validation("order must contain at least one item".into()));
        }
        if let Some(item) = order.items.iter().find(|i| i.quantity < 1) {
            return Err(OrderFlowError::Validation(format!(
                "quantity for product #{} must be at least 1",
                item.product_id
            )));
        }
        if order.delivery_address.trim().is_empty() {
            return Err(OrderFlowError::Validation("delivery address must not be empty".into()));
        }
        if order.total_override.is_some_and(|t| t.is_negative()) {
            return Err(OrderFlowError::Validation("order total must not be negative".into()));
        }
        self.db.create_order(order).await
    }

    /// Claims an available order for a driver. Losing a race for the order is reported as
    /// [`OrderFlowError::NoLongerAvailable`]; callers should refresh their view and move on.
    pub async fn claim_order(&self, id: OrderId, driver_id: i64) -> Result<FullOrder, OrderFlowError> {
        let order = self.db.claim_order(id, driver_id).await?;
        debug!("🔄️ Driver {driver_id} now holds order {}", order.order.order_number);
        Ok(order)
    }

    pub async fn deliver_order(&self, id: OrderId, driver_id: i64) -> Result<FullOrder, OrderFlowError> {
        self.db.deliver_order(id, driver_id).await
    }

    pub async fn cancel_order(
        &self,
        id: OrderId,
        actor: &OrderActor,
        reason: Option<&str>,
    ) -> Result<FullOrder, OrderFlowError> {
        self.db.cancel_order(id, actor, reason).await
    }

    pub async fn delete_order(&self, id: OrderId) -> Result<(), OrderFlowError> {
        self.db.delete_order(id).await
    }

    pub async fn admin_update_order(&self, id: OrderId, update: OrderUpdate) -> Result<FullOrder, OrderFlowError> {
        self.db.admin_update_order(id, update).await
    }

    pub async fn fetch_order(&self, id: OrderId) -> Result<Option<FullOrder>, OrderFlowError> {
        self.db.fetch_order(id).await
    }

    /// The claimable orders a driver may take right now, newest first.
    pub async fn available_orders(&self) -> Result<Vec<FullOrder>, OrderFlowError> {
        let cutoff = self.availability_cutoff();
        let orders = self.db.available_orders(cutoff).await?;
        trace!("🔄️ {} orders available since {cutoff}", orders.len());
        Ok(orders)
    }

    pub async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<FullOrder>, OrderFlowError> {
        self.db.search_orders(filter).await
    }

    pub async fn orders_for_customer(&self, email: &str) -> Result<Vec<FullOrder>, OrderFlowError> {
        self.db.orders_for_customer(email).await
    }

    pub async fn orders_for_driver(
        &self,
        driver_id: i64,
        statuses: &[OrderStatus],
    ) -> Result<Vec<FullOrder>, OrderFlowError> {
        self.db.orders_for_driver(driver_id, statuses).await
    }
}
