use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{NewOrder, OrderActor, OrderId, OrderStatus, OrderUpdate},
    order_objects::{FullOrder, OrderQueryFilter},
};

/// The order lifecycle behaviour a storage backend must provide.
///
/// Every mutating method here is a single atomic unit against the store: stock movements, order
/// rows and item rows either all change or none do. The claim path additionally requires a
/// conditional-update primitive (see [`OrderFlowDatabase::claim_order`]).
#[allow(async_fn_in_trait)]
pub trait OrderFlowDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Creates a new order in a single atomic transaction:
    /// * resolves the customer (creating one from supplied contact details for first-time mobile
    ///   customers),
    /// * snapshots the unit price of every item from the catalog,
    /// * reserves stock for every line, failing the whole order if any line is short,
    /// * inserts the order (status `PENDING`, no driver) and its items, and derives the unique
    ///   order number from the new row id.
    async fn create_order(&self, order: NewOrder) -> Result<FullOrder, OrderFlowError>;

    /// Claim a `PENDING`, unassigned order for a driver, transitioning it to `IN_PROGRESS`.
    ///
    /// The write MUST be conditional on the order still being `PENDING` and unassigned at the
    /// moment of the update. When the conditional update affects zero rows, the claim lost a race
    /// and `NoLongerAvailable` is reported; reading stale state as success is a lost-update bug.
    async fn claim_order(&self, id: OrderId, driver_id: i64) -> Result<FullOrder, OrderFlowError>;

    /// Transition `IN_PROGRESS` → `DELIVERED`. Only the driver currently bound to the order may
    /// perform this transition.
    async fn deliver_order(&self, id: OrderId, driver_id: i64) -> Result<FullOrder, OrderFlowError>;

    /// Cancel a `PENDING` or `IN_PROGRESS` order. The owning customer (email match) or an
    /// operator may cancel. Restores stock for every item and appends an audit line recording the
    /// actor and optional reason, all in one transaction.
    async fn cancel_order(
        &self,
        id: OrderId,
        actor: &OrderActor,
        reason: Option<&str>,
    ) -> Result<FullOrder, OrderFlowError>;

    /// Remove a `PENDING` order and its items entirely, restoring stock. Admin tooling only.
    async fn delete_order(&self, id: OrderId) -> Result<(), OrderFlowError>;

    /// Direct field edits for admin tooling, bypassing the lifecycle guards. Implementations must
    /// still refuse transitions out of terminal states and re-validate the driver-binding
    /// invariant before committing. A transition into `CANCELLED` through this path restores
    /// stock, exactly as [`OrderFlowDatabase::cancel_order`] does.
    async fn admin_update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
    ) -> Result<FullOrder, OrderFlowError>;

    /// Fetch a fully-hydrated order, or `None` if it does not exist.
    async fn fetch_order(&self, id: OrderId) -> Result<Option<FullOrder>, OrderFlowError>;

    /// The driver-visible set of claimable orders: `PENDING`, unassigned, and created at or after
    /// `cutoff`, newest first.
    async fn available_orders(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<FullOrder>, OrderFlowError>;

    /// Admin search over orders.
    async fn search_orders(
        &self,
        filter: OrderQueryFilter,
    ) -> Result<Vec<FullOrder>, OrderFlowError>;

    /// Orders belonging to the customer with the given email. Unknown emails yield an empty list.
    async fn orders_for_customer(&self, email: &str) -> Result<Vec<FullOrder>, OrderFlowError>;

    /// Orders bound to the given driver, filtered to the given statuses.
    async fn orders_for_driver(
        &self,
        driver_id: i64,
        statuses: &[OrderStatus],
    ) -> Result<Vec<FullOrder>, OrderFlowError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid order: {0}")]
    Validation(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Customer #{0} does not exist")]
    CustomerNotFound(i64),
    #[error("Driver #{0} does not exist")]
    DriverNotFound(i64),
    #[error("Product #{0} does not exist")]
    ProductNotFound(i64),
    #[error("Insufficient stock for: {}", .0.join(", "))]
    InsufficientStock(Vec<String>),
    #[error("Order {0} is no longer available")]
    NoLongerAvailable(OrderId),
    #[error("Order {0} is already assigned to another driver")]
    AlreadyAssigned(OrderId),
    #[error("Order {0} is not assigned to this driver")]
    NotAssigned(OrderId),
    #[error("Order {0} has already been delivered")]
    AlreadyDelivered(OrderId),
    #[error("Order {0} is already cancelled")]
    AlreadyCancelled(OrderId),
    #[error("Only pending orders can be deleted; order {0} is not pending")]
    NotPending(OrderId),
    #[error("Not authorized: {0}")]
    Unauthorized(String),
    #[error("Update rejected, it would violate the driver-binding invariant: {0}")]
    InvariantViolation(String),
    #[error("Orders cannot be moved out of a terminal state")]
    TerminalStateChange,
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl OrderFlowError {
    /// Conflict errors leave the order untouched and are safe for the caller to retry against
    /// fresh state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            OrderFlowError::InsufficientStock(_)
                | OrderFlowError::NoLongerAvailable(_)
                | OrderFlowError::AlreadyAssigned(_)
                | OrderFlowError::AlreadyDelivered(_)
                | OrderFlowError::AlreadyCancelled(_)
                | OrderFlowError::NotPending(_)
                | OrderFlowError::TerminalStateChange
        )
    }
}
