use thiserror::Error;

use crate::db_types::{Driver, DriverUpdate, NewDriver};

#[allow(async_fn_in_trait)]
pub trait DriverManagement {
    /// Registers a driver. The password arrives pre-hashed; hashing belongs to the auth layer,
    /// not the store. Duplicate emails report `EmailExists`.
    async fn create_driver(&self, driver: NewDriver) -> Result<Driver, DriverApiError>;

    async fn fetch_driver(&self, id: i64) -> Result<Option<Driver>, DriverApiError>;

    /// Lookup for the signin path. The caller verifies the password hash.
    async fn driver_by_email(&self, email: &str) -> Result<Option<Driver>, DriverApiError>;

    async fn set_driver_online(&self, id: i64, online: bool) -> Result<Driver, DriverApiError>;

    /// Admin field edits: contact details, vehicle, and the verification/active flags.
    async fn update_driver(&self, id: i64, update: DriverUpdate) -> Result<Driver, DriverApiError>;

    /// Refused while any order references the driver: `HasActiveOrders` for `IN_PROGRESS` work,
    /// `HasOrders` when only delivery history remains. History keeps its driver reference, so a
    /// driver with past deliveries is deactivated rather than deleted.
    async fn delete_driver(&self, id: i64) -> Result<(), DriverApiError>;

    async fn list_drivers(&self, limit: i64, offset: i64) -> Result<Vec<Driver>, DriverApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum DriverApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid driver: {0}")]
    Validation(String),
    #[error("Driver #{0} does not exist")]
    NotFound(i64),
    #[error("A driver with email {0} already exists")]
    EmailExists(String),
    #[error("Driver #{0} has orders in progress and cannot be deleted")]
    HasActiveOrders(i64),
    #[error("Driver #{0} is referenced by past orders and cannot be deleted; deactivate instead")]
    HasOrders(i64),
}

impl From<sqlx::Error> for DriverApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
