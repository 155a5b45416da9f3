use std::fmt::Debug;

use crate::{
    db_types::{Driver, DriverUpdate, NewDriver},
    traits::{DriverApiError, DriverManagement},
};

pub struct DriverApi<B> {
    db: B,
}

impl<B> Debug for DriverApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DriverApi")
    }
}

impl<B> DriverApi<B>
where B: DriverManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers a new driver. The password must already be hashed; the server's auth layer owns
    /// hashing and verification.
    pub async fn create_driver(&self, driver: NewDriver) -> Result<Driver, DriverApiError> {
        if driver.first_name.trim().is_empty() || driver.last_name.trim().is_empty() {
            return Err(DriverApiError::Validation("driver name must not be empty".into()));
        }
        if driver.email.trim().is_empty() || !driver.email.contains('@') {
            return Err(DriverApiError::Validation(format!("'{}' is not a valid email address", driver.email)));
        }
        if driver.phone.trim().is_empty() {
            return Err(DriverApiError::Validation("driver phone number must not be empty".into()));
        }
        if driver.password_hash.trim().is_empty() {
            return Err(DriverApiError::Validation("driver password hash must not be empty".into()));
        }
        self.db.create_driver(driver).await
    }

    pub async fn fetch_driver(&self, id: i64) -> Result<Option<Driver>, DriverApiError> {
        self.db.fetch_driver(id).await
    }

    pub async fn driver_by_email(&self, email: &str) -> Result<Option<Driver>, DriverApiError> {
        self.db.driver_by_email(email).await
    }

    pub async fn set_driver_online(&self, id: i64, online: bool) -> Result<Driver, DriverApiError> {
        self.db.set_driver_online(id, online).await
    }

    pub async fn update_driver(&self, id: i64, update: DriverUpdate) -> Result<Driver, DriverApiError> {
        if update.first_name.as_deref().is_some_and(|n| n.trim().is_empty())
            || update.last_name.as_deref().is_some_and(|n| n.trim().is_empty())
        {
            return Err(DriverApiError::Validation("driver name must not be empty".into()));
        }
        if update.phone.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(DriverApiError::Validation("driver phone number must not be empty".into()));
        }
        self.db.update_driver(id, update).await
    }

    pub async fn delete_driver(&self, id: i64) -> Result<(), DriverApiError> {
        self.db.delete_driver(id).await
    }

    pub async fn list_drivers(&self, limit: i64, offset: i64) -> Result<Vec<Driver>, DriverApiError> {
        self.db.list_drivers(limit, offset).await
    }
}
