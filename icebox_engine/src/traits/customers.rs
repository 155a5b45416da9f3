use thiserror::Error;

use crate::db_types::{Customer, CustomerUpdate, NewCustomer};

#[allow(async_fn_in_trait)]
pub trait CustomerManagement {
    /// Creates a customer. Emails are unique; a duplicate reports `EmailExists`.
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, CustomerApiError>;

    /// Returns the customer with the given email, creating one from the supplied details if none
    /// exists. Used by the mobile checkout, where the first order from a new email implicitly
    /// registers the customer.
    async fn fetch_or_create_customer(
        &self,
        customer: NewCustomer,
    ) -> Result<Customer, CustomerApiError>;

    async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, CustomerApiError>;

    async fn customer_by_email(&self, email: &str) -> Result<Option<Customer>, CustomerApiError>;

    async fn update_customer(
        &self,
        id: i64,
        update: CustomerUpdate,
    ) -> Result<Customer, CustomerApiError>;

    /// Refused while the customer owns any order.
    async fn delete_customer(&self, id: i64) -> Result<(), CustomerApiError>;

    async fn list_customers(&self, limit: i64, offset: i64)
        -> Result<Vec<Customer>, CustomerApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum CustomerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid customer: {0}")]
    Validation(String),
    #[error("Customer #{0} does not exist")]
    NotFound(i64),
    #[error("A customer with email {0} already exists")]
    EmailExists(String),
    #[error("Customer #{0} owns orders and cannot be deleted")]
    HasOrders(i64),
}

impl From<sqlx::Error> for CustomerApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
