use std::fmt::Debug;

use crate::{
    db_types::{Customer, CustomerUpdate, NewCustomer},
    traits::{CustomerApiError, CustomerManagement},
};

fn validate_email(email: &str) -> Result<(), CustomerApiError> {
    // A full RFC 5322 check buys nothing here; the address is only used as a login-free identity.
    if email.trim().is_empty() || !email.contains('@') {
        return Err(CustomerApiError::Validation(format!("'{email}' is not a valid email address")));
    }
    Ok(())
}

pub struct CustomerApi<B> {
    db: B,
}

impl<B> Debug for CustomerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CustomerApi")
    }
}

impl<B> CustomerApi<B>
where B: CustomerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, CustomerApiError> {
        if customer.first_name.trim().is_empty() || customer.last_name.trim().is_empty() {
            return Err(CustomerApiError::Validation("customer name must not be empty".into()));
        }
        validate_email(&customer.email)?;
        self.db.create_customer(customer).await
    }

    pub async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, CustomerApiError> {
        self.db.fetch_customer(id).await
    }

    pub async fn customer_by_email(&self, email: &str) -> Result<Option<Customer>, CustomerApiError> {
        self.db.customer_by_email(email).await
    }

    pub async fn update_customer(&self, id: i64, update: CustomerUpdate) -> Result<Customer, CustomerApiError> {
        if let Some(email) = &update.email {
            validate_email(email)?;
        }
        self.db.update_customer(id, update).await
    }

    pub async fn delete_customer(&self, id: i64) -> Result<(), CustomerApiError> {
        self.db.delete_customer(id).await
    }

    pub async fn list_customers(&self, limit: i64, offset: i64) -> Result<Vec<Customer>, CustomerApiError> {
        self.db.list_customers(limit, offset).await
    }
}
