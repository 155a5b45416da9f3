use thiserror::Error;

use crate::{
    db_types::{Category, NewProduct, Product, ProductUpdate},
    order_objects::ProductQueryFilter,
};

/// Catalog maintenance. Note the deliberate absence of any stock mutation here: stock only moves
/// through the inventory ledger inside order transactions.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogError>;

    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Product, CatalogError>;

    /// Removes a product from the catalog. Refused while order items reference it; deactivate the
    /// product instead to retire it.
    async fn delete_product(&self, id: i64) -> Result<(), CatalogError>;

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogError>;

    async fn search_products(
        &self,
        filter: ProductQueryFilter,
    ) -> Result<Vec<Product>, CatalogError>;

    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, CatalogError>;

    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError>;

    /// Refused while products reference the category.
    async fn delete_category(&self, id: i64) -> Result<(), CatalogError>;
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid product: {0}")]
    Validation(String),
    #[error("Product #{0} does not exist")]
    ProductNotFound(i64),
    #[error("Category #{0} does not exist")]
    CategoryNotFound(i64),
    #[error("A category named '{0}' already exists")]
    DuplicateCategory(String),
    #[error("Category #{0} still has products and cannot be deleted")]
    CategoryInUse(i64),
    #[error("Product #{0} is referenced by existing orders and cannot be deleted")]
    ProductInUse(i64),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
