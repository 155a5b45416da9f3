use std::fmt::Debug;

use crate::{
    db_types::{Category, NewProduct, Product, ProductUpdate},
    order_objects::ProductQueryFilter,
    traits::{CatalogError, CatalogManagement},
};

pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        if product.name.trim().is_empty() {
            return Err(CatalogError::Validation("product name must not be empty".into()));
        }
        if product.price.is_negative() {
            return Err(CatalogError::Validation("product price must not be negative".into()));
        }
        if product.stock < 0 {
            return Err(CatalogError::Validation("product stock must not be negative".into()));
        }
        self.db.create_product(product).await
    }

    pub async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Product, CatalogError> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(CatalogError::Validation("product name must not be empty".into()));
        }
        if update.price.is_some_and(|p| p.is_negative()) {
            return Err(CatalogError::Validation("product price must not be negative".into()));
        }
        self.db.update_product(id, update).await
    }

    pub async fn delete_product(&self, id: i64) -> Result<(), CatalogError> {
        self.db.delete_product(id).await
    }

    pub async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        self.db.fetch_product(id).await
    }

    pub async fn search_products(&self, filter: ProductQueryFilter) -> Result<Vec<Product>, CatalogError> {
        self.db.search_products(filter).await
    }

    pub async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category, CatalogError> {
        if name.trim().is_empty() {
            return Err(CatalogError::Validation("category name must not be empty".into()));
        }
        self.db.create_category(name, description).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.db.list_categories().await
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), CatalogError> {
        self.db.delete_category(id).await
    }
}
