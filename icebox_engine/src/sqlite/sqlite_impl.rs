//! `SqliteDatabase` is the concrete SQLite backend for the Icebox order engine.
//!
//! It implements every storage trait in the [`crate::traits`] module. Each mutating method opens a
//! transaction, composes the low-level functions from [`super::db`] and commits only when every
//! step succeeded, so stock movements and order rows never drift apart.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use icebox_common::Money;
use log::*;
use sqlx::SqlitePool;

use super::db::{customers, db_url, drivers, new_pool, orders, products};
use crate::{
    db_types::{
        Category,
        Customer,
        CustomerSelector,
        CustomerUpdate,
        Driver,
        DriverUpdate,
        NewCustomer,
        NewDriver,
        NewOrder,
        NewProduct,
        OrderActor,
        OrderId,
        OrderStatus,
        OrderUpdate,
        Product,
        ProductUpdate,
    },
    order_objects::{FullOrder, OrderQueryFilter, ProductQueryFilter},
    traits::{
        CatalogError,
        CatalogManagement,
        CustomerApiError,
        CustomerManagement,
        DriverApiError,
        DriverManagement,
        OrderFlowDatabase,
        OrderFlowError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database given by the `ICEBOX_DATABASE_URL` environment variable, or the
    /// default path if unset.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(de) if de.is_unique_violation())
}

impl OrderFlowDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_order(&self, order: NewOrder) -> Result<FullOrder, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let customer = match order.customer {
            CustomerSelector::Id(id) => customers::fetch_customer(id, &mut tx)
                .await?
                .ok_or(OrderFlowError::CustomerNotFound(id))?,
            CustomerSelector::Contact(contact) => customers::fetch_or_create_customer(contact, &mut tx).await?,
        };
        // First pass: resolve every product and collect all the lines that are short, so the
        // caller sees the complete shortfall rather than just the first one.
        let mut resolved = Vec::with_capacity(order.items.len());
        let mut short = Vec::new();
        for item in &order.items {
            let product = products::fetch_product(item.product_id, &mut tx)
                .await?
                .ok_or(OrderFlowError::ProductNotFound(item.product_id))?;
            if product.stock < item.quantity {
                short.push(product.name.clone());
            }
            resolved.push((product, item.quantity));
        }
        if !short.is_empty() {
            return Err(OrderFlowError::InsufficientStock(short));
        }
        // Second pass: conditional decrements. A line that raced to zero since the check fails
        // here and rolls the whole order back.
        for (product, quantity) in &resolved {
            if !products::reserve_stock(product.id, *quantity, &mut tx).await? {
                return Err(OrderFlowError::InsufficientStock(vec![product.name.clone()]));
            }
        }
        let total = match order.total_override {
            Some(total) => total,
            None => resolved.iter().map(|(p, q)| p.price * *q).sum::<Money>(),
        };
        let row = orders::insert_order(
            customer.id,
            &order.delivery_address,
            order.notes.as_deref(),
            total,
            &mut tx,
        )
        .await?;
        for (product, quantity) in &resolved {
            orders::insert_order_item(row.id, product.id, *quantity, product.price, &mut tx).await?;
        }
        let full = orders::fetch_full_order(row.id, &mut tx).await?.ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;
        info!("🔄️ Order {} created for customer {} ({})", full.order.order_number, customer.id, total);
        Ok(full)
    }

    async fn claim_order(&self, id: OrderId, driver_id: i64) -> Result<FullOrder, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let _driver = drivers::fetch_driver(driver_id, &mut tx)
            .await?
            .ok_or(OrderFlowError::DriverNotFound(driver_id))?;
        if !orders::claim_order(id, driver_id, &mut tx).await? {
            // The conditional update missed. Distinguish a missing order, a desynced row that is
            // still PENDING but already carries a driver reference, and a plain lost race.
            return match orders::fetch_order(id, &mut tx).await? {
                None => Err(OrderFlowError::OrderNotFound(id)),
                Some(o) if o.status == OrderStatus::Pending && o.driver_id.is_some() => {
                    Err(OrderFlowError::AlreadyAssigned(id))
                },
                Some(_) => Err(OrderFlowError::NoLongerAvailable(id)),
            };
        }
        let full = orders::fetch_full_order(id, &mut tx).await?.ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;
        info!("🔄️ Order {} claimed by driver {driver_id}", full.order.order_number);
        Ok(full)
    }

    async fn deliver_order(&self, id: OrderId, driver_id: i64) -> Result<FullOrder, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        if !orders::deliver_order(id, driver_id, &mut tx).await? {
            let err = match orders::fetch_order(id, &mut tx).await? {
                None => OrderFlowError::OrderNotFound(id),
                Some(o) if o.status == OrderStatus::Delivered => OrderFlowError::AlreadyDelivered(id),
                Some(o) if o.status == OrderStatus::Cancelled => OrderFlowError::AlreadyCancelled(id),
                Some(_) => OrderFlowError::NotAssigned(id),
            };
            return Err(err);
        }
        let full = orders::fetch_full_order(id, &mut tx).await?.ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;
        info!("🔄️ Order {} delivered by driver {driver_id}", full.order.order_number);
        Ok(full)
    }

    async fn cancel_order(
        &self,
        id: OrderId,
        actor: &OrderActor,
        reason: Option<&str>,
    ) -> Result<FullOrder, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(id, &mut tx).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        if let OrderActor::Customer(email) = actor {
            let owner = customers::fetch_customer(order.customer_id, &mut tx)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            if owner.email != email.trim().to_ascii_lowercase() {
                return Err(OrderFlowError::Unauthorized(format!(
                    "order {id} does not belong to this customer"
                )));
            }
        }
        match order.status {
            OrderStatus::Delivered => return Err(OrderFlowError::AlreadyDelivered(id)),
            OrderStatus::Cancelled => return Err(OrderFlowError::AlreadyCancelled(id)),
            _ => {},
        }
        let note = actor.cancellation_note(reason);
        if !orders::cancel_order(id, &note, &mut tx).await? {
            return Err(OrderFlowError::NoLongerAvailable(id));
        }
        let lines = orders::fetch_order_lines(id, &mut tx).await?;
        for line in &lines {
            products::release_stock(line.product_id, line.quantity, &mut tx).await?;
        }
        let full = orders::fetch_full_order(id, &mut tx).await?.ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;
        info!("🔄️ Order {} cancelled by {actor}", full.order.order_number);
        Ok(full)
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(id, &mut tx).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        if order.status != OrderStatus::Pending {
            return Err(OrderFlowError::NotPending(id));
        }
        let lines = orders::fetch_order_lines(id, &mut tx).await?;
        for line in &lines {
            products::release_stock(line.product_id, line.quantity, &mut tx).await?;
        }
        orders::delete_order(id, &mut tx).await?;
        tx.commit().await?;
        info!("🔄️ Order {} deleted", order.order_number);
        Ok(())
    }

    async fn admin_update_order(&self, id: OrderId, update: OrderUpdate) -> Result<FullOrder, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(id, &mut tx).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        if update.is_empty() {
            let full = orders::fetch_full_order(id, &mut tx).await?.ok_or(sqlx::Error::RowNotFound)?;
            return Ok(full);
        }
        let new_status = update.status.unwrap_or(order.status);
        if order.status.is_terminal() && new_status != order.status {
            return Err(OrderFlowError::TerminalStateChange);
        }
        let new_driver = update.driver_id.unwrap_or(order.driver_id);
        if new_status.requires_driver() != new_driver.is_some() {
            return Err(OrderFlowError::InvariantViolation(format!(
                "status {new_status} with driver assignment {new_driver:?}"
            )));
        }
        if let Some(driver_id) = new_driver {
            drivers::fetch_driver(driver_id, &mut tx)
                .await?
                .ok_or(OrderFlowError::DriverNotFound(driver_id))?;
        }
        // An admin cancellation restores stock exactly like the lifecycle path.
        if new_status == OrderStatus::Cancelled && order.status != OrderStatus::Cancelled {
            let lines = orders::fetch_order_lines(id, &mut tx).await?;
            for line in &lines {
                products::release_stock(line.product_id, line.quantity, &mut tx).await?;
            }
        }
        orders::update_order(id, &update, &mut tx).await?;
        let full = orders::fetch_full_order(id, &mut tx).await?.ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;
        debug!("🔄️ Order {} updated by admin", full.order.order_number);
        Ok(full)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<FullOrder>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let full = orders::fetch_full_order(id, &mut conn).await?;
        Ok(full)
    }

    async fn available_orders(&self, cutoff: DateTime<Utc>) -> Result<Vec<FullOrder>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let rows = orders::available_orders(cutoff, &mut conn).await?;
        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(orders::hydrate_order(row, &mut conn).await?);
        }
        Ok(result)
    }

    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<FullOrder>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let rows = orders::search_orders(filter, &mut conn).await?;
        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(orders::hydrate_order(row, &mut conn).await?);
        }
        Ok(result)
    }

    async fn orders_for_customer(&self, email: &str) -> Result<Vec<FullOrder>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let Some(customer) = customers::fetch_customer_by_email(email, &mut conn).await? else {
            return Ok(Vec::new());
        };
        let filter = OrderQueryFilter::default().with_customer_id(customer.id);
        let rows = orders::search_orders(filter, &mut conn).await?;
        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(orders::hydrate_order(row, &mut conn).await?);
        }
        Ok(result)
    }

    async fn orders_for_driver(
        &self,
        driver_id: i64,
        statuses: &[OrderStatus],
    ) -> Result<Vec<FullOrder>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let rows = orders::orders_for_driver(driver_id, statuses, &mut conn).await?;
        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(orders::hydrate_order(row, &mut conn).await?);
        }
        Ok(result)
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_category(product.category_id, &mut conn)
            .await?
            .ok_or(CatalogError::CategoryNotFound(product.category_id))?;
        let product = products::insert_product(product, &mut conn).await?;
        Ok(product)
    }

    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let existing = products::fetch_product(id, &mut conn).await?.ok_or(CatalogError::ProductNotFound(id))?;
        if update.is_empty() {
            return Ok(existing);
        }
        if let Some(category_id) = update.category_id {
            products::fetch_category(category_id, &mut conn)
                .await?
                .ok_or(CatalogError::CategoryNotFound(category_id))?;
        }
        let product = products::update_product(id, &update, &mut conn).await?;
        Ok(product)
    }

    async fn delete_product(&self, id: i64) -> Result<(), CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(id, &mut conn).await?.ok_or(CatalogError::ProductNotFound(id))?;
        if orders::product_reference_count(id, &mut conn).await? > 0 {
            return Err(CatalogError::ProductInUse(id));
        }
        products::delete_product(id, &mut conn).await?;
        Ok(())
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn search_products(&self, filter: ProductQueryFilter) -> Result<Vec<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::search_products(filter, &mut conn).await?;
        Ok(products)
    }

    async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_category(name, description, &mut conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::DuplicateCategory(name.to_string())
            } else {
                e.into()
            }
        })
    }

    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let categories = products::fetch_categories(&mut conn).await?;
        Ok(categories)
    }

    async fn delete_category(&self, id: i64) -> Result<(), CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_category(id, &mut conn).await?.ok_or(CatalogError::CategoryNotFound(id))?;
        if products::category_product_count(id, &mut conn).await? > 0 {
            return Err(CatalogError::CategoryInUse(id));
        }
        products::delete_category(id, &mut conn).await?;
        Ok(())
    }
}

impl CustomerManagement for SqliteDatabase {
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let email = customer.email.clone();
        customers::insert_customer(customer, &mut conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                CustomerApiError::EmailExists(email)
            } else {
                e.into()
            }
        })
    }

    async fn fetch_or_create_customer(&self, customer: NewCustomer) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_or_create_customer(customer, &mut conn).await?;
        Ok(customer)
    }

    async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_customer(id, &mut conn).await?;
        Ok(customer)
    }

    async fn customer_by_email(&self, email: &str) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_customer_by_email(email, &mut conn).await?;
        Ok(customer)
    }

    async fn update_customer(&self, id: i64, update: CustomerUpdate) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let existing = customers::fetch_customer(id, &mut conn).await?.ok_or(CustomerApiError::NotFound(id))?;
        if update.is_empty() {
            return Ok(existing);
        }
        let email = update.email.clone().unwrap_or(existing.email);
        customers::update_customer(id, &update, &mut conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                CustomerApiError::EmailExists(email)
            } else {
                e.into()
            }
        })
    }

    async fn delete_customer(&self, id: i64) -> Result<(), CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::fetch_customer(id, &mut conn).await?.ok_or(CustomerApiError::NotFound(id))?;
        if orders::customer_order_count(id, &mut conn).await? > 0 {
            return Err(CustomerApiError::HasOrders(id));
        }
        customers::delete_customer(id, &mut conn).await?;
        Ok(())
    }

    async fn list_customers(&self, limit: i64, offset: i64) -> Result<Vec<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let customers = customers::fetch_customers(limit, offset, &mut conn).await?;
        Ok(customers)
    }
}

impl DriverManagement for SqliteDatabase {
    async fn create_driver(&self, driver: NewDriver) -> Result<Driver, DriverApiError> {
        let mut conn = self.pool.acquire().await?;
        let email = driver.email.clone();
        drivers::insert_driver(driver, &mut conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                DriverApiError::EmailExists(email)
            } else {
                e.into()
            }
        })
    }

    async fn fetch_driver(&self, id: i64) -> Result<Option<Driver>, DriverApiError> {
        let mut conn = self.pool.acquire().await?;
        let driver = drivers::fetch_driver(id, &mut conn).await?;
        Ok(driver)
    }

    async fn driver_by_email(&self, email: &str) -> Result<Option<Driver>, DriverApiError> {
        let mut conn = self.pool.acquire().await?;
        let driver = drivers::fetch_driver_by_email(email, &mut conn).await?;
        Ok(driver)
    }

    async fn set_driver_online(&self, id: i64, online: bool) -> Result<Driver, DriverApiError> {
        let mut conn = self.pool.acquire().await?;
        let driver =
            drivers::set_driver_online(id, online, &mut conn).await?.ok_or(DriverApiError::NotFound(id))?;
        Ok(driver)
    }

    async fn update_driver(&self, id: i64, update: DriverUpdate) -> Result<Driver, DriverApiError> {
        let mut conn = self.pool.acquire().await?;
        let existing = drivers::fetch_driver(id, &mut conn).await?.ok_or(DriverApiError::NotFound(id))?;
        if update.is_empty() {
            return Ok(existing);
        }
        let driver = drivers::update_driver(id, &update, &mut conn).await?;
        Ok(driver)
    }

    async fn delete_driver(&self, id: i64) -> Result<(), DriverApiError> {
        let mut conn = self.pool.acquire().await?;
        drivers::fetch_driver(id, &mut conn).await?.ok_or(DriverApiError::NotFound(id))?;
        if orders::driver_active_order_count(id, &mut conn).await? > 0 {
            return Err(DriverApiError::HasActiveOrders(id));
        }
        // Delivered orders keep their driver reference, so a driver with history cannot be
        // removed without breaking the audit trail.
        if orders::driver_order_count(id, &mut conn).await? > 0 {
            return Err(DriverApiError::HasOrders(id));
        }
        drivers::delete_driver(id, &mut conn).await?;
        Ok(())
    }

    async fn list_drivers(&self, limit: i64, offset: i64) -> Result<Vec<Driver>, DriverApiError> {
        let mut conn = self.pool.acquire().await?;
        let drivers = drivers::fetch_drivers(limit, offset, &mut conn).await?;
        Ok(drivers)
    }
}
