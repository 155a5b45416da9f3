#![allow(dead_code)]
use icebox_common::Money;
use icebox_engine::{
    db_types::{Category, Customer, Driver, NewCustomer, NewDriver, NewProduct, Product},
    test_utils::prepare_env::prepare_test_env,
    CatalogApi,
    CustomerApi,
    DriverApi,
    SqliteDatabase,
};

pub async fn new_db() -> SqliteDatabase {
    prepare_test_env().await
}

pub struct SeededCatalog {
    pub category: Category,
    /// $2.50, 10 in stock.
    pub ice_bag: Product,
    /// $8.00, 5 in stock.
    pub ice_block: Product,
    /// $12.00, out of stock.
    pub dry_ice: Product,
}

pub async fn seed_catalog(db: &SqliteDatabase) -> SeededCatalog {
    let catalog = CatalogApi::new(db.clone());
    let category = catalog.create_category("Ice", Some("Frozen goods")).await.expect("Error creating category");
    let ice_bag = catalog
        .create_product(NewProduct::new("Ice Bag 2kg", Money::from_cents(250), 10, category.id))
        .await
        .expect("Error creating product");
    let ice_block = catalog
        .create_product(NewProduct::new("Ice Block", Money::from_cents(800), 5, category.id))
        .await
        .expect("Error creating product");
    let dry_ice = catalog
        .create_product(NewProduct::new("Dry Ice 1kg", Money::from_cents(1200), 0, category.id))
        .await
        .expect("Error creating product");
    SeededCatalog { category, ice_bag, ice_block, dry_ice }
}

pub async fn seed_customer(db: &SqliteDatabase, email: &str) -> Customer {
    let customers = CustomerApi::new(db.clone());
    let new_customer = NewCustomer::new("Alice", "Winters", email).with_address("12 Glacier Rd");
    customers.create_customer(new_customer).await.expect("Error creating customer")
}

pub async fn seed_driver(db: &SqliteDatabase, email: &str) -> Driver {
    let drivers = DriverApi::new(db.clone());
    let new_driver = NewDriver::new("Frank", "Frost", email, "$argon2id$not-a-real-hash", "555-0100")
        .with_vehicle("van")
        .with_license_plate("ICE-001");
    drivers.create_driver(new_driver).await.expect("Error creating driver")
}
