//! Catalog, customer and driver registry rules.
use icebox_common::Money;
use icebox_engine::{
    db_types::{
        CustomerSelector,
        CustomerUpdate,
        DriverUpdate,
        NewCustomer,
        NewDriver,
        NewOrder,
        NewProduct,
        ProductUpdate,
    },
    order_objects::ProductQueryFilter,
    CatalogApi,
    CatalogError,
    CustomerApi,
    CustomerApiError,
    DriverApi,
    DriverApiError,
    OrderFlowApi,
    SqliteDatabase,
};

mod support;
use support::{new_db, seed_catalog, seed_customer, seed_driver};

fn catalog(db: &SqliteDatabase) -> CatalogApi<SqliteDatabase> {
    CatalogApi::new(db.clone())
}

#[tokio::test]
async fn customer_emails_are_unique_and_case_insensitive() {
    let db = new_db().await;
    let api = CustomerApi::new(db.clone());

    let created = api.create_customer(NewCustomer::new("Alice", "Winters", "Alice@Example.COM")).await.unwrap();
    assert_eq!(created.email, "alice@example.com");

    let err = api.create_customer(NewCustomer::new("Alan", "Winters", "alice@example.com")).await;
    assert!(matches!(err, Err(CustomerApiError::EmailExists(_))));

    let found = api.customer_by_email("ALICE@example.com").await.unwrap();
    assert_eq!(found.map(|c| c.id), Some(created.id));

    assert!(matches!(
        api.create_customer(NewCustomer::new("No", "Email", "not-an-email")).await,
        Err(CustomerApiError::Validation(_))
    ));
}

#[tokio::test]
async fn customer_updates_apply_only_the_given_fields() {
    let db = new_db().await;
    let api = CustomerApi::new(db.clone());
    let customer = seed_customer(&db, "alice@example.com").await;

    let update = CustomerUpdate::default().with_phone("555-0177");
    let updated = api.update_customer(customer.id, update).await.unwrap();
    assert_eq!(updated.phone.as_deref(), Some("555-0177"));
    assert_eq!(updated.first_name, customer.first_name);
    assert_eq!(updated.address, customer.address);

    assert!(matches!(
        api.update_customer(999, CustomerUpdate::default().with_phone("555-0000")).await,
        Err(CustomerApiError::NotFound(999))
    ));
}

#[tokio::test]
async fn customers_with_orders_cannot_be_deleted() {
    let db = new_db().await;
    let seeded = seed_catalog(&db).await;
    let customer = seed_customer(&db, "alice@example.com").await;
    let api = CustomerApi::new(db.clone());
    let flow = OrderFlowApi::new(db.clone());

    flow.create_order(
        NewOrder::new(CustomerSelector::Id(customer.id), "12 Glacier Rd").with_item(seeded.ice_bag.id, 1),
    )
    .await
    .unwrap();

    assert!(matches!(api.delete_customer(customer.id).await, Err(CustomerApiError::HasOrders(_))));

    let orderless = seed_customer(&db, "carol@example.com").await;
    api.delete_customer(orderless.id).await.expect("Delete should succeed");
    assert!(api.fetch_customer(orderless.id).await.unwrap().is_none());
}

#[tokio::test]
async fn driver_registration_rules() {
    let db = new_db().await;
    let api = DriverApi::new(db.clone());

    let driver = seed_driver(&db, "Frank@Example.com").await;
    assert_eq!(driver.email, "frank@example.com");
    assert!(!driver.is_online);

    let dup = NewDriver::new("Fred", "Frost", "frank@example.com", "$argon2id$hash", "555-0101");
    assert!(matches!(api.create_driver(dup).await, Err(DriverApiError::EmailExists(_))));

    let no_phone = NewDriver::new("Fred", "Frost", "fred@example.com", "$argon2id$hash", "  ");
    assert!(matches!(api.create_driver(no_phone).await, Err(DriverApiError::Validation(_))));

    let online = api.set_driver_online(driver.id, true).await.unwrap();
    assert!(online.is_online);
}

#[tokio::test]
async fn drivers_referenced_by_orders_cannot_be_deleted() {
    let db = new_db().await;
    let seeded = seed_catalog(&db).await;
    let customer = seed_customer(&db, "alice@example.com").await;
    let driver = seed_driver(&db, "frank@example.com").await;
    let api = DriverApi::new(db.clone());
    let flow = OrderFlowApi::new(db.clone());

    let order = flow
        .create_order(NewOrder::new(CustomerSelector::Id(customer.id), "12 Glacier Rd").with_item(seeded.ice_bag.id, 1))
        .await
        .unwrap();
    flow.claim_order(order.order.id, driver.id).await.unwrap();

    assert!(matches!(api.delete_driver(driver.id).await, Err(DriverApiError::HasActiveOrders(_))));

    // The delivered order keeps its driver reference, so the record survives as history and the
    // driver is deactivated instead of deleted.
    flow.deliver_order(order.order.id, driver.id).await.unwrap();
    assert!(matches!(api.delete_driver(driver.id).await, Err(DriverApiError::HasOrders(_))));
    let benched = api.update_driver(driver.id, DriverUpdate::default().with_active(false)).await.unwrap();
    assert!(!benched.is_active);

    // A driver with no orders at all goes cleanly.
    let idle = seed_driver(&db, "grace@example.com").await;
    api.delete_driver(idle.id).await.expect("Delete should succeed");
    assert!(api.fetch_driver(idle.id).await.unwrap().is_none());
}

#[tokio::test]
async fn driver_admin_updates() {
    let db = new_db().await;
    let api = DriverApi::new(db.clone());
    let driver = seed_driver(&db, "frank@example.com").await;
    assert!(!driver.is_verified);

    let verified = api.update_driver(driver.id, DriverUpdate::default().with_verified(true)).await.unwrap();
    assert!(verified.is_verified);
    assert_eq!(verified.email, driver.email);

    let update = DriverUpdate::default().with_active(false).with_vehicle("truck");
    let benched = api.update_driver(driver.id, update).await.unwrap();
    assert!(!benched.is_active);
    assert!(benched.is_verified);
    assert_eq!(benched.vehicle_type.as_deref(), Some("truck"));

    assert!(matches!(
        api.update_driver(driver.id, DriverUpdate::default().with_phone("  ")).await,
        Err(DriverApiError::Validation(_))
    ));
    assert!(matches!(
        api.update_driver(999, DriverUpdate::default().with_verified(true)).await,
        Err(DriverApiError::NotFound(999))
    ));
}

#[tokio::test]
async fn reads_observe_writes_across_pooled_connections() {
    let db = new_db().await;
    let api = catalog(&db);

    api.create_category("Ice", None).await.unwrap();
    // The pool holds several connections; a committed write must be visible to every subsequent
    // read no matter which connection serves it.
    for _ in 0..8 {
        assert_eq!(api.list_categories().await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn categories_are_unique_and_guarded_while_in_use() {
    let db = new_db().await;
    let api = catalog(&db);

    let ice = api.create_category("Ice", None).await.unwrap();
    assert!(matches!(api.create_category("Ice", None).await, Err(CatalogError::DuplicateCategory(_))));

    api.create_product(NewProduct::new("Ice Bag 2kg", Money::from_cents(250), 10, ice.id)).await.unwrap();
    assert!(matches!(api.delete_category(ice.id).await, Err(CatalogError::CategoryInUse(_))));

    let empty = api.create_category("Coolers", None).await.unwrap();
    api.delete_category(empty.id).await.expect("Delete should succeed");
    assert_eq!(api.list_categories().await.unwrap().len(), 1);
}

#[tokio::test]
async fn product_validation_and_retirement() {
    let db = new_db().await;
    let api = catalog(&db);
    let ice = api.create_category("Ice", None).await.unwrap();

    assert!(matches!(
        api.create_product(NewProduct::new("  ", Money::from_cents(100), 1, ice.id)).await,
        Err(CatalogError::Validation(_))
    ));
    assert!(matches!(
        api.create_product(NewProduct::new("Ice Bag", Money::from_cents(-100), 1, ice.id)).await,
        Err(CatalogError::Validation(_))
    ));
    assert!(matches!(
        api.create_product(NewProduct::new("Ice Bag", Money::from_cents(100), 1, 999)).await,
        Err(CatalogError::CategoryNotFound(999))
    ));

    let bag = api.create_product(NewProduct::new("Ice Bag 2kg", Money::from_cents(250), 10, ice.id)).await.unwrap();
    assert!(bag.is_active);

    // Retired products drop out of the storefront but stay in the admin view.
    api.update_product(bag.id, ProductUpdate::default().with_active(false)).await.unwrap();
    let storefront = api.search_products(ProductQueryFilter::default().active_only()).await.unwrap();
    assert!(storefront.is_empty());
    let admin_view = api.search_products(ProductQueryFilter::default()).await.unwrap();
    assert_eq!(admin_view.len(), 1);
}

#[tokio::test]
async fn products_referenced_by_orders_cannot_be_deleted() {
    let db = new_db().await;
    let seeded = seed_catalog(&db).await;
    let customer = seed_customer(&db, "alice@example.com").await;
    let api = catalog(&db);
    let flow = OrderFlowApi::new(db.clone());

    flow.create_order(
        NewOrder::new(CustomerSelector::Id(customer.id), "12 Glacier Rd").with_item(seeded.ice_bag.id, 1),
    )
    .await
    .unwrap();

    assert!(matches!(api.delete_product(seeded.ice_bag.id).await, Err(CatalogError::ProductInUse(_))));
    api.delete_product(seeded.dry_ice.id).await.expect("Delete should succeed");
}

#[tokio::test]
async fn product_search_filters() {
    let db = new_db().await;
    let seeded = seed_catalog(&db).await;
    let api = catalog(&db);

    let other = api.create_category("Coolers", None).await.unwrap();
    api.create_product(NewProduct::new("Cooler Box 25L", Money::from_cents(4500), 3, other.id)).await.unwrap();

    let in_ice = api.search_products(ProductQueryFilter::default().with_category(seeded.category.id)).await.unwrap();
    assert_eq!(in_ice.len(), 3);

    let ice_named = api.search_products(ProductQueryFilter::default().with_search("Ice B")).await.unwrap();
    assert_eq!(ice_named.len(), 2);

    let paged = api.search_products(ProductQueryFilter::default().paged(2, 0)).await.unwrap();
    assert_eq!(paged.len(), 2);
}
