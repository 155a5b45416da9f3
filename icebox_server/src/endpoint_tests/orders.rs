use actix_web::{dev::ServiceResponse, http::StatusCode, test, test::TestRequest, App};
use icebox_common::Money;
use icebox_engine::{db_types::NewProduct, order_objects::FullOrder, CatalogApi, SqliteDatabase};
use serde_json::json;

use super::{configure, test_auth_config, test_db};
use crate::data_objects::{TokenResponse, TrackingResponse};

/// Seeds one category with an Ice Bag ($2.50, stock 10) and an Ice Block ($8.00, stock 5).
async fn seed_catalog(db: &SqliteDatabase) -> (i64, i64) {
    let catalog = CatalogApi::new(db.clone());
    let category = catalog.create_category("Ice", None).await.unwrap();
    let bag = catalog
        .create_product(NewProduct::new("Ice Bag 2kg", Money::from_cents(250), 10, category.id))
        .await
        .unwrap();
    let block = catalog
        .create_product(NewProduct::new("Ice Block", Money::from_cents(800), 5, category.id))
        .await
        .unwrap();
    (bag.id, block.id)
}

fn mobile_order(bag_id: i64, email: &str) -> serde_json::Value {
    json!({
        "customer": {
            "first_name": "Alice",
            "last_name": "Winters",
            "email": email,
            "phone": "555-0123",
            "address": null, "city": null, "postal_code": null
        },
        "delivery_address": "12 Glacier Rd",
        "items": [{"product_id": bag_id, "quantity": 2}]
    })
}

async fn signup_driver<S, B>(app: &S, email: &str) -> TokenResponse
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: actix_web::body::MessageBody,
    B::Error: std::fmt::Debug,
{
    let req = TestRequest::post()
        .uri("/api/drivers/signup")
        .set_json(json!({
            "first_name": "Frank",
            "last_name": "Frost",
            "email": email,
            "password": "correct-horse-battery",
            "phone": "555-0100"
        }))
        .to_request();
    let res = test::call_service(app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    test::read_body_json(res).await
}

#[actix_web::test]
async fn mobile_checkout_and_tracking() {
    let db = test_db().await;
    let auth = test_auth_config();
    let app = test::init_service(App::new().configure(configure(db.clone(), &auth))).await;
    let (bag_id, _) = seed_catalog(&db).await;

    let req = TestRequest::post().uri("/api/mobile/orders").set_json(mobile_order(bag_id, "alice@example.com")).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: FullOrder = test::read_body_json(res).await;
    assert_eq!(order.order.total, Money::from_cents(500));
    assert_eq!(order.order.order_number, format!("ORD-{:06}", order.order.id.value()));

    // Tracking is public and carries no contact details.
    let req = TestRequest::get().uri(&format!("/api/orders/{}/tracking", order.order.id.value())).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let tracking: TrackingResponse = test::read_body_json(res).await;
    assert_eq!(tracking.order_number, order.order.order_number);
    assert!(tracking.driver.is_none());

    let req = TestRequest::get().uri("/api/orders/999/tracking").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    // The order history for the customer's email contains the order.
    let req = TestRequest::get().uri("/api/mobile/orders?email=alice@example.com").to_request();
    let res = test::call_service(&app, req).await;
    let history: Vec<FullOrder> = test::read_body_json(res).await;
    assert_eq!(history.len(), 1);
}

#[actix_web::test]
async fn order_validation_errors_are_bad_requests() {
    let db = test_db().await;
    let auth = test_auth_config();
    let app = test::init_service(App::new().configure(configure(db.clone(), &auth))).await;
    let (bag_id, _) = seed_catalog(&db).await;

    // No items.
    let mut body = mobile_order(bag_id, "alice@example.com");
    body["items"] = json!([]);
    let req = TestRequest::post().uri("/api/mobile/orders").set_json(body).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    // Both customer_id and customer contact supplied.
    let mut body = mobile_order(bag_id, "alice@example.com");
    body["customer_id"] = json!(1);
    let req = TestRequest::post().uri("/api/mobile/orders").set_json(body).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    // More stock than exists is a conflict, not a validation error.
    let mut body = mobile_order(bag_id, "alice@example.com");
    body["items"] = json!([{"product_id": bag_id, "quantity": 500}]);
    let req = TestRequest::post().uri("/api/mobile/orders").set_json(body).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn the_driver_workflow_over_http() {
    let db = test_db().await;
    let auth = test_auth_config();
    let app = test::init_service(App::new().configure(configure(db.clone(), &auth))).await;
    let (bag_id, _) = seed_catalog(&db).await;

    let frank = signup_driver(&app, "frank@example.com").await;
    let grace = signup_driver(&app, "grace@example.com").await;

    let req = TestRequest::post().uri("/api/mobile/orders").set_json(mobile_order(bag_id, "alice@example.com")).to_request();
    let order: FullOrder = test::read_body_json(test::call_service(&app, req).await).await;
    let order_id = order.order.id.value();

    // Browsing available orders requires a token.
    let req = TestRequest::get().uri("/api/drivers/orders/available").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::get()
        .uri("/api/drivers/orders/available")
        .insert_header(("Authorization", format!("Bearer {}", frank.token)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let available: Vec<FullOrder> = test::read_body_json(res).await;
    assert_eq!(available.len(), 1);

    // Frank accepts; Grace's claim arrives too late and conflicts.
    let req = TestRequest::post()
        .uri(&format!("/api/drivers/orders/{order_id}/accept"))
        .insert_header(("Authorization", format!("Bearer {}", frank.token)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let claimed: FullOrder = test::read_body_json(res).await;
    assert_eq!(claimed.driver.as_ref().map(|d| d.id), Some(frank.driver.id));

    let req = TestRequest::post()
        .uri(&format!("/api/drivers/orders/{order_id}/accept"))
        .insert_header(("Authorization", format!("Bearer {}", grace.token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    // Only the bound driver may deliver.
    let req = TestRequest::post()
        .uri(&format!("/api/orders/{order_id}/deliver"))
        .insert_header(("Authorization", format!("Bearer {}", grace.token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = TestRequest::post()
        .uri(&format!("/api/orders/{order_id}/deliver"))
        .insert_header(("Authorization", format!("Bearer {}", frank.token)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    // The delivered order shows up in Frank's history.
    let req = TestRequest::get()
        .uri("/api/drivers/orders?status=DELIVERED")
        .insert_header(("Authorization", format!("Bearer {}", frank.token)))
        .to_request();
    let history: Vec<FullOrder> = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(history.len(), 1);
}

#[actix_web::test]
async fn cancellation_rules_over_http() {
    let db = test_db().await;
    let auth = test_auth_config();
    let app = test::init_service(App::new().configure(configure(db.clone(), &auth))).await;
    let (bag_id, _) = seed_catalog(&db).await;

    let req = TestRequest::post().uri("/api/mobile/orders").set_json(mobile_order(bag_id, "alice@example.com")).to_request();
    let order: FullOrder = test::read_body_json(test::call_service(&app, req).await).await;
    let order_id = order.order.id.value();

    // The endpoint is public, so an anonymous body proves nothing and is refused outright.
    let req = TestRequest::post().uri(&format!("/api/orders/{order_id}/cancel")).set_json(json!({})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    // A stranger's email may not cancel the order.
    let req = TestRequest::post()
        .uri(&format!("/api/orders/{order_id}/cancel"))
        .set_json(json!({"email": "mallory@example.com"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    // The owner may.
    let req = TestRequest::post()
        .uri(&format!("/api/orders/{order_id}/cancel"))
        .set_json(json!({"email": "alice@example.com", "reason": "changed my mind"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cancelled: FullOrder = test::read_body_json(res).await;
    assert!(cancelled.order.notes.unwrap().contains("CANCELLED BY CUSTOMER: changed my mind"));

    // Cancelling twice is a conflict.
    let req = TestRequest::post()
        .uri(&format!("/api/orders/{order_id}/cancel"))
        .set_json(json!({"email": "alice@example.com"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}
