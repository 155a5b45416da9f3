mod auth;
mod orders;

use actix_web::web::{Data, ServiceConfig};
use chrono::Duration;
use icebox_common::Secret;
use icebox_engine::{
    test_utils::prepare_env::prepare_test_env,
    CatalogApi,
    CustomerApi,
    DriverApi,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{auth::TokenIssuer, config::AuthConfig, routes};

pub async fn test_db() -> SqliteDatabase {
    prepare_test_env().await
}

// A fixed secret so tokens can be minted and checked in tests. DO NOT re-use anywhere.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("0123456789abcdef0123456789abcdef".to_string()),
        token_expiry: Duration::hours(1),
    }
}

/// Registers the full route table against a real database, exactly as the production server does.
pub fn configure(db: SqliteDatabase, auth: &AuthConfig) -> impl FnOnce(&mut ServiceConfig) {
    let signer = TokenIssuer::new(auth);
    move |cfg| {
        cfg.app_data(Data::new(OrderFlowApi::new(db.clone())))
            .app_data(Data::new(CatalogApi::new(db.clone())))
            .app_data(Data::new(CustomerApi::new(db.clone())))
            .app_data(Data::new(DriverApi::new(db.clone())))
            .app_data(Data::new(signer))
            .service(routes::health)
            .service(routes::search_orders)
            .service(routes::create_order)
            .service(routes::order_by_id)
            .service(routes::update_order)
            .service(routes::delete_order)
            .service(routes::cancel_order)
            .service(routes::deliver_order)
            .service(routes::track_order)
            .service(routes::mobile_create_order)
            .service(routes::mobile_order_history)
            .service(routes::driver_signup)
            .service(routes::driver_signin)
            .service(routes::driver_status)
            .service(routes::available_orders)
            .service(routes::accept_order)
            .service(routes::driver_orders)
            .service(routes::list_drivers)
            .service(routes::driver_by_id)
            .service(routes::update_driver)
            .service(routes::delete_driver)
            .service(routes::search_products)
            .service(routes::create_product)
            .service(routes::product_by_id)
            .service(routes::update_product)
            .service(routes::delete_product)
            .service(routes::list_categories)
            .service(routes::create_category)
            .service(routes::delete_category)
            .service(routes::list_customers)
            .service(routes::create_customer)
            .service(routes::customer_by_id)
            .service(routes::update_customer)
            .service(routes::delete_customer);
    }
}

mod misc {
    use actix_web::{body::MessageBody, test, test::TestRequest, App};

    use crate::routes::health;

    #[actix_web::test]
    async fn health_endpoint() {
        let app = test::init_service(App::new().service(health)).await;
        let req = TestRequest::get().uri("/health").to_request();
        let (_req, res) = test::call_service(&app, req).await.into_parts();
        let status = res.status();
        let body = res.into_body().try_into_bytes().unwrap();
        assert!(status.is_success());
        assert_eq!(body, "👍️\n");
    }
}
