use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use icebox_engine::{
    helpers::SystemClock,
    CatalogApi,
    CustomerApi,
    DriverApi,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{auth::TokenIssuer, config::ServerConfig, errors::ServerError, routes};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let (host, port) = (config.host.clone(), config.port);
    let client_addr = if config.use_x_forwarded_for { "%{X-Forwarded-For}i" } else { "%a" };
    let log_format = format!("%t (%D ms) %s {client_addr} %{{Host}}i %U");
    let srv = HttpServer::new(move || {
        let order_flow =
            OrderFlowApi::with_clock(db.clone(), Arc::new(SystemClock), config.availability_window_days);
        let catalog = CatalogApi::new(db.clone());
        let customers = CustomerApi::new(db.clone());
        let drivers = DriverApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        App::new()
            .wrap(Logger::new(&log_format).log_target("icebox::access_log"))
            .app_data(web::Data::new(order_flow))
            .app_data(web::Data::new(catalog))
            .app_data(web::Data::new(customers))
            .app_data(web::Data::new(drivers))
            .app_data(web::Data::new(jwt_signer))
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
            .service(routes::delete_customer)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
