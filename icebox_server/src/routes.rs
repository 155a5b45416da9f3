//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into
//! a separate function. Keep this module neat and tidy 🙏
//!
//! Handlers are async and must never block the worker thread; all I/O goes through the engine
//! APIs, which are async all the way down to the pool.
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use icebox_engine::{
    db_types::{
        CustomerUpdate,
        DriverUpdate,
        NewCustomer,
        NewProduct,
        OrderActor,
        OrderId,
        OrderUpdate,
        ProductUpdate,
    },
    CatalogApi,
    CustomerApi,
    DriverApi,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::{hash_password, verify_password, JwtClaims, TokenIssuer},
    data_objects::{
        CancelRequest,
        CategoryRequest,
        CustomerOrderParams,
        DriverOrderParams,
        DriverSigninRequest,
        DriverSignupRequest,
        DriverStatusRequest,
        JsonResponse,
        OrderRequest,
        OrderSearchParams,
        Pagination,
        ProductSearchParams,
        TokenResponse,
        TrackingResponse,
    },
    errors::{AuthError, ServerError},
};

type OrderFlow = web::Data<OrderFlowApi<SqliteDatabase>>;
type Catalog = web::Data<CatalogApi<SqliteDatabase>>;
type Customers = web::Data<CustomerApi<SqliteDatabase>>;
type Drivers = web::Data<DriverApi<SqliteDatabase>>;

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------

#[get("/api/orders")]
pub async fn search_orders(params: web::Query<OrderSearchParams>, api: OrderFlow) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders with {:?}", params.0);
    let orders = api.search_orders(params.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[post("/api/orders")]
pub async fn create_order(body: web::Json<OrderRequest>, api: OrderFlow) -> Result<HttpResponse, ServerError> {
    let new_order = body.into_inner().into_new_order()?;
    let order = api.create_order(new_order).await?;
    debug!("💻️ Created order {}", order.order.order_number);
    Ok(HttpResponse::Created().json(order))
}

#[get("/api/orders/{id}")]
pub async fn order_by_id(path: web::Path<i64>, api: OrderFlow) -> Result<HttpResponse, ServerError> {
    let id = OrderId::from(path.into_inner());
    let order = api.fetch_order(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Order {id}")))?;
    Ok(HttpResponse::Ok().json(order))
}

#[patch("/api/orders/{id}")]
pub async fn update_order(
    path: web::Path<i64>,
    body: web::Json<OrderUpdate>,
    api: OrderFlow,
) -> Result<HttpResponse, ServerError> {
    let id = OrderId::from(path.into_inner());
    debug!("💻️ PATCH order {id}: {:?}", body.0);
    let order = api.admin_update_order(id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

#[delete("/api/orders/{id}")]
pub async fn delete_order(path: web::Path<i64>, api: OrderFlow) -> Result<HttpResponse, ServerError> {
    let id = OrderId::from(path.into_inner());
    api.delete_order(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {id} deleted"))))
}

/// Customer-facing cancellation. The endpoint is public, so the caller must identify themselves
/// with the order's email; operators cancel through the admin update endpoint instead.
#[post("/api/orders/{id}/cancel")]
pub async fn cancel_order(
    path: web::Path<i64>,
    body: web::Json<CancelRequest>,
    api: OrderFlow,
) -> Result<HttpResponse, ServerError> {
    let id = OrderId::from(path.into_inner());
    let CancelRequest { email, reason } = body.into_inner();
    let email = email.ok_or_else(|| ServerError::InvalidRequestBody("email is required".into()))?;
    let actor = OrderActor::Customer(email);
    let order = api.cancel_order(id, &actor, reason.as_deref()).await?;
    debug!("💻️ Order {} cancelled", order.order.order_number);
    Ok(HttpResponse::Ok().json(order))
}

#[post("/api/orders/{id}/deliver")]
pub async fn deliver_order(path: web::Path<i64>, claims: JwtClaims, api: OrderFlow) -> Result<HttpResponse, ServerError> {
    let id = OrderId::from(path.into_inner());
    let order = api.deliver_order(id, claims.sub).await?;
    debug!("💻️ Order {} delivered by driver #{}", order.order.order_number, claims.sub);
    Ok(HttpResponse::Ok().json(order))
}

/// The customer-facing tracking view. Unauthenticated; exposes no contact details.
#[get("/api/orders/{id}/tracking")]
pub async fn track_order(path: web::Path<i64>, api: OrderFlow) -> Result<HttpResponse, ServerError> {
    let id = OrderId::from(path.into_inner());
    let order = api.fetch_order(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Order {id}")))?;
    Ok(HttpResponse::Ok().json(TrackingResponse::from(order)))
}

//----------------------------------------------   Mobile  ----------------------------------------------------

/// Mobile checkout. The body carries the customer's contact details; a first order from a new
/// email registers the customer in the same transaction as the order.
#[post("/api/mobile/orders")]
pub async fn mobile_create_order(body: web::Json<OrderRequest>, api: OrderFlow) -> Result<HttpResponse, ServerError> {
    let new_order = body.into_inner().into_new_order()?;
    let order = api.create_order(new_order).await?;
    debug!("💻️ Mobile order {} created", order.order.order_number);
    Ok(HttpResponse::Created().json(order))
}

#[get("/api/mobile/orders")]
pub async fn mobile_order_history(
    params: web::Query<CustomerOrderParams>,
    api: OrderFlow,
) -> Result<HttpResponse, ServerError> {
    let orders = api.orders_for_customer(&params.email).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Drivers  ----------------------------------------------------

#[post("/api/drivers/signup")]
pub async fn driver_signup(
    body: web::Json<DriverSignupRequest>,
    api: Drivers,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    if request.password.len() < 8 {
        return Err(ServerError::InvalidRequestBody("password must be at least 8 characters".into()));
    }
    let hash = hash_password(&request.password)?;
    let driver = api.create_driver(request.into_new_driver(hash)).await?;
    info!("💻️ Driver {} signed up", driver.email);
    let token = signer.issue_token(&driver)?;
    Ok(HttpResponse::Created().json(TokenResponse { token, driver: driver.into() }))
}

#[post("/api/drivers/signin")]
pub async fn driver_signin(
    body: web::Json<DriverSigninRequest>,
    api: Drivers,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    let driver = api
        .driver_by_email(&request.email)
        .await?
        .ok_or(ServerError::AuthenticationError(AuthError::InvalidCredentials))?;
    if !verify_password(&request.password, &driver.password_hash) {
        debug!("💻️ Failed signin attempt for {}", driver.email);
        return Err(AuthError::InvalidCredentials.into());
    }
    if !driver.is_active {
        return Err(AuthError::AccountDisabled.into());
    }
    let token = signer.issue_token(&driver)?;
    debug!("💻️ Driver {} signed in", driver.email);
    Ok(HttpResponse::Ok().json(TokenResponse { token, driver: driver.into() }))
}

#[put("/api/drivers/status")]
pub async fn driver_status(
    claims: JwtClaims,
    body: web::Json<DriverStatusRequest>,
    api: Drivers,
) -> Result<HttpResponse, ServerError> {
    let driver = api.set_driver_online(claims.sub, body.is_online).await?;
    debug!("💻️ Driver {} is now {}", driver.email, if driver.is_online { "online" } else { "offline" });
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Driver is {}", if driver.is_online { "online" } else { "offline" }))))
}

/// The orders a driver may claim right now. Orders older than the availability window are
/// excluded; an order that looks available here can still be lost to another driver at accept
/// time.
#[get("/api/drivers/orders/available")]
pub async fn available_orders(claims: JwtClaims, api: OrderFlow) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Driver #{} browsing available orders", claims.sub);
    let orders = api.available_orders().await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[post("/api/drivers/orders/{id}/accept")]
pub async fn accept_order(path: web::Path<i64>, claims: JwtClaims, api: OrderFlow) -> Result<HttpResponse, ServerError> {
    let id = OrderId::from(path.into_inner());
    let order = api.claim_order(id, claims.sub).await?;
    info!("💻️ Driver #{} accepted order {}", claims.sub, order.order.order_number);
    Ok(HttpResponse::Ok().json(order))
}

#[get("/api/drivers/orders")]
pub async fn driver_orders(
    claims: JwtClaims,
    params: web::Query<DriverOrderParams>,
    api: OrderFlow,
) -> Result<HttpResponse, ServerError> {
    let statuses: Vec<_> = params.into_inner().status.into_iter().collect();
    let orders = api.orders_for_driver(claims.sub, &statuses).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//------------------------------------------   Driver admin  --------------------------------------------------

#[get("/api/drivers")]
pub async fn list_drivers(params: web::Query<Pagination>, api: Drivers) -> Result<HttpResponse, ServerError> {
    let drivers = api.list_drivers(params.limit(), params.offset()).await?;
    Ok(HttpResponse::Ok().json(drivers))
}

#[get("/api/drivers/{id}")]
pub async fn driver_by_id(path: web::Path<i64>, api: Drivers) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let driver = api.fetch_driver(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Driver #{id}")))?;
    Ok(HttpResponse::Ok().json(driver))
}

/// Admin edits to a driver: contact details, vehicle, and the verification/active flags.
#[patch("/api/drivers/{id}")]
pub async fn update_driver(
    path: web::Path<i64>,
    body: web::Json<DriverUpdate>,
    api: Drivers,
) -> Result<HttpResponse, ServerError> {
    let driver = api.update_driver(path.into_inner(), body.into_inner()).await?;
    debug!("💻️ Driver {} updated by admin", driver.email);
    Ok(HttpResponse::Ok().json(driver))
}

#[delete("/api/drivers/{id}")]
pub async fn delete_driver(path: web::Path<i64>, api: Drivers) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_driver(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Driver #{id} deleted"))))
}

//----------------------------------------------   Catalog  ----------------------------------------------------

#[get("/api/products")]
pub async fn search_products(params: web::Query<ProductSearchParams>, api: Catalog) -> Result<HttpResponse, ServerError> {
    let products = api.search_products(params.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(products))
}

#[post("/api/products")]
pub async fn create_product(body: web::Json<NewProduct>, api: Catalog) -> Result<HttpResponse, ServerError> {
    let product = api.create_product(body.into_inner()).await?;
    debug!("💻️ Created product [{}]", product.name);
    Ok(HttpResponse::Created().json(product))
}

#[get("/api/products/{id}")]
pub async fn product_by_id(path: web::Path<i64>, api: Catalog) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let product = api.fetch_product(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Product #{id}")))?;
    Ok(HttpResponse::Ok().json(product))
}

#[patch("/api/products/{id}")]
pub async fn update_product(
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
    api: Catalog,
) -> Result<HttpResponse, ServerError> {
    let product = api.update_product(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

#[delete("/api/products/{id}")]
pub async fn delete_product(path: web::Path<i64>, api: Catalog) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_product(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product #{id} deleted"))))
}

#[get("/api/categories")]
pub async fn list_categories(api: Catalog) -> Result<HttpResponse, ServerError> {
    let categories = api.list_categories().await?;
    Ok(HttpResponse::Ok().json(categories))
}

#[post("/api/categories")]
pub async fn create_category(body: web::Json<CategoryRequest>, api: Catalog) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    let category = api.create_category(&request.name, request.description.as_deref()).await?;
    Ok(HttpResponse::Created().json(category))
}

#[delete("/api/categories/{id}")]
pub async fn delete_category(path: web::Path<i64>, api: Catalog) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_category(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Category #{id} deleted"))))
}

//----------------------------------------------   Customers  ----------------------------------------------------

#[get("/api/customers")]
pub async fn list_customers(params: web::Query<Pagination>, api: Customers) -> Result<HttpResponse, ServerError> {
    let customers = api.list_customers(params.limit(), params.offset()).await?;
    Ok(HttpResponse::Ok().json(customers))
}

#[post("/api/customers")]
pub async fn create_customer(body: web::Json<NewCustomer>, api: Customers) -> Result<HttpResponse, ServerError> {
    let customer = api.create_customer(body.into_inner()).await?;
    debug!("💻️ Created customer [{}]", customer.email);
    Ok(HttpResponse::Created().json(customer))
}

#[get("/api/customers/{id}")]
pub async fn customer_by_id(path: web::Path<i64>, api: Customers) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let customer = api.fetch_customer(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Customer #{id}")))?;
    Ok(HttpResponse::Ok().json(customer))
}

#[patch("/api/customers/{id}")]
pub async fn update_customer(
    path: web::Path<i64>,
    body: web::Json<CustomerUpdate>,
    api: Customers,
) -> Result<HttpResponse, ServerError> {
    let customer = api.update_customer(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(customer))
}

#[delete("/api/customers/{id}")]
pub async fn delete_customer(path: web::Path<i64>, api: Customers) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_customer(id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Customer #{id} deleted"))))
}
