//! Icebox order engine
//!
//! The core logic for the Icebox delivery backend: the order lifecycle state machine, the
//! inventory ledger, and the catalog, customer and driver registries. The engine is
//! transport-agnostic; the HTTP server is a separate crate built on top of it.
//!
//! The library is divided into two main sections:
//! 1. Storage ([`mod@sqlite`]). SQLite is the supported backend. You should never need to access
//!    the database directly; use the public API instead. The exception is the data types shared
//!    with the database, which live in [`mod@db_types`] and are public.
//! 2. The public API ([`OrderFlowApi`], [`CatalogApi`], [`CustomerApi`], [`DriverApi`]). These
//!    wrap any backend implementing the traits in [`mod@traits`] and add validation and policy,
//!    such as the driver availability window.
mod api;
mod sqlite;

pub mod db_types;
pub mod helpers;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    catalog_api::CatalogApi,
    customer_api::CustomerApi,
    driver_api::DriverApi,
    order_flow_api::{OrderFlowApi, DEFAULT_AVAILABILITY_WINDOW_DAYS},
    order_objects,
};
pub use sqlite::SqliteDatabase;
pub use traits::{
    CatalogError,
    CatalogManagement,
    CustomerApiError,
    CustomerManagement,
    DriverApiError,
    DriverManagement,
    OrderFlowDatabase,
    OrderFlowError,
};
