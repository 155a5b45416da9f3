//! # Icebox server
//!
//! The REST front-end for the Icebox delivery backend. It is responsible for:
//! * the admin order, catalog and customer endpoints,
//! * the mobile checkout and order history endpoints,
//! * driver signup, signin and the claim/deliver workflow,
//! * the public order tracking endpoint.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
//!
//! All business rules live in `icebox_engine`; this crate only translates HTTP to engine calls
//! and engine errors to status codes.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
