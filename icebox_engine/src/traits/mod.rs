//! Behaviour contracts for storage backends.
//!
//! The public APIs are generic over these traits, so any store that offers transactional
//! atomicity and a conditional-update primitive can act as a backend. The SQLite implementation
//! is [`crate::SqliteDatabase`].
mod catalog;
mod customers;
mod drivers;
mod order_flow;

pub use catalog::{CatalogError, CatalogManagement};
pub use customers::{CustomerApiError, CustomerManagement};
pub use drivers::{DriverApiError, DriverManagement};
pub use order_flow::{OrderFlowDatabase, OrderFlowError};
