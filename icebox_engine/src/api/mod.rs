//! # Icebox engine public API
//!
//! The API structs in this module wrap a storage backend and add the validation and policy that is
//! independent of any particular backend. Servers and tools should talk to these rather than to
//! the storage traits directly.

pub mod catalog_api;
pub mod customer_api;
pub mod driver_api;
pub mod order_flow_api;
pub mod order_objects;
