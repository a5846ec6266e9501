//! REST API client module for the stockroom service.
//!
//! `ApiClient` is the authenticated request gateway; `resources` adds one
//! typed method per endpoint the console uses (users, products, suppliers,
//! batches, stock movements, categories and dashboard aggregates).

pub mod client;
pub mod error;
pub mod resources;

pub use client::{ApiClient, RequestOptions, SignIn};
pub use error::ApiError;
pub use resources::Empty;
