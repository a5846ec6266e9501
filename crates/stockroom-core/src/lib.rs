//! Stockroom core library.
//!
//! Session lifecycle and authenticated API access for the stockroom
//! inventory service:
//!
//! - `auth`: token store, session manager, token decoding, expiry watchdog
//!   and route guard
//! - `api`: the authenticated request gateway and typed resource services
//! - `models`: inventory entities exchanged with the remote API
//! - `config`: base URL and storage backend selection
//! - `navigation`: login redirects raised by the session core
//! - `utils`: money, date and query-string helpers

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{
    AuthError, ExpiryWatchdog, RouteGuard, SessionHandle, SessionManager, TokenStore, User,
};
pub use config::Config;
pub use navigation::{LogoutReason, Navigator, Redirect, Route};
