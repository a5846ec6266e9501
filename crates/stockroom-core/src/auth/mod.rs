//! Authentication module for managing the client-side session.
//!
//! This module provides:
//! - `TokenStore`: durable storage of the bearer token and its expiry
//! - `SessionManager`: login/logout and the current-user state
//! - `decode_token`: claims extraction from a three-segment bearer token
//! - `ExpiryWatchdog`: clock-driven warning and forced logout
//! - `RouteGuard`: access decisions for console sections
//!
//! The token is persisted under the `token` key and its expiry (seconds
//! since epoch) under `token_exp`.

pub mod credentials;
pub mod error;
pub mod guard;
pub mod session;
pub mod store;
pub mod token;
pub mod watchdog;

pub use credentials::KeyringStore;
pub use error::{AuthError, StorageError};
pub use guard::{GuardDecision, RouteGuard};
pub use session::{SessionHandle, SessionManager, SessionState, User};
pub use store::{FileStore, KeyValueStore, MemoryStore, TokenStore};
pub use token::{decode_token, Claims};
pub use watchdog::{ExpiryWatchdog, WatchdogState};
