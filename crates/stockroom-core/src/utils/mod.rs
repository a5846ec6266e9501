//! Formatting and query-string helpers.

pub mod format;
pub mod query;

pub use format::{format_cents, format_date_br, parse_date_br, to_cents, truncate_string, CentsError};
pub use query::build_query;
