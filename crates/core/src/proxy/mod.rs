//! Forward proxy pool used to route retrieval attempts.
//!
//! The pool is built once at startup from a line-oriented source, validated
//! against a port allow-list, shuffled, and then shared read-only for the
//! lifetime of the process.

mod pool;

pub use pool::{ProxyEntry, ProxyError, ProxyPool, DEFAULT_ALLOWED_PORTS};
