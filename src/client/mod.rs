//! HTTP client driver
//!
//! One logical request runs as a bounded loop of exchanges, each on its own
//! connection, following redirects and revalidating cached resources.

pub mod cache;
pub mod config;
pub mod driver;

pub use cache::RevalidationCache;
pub use config::{ClientConfig, ClientConfigBuilder, MAX_REDIRECT};
pub use driver::{FetchResult, HopEvent, HttpClient};
