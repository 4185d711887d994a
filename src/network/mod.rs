//! URL parsing into connectable endpoints

pub mod endpoint;

pub use endpoint::{EndpointRef, DEFAULT_PORT, SCHEME};
