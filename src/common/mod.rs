//! Traits and helpers shared across the crate

pub mod test_utils;
pub mod traits;

pub use test_utils::{spawn_test_server, TestServer};
pub use traits::ServerTrait;
