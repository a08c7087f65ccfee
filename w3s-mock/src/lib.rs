/// W3S Mock Server Library
///
/// An in-memory stand-in for the W3S user-controlled wallet API, usable as a
/// standalone binary or spawned inside integration tests.

pub mod backend;
pub mod handlers;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use backend::{MockBackend, MockError, ETH_SEPOLIA_TOKEN_ID, USDC_TOKEN_ID};
pub use server::{create_router, run_server, spawn_ephemeral};
pub use types::*;
