//! HTTP surface of the Roomly OTP service
//!
//! The binary in `main.rs` wires concrete backends; this library exposes
//! the routes for it and for the integration tests.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use app::configure_app;
pub use routes::otp::AppState;
