//! SolarDash Server - Axum-based HTTP API
//!
//! This crate wires the OTP login flow, session checks, and the dashboard
//! proxy into HTTP routes.

pub mod adapters;
pub mod error;
pub mod http;
pub mod state;
pub mod sweep;

pub use adapters::TwilioVerifier;
pub use error::ApiError;
pub use http::{cors_layer, create_router};
pub use state::AppState;
pub use sweep::spawn_session_sweeper;
