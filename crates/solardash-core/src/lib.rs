//! SolarDash Core - Shared configuration and error types
//!
//! This crate provides the foundational types used across all SolarDash components.

pub mod config;
pub mod error;

pub use config::{
    AllowedOrigins, Config, SolintegSettings, TwilioSettings, DEFAULT_SOLINTEG_BASE_URL,
    MAX_SESSION_TTL,
};
pub use error::{Error, Result};
