//! SolarDash Telemetry - Real-time inverter data from the Solinteg cloud
//!
//! `SolintegClient` logs in and queries one device; `DashboardProxy` wraps any
//! `TelemetrySource` and shapes its output for the dashboard endpoint.

pub mod client;
pub mod proxy;

pub use client::{SolintegClient, SolintegOptions};
pub use proxy::{DashboardProxy, TelemetryError, TelemetryResult, TelemetrySource};
