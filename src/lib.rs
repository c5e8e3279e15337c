//! GPU pool visualization - workstation telemetry dashboard core
//!
//! Polls the backend for GPU workstation state and turns it into:
//! - grouped, free/busy-partitioned workstation lists
//! - per-GPU metric charts (downsampled lines, time and value axes)
//!
//! The pipeline is platform-agnostic; the HTTP client and the egui dashboard
//! sit behind the `http` and `gui` features.

pub mod chart;
pub mod config;
pub mod core;
pub mod poller;

#[cfg(feature = "http")]
pub mod fetch;

#[cfg(feature = "gui")]
pub mod app;
#[cfg(feature = "gui")]
mod theme;

pub use config::{Config, ConfigError};
pub use poller::{OverlapPolicy, PollStats, Poller, PollerConfig, PollerHandle, RefreshStyle};
