//! pmtop: monitoring client for a process-supervision daemon.
//!
//! The core is the live telemetry and log-streaming client: supervised push
//! connections ([`stream`]), bounded chart history ([`history`]), a polling
//! log tail ([`logs`]), ranked log filtering ([`search`]) and version
//! staleness classification ([`version`]). [`api`] talks to the daemon's
//! request/response surface and [`app`] wires one view's resources together.

pub mod api;
pub mod app;
pub mod error;
pub mod history;
pub mod logs;
pub mod profiles;
pub mod search;
pub mod stream;
pub mod types;
pub mod util;
pub mod version;
