//! # floodnet-app
//!
//! The application agent running above the routing engine on every node:
//! non-sink nodes generate numbered data packets toward the sink on a fixed
//! cadence, the sink accumulates deliveries behind an optional freshness
//! gate, and at end of run every agent turns the other agents' read-only
//! counter snapshots into delivery-rate and energy figures.

pub mod agent;
pub mod report;

pub use agent::{AppAgent, AppConfig, Submission};
pub use report::{AppReport, PeerRate, PeerSnapshot};

/// Output name for the sink's per-source delivery counts.
pub const OUTPUT_RECEIVED_PER_NODE: &str = "Packets received per node";
/// Output name for per-peer reception rates.
pub const OUTPUT_RECEPTION_RATE: &str = "Packets reception rate";
/// Output name for per-peer loss rates.
pub const OUTPUT_LOSS_RATE: &str = "Packets loss rate";
/// Output name for the energy-per-delivered-bit figure.
pub const OUTPUT_ENERGY: &str = "Energy nJ/bit";
