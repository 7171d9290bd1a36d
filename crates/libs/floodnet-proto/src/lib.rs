//! # floodnet-proto
//!
//! Shared vocabulary for the floodnet protocol family: node and MAC
//! addressing, the routing packet with its fixed-capacity source route,
//! application payloads, and simulated time.
//!
//! This crate is the contract between the routing engine, the application
//! agent, and whichever host drives them. It deliberately contains no
//! behaviour beyond construction and invariant checking — the engine owns
//! the protocol semantics, the host owns scheduling and delivery.

pub mod addr;
pub mod app;
pub mod packet;
pub mod time;

pub use addr::{MacId, MacTarget, NodeAddr};
pub use app::AppPacket;
pub use packet::{PacketError, PacketKind, RoutePacket, RouteSlots};
pub use time::SimTime;

/// Number of relay slots in a routing packet. A wire-format constant:
/// routes needing more relays than this cannot be represented.
pub const ROUTE_CAPACITY: usize = 10;
