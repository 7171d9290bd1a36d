//! # floodnet-routing
//!
//! The per-node routing engine: reactive route discovery by flooding route
//! requests, route installation along the reverse path from route replies,
//! and unicast forwarding of data along pinned source routes. Duplicate and
//! looped traffic is suppressed by per-source monotone sequence watermarks.
//!
//! The engine is a pure state machine over three tables. Its entry points
//! return what should be transmitted or delivered instead of calling into
//! collaborators, so a host (simulator, test harness) stays in full control
//! of scheduling and delivery.

pub mod devlog;
pub mod engine;
pub mod neighbour_cache;
pub mod route_cache;
pub mod seq_table;
pub mod stats;

pub use devlog::DevLog;
pub use engine::{Delivery, RoutingEngine, RxActions, TxMessage};
pub use neighbour_cache::NeighbourCache;
pub use route_cache::RouteCache;
pub use seq_table::{Admission, SeqWatermarks};
pub use stats::{RxBreakdown, TxBreakdown};
