use crate::time::SimTime;

/// A numbered application payload.
///
/// Payloads are opaque to the routing layer; the byte length exists so the
/// sink can account delivered volume and includes the fixed application
/// header overhead on top of the (possibly zero) payload size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPacket {
    /// Tag of the form `AppPacket:<seq>`.
    pub name: String,
    /// Originating agent's sequence number.
    pub seq: u32,
    /// Accounted size: payload bytes plus header overhead.
    pub byte_len: u64,
    /// Simulated time the packet was minted, for the sink's freshness gate.
    pub created_at: SimTime,
}

impl AppPacket {
    pub fn new(seq: u32, payload_bytes: u64, header_overhead: u64, created_at: SimTime) -> Self {
        Self {
            name: format!("AppPacket:{seq}"),
            seq,
            byte_len: payload_bytes + header_overhead,
            created_at,
        }
    }
}
