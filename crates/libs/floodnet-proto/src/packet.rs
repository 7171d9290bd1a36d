//! The routing packet carried between MAC layers.
//!
//! There is no physical channel in this system, so there is no byte-level
//! codec here: a [`RoutePacket`] moves between nodes as a value. What this
//! module does own is the in-flight shape of that value — the fixed-capacity
//! source route, the cursor, and the invariants a well-formed packet obeys.

use std::fmt;

use crate::addr::NodeAddr;
use crate::app::AppPacket;
use crate::ROUTE_CAPACITY;

/// Discriminator for the four packet arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Data,
    RouteRequest,
    RouteReply,
    Ack,
}

impl PacketKind {
    /// True for the arms the TX/RX breakdowns count as "data".
    pub fn is_data(self) -> bool {
        matches!(self, PacketKind::Data)
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PacketKind::Data => "DATA",
            PacketKind::RouteRequest => "RREQ",
            PacketKind::RouteReply => "RREP",
            PacketKind::Ack => "ACK",
        })
    }
}

/// A violation of the in-flight packet invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("packet sourced and destined at {0}")]
    SelfAddressed(NodeAddr),

    #[error("route cursor {0} past capacity {ROUTE_CAPACITY}")]
    CursorOutOfRange(usize),

    #[error("blank relay slot {0} under the cursor")]
    BlankRelay(usize),

    #[error("relay slot {slot} repeats {addr}")]
    DuplicateRelay { slot: usize, addr: NodeAddr },

    #[error("relay slot {slot} names endpoint {addr}")]
    EndpointRelay { slot: usize, addr: NodeAddr },

    #[error("{0} packet without a payload")]
    MissingPayload(PacketKind),
}

/// The explicit relay chain: `ROUTE_CAPACITY` ordered slots, empty slots
/// meaning "unused".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSlots {
    slots: [Option<NodeAddr>; ROUTE_CAPACITY],
}

impl RouteSlots {
    /// All slots unused.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Transcribe a cached route into slot form: the first `N - 1` entries
    /// only, since the final entry is the packet's destination and writing
    /// it would be redundant. Entries past the array capacity are silently
    /// not transcribed.
    pub fn transcribe(route: &[NodeAddr]) -> Self {
        let mut slots = Self::empty();
        let relays = route.len().saturating_sub(1).min(ROUTE_CAPACITY);
        for (i, relay) in route[..relays].iter().enumerate() {
            slots.slots[i] = Some(relay.clone());
        }
        slots
    }

    pub fn get(&self, index: usize) -> Option<&NodeAddr> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Write `addr` at `index`. Returns false (and writes nothing) when the
    /// slot is out of range.
    pub fn set(&mut self, index: usize, addr: NodeAddr) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(addr);
                true
            }
            None => false,
        }
    }

    /// Number of leading written slots.
    pub fn written_len(&self) -> usize {
        self.slots.iter().take_while(|slot| slot.is_some()).count()
    }
}

impl fmt::Display for RouteSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for slot in self.slots.iter().flatten() {
            if !first {
                f.write_str(" -> ")?;
            }
            write!(f, "{slot}")?;
            first = false;
        }
        if first {
            f.write_str("<empty>")?;
        }
        Ok(())
    }
}

/// A record carried between MAC layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePacket {
    /// Human-readable tag, e.g. `DATA-packet::3:7`.
    pub name: String,
    pub kind: PacketKind,
    /// Originator of this logical message. Never rewritten by relays.
    pub source: NodeAddr,
    /// Ultimate recipient.
    pub destination: NodeAddr,
    /// Originator-local sequence number, fixed at emission.
    pub seq: u32,
    pub route: RouteSlots,
    /// Cursor: number of relays already consumed. In `[0, ROUTE_CAPACITY]`.
    pub index: usize,
    /// Application payload. DATA carries the routed data; RREQ carries the
    /// packet that triggered discovery; RREP and ACK carry nothing.
    pub payload: Option<AppPacket>,
}

impl RoutePacket {
    /// The next-hop address under the unified cursor rule: the slot at the
    /// cursor when it is written, the final destination once the cursor has
    /// left the written region.
    pub fn next_hop(&self) -> &NodeAddr {
        self.route.get(self.index).unwrap_or(&self.destination)
    }

    /// The network address of the immediate transmitter: the relay just
    /// behind the cursor, or the originator when nothing has relayed yet.
    pub fn last_transmitter(&self) -> &NodeAddr {
        match self.index.checked_sub(1) {
            Some(prev) => self.route.get(prev).unwrap_or(&self.source),
            None => &self.source,
        }
    }

    /// Validate the in-flight invariants. Hosts reject frames that fail
    /// this before they reach a routing engine.
    pub fn check(&self) -> Result<(), PacketError> {
        if self.source == self.destination {
            return Err(PacketError::SelfAddressed(self.source.clone()));
        }
        if self.index > ROUTE_CAPACITY {
            return Err(PacketError::CursorOutOfRange(self.index));
        }
        for i in 0..self.index {
            let relay = match self.route.get(i) {
                Some(relay) => relay,
                None => return Err(PacketError::BlankRelay(i)),
            };
            if relay == &self.source || relay == &self.destination {
                return Err(PacketError::EndpointRelay { slot: i, addr: relay.clone() });
            }
            for j in 0..i {
                if self.route.get(j) == Some(relay) {
                    return Err(PacketError::DuplicateRelay { slot: i, addr: relay.clone() });
                }
            }
        }
        match self.kind {
            PacketKind::Data | PacketKind::RouteRequest if self.payload.is_none() => {
                Err(PacketError::MissingPayload(self.kind))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimTime;

    fn addr(s: &str) -> NodeAddr {
        NodeAddr::new(s)
    }

    fn reply(source: &str, destination: &str) -> RoutePacket {
        RoutePacket {
            name: format!("REP-packet::{source}:0"),
            kind: PacketKind::RouteReply,
            source: addr(source),
            destination: addr(destination),
            seq: 0,
            route: RouteSlots::empty(),
            index: 0,
            payload: None,
        }
    }

    #[test]
    fn transcribe_drops_final_entry() {
        let route = [addr("b"), addr("c"), addr("sink")];
        let slots = RouteSlots::transcribe(&route);
        assert_eq!(slots.get(0), Some(&addr("b")));
        assert_eq!(slots.get(1), Some(&addr("c")));
        assert_eq!(slots.get(2), None);
        assert_eq!(slots.written_len(), 2);
    }

    #[test]
    fn transcribe_single_entry_route_writes_nothing() {
        let slots = RouteSlots::transcribe(&[addr("sink")]);
        assert_eq!(slots.written_len(), 0);
    }

    #[test]
    fn transcribe_caps_at_capacity() {
        let route: Vec<NodeAddr> = (0..15).map(|i| addr(&i.to_string())).collect();
        let slots = RouteSlots::transcribe(&route);
        assert_eq!(slots.written_len(), ROUTE_CAPACITY);
    }

    #[test]
    fn set_rejects_out_of_range() {
        let mut slots = RouteSlots::empty();
        assert!(slots.set(ROUTE_CAPACITY - 1, addr("x")));
        assert!(!slots.set(ROUTE_CAPACITY, addr("x")));
    }

    #[test]
    fn next_hop_prefers_written_slot() {
        let mut packet = reply("s", "a");
        packet.route.set(0, addr("b"));
        assert_eq!(packet.next_hop(), &addr("b"));
        packet.index = 1;
        assert_eq!(packet.next_hop(), &addr("a"));
    }

    #[test]
    fn last_transmitter_is_source_before_any_relay() {
        let mut packet = reply("s", "a");
        assert_eq!(packet.last_transmitter(), &addr("s"));
        packet.route.set(0, addr("b"));
        packet.index = 1;
        assert_eq!(packet.last_transmitter(), &addr("b"));
    }

    #[test]
    fn check_rejects_self_addressed() {
        let packet = reply("s", "s");
        assert_eq!(packet.check(), Err(PacketError::SelfAddressed(addr("s"))));
    }

    #[test]
    fn check_rejects_blank_relay_under_cursor() {
        let mut packet = reply("s", "a");
        packet.index = 1;
        assert_eq!(packet.check(), Err(PacketError::BlankRelay(0)));
    }

    #[test]
    fn check_rejects_repeated_relay() {
        let mut packet = reply("s", "a");
        packet.route.set(0, addr("b"));
        packet.route.set(1, addr("b"));
        packet.index = 2;
        assert!(matches!(packet.check(), Err(PacketError::DuplicateRelay { slot: 1, .. })));
    }

    #[test]
    fn check_rejects_endpoint_in_route() {
        let mut packet = reply("s", "a");
        packet.route.set(0, addr("a"));
        packet.index = 1;
        assert!(matches!(packet.check(), Err(PacketError::EndpointRelay { slot: 0, .. })));
    }

    #[test]
    fn check_requires_payload_on_data() {
        let mut packet = reply("s", "a");
        packet.kind = PacketKind::Data;
        assert_eq!(packet.check(), Err(PacketError::MissingPayload(PacketKind::Data)));
        packet.payload = Some(AppPacket::new(0, 0, 8, SimTime::ZERO));
        assert_eq!(packet.check(), Ok(()));
    }
}
