use std::cmp::Ordering;

use floodnet_proto::{MacId, NodeAddr, RoutePacket, SimTime};

#[derive(Debug)]
pub(crate) enum EventKind {
    TimerFired {
        node: NodeAddr,
    },
    FrameArrival {
        node: NodeAddr,
        frame: RoutePacket,
        mac_source: MacId,
        rssi: f64,
        lqi: f64,
    },
}

/// A queued simulation event. `id` is the insertion counter and breaks time
/// ties, so simultaneous events fire in the order they were scheduled.
#[derive(Debug)]
pub(crate) struct Event {
    pub time: SimTime,
    pub id: u64,
    pub kind: EventKind,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    // Reversed: BinaryHeap is a max-heap and we want the earliest event on
    // top.
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.cmp(&self.time).then_with(|| other.id.cmp(&self.id))
    }
}
