use std::collections::HashMap;

use floodnet_proto::NodeAddr;

/// Outcome of admitting a sequence number from a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Nothing was ever heard from this peer; admitted unconditionally.
    First,
    /// Above the watermark; admitted and the watermark advanced.
    Newer,
    /// At or below the watermark it carries; the packet is stale.
    Stale(u32),
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        !matches!(self, Admission::Stale(_))
    }
}

/// Per-source sequence watermark: peer → highest sequence number admitted.
///
/// The sole mechanism suppressing duplicate and looped traffic, broadcast
/// storms included. Gaps are not tracked; a lost packet's number is simply
/// never admitted.
#[derive(Debug, Default)]
pub struct SeqWatermarks {
    map: HashMap<NodeAddr, u32>,
}

impl SeqWatermarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, source: &NodeAddr, seq: u32) -> Admission {
        match self.map.get_mut(source) {
            Some(watermark) if seq <= *watermark => Admission::Stale(*watermark),
            Some(watermark) => {
                *watermark = seq;
                Admission::Newer
            }
            None => {
                self.map.insert(source.clone(), seq);
                Admission::First
            }
        }
    }

    pub fn get(&self, source: &NodeAddr) -> Option<u32> {
        self.map.get(source).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeAddr, u32)> {
        self.map.iter().map(|(addr, seq)| (addr, *seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> NodeAddr {
        NodeAddr::new(s)
    }

    #[test]
    fn unknown_peer_admitted_unconditionally() {
        let mut table = SeqWatermarks::new();
        assert_eq!(table.admit(&addr("4"), 17), Admission::First);
        assert_eq!(table.get(&addr("4")), Some(17));
    }

    #[test]
    fn stale_and_duplicate_rejected() {
        let mut table = SeqWatermarks::new();
        table.admit(&addr("4"), 5);
        assert_eq!(table.admit(&addr("4"), 5), Admission::Stale(5));
        assert_eq!(table.admit(&addr("4"), 3), Admission::Stale(5));
        assert_eq!(table.get(&addr("4")), Some(5));
    }

    #[test]
    fn watermark_is_non_decreasing() {
        let mut table = SeqWatermarks::new();
        table.admit(&addr("4"), 1);
        assert_eq!(table.admit(&addr("4"), 8), Admission::Newer);
        table.admit(&addr("4"), 2);
        assert_eq!(table.get(&addr("4")), Some(8));
    }

    #[test]
    fn peers_are_tracked_independently() {
        let mut table = SeqWatermarks::new();
        table.admit(&addr("4"), 9);
        assert_eq!(table.admit(&addr("6"), 0), Admission::First);
        assert!(table.admit(&addr("6"), 1).is_admitted());
    }
}
