use std::collections::HashMap;

use floodnet_proto::{MacId, NodeAddr};

/// MAC neighbour cache: network address → link-layer identifier.
///
/// Populated from every received frame by crediting the immediate
/// transmitter's network identity to the observed MAC source. Entries are
/// overwritten by later observations of the same address; nothing is ever
/// removed within a run.
#[derive(Debug, Default)]
pub struct NeighbourCache {
    map: HashMap<NodeAddr, MacId>,
}

impl NeighbourCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, addr: NodeAddr, mac: MacId) {
        let previous = self.map.insert(addr.clone(), mac);
        if previous != Some(mac) {
            log::trace!("neighbour {addr} now maps to mac {mac}");
        }
    }

    /// Translate a next-hop network address to a unicast handle. `None`
    /// travels to the MAC layer as-is.
    pub fn resolve(&self, addr: &NodeAddr) -> Option<MacId> {
        self.map.get(addr).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeAddr, MacId)> {
        self.map.iter().map(|(addr, mac)| (addr, *mac))
    }
}
