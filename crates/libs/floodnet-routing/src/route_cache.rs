use std::collections::HashMap;

use floodnet_proto::NodeAddr;

/// Source-route cache: peer → ordered relay chain ending at the peer.
///
/// The head is the adjacent next hop, the tail the peer itself. Written once
/// per peer from the first successful discovery exchange and pinned for the
/// lifetime of the run.
#[derive(Debug, Default)]
pub struct RouteCache {
    map: HashMap<NodeAddr, Vec<NodeAddr>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a route for `peer` unless one is already pinned. Returns
    /// whether this call was the first writer.
    pub fn install(&mut self, peer: NodeAddr, route: Vec<NodeAddr>) -> bool {
        if self.map.contains_key(&peer) {
            return false;
        }
        log::info!("route to {peer} pinned over {} hops", route.len());
        self.map.insert(peer, route);
        true
    }

    pub fn get(&self, peer: &NodeAddr) -> Option<&[NodeAddr]> {
        self.map.get(peer).map(Vec::as_slice)
    }

    pub fn contains(&self, peer: &NodeAddr) -> bool {
        self.map.contains_key(peer)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeAddr, &[NodeAddr])> {
        self.map.iter().map(|(peer, route)| (peer, route.as_slice()))
    }
}
