//! The radio medium: who hears whom, how late, and how well.

use std::collections::HashMap;
use std::time::Duration;

use floodnet_proto::NodeAddr;

/// Signal metrics reported with every delivery over a link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkQuality {
    pub rssi: f64,
    pub lqi: f64,
}

impl Default for LinkQuality {
    fn default() -> Self {
        Self { rssi: -60.0, lqi: 250.0 }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Reception {
    pub peer: NodeAddr,
    pub latency: Duration,
    pub quality: LinkQuality,
}

/// Undirected link topology. A broadcast reaches every neighbour of the
/// transmitter; a unicast reaches only an adjacent node. There is no loss
/// model: a frame on an existing link always arrives.
#[derive(Debug, Default)]
pub struct RadioMedium {
    adjacency: HashMap<NodeAddr, Vec<Reception>>,
}

impl RadioMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_link(&mut self, a: NodeAddr, b: NodeAddr, latency: Duration, quality: LinkQuality) {
        self.adjacency
            .entry(a.clone())
            .or_default()
            .push(Reception { peer: b.clone(), latency, quality });
        self.adjacency.entry(b).or_default().push(Reception { peer: a, latency, quality });
    }

    pub(crate) fn neighbours(&self, of: &NodeAddr) -> &[Reception] {
        self.adjacency.get(of).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_adjacent(&self, a: &NodeAddr, b: &NodeAddr) -> bool {
        self.neighbours(a).iter().any(|r| &r.peer == b)
    }
}
