//! End-of-run reporting from read-only peer snapshots.
//!
//! The original design reached sideways through the topology to read other
//! nodes' counters at finish. Here every agent publishes a [`PeerSnapshot`]
//! once event processing has stopped, and the host hands each finishing
//! agent the others' snapshots — same numbers, no cross-object pointer
//! chasing.

use std::collections::BTreeMap;

use floodnet_proto::NodeAddr;

/// Read-only end-of-run counters of one application agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerSnapshot {
    pub packets_sent: BTreeMap<NodeAddr, u64>,
    pub packets_received: BTreeMap<NodeAddr, u64>,
    pub bytes_received: BTreeMap<NodeAddr, u64>,
}

impl PeerSnapshot {
    pub fn sent_to(&self, peer: &NodeAddr) -> u64 {
        self.packets_sent.get(peer).copied().unwrap_or(0)
    }

    pub fn received_bytes_from(&self, peer: &NodeAddr) -> u64 {
        self.bytes_received.get(peer).copied().unwrap_or(0)
    }
}

/// Delivery figures for one peer that sent us traffic.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerRate {
    pub peer: NodeAddr,
    pub received: u64,
    pub sent_by_peer: u64,
    pub reception_rate: f64,
    pub loss_rate: f64,
}

/// What one agent reports at finish.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppReport {
    /// One entry per peer whose snapshot shows traffic sent to this node.
    pub rates: Vec<PeerRate>,
    /// The sink's raw per-source delivery counts.
    pub packets_received: BTreeMap<NodeAddr, u64>,
    /// Bytes of this node's traffic the peers report as delivered.
    pub bytes_delivered: u64,
    /// Spent energy over delivered bits, when anything was delivered.
    pub energy_nj_per_bit: Option<f64>,
}

impl AppReport {
    /// Build the report for `self_addr` from the peers' snapshots, this
    /// node's own received counters, and its spent energy in joules.
    pub fn build(
        self_addr: &NodeAddr,
        packets_received: &BTreeMap<NodeAddr, u64>,
        peers: &[(NodeAddr, PeerSnapshot)],
        spent_energy_joules: f64,
    ) -> Self {
        let mut rates = Vec::new();
        let mut bytes_delivered = 0u64;

        for (peer, snapshot) in peers {
            let sent = snapshot.sent_to(self_addr);
            if sent > 0 {
                let received = packets_received.get(peer).copied().unwrap_or(0);
                let reception_rate = received as f64 / sent as f64;
                rates.push(PeerRate {
                    peer: peer.clone(),
                    received,
                    sent_by_peer: sent,
                    reception_rate,
                    loss_rate: 1.0 - reception_rate,
                });
            }
            bytes_delivered += snapshot.received_bytes_from(self_addr);
        }

        let energy_nj_per_bit = (bytes_delivered > 0)
            .then(|| spent_energy_joules * 1_000_000_000.0 / (bytes_delivered * 8) as f64);

        Self {
            rates,
            packets_received: packets_received.clone(),
            bytes_delivered,
            energy_nj_per_bit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> NodeAddr {
        NodeAddr::new(s)
    }

    #[test]
    fn sink_reports_rates_for_each_sender() {
        let sink = addr("sink");
        let mut received = BTreeMap::new();
        received.insert(addr("0"), 3u64);

        let mut origin = PeerSnapshot::default();
        origin.packets_sent.insert(sink.clone(), 4);
        let idle = PeerSnapshot::default();

        let report = AppReport::build(
            &sink,
            &received,
            &[(addr("0"), origin), (addr("1"), idle)],
            0.5,
        );

        assert_eq!(report.rates.len(), 1, "idle peers produce no rate line");
        let rate = &report.rates[0];
        assert_eq!(rate.peer, addr("0"));
        assert_eq!((rate.received, rate.sent_by_peer), (3, 4));
        assert!((rate.reception_rate - 0.75).abs() < 1e-12);
        assert!((rate.loss_rate - 0.25).abs() < 1e-12);
        // The sink originates nothing, so nothing of its own was delivered.
        assert_eq!(report.bytes_delivered, 0);
        assert_eq!(report.energy_nj_per_bit, None);
    }

    #[test]
    fn source_reports_energy_over_delivered_bytes() {
        let origin = addr("0");
        let mut sink_snapshot = PeerSnapshot::default();
        sink_snapshot.bytes_received.insert(origin.clone(), 16);

        let report = AppReport::build(
            &origin,
            &BTreeMap::new(),
            &[(addr("sink"), sink_snapshot)],
            0.000_001,
        );

        assert_eq!(report.bytes_delivered, 16);
        // 1e-6 J * 1e9 / (16 * 8) bits
        let energy = report.energy_nj_per_bit.expect("energy figure");
        assert!((energy - 7.8125).abs() < 1e-9);
        assert!(report.rates.is_empty());
    }

    #[test]
    fn no_delivery_means_no_energy_line() {
        let report = AppReport::build(&addr("0"), &BTreeMap::new(), &[], 2.0);
        assert_eq!(report.energy_nj_per_bit, None);
        assert_eq!(report, AppReport::default());
    }
}
