//! The per-node application agent.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use floodnet_proto::{AppPacket, NodeAddr, SimTime};
use floodnet_routing::DevLog;

use crate::report::{AppReport, PeerSnapshot};

/// Host-supplied application parameters of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// The sink address (`nextRecipient`). A node whose own address matches
    /// is the sink and generates no traffic.
    pub sink: NodeAddr,
    /// Delay of the first data emission.
    pub startup_delay: Duration,
    /// Sink-side freshness gate; zero disables it.
    pub delay_limit: Duration,
    /// Cadence between emissions; zero keeps the node silent for the run.
    pub packet_spacing: Duration,
    /// Payload bytes per generated packet.
    pub payload_bytes: u64,
    /// Fixed application header overhead accounted per packet.
    pub header_overhead: u64,
}

impl AppConfig {
    pub fn new(sink: NodeAddr) -> Self {
        Self {
            sink,
            startup_delay: Duration::ZERO,
            delay_limit: Duration::ZERO,
            packet_spacing: Duration::from_secs(5),
            payload_bytes: 0,
            header_overhead: 8,
        }
    }
}

/// A packet the agent wants routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub packet: AppPacket,
    pub destination: NodeAddr,
}

/// The application agent of one node.
pub struct AppAgent {
    self_addr: NodeAddr,
    config: AppConfig,
    seq: u32,
    packets_sent: BTreeMap<NodeAddr, u64>,
    packets_received: BTreeMap<NodeAddr, u64>,
    bytes_received: BTreeMap<NodeAddr, u64>,
    log: DevLog,
}

impl AppAgent {
    pub fn new(self_addr: NodeAddr, config: AppConfig) -> Self {
        Self {
            self_addr,
            config,
            seq: 0,
            packets_sent: BTreeMap::new(),
            packets_received: BTreeMap::new(),
            bytes_received: BTreeMap::new(),
            log: DevLog::disabled(),
        }
    }

    pub fn self_addr(&self) -> &NodeAddr {
        &self.self_addr
    }

    pub fn is_sink(&self) -> bool {
        self.self_addr == self.config.sink
    }

    /// Lifecycle: open the diagnostic log and decide whether this node
    /// emits. Returns the delay of the first emission timer, or `None` for
    /// the sink and for silent nodes.
    pub fn start(&mut self, log_dir: Option<&Path>) -> Option<Duration> {
        if let Some(dir) = log_dir {
            self.log = DevLog::open(dir, &format!("Dev{}_AppLog", self.self_addr));
        }
        self.log.line(format!("Destination is {}", self.config.sink));

        if self.is_sink() {
            self.log.line("Device is Sink");
            return None;
        }
        self.log.line("Device is NOT Sink");
        if self.config.packet_spacing.is_zero() {
            self.log.line("Null packet spacing, node will stay silent");
            return None;
        }
        Some(self.config.startup_delay)
    }

    /// Emission timer: mint the next packet toward the sink and rearm.
    pub fn timer_fired(&mut self, now: SimTime) -> (Submission, Duration) {
        let packet = AppPacket::new(
            self.seq,
            self.config.payload_bytes,
            self.config.header_overhead,
            now,
        );
        self.log.line(format!("Sending packet #{}", self.seq));
        log::debug!("node {}: sending packet #{}", self.self_addr, self.seq);

        *self.packets_sent.entry(self.config.sink.clone()).or_default() += 1;
        self.seq += 1;

        (
            Submission { packet, destination: self.config.sink.clone() },
            self.config.packet_spacing,
        )
    }

    /// A delivery from the network layer. Only the sink consumes packets;
    /// anything arriving elsewhere is an internal error of the layer below.
    pub fn from_network(
        &mut self,
        packet: AppPacket,
        source: &NodeAddr,
        rssi: f64,
        lqi: f64,
        now: SimTime,
    ) {
        self.log.line("Packet received");
        log::trace!(
            "node {}: app rx \"{}\" from {source} (rssi {rssi}, lqi {lqi})",
            self.self_addr,
            packet.name
        );

        if !self.is_sink() {
            log::error!(
                "node {}: application packet \"{}\" from {source} delivered to a non-sink",
                self.self_addr,
                packet.name
            );
            self.log.line("Internal error: this device is not the sink, dropping");
            return;
        }

        let age = now.since(packet.created_at);
        if self.config.delay_limit.is_zero() || age <= self.config.delay_limit {
            self.log.line(format!("Received packet #{} from node {source}", packet.seq));
            *self.packets_received.entry(source.clone()).or_default() += 1;
            *self.bytes_received.entry(source.clone()).or_default() += packet.byte_len;
        } else {
            self.log.line(format!(
                "Packet #{} from node {source} exceeded delay limit of {:.1}s",
                packet.seq,
                self.config.delay_limit.as_secs_f64()
            ));
        }
    }

    /// Read-only end-of-run counters, published for the other agents'
    /// finalisation.
    pub fn snapshot(&self) -> PeerSnapshot {
        PeerSnapshot {
            packets_sent: self.packets_sent.clone(),
            packets_received: self.packets_received.clone(),
            bytes_received: self.bytes_received.clone(),
        }
    }

    /// Lifecycle: fold the peers' snapshots and this node's spent energy
    /// into the final report, then close the diagnostic log.
    pub fn finish(
        &mut self,
        peers: &[(NodeAddr, PeerSnapshot)],
        spent_energy_joules: f64,
    ) -> AppReport {
        let report = AppReport::build(
            &self.self_addr,
            &self.packets_received,
            peers,
            spent_energy_joules,
        );
        for rate in &report.rates {
            self.log.line(format!(
                "Reception rate from {}: {:.3} (loss {:.3})",
                rate.peer, rate.reception_rate, rate.loss_rate
            ));
        }
        if let Some(energy) = report.energy_nj_per_bit {
            self.log.line(format!("Energy: {energy:.3} nJ/bit"));
        }
        self.log.close();
        report
    }
}
