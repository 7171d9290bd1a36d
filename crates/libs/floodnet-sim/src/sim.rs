//! The discrete-event run loop.

use std::collections::{BTreeMap, BinaryHeap};
use std::path::PathBuf;
use std::time::Duration;

use floodnet_app::{
    report::{AppReport, PeerSnapshot},
    OUTPUT_ENERGY, OUTPUT_LOSS_RATE, OUTPUT_RECEIVED_PER_NODE, OUTPUT_RECEPTION_RATE,
};
use floodnet_proto::{MacId, MacTarget, NodeAddr, SimTime};
use floodnet_routing::{stats, RxBreakdown, TxBreakdown, TxMessage};

use crate::energy::EnergyMeter;
use crate::event::{Event, EventKind};
use crate::medium::{LinkQuality, RadioMedium};
use crate::node::{NodeConfig, SimNode};
use crate::outputs::OutputCollector;

/// Host parameters of one run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Cut-off for event processing. Zero runs until the queue drains,
    /// which only terminates when no node generates traffic.
    pub duration: Duration,
    /// Joules charged to a node per transmitted frame.
    pub tx_energy_joules: f64,
    /// Joules charged to a node per received frame.
    pub rx_energy_joules: f64,
    /// Where the per-node `Dev<addr>_*Log` files go; `None` disables them.
    pub log_dir: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            duration: Duration::ZERO,
            tx_energy_joules: 100e-6,
            rx_energy_joules: 50e-6,
            log_dir: None,
        }
    }
}

/// Topology or configuration mistakes caught while assembling a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("node {0} is already registered")]
    DuplicateAddress(NodeAddr),

    #[error("mac {0} is already registered")]
    DuplicateMac(MacId),

    #[error("unknown node {0}")]
    UnknownNode(NodeAddr),

    #[error("cannot link {0} to itself")]
    SelfLink(NodeAddr),
}

/// What a completed run leaves behind.
#[derive(Debug)]
pub struct RunReport {
    pub finished_at: SimTime,
    pub events_processed: u64,
    pub outputs: OutputCollector,
    pub apps: BTreeMap<NodeAddr, AppReport>,
}

/// The single-threaded discrete-event simulator. Owns every node, the
/// medium, the clock and the queue; drives one run.
pub struct Simulator {
    config: SimConfig,
    time: SimTime,
    queue: BinaryHeap<Event>,
    next_event_id: u64,
    nodes: BTreeMap<NodeAddr, SimNode>,
    medium: RadioMedium,
    energy: EnergyMeter,
    outputs: OutputCollector,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        let energy = EnergyMeter::new(config.tx_energy_joules, config.rx_energy_joules);
        Self {
            config,
            time: SimTime::ZERO,
            queue: BinaryHeap::new(),
            next_event_id: 0,
            nodes: BTreeMap::new(),
            medium: RadioMedium::new(),
            energy,
            outputs: OutputCollector::new(),
        }
    }

    pub fn add_node(&mut self, config: NodeConfig) -> Result<(), SimError> {
        if self.nodes.contains_key(&config.addr) {
            return Err(SimError::DuplicateAddress(config.addr));
        }
        if self.nodes.values().any(|node| node.mac == config.mac) {
            return Err(SimError::DuplicateMac(config.mac));
        }
        self.nodes.insert(config.addr.clone(), SimNode::new(config));
        Ok(())
    }

    pub fn link(
        &mut self,
        a: &NodeAddr,
        b: &NodeAddr,
        latency: Duration,
        quality: LinkQuality,
    ) -> Result<(), SimError> {
        if a == b {
            return Err(SimError::SelfLink(a.clone()));
        }
        for addr in [a, b] {
            if !self.nodes.contains_key(addr) {
                return Err(SimError::UnknownNode(addr.clone()));
            }
        }
        self.medium.add_link(a.clone(), b.clone(), latency, quality);
        Ok(())
    }

    pub fn now(&self) -> SimTime {
        self.time
    }

    /// A node's pinned route to `peer`, for post-run inspection.
    pub fn cached_route(&self, node: &NodeAddr, peer: &NodeAddr) -> Option<Vec<NodeAddr>> {
        self.nodes.get(node)?.engine.cached_route(peer).map(<[NodeAddr]>::to_vec)
    }

    pub fn tx_breakdown(&self, node: &NodeAddr) -> Option<TxBreakdown> {
        self.nodes.get(node).map(|n| n.engine.tx_breakdown())
    }

    pub fn rx_breakdown(&self, node: &NodeAddr) -> Option<RxBreakdown> {
        self.nodes.get(node).map(|n| n.engine.rx_breakdown())
    }

    pub fn spent_energy(&self, node: &NodeAddr) -> f64 {
        self.energy.spent_energy(node)
    }

    /// Drive the run: start every node, drain the queue up to the
    /// configured duration, then finish every node and fold the counters
    /// into the report. A simulator drives exactly one run.
    pub fn run(&mut self) -> RunReport {
        self.outputs.declare(stats::OUTPUT_TX);
        self.outputs.declare(stats::OUTPUT_RX);
        self.outputs.declare(OUTPUT_RECEIVED_PER_NODE);

        self.start_nodes();

        let deadline =
            (!self.config.duration.is_zero()).then(|| SimTime::ZERO + self.config.duration);
        let mut events_processed = 0u64;

        while let Some(event) = self.queue.pop() {
            if let Some(end) = deadline {
                if event.time > end {
                    break;
                }
            }
            self.time = event.time;
            events_processed += 1;
            self.dispatch(event.kind);
        }

        let apps = self.finish_nodes();

        RunReport {
            finished_at: self.time,
            events_processed,
            outputs: self.outputs.clone(),
            apps,
        }
    }

    fn start_nodes(&mut self) {
        let log_dir = self.config.log_dir.clone();
        let addrs: Vec<NodeAddr> = self.nodes.keys().cloned().collect();
        for addr in addrs {
            let first_timer = match self.nodes.get_mut(&addr) {
                Some(node) => {
                    node.engine.start(log_dir.as_deref());
                    node.app.start(log_dir.as_deref())
                }
                None => None,
            };
            if let Some(delay) = first_timer {
                self.schedule(SimTime::ZERO + delay, EventKind::TimerFired { node: addr });
            }
        }
    }

    fn dispatch(&mut self, kind: EventKind) {
        match kind {
            EventKind::TimerFired { node: addr } => {
                let now = self.time;
                let emitted = match self.nodes.get_mut(&addr) {
                    Some(node) => {
                        let (submission, rearm) = node.app.timer_fired(now);
                        let tx = node
                            .engine
                            .from_application(submission.packet, &submission.destination);
                        Some((tx, rearm))
                    }
                    None => None,
                };
                if let Some((tx, rearm)) = emitted {
                    self.schedule(now + rearm, EventKind::TimerFired { node: addr.clone() });
                    if let Some(message) = tx {
                        self.transmit(&addr, message);
                    }
                }
            }
            EventKind::FrameArrival { node: addr, frame, mac_source, rssi, lqi } => {
                self.energy.charge_rx(&addr);
                let now = self.time;
                let actions = match self.nodes.get_mut(&addr) {
                    Some(node) => {
                        let actions = node.engine.from_mac(frame, mac_source, rssi, lqi);
                        if let Some(delivery) = actions.deliver {
                            node.app.from_network(
                                delivery.packet,
                                &delivery.source,
                                rssi,
                                lqi,
                                now,
                            );
                        }
                        actions.tx
                    }
                    None => None,
                };
                if let Some(message) = actions {
                    self.transmit(&addr, message);
                }
            }
        }
    }

    /// Put a frame on the medium. Broadcasts fan out to every neighbour;
    /// unicasts reach the adjacent owner of the target MAC or vanish.
    fn transmit(&mut self, from: &NodeAddr, message: TxMessage) {
        self.energy.charge_tx(from);
        let sender_mac = match self.nodes.get(from) {
            Some(node) => node.mac,
            None => return,
        };

        match message.target {
            MacTarget::Broadcast => {
                let receptions = self.medium.neighbours(from).to_vec();
                for reception in receptions {
                    self.schedule(
                        self.time + reception.latency,
                        EventKind::FrameArrival {
                            node: reception.peer,
                            frame: message.packet.clone(),
                            mac_source: sender_mac,
                            rssi: reception.quality.rssi,
                            lqi: reception.quality.lqi,
                        },
                    );
                }
            }
            MacTarget::Unicast(Some(mac)) => {
                let target = self
                    .medium
                    .neighbours(from)
                    .iter()
                    .find(|r| self.nodes.get(&r.peer).map(|n| n.mac) == Some(mac))
                    .cloned();
                match target {
                    Some(reception) => self.schedule(
                        self.time + reception.latency,
                        EventKind::FrameArrival {
                            node: reception.peer,
                            frame: message.packet,
                            mac_source: sender_mac,
                            rssi: reception.quality.rssi,
                            lqi: reception.quality.lqi,
                        },
                    ),
                    None => log::debug!(
                        "frame \"{}\" from {from} to mac {mac} lost: no adjacent owner",
                        message.packet.name
                    ),
                }
            }
            MacTarget::Unicast(None) => log::debug!(
                "frame \"{}\" from {from} dropped: next hop never resolved",
                message.packet.name
            ),
        }
    }

    fn schedule(&mut self, time: SimTime, kind: EventKind) {
        let id = self.next_event_id;
        self.next_event_id += 1;
        self.queue.push(Event { time, id, kind });
    }

    /// Engine table dumps, counter collection, snapshot exchange, agent
    /// reports. Runs strictly after event processing has stopped, so the
    /// snapshots are a consistent read-only view.
    fn finish_nodes(&mut self) -> BTreeMap<NodeAddr, AppReport> {
        let addrs: Vec<NodeAddr> = self.nodes.keys().cloned().collect();

        for addr in &addrs {
            if let Some(node) = self.nodes.get_mut(addr) {
                node.engine.finish();
            }
        }
        for addr in &addrs {
            let breakdowns = self
                .nodes
                .get(addr)
                .map(|n| (n.engine.tx_breakdown(), n.engine.rx_breakdown()));
            if let Some((tx, rx)) = breakdowns {
                for (label, value) in tx.labelled() {
                    self.outputs.collect(addr, stats::OUTPUT_TX, label, value as f64);
                }
                for (label, value) in rx.labelled() {
                    self.outputs.collect(addr, stats::OUTPUT_RX, label, value as f64);
                }
            }
        }

        self.outputs.declare(OUTPUT_RECEPTION_RATE);
        self.outputs.declare(OUTPUT_LOSS_RATE);

        let snapshots: Vec<(NodeAddr, PeerSnapshot)> = addrs
            .iter()
            .filter_map(|addr| self.nodes.get(addr).map(|n| (addr.clone(), n.app.snapshot())))
            .collect();

        let mut apps = BTreeMap::new();
        for addr in &addrs {
            let peers: Vec<(NodeAddr, PeerSnapshot)> =
                snapshots.iter().filter(|(peer, _)| peer != addr).cloned().collect();
            let spent = self.energy.spent_energy(addr);
            let report = match self.nodes.get_mut(addr) {
                Some(node) => node.app.finish(&peers, spent),
                None => continue,
            };

            for (peer, count) in &report.packets_received {
                self.outputs.collect(addr, OUTPUT_RECEIVED_PER_NODE, peer.as_str(), *count as f64);
            }
            for rate in &report.rates {
                self.outputs.collect(
                    addr,
                    OUTPUT_RECEPTION_RATE,
                    rate.peer.as_str(),
                    rate.reception_rate,
                );
                self.outputs.collect(addr, OUTPUT_LOSS_RATE, rate.peer.as_str(), rate.loss_rate);
            }
            if let Some(energy) = report.energy_nj_per_bit {
                self.outputs.declare(OUTPUT_ENERGY);
                self.outputs.collect(addr, OUTPUT_ENERGY, "total", energy);
            }

            apps.insert(addr.clone(), report);
        }
        apps
    }
}
