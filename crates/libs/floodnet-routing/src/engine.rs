//! The per-node routing state machine.

use std::path::Path;

use floodnet_proto::{
    AppPacket, MacId, MacTarget, NodeAddr, PacketKind, RoutePacket, RouteSlots, ROUTE_CAPACITY,
};

use crate::devlog::DevLog;
use crate::neighbour_cache::NeighbourCache;
use crate::route_cache::RouteCache;
use crate::seq_table::{Admission, SeqWatermarks};
use crate::stats::{RxBreakdown, TxBreakdown};

/// A frame the engine wants transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxMessage {
    pub target: MacTarget,
    pub packet: RoutePacket,
}

/// A payload decapsulated for the application layer, with the network-level
/// originator it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub packet: AppPacket,
    pub source: NodeAddr,
}

/// Everything a MAC reception produced: at most one payload up to the
/// application and at most one frame back out.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RxActions {
    pub deliver: Option<Delivery>,
    pub tx: Option<TxMessage>,
}

impl RxActions {
    fn none() -> Self {
        Self::default()
    }

    fn tx(message: TxMessage) -> Self {
        Self { deliver: None, tx: Some(message) }
    }
}

/// The routing engine of one node.
///
/// Strictly instance-scoped: two engines in one process share nothing. The
/// host calls [`start`](Self::start) before the first packet and
/// [`finish`](Self::finish) after the last; in between, every entry point
/// runs to completion and returns what should happen next.
pub struct RoutingEngine {
    self_addr: NodeAddr,
    seq: u32,
    neighbours: NeighbourCache,
    routes: RouteCache,
    watermarks: SeqWatermarks,
    tx: TxBreakdown,
    rx: RxBreakdown,
    log: DevLog,
}

impl RoutingEngine {
    pub fn new(self_addr: NodeAddr) -> Self {
        Self {
            self_addr,
            seq: 0,
            neighbours: NeighbourCache::new(),
            routes: RouteCache::new(),
            watermarks: SeqWatermarks::new(),
            tx: TxBreakdown::default(),
            rx: RxBreakdown::default(),
            log: DevLog::disabled(),
        }
    }

    /// Lifecycle: open the per-node diagnostic log.
    pub fn start(&mut self, log_dir: Option<&Path>) {
        if let Some(dir) = log_dir {
            self.log = DevLog::open(dir, &format!("Dev{}_RoutingLog", self.self_addr));
        }
    }

    /// Lifecycle: dump the tables and close the diagnostic log. No state is
    /// persisted; the engine is discarded with the run.
    pub fn finish(&mut self) {
        self.log.line("Address mappings:");
        for (addr, mac) in self.neighbours.iter() {
            self.log.line(format!("{addr}, {mac}"));
        }
        self.log.line(format!("\nRouting table ({} entries):", self.routes.len()));
        for (peer, route) in self.routes.iter() {
            let hops: Vec<&str> = route.iter().map(NodeAddr::as_str).collect();
            self.log.line(format!(
                "Destination: {peer} - Route (length: {}): {}",
                route.len(),
                hops.join(" ")
            ));
        }
        self.log.line("\nSEQ mappings:");
        for (addr, seq) in self.watermarks.iter() {
            self.log.line(format!("{addr}, {seq}"));
        }
        self.log.close();
    }

    pub fn self_addr(&self) -> &NodeAddr {
        &self.self_addr
    }

    pub fn tx_breakdown(&self) -> TxBreakdown {
        self.tx
    }

    pub fn rx_breakdown(&self) -> RxBreakdown {
        self.rx
    }

    pub fn cached_route(&self, peer: &NodeAddr) -> Option<&[NodeAddr]> {
        self.routes.get(peer)
    }

    /// Application injection: data rides a pinned source route when one
    /// exists, otherwise the payload is encapsulated in a broadcast route
    /// request. Either way a fresh sequence number is spent.
    pub fn from_application(
        &mut self,
        payload: AppPacket,
        destination: &NodeAddr,
    ) -> Option<TxMessage> {
        if destination == &self.self_addr {
            log::error!("node {}: asked to route a packet to itself", self.self_addr);
            self.log.line("Internal error: self-destined submission, dropping");
            return None;
        }

        if let Some(route) = self.routes.get(destination) {
            let packet = RoutePacket {
                name: format!("DATA-packet::{}:{}", self.self_addr, payload.seq),
                kind: PacketKind::Data,
                source: self.self_addr.clone(),
                destination: destination.clone(),
                seq: self.seq,
                route: RouteSlots::transcribe(route),
                index: 0,
                payload: Some(payload),
            };
            let next_hop = packet.next_hop().clone();
            let target = MacTarget::Unicast(self.neighbours.resolve(&next_hop));
            self.seq += 1;
            self.tx.new_data += 1;
            self.log.line(format!("Data \"{}\" sent to device {next_hop}\n", packet.name));
            Some(TxMessage { target, packet })
        } else {
            let packet = RoutePacket {
                name: format!("REQ-packet::{}:{}", self.self_addr, payload.seq),
                kind: PacketKind::RouteRequest,
                source: self.self_addr.clone(),
                destination: destination.clone(),
                seq: self.seq,
                route: RouteSlots::empty(),
                index: 0,
                payload: Some(payload),
            };
            self.seq += 1;
            self.tx.new_other += 1;
            self.log.line(format!("Request \"{}\" broadcast to MAC layer\n", packet.name));
            Some(TxMessage { target: MacTarget::Broadcast, packet })
        }
    }

    /// MAC reception. Neighbour-learning always happens first, then the
    /// self-origin and sequence filters, then the per-type dispatch.
    pub fn from_mac(
        &mut self,
        packet: RoutePacket,
        mac_source: MacId,
        rssi: f64,
        lqi: f64,
    ) -> RxActions {
        self.log.line(format!("Packet received from MAC layer: \"{}\"", packet.name));
        log::trace!(
            "node {}: rx \"{}\" from mac {mac_source} (rssi {rssi}, lqi {lqi})",
            self.self_addr,
            packet.name
        );

        if let Err(err) = packet.check() {
            self.log.line(format!("Unrecognized packet ({err}), discarding\n"));
            self.rx.discarded += 1;
            return RxActions::none();
        }

        let transmitter = packet.last_transmitter().clone();
        self.neighbours.observe(transmitter, mac_source);

        if packet.source == self.self_addr {
            self.log.line("This packet came from us, discarding\n");
            self.rx.discarded += 1;
            return RxActions::none();
        }

        match self.watermarks.admit(&packet.source, packet.seq) {
            Admission::Stale(watermark) => {
                self.log.line(format!(
                    "This packet has an older SEQ - tracked: {watermark}, packet: {} - discarding\n",
                    packet.seq
                ));
                self.rx.discarded += 1;
                return RxActions::none();
            }
            Admission::First => {
                self.log.line(format!(
                    "First time listening from {}: registering SEQ: {}",
                    packet.source, packet.seq
                ));
            }
            Admission::Newer => {}
        }

        match packet.kind {
            PacketKind::Data => self.handle_data(packet),
            PacketKind::RouteRequest => self.handle_route_request(packet),
            PacketKind::RouteReply => self.handle_route_reply(packet),
            PacketKind::Ack => {
                self.log.line("ACK handling is not implemented, ignoring\n");
                RxActions::none()
            }
        }
    }

    fn handle_data(&mut self, mut packet: RoutePacket) -> RxActions {
        self.rx.data += 1;

        if packet.destination == self.self_addr {
            match packet.payload.take() {
                Some(app) => {
                    self.log
                        .line("Data packet reached destination, delivering to application layer\n");
                    self.rx.delivered += 1;
                    RxActions {
                        deliver: Some(Delivery { packet: app, source: packet.source }),
                        tx: None,
                    }
                }
                None => {
                    self.log.line("Data packet without payload, discarding\n");
                    self.rx.discarded += 1;
                    RxActions::none()
                }
            }
        } else {
            packet.index = (packet.index + 1).min(ROUTE_CAPACITY);
            let next_hop = packet.next_hop().clone();
            let target = MacTarget::Unicast(self.neighbours.resolve(&next_hop));
            self.tx.relayed_data += 1;
            self.log.line(format!("Data \"{}\" sent to device {next_hop}\n", packet.name));
            RxActions::tx(TxMessage { target, packet })
        }
    }

    fn handle_route_request(&mut self, mut packet: RoutePacket) -> RxActions {
        self.rx.other += 1;

        if packet.destination != self.self_addr {
            // Record ourselves in the route and keep flooding. A full route
            // array means we relay without leaving a trace.
            packet.route.set(packet.index, self.self_addr.clone());
            packet.index = (packet.index + 1).min(ROUTE_CAPACITY);
            self.tx.relayed_other += 1;
            self.log.line(format!("Request \"{}\" broadcast to MAC layer\n", packet.name));
            return RxActions::tx(TxMessage { target: MacTarget::Broadcast, packet });
        }

        if self.routes.contains(&packet.source) {
            self.log.line("Request ignored, we already have a route\n");
            self.rx.discarded += 1;
            return RxActions::none();
        }

        let reverse = self.reverse_route(&packet);
        self.log_route(&packet);
        self.routes.install(packet.source.clone(), reverse.clone());

        let deliver = match packet.payload.take() {
            Some(app) => {
                self.log.line("Unpacking and delivering to application");
                self.rx.delivered += 1;
                Some(Delivery { packet: app, source: packet.source.clone() })
            }
            None => {
                self.log.line("Request carried no payload");
                None
            }
        };

        let reply = RoutePacket {
            name: packet.name.replacen("REQ", "REP", 1),
            kind: PacketKind::RouteReply,
            source: self.self_addr.clone(),
            destination: packet.source.clone(),
            seq: self.seq,
            route: RouteSlots::transcribe(&reverse),
            index: 0,
            payload: None,
        };
        let next_hop = reply.next_hop().clone();
        let target = MacTarget::Unicast(self.neighbours.resolve(&next_hop));
        self.seq += 1;
        self.tx.new_other += 1;
        self.log.line(format!("Reply \"{}\" sent to device {next_hop}\n", reply.name));

        RxActions { deliver, tx: Some(TxMessage { target, packet: reply }) }
    }

    fn handle_route_reply(&mut self, mut packet: RoutePacket) -> RxActions {
        self.rx.other += 1;

        if packet.destination != self.self_addr {
            packet.index = (packet.index + 1).min(ROUTE_CAPACITY);
            let next_hop = packet.next_hop().clone();
            let target = MacTarget::Unicast(self.neighbours.resolve(&next_hop));
            self.tx.relayed_other += 1;
            self.log.line(format!("Reply \"{}\" sent to device {next_hop}\n", packet.name));
            return RxActions::tx(TxMessage { target, packet });
        }

        if self.routes.contains(&packet.source) {
            self.log.line("Reply ignored, we already have a route\n");
            self.rx.discarded += 1;
            return RxActions::none();
        }

        let reverse = self.reverse_route(&packet);
        self.log_route(&packet);
        self.routes.install(packet.source.clone(), reverse);
        self.log.line("Route saved\n");
        RxActions::none()
    }

    /// The reverse path as seen from this node: the relays under the cursor
    /// back-to-front, then the originator. Head = the neighbour the packet
    /// arrived through, tail = the peer the route leads to.
    fn reverse_route(&self, packet: &RoutePacket) -> Vec<NodeAddr> {
        let mut route = Vec::with_capacity(packet.index + 1);
        for i in (0..packet.index).rev() {
            if let Some(relay) = packet.route.get(i) {
                route.push(relay.clone());
            }
        }
        route.push(packet.source.clone());
        route
    }

    fn log_route(&mut self, packet: &RoutePacket) {
        let mut shown = packet.source.to_string();
        for i in 0..packet.index {
            if let Some(relay) = packet.route.get(i) {
                shown.push_str(" -> ");
                shown.push_str(relay.as_str());
            }
        }
        shown.push_str(" -> ");
        shown.push_str(packet.destination.as_str());
        self.log.line(format!("Displaying route: {shown}"));
        self.log.line("Saving route...");
    }
}
