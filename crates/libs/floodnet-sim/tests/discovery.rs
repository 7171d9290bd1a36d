//! Discovery handshake end-to-end: a route request floods out, the reply
//! walks the reverse path, and data then rides the pinned route.

use std::time::Duration;

use floodnet_app::AppConfig;
use floodnet_proto::{MacId, NodeAddr};
use floodnet_sim::{LinkQuality, NodeConfig, SimConfig, Simulator};

fn addr(s: &str) -> NodeAddr {
    NodeAddr::new(s)
}

fn source(s: &str, mac: u16) -> NodeConfig {
    let mut app = AppConfig::new(addr("sink"));
    app.startup_delay = Duration::from_secs(1);
    app.packet_spacing = Duration::from_secs(5);
    NodeConfig { addr: addr(s), mac: MacId(mac), app }
}

fn sink(mac: u16) -> NodeConfig {
    NodeConfig { addr: addr("sink"), mac: MacId(mac), app: AppConfig::new(addr("sink")) }
}

fn sim(duration_secs: u64) -> Simulator {
    Simulator::new(SimConfig {
        duration: Duration::from_secs(duration_secs),
        ..SimConfig::default()
    })
}

#[test]
fn two_node_direct_exchange() {
    let mut sim = sim(7);
    sim.add_node(source("0", 0)).expect("source");
    sim.add_node(sink(1)).expect("sink");
    sim.link(&addr("0"), &addr("sink"), Duration::from_millis(10), LinkQuality::default())
        .expect("link");

    let report = sim.run();

    // First emission went out as a request, the second as routed data.
    let tx = sim.tx_breakdown(&addr("0")).expect("breakdown");
    assert_eq!(tx.new_other, 1);
    assert_eq!(tx.new_data, 1);

    // Both neighbours pinned a one-hop route to each other.
    assert_eq!(sim.cached_route(&addr("0"), &addr("sink")), Some(vec![addr("sink")]));
    assert_eq!(sim.cached_route(&addr("sink"), &addr("0")), Some(vec![addr("0")]));

    // The sink consumed the request payload and the data packet.
    let rx = sim.rx_breakdown(&addr("sink")).expect("breakdown");
    assert_eq!(rx.delivered, 2);
    assert_eq!((rx.data, rx.other), (1, 1));
    // It minted exactly one reply back.
    assert_eq!(sim.tx_breakdown(&addr("sink")).expect("breakdown").new_other, 1);

    let sink_report = &report.apps[&addr("sink")];
    assert_eq!(sink_report.rates.len(), 1);
    let rate = &sink_report.rates[0];
    assert_eq!(rate.peer, addr("0"));
    assert_eq!((rate.received, rate.sent_by_peer), (2, 2));
    assert!((rate.reception_rate - 1.0).abs() < 1e-12);
    assert!(rate.loss_rate.abs() < 1e-12);

    assert_eq!(
        report.outputs.get(&addr("sink"), "Packets received per node", "0"),
        Some(2.0)
    );

    // The traffic source reports energy over its delivered bytes; the sink,
    // which originated nothing, does not.
    assert!(report.apps[&addr("0")].energy_nj_per_bit.is_some());
    assert_eq!(report.apps[&addr("0")].bytes_delivered, 16);
    assert!(report.apps[&addr("sink")].energy_nj_per_bit.is_none());
}

#[test]
fn three_node_chain_round_trip() {
    let mut sim = sim(7);
    sim.add_node(source("0", 0)).expect("source");
    sim.add_node(source("1", 1)).expect("relay");
    sim.add_node(sink(2)).expect("sink");
    let latency = Duration::from_millis(10);
    // "0" cannot hear the sink directly.
    sim.link(&addr("0"), &addr("1"), latency, LinkQuality::default()).expect("link");
    sim.link(&addr("1"), &addr("sink"), latency, LinkQuality::default()).expect("link");

    let report = sim.run();

    // Round-trip law: the request accumulated ["1"], so the sink pinned
    // ["1", "0"] and the originator ended up with ["1", "sink"].
    assert_eq!(
        sim.cached_route(&addr("sink"), &addr("0")),
        Some(vec![addr("1"), addr("0")])
    );
    assert_eq!(
        sim.cached_route(&addr("0"), &addr("sink")),
        Some(vec![addr("1"), addr("sink")])
    );

    // The relay forwarded the request and the reply, then the data packet.
    let relay_tx = sim.tx_breakdown(&addr("1")).expect("breakdown");
    assert_eq!(relay_tx.relayed_other, 2);
    assert_eq!(relay_tx.relayed_data, 1);

    // The originator heard its own request echoed back by the relay.
    assert_eq!(sim.rx_breakdown(&addr("0")).expect("breakdown").discarded, 1);

    // Note: "1" also emits toward the sink (it is a source too), so the
    // sink hears from both; the chain traffic from "0" all arrived.
    let sink_report = &report.apps[&addr("sink")];
    let from_zero = sink_report
        .rates
        .iter()
        .find(|r| r.peer == addr("0"))
        .expect("rate line for 0");
    assert_eq!((from_zero.received, from_zero.sent_by_peer), (2, 2));
    assert!((from_zero.reception_rate - 1.0).abs() < 1e-12);
}
