//! TOML scenario files: the topology and parameters of one run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context};
use floodnet_app::AppConfig;
use floodnet_proto::{MacId, NodeAddr};
use floodnet_sim::{LinkQuality, NodeConfig, SimConfig, Simulator};
use serde::Deserialize;

fn default_spacing_secs() -> f64 {
    5.0
}

fn default_latency_ms() -> u64 {
    10
}

fn default_tx_energy() -> f64 {
    100e-6
}

fn default_rx_energy() -> f64 {
    50e-6
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    pub addr: String,
    pub mac: u16,
    #[serde(default)]
    pub startup_delay_secs: f64,
    #[serde(default)]
    pub delay_limit_secs: f64,
    #[serde(default = "default_spacing_secs")]
    pub packet_spacing_secs: f64,
    #[serde(default)]
    pub payload_bytes: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkSpec {
    pub a: String,
    pub b: String,
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    pub rssi: Option<f64>,
    pub lqi: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// The sink address every node's traffic is destined for.
    pub sink: String,
    pub duration_secs: f64,
    #[serde(default = "default_tx_energy")]
    pub tx_energy_joules: f64,
    #[serde(default = "default_rx_energy")]
    pub rx_energy_joules: f64,
    pub log_dir: Option<PathBuf>,
    pub nodes: Vec<NodeSpec>,
    pub links: Vec<LinkSpec>,
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario: Scenario = toml::from_str(&text)
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.nodes.is_empty(), "scenario has no nodes");
        ensure!(self.duration_secs > 0.0, "duration_secs must be positive");
        ensure!(
            self.nodes.iter().any(|n| n.addr == self.sink),
            "sink \"{}\" is not among the nodes",
            self.sink
        );
        for node in &self.nodes {
            for (field, value) in [
                ("startup_delay_secs", node.startup_delay_secs),
                ("delay_limit_secs", node.delay_limit_secs),
                ("packet_spacing_secs", node.packet_spacing_secs),
            ] {
                ensure!(value >= 0.0, "node {}: {field} must not be negative", node.addr);
            }
        }
        Ok(())
    }

    /// Assemble a simulator for this scenario.
    pub fn build(&self) -> anyhow::Result<Simulator> {
        let mut sim = Simulator::new(SimConfig {
            duration: Duration::from_secs_f64(self.duration_secs),
            tx_energy_joules: self.tx_energy_joules,
            rx_energy_joules: self.rx_energy_joules,
            log_dir: self.log_dir.clone(),
        });

        let sink = NodeAddr::new(self.sink.clone());
        for spec in &self.nodes {
            let mut app = AppConfig::new(sink.clone());
            app.startup_delay = Duration::from_secs_f64(spec.startup_delay_secs);
            app.delay_limit = Duration::from_secs_f64(spec.delay_limit_secs);
            app.packet_spacing = Duration::from_secs_f64(spec.packet_spacing_secs);
            app.payload_bytes = spec.payload_bytes;
            sim.add_node(NodeConfig {
                addr: NodeAddr::new(spec.addr.clone()),
                mac: MacId(spec.mac),
                app,
            })
            .with_context(|| format!("adding node {}", spec.addr))?;
        }

        for spec in &self.links {
            let mut quality = LinkQuality::default();
            if let Some(rssi) = spec.rssi {
                quality.rssi = rssi;
            }
            if let Some(lqi) = spec.lqi {
                quality.lqi = lqi;
            }
            sim.link(
                &NodeAddr::new(spec.a.clone()),
                &NodeAddr::new(spec.b.clone()),
                Duration::from_millis(spec.latency_ms),
                quality,
            )
            .with_context(|| format!("linking {} to {}", spec.a, spec.b))?;
        }

        Ok(sim)
    }
}
