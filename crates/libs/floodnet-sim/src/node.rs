use floodnet_app::{AppAgent, AppConfig};
use floodnet_proto::{MacId, NodeAddr};
use floodnet_routing::RoutingEngine;

/// Host-side description of one node: its identities plus the application
/// parameters the host injects.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub addr: NodeAddr,
    pub mac: MacId,
    pub app: AppConfig,
}

/// A running node: routing engine below, application agent above, wired
/// together only by the host's event dispatch.
pub(crate) struct SimNode {
    pub mac: MacId,
    pub engine: RoutingEngine,
    pub app: AppAgent,
}

impl SimNode {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            mac: config.mac,
            engine: RoutingEngine::new(config.addr.clone()),
            app: AppAgent::new(config.addr, config.app),
        }
    }
}
