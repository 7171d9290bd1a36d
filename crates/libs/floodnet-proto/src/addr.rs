use std::fmt;

/// Stable textual network address of a node.
///
/// Addresses are compared as opaque strings; the routing layer never parses
/// them. Ordered and hashable so routing tables and end-of-run reports come
/// out deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddr(String);

impl NodeAddr {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeAddr {
    fn from(addr: &str) -> Self {
        Self::new(addr)
    }
}

impl From<String> for NodeAddr {
    fn from(addr: String) -> Self {
        Self(addr)
    }
}

/// Link-layer identifier of a node. Opaque to the routing layer except as a
/// unicast destination handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacId(pub u16);

impl fmt::Display for MacId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the MAC layer should put a frame.
///
/// A unicast carries the neighbour-cache lookup result as-is: `None` means
/// the routing layer had no mapping for the computed next hop, and what to
/// do with that is the MAC's call, not ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacTarget {
    Broadcast,
    Unicast(Option<MacId>),
}

impl fmt::Display for MacTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacTarget::Broadcast => f.write_str("broadcast"),
            MacTarget::Unicast(Some(mac)) => write!(f, "mac {mac}"),
            MacTarget::Unicast(None) => f.write_str("mac <unresolved>"),
        }
    }
}
