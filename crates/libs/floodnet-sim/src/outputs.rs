//! Declared-output statistics collection, after Castalia's
//! `declareOutput`/`collectOutput` pair.

use std::collections::{BTreeMap, BTreeSet};

use floodnet_proto::NodeAddr;

/// Labelled, per-node, named statistic accumulators.
///
/// Ordered maps throughout so reports render deterministically.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OutputCollector {
    declared: BTreeSet<String>,
    values: BTreeMap<NodeAddr, BTreeMap<String, BTreeMap<String, f64>>>,
}

impl OutputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str) {
        self.declared.insert(name.to_string());
    }

    /// Accumulate `value` under `(node, name, label)`. Collecting into an
    /// undeclared output still works, with a diagnostic.
    pub fn collect(&mut self, node: &NodeAddr, name: &str, label: &str, value: f64) {
        if !self.declared.contains(name) {
            log::warn!("collecting into undeclared output \"{name}\"");
        }
        *self
            .values
            .entry(node.clone())
            .or_default()
            .entry(name.to_string())
            .or_default()
            .entry(label.to_string())
            .or_default() += value;
    }

    pub fn get(&self, node: &NodeAddr, name: &str, label: &str) -> Option<f64> {
        self.values.get(node)?.get(name)?.get(label).copied()
    }

    /// Iterate `(node, output name, label, value)` in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeAddr, &str, &str, f64)> {
        self.values.iter().flat_map(|(node, outputs)| {
            outputs.iter().flat_map(move |(name, labels)| {
                labels
                    .iter()
                    .map(move |(label, value)| (node, name.as_str(), label.as_str(), *value))
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
