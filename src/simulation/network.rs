//! Directed route network between vertiports.

use ordered_float::OrderedFloat;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use super::types::VertiportName;

/// Directed graph of flight routes, edge weights in minutes of flight time
#[derive(Debug, Default)]
pub struct TransportNetwork {
    graph: DiGraph<VertiportName, f64>,
    name_to_node: HashMap<VertiportName, NodeIndex>,
}

impl TransportNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, name: &VertiportName) -> NodeIndex {
        if let Some(&index) = self.name_to_node.get(name) {
            return index;
        }
        let index = self.graph.add_node(name.clone());
        self.name_to_node.insert(name.clone(), index);
        index
    }

    /// Add a directed route. Re-adding an existing route replaces its weight.
    pub fn add_route(&mut self, src: &VertiportName, dest: &VertiportName, minutes: f64) {
        let src_index = self.ensure_node(src);
        let dest_index = self.ensure_node(dest);
        self.graph.update_edge(src_index, dest_index, minutes);
    }

    /// Flight time of the direct route, if one exists
    pub fn minutes(&self, src: &VertiportName, dest: &VertiportName) -> Option<f64> {
        let src_index = *self.name_to_node.get(src)?;
        let dest_index = *self.name_to_node.get(dest)?;
        self.graph
            .edges(src_index)
            .find(|edge| edge.target() == dest_index)
            .map(|edge| *edge.weight())
    }

    /// Shortest direct route out of a vertiport, in minutes
    pub fn cheapest_from(&self, src: &VertiportName) -> Option<f64> {
        let &src_index = self.name_to_node.get(src)?;
        self.graph
            .edges(src_index)
            .map(|edge| *edge.weight())
            .min_by_key(|&w| OrderedFloat(w))
    }

    pub fn route_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn vertiport_count(&self) -> usize {
        self.graph.node_count()
    }
}
