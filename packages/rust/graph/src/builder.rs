//! Graph construction from the merged edge table.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use castgraph_shared::{GraphSettings, MergedTable};

use crate::layout::Point;

/// Edge label used when a relationship cell is empty.
pub const DEFAULT_RELATIONSHIP: &str = "related";

/// Per-item font override in the vis-network data model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSpec {
    pub size: u32,
}

/// A character node, serialized as a vis-network node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    /// Hover tooltip.
    pub title: String,
    pub shape: &'static str,
    pub image: String,
    pub size: u32,
    pub font: FontSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

/// A relationship edge, serialized as a vis-network edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub label: String,
    /// Hover tooltip, same text as the label.
    pub title: String,
    pub font: FontSpec,
}

/// Nodes in first-seen order plus every edge.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    index: HashMap<String, usize>,
}

impl Graph {
    /// Position of a node in [`Graph::nodes`].
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// `true` once every node carries coordinates.
    pub fn is_positioned(&self) -> bool {
        !self.nodes.is_empty() && self.nodes.iter().all(|n| n.x.is_some() && n.y.is_some())
    }

    /// A copy of this graph with `positions[i]` fixed on node `i`.
    pub fn with_positions(&self, positions: &[Point]) -> Graph {
        let nodes = self
            .nodes
            .iter()
            .zip(positions)
            .map(|(node, p)| GraphNode {
                x: Some(p.x),
                y: Some(p.y),
                ..node.clone()
            })
            .collect();

        Graph {
            nodes,
            edges: self.edges.clone(),
            index: self.index.clone(),
        }
    }

    /// Register a node unless its id is already known. First registration wins.
    fn add_node(&mut self, name: &str, image: &str, settings: &GraphSettings) {
        if self.index.contains_key(name) {
            return;
        }
        self.index.insert(name.to_string(), self.nodes.len());
        self.nodes.push(GraphNode {
            id: name.to_string(),
            label: name.to_string(),
            title: name.to_string(),
            shape: "image",
            image: image.to_string(),
            size: settings.node_size,
            font: FontSpec {
                size: settings.label_font_size,
            },
            x: None,
            y: None,
        });
    }
}

/// Build the graph: one node per distinct non-empty endpoint name, one edge
/// per record whose endpoints are both non-empty.
pub fn build_graph(merged: &MergedTable, settings: &GraphSettings) -> Graph {
    let mut graph = Graph::default();

    for record in &merged.records {
        let source = record.edge.source_label.as_str();
        let target = record.edge.target_label.as_str();
        let source_photo = photo_or_placeholder(record.source_photo_url.as_deref(), settings);
        let target_photo = photo_or_placeholder(record.target_photo_url.as_deref(), settings);
        let relationship = match record.edge.relationship.as_deref() {
            Some(r) if !r.is_empty() => r,
            _ => DEFAULT_RELATIONSHIP,
        };

        if !source.is_empty() {
            graph.add_node(source, source_photo, settings);
        }
        if !target.is_empty() {
            graph.add_node(target, target_photo, settings);
        }

        if !source.is_empty() && !target.is_empty() {
            graph.edges.push(GraphEdge {
                from: source.to_string(),
                to: target.to_string(),
                label: relationship.to_string(),
                title: relationship.to_string(),
                font: FontSpec {
                    size: settings.edge_font_size,
                },
            });
        }
    }

    debug!(nodes = graph.nodes.len(), edges = graph.edges.len(), "graph built");
    graph
}

fn photo_or_placeholder<'a>(photo: Option<&'a str>, settings: &'a GraphSettings) -> &'a str {
    match photo {
        Some(p) if !p.is_empty() => p,
        _ => &settings.placeholder_image,
    }
}
