//! Relationship graph construction, layout and HTML rendering.
//!
//! Builds a node-link graph from the merged edge table, optionally fixes node
//! positions with a stress-majorization layout, renders a vis-network page and
//! decorates it with the title, attribution and stylesheets.

pub mod builder;
pub mod decorate;
pub mod layout;
pub mod render;

use tracing::{info, instrument};

use castgraph_shared::{GraphConfig, LayoutPolicy, MergedTable, Result};

pub use builder::{DEFAULT_RELATIONSHIP, FontSpec, Graph, GraphEdge, GraphNode, build_graph};
pub use decorate::{DecorateReport, Decorations, decorate};
pub use layout::{Point, stress_layout};
pub use render::{network_options, render_document};

/// A finished, decorated document.
#[derive(Debug, Clone)]
pub struct Visualization {
    pub html: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub layout: LayoutPolicy,
    pub report: DecorateReport,
}

/// Build, lay out, render and decorate `merged`.
#[instrument(skip_all, fields(rows = merged.len(), layout = ?config.graph.layout))]
pub fn render_visualization(merged: &MergedTable, config: &GraphConfig) -> Result<Visualization> {
    let graph = build_graph(merged, &config.graph);

    let graph = match config.graph.layout {
        LayoutPolicy::Physics => graph,
        LayoutPolicy::Stress => {
            let positions = stress_layout(&graph, &config.graph.stress);
            graph.with_positions(&positions)
        }
    };

    let document = render_document(&graph, &config.graph)?;
    let (html, report) = decorate(&document, &Decorations::from(config));

    info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        placeholders_removed = report.placeholders_removed,
        "visualization rendered"
    );

    Ok(Visualization {
        html,
        node_count: graph.nodes.len(),
        edge_count: graph.edges.len(),
        layout: config.graph.layout,
        report,
    })
}
