//! vis-network document rendering.
//!
//! Produces a self-contained HTML page: the vis-network script and stylesheet
//! from a CDN, the node/edge data and options inlined as JSON.

use serde_json::{Value, json};

use castgraph_shared::{CastGraphError, GraphSettings, LayoutPolicy, Result};

use crate::builder::Graph;

const VIS_NETWORK_JS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/vis-network/9.1.2/dist/vis-network.min.js";
const VIS_NETWORK_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/vis-network/9.1.2/dist/dist/vis-network.min.css";

/// Network options for `graph` under the configured layout policy.
pub fn network_options(settings: &GraphSettings, positioned: bool) -> Value {
    let physics = if positioned {
        json!({ "enabled": false })
    } else {
        let p = &settings.physics;
        json!({
            "barnesHut": {
                "gravitationalConstant": p.gravitational_constant,
                "centralGravity": p.central_gravity,
                "springLength": p.spring_length,
                "springConstant": p.spring_constant,
                "damping": p.damping,
                "avoidOverlap": p.avoid_overlap,
            },
            "minVelocity": p.min_velocity,
            "solver": "barnesHut",
        })
    };

    json!({
        "nodes": {
            "font": { "size": settings.options_node_font_size, "color": settings.font_color },
        },
        "edges": {
            "font": { "size": settings.options_edge_font_size, "align": "top" },
            "arrows": { "to": { "enabled": false } },
        },
        "physics": physics,
        "interaction": {
            "hover": true,
            "tooltipDelay": settings.tooltip_delay_ms,
        },
    })
}

/// Render `graph` into an HTML document.
///
/// With [`LayoutPolicy::Stress`] the graph must already be positioned.
pub fn render_document(graph: &Graph, settings: &GraphSettings) -> Result<String> {
    let positioned = graph.is_positioned();
    if settings.layout == LayoutPolicy::Stress && !positioned && !graph.nodes.is_empty() {
        return Err(CastGraphError::Render(
            "stress layout requested but graph has no coordinates".into(),
        ));
    }

    let nodes = script_json(&graph.nodes)?;
    let edges = script_json(&graph.edges)?;
    let options = script_json(&network_options(settings, positioned))?;

    Ok(format!(
        r#"<html>
<head>
<meta charset="utf-8">
<script src="{js}" crossorigin="anonymous" referrerpolicy="no-referrer"></script>
<link rel="stylesheet" href="{css}" crossorigin="anonymous" referrerpolicy="no-referrer">
<center>
<h1>{heading}</h1>
</center>
<style type="text/css">
#mynetwork {{
    width: {width};
    height: {height};
    background-color: {background};
    border: 1px solid lightgray;
    position: relative;
    float: left;
}}
</style>
</head>
<body>
<div class="card" style="width: 100%">
<div id="mynetwork" class="card-body"></div>
</div>
<script type="text/javascript">
var nodes = new vis.DataSet({nodes});
var edges = new vis.DataSet({edges});
var container = document.getElementById("mynetwork");
var data = {{ nodes: nodes, edges: edges }};
var options = {options};
var network = new vis.Network(container, data, options);
</script>
</body>
</html>
"#,
        js = VIS_NETWORK_JS,
        css = VIS_NETWORK_CSS,
        heading = escape_html(&settings.heading),
        width = escape_html(&settings.width),
        height = escape_html(&settings.height),
        background = escape_html(&settings.background),
    ))
}

/// Serialize to JSON safe to inline in a `<script>` block.
fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)
        .map_err(|e| CastGraphError::Render(format!("failed to serialize graph data: {e}")))?;
    Ok(json.replace("</", "<\\/"))
}

/// Escape text for an HTML text or attribute position.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
