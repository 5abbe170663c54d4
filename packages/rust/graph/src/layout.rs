//! Deterministic stress-majorization layout.
//!
//! Target distances are hop counts scaled by `edge_length`. Each connected
//! component is laid out on its own, then components are placed left to right
//! in order of their first node, separated by one edge length.

use std::collections::VecDeque;
use std::f64::consts::PI;

use tracing::debug;

use castgraph_shared::StressSettings;

use crate::builder::Graph;

/// A 2D position in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Compute one position per node of `graph`, in node order.
pub fn stress_layout(graph: &Graph, settings: &StressSettings) -> Vec<Point> {
    let n = graph.nodes.len();
    let adjacency = adjacency(graph);
    let components = components(&adjacency);

    let mut positions = vec![Point { x: 0.0, y: 0.0 }; n];
    let mut cursor_x = 0.0;

    for members in &components {
        let local = layout_component(members, &adjacency, settings);
        let (min_x, max_x, min_y, max_y) = bounds(&local);

        for (&node, p) in members.iter().zip(&local) {
            positions[node] = Point {
                x: p.x - min_x + cursor_x,
                y: p.y - (min_y + max_y) / 2.0,
            };
        }
        cursor_x += (max_x - min_x) + settings.edge_length;
    }

    // Centre the whole drawing horizontally on the origin.
    if n > 0 {
        let (min_x, max_x, _, _) = bounds(&positions);
        let shift = (min_x + max_x) / 2.0;
        for p in &mut positions {
            p.x -= shift;
        }
    }

    debug!(nodes = n, components = components.len(), "stress layout computed");
    positions
}

/// Undirected, de-duplicated adjacency lists. Self-loops are dropped.
fn adjacency(graph: &Graph) -> Vec<Vec<usize>> {
    let mut adj = vec![Vec::new(); graph.nodes.len()];
    for edge in &graph.edges {
        let (Some(a), Some(b)) = (graph.node_index(&edge.from), graph.node_index(&edge.to)) else {
            continue;
        };
        if a == b {
            continue;
        }
        if !adj[a].contains(&b) {
            adj[a].push(b);
            adj[b].push(a);
        }
    }
    adj
}

/// Connected components, each listed in ascending node order.
fn components(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut seen = vec![false; adjacency.len()];
    let mut out = Vec::new();

    for start in 0..adjacency.len() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut members = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(u) = queue.pop_front() {
            for &v in &adjacency[u] {
                if !seen[v] {
                    seen[v] = true;
                    members.push(v);
                    queue.push_back(v);
                }
            }
        }
        members.sort_unstable();
        out.push(members);
    }
    out
}

/// Hop distances from `start`; `None` for unreachable nodes.
fn bfs(adjacency: &[Vec<usize>], start: usize) -> Vec<Option<u32>> {
    let mut dist = vec![None; adjacency.len()];
    dist[start] = Some(0);
    let mut queue = VecDeque::from([start]);
    while let Some(u) = queue.pop_front() {
        let next = dist[u].map_or(0, |d| d + 1);
        for &v in &adjacency[u] {
            if dist[v].is_none() {
                dist[v] = Some(next);
                queue.push_back(v);
            }
        }
    }
    dist
}

fn layout_component(
    members: &[usize],
    adjacency: &[Vec<usize>],
    settings: &StressSettings,
) -> Vec<Point> {
    let k = members.len();
    if k == 1 {
        return vec![Point { x: 0.0, y: 0.0 }];
    }

    // Target distances between component members (local indices).
    let mut target = vec![vec![0.0; k]; k];
    for (i, &u) in members.iter().enumerate() {
        let dist = bfs(adjacency, u);
        for (j, &v) in members.iter().enumerate() {
            target[i][j] = f64::from(dist[v].unwrap_or(0)) * settings.edge_length;
        }
    }

    let mut pos = initial_positions(k, settings.edge_length);
    let mut stress = total_stress(&pos, &target);

    for iteration in 0..settings.max_iterations {
        for i in 0..k {
            let mut num_x = 0.0;
            let mut num_y = 0.0;
            let mut den = 0.0;

            for j in 0..k {
                if i == j || target[i][j] <= 0.0 {
                    continue;
                }
                let d = target[i][j];
                let w = 1.0 / (d * d);
                let dx = pos[i].x - pos[j].x;
                let dy = pos[i].y - pos[j].y;
                let norm = (dx * dx + dy * dy).sqrt();

                let (ox, oy) = if norm > f64::EPSILON {
                    (d * dx / norm, d * dy / norm)
                } else {
                    (0.0, 0.0)
                };
                num_x += w * (pos[j].x + ox);
                num_y += w * (pos[j].y + oy);
                den += w;
            }

            if den > 0.0 {
                pos[i] = Point {
                    x: num_x / den,
                    y: num_y / den,
                };
            }
        }

        let next = total_stress(&pos, &target);
        let improvement = if stress > 0.0 { (stress - next) / stress } else { 0.0 };
        stress = next;
        if improvement.abs() < settings.tolerance {
            debug!(iteration, stress, "stress layout converged");
            break;
        }
    }

    if pos.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return initial_positions(k, settings.edge_length);
    }
    pos
}

/// Golden-angle spiral: deterministic and free of the symmetric saddle
/// points a plain circle start can get stuck in.
fn initial_positions(k: usize, edge_length: f64) -> Vec<Point> {
    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
    (0..k)
        .map(|i| {
            let r = edge_length * ((i + 1) as f64).sqrt();
            let theta = i as f64 * golden_angle;
            Point {
                x: r * theta.cos(),
                y: r * theta.sin(),
            }
        })
        .collect()
}

fn total_stress(pos: &[Point], target: &[Vec<f64>]) -> f64 {
    let mut stress = 0.0;
    for i in 0..pos.len() {
        for j in (i + 1)..pos.len() {
            let d = target[i][j];
            if d <= 0.0 {
                continue;
            }
            let actual = ((pos[i].x - pos[j].x).powi(2) + (pos[i].y - pos[j].y).powi(2)).sqrt();
            stress += (actual - d).powi(2) / (d * d);
        }
    }
    stress
}

fn bounds(points: &[Point]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(min_x, max_x, min_y, max_y), p| {
            (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
        },
    )
}
