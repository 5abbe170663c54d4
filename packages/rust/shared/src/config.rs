//! Application configuration for castgraph.
//!
//! Every knob has a compiled-in default. An optional `castgraph.toml` in the
//! working directory overrides file names, scrape timing and graph styling.
//! The URL corrections list is deliberately not part of the config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CastGraphError, Result};

/// Default configuration file name, resolved against the working directory.
const CONFIG_FILE_NAME: &str = "castgraph.toml";

// ---------------------------------------------------------------------------
// Config structs (matching castgraph.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output file names.
    #[serde(default)]
    pub files: FilesConfig,

    /// Portrait scraping settings.
    #[serde(default)]
    pub scrape: ScrapeSettings,

    /// Graph construction, layout and styling.
    #[serde(default)]
    pub graph: GraphSettings,

    /// Title and attribution injected into the emitted document.
    #[serde(default)]
    pub document: DocumentConfig,
}

/// `[files]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Character table (input A). Rewritten in place by the URL corrector.
    #[serde(default = "default_characters_file")]
    pub characters: String,

    /// Relationship table (input B).
    #[serde(default = "default_relationships_file")]
    pub relationships: String,

    /// Merged edge table written by the merger and read by the graph builder.
    #[serde(default = "default_merged_file")]
    pub merged: String,

    /// Interactive HTML document.
    #[serde(default = "default_document_file")]
    pub document: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            characters: default_characters_file(),
            relationships: default_relationships_file(),
            merged: default_merged_file(),
            document: default_document_file(),
        }
    }
}

fn default_characters_file() -> String {
    "characters_input_skeleton.csv".into()
}
fn default_relationships_file() -> String {
    "relationships_input.csv".into()
}
fn default_merged_file() -> String {
    "output_character_relationships_with_details.csv".into()
}
fn default_document_file() -> String {
    "index.html".into()
}

/// What the enricher does when resolving a single portrait fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failed row, store an empty portrait and keep going.
    #[default]
    Isolate,
    /// Fail the whole enrichment stage on the first error.
    Abort,
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeSettings {
    /// User-Agent header sent with every page request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause after each portrait resolution, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Per-row failure handling.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            delay_ms: default_delay_ms(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; WhiteLotusScraper/1.0)".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_delay_ms() -> u64 {
    100
}

/// How node positions are decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutPolicy {
    /// Leave positioning to the client's Barnes–Hut simulation.
    #[default]
    Physics,
    /// Compute a deterministic stress-majorization layout and disable client physics.
    Stress,
}

/// `[graph]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSettings {
    /// Layout policy for the whole document.
    #[serde(default)]
    pub layout: LayoutPolicy,

    /// Image used for characters without a resolved portrait.
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,

    /// Node (portrait) size in pixels.
    #[serde(default = "default_node_size")]
    pub node_size: u32,

    /// Per-node label font size.
    #[serde(default = "default_label_font_size")]
    pub label_font_size: u32,

    /// Per-edge label font size.
    #[serde(default = "default_edge_font_size")]
    pub edge_font_size: u32,

    /// Global node font size from the network options.
    #[serde(default = "default_options_node_font_size")]
    pub options_node_font_size: u32,

    /// Global edge font size from the network options.
    #[serde(default = "default_options_edge_font_size")]
    pub options_edge_font_size: u32,

    /// Canvas height (CSS length).
    #[serde(default = "default_height")]
    pub height: String,

    /// Canvas width (CSS length).
    #[serde(default = "default_width")]
    pub width: String,

    /// Canvas background colour.
    #[serde(default = "default_background")]
    pub background: String,

    /// Label colour.
    #[serde(default = "default_font_color")]
    pub font_color: String,

    /// Heading rendered above the canvas by the template. Empty by default.
    #[serde(default)]
    pub heading: String,

    /// Hover tooltip delay in milliseconds.
    #[serde(default = "default_tooltip_delay")]
    pub tooltip_delay_ms: u32,

    /// Client-side Barnes–Hut parameters (physics policy).
    #[serde(default)]
    pub physics: PhysicsConfig,

    /// Stress-majorization parameters (stress policy).
    #[serde(default)]
    pub stress: StressSettings,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            layout: LayoutPolicy::default(),
            placeholder_image: default_placeholder_image(),
            node_size: default_node_size(),
            label_font_size: default_label_font_size(),
            edge_font_size: default_edge_font_size(),
            options_node_font_size: default_options_node_font_size(),
            options_edge_font_size: default_options_edge_font_size(),
            height: default_height(),
            width: default_width(),
            background: default_background(),
            font_color: default_font_color(),
            heading: String::new(),
            tooltip_delay_ms: default_tooltip_delay(),
            physics: PhysicsConfig::default(),
            stress: StressSettings::default(),
        }
    }
}

fn default_placeholder_image() -> String {
    "https://via.placeholder.com/150/CCCCCC/000000?Text=No+Image".into()
}
fn default_node_size() -> u32 {
    60
}
fn default_label_font_size() -> u32 {
    20
}
fn default_edge_font_size() -> u32 {
    14
}
fn default_options_node_font_size() -> u32 {
    18
}
fn default_options_edge_font_size() -> u32 {
    12
}
fn default_height() -> String {
    "900px".into()
}
fn default_width() -> String {
    "100%".into()
}
fn default_background() -> String {
    "#F7F6F1".into()
}
fn default_font_color() -> String {
    "black".into()
}
fn default_tooltip_delay() -> u32 {
    200
}

/// `[graph.physics]` section, serialized verbatim into the Barnes–Hut solver options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsConfig {
    #[serde(default = "default_gravitational_constant")]
    pub gravitational_constant: f64,
    #[serde(default = "default_central_gravity")]
    pub central_gravity: f64,
    #[serde(default = "default_spring_length")]
    pub spring_length: f64,
    #[serde(default = "default_spring_constant")]
    pub spring_constant: f64,
    #[serde(default = "default_damping")]
    pub damping: f64,
    #[serde(default = "default_avoid_overlap")]
    pub avoid_overlap: f64,
    #[serde(default = "default_min_velocity")]
    pub min_velocity: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: default_gravitational_constant(),
            central_gravity: default_central_gravity(),
            spring_length: default_spring_length(),
            spring_constant: default_spring_constant(),
            damping: default_damping(),
            avoid_overlap: default_avoid_overlap(),
            min_velocity: default_min_velocity(),
        }
    }
}

fn default_gravitational_constant() -> f64 {
    -6000.0
}
fn default_central_gravity() -> f64 {
    0.25
}
fn default_spring_length() -> f64 {
    180.0
}
fn default_spring_constant() -> f64 {
    0.05
}
fn default_damping() -> f64 {
    0.3
}
fn default_avoid_overlap() -> f64 {
    0.2
}
fn default_min_velocity() -> f64 {
    0.75
}

/// `[graph.stress]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressSettings {
    /// Pixel length of one graph-theoretic hop.
    #[serde(default = "default_edge_length")]
    pub edge_length: f64,

    /// Upper bound on majorization sweeps.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Stop once the relative stress improvement drops below this.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for StressSettings {
    fn default() -> Self {
        Self {
            edge_length: default_edge_length(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}

fn default_edge_length() -> f64 {
    180.0
}
fn default_max_iterations() -> u32 {
    300
}
fn default_tolerance() -> f64 {
    1e-4
}

/// `[document]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Title shown above the graph.
    #[serde(default = "default_title")]
    pub title: String,

    /// Attribution line (inline HTML allowed).
    #[serde(default = "default_attribution")]
    pub attribution_html: String,

    /// Stylesheets linked from `<head>`.
    #[serde(default = "default_stylesheets")]
    pub stylesheets: Vec<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            attribution_html: default_attribution(),
            stylesheets: default_stylesheets(),
        }
    }
}

fn default_title() -> String {
    "The White Lotus Graph".into()
}
fn default_attribution() -> String {
    concat!(
        r#"Vibecoded by <a href="https://linkedin.com/in/victorianoizquierdo" target="_blank" rel="noopener noreferrer" style="color: rgb(7, 81, 207); text-decoration: none;">Victoriano Izquierdo</a>"#,
        r#" from <a href="https://graphext.com" target="_blank" rel="noopener noreferrer" style="color: rgb(7, 81, 207); text-decoration: none;">Graphext</a>"#,
    )
    .into()
}
fn default_stylesheets() -> Vec<String> {
    vec![
        "https://stackpath.bootstrapcdn.com/bootstrap/4.5.2/css/bootstrap.min.css".into(),
        "https://fonts.googleapis.com/css2?family=Cinzel:wght@400..900&display=swap".into(),
    ]
}

// ---------------------------------------------------------------------------
// Runtime configs (derived from AppConfig)
// ---------------------------------------------------------------------------

/// Runtime scrape configuration for the resolver and enricher.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// User-Agent header.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Pause after each resolution.
    pub delay: Duration,
    /// Per-row failure handling.
    pub failure_policy: FailurePolicy,
}

impl From<&AppConfig> for ScrapeConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.scrape.user_agent.clone(),
            timeout: Duration::from_secs(config.scrape.timeout_secs),
            delay: Duration::from_millis(config.scrape.delay_ms),
            failure_policy: config.scrape.failure_policy,
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Runtime configuration for graph building, rendering and decoration.
#[derive(Debug, Clone, Default)]
pub struct GraphConfig {
    /// Styling and layout.
    pub graph: GraphSettings,
    /// Title/attribution/stylesheet injection.
    pub document: DocumentConfig,
}

impl From<&AppConfig> for GraphConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            graph: config.graph.clone(),
            document: config.document.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config file (`./castgraph.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|e| CastGraphError::config(format!("cannot determine working directory: {e}")))?;
    Ok(cwd.join(CONFIG_FILE_NAME))
}

/// Load the application config. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CastGraphError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CastGraphError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file to `./castgraph.toml`.
/// Refuses to overwrite an existing file. Returns the path written.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    if path.exists() {
        return Err(CastGraphError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CastGraphError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CastGraphError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("characters_input_skeleton.csv"));
        assert!(toml_str.contains("WhiteLotusScraper"));
        assert!(toml_str.contains("gravitationalConstant"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.scrape.timeout_secs, 15);
        assert_eq!(parsed.graph.layout, LayoutPolicy::Physics);
        assert_eq!(parsed.files.document, "index.html");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[scrape]
delay_ms = 0
failure_policy = "abort"

[graph]
layout = "stress"

[graph.physics]
springLength = 250.0
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.scrape.delay_ms, 0);
        assert_eq!(config.scrape.timeout_secs, 15);
        assert_eq!(config.scrape.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.graph.layout, LayoutPolicy::Stress);
        assert_eq!(config.graph.physics.spring_length, 250.0);
        assert_eq!(config.graph.physics.damping, 0.3);
        assert_eq!(config.files.relationships, "relationships_input.csv");
    }

    #[test]
    fn scrape_config_from_app_config() {
        let app = AppConfig::default();
        let scrape = ScrapeConfig::from(&app);
        assert_eq!(scrape.timeout, Duration::from_secs(15));
        assert_eq!(scrape.delay, Duration::from_millis(100));
        assert_eq!(scrape.failure_policy, FailurePolicy::Isolate);
    }

    #[test]
    fn load_config_from_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("castgraph.toml");
        std::fs::write(&path, "[graph]\nlayout = \"spiral\"\n").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
