//! Stage orchestration: correct → enrich → merge → render.
//!
//! Each stage yields a [`StageOutcome`]. A failing stage is logged and
//! recorded; it never aborts the run. Later stages run only when their
//! inputs are available.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

use castgraph_crawler::PortraitResolver;
use castgraph_graph::{Visualization, render_visualization};
use castgraph_shared::{
    AppConfig, CastGraphError, CharacterTable, GraphConfig, Result, ScrapeConfig,
};
use castgraph_storage::{read_characters, read_merged};

use crate::corrector::{KNOWN_URL_CORRECTIONS, correct_file};
use crate::enrichment::{EnrichmentReport, enrich};
use crate::merge::merge_files;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything a pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Character table, corrected in place.
    pub characters_path: PathBuf,
    pub relationships_path: PathBuf,
    pub merged_path: PathBuf,
    pub document_path: PathBuf,
    pub scrape: ScrapeConfig,
    pub graph: GraphConfig,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            characters_path: PathBuf::from(&config.files.characters),
            relationships_path: PathBuf::from(&config.files.relationships),
            merged_path: PathBuf::from(&config.files.merged),
            document_path: PathBuf::from(&config.files.document),
            scrape: ScrapeConfig::from(config),
            graph: GraphConfig::from(config),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Pipeline stages, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Correct,
    Enrich,
    Merge,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Correct => "correct",
            Self::Enrich => "enrich",
            Self::Merge => "merge",
            Self::Render => "render",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Succeeded,
    Failed(String),
    /// Not run because an input was unavailable.
    Skipped(String),
}

#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
    pub elapsed: Duration,
}

/// Summary of a written document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub path: PathBuf,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub stages: Vec<StageOutcome>,
    pub enrichment: Option<EnrichmentReport>,
    pub render: Option<RenderSummary>,
    pub elapsed: Duration,
}

impl PipelineReport {
    /// `true` when no stage that ran failed.
    pub fn succeeded(&self) -> bool {
        self.stages
            .iter()
            .all(|s| !matches!(s.status, StageStatus::Failed(_)))
    }

    /// Stages that failed, in run order.
    pub fn failed_stages(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .filter(|s| matches!(s.status, StageStatus::Failed(_)))
            .map(|s| s.stage)
            .collect()
    }

    pub fn status(&self, stage: Stage) -> Option<&StageStatus> {
        self.stages.iter().find(|s| s.stage == stage).map(|s| &s.status)
    }

    fn record<T>(&mut self, stage: Stage, start: Instant, result: Result<T>) -> Option<T> {
        let elapsed = start.elapsed();
        match result {
            Ok(value) => {
                info!(%stage, elapsed_ms = elapsed.as_millis() as u64, "stage succeeded");
                self.stages.push(StageOutcome {
                    stage,
                    status: StageStatus::Succeeded,
                    elapsed,
                });
                Some(value)
            }
            Err(e) => {
                error!(%stage, error = %e, "stage failed");
                self.stages.push(StageOutcome {
                    stage,
                    status: StageStatus::Failed(e.to_string()),
                    elapsed,
                });
                None
            }
        }
    }

    fn skip(&mut self, stage: Stage, reason: &str) {
        warn!(%stage, reason, "stage skipped");
        self.stages.push(StageOutcome {
            stage,
            status: StageStatus::Skipped(reason.to_string()),
            elapsed: Duration::ZERO,
        });
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, name: &str);
    /// Called after each character row is enriched.
    fn row_enriched(&self, name: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &PipelineReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn row_enriched(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &PipelineReport) {}
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run every stage.
#[instrument(skip_all)]
pub async fn run_all(config: &PipelineConfig, progress: &dyn ProgressReporter) -> PipelineReport {
    let start = Instant::now();
    let mut report = PipelineReport::default();

    fetch_stages(config, progress, &mut report, correct_known_urls).await;

    if report.status(Stage::Merge) == Some(&StageStatus::Succeeded) {
        render_stage(config, progress, &mut report);
    } else {
        report.skip(Stage::Render, "merged table was not produced");
    }

    finish(report, start, progress)
}

/// Correct, enrich and merge.
#[instrument(skip_all)]
pub async fn run_fetch(config: &PipelineConfig, progress: &dyn ProgressReporter) -> PipelineReport {
    let start = Instant::now();
    let mut report = PipelineReport::default();
    fetch_stages(config, progress, &mut report, correct_known_urls).await;
    finish(report, start, progress)
}

/// Render the document from an existing merged table.
#[instrument(skip_all)]
pub fn run_render(config: &PipelineConfig, progress: &dyn ProgressReporter) -> PipelineReport {
    let start = Instant::now();
    let mut report = PipelineReport::default();
    render_stage(config, progress, &mut report);
    finish(report, start, progress)
}

/// Read the merged table at `merged_path`, render it and write the document to `out_path`.
#[instrument(skip(config), fields(merged = %merged_path.display(), out = %out_path.display()))]
pub fn visualize(merged_path: &Path, out_path: &Path, config: &GraphConfig) -> Result<Visualization> {
    if !merged_path.exists() {
        return Err(CastGraphError::validation(format!(
            "merged table {} not found; run the fetch stage first",
            merged_path.display()
        )));
    }

    let merged = read_merged(merged_path)?;
    let visualization = render_visualization(&merged, config)?;

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| CastGraphError::io(parent, e))?;
        }
    }
    std::fs::write(out_path, &visualization.html).map_err(|e| CastGraphError::io(out_path, e))?;

    info!(
        nodes = visualization.node_count,
        edges = visualization.edge_count,
        "document written"
    );
    Ok(visualization)
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Corrects the character table at a path in place.
type Corrector = fn(&Path) -> Result<CharacterTable>;

fn correct_known_urls(path: &Path) -> Result<CharacterTable> {
    correct_file(path, KNOWN_URL_CORRECTIONS)
}

async fn fetch_stages(
    config: &PipelineConfig,
    progress: &dyn ProgressReporter,
    report: &mut PipelineReport,
    corrector: Corrector,
) {
    // The corrector failing is not fatal: enrichment then reads the uncorrected table.
    progress.phase("Correcting profile URLs");
    let start = Instant::now();
    let corrected = corrector(&config.characters_path);
    report.record(Stage::Correct, start, corrected);

    progress.phase("Fetching portraits");
    let start = Instant::now();
    let enriched = enrich_stage(config, progress).await;
    let Some((characters, counts)) = report.record(Stage::Enrich, start, enriched) else {
        report.skip(Stage::Merge, "no enriched character table");
        return;
    };
    report.enrichment = Some(counts);

    progress.phase("Merging relationships");
    let start = Instant::now();
    let merged = merge_files(&config.relationships_path, &characters, &config.merged_path);
    report.record(Stage::Merge, start, merged);
}

async fn enrich_stage(
    config: &PipelineConfig,
    progress: &dyn ProgressReporter,
) -> Result<(CharacterTable, EnrichmentReport)> {
    let characters = read_characters(&config.characters_path)?;
    let resolver = PortraitResolver::new(&config.scrape)?;
    enrich(&characters, &resolver, &config.scrape, progress).await
}

fn render_stage(config: &PipelineConfig, progress: &dyn ProgressReporter, report: &mut PipelineReport) {
    progress.phase("Rendering graph");
    let start = Instant::now();
    let rendered = visualize(&config.merged_path, &config.document_path, &config.graph);

    if let Some(viz) = report.record(Stage::Render, start, rendered) {
        report.render = Some(RenderSummary {
            path: config.document_path.clone(),
            node_count: viz.node_count,
            edge_count: viz.edge_count,
        });
    }
}

fn finish(mut report: PipelineReport, start: Instant, progress: &dyn ProgressReporter) -> PipelineReport {
    report.elapsed = start.elapsed();
    info!(
        stages = report.stages.len(),
        failed = report.failed_stages().len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "pipeline finished"
    );
    progress.done(&report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PORTRAIT_PAGE: &str = r#"<html><body>
        <figure class="pi-item pi-image"><a class="image image-thumbnail">
        <img src="https://static.example/images/Harper.jpg/revision/latest"></a></figure>
        </body></html>"#;

    fn config_in(dir: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::from(&AppConfig::default());
        config.characters_path = dir.join("characters.csv");
        config.relationships_path = dir.join("relationships.csv");
        config.merged_path = dir.join("out").join("merged.csv");
        config.document_path = dir.join("out").join("index.html");
        config.scrape.delay = Duration::ZERO;
        config.scrape.timeout = Duration::from_secs(5);
        config
    }

    #[tokio::test]
    async fn full_run_writes_merged_table_and_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Harper"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PORTRAIT_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(
            &config.characters_path,
            format!("name,wiki_page_url\nHarper,{}/wiki/Harper\nEthan,\n", server.uri()),
        )
        .unwrap();
        std::fs::write(
            &config.relationships_path,
            "source_label,target_label,relationship\nHarper,Ethan,married\nEthan,Cameron,\n",
        )
        .unwrap();

        let report = run_all(&config, &SilentProgress).await;

        assert!(report.succeeded(), "{report:?}");
        assert_eq!(report.stages.len(), 4);
        assert_eq!(
            report.enrichment,
            Some(EnrichmentReport {
                resolved: 1,
                skipped: 1,
                ..Default::default()
            })
        );

        let merged = std::fs::read_to_string(&config.merged_path).unwrap();
        assert!(merged.contains("Harper,Ethan,married,"));
        assert!(merged.contains("https://static.example/images/Harper.jpg"));

        let render = report.render.unwrap();
        assert_eq!(render.node_count, 3);
        assert_eq!(render.edge_count, 2);
        let html = std::fs::read_to_string(&config.document_path).unwrap();
        assert!(html.contains("The White Lotus Graph"));
        assert!(html.contains(r#""label":"related""#));
    }

    #[tokio::test]
    async fn missing_inputs_fail_stages_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let report = run_all(&config, &SilentProgress).await;

        assert!(!report.succeeded());
        assert_eq!(report.failed_stages(), vec![Stage::Correct, Stage::Enrich]);
        assert!(matches!(report.status(Stage::Merge), Some(StageStatus::Skipped(_))));
        assert!(matches!(report.status(Stage::Render), Some(StageStatus::Skipped(_))));
        assert!(!config.document_path.exists());
    }

    #[tokio::test]
    async fn corrector_failure_does_not_stop_enrichment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Harper"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PORTRAIT_PAGE))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let uncorrected = format!("{}/wiki/Harper", server.uri());
        std::fs::write(
            &config.characters_path,
            format!("name,wiki_page_url\nHarper,{uncorrected}\n"),
        )
        .unwrap();
        std::fs::write(
            &config.relationships_path,
            "source_label,target_label,relationship\nHarper,Ethan,married\n",
        )
        .unwrap();

        fn failing_corrector(path: &Path) -> Result<CharacterTable> {
            Err(CastGraphError::table(path, "no space left on device"))
        }

        let mut report = PipelineReport::default();
        fetch_stages(&config, &SilentProgress, &mut report, failing_corrector).await;

        assert_eq!(report.failed_stages(), vec![Stage::Correct]);
        assert_eq!(report.status(Stage::Enrich), Some(&StageStatus::Succeeded));
        assert_eq!(report.status(Stage::Merge), Some(&StageStatus::Succeeded));
        assert_eq!(report.enrichment.map(|e| e.resolved), Some(1));

        let merged = read_merged(&config.merged_path).unwrap();
        let record = &merged.records[0];
        assert_eq!(record.source_wiki_page_url.as_deref(), Some(uncorrected.as_str()));
        assert_eq!(
            record.source_photo_url.as_deref(),
            Some("https://static.example/images/Harper.jpg")
        );
    }

    #[tokio::test]
    async fn unreadable_characters_fail_correct_and_enrich() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        // no wiki_page_url column: the corrector and the enricher both reject it
        std::fs::write(&config.characters_path, "name\nArmond\n").unwrap();
        std::fs::write(
            &config.relationships_path,
            "source_label,target_label,relationship\nArmond,Shane,rivals\n",
        )
        .unwrap();

        let report = run_fetch(&config, &SilentProgress).await;
        assert_eq!(report.failed_stages(), vec![Stage::Correct, Stage::Enrich]);
        assert!(matches!(report.status(Stage::Merge), Some(StageStatus::Skipped(_))));
        assert!(report.status(Stage::Render).is_none());
    }

    #[test]
    fn render_requires_merged_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let err = visualize(&config.merged_path, &config.document_path, &config.graph).unwrap_err();
        assert!(err.to_string().contains("not found"));

        let report = run_render(&config, &SilentProgress);
        assert_eq!(report.failed_stages(), vec![Stage::Render]);
    }

    #[test]
    fn render_from_existing_merged_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(config.merged_path.parent().unwrap()).unwrap();
        std::fs::write(
            &config.merged_path,
            "source_label,target_label,relationship,source_photo_url\nRachel,Shane,married,\n",
        )
        .unwrap();

        let report = run_render(&config, &SilentProgress);
        assert!(report.succeeded());
        let html = std::fs::read_to_string(&config.document_path).unwrap();
        assert!(html.contains("via.placeholder.com"));
    }
}
