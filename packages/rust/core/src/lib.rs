//! Pipeline stages and orchestration for castgraph.
//!
//! Ties the URL corrector, portrait enrichment, relationship merge and graph
//! rendering together into the `run`, `fetch` and `render` workflows.

pub mod corrector;
pub mod enrichment;
pub mod merge;
pub mod pipeline;

pub use corrector::{KNOWN_URL_CORRECTIONS, UrlCorrection, correct, correct_file};
pub use enrichment::{EnrichmentReport, enrich};
pub use merge::{merge, merge_files};
pub use pipeline::{
    PipelineConfig, PipelineReport, ProgressReporter, RenderSummary, SilentProgress, Stage,
    StageOutcome, StageStatus, run_all, run_fetch, run_render, visualize,
};
