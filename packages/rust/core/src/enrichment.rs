//! Portrait enrichment of the character table.
//!
//! Rows are resolved one at a time, in table order, with a fixed pause after
//! every request.

use tracing::{debug, info, instrument, warn};

use castgraph_crawler::PortraitResolver;
use castgraph_shared::{CharacterTable, FailurePolicy, Result, ScrapeConfig, columns};

use crate::pipeline::ProgressReporter;

/// Per-row outcome counts of an enrichment run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// Portrait found.
    pub resolved: usize,
    /// Page fetched but no portrait on it (or non-success status).
    pub missing: usize,
    /// Resolver error, stored as empty.
    pub failed: usize,
    /// No profile URL.
    pub skipped: usize,
}

impl EnrichmentReport {
    pub fn total(&self) -> usize {
        self.resolved + self.missing + self.failed + self.skipped
    }
}

/// Resolve a portrait for every character.
///
/// Returns a new table with a `photo_url` column (appended if absent) that is
/// `Some` on every row: the portrait URL, or `""` when none was found.
#[instrument(skip_all, fields(rows = characters.len(), policy = ?config.failure_policy))]
pub async fn enrich(
    characters: &CharacterTable,
    resolver: &PortraitResolver,
    config: &ScrapeConfig,
    progress: &dyn ProgressReporter,
) -> Result<(CharacterTable, EnrichmentReport)> {
    let mut table = characters.clone();
    if !table.has_column(columns::PHOTO_URL) {
        table.columns.push(columns::PHOTO_URL.to_string());
    }

    let mut report = EnrichmentReport::default();
    let total = table.len();

    for (i, record) in table.records.iter_mut().enumerate() {
        let page_url = record.wiki_page_url.as_deref().filter(|u| !u.is_empty());

        let photo = match page_url {
            None => {
                debug!(name = %record.name, "no profile url, skipping");
                report.skipped += 1;
                String::new()
            }
            Some(url) => {
                let outcome = resolver.resolve(url).await;
                tokio::time::sleep(config.delay).await;

                match outcome {
                    Ok(Some(photo)) => {
                        report.resolved += 1;
                        photo
                    }
                    Ok(None) => {
                        debug!(name = %record.name, %url, "no portrait found");
                        report.missing += 1;
                        String::new()
                    }
                    Err(e) => match config.failure_policy {
                        FailurePolicy::Isolate => {
                            warn!(name = %record.name, %url, error = %e, "portrait lookup failed");
                            report.failed += 1;
                            String::new()
                        }
                        FailurePolicy::Abort => return Err(e),
                    },
                }
            }
        };

        record.photo_url = Some(photo);
        progress.row_enriched(&record.name, i + 1, total);
    }

    info!(
        resolved = report.resolved,
        missing = report.missing,
        failed = report.failed,
        skipped = report.skipped,
        "enrichment complete"
    );
    Ok((table, report))
}
