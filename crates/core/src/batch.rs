//! Sequential batch processing over a list of URLs.
//!
//! URLs come from a CSV file with a `url` column. Each URL runs through the
//! [`Pipeline`] in input order; successes are written to
//! `result_<n>.json` as soon as they finish, failures are logged and
//! skipped, and `combined_results.json` collects every success at the end.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::{ReviewLensError, Result};
use crate::pipeline::Pipeline;
use crate::report::{ExtractionReport, write_json};

/// Required CSV column.
pub const URL_COLUMN: &str = "url";

/// File holding every successful report of a batch.
pub const COMBINED_FILE: &str = "combined_results.json";

/// Reads the `url` column of a CSV file.
///
/// The header match ignores case and surrounding whitespace. Values are
/// trimmed and empty cells are skipped.
///
/// # Errors
///
/// Returns [`ReviewLensError::Config`] when the file cannot be read or parsed,
/// or has no `url` column.
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ReviewLensError::Config(format!("cannot read {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| ReviewLensError::Config(format!("cannot read CSV headers from {}: {}", path.display(), e)))?
        .clone();

    let url_idx = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(URL_COLUMN))
        .ok_or_else(|| ReviewLensError::Config(format!("CSV must contain a column named '{}'", URL_COLUMN)))?;

    let mut urls = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReviewLensError::Config(format!("invalid CSV record: {}", e)))?;

        match record.get(url_idx).map(str::trim).filter(|s| !s.is_empty()) {
            Some(url) => urls.push(url.to_string()),
            // header is line 1
            None => warn!(line = row + 2, "skipping row with empty url"),
        }
    }

    Ok(urls)
}

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    /// `(1-based index, url)` of each success, in input order.
    pub succeeded: Vec<(usize, String)>,
    /// `(1-based index, url, error)` of each failure, in input order.
    pub failed: Vec<(usize, String, String)>,
    /// Successful reports, in input order.
    pub reports: Vec<ExtractionReport>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the pipeline over many URLs and persists the results.
pub struct BatchRunner {
    pipeline: Pipeline,
    results_dir: PathBuf,
}

impl BatchRunner {
    pub fn new(pipeline: Pipeline, results_dir: impl Into<PathBuf>) -> Self {
        Self { pipeline, results_dir: results_dir.into() }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Path of the individual result for the 1-based `index`.
    pub fn result_path(&self, index: usize) -> PathBuf {
        self.results_dir.join(format!("result_{}.json", index))
    }

    /// Reads `csv_path` and runs every URL in it.
    ///
    /// Nothing is written when the CSV is unusable.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`read_url_list`] and I/O errors on the results directory.
    pub async fn run_csv(&self, csv_path: &Path) -> Result<BatchSummary> {
        let urls = read_url_list(csv_path)?;
        info!(count = urls.len(), path = %csv_path.display(), "loaded URL list");
        self.run(&urls).await
    }

    /// Runs every URL sequentially.
    ///
    /// Per-URL failures are recorded in the summary and never abort the batch.
    ///
    /// # Errors
    ///
    /// Only I/O errors on the results directory or result files.
    pub async fn run(&self, urls: &[String]) -> Result<BatchSummary> {
        tokio::fs::create_dir_all(&self.results_dir).await?;

        let mut summary = BatchSummary { total: urls.len(), ..Default::default() };

        for (offset, url) in urls.iter().enumerate() {
            let index = offset + 1;
            info!(index, total = urls.len(), url = %url, "processing URL");

            match self.pipeline.run(url).await {
                Ok(report) => {
                    let path = self.result_path(index);
                    write_json(&path, &report)?;
                    info!(index, path = %path.display(), "saved result");

                    summary.succeeded.push((index, url.clone()));
                    summary.reports.push(report);
                }
                Err(e) if e.is_per_url() => {
                    error!(index, url = %url, error = %e, "failed to process URL, skipping");
                    summary.failed.push((index, url.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        if summary.reports.is_empty() {
            warn!("no URL succeeded, not writing {}", COMBINED_FILE);
        } else {
            let path = self.results_dir.join(COMBINED_FILE);
            write_json(&path, &summary.reports)?;
            info!(count = summary.reports.len(), path = %path.display(), "saved combined results");
        }

        Ok(summary)
    }
}
