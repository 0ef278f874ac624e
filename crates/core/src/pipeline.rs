//! Per-URL driver: fetch, filter, prompt, complete, validate.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::filter::{ContentFilter, FilterConfig};
use crate::llm::LanguageModel;
use crate::prompt::build_extraction_prompt;
use crate::report::ExtractionReport;
use crate::validate::{Delay, JsonValidator, RetryPolicy};

/// A fetched page reduced to what the prompt needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub url: String,
    pub title: String,
    pub filtered_markdown: String,
}

/// Knobs for the non-network stages.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub filter: FilterConfig,
    pub retry: RetryPolicy,
}

/// Runs one URL end to end.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use reviewlens_core::{GeminiClient, HttpFetcher, FetchConfig, ModelConfig, Pipeline, PipelineConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = Arc::new(HttpFetcher::new(FetchConfig::default())?);
/// let model = Arc::new(GeminiClient::new(ModelConfig::new("api-key"))?);
/// let pipeline = Pipeline::new(fetcher, model, PipelineConfig::default());
///
/// let report = pipeline.run("https://shop.example.com/kettle").await?;
/// println!("{}", report.to_pretty_json()?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    filter: ContentFilter,
    model: Arc<dyn LanguageModel>,
    validator: JsonValidator,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn PageFetcher>, model: Arc<dyn LanguageModel>, config: PipelineConfig) -> Self {
        let validator = JsonValidator::new(model.clone()).with_policy(config.retry);
        Self { fetcher, filter: ContentFilter::new(config.filter), model, validator }
    }

    /// Replaces the delay used between reformat attempts.
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.validator = self.validator.with_delay(delay);
        self
    }

    /// Fetches `url` and filters it to markdown.
    ///
    /// # Errors
    ///
    /// Propagates the fetcher's error unchanged.
    pub async fn fetch(&self, url: &str) -> Result<FetchResult> {
        let page = self.fetcher.fetch(url).await?;
        let outcome = self.filter.filter_with_stats(&page.html);
        debug!(
            url,
            title = %page.title,
            kept = outcome.kept_blocks,
            pruned = outcome.pruned_blocks,
            markdown_chars = outcome.markdown.len(),
            "filtered page"
        );

        Ok(FetchResult { url: page.url, title: page.title, filtered_markdown: outcome.markdown })
    }

    /// Produces the typed report for `url`.
    ///
    /// The initial model call is not retried; only the JSON repair loop is.
    ///
    /// # Errors
    ///
    /// Fetch, model, validation and schema failures, all scoped to this URL.
    pub async fn run(&self, url: &str) -> Result<ExtractionReport> {
        let page = self.fetch(url).await?;
        let prompt = build_extraction_prompt(&page.url, &page.title, &page.filtered_markdown);

        debug!(url, prompt_chars = prompt.len(), "requesting extraction");
        let reply = self.model.complete(&prompt).await?;

        let value = self.validator.validate(&reply).await?;
        let report = ExtractionReport::from_value(value)?;
        info!(url, records = report.report.extraction.len(), "extraction complete");

        Ok(report)
    }
}
