pub mod batch;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod llm;
pub mod markdown;
pub mod parse;
pub mod pipeline;
pub mod preprocess;
pub mod prompt;
pub mod report;
pub mod scoring;
pub mod validate;

pub use batch::{BatchRunner, BatchSummary, COMBINED_FILE, read_url_list};
pub use error::{FetchError, ModelError, Result, ReviewLensError};
#[cfg(feature = "browser")]
pub use fetch::BrowserFetcher;
pub use fetch::{FetchConfig, HttpFetcher, PageFetcher, PageSnapshot, validate_url};
pub use filter::{ContentFilter, FilterConfig, FilterConfigBuilder, FilterOutcome};
pub use llm::{DEFAULT_MODEL, GeminiClient, LanguageModel, ModelConfig};
pub use markdown::html_to_markdown;
pub use parse::Document;
pub use pipeline::{FetchResult, Pipeline, PipelineConfig};
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use prompt::{REFORMAT_PROMPT, build_extraction_prompt};
pub use report::{ExtractionEntry, ExtractionRecord, ExtractionReport, ReportBody, read_report, write_json};
#[doc(hidden)]
pub use scoring::{BlockScore, DEFAULT_THRESHOLD, ScoreConfig, score_block};
pub use validate::{Delay, JsonValidator, RetryPolicy, TokioDelay, strip_fences};
