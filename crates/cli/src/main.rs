use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use reviewlens_core::{
    BatchRunner, BrowserFetcher, DEFAULT_MODEL, FetchConfig, FilterConfig, GeminiClient, HttpFetcher, ModelConfig,
    PageFetcher, Pipeline, PipelineConfig, RetryPolicy,
};
use tracing_subscriber::EnvFilter;

mod echo;

use echo::{print_banner, print_batch_summary, print_error, print_info, print_step, print_success, print_warning};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Secondary variable checked when neither `--api-key` nor `GOOGLE_API_KEY` is set.
const FALLBACK_KEY_ENV: &str = "GEMINI_API_KEY";

/// Extract ratings, price and review summaries from product pages with Gemini
#[derive(Parser, Debug)]
#[command(name = "reviewlens")]
#[command(version)]
#[command(about = "Extract ratings, price and review summaries from product pages", long_about = None)]
struct Args {
    /// CSV file with a `url` column (batch mode)
    #[arg(long, value_name = "PATH", conflicts_with = "url")]
    csv: Option<PathBuf>,

    /// Single product page URL; the report is printed to stdout
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, value_name = "KEY")]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, default_value = DEFAULT_MODEL, value_name = "NAME")]
    model: String,

    /// Directory for result_<n>.json and combined_results.json
    #[arg(long, default_value = "results", value_name = "DIR")]
    results_dir: PathBuf,

    /// Block relevance threshold for content pruning
    #[arg(long, default_value = "0.48", value_name = "SCORE")]
    threshold: f64,

    /// Maximum JSON reformat attempts per URL
    #[arg(long, default_value = "8", value_name = "NUM")]
    max_attempts: u32,

    /// Seconds to wait between reformat attempts
    #[arg(long, default_value = "1", value_name = "SECS")]
    retry_delay: u64,

    /// Page load timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Fetch pages with a plain HTTP GET instead of a headless browser
    #[arg(long)]
    http: bool,

    /// Chromium executable (auto-detected by default)
    #[arg(long, value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// Launch Chromium without its sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn print_usage_hint() {
    println!("Nothing to do: pass --csv <PATH> for a batch or --url <URL> for a single page.");
    println!();
    println!("  reviewlens --csv products.csv");
    println!("  reviewlens --url https://shop.example.com/product/123");
    println!();
    println!("Run `reviewlens --help` for all options.");
}

fn resolve_api_key(flag_or_env: Option<String>) -> anyhow::Result<String> {
    flag_or_env
        .or_else(|| std::env::var(FALLBACK_KEY_ENV).ok())
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .context("No API key: pass --api-key or set GOOGLE_API_KEY (or GEMINI_API_KEY)")
}

fn build_fetcher(args: &Args) -> anyhow::Result<Arc<dyn PageFetcher>> {
    let config = FetchConfig {
        timeout: args.timeout,
        chrome_executable: args.chrome.clone(),
        no_sandbox: args.no_sandbox,
        ..Default::default()
    };

    if args.http {
        Ok(Arc::new(HttpFetcher::new(config).context("Failed to build HTTP client")?))
    } else {
        Ok(Arc::new(BrowserFetcher::new(config)))
    }
}

fn build_pipeline(args: &Args, api_key: String) -> anyhow::Result<Pipeline> {
    if !(0.0..=1.0).contains(&args.threshold) {
        bail!("--threshold must be between 0 and 1, got {}", args.threshold);
    }

    let fetcher = build_fetcher(args)?;
    let model = GeminiClient::new(ModelConfig::new(api_key).model(&args.model)).context("Failed to build model client")?;
    let config = PipelineConfig {
        filter: FilterConfig::builder().threshold(args.threshold).build(),
        retry: RetryPolicy::new(args.max_attempts, Duration::from_secs(args.retry_delay)),
    };

    Ok(Pipeline::new(fetcher, Arc::new(model), config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    if args.csv.is_none() && args.url.is_none() {
        print_usage_hint();
        return Ok(());
    }

    let api_key = resolve_api_key(args.api_key.clone())?;
    let pipeline = build_pipeline(&args, api_key)?;

    if let Some(url) = &args.url {
        if args.verbose {
            print_step(1, 1, &format!("Extracting {}", url.bright_white().underline()));
        }

        let report = pipeline.run(url).await.with_context(|| format!("Failed to extract {}", url))?;
        println!("{}", report.to_pretty_json()?);
        return Ok(());
    }

    if let Some(csv) = &args.csv {
        let started = Instant::now();
        let runner = BatchRunner::new(pipeline, &args.results_dir);

        if args.verbose {
            print_step(1, 1, &format!("Processing {}", csv.display().bright_white()));
        }

        let summary = runner.run_csv(csv).await.with_context(|| format!("Batch run failed for {}", csv.display()))?;

        print_batch_summary(&summary, runner.results_dir(), started.elapsed());
        if summary.reports.is_empty() {
            print_error("No URL produced a report");
        } else if summary.all_succeeded() {
            print_success(&format!("All {} URLs extracted", summary.total));
        } else {
            print_warning(&format!("{} of {} URLs failed", summary.failed.len(), summary.total));
        }
    }

    Ok(())
}
