//! Page retrieval.
//!
//! [`PageFetcher`] is the seam between the pipeline and whatever loads a
//! page. [`BrowserFetcher`] renders the page in a throwaway headless Chromium;
//! [`HttpFetcher`] issues a single GET for sites that do not need JavaScript.
//! Neither retries and neither caches.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::parse::Document;

/// Title and rendered markup of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub html: String,
}

/// Capability to load a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Loads `url` and returns its title and HTML.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the URL is invalid or navigation does not complete.
    async fn fetch(&self, url: &str) -> Result<PageSnapshot, FetchError>;
}

/// Settings shared by both fetchers.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Navigation / request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Chromium executable; auto-detected when `None`.
    pub chrome_executable: Option<std::path::PathBuf>,
    /// Launch Chromium without its sandbox (needed inside most containers).
    pub no_sandbox: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; reviewlens/0.1)".to_string(),
            chrome_executable: None,
            no_sandbox: false,
        }
    }
}

/// Parses and checks a URL before any network or browser work.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] for unparsable URLs and non-HTTP schemes.
pub fn validate_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl(format!(
            "{}: unsupported scheme '{}', expected http or https",
            url, other
        ))),
    }
}

/// Fetches pages with a plain HTTP GET.
///
/// The title comes from the `<title>` element of the returned markup.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the client cannot be built (TLS backend failure).
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<PageSnapshot, FetchError> {
        let parsed_url = validate_url(url)?;
        debug!(url = %parsed_url, "fetching over HTTP");

        let response = self
            .client
            .get(parsed_url.clone())
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() { FetchError::Timeout { timeout: self.config.timeout } } else { FetchError::Http(e) }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), url: parsed_url.to_string() });
        }

        let html = response.text().await?;
        let title = Document::parse(&html).title().unwrap_or_default();

        Ok(PageSnapshot { url: url.to_string(), title, html })
    }
}

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;

#[cfg(feature = "browser")]
mod browser {
    use std::time::Duration;

    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use futures::StreamExt;
    use tracing::{debug, warn};

    use super::{FetchConfig, PageFetcher, PageSnapshot, validate_url};
    use crate::error::FetchError;

    /// Renders pages in a fresh headless Chromium per call.
    ///
    /// Each call launches its own browser process and profile, and tears it
    /// down before returning on success, error and timeout alike.
    #[derive(Debug, Clone, Default)]
    pub struct BrowserFetcher {
        config: FetchConfig,
    }

    impl BrowserFetcher {
        pub fn new(config: FetchConfig) -> Self {
            Self { config }
        }

        fn browser_config(&self) -> Result<BrowserConfig, FetchError> {
            let mut builder = BrowserConfig::builder()
                .request_timeout(Duration::from_secs(self.config.timeout))
                .arg(format!("--user-agent={}", self.config.user_agent))
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .arg("--disable-extensions")
                .arg("--no-first-run");

            if self.config.no_sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(path) = &self.config.chrome_executable {
                builder = builder.chrome_executable(path);
            }

            builder.build().map_err(FetchError::Browser)
        }

        async fn read_page(browser: &Browser, url: &str) -> Result<(String, String), FetchError> {
            let page = browser.new_page(url).await.map_err(|e| FetchError::Browser(format!("navigation failed: {}", e)))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| FetchError::Browser(format!("navigation did not complete: {}", e)))?;

            let title = page
                .get_title()
                .await
                .map_err(|e| FetchError::Browser(format!("failed to read title: {}", e)))?
                .unwrap_or_default();
            let html = page
                .content()
                .await
                .map_err(|e| FetchError::Browser(format!("failed to read content: {}", e)))?;

            Ok((title, html))
        }
    }

    #[async_trait]
    impl PageFetcher for BrowserFetcher {
        async fn fetch(&self, url: &str) -> Result<PageSnapshot, FetchError> {
            let parsed_url = validate_url(url)?;
            let config = self.browser_config()?;

            debug!(url = %parsed_url, "launching headless browser");
            let (mut browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| FetchError::Browser(format!("failed to launch browser: {}", e)))?;
            let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

            let timeout = Duration::from_secs(self.config.timeout);
            let outcome = match tokio::time::timeout(timeout, Self::read_page(&browser, parsed_url.as_str())).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout { timeout: self.config.timeout }),
            };

            if let Err(e) = browser.close().await {
                warn!(error = %e, "failed to close browser cleanly");
            }
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "failed to reap browser process");
            }
            handler_task.abort();

            let (title, html) = outcome?;
            debug!(url = %parsed_url, title = %title, bytes = html.len(), "page rendered");

            Ok(PageSnapshot { url: url.to_string(), title: title.trim().to_string(), html })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("reviewlens"));
        assert!(config.chrome_executable.is_none());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/product/1").is_ok());
        assert!(validate_url("  http://example.com  ").is_ok());
        assert!(matches!(validate_url("not-a-url"), Err(FetchError::InvalidUrl(_))));
        assert!(matches!(validate_url("ftp://example.com/file"), Err(FetchError::InvalidUrl(_))));
        assert!(matches!(validate_url("example.com"), Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_http_fetch_invalid_url() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let result = fetcher.fetch("not-a-url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_http_fetch_reads_title_and_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kettle"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><head><title>Acme Kettle</title></head><body><p>Hi</p></body></html>"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let url = format!("{}/kettle", server.uri());
        let page = fetcher.fetch(&url).await.unwrap();

        assert_eq!(page.url, url);
        assert_eq!(page.title, "Acme Kettle");
        assert!(page.html.contains("<p>Hi</p>"));
    }

    #[tokio::test]
    async fn test_http_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let result = fetcher.fetch(&format!("{}/missing", server.uri())).await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }

    #[cfg(feature = "browser")]
    #[tokio::test]
    async fn test_browser_fetch_rejects_invalid_url_without_launching() {
        let fetcher = BrowserFetcher::default();
        let result = fetcher.fetch("definitely not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }
}
