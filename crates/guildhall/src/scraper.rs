use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use crate::parser::ParseError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Page not found: {0}")]
    NotFound(String),
}

/// Source of raw pages. [`WebScraper`] fetches over HTTP; tests can serve
/// pages from memory.
pub trait Fetch {
    fn get_html(&self, url: &str) -> impl Future<Output = Result<String, ScraperError>>;
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }
}

impl Fetch for WebScraper {
    async fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        log::debug!("GET {}", url);

        let html = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        if html.trim().is_empty() {
            return Err(ScraperError::NotFound(url.to_string()));
        }

        Ok(html)
    }
}
