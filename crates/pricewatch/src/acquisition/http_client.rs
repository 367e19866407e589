//! Async HTTP client wrapping reqwest.
//!
//! Not a browser: a single GET with browser-like headers and a bounded
//! timeout. Retrying belongs to the next scheduled cycle, not to this client.

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client for static page fetches.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client that presents itself as a desktop Chrome.
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .unwrap_or_default();

        Self { client, timeout }
    }

    /// Perform a single GET request.
    ///
    /// Non-success statuses are returned as a response, not an error; only
    /// transport failures (DNS, connect, timeout, body read) are errors.
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        let r = self.client.get(url).timeout(self.timeout).send().await?;
        let status = r.status().as_u16();
        let final_url = r.url().to_string();
        let body = r.text().await?;

        Ok(HttpResponse {
            final_url,
            status,
            body,
        })
    }
}
