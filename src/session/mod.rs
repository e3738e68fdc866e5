//! HTTP session for the IAPD site
//!
//! This module owns the single HTTP client used by the crawler:
//! - Cookie store, so ASP.NET session state survives between postbacks
//! - Browser-like default headers
//! - Per-request timeout
//! - Randomized delay between consecutive requests
//! - Mapping of transport failures and error statuses to [`IapdError`]

mod throttle;

pub use throttle::Throttle;

use crate::config::{SessionConfig, SiteConfig};
use crate::{IapdError, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};

/// Path of the landing page, also sent as the referer
pub const LANDING_PATH: &str = "/IAPD/default.aspx";

/// Builds the HTTP client used for every IAPD request
///
/// # Arguments
///
/// * `session` - Timeout and user agent settings
/// * `site` - Base URL (for the referer header) and HTTPS policy
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(IapdError)` - Invalid header value or client construction failure
pub fn build_http_client(session: &SessionConfig, site: &SiteConfig) -> Result<Client> {
    let referer = format!("{}{}", site.base_url.trim_end_matches('/'), LANDING_PATH);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert(
        header::REFERER,
        HeaderValue::from_str(&referer).map_err(|e| IapdError::UnexpectedResponse {
            url: referer.clone(),
            message: format!("invalid referer header: {}", e),
        })?,
    );

    Client::builder()
        .user_agent(session.user_agent.as_str())
        .default_headers(headers)
        .cookie_store(true)
        .timeout(session.timeout())
        .https_only(site.https_only)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| IapdError::from_reqwest(&site.base_url, e))
}

/// Throttled HTTP session that fails on error statuses
#[derive(Debug)]
pub struct IapdSession {
    client: Client,
    throttle: Throttle,
}

impl IapdSession {
    pub fn new(session: &SessionConfig, site: &SiteConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(session, site)?,
            throttle: Throttle::new(session.min_delay(), session.max_delay()),
        })
    }

    /// Sends a GET request
    pub async fn get(&self, url: &str) -> Result<Response> {
        tracing::debug!("GET {}", url);
        self.send(self.client.get(url), url).await
    }

    /// Sends a form-encoded POST request
    pub async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<Response> {
        tracing::debug!(
            "POST {} with fields {:?}",
            url,
            form.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>()
        );
        self.send(self.client.post(url).form(form), url).await
    }

    /// Fetches a page and returns its body as text
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        response
            .text()
            .await
            .map_err(|e| IapdError::from_reqwest(url, e))
    }

    /// Posts a form and returns the response body as text
    pub async fn post_form_text(&self, url: &str, form: &[(String, String)]) -> Result<String> {
        let response = self.post_form(url, form).await?;
        response
            .text()
            .await
            .map_err(|e| IapdError::from_reqwest(url, e))
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        self.throttle.wait().await;
        let result = request.send().await;
        self.throttle.mark();

        let response = result.map_err(|e| IapdError::from_reqwest(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(IapdError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}
