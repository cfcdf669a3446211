//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. It only moves bytes:
//! authorization, refresh and status handling live in the application
//! layer.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method};
use tether_application::ports::{HttpTransport, TransportError};
use tether_domain::request::Header;
use tether_domain::{ApiRequest, ApiResponse, HttpMethod};
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("tether/", env!("CARGO_PKG_VERSION"));

/// Transport sending requests relative to a base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    default_timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport for `base_url` with a fresh reqwest client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if `base_url` does not parse
    /// and [`TransportError::Other`] if the client cannot be built.
    pub fn new(base_url: &str, default_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Self::with_client(client, base_url, default_timeout)
    }

    /// Creates a transport around an existing reqwest client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_client(
        client: Client,
        base_url: &str,
        default_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {base_url}")))?;
        Ok(Self {
            client,
            base_url,
            default_timeout,
        })
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Joins `path` onto the base URL, keeping the base's own path prefix.
    /// Absolute URLs are used as they are.
    fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(|e| TransportError::InvalidUrl(format!("{e}: {path}")));
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{base}/{}", path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| TransportError::InvalidUrl(format!("{e}: {joined}")))
    }

    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }
        if error.is_connect() {
            return TransportError::Connection(error.to_string());
        }
        if error.is_builder() {
            return TransportError::InvalidUrl(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(&request.path)?;
        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(timeout);
        for header in request.headers.iter() {
            builder = builder.header(&header.name, &header.value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| Header::new(k.as_str(), v.to_str().unwrap_or("<binary>")))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?
            .to_vec();
        let duration = start.elapsed();

        debug!(
            method = %request.method,
            path = %request.path,
            status,
            elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );

        let mut api_response = ApiResponse::new(status, body);
        api_response.headers = headers;
        api_response.duration = duration;
        Ok(api_response)
    }
}
