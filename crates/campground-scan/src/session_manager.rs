use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::{Client, cookie::Jar};
use tracing::debug;

use crate::scan_types::{Result, ScanError};

/// Status and body of a finished request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    /// Fail with a fetch error unless the status is 200
    pub fn ensure_ok(self, url: &str) -> Result<Self> {
        if self.status != 200 {
            return Err(ScanError::unexpected_status(url, self.status));
        }
        Ok(self)
    }
}

/// One browsing session against a reservation site. All requests made
/// through the same session share its cookies.
#[async_trait]
pub trait HttpSession: Send + Sync {
    /// Send a GET request
    async fn get(&self, url: &str) -> Result<HttpResponse>;

    /// Send a POST request with a form-encoded body
    async fn post_form(&self, url: &str, params: &[(String, String)]) -> Result<HttpResponse>;

    /// Send a POST request with a JSON body
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse>;
}

/// Hands out fresh sessions, one per fetch window
pub trait SessionFactory: Send + Sync {
    /// Start a new session with an empty cookie jar
    fn new_session(&self) -> Result<Box<dyn HttpSession>>;
}

/// Settings for the reqwest backed sessions
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Per-request timeout
    pub timeout: Duration,

    /// User agents to pick from for each new session
    pub user_agents: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agents: vec![
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
            ],
        }
    }
}

/// Builds a cookie-carrying reqwest client per session
#[derive(Debug, Clone, Default)]
pub struct ReqwestSessionFactory {
    config: SessionConfig,
}

impl ReqwestSessionFactory {
    /// Create a factory; `None` uses the default config
    pub fn new(config: Option<SessionConfig>) -> Self {
        Self {
            config: config.unwrap_or_default(),
        }
    }
}

impl SessionFactory for ReqwestSessionFactory {
    fn new_session(&self) -> Result<Box<dyn HttpSession>> {
        let jar = Arc::new(Jar::default());

        let mut builder = Client::builder()
            .cookie_provider(jar)
            .timeout(self.config.timeout);

        if let Some(user_agent) = self.config.user_agents.choose(&mut rand::rng()) {
            debug!("Using user agent: {}", user_agent);
            builder = builder.user_agent(user_agent.as_str());
        }

        let client = builder
            .build()
            .map_err(|e| ScanError::Fetch(format!("Failed to create session client: {}", e)))?;

        Ok(Box::new(ReqwestSession { client }))
    }
}

/// Session backed by a reqwest client with its own cookie jar
pub struct ReqwestSession {
    client: Client,
}

impl ReqwestSession {
    async fn finish(method: &str, url: &str, response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ScanError::Fetch(format!("Reading response body from {}: {}", url, e)))?;

        debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpSession for ReqwestSession {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScanError::Fetch(format!("GET {} failed: {}", url, e)))?;

        Self::finish("GET", url, response).await
    }

    async fn post_form(&self, url: &str, params: &[(String, String)]) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| ScanError::Fetch(format!("POST {} failed: {}", url, e)))?;

        Self::finish("POST", url, response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ScanError::Fetch(format!("POST {} failed: {}", url, e)))?;

        Self::finish("POST", url, response).await
    }
}
