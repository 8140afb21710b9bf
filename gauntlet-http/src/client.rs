//! HTTP client implementation

use crate::config::HttpConfig;
use crate::errors::HttpError;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, trace};

/// Status and body of a completed exchange.
///
/// Any HTTP status, including 4xx and 5xx, is a completed exchange; only
/// transport failures surface as [`HttpError`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: JsonValue,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client trait for the JSON exchanges the engine performs
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// POST `body` as JSON to `url`
    async fn post_json(&self, url: &str, body: &JsonValue) -> Result<HttpResponse, HttpError>;
}

/// Canned reply used in offline mode
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: JsonValue,
    /// Simulated server time before the reply
    pub delay: Duration,
    /// Fail at the transport level instead of replying
    pub network_failure: bool,
}

impl MockResponse {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: JsonValue::Null,
            delay: Duration::ZERO,
            network_failure: false,
        }
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = body;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn network_failure() -> Self {
        Self {
            network_failure: true,
            ..Self::status(0)
        }
    }
}

/// HTTP Manager for handling HTTP requests with mock support
#[derive(Debug, Clone)]
pub struct HttpManager {
    offline: bool,
    mocks: HashMap<String, MockResponse>,
    config: HttpConfig,
    client: Client,
}

impl HttpManager {
    /// Create a new HttpManager in online mode with default configuration
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new HttpManager with specific configuration.
    ///
    /// The underlying connection pool is built once and shared by every clone.
    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating HttpManager with timeout: {}ms",
            config.timeout.as_millis()
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()
            .map_err(|e| HttpError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            offline: false,
            mocks: HashMap::new(),
            config,
            client,
        })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Set offline mode
    pub fn set_offline(&mut self) {
        self.offline = true;
        debug!("HttpManager set to offline mode");
    }

    /// Set online mode
    pub fn set_online(&mut self) {
        self.offline = false;
        debug!("HttpManager set to online mode");
    }

    /// Register the reply for an exact URL
    pub fn add_mock(&mut self, url: &str, response: MockResponse) {
        self.mocks.insert(url.to_string(), response);
        debug!("Added HTTP mock for {}", url);
    }

    /// Clear all mocks
    pub fn clear_mocks(&mut self) {
        self.mocks.clear();
        debug!("Cleared all HTTP mocks");
    }

    async fn mock_reply(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let mock = self
            .mocks
            .get(url)
            .ok_or_else(|| HttpError::NoMock(url.to_string()))?;

        if mock.delay >= self.config.timeout {
            tokio::time::sleep(self.config.timeout).await;
            return Err(HttpError::Timeout(self.config.timeout));
        }
        if !mock.delay.is_zero() {
            tokio::time::sleep(mock.delay).await;
        }

        if mock.network_failure {
            return Err(HttpError::MockFailure(url.to_string()));
        }

        Ok(HttpResponse {
            status: mock.status,
            body: mock.body.clone(),
        })
    }
}

#[async_trait::async_trait]
impl HttpClient for HttpManager {
    async fn post_json(&self, url: &str, body: &JsonValue) -> Result<HttpResponse, HttpError> {
        if self.offline {
            trace!("Offline mode, answering {} from mocks", url);
            return self.mock_reply(url).await;
        }

        let parsed =
            reqwest::Url::parse(url).map_err(|e| HttpError::InvalidUrl(format!("{}: {}", url, e)))?;

        trace!("POST {}", parsed);
        let response = self
            .client
            .post(parsed)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.classify(e))?;

        // Non-JSON bodies are kept verbatim
        let body = if text.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
        };

        trace!("POST {} -> {}", url, status);
        Ok(HttpResponse { status, body })
    }
}

impl HttpManager {
    fn classify(&self, error: reqwest::Error) -> HttpError {
        if error.is_timeout() {
            HttpError::Timeout(self.config.timeout)
        } else {
            HttpError::NetworkError(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offline_manager(timeout: Duration) -> HttpManager {
        let config = HttpConfig {
            timeout,
            ..HttpConfig::default()
        };
        let mut manager = HttpManager::with_config(config).unwrap();
        manager.set_offline();
        manager
    }

    #[tokio::test]
    async fn test_offline_mock_reply() {
        let mut manager = offline_manager(Duration::from_secs(10));
        manager.add_mock(
            "http://a.test/login",
            MockResponse::status(401).with_body(json!({"error": "invalid credentials"})),
        );

        let response = manager
            .post_json("http://a.test/login", &json!({"username": "x"}))
            .await
            .unwrap();
        assert_eq!(response.status, 401);
        assert!(!response.is_success());
        assert_eq!(response.body["error"], "invalid credentials");
    }

    #[tokio::test]
    async fn test_offline_without_mock_fails() {
        let manager = offline_manager(Duration::from_secs(10));
        let result = manager.post_json("http://a.test/login", &json!({})).await;
        assert!(matches!(result, Err(HttpError::NoMock(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_delay_beyond_timeout_times_out() {
        let mut manager = offline_manager(Duration::from_secs(10));
        manager.add_mock(
            "http://slow.test/login",
            MockResponse::status(200).with_delay(Duration::from_secs(30)),
        );

        let started = tokio::time::Instant::now();
        let result = manager.post_json("http://slow.test/login", &json!({})).await;
        assert!(matches!(result, Err(HttpError::Timeout(_))));
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_offline_network_failure() {
        let mut manager = offline_manager(Duration::from_secs(10));
        manager.add_mock("http://down.test/login", MockResponse::network_failure());
        let result = manager.post_json("http://down.test/login", &json!({})).await;
        assert!(matches!(result, Err(HttpError::MockFailure(_))));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_online() {
        let manager = HttpManager::new().unwrap();
        let result = manager.post_json("not a url", &json!({})).await;
        assert!(matches!(result, Err(HttpError::InvalidUrl(_))));
    }
}
