use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::backoff::{BackoffPolicy, ThrottleBackoff};
use super::error::TransportError;
use super::types::{ApiCall, ApiResult, Body, EffectiveStatus, Method};

const USER_AGENT: &str = concat!("hpod-submit/", env!("CARGO_PKG_VERSION"));

/// Anything that can run an [`ApiCall`] to a non-throttled outcome.
///
/// Implementations must not return while the service reports the call as
/// throttled; every other outcome, success or failure, is handed back.
#[allow(async_fn_in_trait)]
pub trait ApiExecutor {
    async fn execute(&self, call: ApiCall) -> Result<ApiResult, TransportError>;
}

/// Timeouts and backoff used by [`HpodClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub backoff: BackoffPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// reqwest-backed executor for `https://{instance}/api/v2/`.
pub struct HpodClient {
    client: Client,
    base_url: String,
    backoff: BackoffPolicy,
}

impl HpodClient {
    pub fn new(instance: &str, settings: ClientSettings) -> Result<Self, TransportError> {
        Self::with_base_url(format!("https://{instance}/api/v2/"), settings)
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(base_url: String, settings: ClientSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        let base_url = if base_url.ends_with('/') {
            base_url
        } else {
            format!("{base_url}/")
        };
        Ok(Self {
            client,
            base_url,
            backoff: settings.backoff,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issues the call exactly once and normalizes whatever came back.
    async fn send_once(&self, call: &ApiCall) -> Result<ApiResult, TransportError> {
        let url = self.url(&call.path);
        let request = match call.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .headers(call.headers.clone());

        let request = match &call.body {
            Body::Empty => request,
            Body::Json(text) => request
                .header(CONTENT_TYPE, "application/json; charset=utf-8")
                .body(text.clone()),
            Body::Bytes(bytes) => request
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(bytes.clone()),
        };

        let response = request.send().await?;
        let transport_status = response.status().as_u16();
        let body = response.text().await?;
        let result = ApiResult::normalize(transport_status, body);
        debug!(
            path = %call.path,
            transport_status,
            effective_status = result.code(),
            "response received"
        );
        Ok(result)
    }
}

impl ApiExecutor for HpodClient {
    async fn execute(&self, call: ApiCall) -> Result<ApiResult, TransportError> {
        let mut backoff = ThrottleBackoff::new(self.backoff.clone());
        loop {
            let result = self.send_once(&call).await?;
            if result.status != EffectiveStatus::Throttled {
                return Ok(result);
            }
            let delay = backoff.next_delay();
            warn!(
                path = %call.path,
                attempt = backoff.attempts(),
                delay_ms = delay.as_millis() as u64,
                "throttled by service, backing off"
            );
            sleep(delay).await;
        }
    }
}
