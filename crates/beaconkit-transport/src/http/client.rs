//! The primary transmitter: delivers batches over HTTP with retry.
//!
//! Two backends live behind the same [`HttpTransmitter`] type. On `wasm32`
//! the browser's own `fetch` is used via `web_sys`, so the request rides on
//! the page's existing network stack (cookies, CORS, service workers) rather
//! than a bundled HTTP client. Off `wasm32` (native tests, tooling) a
//! `reqwest` client stands in, since there is no `fetch` to call.

use std::time::Duration;

use async_trait::async_trait;
use beaconkit_protocol::Batch;

use super::retry::RetryPolicy;
use crate::error::{Result, TransportError};
use crate::traits::Transmitter;
use beaconkit_core::retry::BackoffStrategy;

/// Configuration for [`HttpTransmitter`].
#[derive(Clone, Debug)]
pub struct HttpTransmitterConfig {
    /// The collection endpoint batches are POSTed to.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy applied across attempts for a single batch.
    pub retry_policy: RetryPolicy,
}

impl HttpTransmitterConfig {
    /// Start a config for `endpoint`, defaulted otherwise.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// The primary transmitter, delivering batches as `application/json` POSTs
/// with exponential-backoff retry.
#[derive(Clone)]
pub struct HttpTransmitter {
    config: HttpTransmitterConfig,
    #[cfg(not(target_arch = "wasm32"))]
    client: std::sync::Arc<reqwest::Client>,
}

impl HttpTransmitter {
    /// Create a transmitter posting to `endpoint` with default configuration.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_config(HttpTransmitterConfig::new(endpoint))
    }

    /// Create a transmitter with full control over timeout and retry policy.
    pub fn with_config(config: HttpTransmitterConfig) -> Result<Self> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let client = reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| TransportError::Http(e.to_string()))?;
            Ok(Self {
                config,
                client: std::sync::Arc::new(client),
            })
        }
        #[cfg(target_arch = "wasm32")]
        {
            Ok(Self { config })
        }
    }

    async fn try_send_once(&self, body: &[u8]) -> Result<()> {
        #[cfg(target_arch = "wasm32")]
        {
            self.try_send_once_wasm(body).await
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.try_send_once_native(body).await
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn try_send_once_native(&self, body: &[u8]) -> Result<()> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("content-type", "application/json")
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Http(e.to_string())
                }
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(TransportError::Http(format!(
                "server returned {}",
                response.status()
            )))
        }
    }

    #[cfg(target_arch = "wasm32")]
    async fn try_send_once_wasm(&self, body: &[u8]) -> Result<()> {
        use wasm_bindgen::{JsCast, JsValue};
        use wasm_bindgen_futures::JsFuture;
        use web_sys::{AbortController, Request, RequestInit, Response};

        let controller = AbortController::new()
            .map_err(|e| TransportError::Http(js_error_to_string(&e)))?;

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_signal(Some(&controller.signal()));
        let body_str = std::str::from_utf8(body)
            .map_err(|e| TransportError::Http(format!("non-utf8 batch body: {e}")))?;
        opts.set_body(&JsValue::from_str(body_str));

        let request = Request::new_with_str_and_init(&self.config.endpoint, &opts)
            .map_err(|e| TransportError::Http(js_error_to_string(&e)))?;
        request
            .headers()
            .set("content-type", "application/json")
            .map_err(|e| TransportError::Http(js_error_to_string(&e)))?;

        let window = web_sys::window()
            .ok_or_else(|| TransportError::HostRejected("no window object".into()))?;

        // Aborts the in-flight fetch once `self.config.timeout` elapses;
        // dropping the timer (on the happy path, once the fetch settles)
        // cancels it before it ever fires.
        let abort_timer = gloo_timers::callback::Timeout::new(
            u32::try_from(self.config.timeout.as_millis()).unwrap_or(u32::MAX),
            move || controller.abort(),
        );

        let fetch_result = JsFuture::from(window.fetch_with_request(&request)).await;
        drop(abort_timer);

        let resp_value = fetch_result.map_err(|e| {
            if is_abort_error(&e) {
                TransportError::Timeout
            } else {
                TransportError::Http(js_error_to_string(&e))
            }
        })?;
        let response: Response = resp_value
            .dyn_into()
            .map_err(|_| TransportError::Http("fetch did not resolve to a Response".into()))?;

        if response.ok() {
            Ok(())
        } else {
            Err(TransportError::Http(format!(
                "server returned {}",
                response.status()
            )))
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn is_abort_error(value: &wasm_bindgen::JsValue) -> bool {
    use wasm_bindgen::JsCast;
    value
        .dyn_ref::<web_sys::DomException>()
        .is_some_and(|e| e.name() == "AbortError")
}

#[cfg(target_arch = "wasm32")]
fn js_error_to_string(value: &wasm_bindgen::JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

#[async_trait(?Send)]
impl Transmitter for HttpTransmitter {
    async fn send(&self, batch: &Batch) -> Result<()> {
        let body = serde_json::to_vec(batch)?;
        let max_retries = self.config.retry_policy.max_retries();

        let mut attempt = 0;
        loop {
            match self.try_send_once(&body).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    let retryable = RetryPolicy::is_retryable(&err);
                    if !retryable || attempt >= max_retries {
                        return Err(err);
                    }
                    let delay = self.config.retry_policy.calculate_delay(attempt);
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(target_arch = "wasm32")]
async fn sleep(duration: Duration) {
    gloo_timers::future::sleep(duration).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}
