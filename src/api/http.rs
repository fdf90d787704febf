//! HTTP transport
//!
//! One bearer-authenticated request per call, no retries. The last request and
//! last response are kept for diagnostics.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method};
use serde::{Serialize, Serializer};
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

/// Maximum length of a body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

pub const CLIENT_REQUEST_ID_HEADER: &str = "X-Client-Request-Id";

/// Sanitize a body for logging
/// Truncates long payloads and strips control characters
pub(crate) fn sanitize_for_log(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let truncated = if text.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| text.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &text[..cut], text.len())
    } else {
        text.into_owned()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

fn method_name<S: Serializer>(method: &Method, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

/// Raw request as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedRequest {
    #[serde(serialize_with = "method_name")]
    pub method: Method,
    pub url: String,
    pub body: Option<Vec<u8>>,
    pub client_request_id: String,
    pub sent_at: DateTime<Utc>,
}

/// Raw response as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

/// Last request/response pair. `response` is `None` when the request failed in transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub request: Option<RecordedRequest>,
    pub response: Option<RecordedResponse>,
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// HTTP client wrapper carrying the bearer token and the diagnostic record
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    token: Option<String>,
    last: Arc<Mutex<Exchange>>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(Error::Transport)?;

        Ok(Self {
            client,
            token: config.token.clone(),
            last: Arc::new(Mutex::new(Exchange::default())),
        })
    }

    fn record(&self) -> MutexGuard<'_, Exchange> {
        // A panic while holding the lock leaves a usable record
        self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the last recorded exchange.
    pub fn last_exchange(&self) -> Exchange {
        self.record().clone()
    }

    /// Send one request. Non-2xx statuses are returned, not turned into errors.
    pub async fn send(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<RawResponse> {
        let client_request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("{} {} [{}]", method, url, client_request_id);
        if let Some(ref body) = body {
            tracing::trace!("request body: {}", sanitize_for_log(body));
        }

        {
            let mut last = self.record();
            last.request = Some(RecordedRequest {
                method: method.clone(),
                url: url.to_string(),
                body: body.clone(),
                client_request_id: client_request_id.clone(),
                sent_at: Utc::now(),
            });
            last.response = None;
        }

        let mut request = self
            .client
            .request(method, url)
            .header(CLIENT_REQUEST_ID_HEADER, &client_request_id);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("transport failure [{}]: {}", client_request_id, e);
            Error::Transport(e)
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(Error::Transport)?.to_vec();

        if status >= 400 {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
        } else {
            tracing::trace!("response {}: {}", status, sanitize_for_log(&body));
        }

        self.record().response = Some(RecordedResponse {
            status,
            body: body.clone(),
            received_at: Utc::now(),
        });

        Ok(RawResponse { status, body })
    }
}
