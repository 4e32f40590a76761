//! Scoring service client
//!
//! Talks to the two endpoints of the remote scoring service:
//! - `GET {base}/tribes` → `{ "tribes": [string] }`
//! - `POST {base}/predict` → `{ "percentage": number, ... }`
//!
//! # Architecture
//! `PredictorBackend` is the seam the controller depends on; `HttpBackend`
//! is the reqwest implementation. Transport failures are classified into
//! [`SubmissionError`] here, so nothing above this module sees reqwest types.

use crate::error::SubmissionError;
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::Value;
use tracing::debug;
use uko_common::config::ClientConfig;
use uko_common::PredictionRequest;

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("uko-predictor/", env!("CARGO_PKG_VERSION"));

/// Remote scoring service operations
#[async_trait]
pub trait PredictorBackend: Send + Sync {
    /// Fetch the list of tribe names
    async fn fetch_tribes(&self) -> Result<Vec<String>, SubmissionError>;

    /// Submit a prediction request, returning the raw success body
    ///
    /// The body is not interpreted here; the caller maps it into a
    /// `PredictionResult` and decides whether it is well formed.
    async fn predict(&self, request: &PredictionRequest) -> Result<Value, SubmissionError>;
}

/// HTTP implementation of [`PredictorBackend`]
///
/// # Example
/// ```rust,ignore
/// use uko_client::api::{HttpBackend, PredictorBackend};
/// use uko_common::config::ClientConfig;
///
/// let backend = HttpBackend::new(&ClientConfig::with_api_base("http://localhost:5000/api"))?;
/// let tribes = backend.fetch_tribes().await?;
/// ```
pub struct HttpBackend {
    /// HTTP client with the request deadline applied
    http_client: Client,
    tribes_url: String,
    predict_url: String,
}

impl HttpBackend {
    /// Create a client for the configured base URL
    pub fn new(config: &ClientConfig) -> uko_common::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| uko_common::Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            tribes_url: config.endpoint("tribes"),
            predict_url: config.endpoint("predict"),
        })
    }

    /// Read a response body, classifying non-success statuses
    async fn read_json(response: Response) -> Result<Value, SubmissionError> {
        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(status = status.as_u16(), error = %e, "Failed to read error body");
                    String::new()
                }
            };
            let detail = server_detail(&body);
            debug!(status = status.as_u16(), body = %body, "Scoring service returned error status");
            return Err(SubmissionError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| classify_body_error(&e))
    }
}

#[async_trait]
impl PredictorBackend for HttpBackend {
    async fn fetch_tribes(&self) -> Result<Vec<String>, SubmissionError> {
        debug!(url = %self.tribes_url, "Fetching tribe catalog");

        let response = self
            .http_client
            .get(&self.tribes_url)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let body = Self::read_json(response).await?;
        parse_tribes(&body)
    }

    async fn predict(&self, request: &PredictionRequest) -> Result<Value, SubmissionError> {
        debug!(url = %self.predict_url, tribe = %request.tribe, "Submitting prediction request");

        let response = self
            .http_client
            .post(&self.predict_url)
            .json(request)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let body = Self::read_json(response).await?;
        debug!(body = %body, "Prediction response received");
        Ok(body)
    }
}

/// Map a send failure to the error taxonomy
fn classify_transport_error(err: &reqwest::Error) -> SubmissionError {
    if err.is_timeout() {
        SubmissionError::Timeout
    } else if err.is_connect() {
        SubmissionError::Network(format!("connection failed: {}", err))
    } else if err.is_builder() {
        SubmissionError::Network(format!("request configuration error: {}", err))
    } else {
        SubmissionError::Network(format!("no response received from server: {}", err))
    }
}

/// Map a failure while reading a success body
fn classify_body_error(err: &reqwest::Error) -> SubmissionError {
    if err.is_timeout() {
        SubmissionError::Timeout
    } else if err.is_decode() {
        SubmissionError::Format(format!("response body is not JSON: {}", err))
    } else {
        SubmissionError::Network(format!("response interrupted: {}", err))
    }
}

/// Server-supplied `error` or `message` text from an error body
fn server_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Extract `tribes` from a catalog body
fn parse_tribes(body: &Value) -> Result<Vec<String>, SubmissionError> {
    let entries = body
        .get("tribes")
        .and_then(Value::as_array)
        .ok_or_else(|| SubmissionError::Format("missing tribes array".to_string()))?;

    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| SubmissionError::Format(format!("tribe is not a string: {}", entry)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_tribes() {
        let body = json!({ "success": true, "count": 2, "tribes": ["Kikuyu", "Luo"] });
        assert_eq!(parse_tribes(&body).unwrap(), vec!["Kikuyu", "Luo"]);
    }

    #[test]
    fn test_parse_tribes_rejects_malformed() {
        assert!(matches!(
            parse_tribes(&json!({ "success": true })),
            Err(SubmissionError::Format(_))
        ));
        assert!(matches!(
            parse_tribes(&json!({ "tribes": ["Luo", 3] })),
            Err(SubmissionError::Format(_))
        ));
    }

    #[test]
    fn test_server_detail_prefers_error_then_message() {
        assert_eq!(
            server_detail(r#"{"success": false, "error": "Invalid tribe selection"}"#).as_deref(),
            Some("Invalid tribe selection")
        );
        assert_eq!(
            server_detail(r#"{"message": "Slow down"}"#).as_deref(),
            Some("Slow down")
        );
        assert_eq!(server_detail(r#"{"error": ""}"#), None);
        assert_eq!(server_detail("<html>Bad Gateway</html>"), None);
    }

    #[tokio::test]
    async fn test_truncated_error_body_still_classified() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            // promise more body than is sent, then hang up
            let _ = socket
                .write_all(b"HTTP/1.1 502 Bad Gateway\r\nContent-Length: 200\r\n\r\n{\"error\":")
                .await;
        });

        let backend = HttpBackend::new(&ClientConfig::with_api_base(format!("http://{}/api", addr))).unwrap();
        let err = backend.fetch_tribes().await.unwrap_err();
        assert_eq!(
            err,
            SubmissionError::Server {
                status: 502,
                detail: None
            }
        );
        assert_eq!(err.user_message(), "Server is currently unavailable");
    }

    #[test]
    fn test_backend_urls_follow_config() {
        let backend = HttpBackend::new(&ClientConfig::with_api_base("http://127.0.0.1:9/api/")).unwrap();
        assert_eq!(backend.tribes_url, "http://127.0.0.1:9/api/tribes");
        assert_eq!(backend.predict_url, "http://127.0.0.1:9/api/predict");
    }
}
