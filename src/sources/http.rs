//! JSON-over-HTTP helper shared by the API-backed sources.

use super::SourceError;
use crate::domain::Decimal;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// HTTP client with a per-request timeout and bounded retry on 429/5xx.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry_budget: Duration,
}

impl HttpClient {
    pub fn new(timeout_ms: u64) -> Self {
        let timeout = Duration::from_millis(timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            retry_budget: timeout,
        }
    }

    /// GET `url` and parse the body as JSON.
    ///
    /// Non-success statuses other than 429/5xx are returned immediately as
    /// `SourceError::Http` so callers can react to specific codes.
    pub async fn get_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value, SourceError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_budget),
            ..Default::default()
        };

        retry(backoff, || async {
            debug!(url, "GET");
            let mut request = self.client.get(url);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            let response = request.send().await.map_err(|e| {
                backoff::Error::transient(SourceError::Network(e.to_string()))
            })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(SourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(SourceError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(SourceError::Http {
                    status: status.as_u16(),
                    message: status
                        .canonical_reason()
                        .unwrap_or("Client error")
                        .to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(SourceError::Parse(e.to_string())))
        })
        .await
    }
}

/// Read a USD quote that may arrive as a JSON number or a numeric string.
pub fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
        serde_json::Value::String(s) => Decimal::from_str_canonical(s.trim()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_decimal_from_json() {
        let d = |s: &str| Decimal::from_str_canonical(s).unwrap();
        assert_eq!(decimal_from_json(&serde_json::json!(1.25)), Some(d("1.25")));
        assert_eq!(decimal_from_json(&serde_json::json!("2.5")), Some(d("2.5")));
        assert_eq!(decimal_from_json(&serde_json::json!(3)), Some(d("3")));
        assert_eq!(decimal_from_json(&serde_json::json!("n/a")), None);
        assert_eq!(decimal_from_json(&serde_json::Value::Null), None);
    }

    #[tokio::test]
    async fn test_get_json_success_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("Authorization", "token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = HttpClient::new(1_000);
        let body = client
            .get_json(&format!("{}/ping", server.uri()), &[("Authorization", "token")])
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_get_json_not_found_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(1_000);
        let err = client
            .get_json(&format!("{}/missing", server.uri()), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Http { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_get_json_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(1.5)))
            .mount(&server)
            .await;

        let client = HttpClient::new(5_000);
        let body = client
            .get_json(&format!("{}/flaky", server.uri()), &[])
            .await
            .unwrap();
        assert_eq!(body, serde_json::json!(1.5));
    }

    #[tokio::test]
    async fn test_get_json_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = HttpClient::new(1_000);
        let err = client
            .get_json(&format!("{}/html", server.uri()), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
