//! Thin blocking HTTP transport with request/response logging.
//!
//! The portal client only needs GET with query parameters and POST with a
//! JSON body. Both funnel through [`HttpClient::execute`], so every request
//! is logged with method, URL, status and duration.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, ApiResult};

/// Blocking HTTP client with a base timeout and optional keep-alive.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, keep_alive: bool, default_headers: HeaderMap) -> ApiResult<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers);
        if !keep_alive {
            // One connection per request, like a session-less client.
            builder = builder.pool_max_idle_per_host(0);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn get(&self, url: &str) -> ApiResult<HttpResponse> {
        self.execute(self.client.get(url))
    }

    /// GET with query parameters appended to the URL.
    pub fn get_query<Q: Serialize + ?Sized>(&self, url: &str, query: &Q) -> ApiResult<HttpResponse> {
        self.execute(self.client.get(url).query(query))
    }

    /// POST with a JSON body and a `Content-Type: application/json` header.
    pub fn post_json(&self, url: &str, body: &Value) -> ApiResult<HttpResponse> {
        self.execute(self.client.post(url).json(body))
    }

    fn execute(&self, request: RequestBuilder) -> ApiResult<HttpResponse> {
        let request = request.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        log::debug!("{method} {url}");

        let start = Instant::now();
        let response = self.client.execute(request)?;
        let status = response.status();
        let body = response.bytes()?.to_vec();
        let duration = start.elapsed().as_secs_f64();

        if status.is_client_error() || status.is_server_error() {
            log::error!("{method} {url} - HTTP {} {duration:.6}s", status.as_u16());
        } else {
            log::debug!(
                "{method} {url} - HTTP {} ({} bytes) {duration:.6}s",
                status.as_u16(),
                body.len()
            );
        }

        Ok(HttpResponse {
            status,
            url: url.to_string(),
            body,
        })
    }
}

/// A fully-read HTTP response: status code plus raw body bytes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    url: String,
    body: Vec<u8>,
}

impl HttpResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Raw body bytes, consuming the response.
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON. An empty body parses as `Value::Null`.
    pub fn json(&self) -> ApiResult<Value> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Fail on a non-2xx status, keeping the response otherwise.
    pub fn error_for_status(self) -> ApiResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::UnexpectedStatus {
                status: self.status.as_u16(),
                url: self.url,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &[u8]) -> HttpResponse {
        HttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            url: "http://portal.test/endpoint".to_string(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn error_for_status_passes_success_through() {
        let body = response(200, b"uid-token").error_for_status().unwrap();
        assert_eq!(body.text(), "uid-token");
    }

    #[test]
    fn error_for_status_rejects_server_errors() {
        let err = response(500, b"").error_for_status().unwrap_err();
        match err {
            ApiError::UnexpectedStatus { status, url } => {
                assert_eq!(status, 500);
                assert_eq!(url, "http://portal.test/endpoint");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_body_parses_as_null_json() {
        assert_eq!(response(200, b"").json().unwrap(), Value::Null);
    }

    #[test]
    fn body_parses_as_json_value() {
        let value = response(200, br#"{"total": 3}"#).json().unwrap();
        assert_eq!(value["total"], 3);
    }
}
