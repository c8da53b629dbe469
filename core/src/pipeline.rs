//! The single request path every sub-client goes through.
//!
//! # Design
//! `RequestPipeline` turns `(method, path, options)` into a plain-data
//! `HttpRequest`, signs it when the caller supplies OAuth credentials, runs it
//! through the shared `Transport`, decodes the body and maps the known error
//! statuses to `ApiError::Http`. It holds no credentials and no per-call
//! state, so one pipeline can serve every client concurrently.
//!
//! Statuses outside the known error set are returned as ordinary responses;
//! the sub-clients decide what they mean.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::http::{find_header, HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::oauth::{self, OAuthCredentials};

pub const BASE_URL: &str = "https://www.readability.com/api";

/// Statuses the Provider uses for errors. Anything else passes through.
pub const ERROR_CODES: [u16; 6] = [400, 401, 403, 404, 500, 504];

/// Per-call inputs: query string, optional form body and optional signing
/// credentials.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub form: Option<Vec<(String, String)>>,
    pub oauth: Option<OAuthCredentials>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.form = Some(pairs);
        self
    }

    pub fn oauth(mut self, credentials: OAuthCredentials) -> Self {
        self.oauth = Some(credentials);
        self
    }
}

/// A decoded response body.
///
/// Bodies that parse as JSON are decoded; anything else (XAuth's form-encoded
/// reply, plain-text errors) is kept as text.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
}

impl ResponseBody {
    fn decode(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str(raw) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(raw.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A response that made it past error mapping.
#[derive(Debug, Clone)]
pub struct PipelineResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl PipelineResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Deserialize a JSON body into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self.body {
            ResponseBody::Json(value) => Ok(serde_json::from_value(value)?),
            ResponseBody::Empty => Err(ApiError::ResponseShape(format!(
                "expected a JSON body, got an empty {} response",
                self.status
            ))),
            ResponseBody::Text(_) => Err(ApiError::ResponseShape(format!(
                "expected a JSON body, got text with status {}",
                self.status
            ))),
        }
    }
}

/// Shared HTTP + JSON + error-translation layer.
#[derive(Clone)]
pub struct RequestPipeline {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RequestPipeline {
    /// Pipeline against the production Provider using `reqwest`.
    pub fn production() -> Result<Self, ApiError> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?)))
    }

    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_base_url(BASE_URL, transport)
    }

    pub fn with_base_url(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Describe the request as plain data, signed when `options.oauth` is set.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];

        let body = options.form.as_ref().map(|pairs| {
            headers.push((
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ));
            form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs.iter())
                .finish()
        });

        if let Some(credentials) = &options.oauth {
            let mut params = options.query.clone();
            if let Some(form) = &options.form {
                params.extend(form.iter().cloned());
            }
            let authorization = oauth::authorization_header(credentials, method, &url, &params)?;
            headers.push(("Authorization".to_string(), authorization));
        }

        Ok(HttpRequest {
            method,
            url,
            query: options.query.clone(),
            headers,
            body,
        })
    }

    /// Perform one request. Known error statuses become `ApiError::Http`;
    /// every other status is returned to the caller unmodified.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<PipelineResponse, ApiError> {
        let request = self.build_request(method, path, &options)?;
        debug!(method = method.as_str(), url = %request.url, "sending readability request");

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                debug!(method = method.as_str(), path, error = %err, "readability request failed");
                return Err(err);
            }
        };
        debug!(method = method.as_str(), path, status = response.status, "received readability response");

        let body = ResponseBody::decode(&response.body);
        check_status(&response, &body)?;

        Ok(PipelineResponse {
            status: response.status,
            headers: response.headers,
            body,
        })
    }
}

/// Map the known error statuses to `ApiError::Http`.
///
/// The message is the body as text, unless the body is JSON carrying a
/// truthy `messages` field, in which case it is that field serialized as JSON.
fn check_status(response: &HttpResponse, body: &ResponseBody) -> Result<(), ApiError> {
    if !ERROR_CODES.contains(&response.status) {
        return Ok(());
    }
    let message = match body {
        ResponseBody::Json(Value::String(text)) => text.clone(),
        ResponseBody::Json(value) => value
            .get("messages")
            .filter(|messages| is_truthy(messages))
            .map(|messages| messages.to_string())
            .unwrap_or_else(|| response.body.clone()),
        _ => response.body.clone(),
    };

    Err(ApiError::Http {
        status: response.status,
        message,
    })
}

/// JSON values that count as present: not null, false, zero or "".
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
