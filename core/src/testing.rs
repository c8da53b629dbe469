//! In-memory transport for unit tests: replays queued responses and records
//! every request it was asked to execute.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::config::{ConfigOptions, ProcessConfig};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::pipeline::RequestPipeline;

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_json(&self, status: u16, body: Value) {
        self.push_with_headers(status, vec![("content-type", "application/json")], &body.to_string());
    }

    pub(crate) fn push_text(&self, status: u16, body: &str) {
        self.push_with_headers(status, Vec::new(), body);
    }

    pub(crate) fn push_with_headers(&self, status: u16, headers: Vec<(&str, &str)>, body: &str) {
        self.responses.lock().push_back(Ok(HttpResponse {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        }));
    }

    pub(crate) fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .push_back(Err(ApiError::Transport(message.to_string())));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("no request was executed")
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted response left".to_string())))
    }
}

pub(crate) fn configured() -> ProcessConfig {
    ProcessConfig::new(
        ConfigOptions::new()
            .consumer("some_consumer_key", "some_consumer_secret")
            .parser_token("some_parser_token"),
    )
}

pub(crate) fn pipeline(transport: &Arc<ScriptedTransport>) -> RequestPipeline {
    RequestPipeline::new(transport.clone())
}

/// Decoded `application/x-www-form-urlencoded` body of a recorded request.
pub(crate) fn form_of(request: &HttpRequest) -> Vec<(String, String)> {
    url::form_urlencoded::parse(request.body.as_deref().unwrap_or_default().as_bytes())
        .into_owned()
        .collect()
}
