//! Client for the URL Shortener API. No credentials are involved.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::pipeline::{RequestOptions, RequestPipeline, ResponseBody};
use crate::types::{ShortUrlMeta, ShortenResponse};

pub const SHORTENER_BASE_PATH: &str = "/shortener/v1";

/// Result of [`ShortenerClient::shorten`].
#[derive(Debug, Clone, PartialEq)]
pub struct Shortened {
    /// `meta.rdd_url` from the reply, when present.
    pub short_url: Option<String>,
    /// The reply exactly as decoded, whatever its shape.
    pub body: ResponseBody,
}

impl Shortened {
    /// The reply as a typed envelope, if it is a JSON object of that shape.
    pub fn envelope(&self) -> Option<ShortenResponse> {
        let value = self.body.as_json().filter(|value| value.is_object())?;
        serde_json::from_value(value.clone()).ok()
    }
}

#[derive(Debug, Clone)]
pub struct ShortenerClient {
    pipeline: RequestPipeline,
}

impl ShortenerClient {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    /// Shorten `url`. Any successful reply is `Ok`; `short_url` is `None`
    /// when the reply carries no `meta.rdd_url`.
    pub async fn shorten(&self, url: &str) -> Result<Shortened, ApiError> {
        let options = RequestOptions::new().form(vec![("url".to_string(), url.to_string())]);
        let response = self
            .pipeline
            .request(
                HttpMethod::Post,
                &format!("{SHORTENER_BASE_PATH}/urls"),
                options,
            )
            .await?;

        let short_url = response
            .body
            .as_json()
            .and_then(|body| body.get("meta"))
            .and_then(|meta| meta.get("rdd_url"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Shortened {
            short_url,
            body: response.body,
        })
    }

    /// Metadata for an existing short URL; `None` when the reply has no `meta`.
    pub async fn url(&self, id: &str) -> Result<Option<ShortUrlMeta>, ApiError> {
        let response = self
            .pipeline
            .request(
                HttpMethod::Get,
                &format!("{SHORTENER_BASE_PATH}/urls/{id}"),
                RequestOptions::new(),
            )
            .await?;

        let meta = response
            .body
            .into_json()
            .and_then(|mut body| body.as_object_mut()?.remove("meta"));
        match meta {
            None | Some(Value::Null) => Ok(None),
            Some(meta) => Ok(Some(serde_json::from_value(meta)?)),
        }
    }
}
