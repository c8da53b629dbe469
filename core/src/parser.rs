//! Client for the Parser (content extraction) API.
//!
//! Parser calls are not OAuth-signed; every query carries the configured
//! parser token instead.

use tracing::warn;

use crate::config::ProcessConfig;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::pipeline::{PipelineResponse, RequestOptions, RequestPipeline};
use crate::types::Article;

pub const PARSER_BASE_PATH: &str = "/content/v1";

#[derive(Debug, Clone)]
pub struct ParserClient {
    config: ProcessConfig,
    pipeline: RequestPipeline,
}

impl ParserClient {
    pub fn new(config: ProcessConfig, pipeline: RequestPipeline) -> Self {
        Self { config, pipeline }
    }

    async fn request(&self, path: &str, url: &str) -> Result<PipelineResponse, ApiError> {
        let config = self.config.current();
        let Some(token) = config.parser_token_value() else {
            warn!(path, "parser request attempted without a parser token");
            return Err(ApiError::parser_token_missing());
        };

        let options = RequestOptions::new().query("url", url).query("token", token);
        self.pipeline
            .request(HttpMethod::Get, &format!("{PARSER_BASE_PATH}{path}"), options)
            .await
    }

    /// Extract the readable content of a page.
    pub async fn parse(&self, url: &str) -> Result<Article, ApiError> {
        self.request("/parser", url).await?.decode()
    }

    /// How confident the Parser is that it can extract `url`, if it says.
    pub async fn confidence(&self, url: &str) -> Result<Option<f64>, ApiError> {
        let response = self.request("/confidence", url).await?;
        Ok(response
            .body
            .as_json()
            .and_then(|body| body.get("confidence"))
            .and_then(|confidence| confidence.as_f64()))
    }
}
