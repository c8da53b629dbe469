//! Entry point bundling configuration and the request pipeline.
//!
//! # Design
//! `Readability` holds the shared `ProcessConfig` handle and one
//! `RequestPipeline` and hands out sub-clients that share both. It keeps no
//! other state; cloning it is cheap and clones see the same configuration.

use crate::auth::{self, XAuthTokens};
use crate::config::{ConfigOptions, ProcessConfig};
use crate::error::ApiError;
use crate::parser::ParserClient;
use crate::pipeline::RequestPipeline;
use crate::reader::ReaderClient;
use crate::session::Session;
use crate::shortener::ShortenerClient;

#[derive(Debug, Clone)]
pub struct Readability {
    config: ProcessConfig,
    pipeline: RequestPipeline,
}

impl Readability {
    /// Client for the production Provider.
    pub fn new(options: ConfigOptions) -> Result<Self, ApiError> {
        Ok(Self::with_pipeline(
            ProcessConfig::new(options),
            RequestPipeline::production()?,
        ))
    }

    pub fn with_pipeline(config: ProcessConfig, pipeline: RequestPipeline) -> Self {
        Self { config, pipeline }
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Replace the developer credentials for every client sharing this config.
    pub fn configure(&self, options: ConfigOptions) {
        self.config.configure(options);
    }

    pub async fn xauth(&self, username: &str, password: &str) -> Result<XAuthTokens, ApiError> {
        auth::xauth(&self.config, &self.pipeline, username, password).await
    }

    pub fn reader(&self, session: Session) -> Result<ReaderClient, ApiError> {
        ReaderClient::new(self.config.clone(), self.pipeline.clone(), session)
    }

    pub fn parser(&self) -> ParserClient {
        ParserClient::new(self.config.clone(), self.pipeline.clone())
    }

    pub fn shortener(&self) -> ShortenerClient {
        ShortenerClient::new(self.pipeline.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{configured, pipeline, ScriptedTransport};
    use serde_json::json;

    #[tokio::test]
    async fn sub_clients_share_the_pipeline_and_config() {
        let transport = ScriptedTransport::new();
        transport.push_text(200, "oauth_token=t&oauth_token_secret=s");
        transport.push_json(200, json!({"username": "jdoe"}));
        transport.push_json(200, json!({"confidence": 0.5}));

        let readability = Readability::with_pipeline(configured(), pipeline(&transport));

        let session = readability
            .xauth("jdoe", "secret")
            .await
            .unwrap()
            .into_session()
            .unwrap();
        let user = readability.reader(session).unwrap().user().await.unwrap();
        assert_eq!(user.username.as_deref(), Some("jdoe"));

        let confidence = readability.parser().confidence("http://x").await.unwrap();
        assert_eq!(confidence, Some(0.5));
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn reconfigure_applies_to_existing_clients() {
        let transport = ScriptedTransport::new();
        let readability = Readability::with_pipeline(configured(), pipeline(&transport));
        let parser = readability.parser();

        readability.configure(ConfigOptions::default());

        let err = parser.parse("http://x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn reader_rejects_incomplete_session() {
        let transport = ScriptedTransport::new();
        let readability = Readability::with_pipeline(configured(), pipeline(&transport));
        assert!(matches!(
            readability.reader(Session::new("token", "")),
            Err(ApiError::Validation(_))
        ));
    }
}
