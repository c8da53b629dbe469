//! XAuth: trade a username and password for an OAuth access token pair.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use tracing::warn;
use url::form_urlencoded;

use crate::config::ProcessConfig;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::oauth::OAuthCredentials;
use crate::pipeline::{RequestOptions, RequestPipeline, ResponseBody};
use crate::session::Session;

pub const XAUTH_PATH: &str = "/rest/v1/oauth/access_token/";

const CALLBACK_CONFIRMED: &str = "oauth_callback_confirmed";

/// Key/value pairs from the XAuth reply, minus `oauth_callback_confirmed`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct XAuthTokens {
    values: BTreeMap<String, String>,
}

impl XAuthTokens {
    pub fn oauth_token(&self) -> Option<&str> {
        self.get("oauth_token")
    }

    pub fn oauth_token_secret(&self) -> Option<&str> {
        self.get("oauth_token_secret")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.values
    }

    /// Build a Reader session from the exchanged token pair.
    pub fn into_session(self) -> Result<Session, ApiError> {
        match (self.oauth_token(), self.oauth_token_secret()) {
            (Some(token), Some(secret)) if !token.is_empty() && !secret.is_empty() => {
                Ok(Session::new(token, secret))
            }
            _ => Err(ApiError::Validation(
                "XAuth response did not contain an OAuth token and token secret".to_string(),
            )),
        }
    }

    fn from_body(body: &ResponseBody) -> Self {
        let mut values: BTreeMap<String, String> = match body {
            ResponseBody::Text(text) => form_urlencoded::parse(text.as_bytes())
                .into_owned()
                .collect(),
            ResponseBody::Json(Value::Object(object)) => object
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => (k.clone(), s.clone()),
                    other => (k.clone(), other.to_string()),
                })
                .collect(),
            ResponseBody::Json(_) | ResponseBody::Empty => BTreeMap::new(),
        };
        values.remove(CALLBACK_CONFIRMED);
        Self { values }
    }
}

impl fmt::Debug for XAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            if key.ends_with("secret") {
                map.entry(key, &"<redacted>");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// Authenticate a user against the XAuth endpoint.
///
/// Fails with `ApiError::Config` before touching the network when the
/// consumer key or secret is missing.
pub async fn xauth(
    config: &ProcessConfig,
    pipeline: &RequestPipeline,
    username: &str,
    password: &str,
) -> Result<XAuthTokens, ApiError> {
    let config = config.current();
    let Some((consumer_key, consumer_secret)) = config.reader_credentials() else {
        warn!("xauth attempted without reader credentials");
        return Err(ApiError::reader_credentials_missing());
    };

    let options = RequestOptions::new()
        .query("x_auth_username", username)
        .query("x_auth_password", password)
        .query("x_auth_mode", "client_auth")
        .oauth(OAuthCredentials::consumer(consumer_key, consumer_secret));

    let response = pipeline.request(HttpMethod::Get, XAUTH_PATH, options).await?;
    Ok(XAuthTokens::from_body(&response.body))
}
