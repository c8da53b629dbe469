//! OAuth 1.0a request signing (HMAC-SHA1).
//!
//! Credentials are assembled per request by the sub-clients and handed to the
//! pipeline; nothing here is cached between calls.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::Url;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::HttpMethod;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Signing parameters for one request.
///
/// XAuth signs with the consumer pair only; Reader calls add the session's
/// token and token secret.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: Option<String>,
    pub token_secret: Option<String>,
}

impl OAuthCredentials {
    pub fn consumer(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: None,
            token_secret: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, token_secret: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self.token_secret = Some(token_secret.into());
        self
    }
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token", &self.token)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Build the `Authorization` header value for a request.
///
/// `params` are the decoded query and form-body pairs; they take part in the
/// signature but are not repeated in the header.
pub(crate) fn authorization_header(
    credentials: &OAuthCredentials,
    method: HttpMethod,
    url: &str,
    params: &[(String, String)],
) -> Result<String, ApiError> {
    let nonce = Uuid::new_v4().simple().to_string();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let oauth_params = signed_params(credentials, method, url, params, &nonce, timestamp)?;
    let fields: Vec<String> = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect();

    Ok(format!("OAuth {}", fields.join(", ")))
}

/// The `oauth_*` protocol parameters, `oauth_signature` last.
fn signed_params(
    credentials: &OAuthCredentials,
    method: HttpMethod,
    url: &str,
    params: &[(String, String)],
    nonce: &str,
    timestamp: u64,
) -> Result<Vec<(String, String)>, ApiError> {
    let mut oauth_params = vec![
        ("oauth_consumer_key".to_string(), credentials.consumer_key.clone()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
    ];
    if let Some(token) = &credentials.token {
        oauth_params.push(("oauth_token".to_string(), token.clone()));
    }
    oauth_params.push(("oauth_version".to_string(), OAUTH_VERSION.to_string()));

    let mut normalized: Vec<(String, String)> = params
        .iter()
        .chain(oauth_params.iter())
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    normalized.sort();
    let param_string = normalized
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.as_str(),
        encode(&base_uri(url)?),
        encode(&param_string)
    );
    let key = format!(
        "{}&{}",
        encode(&credentials.consumer_secret),
        encode(credentials.token_secret.as_deref().unwrap_or_default())
    );

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| ApiError::Transport(format!("oauth signing key rejected: {e}")))?;
    mac.update(base_string.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    oauth_params.push(("oauth_signature".to_string(), signature));
    Ok(oauth_params)
}

/// Scheme, host and path with default ports and any query stripped.
fn base_uri(url: &str) -> Result<String, ApiError> {
    let mut parsed =
        Url::parse(url).map_err(|e| ApiError::Transport(format!("invalid url {url}: {e}")))?;
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed.to_string())
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
