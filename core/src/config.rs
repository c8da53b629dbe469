//! Developer credentials shared by every sub-client.
//!
//! # Design
//! `ProcessConfig` is a cheap-to-clone handle around an immutable `Config`
//! snapshot. `configure` swaps in a whole new snapshot; it never merges with
//! the previous one. Each request takes one snapshot when it starts, so a
//! `configure` racing with in-flight requests only affects requests that
//! start after it returns. Callers are still expected to configure once at
//! startup.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

pub const CONSUMER_KEY_ENV: &str = "READABILITY_CONSUMER_KEY";
pub const CONSUMER_SECRET_ENV: &str = "READABILITY_CONSUMER_SECRET";
pub const PARSER_TOKEN_ENV: &str = "READABILITY_PARSER_TOKEN";

/// Input to [`ProcessConfig::configure`]. Absent fields are stored as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConfigOptions {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub parser_token: Option<String>,
}

impl ConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consumer(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.consumer_key = Some(key.into());
        self.consumer_secret = Some(secret.into());
        self
    }

    pub fn parser_token(mut self, token: impl Into<String>) -> Self {
        self.parser_token = Some(token.into());
        self
    }

    /// Read the three credentials from `READABILITY_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            consumer_key: lookup(CONSUMER_KEY_ENV),
            consumer_secret: lookup(CONSUMER_SECRET_ENV),
            parser_token: lookup(PARSER_TOKEN_ENV),
        }
    }
}

impl fmt::Debug for ConfigOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOptions")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &redact(&self.consumer_secret))
            .field("parser_token", &redact(&self.parser_token))
            .finish()
    }
}

/// One immutable snapshot of the developer credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    parser_token: Option<String>,
}

impl Config {
    pub fn consumer_key(&self) -> Option<&str> {
        self.consumer_key.as_deref()
    }

    pub fn consumer_secret(&self) -> Option<&str> {
        self.consumer_secret.as_deref()
    }

    pub fn parser_token(&self) -> Option<&str> {
        self.parser_token.as_deref()
    }

    /// True iff both consumer key and secret are present and non-empty.
    pub fn has_reader_credentials(&self) -> bool {
        self.reader_credentials().is_some()
    }

    /// True iff the parser token is present and non-empty.
    pub fn has_parser_token(&self) -> bool {
        self.parser_token_value().is_some()
    }

    pub(crate) fn reader_credentials(&self) -> Option<(&str, &str)> {
        match (non_empty(&self.consumer_key), non_empty(&self.consumer_secret)) {
            (Some(key), Some(secret)) => Some((key, secret)),
            _ => None,
        }
    }

    pub(crate) fn parser_token_value(&self) -> Option<&str> {
        non_empty(&self.parser_token)
    }
}

impl From<ConfigOptions> for Config {
    fn from(options: ConfigOptions) -> Self {
        Self {
            consumer_key: options.consumer_key,
            consumer_secret: options.consumer_secret,
            parser_token: options.parser_token,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &redact(&self.consumer_secret))
            .field("parser_token", &redact(&self.parser_token))
            .finish()
    }
}

/// Shared handle to the current [`Config`] snapshot.
#[derive(Debug, Clone, Default)]
pub struct ProcessConfig {
    current: Arc<RwLock<Arc<Config>>>,
}

impl ProcessConfig {
    pub fn new(options: ConfigOptions) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(Config::from(options)))),
        }
    }

    /// Replace every credential. Fields missing from `options` become absent.
    pub fn configure(&self, options: ConfigOptions) {
        *self.current.write() = Arc::new(Config::from(options));
        tracing::debug!("readability configuration replaced");
    }

    pub fn current(&self) -> Arc<Config> {
        self.current.read().clone()
    }

    pub fn has_reader_credentials(&self) -> bool {
        self.current().has_reader_credentials()
    }

    pub fn has_parser_token(&self) -> bool {
        self.current().has_parser_token()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "<redacted>")
}
