//! Reader session credentials: the access token pair obtained from XAuth.

use std::fmt;

/// An OAuth access token and secret pair for one Reader user.
///
/// Values are taken as given; `ReaderClient::new` is where they are checked.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    access_token_secret: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>, access_token_secret: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn access_token_secret(&self) -> &str {
        &self.access_token_secret
    }

    pub(crate) fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.access_token_secret.is_empty()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}
