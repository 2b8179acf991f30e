//! Upstream credentials: either HTTP basic or a single custom header.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Credentials {
    Basic { username: String, password: String },
    Header { name: String, value: String },
}

impl Credentials {
    /// Attach these credentials to a curl handle. Header credentials are
    /// appended to `headers`, which the caller installs on the handle.
    pub fn apply(
        &self,
        easy: &mut curl::easy::Easy,
        headers: &mut curl::easy::List,
    ) -> Result<(), curl::Error> {
        match self {
            Credentials::Basic { username, password } => {
                let mut auth = curl::easy::Auth::new();
                auth.basic(true);
                easy.http_auth(&auth)?;
                easy.username(username)?;
                easy.password(password)?;
            }
            Credentials::Header { name, value } => {
                headers.append(&format!("{}: {}", name.trim(), value.trim()))?;
            }
        }
        Ok(())
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Credentials::Header { name, .. } => f
                .debug_struct("Header")
                .field("name", name)
                .field("value", &"***")
                .finish(),
        }
    }
}
