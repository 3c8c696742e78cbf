//! Credentials and the fixed header set attached to every request.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::ApiError;
use crate::http::Headers;

pub const USER_AGENT: &str = "jpush-api-rust-client";
pub const CONNECTION: &str = "keep-alive";

const APP_KEY_VAR: &str = "JPUSH_APP_KEY";
const MASTER_SECRET_VAR: &str = "JPUSH_MASTER_SECRET";

/// Application key and master secret issued by the push service.
///
/// Neither value is checked locally; the service rejects bad credentials
/// when a call is made.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_key: String,
    master_secret: String,
}

impl Credentials {
    pub fn new(app_key: impl Into<String>, master_secret: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            master_secret: master_secret.into(),
        }
    }

    /// Read credentials from `JPUSH_APP_KEY` and `JPUSH_MASTER_SECRET`.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(read_var(APP_KEY_VAR)?, read_var(MASTER_SECRET_VAR)?))
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// The `Authorization` header value for these credentials.
    pub fn authorization(&self) -> String {
        basic_auth(&self.app_key, &self.master_secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &self.app_key)
            .field("master_secret", &"<redacted>")
            .finish()
    }
}

/// `"Basic " + base64(user ":" password)`.
pub fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

/// The header set a client sends with every request.
pub fn default_headers(credentials: &Credentials) -> Headers {
    let mut headers = Headers::new();
    headers.insert("User-Agent", USER_AGENT);
    headers.insert("Connection", CONNECTION);
    headers.insert("Authorization", credentials.authorization());
    headers
}

fn read_var(name: &str) -> Result<String, ApiError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) => Err(ApiError::Config(format!("{name} is empty"))),
        Err(_) => Err(ApiError::Config(format!("{name} is not set"))),
    }
}
