//! Job configuration
//!
//! The job reads a small sectioned key-value file (`dl.cfg`, TOML syntax):
//!
//! ```toml
//! [KEYS]
//! AWS_ACCESS_KEY_ID = "AKIA..."
//! AWS_SECRET_ACCESS_KEY = "..."
//!
//! [PATHS]            # optional
//! INPUT_DATA = "s3a://udacity-dend/"
//! OUTPUT_DATA = "s3a://my-lake/"
//!
//! [S3]               # optional
//! REGION = "us-west-2"
//! ENDPOINT = "http://localhost:9000"
//! ALLOW_HTTP = true
//! ```
//!
//! Credentials are handed to the session as a value; nothing here touches
//! the process environment.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "dl.cfg";

/// Default root holding `song_data/` and `log_data/`
pub const DEFAULT_INPUT_ROOT: &str = "s3a://udacity-dend/";

/// Default root receiving the five output tables
pub const DEFAULT_OUTPUT_ROOT: &str = "s3a://gharibudacity/";

const KEYS_SECTION: &str = "KEYS";

// ============================================================================
// File Layout
// ============================================================================

/// Complete configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LakeConfig {
    /// Credentials section (required)
    #[serde(rename = "KEYS", default)]
    pub keys: KeysSection,

    /// Input/output roots
    #[serde(rename = "PATHS", default)]
    pub paths: PathsSection,

    /// S3 connection tuning
    #[serde(rename = "S3", default)]
    pub s3: S3Section,
}

/// `[KEYS]` section
#[derive(Clone, Default, Deserialize)]
pub struct KeysSection {
    #[serde(rename = "AWS_ACCESS_KEY_ID", default)]
    pub access_key_id: Option<String>,

    #[serde(rename = "AWS_SECRET_ACCESS_KEY", default)]
    pub secret_access_key: Option<String>,

    #[serde(rename = "AWS_SESSION_TOKEN", default)]
    pub session_token: Option<String>,
}

impl fmt::Debug for KeysSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeysSection")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "****"))
            .field("session_token", &self.session_token.as_ref().map(|_| "****"))
            .finish()
    }
}

/// `[PATHS]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsSection {
    #[serde(rename = "INPUT_DATA", default)]
    pub input_data: Option<String>,

    #[serde(rename = "OUTPUT_DATA", default)]
    pub output_data: Option<String>,
}

/// `[S3]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Section {
    #[serde(rename = "REGION", default)]
    pub region: Option<String>,

    #[serde(rename = "ENDPOINT", default)]
    pub endpoint: Option<String>,

    #[serde(rename = "ALLOW_HTTP", default)]
    pub allow_http: bool,
}

impl LakeConfig {
    /// Load and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Extract the credentials, failing if either key is absent or blank
    pub fn credentials(&self) -> Result<Credentials> {
        let access_key_id = required(self.keys.access_key_id.as_deref(), "AWS_ACCESS_KEY_ID")?;
        let secret_access_key =
            required(self.keys.secret_access_key.as_deref(), "AWS_SECRET_ACCESS_KEY")?;

        let mut credentials = Credentials::new(access_key_id, secret_access_key);
        if let Some(token) = self.keys.session_token.as_deref().filter(|t| !t.is_empty()) {
            credentials = credentials.with_session_token(token);
        }
        Ok(credentials)
    }

    /// Input root, falling back to the default bucket
    pub fn input_root(&self) -> &str {
        self.paths.input_data.as_deref().unwrap_or(DEFAULT_INPUT_ROOT)
    }

    /// Output root, falling back to the default bucket
    pub fn output_root(&self) -> &str {
        self.paths
            .output_data
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_ROOT)
    }

    /// S3 connection options
    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions {
            region: self.s3.region.clone(),
            endpoint: self.s3.endpoint.clone(),
            allow_http: self.s3.allow_http,
        }
    }
}

fn required(value: Option<&str>, key: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| Error::missing_key(KEYS_SECTION, key))
}

// ============================================================================
// Resolved Values
// ============================================================================

/// Object-store credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create credentials from a key pair
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a temporary session token
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"****")
            .field("session_token", &self.session_token.as_ref().map(|_| "****"))
            .finish()
    }
}

/// Connection options for S3-style stores
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageOptions {
    /// AWS region (defaults to the SDK default when unset)
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores
    pub endpoint: Option<String>,
    /// Permit plain-HTTP endpoints
    pub allow_http: bool,
}
