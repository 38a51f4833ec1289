#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

/// Optional sender identity read from `~/.config/submissions`.
///
/// The file is flat JSON with two optional string fields. A missing file,
/// an unreadable file, or malformed JSON all degrade to an empty config;
/// the missing fields are prompted for at send time instead.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SenderConfig {
    /// Space-separated first name and surname, used in the `From` header
    /// and the signature of the email body.
    pub name:  Option<String>,
    /// Sender's email address.
    pub email: Option<String>,
}

impl SenderConfig {
    /// Default config file location under the user's home directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("submissions"))
    }

    /// Parses a config from JSON text, degrading to an empty config on
    /// malformed input.
    pub fn from_json(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    /// Reads the config at `path`; a missing or unreadable file yields an
    /// empty config.
    pub fn from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(_) => {
                debug!("no config file at {}", path.display());
                Self::default()
            }
        }
    }

    /// Loads the config from the default location.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => Self::default(),
        }
    }

    /// Returns the configured sender name, trimmed, if it is non-empty.
    pub fn sender_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Returns the configured sender address, trimmed, if it is non-empty.
    pub fn sender_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}
