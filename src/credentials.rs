//! API key storage and masking.
//!
//! The key is kept as plain text in `<config dir>/colorpage/api-key`. The
//! `COLORPAGE_API_KEY` environment variable, when set and non-empty, wins
//! over the file. [`ApiKey`] never prints its value: both `Display` and
//! `Debug` show the masked form.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const API_KEY_ENV: &str = "COLORPAGE_API_KEY";
const KEY_FILENAME: &str = "api-key";
const MASK: &str = "••••••••";

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("API key is empty")]
    Empty,
    #[error("API key was rejected by the service")]
    Rejected,
    #[error("No API key configured; run `colorpage key set` or set COLORPAGE_API_KEY")]
    Missing,
    #[error("No user config directory available on this platform")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Trims surrounding whitespace; an empty result is rejected.
    pub fn new(raw: &str) -> Result<Self, CredentialError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The raw key, for the request header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        mask_key(&self.0)
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&self.masked()).finish()
    }
}

/// First four and last four characters around a fixed mask. Keys of eight
/// characters or fewer are masked completely.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return MASK.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{MASK}{tail}")
}

/// Where the key is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    File,
}

/// Plain-text key file plus environment override.
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
    env_override: Option<String>,
}

impl KeyStore {
    /// Store in the platform config directory, honoring `COLORPAGE_API_KEY`.
    pub fn from_env() -> Result<Self, CredentialError> {
        let dir = dirs::config_dir().ok_or(CredentialError::NoConfigDir)?;
        Ok(Self {
            path: dir.join("colorpage").join(KEY_FILENAME),
            env_override: std::env::var(API_KEY_ENV).ok(),
        })
    }

    /// Store rooted at `dir`, ignoring the environment.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(KEY_FILENAME),
            env_override: None,
        }
    }

    pub fn with_env_override(mut self, value: Option<String>) -> Self {
        self.env_override = value;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The effective key and where it came from, or `None` if unset.
    pub fn load(&self) -> Result<Option<(ApiKey, KeySource)>, CredentialError> {
        if let Some(key) = self
            .env_override
            .as_deref()
            .and_then(|raw| ApiKey::new(raw).ok())
        {
            return Ok(Some((key, KeySource::Environment)));
        }
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(ApiKey::new(&content).ok().map(|k| (k, KeySource::File))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`load`](Self::load) but a missing key is an error.
    pub fn require(&self) -> Result<ApiKey, CredentialError> {
        self.load()?
            .map(|(key, _)| key)
            .ok_or(CredentialError::Missing)
    }

    pub fn save(&self, key: &ApiKey) -> Result<(), CredentialError> {
        let dir = self.path.parent().ok_or(CredentialError::NoConfigDir)?;
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(key.expose().as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        tracing::info!(path = %self.path.display(), "API key saved");
        Ok(())
    }

    /// Remove the stored key. Removing an absent key is not an error.
    pub fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
