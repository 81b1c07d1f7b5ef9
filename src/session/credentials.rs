use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::config::{SessionConfig, MAX_TOKEN_DAYS};
use crate::error::ClientError;

pub const ACCESS_TOKEN: &str = "accessToken";
pub const REFRESH_TOKEN: &str = "refreshToken";

/// Access/refresh pair as issued by `/auth/login`, `/auth/register` and `/auth/refresh`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt credential file: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CredentialError> for ClientError {
    fn from(err: CredentialError) -> Self {
        ClientError::credentials(err.to_string())
    }
}

/// Durable home of the credential pair. Each credential carries its own
/// lifetime; an expired credential reads as absent. Both are written and
/// cleared together.
pub trait CredentialStore: Send + Sync {
    fn access_token(&self) -> Result<Option<String>, CredentialError>;

    fn refresh_token(&self) -> Result<Option<String>, CredentialError>;

    fn store(&self, pair: &CredentialPair) -> Result<(), CredentialError>;

    fn clear(&self) -> Result<(), CredentialError>;

    /// Presence check used by the route guard
    fn has_access_token(&self) -> bool {
        matches!(self.access_token(), Ok(Some(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCredential {
    value: String,
    expires_at: DateTime<Utc>,
}

impl StoredCredential {
    fn live(&self, now: DateTime<Utc>) -> Option<String> {
        (self.expires_at > now).then(|| self.value.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct CredentialRecord {
    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    access: Option<StoredCredential>,
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    refresh: Option<StoredCredential>,
}

impl CredentialRecord {
    fn issue(pair: &CredentialPair, lifetimes: &CredentialLifetimes, now: DateTime<Utc>) -> Self {
        Self {
            access: Some(StoredCredential {
                value: pair.access_token.clone(),
                expires_at: expiry(now, lifetimes.access),
            }),
            refresh: Some(StoredCredential {
                value: pair.refresh_token.clone(),
                expires_at: expiry(now, lifetimes.refresh),
            }),
        }
    }
}

// lifetimes are clamped to +/- MAX_TOKEN_DAYS so the sum cannot overflow
fn expiry(now: DateTime<Utc>, lifetime: Duration) -> DateTime<Utc> {
    let bound = Duration::days(MAX_TOKEN_DAYS);
    now + lifetime.clamp(-bound, bound)
}

/// How long each credential survives on the client
#[derive(Debug, Clone, Copy)]
pub struct CredentialLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl CredentialLifetimes {
    /// Out-of-range day counts fall back to the defaults
    pub fn from_config(config: &SessionConfig) -> Self {
        let defaults = Self::default();
        Self {
            access: lifetime_days(config.access_token_days).unwrap_or(defaults.access),
            refresh: lifetime_days(config.refresh_token_days).unwrap_or(defaults.refresh),
        }
    }
}

fn lifetime_days(days: i64) -> Option<Duration> {
    if !(1..=MAX_TOKEN_DAYS).contains(&days) {
        return None;
    }
    Duration::try_days(days)
}

impl Default for CredentialLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::days(7),
            refresh: Duration::days(30),
        }
    }
}

/// Process-local store, used by tests and short-lived embedders
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    lifetimes: CredentialLifetimes,
    record: Mutex<CredentialRecord>,
}

impl MemoryCredentialStore {
    pub fn new(lifetimes: CredentialLifetimes) -> Self {
        Self {
            lifetimes,
            record: Mutex::new(CredentialRecord::default()),
        }
    }

    pub fn with_pair(pair: &CredentialPair) -> Self {
        let store = Self::default();
        *store.record.lock().unwrap_or_else(PoisonError::into_inner) =
            CredentialRecord::issue(pair, &store.lifetimes, Utc::now());
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Result<Option<String>, CredentialError> {
        let record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(record.access.as_ref().and_then(|c| c.live(Utc::now())))
    }

    fn refresh_token(&self) -> Result<Option<String>, CredentialError> {
        let record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(record.refresh.as_ref().and_then(|c| c.live(Utc::now())))
    }

    fn store(&self, pair: &CredentialPair) -> Result<(), CredentialError> {
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        *record = CredentialRecord::issue(pair, &self.lifetimes, Utc::now());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        *record = CredentialRecord::default();
        Ok(())
    }
}

/// JSON file store (`credentials.json` in the CLI config directory)
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lifetimes: CredentialLifetimes,
    // serializes read-modify-write within this process
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>, lifetimes: CredentialLifetimes) -> Self {
        Self {
            path: path.into(),
            lifetimes,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CredentialRecord, CredentialError> {
        if !self.path.exists() {
            return Ok(CredentialRecord::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(CredentialRecord::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, record: &CredentialRecord) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn access_token(&self) -> Result<Option<String>, CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.access.and_then(|c| c.live(Utc::now())))
    }

    fn refresh_token(&self) -> Result<Option<String>, CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.refresh.and_then(|c| c.live(Utc::now())))
    }

    fn store(&self, pair: &CredentialPair) -> Result<(), CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.save(&CredentialRecord::issue(pair, &self.lifetimes, Utc::now()))
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
