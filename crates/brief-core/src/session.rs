use crate::error::{BriefError, Result};
use crate::io::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SESSION_DIR: &str = ".taskbrief";
pub const SESSION_FILE: &str = "session.yaml";

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// The small record the external persistence collaborator stores between
/// runs: exactly the two persistence-eligible fields, plus a timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub owner: String,
    #[serde(default, rename = "accessToken")]
    pub access_token: String,
    #[serde(default, rename = "savedAt", skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Read a previously persisted record. Any read or parse failure is
    /// absorbed into `None`: corrupted storage yields defaults, never an
    /// error.
    pub fn load(path: &Path) -> Option<SessionRecord> {
        let data = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&data).ok()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        atomic_write(path, data.as_bytes())
    }
}

/// Default location of the persisted session record.
pub fn default_session_path() -> Result<PathBuf> {
    let home = home::home_dir().ok_or(BriefError::HomeNotFound)?;
    Ok(home.join(SESSION_DIR).join(SESSION_FILE))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
