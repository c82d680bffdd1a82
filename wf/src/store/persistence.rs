//! One JSON file per chat session

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::messages::{StoreError, StoreResponse};
use crate::domain::ChatSession;

/// Directory of `<id>.json` session files
#[derive(Debug, Clone)]
pub struct SessionFiles {
    dir: PathBuf,
}

impl SessionFiles {
    /// Open a session directory, creating it when missing
    pub fn open(dir: impl AsRef<Path>) -> StoreResponse<Self> {
        let dir = dir.as_ref().to_path_buf();
        debug!(dir = %dir.display(), "SessionFiles::open: called");
        fs::create_dir_all(&dir).map_err(|e| StoreError::Persistence(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Load every readable session. Unreadable files are skipped.
    pub fn load_all(&self) -> StoreResponse<HashMap<String, ChatSession>> {
        debug!(dir = %self.dir.display(), "load_all: called");
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::Persistence(e.to_string()))?;

        let mut sessions = HashMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let session = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| serde_json::from_str::<ChatSession>(&content).map_err(|e| e.to_string()));
            match session {
                Ok(session) => {
                    sessions.insert(session.id.clone(), session);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "load_all: skipping unreadable session"),
            }
        }

        debug!(count = sessions.len(), "load_all: loaded");
        Ok(sessions)
    }

    /// Write a session, replacing any previous copy
    pub fn save(&self, session: &ChatSession) -> StoreResponse<()> {
        debug!(id = %session.id, "save: called");
        let content = serde_json::to_string_pretty(session)?;
        let path = self.path_for(&session.id);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, content).map_err(|e| StoreError::Persistence(format!("{}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::Persistence(format!("{}: {}", path.display(), e)))
    }

    pub fn remove(&self, id: &str) -> StoreResponse<()> {
        debug!(%id, "remove: called");
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Persistence(e.to_string())),
        }
    }
}

/// Session ids double as file names
pub fn validate_id(id: &str) -> StoreResponse<()> {
    let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}
