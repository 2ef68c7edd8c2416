use std::fs;
use std::path::{Path, PathBuf};

use palaver_core::models::UserIdentity;
use serde::{Deserialize, Serialize};

/// Client-side state that survives restarts: who we are and which chat was
/// open. The engine never reads this directly; the app restores it at
/// startup and re-selects the saved chat once the first directory snapshot
/// confirms it still exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<UserIdentity>,
    pub last_chat_id: Option<String>,
}

/// Storage for the session (persisted to a JSON file).
pub struct SessionStorage {
    path: PathBuf,
    session: Session,
}

impl SessionStorage {
    pub fn new(data_dir: &Path) -> Self {
        let path = data_dir.join("session.json");
        let session = Self::load_from_file(&path).unwrap_or_default();
        Self { path, session }
    }

    fn load_from_file(path: &Path) -> Option<Session> {
        let contents = fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn save_to_file(&self) {
        if let Ok(json) = serde_json::to_string_pretty(&self.session) {
            let _ = fs::write(&self.path, json);
        }
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.session.user.as_ref()
    }

    pub fn set_user(&mut self, user: UserIdentity) {
        self.session.user = Some(user);
        self.save_to_file();
    }

    pub fn last_chat_id(&self) -> Option<&str> {
        self.session.last_chat_id.as_deref()
    }

    pub fn set_last_chat_id(&mut self, chat_id: Option<&str>) {
        self.session.last_chat_id = chat_id.map(str::to_string);
        self.save_to_file();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_session_roundtrip() {
        let dir = tempdir().unwrap();

        {
            let mut storage = SessionStorage::new(dir.path());
            storage.set_user(UserIdentity::new("Riley"));
            storage.set_last_chat_id(Some("chat-42"));
        }

        let storage = SessionStorage::new(dir.path());
        assert_eq!(storage.user().unwrap().display_name, "Riley");
        assert_eq!(storage.last_chat_id(), Some("chat-42"));
    }

    #[test]
    fn test_clearing_last_chat() {
        let dir = tempdir().unwrap();
        let mut storage = SessionStorage::new(dir.path());
        storage.set_last_chat_id(Some("chat-1"));
        storage.set_last_chat_id(None);

        let reloaded = SessionStorage::new(dir.path());
        assert_eq!(reloaded.last_chat_id(), None);
    }

    #[test]
    fn test_corrupt_file_loads_as_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("session.json"), "{not json").unwrap();

        let storage = SessionStorage::new(dir.path());
        assert!(storage.user().is_none());
        assert!(storage.last_chat_id().is_none());
    }
}
