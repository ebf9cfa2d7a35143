use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClientError;

/// File name for the persisted session inside the config directory.
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
}

/// Serialized session snapshot. Invariant: `is_authenticated` is true
/// exactly when `token` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub user: Option<SessionUser>,
    pub token: Option<String>,
    pub is_authenticated: bool,
}

/// Durable storage behind the session store. Kept as a trait so the store
/// logic stays independent of where the session lands on disk.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<SessionState>, ClientError>;
    fn save(&self, state: &SessionState) -> Result<(), ClientError>;
}

/// Persists the session as pretty JSON under the CLI config directory,
/// so a new process does not force re-login.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: config_dir.into().join(SESSION_FILE),
        }
    }

    pub fn from_config() -> Self {
        Self::new(crate::config::config().storage.config_dir.clone())
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<SessionState>, ClientError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let state: SessionState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    fn save(&self, state: &SessionState) -> Result<(), ClientError> {
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// In-memory storage for embedding the library without a config directory.
#[derive(Default)]
pub struct MemorySessionStorage {
    state: Mutex<Option<SessionState>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<SessionState>, ClientError> {
        Ok(self.state.lock().expect("session storage lock").clone())
    }

    fn save(&self, state: &SessionState) -> Result<(), ClientError> {
        *self.state.lock().expect("session storage lock") = Some(state.clone());
        Ok(())
    }
}

/// Single authoritative record of who is logged in and with what credential.
///
/// Every mutation is one atomic write under the lock and is persisted to the
/// backing storage before the call returns. No expiry is tracked here: a
/// stale token looks valid until the backend rejects it.
pub struct SessionStore {
    state: RwLock<SessionState>,
    storage: Box<dyn SessionStorage>,
}

impl SessionStore {
    /// Open the store, restoring any previously persisted session.
    /// A corrupt or unreadable session file degrades to logged-out.
    pub fn open(storage: impl SessionStorage + 'static) -> Self {
        let state = match storage.load() {
            Ok(Some(state)) => state,
            Ok(None) => SessionState::default(),
            Err(e) => {
                tracing::warn!("failed to restore session, starting logged out: {e}");
                SessionState::default()
            }
        };

        Self {
            state: RwLock::new(state),
            storage: Box::new(storage),
        }
    }

    /// Unconditionally overwrite the session with a token the backend has
    /// already accepted. No token format validation happens here.
    pub fn login(
        &self,
        token: impl Into<String>,
        username: impl Into<String>,
        user_id: Uuid,
    ) -> Result<(), ClientError> {
        let state = SessionState {
            user: Some(SessionUser {
                id: user_id,
                username: username.into(),
            }),
            token: Some(token.into()),
            is_authenticated: true,
        };

        *self.state.write().expect("session lock") = state.clone();
        self.storage.save(&state)
    }

    /// Clear all session fields. Idempotent.
    pub fn logout(&self) -> Result<(), ClientError> {
        let state = SessionState::default();
        *self.state.write().expect("session lock") = state.clone();
        self.storage.save(&state)
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().expect("session lock").clone()
    }

    /// Current token, read at the moment of the call.
    pub fn token(&self) -> Option<String> {
        self.state.read().expect("session lock").token.clone()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.state.read().expect("session lock").user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().expect("session lock").is_authenticated
    }
}
