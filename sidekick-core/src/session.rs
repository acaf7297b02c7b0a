//! Session credential store
//!
//! Maps an opaque session id to the GitHub access token of the user who
//! owns it. Sessions live in process memory only: they are created on a
//! successful OAuth exchange or token submission, removed on logout, and
//! lost on restart. Tokens are never refreshed; an expired token shows up
//! later as a failed remote call.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::{Error, Result};

/// Storage for session credentials
///
/// Implementations must be safe to share between concurrent request
/// handlers.
pub trait SessionStore: Send + Sync {
    /// Store a token for the session, or clear it when `token` is `None`
    /// or blank
    fn set(&self, session_id: &str, token: Option<String>);

    /// Look up the token for a session
    fn get(&self, session_id: &str) -> Option<String>;

    /// Remove a session, returning whether it existed
    fn remove(&self, session_id: &str) -> bool;

    /// Resolve the token for a session or fail with [`Error::Unauthenticated`]
    fn resolve(&self, session_id: &str) -> Result<String> {
        self.get(session_id).ok_or(Error::Unauthenticated)
    }

    /// Whether a credential is stored for the session
    fn contains(&self, session_id: &str) -> bool {
        self.get(session_id).is_some()
    }
}

/// In-memory session store guarded by a read/write lock
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    tokens: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    /// Whether no sessions are stored
    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn set(&self, session_id: &str, token: Option<String>) {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let mut tokens = self.tokens.write();
        match token {
            Some(token) => {
                debug!(session = %redact(session_id), "Storing session credential");
                tokens.insert(session_id.to_string(), token);
            }
            None => {
                debug!(session = %redact(session_id), "Clearing session credential");
                tokens.remove(session_id);
            }
        }
    }

    fn get(&self, session_id: &str) -> Option<String> {
        self.tokens.read().get(session_id).cloned()
    }

    fn remove(&self, session_id: &str) -> bool {
        self.tokens.write().remove(session_id).is_some()
    }
}

/// Generate a new opaque session id
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Shorten a session id for log output
fn redact(session_id: &str) -> String {
    let prefix: String = session_id.chars().take(6).collect();
    format!("{}…", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_resolve_unknown_session() {
        let store = MemorySessionStore::new();
        let err = store.resolve("missing").unwrap_err();
        assert!(matches!(err, Error::Unauthenticated));
    }

    #[test]
    fn test_set_then_resolve() {
        let store = MemorySessionStore::new();
        store.set("abc", Some("ghp_token".to_string()));
        assert_eq!(store.resolve("abc").unwrap(), "ghp_token");
        assert!(store.contains("abc"));
    }

    #[test]
    fn test_set_none_clears() {
        let store = MemorySessionStore::new();
        store.set("abc", Some("ghp_token".to_string()));
        store.set("abc", None);
        assert!(matches!(
            store.resolve("abc").unwrap_err(),
            Error::Unauthenticated
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_blank_token_is_no_credential() {
        let store = MemorySessionStore::new();
        store.set("abc", Some("   ".to_string()));
        assert!(!store.contains("abc"));
    }

    #[test]
    fn test_remove() {
        let store = MemorySessionStore::new();
        store.set("abc", Some("t".to_string()));
        assert!(store.remove("abc"));
        assert!(!store.remove("abc"));
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = MemorySessionStore::new();
        store.set("one", Some("t1".to_string()));
        store.set("two", Some("t2".to_string()));
        store.set("one", None);
        assert_eq!(store.resolve("two").unwrap(), "t2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_access() {
        let store = Arc::new(MemorySessionStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let id = format!("session-{}", i);
                    store.set(&id, Some(format!("token-{}", i)));
                    store.resolve(&id).unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), format!("token-{}", i));
        }
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_new_session_id_is_hex() {
        let id = new_session_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_session_id());
    }
}
