//! Token persistence behind the `TokenStore` capability.
//!
//! # Design
//! The pipeline reads the auth token before every request and removes it on
//! 401, but it does not care where the token lives. Hosts choose: the mobile
//! shell maps this onto its synchronous key-value storage, tests use
//! `MemoryTokenStore`, and long-lived desktop agents can persist across
//! restarts with `FileTokenStore`.
//!
//! Storage operations are deliberately infallible from the pipeline's view.
//! A broken store must not abort an in-flight request, so `FileTokenStore`
//! logs I/O errors and carries on, which matches how the platform storage
//! primitive behaves.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Key under which the session token lives in host key-value storage.
pub const TOKEN_KEY: &str = "token";

/// Read/write/remove access to the persisted session token.
///
/// Hosts that bridge this onto key-value storage keep the token under
/// [`TOKEN_KEY`], matching the slot the mobile shell already uses.
pub trait TokenStore: Send + Sync {
    /// The stored token, if any.
    fn get(&self) -> Option<String>;

    fn set(&self, token: &str);

    /// Drop the stored token. Removing an absent token is a no-op.
    fn remove(&self);
}

/// In-process store. The default for clients constructed over FFI and the
/// workhorse in tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        let guard = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone()
    }

    fn set(&self, token: &str) {
        let mut guard = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(token.to_string());
    }

    fn remove(&self) {
        let mut guard = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
    }
}

/// Token persisted as a single file on disk, surviving process restarts.
/// A missing or whitespace-only file counts as no token.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "token read failed");
                None
            }
        }
    }

    fn set(&self, token: &str) {
        if let Err(err) = fs::write(&self.path, token) {
            tracing::warn!(path = %self.path.display(), error = %err, "token write failed");
        }
    }

    fn remove(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "token remove failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(), None);

        store.set("tok-123");
        assert_eq!(store.get(), Some("tok-123".to_string()));

        store.remove();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn memory_store_remove_is_idempotent() {
        let store = MemoryTokenStore::with_token("tok-123");
        store.remove();
        store.remove();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join(TOKEN_KEY));

        assert_eq!(store.get(), None);

        store.set("tok-456");
        assert_eq!(store.get(), Some("tok-456".to_string()));

        store.remove();
        assert_eq!(store.get(), None);
        store.remove();
    }

    #[test]
    fn file_store_treats_whitespace_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_KEY);
        fs::write(&path, "  \n").unwrap();

        let store = FileTokenStore::new(path);
        assert_eq!(store.get(), None);
    }
}
