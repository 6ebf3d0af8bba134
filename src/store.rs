use std::collections::HashMap;
use std::future::Future;

use tokio::sync::RwLock;

use crate::credentials::CredentialSet;
use crate::error::BoxError;
use crate::types::SessionId;

/// Consumer-provided persistence for a session's credential set.
///
/// The backing mechanism (encrypted cookie, server-side session, database)
/// is the consumer's choice. Two requirements:
///
/// - `replace` must swap the whole [`CredentialSet`] atomically with respect
///   to concurrent `get` calls — a reader must never observe an access token
///   from one exchange paired with a refresh token from another.
/// - `get` must return the most recently replaced set.
///
/// # Example
///
/// ```rust,ignore
/// impl CredentialStore for MyAppState {
///     async fn get(&self, session_id: &SessionId) -> Result<Option<CredentialSet>, BoxError> {
///         self.db.load_credentials(session_id).await
///     }
///
///     async fn replace(&self, session_id: &SessionId, credentials: CredentialSet) -> Result<(), BoxError> {
///         self.db.store_credentials(session_id, &credentials).await
///     }
/// }
/// ```
pub trait CredentialStore: Send + Sync + 'static {
    /// Read the current credential set for a session, if any.
    fn get(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<Option<CredentialSet>, BoxError>> + Send;

    /// Atomically replace the session's credential set as a whole.
    fn replace(
        &self,
        session_id: &SessionId,
        credentials: CredentialSet,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;

    /// Remove the session's credentials (sign-out).
    fn remove(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// In-process credential store for development and tests.
///
/// Replacement happens under a write lock, so readers see either the old or
/// the new set, never a mixture.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    sessions: RwLock<HashMap<SessionId, CredentialSet>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed credentials for a session (sign-in).
    pub async fn insert(&self, session_id: SessionId, credentials: CredentialSet) {
        self.sessions.write().await.insert(session_id, credentials);
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, session_id: &SessionId) -> Result<Option<CredentialSet>, BoxError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn replace(
        &self,
        session_id: &SessionId,
        credentials: CredentialSet,
    ) -> Result<(), BoxError> {
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), credentials);
        Ok(())
    }

    async fn remove(&self, session_id: &SessionId) -> Result<(), BoxError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionId {
        SessionId::from("sess-1".to_string())
    }

    #[tokio::test]
    async fn get_returns_latest_replacement() {
        let store = MemoryCredentialStore::new();
        let id = session();
        store
            .insert(id.clone(), CredentialSet::new("tok1", Some("ref1".into()), None))
            .await;

        store
            .replace(&id, CredentialSet::new("tok2", Some("ref2".into()), None))
            .await
            .unwrap();

        let current = store.get(&id).await.unwrap().unwrap();
        assert_eq!(current.access_token, "tok2");
        assert_eq!(current.refresh_token.as_deref(), Some("ref2"));
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let store = MemoryCredentialStore::new();
        assert!(store.get(&session()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_clears_credentials() {
        let store = MemoryCredentialStore::new();
        let id = session();
        store
            .insert(id.clone(), CredentialSet::new("tok", None, None))
            .await;
        store.remove(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
    }
}
