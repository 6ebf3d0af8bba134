//! Identity provisioning: turning a local registration form or an
//! external-login callback into a durable user record with claims.
//!
//! This path is independent of the token lifecycle — nothing in
//! [`manager`](crate::manager) depends on it.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{BoxError, RegistrationError};
use crate::types::SubjectId;

/// A login at an external identity provider, linked to a local user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLogin {
    pub provider: String,
    pub provider_user_id: String,
}

/// Input to [`register_user`].
///
/// `external_login` is set when provisioning a user who arrived via an
/// external provider; such users authenticate through that provider and the
/// local secret is unused.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub username: String,
    pub secret: String,
    pub claims: Vec<(String, String)>,
    pub external_login: Option<ExternalLogin>,
}

/// A durable user record. Created once at registration; the token-lifecycle
/// core never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub subject_id: SubjectId,
    pub username: String,
    pub credential_secret: String,
    pub is_active: bool,
    pub claims: Vec<(String, String)>,
    pub external_logins: Vec<ExternalLogin>,
}

/// Consumer-provided user persistence.
///
/// # Example
///
/// ```rust,ignore
/// impl UserRepository for MyAppState {
///     async fn find_by_username(&self, username: &str) -> Result<Option<RegisteredUser>, BoxError> {
///         self.db.find_user(username).await
///     }
///
///     async fn add_user(&self, user: RegisteredUser) -> Result<(), BoxError> {
///         self.db.insert_user(&user).await
///     }
/// }
/// ```
pub trait UserRepository: Send + Sync + 'static {
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<RegisteredUser>, BoxError>> + Send;

    /// Insert the user record.
    ///
    /// The insert must be atomic and must fail when the username already
    /// exists (e.g. a unique index). [`register_user`] pre-checks with
    /// [`find_by_username`](Self::find_by_username) for a friendly error,
    /// but under concurrency two registrations can both pass that check —
    /// this method is the uniqueness guarantee of last resort.
    fn add_user(
        &self,
        user: RegisteredUser,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Provision a user: mint a unique subject id, mark the user active, attach
/// the claims and (for external provisioning) the provider link, and persist
/// the record.
///
/// # Errors
///
/// Returns [`RegistrationError::DuplicateUsername`] when the username is
/// taken, [`RegistrationError::EmptyUsername`] for a blank username, and
/// [`RegistrationError::Repository`] when persistence fails.
pub async fn register_user<R: UserRepository>(
    repository: &R,
    request: RegistrationRequest,
) -> Result<RegisteredUser, RegistrationError> {
    if request.username.trim().is_empty() {
        return Err(RegistrationError::EmptyUsername);
    }

    let existing = repository
        .find_by_username(&request.username)
        .await
        .map_err(|e| RegistrationError::Repository(e.to_string()))?;
    if existing.is_some() {
        return Err(RegistrationError::DuplicateUsername(request.username));
    }

    let user = RegisteredUser {
        subject_id: SubjectId::generate(),
        username: request.username,
        credential_secret: request.secret,
        is_active: true,
        claims: request.claims,
        external_logins: request.external_login.into_iter().collect(),
    };

    repository
        .add_user(user.clone())
        .await
        .map_err(|e| RegistrationError::Repository(e.to_string()))?;

    tracing::info!(subject_id = %user.subject_id, username = %user.username, "user registered");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct MemoryUserRepository {
        users: RwLock<HashMap<String, RegisteredUser>>,
    }

    impl UserRepository for MemoryUserRepository {
        async fn find_by_username(
            &self,
            username: &str,
        ) -> Result<Option<RegisteredUser>, BoxError> {
            Ok(self.users.read().await.get(username).cloned())
        }

        async fn add_user(&self, user: RegisteredUser) -> Result<(), BoxError> {
            let mut users = self.users.write().await;
            if users.contains_key(&user.username) {
                return Err(format!("username '{}' already exists", user.username).into());
            }
            users.insert(user.username.clone(), user);
            Ok(())
        }
    }

    /// Simulates the race window where two registrations both pass the
    /// pre-flight lookup: `find_by_username` never sees the other insert.
    #[derive(Default)]
    struct BlindUserRepository {
        inner: MemoryUserRepository,
    }

    impl UserRepository for BlindUserRepository {
        async fn find_by_username(
            &self,
            _username: &str,
        ) -> Result<Option<RegisteredUser>, BoxError> {
            Ok(None)
        }

        async fn add_user(&self, user: RegisteredUser) -> Result<(), BoxError> {
            self.inner.add_user(user).await
        }
    }

    fn local_request(username: &str) -> RegistrationRequest {
        RegistrationRequest {
            username: username.to_string(),
            secret: "hunter2".to_string(),
            claims: vec![
                ("given_name".into(), "Ann".into()),
                ("country".into(), "be".into()),
                ("subscriptionlevel".into(), "FreeUser".into()),
            ],
            external_login: None,
        }
    }

    #[tokio::test]
    async fn local_registration_creates_active_user_with_claims() {
        let repo = MemoryUserRepository::default();
        let user = register_user(&repo, local_request("ann")).await.unwrap();

        assert!(user.is_active);
        assert!(user.external_logins.is_empty());
        assert!(user.claims.contains(&("country".into(), "be".into())));
        assert!(repo.find_by_username("ann").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn external_provisioning_records_provider_link() {
        let repo = MemoryUserRepository::default();
        let mut request = local_request("bob");
        request.external_login = Some(ExternalLogin {
            provider: "Facebook".into(),
            provider_user_id: "fb-42".into(),
        });

        let user = register_user(&repo, request).await.unwrap();
        assert_eq!(user.external_logins.len(), 1);
        assert_eq!(user.external_logins[0].provider, "Facebook");
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let repo = MemoryUserRepository::default();
        register_user(&repo, local_request("ann")).await.unwrap();

        let result = register_user(&repo, local_request("ann")).await;
        assert!(matches!(
            result,
            Err(RegistrationError::DuplicateUsername(u)) if u == "ann"
        ));
    }

    #[tokio::test]
    async fn empty_username_is_rejected() {
        let repo = MemoryUserRepository::default();
        let result = register_user(&repo, local_request("  ")).await;
        assert!(matches!(result, Err(RegistrationError::EmptyUsername)));
    }

    #[tokio::test]
    async fn racing_duplicate_is_caught_by_the_repository() {
        let repo = BlindUserRepository::default();
        register_user(&repo, local_request("ann")).await.unwrap();

        // The pre-flight lookup misses the first insert; the repository's
        // atomic add must still reject the duplicate.
        let result = register_user(&repo, local_request("ann")).await;
        assert!(matches!(result, Err(RegistrationError::Repository(_))));
        assert!(repo.inner.find_by_username("ann").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn subject_ids_are_unique_per_user() {
        let repo = MemoryUserRepository::default();
        let a = register_user(&repo, local_request("ann")).await.unwrap();
        let b = register_user(&repo, local_request("bob")).await.unwrap();
        assert_ne!(a.subject_id, b.subject_id);
    }
}
