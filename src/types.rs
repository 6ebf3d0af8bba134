use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Consumer-defined session identifier (opaque string).
///
/// Every credential-lifecycle call is keyed by a `SessionId`; it is the only
/// link between this crate and the consumer's session mechanism. The consumer
/// chooses the format (ULID, UUID, cookie value, etc.).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct SessionId(pub String);

/// Subject identifier minted at user registration (ULID format).
///
/// Immutable and unique per registered user. Issued tokens carry it as the
/// `sub` claim.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct SubjectId(pub Ulid);

impl SubjectId {
    /// Mint a fresh subject identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_from_string() {
        let id = SessionId::from("sess-abc".to_string());
        assert_eq!(id.to_string(), "sess-abc");
    }

    #[test]
    fn subject_ids_unique() {
        assert_ne!(SubjectId::generate(), SubjectId::generate());
    }

    #[test]
    fn subject_id_serde_roundtrip() {
        let id = SubjectId(Ulid::nil());
        let json = serde_json::to_string(&id).unwrap();
        let parsed: SubjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn newtypes_prevent_mixing() {
        fn takes_session_id(_: &SessionId) {}

        let session = SessionId::from("id".to_string());
        takes_session_id(&session);
        // takes_session_id(&SubjectId::generate());  // Compile error!
    }
}
