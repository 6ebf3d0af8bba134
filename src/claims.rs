use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ClaimsError;

/// Protocol-housekeeping claim types carried by identity tokens.
///
/// None of these belong in a session principal; of the housekeeping set only
/// `sub` is retained (as the principal's subject).
const PROTOCOL_CLAIMS: &[&str] = &[
    "iss", "aud", "exp", "iat", "nbf", "auth_time", "nonce", "at_hash", "c_hash", "azp", "amr",
    "acr", "sid", "jti",
];

/// Ordered `(type, value)` pairs extracted from a validated identity token
/// plus the userinfo response. Transient: consumed once by
/// [`ClaimsPolicy::transform`] and discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityClaims {
    claims: Vec<(String, String)>,
}

impl IdentityClaims {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, claim_type: impl Into<String>, value: impl Into<String>) {
        self.claims.push((claim_type.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.claims.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }
}

impl<T: Into<String>, V: Into<String>> FromIterator<(T, V)> for IdentityClaims {
    fn from_iter<I: IntoIterator<Item = (T, V)>>(iter: I) -> Self {
        Self {
            claims: iter
                .into_iter()
                .map(|(t, v)| (t.into(), v.into()))
                .collect(),
        }
    }
}

/// The session's identity: the subject plus the authorization-relevant
/// claims that survived transformation.
///
/// Created once at first token validation and immutable for the life of the
/// session. Retained claims are a sorted set, so equal inputs in any order
/// produce byte-identical serialized principals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPrincipal {
    pub subject: String,
    pub retained_claims: BTreeSet<(String, String)>,
}

impl SessionPrincipal {
    /// Values of a retained claim type, in sorted order.
    pub fn claim_values<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a str> {
        self.retained_claims
            .iter()
            .filter(move |(t, _)| t == claim_type)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        self.retained_claims
            .contains(&(claim_type.to_string(), value.to_string()))
    }
}

/// Reduces a full identity claim set to a [`SessionPrincipal`].
///
/// Two fixed rules, applied exactly once per session:
///
/// 1. Among protocol-housekeeping claims, only `sub` is retained (as the
///    subject); `iss`, `aud`, `exp` and the rest are dropped.
/// 2. Claims fetched from the userinfo endpoint that are not needed for
///    authorization decisions (postal address by default) are removed before
///    the principal is persisted, minimizing sensitive-data residency in
///    session storage.
///
/// The transformation is pure, order-independent and idempotent.
#[derive(Debug, Clone)]
pub struct ClaimsPolicy {
    denied: BTreeSet<String>,
    retained: Option<BTreeSet<String>>,
}

impl Default for ClaimsPolicy {
    fn default() -> Self {
        Self {
            denied: BTreeSet::from(["address".to_string()]),
            retained: None,
        }
    }
}

impl ClaimsPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a claim type to the sensitive-data denylist (default: `address`).
    #[must_use]
    pub fn deny(mut self, claim_type: impl Into<String>) -> Self {
        self.denied.insert(claim_type.into());
        self
    }

    /// Narrow retention to an explicit allowlist of claim types
    /// (e.g. `given_name`, `role`). Without an allowlist, every claim that
    /// is neither protocol housekeeping nor denylisted is retained.
    #[must_use]
    pub fn retain_only<I, T>(mut self, claim_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.retained = Some(claim_types.into_iter().map(Into::into).collect());
        self
    }

    /// Build the session principal from a validated token's claims.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError::MissingSubject`] when no `sub` claim is
    /// present.
    pub fn transform(&self, claims: &IdentityClaims) -> Result<SessionPrincipal, ClaimsError> {
        let subject = claims
            .iter()
            .find(|(t, _)| *t == "sub")
            .map(|(_, v)| v.to_string())
            .ok_or(ClaimsError::MissingSubject)?;

        let retained_claims = claims
            .iter()
            .filter(|(t, _)| *t != "sub")
            .filter(|(t, _)| !PROTOCOL_CLAIMS.contains(t))
            .filter(|(t, _)| !self.denied.contains(*t))
            .filter(|(t, _)| {
                self.retained
                    .as_ref()
                    .is_none_or(|allowed| allowed.contains(*t))
            })
            .map(|(t, v)| (t.to_string(), v.to_string()))
            .collect();

        Ok(SessionPrincipal {
            subject,
            retained_claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> IdentityClaims {
        IdentityClaims::from_iter([
            ("sub", "123"),
            ("given_name", "Ann"),
            ("address", "Main St"),
            ("aud", "client1"),
        ])
    }

    #[test]
    fn drops_housekeeping_and_sensitive_claims() {
        let principal = ClaimsPolicy::new().transform(&sample_claims()).unwrap();

        assert_eq!(principal.subject, "123");
        assert!(principal.has_claim("given_name", "Ann"));
        assert!(!principal.retained_claims.iter().any(|(t, _)| t == "address"));
        assert!(!principal.retained_claims.iter().any(|(t, _)| t == "aud"));
    }

    #[test]
    fn transform_is_idempotent() {
        let policy = ClaimsPolicy::new();
        let first = policy.transform(&sample_claims()).unwrap();
        let second = policy.transform(&sample_claims()).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn transform_is_order_independent() {
        let policy = ClaimsPolicy::new();
        let shuffled = IdentityClaims::from_iter([
            ("aud", "client1"),
            ("address", "Main St"),
            ("given_name", "Ann"),
            ("sub", "123"),
        ]);

        let a = policy.transform(&sample_claims()).unwrap();
        let b = policy.transform(&shuffled).unwrap();
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn missing_subject_is_an_error() {
        let claims = IdentityClaims::from_iter([("given_name", "Ann")]);
        assert!(matches!(
            ClaimsPolicy::new().transform(&claims),
            Err(ClaimsError::MissingSubject)
        ));
    }

    #[test]
    fn allowlist_narrows_retention() {
        let claims = IdentityClaims::from_iter([
            ("sub", "123"),
            ("given_name", "Ann"),
            ("subscriptionlevel", "PayingUser"),
            ("country", "be"),
        ]);
        let principal = ClaimsPolicy::new()
            .retain_only(["country", "subscriptionlevel"])
            .transform(&claims)
            .unwrap();

        assert!(principal.has_claim("country", "be"));
        assert!(principal.has_claim("subscriptionlevel", "PayingUser"));
        assert!(!principal.retained_claims.iter().any(|(t, _)| t == "given_name"));
    }

    #[test]
    fn custom_denylist_entries_apply() {
        let claims = IdentityClaims::from_iter([("sub", "123"), ("email", "a@b.example")]);
        let principal = ClaimsPolicy::new().deny("email").transform(&claims).unwrap();
        assert!(principal.retained_claims.is_empty());
    }

    #[test]
    fn duplicate_claim_values_are_all_retained() {
        let claims =
            IdentityClaims::from_iter([("sub", "123"), ("role", "admin"), ("role", "user")]);
        let principal = ClaimsPolicy::new().transform(&claims).unwrap();
        let roles: Vec<_> = principal.claim_values("role").collect();
        assert_eq!(roles, vec!["admin", "user"]);
    }
}
