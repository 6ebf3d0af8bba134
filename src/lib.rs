#![doc = include_str!("../README.md")]

pub mod claims;
pub mod config;
pub mod credentials;
pub mod discovery;
pub mod error;
pub mod exchange;
pub mod manager;
pub mod outbound;
pub mod registration;
pub mod store;
pub mod types;

// Re-exports for convenient access
pub use claims::{ClaimsPolicy, IdentityClaims, SessionPrincipal};
pub use config::AuthConfig;
pub use credentials::CredentialSet;
pub use discovery::{DiscoveryClient, DiscoveryDocument};
pub use error::{
    ClaimsError, ConfigError, DiscoveryError, ExchangeError, RegistrationError, RenewalError,
};
pub use exchange::{TokenExchangeClient, TokenResponse};
pub use manager::{Clock, SystemClock, TokenManager};
pub use outbound::{ApiClient, ApiClientBuilder};
pub use registration::{
    ExternalLogin, RegisteredUser, RegistrationRequest, UserRepository, register_user,
};
pub use store::{CredentialStore, MemoryCredentialStore};
pub use types::{SessionId, SubjectId};
