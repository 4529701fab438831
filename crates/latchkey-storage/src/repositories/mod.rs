pub mod card;
pub mod credential;

pub use card::CardRegistry;
pub use credential::{AuthDecision, CredentialStore, DenialReason, LoadReport};
