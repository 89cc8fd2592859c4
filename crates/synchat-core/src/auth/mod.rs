//! Authentication for synchat
//!
//! Bearer token storage only - refresh policy lives with the backend's
//! login flow, not here.

pub mod credential_store;

pub use credential_store::{CredentialStore, StoredCredential};
