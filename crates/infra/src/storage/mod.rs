//! Secure storage adapters

pub mod secure;

pub use secure::KeyringCredentialStore;
