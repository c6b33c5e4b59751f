//! # Hikayat Infrastructure
//!
//! Infrastructure implementations of core auth lifecycle ports.
//!
//! This crate contains:
//! - Supabase identity gateway (HTTP)
//! - OS keychain credential storage
//! - Host activity bridge for foreground events
//! - Configuration loading (environment and files)
//!
//! ## Architecture
//! - Implements traits defined in `hikayat-core`
//! - Depends on `hikayat-domain` and `hikayat-core`
//! - Contains all "impure" code (I/O, platform APIs)

pub mod config;
pub mod platform;
pub mod storage;
pub mod supabase;

// Re-export commonly used items
pub use platform::{ActivityHandle, HostActivityBridge};
pub use storage::KeyringCredentialStore;
pub use supabase::SupabaseGateway;
