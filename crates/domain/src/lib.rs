//! # Hikayat Domain
//!
//! Business domain types and models for the Hikayat Ledger auth core.
//!
//! This crate contains:
//! - Auth domain data types (AuthUser, AuthSession, UserProfile, etc.)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Hikayat crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
