//! Domain types and models

pub mod auth;
pub mod config;

pub use auth::{
    AuthGrant, AuthSession, AuthUser, NewProfile, ProfileUpdate, SignUpRequest, UserMetadata,
    UserProfile,
};
pub use config::{BackendConfig, Config, SessionConfig};
