//! Host platform adapters

pub mod activity;

pub use activity::{ActivityHandle, HostActivityBridge};
