//! Tether Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports defined in
//! the application layer, plus settings loading.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{MemoryNavigator, ReqwestTransport, SystemClock, TracingNotifier};
pub use self::config::{SettingsError, load_settings, session_dir};
pub use persistence::FileSessionStore;
