//! Authenticated request pipeline.
//!
//! This module provides:
//! - In-memory session storage
//! - The authenticated client (request and response interception)
//! - Single-flight token refresh with request queuing
//! - Session termination, login/logout and the expiry notifier

mod client;
mod coordinator;
mod expiry;
mod memory_store;
mod service;
mod terminator;

pub use client::AuthenticatedClient;
pub use coordinator::{RefreshCoordinator, RefreshPhase};
pub use expiry::{ExpiryCheck, SESSION_EXTENDED_MESSAGE, SessionExpiryNotifier};
pub use memory_store::MemorySessionStore;
pub use service::{LoginCredentials, SessionService};
pub use terminator::{SESSION_EXPIRED_MESSAGE, SessionTerminator};
