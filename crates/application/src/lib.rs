//! Tether Application - Authenticated request pipeline
//!
//! This crate contains the pipeline logic and the ports (traits) it needs
//! from the outside world. Concrete adapters live in the infrastructure
//! crate.

pub mod auth;
pub mod error;
pub mod pipeline;
pub mod ports;

pub use auth::{
    AuthenticatedClient, ExpiryCheck, LoginCredentials, MemorySessionStore, RefreshCoordinator,
    RefreshPhase, SessionExpiryNotifier, SessionService, SessionTerminator,
};
pub use error::{ApiError, ApiResult};
pub use pipeline::{Pipeline, PipelinePorts};
