//! Tether Domain - Core types
//!
//! This crate defines the domain model of the authenticated request
//! pipeline: tokens, sessions, requests, responses and settings.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod request;
pub mod response;
pub mod settings;

pub use auth::{
    AuthError, SessionRecord, SessionStatus, TokenBundle, UserProfile, login_payload,
    token_preview,
};
pub use error::{DomainError, DomainResult};
pub use request::{ApiRequest, Headers, HttpMethod};
pub use response::ApiResponse;
pub use settings::PipelineSettings;
