//! LogiTrack Platform
//!
//! Credential issuance and access control for the LogiTrack back office:
//! - Session tokens for human users (register, login, HS256 JWT)
//! - API keys for machine-to-machine integration callers
//! - Per-route authorization policies (anonymous, any user, role set, API key)
//! - Request instrumentation with an admin metrics snapshot

pub mod domain;
pub mod repository;
pub mod service;
pub mod api;
pub mod error;
pub mod seed;

pub use domain::*;
pub use error::PlatformError;
pub use seed::DevDataSeeder;
