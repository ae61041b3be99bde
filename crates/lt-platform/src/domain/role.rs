//! Role names
//!
//! Roles are plain strings on the user record. These are the ones the
//! platform itself relies on.

/// Full administrative access (API keys, metrics).
pub const ADMIN: &str = "Admin";

/// Default role assigned at registration.
pub const USER: &str = "User";
