//! Domain Models
//!
//! Entities owned by the credential store plus the read models exposed to
//! integration callers.

pub mod user;
pub mod api_key;
pub mod role;
pub mod shipment;

pub use user::*;
pub use api_key::*;
pub use shipment::*;
