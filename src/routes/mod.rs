//! Router Module Index
//!
//! Splits the API by access level. The admin guard is applied to the whole admin router
//! as a `route_layer`, so no admin endpoint can be registered without it.

/// Routes open to any client: health, bundle creation, public bundle reads.
pub mod public;

/// Routes that require `Authorization: Bearer <adminToken>` for the bundle in the path.
pub mod admin;
