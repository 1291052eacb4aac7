//! Router Module Index
//!
//! Splits the routing table by access level. Every method router in
//! `authenticated` carries the authentication layer.

/// Routes accessible to anonymous clients (read-only course access, registration).
pub mod public;

/// Routes behind HTTP Basic authentication (course writes, own profile).
pub mod authenticated;
