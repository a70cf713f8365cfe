//! Authentication
//!
//! - [`JwtService`]: token issue and validation
//! - [`CurrentUser`]: the authenticated caller, extracted per request
//! - [`require_role`] / [`require_self_or_admin`]: handler-level checks

pub mod extractor;
pub mod jwt;

pub use extractor::{require_role, require_self_or_admin};
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
