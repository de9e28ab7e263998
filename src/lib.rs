//! A stateless, deterministic site-password derivation engine.
//!
//! Given a user's name, a master password, a site name, a site
//! counter, and a site type, this crate always derives the same
//! password. Nothing is ever persisted: the value proposition is that
//! a user remembers only one master secret and regenerates per-site
//! credentials on demand.
//!
//! See <https://masterpasswordapp.com/algorithm.html> for the
//! algorithm this crate implements.

pub mod algorithm;
pub mod catalog;
pub mod config;
pub mod error;
pub mod secret;

pub use algorithm::{derive, DerivationRequest, SiteType};
pub use catalog::{Catalog, CharacterClassCatalog, PasswordType, TemplateCatalog};
pub use error::{DerivationError, DerivationErrorKind};
pub use secret::Secret;
