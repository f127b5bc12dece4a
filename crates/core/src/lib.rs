//! Domain layer for the vitrine storefront backend.
//!
//! Pure types and rules only -- no I/O. The database layer (`vitrine-db`)
//! and the HTTP layer (`vitrine-api`) both build on this crate.

pub mod error;
pub mod inventory;
pub mod roles;
pub mod types;
