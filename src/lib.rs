//! Cornice: a small self-hosted image gallery backend.
//!
//! Uploads are validated, stored under a collision-resistant name,
//! downscaled in place when wider than the configured maximum, and
//! recorded in a sqlite file. The public API serves a paginated listing
//! aggregated with vote and comment tallies.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
