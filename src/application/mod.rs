//! Application services layer.

pub mod engagement;
pub mod error;
pub mod gallery;
pub mod imaging;
pub mod ingest;
pub mod repos;
