//! Catalog REST client.
//!
//! The catalog lives in a managed datastore behind a row-level-secured REST
//! surface. This crate covers the two calls the ingestion pipeline makes:
//! - slug existence check (an empty result set is a normal negative)
//! - ring row insertion

pub mod client;
pub mod error;

pub use client::{CatalogClient, CatalogConfig};
pub use error::{CatalogError, CatalogResult};
