//! # Brewlog Common Library
//!
//! Shared code for the brewlog services:
//! - Error taxonomy
//! - Configuration loading
//! - Document Normalizer (request input → typed records)
//! - Response Serializer (stored BSON → JSON-safe values)
//! - Record Store Gateway (MongoDB / SQLite document backends)

pub mod config;
pub mod error;
pub mod normalize;
pub mod records;
pub mod store;
pub mod wire;

pub use error::{Error, Result, ValidationError};
pub use records::{Lote, Madurador, RecordKind};
pub use store::{Lookup, RecordStore};
