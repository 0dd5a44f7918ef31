//! Generate dialect-specific CREATE and DROP DDL scripts from entity metadata.
//!
//! Pipeline: [`metadata`] → [`schema`] (builder, orderer) → [`dialect`] →
//! [`format`] → [`script`] → [`export`], orchestrated by [`pipeline`].

pub mod dialect;
pub mod error;
pub mod export;
pub mod format;
pub mod metadata;
pub mod pipeline;
pub mod schema;
pub mod script;

pub use error::{DdlError, ExportError, MappingError, UnsupportedTypeError};
