//! Entity document generator for ddl-export integration tests and benchmarks.
//!
//! Generates deterministic entity graphs with many-to-one chains,
//! many-to-many join tables and, on request, foreign key cycles.
//!
//! # Example
//!
//! ```rust
//! use entity_gen::{Generator, Scale};
//!
//! // Same seed, same document
//! let mut gen = Generator::new(42, Scale::Small);
//! let doc = gen.generate();
//!
//! let yaml = doc.to_yaml().unwrap();
//! assert!(yaml.contains("entities:"));
//! ```

pub mod generator;

pub use generator::{
    GeneratedDocument, GeneratedEntity, GeneratedField, GeneratedRelation, Generator, Scale,
};
