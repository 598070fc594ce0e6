//! Schema description consumed by the marshaler
//!
//! The marshaler never decides what a schema looks like; this module provides the
//! path tree, level lookups and element metadata it reads, plus two ways to obtain
//! one: a serde definition file or inference from sample JSON.

pub mod builder;
pub mod definition;
pub mod element;
pub mod handler;

pub use builder::{infer_schema, SchemaBuilder};
pub use definition::SchemaDefinition;
pub use element::{ConvertedType, PhysicalType, Repetition, SchemaElement, TimestampUnit};
pub use handler::{Levels, PathNode, SchemaHandler, PATH_DELIMITER};
