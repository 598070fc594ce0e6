//! # Furnace Marshal - Record Shredding Toolkit
//!
//! Converts batches of nested, runtime-typed records into columnar form: for every
//! leaf path of a schema, the sequence of values together with their definition
//! and repetition levels.
//!
//! ## Modules
//!
//! - **marshal**: The traversal engine producing one `Column` per leaf path
//! - **schema**: Schema elements, path/level lookups and schema inference from JSON
//! - **json**: Schema-guided decoding of JSON documents into records
//! - **coerce**: Conversion of scalars to a column's physical type
//!
//! ## Quick Start
//!
//! ```rust
//! use furnace_marshal::schema::{PhysicalType, Repetition, SchemaDefinition};
//! use furnace_marshal::{marshal, Value};
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = SchemaDefinition::root(
//!     "root",
//!     vec![
//!         SchemaDefinition::leaf("id", PhysicalType::Int64, Repetition::Required),
//!         SchemaDefinition::list(
//!             "tags",
//!             Repetition::Optional,
//!             SchemaDefinition::string("tag", Repetition::Optional),
//!         ),
//!     ],
//! )
//! .into_handler()?;
//!
//! let records = vec![Value::record([
//!     ("id", Value::Int64(1)),
//!     ("tags", Value::some(Value::List(vec![Value::some("a".into()), Value::none()]))),
//! ])];
//!
//! let columns = marshal(&records, &schema)?;
//! let tags = &columns["root/tags/list/element"];
//! assert_eq!(tags.definition_levels, vec![3, 2]);
//! assert_eq!(tags.repetition_levels, vec![0, 1]);
//! # Ok(())
//! # }
//! ```
//!
//! ### JSON Input
//!
//! ```rust
//! use furnace_marshal::{infer_schema, JsonDecoder};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let examples = vec![json!({"name": "Alice", "age": 30}), json!({"name": "Bob"})];
//! let schema = infer_schema(&examples, "root").into_handler()?;
//!
//! let records = JsonDecoder::new(&schema).decode_all(&examples)?;
//! let columns = furnace_marshal::marshal(&records, &schema)?;
//! assert_eq!(columns["root/age"].null_count(), 1);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::io::BufRead;

pub mod coerce;
pub mod error;
pub mod json;
pub mod marshal;
pub mod schema;
pub mod types;

// Re-export commonly used types for convenience
pub use coerce::PhysicalValue;
pub use error::{MarshalError, SchemaError};
pub use json::JsonDecoder;
pub use marshal::{marshal, Column, ColumnMap, ColumnWriter, Marshaler, SingleWriter};
pub use schema::{infer_schema, SchemaBuilder, SchemaDefinition, SchemaHandler};
pub use types::{MarshalConfig, Value};

/// Main entry point: marshal a newline-delimited JSON stream into columns
pub fn marshal_json<R: BufRead>(
    reader: R,
    schema: &SchemaHandler,
    config: MarshalConfig,
) -> Result<ColumnMap> {
    let decoder = JsonDecoder::new(schema);
    let mut records = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let document: JsonValue = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse JSON on line {}", number + 1))?;
        records.push(decoder.decode(&document)?);
    }

    Ok(Marshaler::new(config).marshal(&records, schema)?)
}
