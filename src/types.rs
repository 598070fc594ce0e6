use serde::{Deserialize, Serialize};

/// A runtime-typed record value
///
/// The variants mirror the shapes a record graph can take: wrappers (`Optional`,
/// `Dynamic`), aggregates (`Struct`, `Map`, `List`) and terminal scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent or invalid value
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    /// Raw byte sequence, always stored as a single byte-string value
    Bytes(Vec<u8>),
    /// Enumerated scalar; `name` is its canonical string rendering
    Enum { number: i32, name: String },
    /// Timestamp aggregate (seconds and nanoseconds since the Unix epoch)
    Timestamp { seconds: i64, nanos: i32 },
    /// Nullable reference: presence adds one definition level
    Optional(Option<Box<Value>>),
    /// Sum-typed wrapper: a transparent proxy to whatever it holds
    Dynamic(Option<Box<Value>>),
    /// Named fields in declaration order
    Struct(Vec<(String, Value)>),
    /// Ordered map entries
    Map(Vec<(Value, Value)>),
    /// Ordered sequence
    List(Vec<Value>),
}

impl Value {
    pub fn some(value: Value) -> Self {
        Value::Optional(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        Value::Optional(None)
    }

    pub fn dynamic(value: Value) -> Self {
        Value::Dynamic(Some(Box::new(value)))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Build a struct value from `(name, value)` pairs
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a map value keyed by strings
    pub fn string_map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::String(k.into()), v))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the runtime kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt64(_) => "uint64",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum { .. } => "enum",
            Value::Timestamp { .. } => "timestamp",
            Value::Optional(_) => "optional",
            Value::Dynamic(_) => "dynamic",
            Value::Struct(_) => "struct",
            Value::Map(_) => "map",
            Value::List(_) => "list",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

/// Configuration for the marshaling process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarshalConfig {
    /// Node slots allocated up front; the pool grows past this on demand
    pub pool_capacity: usize,

    /// Initial capacity of the traversal stack
    pub stack_capacity: usize,

    /// Reserve one entry per record in every column before traversal
    pub presize_columns: bool,
}

impl Default for MarshalConfig {
    fn default() -> Self {
        MarshalConfig {
            pool_capacity: 64,
            stack_capacity: 100,
            presize_columns: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Value::some(1.into()), Value::Optional(Some(Box::new(Value::Int32(1)))));
        assert_eq!(Value::none(), Value::Optional(None));

        let rec = Value::record([("a", Value::from("x")), ("b", Value::from(2i64))]);
        let Value::Struct(fields) = rec else {
            panic!("Expected struct");
        };
        assert_eq!(fields[0].0, "a");
        assert_eq!(fields[1].1, Value::Int64(2));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Null.kind(), "null");
        assert_eq!(Value::dynamic(Value::Bool(true)).kind(), "dynamic");
        assert_eq!(Value::string_map([("k", Value::Null)]).kind(), "map");
    }
}
