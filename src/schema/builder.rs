//! Columnar schema inference with a streaming accumulator
//!
//! Instead of inferring a schema per sample and merging, the builder accumulates
//! type counts and property presence, and produces the final `SchemaDefinition`
//! only once at the end.

use crate::schema::definition::{escape_field_name, SchemaDefinition, LIST_ELEMENT};
use crate::schema::element::{ConvertedType, PhysicalType, Repetition};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Type identifier for JSON values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(n) => {
                // Unsigned values past i64::MAX have no INT64 representation
                if n.is_i64() {
                    JsonType::Integer
                } else {
                    JsonType::Number
                }
            }
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }
}

/// Accumulates the items of every array seen at one position
#[derive(Debug)]
struct ArrayBuilder {
    items_builder: Box<SchemaBuilder>,
}

impl ArrayBuilder {
    fn new() -> Self {
        ArrayBuilder {
            items_builder: Box::new(SchemaBuilder::new()),
        }
    }

    fn add_array(&mut self, arr: &[Value]) {
        for item in arr {
            self.items_builder.add_value(item);
        }
    }

    fn build(self, name: &str, repetition: Repetition) -> SchemaDefinition {
        let element = if self.items_builder.sample_count > 0 {
            self.items_builder.build_field(LIST_ELEMENT, true)
        } else {
            // Only empty arrays were seen
            SchemaDefinition::string(LIST_ELEMENT, Repetition::Optional)
        };
        SchemaDefinition::list(name, repetition, element)
    }
}

/// Accumulates properties of every object seen at one position
#[derive(Debug)]
struct ObjectBuilder {
    // Sorted so the inferred column order is stable
    properties: BTreeMap<String, SchemaBuilder>,
    property_appearances: Vec<HashSet<String>>,
}

impl ObjectBuilder {
    fn new() -> Self {
        ObjectBuilder {
            properties: BTreeMap::new(),
            property_appearances: Vec::new(),
        }
    }

    fn add_object(&mut self, obj: &Map<String, Value>) {
        let mut current_keys = HashSet::new();

        for (key, value) in obj.iter() {
            current_keys.insert(key.clone());
            self.properties
                .entry(key.clone())
                .or_insert_with(SchemaBuilder::new)
                .add_value(value);
        }

        self.property_appearances.push(current_keys);
    }

    fn build_fields(self) -> Vec<SchemaDefinition> {
        let appearances = self.property_appearances;
        self.properties
            .into_iter()
            .map(|(key, builder)| {
                let always_present = appearances.iter().all(|seen| seen.contains(&key));
                let nullable = !always_present || builder.saw_null();
                builder.build_field(&escape_field_name(&key), nullable)
            })
            .collect()
    }
}

/// Main schema builder that accumulates statistics
#[derive(Debug)]
pub struct SchemaBuilder {
    type_counts: HashMap<JsonType, usize>,
    sample_count: usize,
    array_builder: Option<ArrayBuilder>,
    object_builder: Option<ObjectBuilder>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        SchemaBuilder {
            type_counts: HashMap::new(),
            sample_count: 0,
            array_builder: None,
            object_builder: None,
        }
    }

    /// Add a value to the builder, accumulating statistics
    pub fn add_value(&mut self, value: &Value) {
        self.sample_count += 1;
        let json_type = JsonType::from_value(value);
        *self.type_counts.entry(json_type).or_insert(0) += 1;

        match value {
            Value::Array(arr) => {
                let builder = self.array_builder.get_or_insert_with(ArrayBuilder::new);
                builder.add_array(arr);
            }
            Value::Object(obj) => {
                let builder = self.object_builder.get_or_insert_with(ObjectBuilder::new);
                builder.add_object(obj);
            }
            _ => {}
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Build the schema of the samples seen so far
    ///
    /// Object samples become the root group's fields; anything else is stored
    /// under a single `value` field.
    pub fn build(self, root_name: &str) -> SchemaDefinition {
        let non_null = self.non_null_types();
        if non_null.len() == 1 && non_null.contains(&JsonType::Object) {
            if let Some(builder) = self.object_builder {
                let fields = builder.build_fields();
                if !fields.is_empty() {
                    return SchemaDefinition::root(root_name, fields);
                }
            }
            return SchemaDefinition::root(
                root_name,
                vec![SchemaDefinition::leaf("value", PhysicalType::ByteArray, Repetition::Optional)
                    .with_converted_type(ConvertedType::Json)],
            );
        }

        let nullable = self.saw_null() || self.sample_count == 0;
        SchemaDefinition::root(root_name, vec![self.build_field("value", nullable)])
    }

    fn saw_null(&self) -> bool {
        self.type_counts.contains_key(&JsonType::Null)
    }

    fn non_null_types(&self) -> HashSet<JsonType> {
        self.type_counts
            .keys()
            .copied()
            .filter(|&t| t != JsonType::Null)
            .collect()
    }

    /// Build the definition of one field from the accumulated statistics
    fn build_field(self, name: &str, nullable: bool) -> SchemaDefinition {
        let repetition = if nullable {
            Repetition::Optional
        } else {
            Repetition::Required
        };

        let non_null = self.non_null_types();
        let has = |t: JsonType| non_null.contains(&t);

        match non_null.len() {
            0 => SchemaDefinition::string(name, Repetition::Optional),
            1 if has(JsonType::Boolean) => {
                SchemaDefinition::leaf(name, PhysicalType::Boolean, repetition)
            }
            1 if has(JsonType::Integer) => {
                SchemaDefinition::leaf(name, PhysicalType::Int64, repetition)
            }
            1 if has(JsonType::Number) => {
                SchemaDefinition::leaf(name, PhysicalType::Double, repetition)
            }
            2 if has(JsonType::Integer) && has(JsonType::Number) => {
                SchemaDefinition::leaf(name, PhysicalType::Double, repetition)
            }
            1 if has(JsonType::String) => SchemaDefinition::string(name, repetition),
            // Lists are always optional, so an absent list and an empty one stay apart
            1 if has(JsonType::Array) => match self.array_builder {
                Some(builder) => builder.build(name, Repetition::Optional),
                None => json_leaf(name, repetition),
            },
            1 if has(JsonType::Object) => {
                let fields = self
                    .object_builder
                    .map(ObjectBuilder::build_fields)
                    .unwrap_or_default();
                if fields.is_empty() {
                    json_leaf(name, repetition)
                } else {
                    SchemaDefinition::group(name, repetition, fields)
                }
            }
            // Conflicting kinds are kept as JSON text
            _ => json_leaf(name, repetition),
        }
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn json_leaf(name: &str, repetition: Repetition) -> SchemaDefinition {
    SchemaDefinition::leaf(name, PhysicalType::ByteArray, repetition)
        .with_converted_type(ConvertedType::Json)
}

/// Infer a columnar schema from multiple examples using the streaming builder
pub fn infer_schema(examples: &[Value], root_name: &str) -> SchemaDefinition {
    let mut builder = SchemaBuilder::new();

    for example in examples {
        builder.add_value(example);
    }

    builder.build(root_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field<'a>(schema: &'a SchemaDefinition, name: &str) -> &'a SchemaDefinition {
        schema.fields.iter().find(|f| f.name == name).unwrap()
    }

    #[test]
    fn test_simple_object() {
        let schema = infer_schema(
            &[json!({"name": "Alice", "age": 30}), json!({"name": "Bob", "age": 25})],
            "root",
        );

        assert_eq!(schema.name, "root");
        assert_eq!(schema.fields.len(), 2);

        let age = field(&schema, "age");
        assert_eq!(age.physical_type, Some(PhysicalType::Int64));
        assert_eq!(age.repetition, Repetition::Required);

        let name = field(&schema, "name");
        assert_eq!(name.converted_type, Some(ConvertedType::Utf8));
    }

    #[test]
    fn test_optional_fields() {
        let schema = infer_schema(
            &[
                json!({"name": "Alice", "age": 30}),
                json!({"name": "Bob", "age": null}),
                json!({"name": "Eve"}),
            ],
            "root",
        );

        assert_eq!(field(&schema, "name").repetition, Repetition::Required);
        assert_eq!(field(&schema, "age").repetition, Repetition::Optional);
    }

    #[test]
    fn test_mixed_numbers_widen() {
        let schema = infer_schema(&[json!({"x": 1}), json!({"x": 1.5})], "root");
        assert_eq!(field(&schema, "x").physical_type, Some(PhysicalType::Double));
    }

    #[test]
    fn test_large_unsigned_widens_to_double() {
        let schema = infer_schema(&[json!({"x": u64::MAX})], "root");
        assert_eq!(field(&schema, "x").physical_type, Some(PhysicalType::Double));

        let schema = infer_schema(&[json!({"x": 1}), json!({"x": u64::MAX})], "root");
        assert_eq!(field(&schema, "x").physical_type, Some(PhysicalType::Double));
    }

    #[test]
    fn test_keys_with_path_delimiter_are_escaped() {
        let schema = infer_schema(&[json!({"a/b": 1, "a": {"b": 2}})], "root");
        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "a%2Fb"]);

        let handler = schema.into_handler().unwrap();
        let leaves: Vec<&str> = handler.leaf_paths().collect();
        assert_eq!(leaves, vec!["root/a/b", "root/a%2Fb"]);
    }

    #[test]
    fn test_conflicting_kinds_become_json() {
        let schema = infer_schema(&[json!({"x": 1}), json!({"x": "one"})], "root");
        assert_eq!(field(&schema, "x").converted_type, Some(ConvertedType::Json));
    }

    #[test]
    fn test_array_of_objects() {
        let schema = infer_schema(
            &[json!({"posts": [{"id": 1, "title": "a"}, {"id": 2}]})],
            "root",
        );

        let posts = field(&schema, "posts");
        assert!(posts.converted_type == Some(ConvertedType::List));
        assert_eq!(posts.repetition, Repetition::Optional);
        let element = &posts.fields[0].fields[0];
        assert_eq!(element.name, "element");
        assert_eq!(element.repetition, Repetition::Optional);
        assert_eq!(field(element, "id").repetition, Repetition::Required);
        assert_eq!(field(element, "title").repetition, Repetition::Optional);

        // posts, list, element and title each add one level
        let handler = schema.into_handler().unwrap();
        assert_eq!(
            handler.max_definition_level("root/posts/list/element/title").unwrap(),
            4
        );
        assert_eq!(handler.max_definition_level("root/posts/list/element/id").unwrap(), 3);
    }

    #[test]
    fn test_empty_arrays_only() {
        let schema = infer_schema(&[json!({"tags": []})], "root");
        let element = &field(&schema, "tags").fields[0].fields[0];
        assert_eq!(element.repetition, Repetition::Optional);
        assert_eq!(element.converted_type, Some(ConvertedType::Utf8));
    }

    #[test]
    fn test_scalar_samples() {
        let schema = infer_schema(&[json!(1), json!(2)], "root");
        assert_eq!(schema.fields.len(), 1);
        assert_eq!(schema.fields[0].name, "value");
        assert_eq!(schema.fields[0].repetition, Repetition::Required);
    }
}
