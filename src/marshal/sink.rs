//! Destination columns, created for every leaf before any record is walked

use crate::coerce::PhysicalValue;
use crate::error::{MarshalError, Result};
use crate::schema::{PathNode, PhysicalType, Repetition, SchemaElement, SchemaHandler};
use std::collections::BTreeMap;
use std::ops::Range;

/// One leaf column: values with their definition and repetition levels
///
/// The three sequences always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub path: String,
    pub max_definition_level: i16,
    pub max_repetition_level: i16,
    pub physical_type: PhysicalType,
    pub repetition: Repetition,
    pub element: SchemaElement,
    pub values: Vec<Option<PhysicalValue>>,
    pub definition_levels: Vec<i16>,
    pub repetition_levels: Vec<i16>,
}

impl Column {
    fn new(
        schema: &SchemaHandler,
        ordinal: usize,
        physical_type: PhysicalType,
        reserve: usize,
    ) -> Self {
        let element = schema.element(ordinal).clone();
        let levels = schema.levels(ordinal);
        Column {
            path: schema.path_of(ordinal).to_string(),
            max_definition_level: levels.definition,
            max_repetition_level: levels.repetition,
            physical_type,
            repetition: element.repetition,
            element,
            values: Vec::with_capacity(reserve),
            definition_levels: Vec::with_capacity(reserve),
            repetition_levels: Vec::with_capacity(reserve),
        }
    }

    fn append(&mut self, value: Option<PhysicalValue>, dl: i16, rl: i16) {
        self.values.push(value);
        self.definition_levels.push(dl);
        self.repetition_levels.push(rl);
    }

    /// Append after checking the levels against the column's maxima
    ///
    /// A value is only stored at the maximum definition level. A null sits below
    /// it, except in a required column where nothing else can mark it absent.
    pub(crate) fn try_append(
        &mut self,
        value: Option<PhysicalValue>,
        dl: i16,
        rl: i16,
    ) -> Result<()> {
        let in_range = (0..=self.max_definition_level).contains(&dl)
            && (0..=self.max_repetition_level).contains(&rl);
        if !in_range {
            return Err(MarshalError::invariant(
                &self.path,
                format!(
                    "levels d={} r={} exceed the column maxima d={} r={}",
                    dl, rl, self.max_definition_level, self.max_repetition_level
                ),
            ));
        }
        let at_max = dl == self.max_definition_level;
        match (&value, at_max) {
            (Some(_), false) => Err(MarshalError::invariant(
                &self.path,
                format!(
                    "value at d={} below the maximum definition level {}",
                    dl, self.max_definition_level
                ),
            )),
            (None, true) if self.repetition != Repetition::Required => Err(MarshalError::invariant(
                &self.path,
                format!("null at the maximum definition level {}", dl),
            )),
            _ => {
                self.append(value, dl, rl);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Number of records in the column (entries starting a new top-level row)
    pub fn row_count(&self) -> usize {
        self.repetition_levels.iter().filter(|&&rl| rl == 0).count()
    }
}

/// Marshal output: every leaf path of the schema mapped to its column
pub type ColumnMap = BTreeMap<String, Column>;

/// The columns of one batch, addressed by schema element ordinal
#[derive(Debug)]
pub(crate) struct TableSink {
    columns: Vec<Column>,
    // ordinal -> column slot, for leaves
    slots: Vec<Option<usize>>,
    // ordinal -> slots of every leaf at or below it
    descendants: Vec<Range<usize>>,
}

impl TableSink {
    pub fn new(schema: &SchemaHandler, reserve: usize) -> Self {
        let count = schema.elements().len();
        let mut columns = Vec::new();
        let mut slots = vec![None; count];

        for ordinal in 0..count {
            if !schema.is_leaf(ordinal) {
                continue;
            }
            if let Some(physical_type) = schema.element(ordinal).physical_type {
                slots[ordinal] = Some(columns.len());
                columns.push(Column::new(schema, ordinal, physical_type, reserve));
            }
        }

        // Pre-order numbering keeps each subtree's leaves in one contiguous run
        let mut descendants = vec![0..0; count];
        leaf_ranges(schema.root(), &slots, &mut 0, &mut descendants);

        TableSink {
            columns,
            slots,
            descendants,
        }
    }

    pub fn column_mut(&mut self, ordinal: usize) -> Option<&mut Column> {
        let slot = self.slots[ordinal]?;
        Some(&mut self.columns[slot])
    }

    /// Append a null to every leaf column at or below `ordinal`
    pub fn push_nulls(&mut self, ordinal: usize, dl: i16, rl: i16) -> Result<()> {
        let range = self.descendants[ordinal].clone();
        for column in &mut self.columns[range] {
            column.try_append(None, dl, rl)?;
        }
        Ok(())
    }

    pub fn finish(self) -> ColumnMap {
        self.columns
            .into_iter()
            .map(|column| (column.path.clone(), column))
            .collect()
    }
}

fn leaf_ranges(
    node: &PathNode,
    slots: &[Option<usize>],
    next: &mut usize,
    ranges: &mut [Range<usize>],
) {
    let start = *next;
    if slots[node.ordinal()].is_some() {
        *next += 1;
    }
    for child in node.children() {
        leaf_ranges(child, slots, next, ranges);
    }
    ranges[node.ordinal()] = start..*next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDefinition;

    fn schema() -> SchemaHandler {
        SchemaDefinition::root(
            "root",
            vec![
                SchemaDefinition::leaf("id", PhysicalType::Int64, Repetition::Required),
                SchemaDefinition::group(
                    "user",
                    Repetition::Optional,
                    vec![
                        SchemaDefinition::string("name", Repetition::Optional),
                        SchemaDefinition::list(
                            "emails",
                            Repetition::Optional,
                            SchemaDefinition::string("e", Repetition::Required),
                        ),
                    ],
                ),
                SchemaDefinition::leaf("score", PhysicalType::Double, Repetition::Optional),
            ],
        )
        .into_handler()
        .unwrap()
    }

    #[test]
    fn test_columns_created_for_every_leaf() {
        let schema = schema();
        let sink = TableSink::new(&schema, 8);
        let columns = sink.finish();

        let paths: Vec<&str> = columns.keys().map(String::as_str).collect();
        assert_eq!(
            paths,
            vec![
                "root/id",
                "root/score",
                "root/user/emails/list/element",
                "root/user/name",
            ]
        );

        let emails = &columns["root/user/emails/list/element"];
        assert_eq!(emails.max_definition_level, 3);
        assert_eq!(emails.max_repetition_level, 1);
        assert_eq!(emails.physical_type, PhysicalType::ByteArray);
        assert!(emails.values.capacity() >= 8);
        assert!(emails.is_empty());
    }

    #[test]
    fn test_push_nulls_reaches_only_descendants() {
        let schema = schema();
        let mut sink = TableSink::new(&schema, 0);

        let user = schema.ordinal_of("root/user").unwrap();
        sink.push_nulls(user, 0, 0).unwrap();

        let columns = sink.finish();
        assert_eq!(columns["root/user/name"].len(), 1);
        assert_eq!(columns["root/user/emails/list/element"].len(), 1);
        assert_eq!(columns["root/id"].len(), 0);
        assert_eq!(columns["root/score"].len(), 0);
    }

    #[test]
    fn test_push_nulls_on_leaf_and_root() {
        let schema = schema();
        let mut sink = TableSink::new(&schema, 0);

        sink.push_nulls(schema.ordinal_of("root/score").unwrap(), 0, 0).unwrap();
        sink.push_nulls(0, 0, 0).unwrap();

        let columns = sink.finish();
        assert_eq!(columns["root/score"].len(), 2);
        assert_eq!(columns["root/id"].len(), 1);
        assert_eq!(columns["root/score"].null_count(), 2);
    }

    #[test]
    fn test_push_nulls_rejects_levels_past_the_maximum() {
        let schema = schema();
        let mut sink = TableSink::new(&schema, 0);

        // root/score is an optional leaf: d=1 would mean the value is present
        let score = schema.ordinal_of("root/score").unwrap();
        assert!(matches!(sink.push_nulls(score, 1, 0), Err(MarshalError::Invariant { .. })));
        assert!(matches!(sink.push_nulls(score, 0, 1), Err(MarshalError::Invariant { .. })));

        // A required element has no lower level to mark a null with
        let emails = schema.ordinal_of("root/user/emails/list/element").unwrap();
        assert!(sink.push_nulls(emails, 3, 1).is_ok());
        assert!(sink.push_nulls(emails, 4, 1).is_err());
    }
}
