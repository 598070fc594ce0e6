//! Record-to-column marshaling
//!
//! Walks a batch of runtime-typed records against a schema and produces, for every
//! leaf path, the column of values with their definition and repetition levels.
//!
//! ## How a batch is processed
//!
//! Columns for all leaves are created up front. Each record is then walked
//! depth-first with an explicit stack: wrappers and aggregates are expanded by a
//! [`dispatch`] variant, scalars are coerced and appended to their column, and an
//! expansion that yields nothing (nil, empty list, empty map) appends one null to
//! every column below it so that all columns stay aligned per record.

mod dispatch;
mod leaf;
mod pool;
pub mod sink;
pub mod writer;

pub use sink::{Column, ColumnMap};
pub use writer::{ColumnWriter, SingleWriter};

use crate::error::Result;
use crate::schema::SchemaHandler;
use crate::types::{MarshalConfig, Value};
use dispatch::{classify, Step, NULL_VALUE};
use pool::{Node, NodePool};
use sink::TableSink;
use tracing::{debug, trace};

/// Converts batches of records into leaf columns
#[derive(Debug, Clone, Default)]
pub struct Marshaler {
    config: MarshalConfig,
}

impl Marshaler {
    pub fn new(config: MarshalConfig) -> Self {
        Marshaler { config }
    }

    pub fn config(&self) -> &MarshalConfig {
        &self.config
    }

    /// Marshal `records` into one column per leaf path of `schema`
    ///
    /// Any coercion failure or shape mismatch aborts the whole batch.
    pub fn marshal(&self, records: &[Value], schema: &SchemaHandler) -> Result<ColumnMap> {
        let reserve = if self.config.presize_columns {
            records.len()
        } else {
            0
        };
        let mut sink = TableSink::new(schema, reserve);
        let mut pool = NodePool::with_capacity(self.config.pool_capacity);
        let mut stack = Vec::with_capacity(self.config.stack_capacity);

        for record in records {
            pool.reset();
            stack.clear();

            let root = pool.acquire(Node {
                value: strip_root(record),
                path: schema.root(),
                rl: 0,
                dl: 0,
            });
            stack.push(root);

            while let Some(id) = stack.pop() {
                let node = *pool.get(id);
                let element = schema.element(node.path.ordinal());

                match classify(node.value, element) {
                    Step::Leaf => leaf::emit(&node, &mut sink)?,
                    Step::Expand(variant) => {
                        if variant.dispatch(id, schema, &mut pool, &mut stack)? == 0 {
                            trace!(
                                path = node.path.path(),
                                dl = node.dl,
                                rl = node.rl,
                                "propagating null"
                            );
                            sink.push_nulls(node.path.ordinal(), node.dl, node.rl)?;
                        }
                    }
                }
            }
        }

        let columns = sink.finish();
        debug!(
            records = records.len(),
            columns = columns.len(),
            pool_slots = pool.high_water_mark(),
            "marshaled batch"
        );
        Ok(columns)
    }
}

/// Marshal with the default configuration
pub fn marshal(records: &[Value], schema: &SchemaHandler) -> Result<ColumnMap> {
    Marshaler::default().marshal(records, schema)
}

/// Strip one dynamic and one nullable wrapper so every record starts at level 0
fn strip_root(record: &Value) -> &Value {
    let mut value = record;
    if let Value::Dynamic(inner) = value {
        value = inner.as_deref().unwrap_or(&NULL_VALUE);
    }
    if let Value::Optional(inner) = value {
        value = inner.as_deref().unwrap_or(&NULL_VALUE);
    }
    value
}
