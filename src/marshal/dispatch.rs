//! Per-shape node expansion
//!
//! Every non-terminal node is expanded by exactly one `Dispatch` variant, which
//! pushes zero or more child nodes. The stack is LIFO, so sequence variants push
//! children in reverse of the order they must be emitted in.

use crate::error::{MarshalError, Result};
use crate::marshal::pool::{Node, NodeId, NodePool};
use crate::schema::definition::{LIST_ELEMENT, LIST_GROUP, MAP_GROUP, MAP_KEY, MAP_VALUE};
use crate::schema::{PathNode, Repetition, SchemaElement, SchemaHandler};
use crate::types::Value;

/// Stands in for absent values (missing keys, nil wrappers)
pub(crate) static NULL_VALUE: Value = Value::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dispatch {
    OptionalRef,
    DynamicProxy,
    StructFields,
    StructShapedMap,
    LogicalList,
    LogicalKeyValueMap,
}

/// What to do with a popped node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Leaf,
    Expand(Dispatch),
}

/// Pick the expansion for `value` at a path described by `element`
///
/// Maps are disambiguated by the schema: a map conversion makes it a key/value
/// map, otherwise its keys are matched against the path's children.
pub(crate) fn classify(value: &Value, element: &SchemaElement) -> Step {
    match value {
        Value::Optional(_) => Step::Expand(Dispatch::OptionalRef),
        Value::Null | Value::Dynamic(_) => Step::Expand(Dispatch::DynamicProxy),
        Value::Struct(_) => Step::Expand(Dispatch::StructFields),
        Value::Map(_) if element.is_map() => Step::Expand(Dispatch::LogicalKeyValueMap),
        Value::Map(_) => Step::Expand(Dispatch::StructShapedMap),
        Value::List(_) => Step::Expand(Dispatch::LogicalList),
        _ => Step::Leaf,
    }
}

impl Dispatch {
    /// Expand the node in slot `id`, returning how many children were pushed
    pub fn dispatch<'a>(
        self,
        id: NodeId,
        schema: &SchemaHandler,
        pool: &mut NodePool<'a>,
        stack: &mut Vec<NodeId>,
    ) -> Result<usize> {
        let node = *pool.get(id);
        match self {
            Dispatch::OptionalRef => {
                let Value::Optional(Some(inner)) = node.value else {
                    return Ok(0);
                };
                let slot = pool.get_mut(id);
                slot.value = &**inner;
                slot.dl += 1;
                stack.push(id);
                Ok(1)
            }
            // A dynamic wrapper adds no level; whatever it holds may
            Dispatch::DynamicProxy => {
                let Value::Dynamic(Some(inner)) = node.value else {
                    return Ok(0);
                };
                pool.get_mut(id).value = &**inner;
                stack.push(id);
                Ok(1)
            }
            Dispatch::StructFields => struct_fields(node, pool, stack),
            Dispatch::StructShapedMap => struct_shaped_map(node, schema, pool, stack),
            Dispatch::LogicalList => logical_list(node, schema, pool, stack),
            Dispatch::LogicalKeyValueMap => logical_key_value_map(node, schema, pool, stack),
        }
    }
}

fn require_group(path: &PathNode, value: &Value) -> Result<()> {
    if path.is_leaf() {
        return Err(MarshalError::invariant(
            path.path(),
            format!("{} value at a leaf column", value.kind()),
        ));
    }
    Ok(())
}

fn struct_fields<'a>(
    node: Node<'a>,
    pool: &mut NodePool<'a>,
    stack: &mut Vec<NodeId>,
) -> Result<usize> {
    let Value::Struct(fields) = node.value else {
        return Ok(0);
    };
    require_group(node.path, node.value)?;

    // Runtime fields the schema does not declare are ignored
    let children = node.path.children();
    for child in children.iter().rev() {
        let value = fields
            .iter()
            .find(|(name, _)| name == child.name())
            .map_or(&NULL_VALUE, |(_, v)| v);
        stack.push(pool.acquire(Node {
            value,
            path: child,
            ..node
        }));
    }
    Ok(children.len())
}

fn struct_shaped_map<'a>(
    node: Node<'a>,
    schema: &SchemaHandler,
    pool: &mut NodePool<'a>,
    stack: &mut Vec<NodeId>,
) -> Result<usize> {
    let Value::Map(entries) = node.value else {
        return Ok(0);
    };
    require_group(node.path, node.value)?;
    if entries.is_empty() {
        return Ok(0);
    }

    let children = node.path.children();
    let mut present = vec![false; children.len()];
    let mut pushed = 0;

    // Walked back to front, so a repeated key keeps its last value
    for (key, value) in entries.iter().rev() {
        let Some(index) = key.as_str().and_then(|k| node.path.child_index(k)) else {
            continue;
        };
        if present[index] {
            continue;
        }
        present[index] = true;
        let child = &children[index];

        // A present value defines an optional child here, unless a nullable
        // wrapper below will count that level itself
        let value = unwrap_dynamic(value);
        let mut dl = node.dl;
        if !value.is_null()
            && !matches!(value, Value::Optional(_))
            && schema.element(child.ordinal()).repetition == Repetition::Optional
        {
            dl += 1;
        }

        stack.push(pool.acquire(Node {
            value,
            path: child,
            rl: node.rl,
            dl,
        }));
        pushed += 1;
    }

    // Declared children missing from this map still get one null entry
    for (child, _) in children.iter().zip(&present).filter(|(_, seen)| !**seen) {
        stack.push(pool.acquire(Node {
            value: &NULL_VALUE,
            path: child,
            ..node
        }));
        pushed += 1;
    }

    Ok(pushed)
}

/// Strip any number of dynamic wrappers; an empty one reads as null
fn unwrap_dynamic(value: &Value) -> &Value {
    let mut value = value;
    while let Value::Dynamic(inner) = value {
        value = inner.as_deref().unwrap_or(&NULL_VALUE);
    }
    value
}

fn logical_list<'a>(
    node: Node<'a>,
    schema: &SchemaHandler,
    pool: &mut NodePool<'a>,
    stack: &mut Vec<NodeId>,
) -> Result<usize> {
    let Value::List(items) = node.value else {
        return Ok(0);
    };

    // A non-repeated path holds the three-level list wrapper
    let target = if schema.element(node.path.ordinal()).repetition == Repetition::Repeated {
        node.path
    } else {
        node.path
            .child(LIST_GROUP)
            .and_then(|list| list.child(LIST_ELEMENT))
            .ok_or_else(|| {
                MarshalError::invariant(
                    node.path.path(),
                    "list value without a list/element wrapper",
                )
            })?
    };
    if items.is_empty() {
        return Ok(0);
    }

    let rl_now = schema.levels(target.ordinal()).repetition;
    for (j, item) in items.iter().enumerate().rev() {
        stack.push(pool.acquire(Node {
            value: item,
            path: target,
            rl: continued_rl(j, node.rl, rl_now),
            dl: node.dl + 1,
        }));
    }
    Ok(items.len())
}

fn logical_key_value_map<'a>(
    node: Node<'a>,
    schema: &SchemaHandler,
    pool: &mut NodePool<'a>,
    stack: &mut Vec<NodeId>,
) -> Result<usize> {
    let Value::Map(entries) = node.value else {
        return Ok(0);
    };

    let wrapper =
        || MarshalError::invariant(node.path.path(), "map value without a key_value wrapper");
    let key_value = node.path.child(MAP_GROUP).ok_or_else(wrapper)?;
    let key_path = key_value.child(MAP_KEY).ok_or_else(wrapper)?;
    let value_path = key_value.child(MAP_VALUE).ok_or_else(wrapper)?;
    if entries.is_empty() {
        return Ok(0);
    }

    let rl_now = schema.levels(key_value.ordinal()).repetition;
    for (j, (key, value)) in entries.iter().enumerate().rev() {
        let rl = continued_rl(j, node.rl, rl_now);
        stack.push(pool.acquire(Node {
            value: key,
            path: key_path,
            rl,
            dl: node.dl + 1,
        }));
        stack.push(pool.acquire(Node {
            value,
            path: value_path,
            rl,
            dl: node.dl + 1,
        }));
    }
    Ok(entries.len() * 2)
}

/// The first element of a repeated group inherits the parent's repetition
/// level; later ones continue the group at the path's maximum level.
fn continued_rl(index: usize, parent_rl: i16, max_rl: i16) -> i16 {
    if index == 0 {
        parent_rl
    } else {
        max_rl
    }
}
