//! Reusable traversal node slots
//!
//! Slots are handed out by a cursor and recycled by resetting it between
//! records, so deep or wide records do not allocate per node once the pool has
//! grown to their size.

use crate::schema::PathNode;
use crate::types::Value;

/// One unit of traversal work: a value, its schema path and its levels
#[derive(Debug, Clone, Copy)]
pub(crate) struct Node<'a> {
    pub value: &'a Value,
    pub path: &'a PathNode,
    pub rl: i16,
    pub dl: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

#[derive(Debug)]
pub(crate) struct NodePool<'a> {
    slots: Vec<Node<'a>>,
    cursor: usize,
}

impl<'a> NodePool<'a> {
    pub fn with_capacity(capacity: usize) -> Self {
        NodePool {
            slots: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Store `node` in the next free slot, growing only past the high-water mark
    pub fn acquire(&mut self, node: Node<'a>) -> NodeId {
        if self.cursor < self.slots.len() {
            self.slots[self.cursor] = node;
        } else {
            self.slots.push(node);
        }
        self.cursor += 1;
        NodeId(self.cursor - 1)
    }

    pub fn get(&self, id: NodeId) -> &Node<'a> {
        &self.slots[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<'a> {
        &mut self.slots[id.0]
    }

    /// Make every slot available again without releasing memory
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn in_use(&self) -> usize {
        self.cursor
    }

    /// Number of slots ever materialized
    pub fn high_water_mark(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaElement, SchemaHandler, Repetition};

    #[test]
    fn test_reset_reuses_slots() {
        let root = SchemaElement::group("root", Repetition::Required, 0);
        let handler = SchemaHandler::new(vec![root]).unwrap();
        let value = Value::Int32(1);
        let node = Node {
            value: &value,
            path: handler.root(),
            rl: 0,
            dl: 0,
        };

        let mut pool = NodePool::with_capacity(1);
        let first = pool.acquire(node);
        pool.acquire(node);
        pool.acquire(node);
        assert_eq!(pool.in_use(), 3);
        assert_eq!(pool.high_water_mark(), 3);

        pool.reset();
        let again = pool.acquire(Node { dl: 4, ..node });
        assert_eq!(again, first);
        assert_eq!(pool.get(again).dl, 4);
        assert_eq!(pool.in_use(), 1);
        assert_eq!(pool.high_water_mark(), 3);

        pool.get_mut(again).rl = 2;
        assert_eq!(pool.get(first).rl, 2);
    }
}
