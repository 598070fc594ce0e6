//! Path tree and level bookkeeping over a flat schema element list

use crate::error::SchemaError;
use crate::schema::element::{Repetition, SchemaElement};
use std::collections::HashMap;

pub const PATH_DELIMITER: char = '/';

/// Maximum definition and repetition level of a schema path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Levels {
    pub definition: i16,
    pub repetition: i16,
}

impl Levels {
    fn descend(self, repetition: Repetition) -> Self {
        match repetition {
            Repetition::Required => self,
            Repetition::Optional => Levels {
                definition: self.definition + 1,
                ..self
            },
            Repetition::Repeated => Levels {
                definition: self.definition + 1,
                repetition: self.repetition + 1,
            },
        }
    }
}

/// A node of the schema path tree
#[derive(Debug, Clone)]
pub struct PathNode {
    path: String,
    name: String,
    ordinal: usize,
    children: Vec<PathNode>,
    index: HashMap<String, usize>,
}

impl PathNode {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Position of this node's element in the flat element list
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn child(&self, name: &str) -> Option<&PathNode> {
        self.index.get(name).map(|&i| &self.children[i])
    }

    /// Position of the named child in declaration order
    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Children in declaration order
    pub fn children(&self) -> &[PathNode] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Read-only view of a schema: paths, levels and the path tree
#[derive(Debug, Clone)]
pub struct SchemaHandler {
    elements: Vec<SchemaElement>,
    paths: Vec<String>,
    ordinals: HashMap<String, usize>,
    levels: Vec<Levels>,
    root: PathNode,
}

impl SchemaHandler {
    /// Build a handler from a pre-order element list whose first entry is the root
    pub fn new(elements: Vec<SchemaElement>) -> Result<Self, SchemaError> {
        if elements.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut builder = TreeBuilder {
            elements: &elements,
            cursor: 0,
            paths: vec![String::new(); elements.len()],
            levels: vec![Levels::default(); elements.len()],
        };
        let root = builder.build_node(None, Levels::default())?;
        if builder.cursor != elements.len() {
            return Err(SchemaError::TrailingElements(elements.len() - builder.cursor));
        }

        let TreeBuilder { paths, levels, .. } = builder;
        let ordinals = paths
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();

        Ok(SchemaHandler {
            elements,
            paths,
            ordinals,
            levels,
            root,
        })
    }

    pub fn root(&self) -> &PathNode {
        &self.root
    }

    pub fn elements(&self) -> &[SchemaElement] {
        &self.elements
    }

    pub fn element(&self, ordinal: usize) -> &SchemaElement {
        &self.elements[ordinal]
    }

    pub fn path_of(&self, ordinal: usize) -> &str {
        &self.paths[ordinal]
    }

    pub fn ordinal_of(&self, path: &str) -> Option<usize> {
        self.ordinals.get(path).copied()
    }

    pub fn levels(&self, ordinal: usize) -> Levels {
        self.levels[ordinal]
    }

    pub fn max_definition_level(&self, path: &str) -> Result<i16, SchemaError> {
        self.lookup(path).map(|o| self.levels[o].definition)
    }

    pub fn max_repetition_level(&self, path: &str) -> Result<i16, SchemaError> {
        self.lookup(path).map(|o| self.levels[o].repetition)
    }

    /// Whether the element is a leaf column (the root never is)
    pub fn is_leaf(&self, ordinal: usize) -> bool {
        ordinal != 0 && self.elements[ordinal].num_children == 0
    }

    /// Leaf paths in schema order
    pub fn leaf_paths(&self) -> impl Iterator<Item = &str> {
        (0..self.elements.len())
            .filter(|&o| self.is_leaf(o))
            .map(|o| self.paths[o].as_str())
    }

    fn lookup(&self, path: &str) -> Result<usize, SchemaError> {
        self.ordinal_of(path)
            .ok_or_else(|| SchemaError::UnknownPath(path.to_string()))
    }
}

struct TreeBuilder<'a> {
    elements: &'a [SchemaElement],
    cursor: usize,
    paths: Vec<String>,
    levels: Vec<Levels>,
}

impl TreeBuilder<'_> {
    fn build_node(
        &mut self,
        prefix: Option<&str>,
        parent: Levels,
    ) -> Result<PathNode, SchemaError> {
        let elements = self.elements;
        let ordinal = self.cursor;
        let element = &elements[ordinal];
        self.cursor += 1;

        if element.name.contains(PATH_DELIMITER) {
            return Err(SchemaError::DelimiterInName(element.name.clone()));
        }

        // The root contributes no levels of its own
        let (path, levels) = match prefix {
            None => (element.name.clone(), Levels::default()),
            Some(p) => (
                format!("{}{}{}", p, PATH_DELIMITER, element.name),
                parent.descend(element.repetition),
            ),
        };

        if prefix.is_some() && element.num_children == 0 && element.physical_type.is_none() {
            return Err(SchemaError::MissingPhysicalType(path));
        }

        self.paths[ordinal] = path.clone();
        self.levels[ordinal] = levels;

        let mut children = Vec::with_capacity(element.num_children);
        let mut index = HashMap::with_capacity(element.num_children);
        for found in 0..element.num_children {
            if self.cursor >= elements.len() {
                return Err(SchemaError::MissingChildren {
                    path,
                    declared: element.num_children,
                    found,
                });
            }
            let name = elements[self.cursor].name.clone();
            if index.contains_key(&name) {
                return Err(SchemaError::DuplicateField { parent: path, name });
            }
            let child = self.build_node(Some(&path), levels)?;
            index.insert(name, children.len());
            children.push(child);
        }

        Ok(PathNode {
            path,
            name: element.name.clone(),
            ordinal,
            children,
            index,
        })
    }
}
