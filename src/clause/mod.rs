//! Loosely-typed nested clause tree.
//!
//! A [`Clause`] is an ordered set of named entries, each holding either a
//! plain JSON value or a nested clause. It mirrors the shape of a search
//! request body without committing to a schema, so any part of the query
//! language can be expressed even when no typed builder exists for it.
//!
//! Nodes do not keep a pointer to their parent. Walking up and down the tree
//! is done through a [`ClauseCursor`], which remembers the path from the root
//! to the node currently being edited.

use crate::error::{QuarryError, Result};
use serde_json::{Map, Value};

/// Entry stored under a clause field
#[derive(Debug, Clone, PartialEq)]
pub enum ClauseValue {
    Value(Value),
    Clause(Clause),
}

impl ClauseValue {
    pub fn to_value(&self) -> Value {
        match self {
            ClauseValue::Value(value) => value.clone(),
            ClauseValue::Clause(clause) => clause.to_value(),
        }
    }

    pub fn as_clause(&self) -> Option<&Clause> {
        match self {
            ClauseValue::Clause(clause) => Some(clause),
            ClauseValue::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ClauseValue::Value(value) => Some(value),
            ClauseValue::Clause(_) => None,
        }
    }
}

/// A node of the clause tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clause {
    entries: Vec<(String, ClauseValue)>,
}

impl Clause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Nested clause stored at `name`, created empty on first access.
    pub fn child(&mut self, name: &str) -> Result<&mut Clause> {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.entries
                    .push((name.to_string(), ClauseValue::Clause(Clause::new())));
                self.entries.len() - 1
            }
        };

        match &mut self.entries[index].1 {
            ClauseValue::Clause(clause) => Ok(clause),
            ClauseValue::Value(_) => Err(QuarryError::NotAClause(name.to_string())),
        }
    }

    /// Assign `value` at `name`, overwriting whatever was there.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.insert(name, ClauseValue::Value(value.into()));
        self
    }

    pub fn set_clause(&mut self, name: &str, clause: Clause) -> &mut Self {
        self.insert(name, ClauseValue::Clause(clause));
        self
    }

    /// Push `value` onto the array at `name`.
    ///
    /// A missing field becomes a one-element array; an existing non-array
    /// entry is wrapped into an array first.
    pub fn append(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        match self.position(name) {
            Some(index) => {
                let slot = &mut self.entries[index].1;
                let mut items = match slot.to_value() {
                    Value::Array(items) => items,
                    other => vec![other],
                };
                items.push(value);
                *slot = ClauseValue::Value(Value::Array(items));
            }
            None => {
                self.entries
                    .push((name.to_string(), ClauseValue::Value(Value::Array(vec![value]))));
            }
        }
        self
    }

    /// Value stored at `name`. Fails for fields that were never set.
    pub fn get(&self, name: &str) -> Result<&ClauseValue> {
        self.position(name)
            .map(|index| &self.entries[index].1)
            .ok_or_else(|| QuarryError::UnknownField(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Option<ClauseValue> {
        self.position(name)
            .map(|index| self.entries.remove(index).1)
    }

    /// Node at `path` below this one, if every segment names a nested clause.
    pub fn at_path(&self, path: &[String]) -> Option<&Clause> {
        path.iter().try_fold(self, |node, segment| {
            node.get(segment).ok().and_then(ClauseValue::as_clause)
        })
    }

    /// Mutable node at `path`, creating missing segments on the way.
    pub fn at_path_mut(&mut self, path: &[String]) -> Result<&mut Clause> {
        let mut node = self;
        for segment in path {
            node = node.child(segment)?;
        }
        Ok(node)
    }

    /// Depth-first conversion of the tree into a JSON object map.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut result = Map::new();
        for (key, entry) in &self.entries {
            // Nested clauses always serialize as objects, so an empty child
            // stays `{}` (e.g. `match_all`) instead of collapsing to `[]` or null.
            let value = match entry {
                ClauseValue::Clause(clause) => Value::Object(clause.to_map()),
                ClauseValue::Value(value) => value.clone(),
            };
            result.insert(key.clone(), value);
        }
        result
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }

    /// Start editing this tree from its root.
    pub fn cursor(&mut self) -> ClauseCursor<'_> {
        ClauseCursor::new(self)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == name)
    }

    fn insert(&mut self, name: &str, value: ClauseValue) {
        match self.position(name) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }
}

/// Editing position inside a clause tree
#[derive(Debug)]
pub struct ClauseCursor<'a> {
    root: &'a mut Clause,
    path: Vec<String>,
}

impl<'a> ClauseCursor<'a> {
    pub fn new(root: &'a mut Clause) -> Self {
        Self {
            root,
            path: Vec::new(),
        }
    }

    /// Descend into the nested clause `name`, creating it when missing.
    pub fn node(mut self, name: &str) -> Result<Self> {
        self.current_mut()?.child(name)?;
        self.path.push(name.to_string());
        Ok(self)
    }

    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.current_mut()?.set(name, value);
        Ok(self)
    }

    pub fn append(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.current_mut()?.append(name, value);
        Ok(self)
    }

    /// Return to the node that created the current one.
    pub fn end(mut self) -> Result<Self> {
        if self.path.pop().is_none() {
            return Err(QuarryError::NoParent);
        }
        Ok(self)
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn current(&self) -> Option<&Clause> {
        self.root.at_path(&self.path)
    }

    pub fn current_mut(&mut self) -> Result<&mut Clause> {
        self.root.at_path_mut(&self.path)
    }

    pub fn root(&self) -> &Clause {
        self.root
    }
}
