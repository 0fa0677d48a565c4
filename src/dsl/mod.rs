//! Fluent editing of a builder's request body.
//!
//! A [`Dsl`] borrows its [`Builder`] and points at one node of the builder's
//! clause tree. Descending with [`Dsl::node`] moves the pointer down, while
//! [`Dsl::end`] moves it back up and hands the builder back once the root is
//! reached. Terminal operations delegate to the builder from any depth.
//!
//! ```ignore
//! let users = builder
//!     .query()
//!     .node("query")?
//!     .node("bool")?
//!     .append("must", json!({"term": {"status": "active"}}))?
//!     .set_when(min_score.is_some(), "boost", 2)?
//!     .get()
//!     .await?;
//! ```

use crate::builder::Builder;
use crate::clause::{Clause, ClauseValue};
use crate::error::{QuarryError, Result};
use crate::searchable::SearchableSource;
use crate::types::Page;
use serde_json::{Map, Value};

/// Guard for the conditional combinators.
///
/// Either a plain `bool` or a predicate over the node being edited.
pub trait Condition {
    fn is_met(self, node: &Clause) -> bool;
}

impl Condition for bool {
    fn is_met(self, _node: &Clause) -> bool {
        self
    }
}

impl<F> Condition for F
where
    F: FnOnce(&Clause) -> bool,
{
    fn is_met(self, node: &Clause) -> bool {
        self(node)
    }
}

/// Cursor into a builder's clause tree
pub struct Dsl<'b, S: SearchableSource> {
    builder: &'b mut Builder<S>,
    path: Vec<String>,
}

/// Result of [`Dsl::end`]: the parent node, or the builder at the root.
pub enum End<'b, S: SearchableSource> {
    Node(Dsl<'b, S>),
    Builder(&'b mut Builder<S>),
}

impl<'b, S: SearchableSource> End<'b, S> {
    /// Parent node; fails with `NoParent` when `end()` was called at the root.
    pub fn node(self) -> Result<Dsl<'b, S>> {
        match self {
            End::Node(dsl) => Ok(dsl),
            End::Builder(_) => Err(QuarryError::NoParent),
        }
    }

    /// The owning builder, whichever level `end()` was called from.
    pub fn builder(self) -> &'b mut Builder<S> {
        match self {
            End::Node(dsl) => dsl.builder,
            End::Builder(builder) => builder,
        }
    }

    pub fn is_builder(&self) -> bool {
        matches!(self, End::Builder(_))
    }
}

impl<'b, S: SearchableSource> Dsl<'b, S> {
    pub(crate) fn new(builder: &'b mut Builder<S>) -> Self {
        Self {
            builder,
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

    /// Value of a field of the current node.
    pub fn value(&mut self, name: &str) -> Result<Value> {
        Ok(self.current_mut()?.get(name)?.to_value())
    }

    /// Move to the node that created this one, or back to the builder.
    pub fn end(mut self) -> End<'b, S> {
        match self.path.pop() {
            Some(_) => End::Node(self),
            None => End::Builder(self.builder),
        }
    }

    /// Strict variant of [`Dsl::end`] that never leaves the tree.
    pub fn up(mut self) -> Result<Self> {
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

    /// Run `f` against this node only when `condition` holds.
    pub fn when<C, F>(mut self, condition: C, f: F) -> Result<Self>
    where
        C: Condition,
        F: FnOnce(Self) -> Result<Self>,
    {
        if condition.is_met(self.current_mut()?) {
            return f(self);
        }
        Ok(self)
    }

    /// `set` guarded by `condition`; a no-op when it does not hold.
    pub fn set_when(
        mut self,
        condition: impl Condition,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<Self> {
        if condition.is_met(self.current_mut()?) {
            return self.set(name, value);
        }
        Ok(self)
    }

    /// `set` guarded by `condition`, with the value computed from the
    /// current node only when the condition holds.
    pub fn set_when_with<F, V>(
        mut self,
        condition: impl Condition,
        name: &str,
        value: F,
    ) -> Result<Self>
    where
        F: FnOnce(&Clause) -> V,
        V: Into<Value>,
    {
        let node = self.current_mut()?;
        if condition.is_met(node) {
            let value = value(node);
            node.set(name, value);
        }
        Ok(self)
    }

    /// `append` guarded by `condition`.
    pub fn append_when(
        mut self,
        condition: impl Condition,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<Self> {
        if condition.is_met(self.current_mut()?) {
            return self.append(name, value);
        }
        Ok(self)
    }

    /// Nested clause `name` when `condition` holds, nothing otherwise.
    pub fn child_when(
        &mut self,
        condition: impl Condition,
        name: &str,
    ) -> Result<Option<&mut Clause>> {
        let node = self.current_mut()?;
        if !condition.is_met(node) {
            return Ok(None);
        }
        node.child(name).map(Some)
    }

    /// Stored entry `name` when `condition` holds.
    pub fn get_when(
        &mut self,
        condition: impl Condition,
        name: &str,
    ) -> Result<Option<ClauseValue>> {
        let node = self.current_mut()?;
        if !condition.is_met(node) {
            return Ok(None);
        }
        node.get(name).cloned().map(Some)
    }

    /// Whole tree, from the root.
    pub fn to_map(&mut self) -> Map<String, Value> {
        self.builder.dsl_root_mut().to_map()
    }

    pub fn builder(self) -> &'b mut Builder<S> {
        self.builder
    }

    pub async fn get(self) -> Result<Vec<S::Entity>> {
        self.builder.get().await
    }

    pub async fn find(self, id: &str) -> Result<Option<S::Entity>> {
        self.builder.find(id).await
    }

    pub async fn count(self) -> Result<u64> {
        self.builder.count().await
    }

    pub async fn paginate(
        self,
        per_page: Option<usize>,
        page_name: &str,
        current_page: Option<usize>,
    ) -> Result<Page<S::Entity>> {
        self.builder
            .paginate(per_page, page_name, current_page)
            .await
    }

    pub async fn raw(self) -> Result<Value> {
        self.builder.raw().await
    }

    fn current_mut(&mut self) -> Result<&mut Clause> {
        self.builder.dsl_root_mut().at_path_mut(&self.path)
    }
}
