//! Mirrors record lifecycle events into the search index.
//!
//! The application calls the hook matching each persistence event. With
//! `enabled = false` in the configuration every hook is a no-op.

use crate::engine::SearchContext;
use crate::error::{QuarryError, Result};
use crate::searchable::{Searchable, SearchableSource};
use crate::types::{Environment, Refresh};
use serde_json::{Map, Value};

/// Lifecycle hooks for searchable records
#[derive(Clone)]
pub struct SearchableObserver {
    ctx: SearchContext,
}

impl SearchableObserver {
    pub fn new(ctx: SearchContext) -> Self {
        Self { ctx }
    }

    pub fn is_enabled(&self) -> bool {
        self.ctx.config.enabled
    }

    /// Index a freshly created record.
    pub async fn created<S: SearchableSource>(&self, source: &S, entity: &S::Entity) -> Result<()> {
        if !self.is_enabled() || is_omitted(entity) {
            return Ok(());
        }
        self.sync(source, entity, None).await
    }

    /// Push the changes of an updated record.
    ///
    /// When every changed attribute appears in the record's partial-update
    /// map, only the mapped fields are sent; otherwise the full document is
    /// reindexed.
    pub async fn updated<S: SearchableSource>(
        &self,
        source: &S,
        entity: &S::Entity,
        dirty: &[String],
    ) -> Result<()> {
        if !self.is_enabled() || is_omitted(entity) {
            return Ok(());
        }

        let only = partial_fields(entity, dirty);
        self.sync(source, entity, only.as_deref()).await
    }

    /// Remove the record's document.
    pub async fn deleted<S: SearchableSource>(&self, source: &S, entity: &S::Entity) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.remove(source, entity).await
    }

    /// Reindex a record brought back from soft deletion.
    pub async fn restored<S: SearchableSource>(
        &self,
        source: &S,
        entity: &S::Entity,
    ) -> Result<()> {
        if !self.is_enabled() || is_omitted(entity) {
            return Ok(());
        }
        self.sync(source, entity, None).await
    }

    /// Write the record to the index, restricted to `only` when given.
    ///
    /// A restricted write is a partial update (`body.doc`); a full write
    /// replaces the document.
    pub async fn sync<S: SearchableSource>(
        &self,
        source: &S,
        entity: &S::Entity,
        only: Option<&[String]>,
    ) -> Result<()> {
        let mut params = self.document_params(source, entity)?;
        let attributes = Value::Object(entity.search_attributes(only));

        match only {
            Some(_) => {
                let mut body = Map::new();
                body.insert("doc".to_string(), attributes);
                params.insert("body".to_string(), Value::Object(body));

                let params = Value::Object(params);
                self.ctx.client.update(&params).await?;
                tracing::debug!(
                    "Partially updated {} <{}>",
                    source.search_type(),
                    entity.search_key()
                );
            }
            None => {
                params.insert("body".to_string(), attributes);

                let params = Value::Object(params);
                self.ctx.client.index(&params).await?;
                tracing::debug!("Indexed {} <{}>", source.search_type(), entity.search_key());
            }
        }
        Ok(())
    }

    /// Delete the record's document.
    ///
    /// In silent mode a document that is already gone is reported and
    /// otherwise ignored.
    pub async fn remove<S: SearchableSource>(&self, source: &S, entity: &S::Entity) -> Result<()> {
        let params = Value::Object(self.document_params(source, entity)?);

        match self.ctx.client.delete(&params).await {
            Ok(_) => {
                tracing::debug!("Deleted {} <{}>", source.search_type(), entity.search_key());
                Ok(())
            }
            Err(e) if e.is_not_found() && self.ctx.config.silent => {
                let context = format!(
                    "deleting {} <{}>",
                    source.search_type(),
                    entity.search_key()
                );
                self.ctx
                    .logger
                    .error_suppressed(&context, &QuarryError::from(e));
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn document_params<S: SearchableSource>(
        &self,
        source: &S,
        entity: &S::Entity,
    ) -> Result<Map<String, Value>> {
        let index = self
            .ctx
            .resolver
            .resolve_index_for_type(source.search_type(), source.search_index())?;
        let refresh = match self.ctx.config.environment {
            Environment::Testing => Refresh::True,
            _ => entity.refresh(),
        };

        let mut params = Map::new();
        params.insert("index".to_string(), Value::from(index));
        params.insert("type".to_string(), Value::from(source.search_type()));
        params.insert("id".to_string(), Value::from(entity.search_key()));
        params.insert("refresh".to_string(), refresh.to_value());
        Ok(params)
    }
}

fn is_omitted(entity: &impl Searchable) -> bool {
    entity.omittable().is_some_and(|o| o.should_be_omitted())
}

/// Indexed fields affected by `dirty`, when all of them are mapped.
fn partial_fields(entity: &impl Searchable, dirty: &[String]) -> Option<Vec<String>> {
    let map = entity.partial_updates()?.partial_update_map();
    if dirty.is_empty() || !dirty.iter().all(|attribute| map.contains_key(attribute)) {
        return None;
    }

    let mut fields: Vec<String> = Vec::new();
    for attribute in dirty {
        for field in &map[attribute] {
            if !fields.contains(field) {
                fields.push(field.clone());
            }
        }
    }
    Some(fields)
}
