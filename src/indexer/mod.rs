//! Index (re)creation and bulk import of declared searchable types.

use crate::engine::SearchContext;
use crate::error::Result;
use crate::searchable::IndexableType;
use crate::types::{IndexDocument, Refresh};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Options of an indexing run
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Refresh the indices after each bulk request
    pub refresh: bool,
    /// Only delete the existing indices
    pub drop_only: bool,
}

/// Outcome of an indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub deleted: usize,
    pub created: usize,
    /// Documents the bulk responses acknowledged
    pub imported: usize,
    /// Declared types with no registered implementation
    pub skipped: Vec<String>,
}

/// Mappings and settings of every type sharing one index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub types: Vec<String>,
    pub mappings: Map<String, Value>,
    pub settings: Map<String, Value>,
}

impl IndexDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a type's mapping under its name, unless it is empty; its
    /// settings are merged over the ones already collected.
    pub fn add_type(
        &mut self,
        type_name: &str,
        mapping: Map<String, Value>,
        settings: Map<String, Value>,
    ) {
        self.types.push(type_name.to_string());
        if !mapping.is_empty() {
            self.mappings
                .insert(type_name.to_string(), Value::Object(mapping));
        }
        for (key, value) in settings {
            self.settings.insert(key, value);
        }
    }

    /// Index creation request body.
    pub fn create_body(&self) -> Value {
        let mut body = Map::new();
        if !self.mappings.is_empty() {
            body.insert("mappings".to_string(), Value::Object(self.mappings.clone()));
        }
        if !self.settings.is_empty() {
            body.insert("settings".to_string(), Value::Object(self.settings.clone()));
        }
        Value::Object(body)
    }
}

/// Rebuilds search indices from registered searchable types
pub struct IndexOrchestrator {
    ctx: SearchContext,
    types: Vec<Arc<dyn IndexableType>>,
}

impl IndexOrchestrator {
    pub fn new(ctx: SearchContext) -> Self {
        Self {
            ctx,
            types: Vec::new(),
        }
    }

    pub fn register(&mut self, indexable: Arc<dyn IndexableType>) -> &mut Self {
        self.types.push(indexable);
        self
    }

    /// Drop, recreate and refill the indices of the `declared` types.
    ///
    /// Declared names without a registered type are skipped with a warning.
    pub async fn run(&self, declared: &[String], options: &IndexOptions) -> Result<IndexReport> {
        let mut report = IndexReport::default();

        let mut selected = Vec::new();
        for name in declared {
            match self.types.iter().find(|t| t.type_name() == name) {
                Some(indexable) => selected.push(indexable.clone()),
                None => {
                    tracing::warn!("Searchable type '{}' is not registered, skipping", name);
                    report.skipped.push(name.clone());
                }
            }
        }

        let definitions = self.definitions(&selected)?;
        let (deleted, created) = self.rebuild(&definitions, options.drop_only).await?;
        report.deleted = deleted;
        report.created = created;
        if options.drop_only {
            return Ok(report);
        }

        let refresh = Refresh::from(options.refresh);
        for (index, indexable) in self.resolved(&selected)? {
            report.imported += self.import(&index, indexable.as_ref(), refresh).await?;
        }

        tracing::info!(
            "Indexing finished: {} deleted, {} created, {} documents imported",
            report.deleted,
            report.created,
            report.imported
        );
        Ok(report)
    }

    /// Delete the existing indices of `definitions`, then create them
    /// again unless `drop_only` is set. Returns the deleted and created
    /// counts.
    pub async fn rebuild(
        &self,
        definitions: &[IndexDefinition],
        drop_only: bool,
    ) -> Result<(usize, usize)> {
        let deleted = self.drop_indices(definitions).await?;
        if drop_only {
            tracing::info!("Dropped {} indices", deleted);
            return Ok((deleted, 0));
        }

        for definition in definitions {
            let params = json!({"index": definition.name, "body": definition.create_body()});
            self.ctx.client.create_index(&params).await?;
            tracing::info!(
                "Created index '{}' for types: {}",
                definition.name,
                definition.types.join(", ")
            );
        }
        Ok((deleted, definitions.len()))
    }

    /// Types grouped by resolved index, in first-seen order.
    pub fn definitions(&self, types: &[Arc<dyn IndexableType>]) -> Result<Vec<IndexDefinition>> {
        let mut definitions: Vec<IndexDefinition> = Vec::new();
        for (index, indexable) in self.resolved(types)? {
            definition_for(&mut definitions, index).add_type(
                indexable.type_name(),
                indexable.mapping(),
                indexable.settings(),
            );
        }
        Ok(definitions)
    }

    /// Declared type names grouped by resolved index, without mappings or
    /// settings. Used when no implementation of the types is at hand.
    pub fn declared_definitions(&self, declared: &[String]) -> Result<Vec<IndexDefinition>> {
        let mut definitions: Vec<IndexDefinition> = Vec::new();
        for type_name in declared {
            let index = self.ctx.resolver.resolve_index_for_type(type_name, None)?;
            definition_for(&mut definitions, index).add_type(type_name, Map::new(), Map::new());
        }
        Ok(definitions)
    }

    fn resolved(
        &self,
        types: &[Arc<dyn IndexableType>],
    ) -> Result<Vec<(String, Arc<dyn IndexableType>)>> {
        types
            .iter()
            .map(|indexable| {
                let index = self
                    .ctx
                    .resolver
                    .resolve_index_for_type(indexable.type_name(), indexable.index_override())?;
                Ok((index, indexable.clone()))
            })
            .collect()
    }

    async fn drop_indices(&self, definitions: &[IndexDefinition]) -> Result<usize> {
        let mut deleted = 0;
        for definition in definitions {
            if self.ctx.client.index_exists(&definition.name).await? {
                self.ctx.client.delete_index(&definition.name).await?;
                tracing::info!("Deleted index '{}'", definition.name);
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Stream the type's records in chunks, one bulk request per chunk.
    async fn import(
        &self,
        index: &str,
        indexable: &dyn IndexableType,
        refresh: Refresh,
    ) -> Result<usize> {
        let chunk_size = self.ctx.config.chunk_size.max(1);
        let mut offset = 0;
        let mut imported = 0;

        loop {
            let batch = indexable.documents(offset, chunk_size).await?;
            if batch.fetched == 0 {
                break;
            }
            offset += batch.fetched;
            if batch.documents.is_empty() {
                continue;
            }

            let submitted = batch.documents.len();
            let params = json!({
                "refresh": refresh.to_value(),
                "body": bulk_body(index, indexable.type_name(), batch.documents),
            });
            let response = self.ctx.client.bulk(&params).await?;
            let failed = failed_items(&response);
            if failed > 0 {
                tracing::warn!(
                    "Bulk import into '{}' rejected {} of {} documents",
                    index,
                    failed,
                    submitted
                );
            }

            imported += submitted.saturating_sub(failed);
            tracing::debug!("Imported {} {} documents", imported, indexable.type_name());
        }

        Ok(imported)
    }
}

/// Entry for `index`, appended when first seen.
fn definition_for(definitions: &mut Vec<IndexDefinition>, index: String) -> &mut IndexDefinition {
    let position = match definitions.iter().position(|d| d.name == index) {
        Some(position) => position,
        None => {
            definitions.push(IndexDefinition::new(index));
            definitions.len() - 1
        }
    };
    &mut definitions[position]
}

/// Items of a bulk response that carry an error.
fn failed_items(response: &Value) -> usize {
    if response.get("errors") != Some(&Value::Bool(true)) {
        return 0;
    }
    response
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| {
                    item.as_object()
                        .and_then(|actions| actions.values().next())
                        .is_some_and(|result| result.get("error").is_some())
                })
                .count()
        })
        .unwrap_or(0)
}

/// Alternating action and source lines of a bulk index request.
fn bulk_body(index: &str, type_name: &str, documents: Vec<IndexDocument>) -> Value {
    let mut lines = Vec::with_capacity(documents.len() * 2);
    for document in documents {
        lines.push(json!({"index": {"_index": index, "_type": type_name, "_id": document.id}}));
        lines.push(Value::Object(document.fields));
    }
    Value::Array(lines)
}
