//! Contract between application records and the search layer.
//!
//! [`Searchable`] is implemented by the record type itself and describes how
//! one record turns into a document. [`SearchableSource`] is implemented by
//! whatever owns those records (a repository, a table gateway) and answers
//! type-level questions: which index, which mapping, how to load records
//! back by id.

use crate::error::Result;
use crate::types::{IndexDocument, Refresh};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A record that can be mirrored into the search index
pub trait Searchable: Send + Sync {
    /// Primary key value, used as the document id.
    fn search_key(&self) -> String;

    fn search_key_name(&self) -> &str {
        "id"
    }

    /// Full document body.
    fn to_search_document(&self) -> Map<String, Value>;

    /// Document body restricted to `only`. The key field is always kept.
    fn search_attributes(&self, only: Option<&[String]>) -> Map<String, Value> {
        let mut document = self.to_search_document();
        if let Some(only) = only {
            let key_name = self.search_key_name();
            document.retain(|field, _| field == key_name || only.contains(field));
        }
        if !document.contains_key(self.search_key_name()) {
            document.insert(
                self.search_key_name().to_string(),
                Value::from(self.search_key()),
            );
        }
        document
    }

    /// Attach the raw hit this record was loaded from.
    fn set_search_data(&mut self, data: Value);

    fn search_data(&self) -> Option<&Value>;

    /// Highlighted fragments for `field` from the attached hit.
    fn highlight(&self, field: &str) -> Vec<String> {
        self.search_data()
            .and_then(|data| data.pointer(&format!("/highlight/{field}")))
            .and_then(Value::as_array)
            .map(|fragments| {
                fragments
                    .iter()
                    .filter_map(|f| f.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Refresh directive used when this record's writes are sent.
    fn refresh(&self) -> Refresh {
        Refresh::False
    }

    fn partial_updates(&self) -> Option<&dyn PartiallyUpdatable> {
        None
    }

    fn omittable(&self) -> Option<&dyn Omittable> {
        None
    }
}

/// Records that can push only the indexed fields affected by a change
pub trait PartiallyUpdatable {
    /// Changed attribute name to the indexed fields it affects.
    fn partial_update_map(&self) -> HashMap<String, Vec<String>>;
}

/// Records that may opt out of indexing
pub trait Omittable {
    fn should_be_omitted(&self) -> bool;
}

/// Type-level view over a set of searchable records
#[async_trait]
pub trait SearchableSource: Send + Sync {
    type Entity: Searchable;

    /// Document type name.
    fn search_type(&self) -> &str;

    /// Index override for this type.
    fn search_index(&self) -> Option<&str> {
        None
    }

    fn type_mapping(&self) -> Map<String, Value> {
        Map::new()
    }

    fn type_settings(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Preferred page size, falling back to the configured one.
    fn page_size(&self) -> Option<usize> {
        None
    }

    /// Primary key of the record a hit refers to.
    fn primary_from_hit(&self, hit: &Value) -> Option<String> {
        match hit.get("_id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Self::Entity>>;

    /// Records for `ids`, loading `relations` along with them.
    async fn find_by_ids(&self, ids: &[String], relations: &[String]) -> Result<Vec<Self::Entity>>;

    /// Up to `limit` records starting at `offset`, in a stable order.
    async fn chunk(&self, offset: usize, limit: usize) -> Result<Vec<Self::Entity>>;
}

/// One chunk of records read for reindexing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentBatch {
    /// Records read from the source, omitted ones included
    pub fetched: usize,
    pub documents: Vec<IndexDocument>,
}

/// Object-safe view of a [`SearchableSource`] used for reindexing
#[async_trait]
pub trait IndexableType: Send + Sync {
    fn type_name(&self) -> &str;

    fn index_override(&self) -> Option<&str>;

    fn mapping(&self) -> Map<String, Value>;

    fn settings(&self) -> Map<String, Value>;

    /// Documents of the records in `offset..offset + limit`, without
    /// omitted records.
    async fn documents(&self, offset: usize, limit: usize) -> Result<DocumentBatch>;
}

#[async_trait]
impl<S: SearchableSource> IndexableType for S {
    fn type_name(&self) -> &str {
        self.search_type()
    }

    fn index_override(&self) -> Option<&str> {
        self.search_index()
    }

    fn mapping(&self) -> Map<String, Value> {
        self.type_mapping()
    }

    fn settings(&self) -> Map<String, Value> {
        self.type_settings()
    }

    async fn documents(&self, offset: usize, limit: usize) -> Result<DocumentBatch> {
        let records = self.chunk(offset, limit).await?;
        let documents = records
            .iter()
            .filter(|record| !record.omittable().is_some_and(|o| o.should_be_omitted()))
            .map(|record| IndexDocument::new(record.search_key(), record.search_attributes(None)))
            .collect();

        Ok(DocumentBatch {
            fetched: records.len(),
            documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{User, UserSource};
    use serde_json::json;

    #[test]
    fn test_search_attributes_always_keep_key() {
        let user = User::new(1, "Ada", "ada@example.com");
        let only = vec!["email".to_string()];

        let attributes = user.search_attributes(Some(&only));
        assert_eq!(
            Value::Object(attributes),
            json!({"id": 1, "email": "ada@example.com"})
        );
    }

    #[test]
    fn test_highlight_reads_attached_hit() {
        let mut user = User::new(1, "Ada", "ada@example.com");
        assert!(user.highlight("name").is_empty());

        user.set_search_data(json!({"_id": "1", "highlight": {"name": ["<em>Ada</em>"]}}));
        assert_eq!(user.highlight("name"), vec!["<em>Ada</em>"]);
    }

    #[test]
    fn test_primary_from_hit() {
        let source = UserSource::new(vec![]);
        assert_eq!(source.primary_from_hit(&json!({"_id": "5"})), Some("5".to_string()));
        assert_eq!(source.primary_from_hit(&json!({"_id": 6})), Some("6".to_string()));
        assert_eq!(source.primary_from_hit(&json!({})), None);
    }

    #[tokio::test]
    async fn test_documents_skip_omitted_records() {
        let mut hidden = User::new(2, "Bob", "bob@example.com");
        hidden.hidden = true;
        let source = UserSource::new(vec![User::new(1, "Ada", "ada@example.com"), hidden]);

        let batch = source.documents(0, 10).await.unwrap();
        assert_eq!(batch.fetched, 2);
        assert_eq!(batch.documents.len(), 1);
        assert_eq!(batch.documents[0].id, "1");
        assert_eq!(batch.documents[0].fields["name"], json!("Ada"));
    }
}
