//! # Quarry
//!
//! Mirrors application records into an Elasticsearch-style search service
//! and queries them back as hydrated records:
//! - Typed query objects (term, range, match family, bool) and a query factory
//! - A free-form clause DSL for anything the typed queries do not cover
//! - A per-type builder composing requests, with get/find/count/paginate
//! - Lifecycle observer keeping the index in sync with record changes
//! - Index (re)creation and chunked bulk import of declared types

pub mod builder;
pub mod clause;
pub mod client;
pub mod config;
pub mod dsl;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod indexer;
pub mod logger;
pub mod observer;
pub mod query;
pub mod resolver;
pub mod schema;
pub mod searchable;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use builder::Builder;
pub use clause::{Clause, ClauseCursor, ClauseValue};
pub use client::{HttpClient, SearchClient};
pub use config::{Config, ConfigBuilder, HostConfig, LoggingConfig};
pub use dsl::{Condition, Dsl, End};
pub use engine::{Quarry, SearchContext};
pub use error::{ClientError, QuarryError, Result};
pub use highlight::{Highlight, HighlightField};
pub use indexer::{IndexDefinition, IndexOptions, IndexOrchestrator, IndexReport};
pub use logger::{QueryLogger, RequestExecuted, TracingQueryLogger};
pub use observer::SearchableObserver;
pub use query::{
    BoolQuery, Bucket, Factory, MatchPhrasePrefixQuery, MatchPhraseQuery, MatchQuery,
    MultiMatchQuery, Query, RangeQuery, TermQuery, TermsQuery,
};
pub use resolver::{ConfigIndexResolver, IndexResolver};
pub use schema::{FieldType, SchemaDefinition};
pub use searchable::{
    DocumentBatch, IndexableType, Omittable, PartiallyUpdatable, Searchable, SearchableSource,
};
pub use types::{Environment, IndexDocument, Page, Refresh, SortField, SortOrder};

/// Facade over the HTTP client for the first configured host.
pub fn connect(config: Config) -> Result<Quarry> {
    Ok(Quarry::new(SearchContext::from_config(config)?))
}

/// [`connect`] with configuration read from a TOML file.
pub fn connect_with_config_file<P: AsRef<std::path::Path>>(path: P) -> Result<Quarry> {
    connect(Config::load(path)?)
}
