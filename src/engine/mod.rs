use crate::builder::Builder;
use crate::client::{HttpClient, SearchClient};
use crate::config::Config;
use crate::error::{QuarryError, Result};
use crate::indexer::{IndexOptions, IndexOrchestrator, IndexReport};
use crate::logger::{QueryLogger, TracingQueryLogger};
use crate::observer::SearchableObserver;
use crate::query::Factory;
use crate::resolver::{ConfigIndexResolver, IndexResolver};
use crate::searchable::{IndexableType, SearchableSource};
use std::any::Any;
use std::sync::Arc;

/// Collaborators shared by builders, the observer and the indexer
#[derive(Clone)]
pub struct SearchContext {
    pub client: Arc<dyn SearchClient>,
    pub resolver: Arc<dyn IndexResolver>,
    pub logger: Arc<dyn QueryLogger>,
    pub config: Arc<Config>,
}

impl SearchContext {
    /// Config-driven index resolution and tracing logger around `client`.
    pub fn new(config: Config, client: Arc<dyn SearchClient>) -> Self {
        Self {
            client,
            resolver: Arc::new(ConfigIndexResolver::from_config(&config)),
            logger: Arc::new(TracingQueryLogger::from_config(&config)),
            config: Arc::new(config),
        }
    }

    /// Context talking to the first configured host over HTTP.
    pub fn from_config(config: Config) -> Result<Self> {
        let client = HttpClient::from_config(&config)?;
        tracing::info!("Using search service at {}", client.base_url());
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn IndexResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn QueryLogger>) -> Self {
        self.logger = logger;
        self
    }
}

/// A registered searchable type, kept both typed and type-erased
struct Registration {
    indexable: Arc<dyn IndexableType>,
    typed: Arc<dyn Any + Send + Sync>,
}

/// Entry point: registry of searchable types plus factories for builders,
/// queries, the lifecycle observer and the indexer.
pub struct Quarry {
    ctx: SearchContext,
    types: Vec<(String, Registration)>,
    factory: Factory,
}

impl Quarry {
    pub fn new(ctx: SearchContext) -> Self {
        Self {
            ctx,
            types: Vec::new(),
            factory: Factory::new(),
        }
    }

    pub fn context(&self) -> &SearchContext {
        &self.ctx
    }

    pub fn config(&self) -> &Config {
        &self.ctx.config
    }

    /// Register `source` under its search type, replacing any previous
    /// registration with the same name.
    pub fn register<S>(&mut self, source: Arc<S>) -> &mut Self
    where
        S: SearchableSource + 'static,
    {
        let name = source.search_type().to_string();
        let registration = Registration {
            indexable: source.clone(),
            typed: source,
        };

        match self.types.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = registration,
            None => self.types.push((name.clone(), registration)),
        }

        tracing::info!("Registered searchable type: {}", name);
        self
    }

    pub fn registered_types(&self) -> Vec<&str> {
        self.types.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Fresh builder for `source`.
    pub fn builder<S: SearchableSource>(&self, source: Arc<S>) -> Result<Builder<S>> {
        Builder::new(source, self.ctx.clone())
    }

    /// Fresh builder for the registered type `type_name`.
    pub fn builder_for<S>(&self, type_name: &str) -> Result<Builder<S>>
    where
        S: SearchableSource + 'static,
    {
        let unknown = || QuarryError::UnknownSearchableType(type_name.to_string());
        let registration = self
            .types
            .iter()
            .find(|(name, _)| name == type_name)
            .map(|(_, registration)| registration)
            .ok_or_else(unknown)?;

        let source = registration
            .typed
            .clone()
            .downcast::<S>()
            .map_err(|_| unknown())?;
        self.builder(source)
    }

    /// Query factory.
    pub fn query(&self) -> &Factory {
        &self.factory
    }

    pub fn observer(&self) -> SearchableObserver {
        SearchableObserver::new(self.ctx.clone())
    }

    /// Indexer over every registered type.
    pub fn indexer(&self) -> IndexOrchestrator {
        let mut indexer = IndexOrchestrator::new(self.ctx.clone());
        for (_, registration) in &self.types {
            indexer.register(registration.indexable.clone());
        }
        indexer
    }

    /// Rebuild the indices of the configured types, or of every registered
    /// type when none are configured.
    pub async fn reindex(&self, options: &IndexOptions) -> Result<IndexReport> {
        let declared: Vec<String> = if self.ctx.config.types.is_empty() {
            self.types.iter().map(|(name, _)| name.clone()).collect()
        } else {
            self.ctx.config.types.clone()
        };

        self.indexer().run(&declared, options).await
    }
}
