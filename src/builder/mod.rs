//! Search request composition and execution for one searchable type.
//!
//! Request assembly order: raw body, typed bool query (as `body.query`),
//! free-form DSL tree (merged into the body), sort, pagination, highlight,
//! and finally any caller overrides.

use crate::clause::Clause;
use crate::dsl::Dsl;
use crate::engine::SearchContext;
use crate::error::{QuarryError, Result};
use crate::highlight::Highlight;
use crate::logger::RequestExecuted;
use crate::query::{BoolQuery, Query};
use crate::searchable::{Searchable, SearchableSource};
use crate::types::{Page, SortField, SortOrder, hits, hits_total, value_at};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;

/// Request body used until the caller replaces it.
fn default_request() -> Map<String, Value> {
    match json!({"query": {"match_all": {}}}) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Positive values only; anything else clears the setting.
fn positive(value: i64) -> Option<usize> {
    usize::try_from(value).ok().filter(|v| *v > 0)
}

/// Run `f` on the `body` object of a parameter map, creating it if needed.
fn with_body(params: &mut Map<String, Value>, f: impl FnOnce(&mut Map<String, Value>)) {
    let mut body = match params.remove("body") {
        Some(Value::Object(body)) => body,
        _ => Map::new(),
    };
    f(&mut body);
    params.insert("body".to_string(), Value::Object(body));
}

/// Query builder bound to one searchable type and its resolved index
pub struct Builder<S: SearchableSource> {
    source: Arc<S>,
    ctx: SearchContext,
    index: String,
    request_raw: Option<Map<String, Value>>,
    bool_query: Option<BoolQuery>,
    dsl: Option<Clause>,
    limit: Option<usize>,
    offset: Option<usize>,
    order_by: Vec<SortField>,
    highlight: Option<Map<String, Value>>,
    relations: Vec<String>,
    last_result: Option<Value>,
}

impl<S: SearchableSource> Builder<S> {
    /// Resolves the target index up front; fails with `NoIndexForType`.
    pub fn new(source: Arc<S>, ctx: SearchContext) -> Result<Self> {
        let index = ctx
            .resolver
            .resolve_index_for_type(source.search_type(), source.search_index())?;

        Ok(Self {
            source,
            ctx,
            index,
            request_raw: Some(default_request()),
            bool_query: None,
            dsl: None,
            limit: None,
            offset: None,
            order_by: Vec::new(),
            highlight: None,
            relations: Vec::new(),
            last_result: None,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn search_type(&self) -> &str {
        self.source.search_type()
    }

    /// Free-form DSL editor over the request body, created on first use.
    pub fn query(&mut self) -> Dsl<'_, S> {
        self.dsl_root_mut();
        Dsl::new(self)
    }

    pub fn dsl(&self) -> Option<&Clause> {
        self.dsl.as_ref()
    }

    pub(crate) fn dsl_root_mut(&mut self) -> &mut Clause {
        self.dsl.get_or_insert_with(Clause::new)
    }

    /// Typed bool query, created on first use.
    pub fn bool_query(&mut self) -> &mut BoolQuery {
        self.bool_query.get_or_insert_with(BoolQuery::new)
    }

    pub fn set_bool_query(&mut self, query: BoolQuery) -> &mut Self {
        self.bool_query = Some(query);
        self
    }

    /// Replace the base request body.
    pub fn request_raw(&mut self, body: Map<String, Value>) -> &mut Self {
        self.request_raw = Some(body);
        self
    }

    pub fn raw_request(&self) -> Option<&Map<String, Value>> {
        self.request_raw.as_ref()
    }

    /// Zero or negative clears the limit.
    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.limit = positive(limit);
        self
    }

    /// Zero or negative clears the offset.
    pub fn offset(&mut self, offset: i64) -> &mut Self {
        self.offset = positive(offset);
        self
    }

    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn get_offset(&self) -> Option<usize> {
        self.offset
    }

    /// Limit and offset for the 1-based `page`. The offset saturates at
    /// `usize::MAX`.
    pub fn for_page(&mut self, page: usize, per_page: usize) -> &mut Self {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        self.limit = Some(per_page).filter(|v| *v > 0);
        self.offset = Some(offset).filter(|v| *v > 0);
        self
    }

    pub fn add_order_by(&mut self, field: impl Into<String>, order: SortOrder) -> &mut Self {
        self.order_by.push(SortField::new(field, order));
        self
    }

    pub fn order_by(&self) -> &[SortField] {
        &self.order_by
    }

    /// Relations to load along with hydrated records. Duplicates are ignored.
    pub fn with<I, R>(&mut self, relations: I) -> &mut Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        for relation in relations {
            let relation = relation.into();
            if !self.relations.contains(&relation) {
                self.relations.push(relation);
            }
        }
        self
    }

    pub fn without<I, R>(&mut self, relations: I) -> &mut Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let removed: Vec<String> = relations.into_iter().map(Into::into).collect();
        self.relations.retain(|relation| !removed.contains(relation));
        self
    }

    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    /// Highlight `fields` (name to settings) with top-level `settings`.
    /// Empty or null field settings become `{}`.
    pub fn highlight(
        &mut self,
        fields: Map<String, Value>,
        settings: Map<String, Value>,
    ) -> &mut Self {
        let fields: Map<String, Value> = fields
            .into_iter()
            .map(|(name, spec)| {
                let spec = match spec {
                    Value::Null => Value::Object(Map::new()),
                    Value::Array(items) if items.is_empty() => Value::Object(Map::new()),
                    other => other,
                };
                (name, spec)
            })
            .collect();

        let mut raw = settings;
        raw.insert("fields".to_string(), Value::Object(fields));
        self.highlight = Some(raw);
        self
    }

    pub fn highlight_with(&mut self, highlight: &Highlight) -> &mut Self {
        self.highlight = Some(highlight.to_map());
        self
    }

    pub fn highlight_raw(&self) -> Option<&Map<String, Value>> {
        self.highlight.as_ref()
    }

    /// Response of the most recent request.
    pub fn last_result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }

    /// Dotted-path lookup into the most recent response.
    pub fn last_result_at(&self, path: &str) -> Option<&Value> {
        self.last_result
            .as_ref()
            .and_then(|result| value_at(result, path))
    }

    /// Fully composed search parameters, as [`Builder::raw`] would send them.
    pub fn to_request(&self) -> Value {
        Value::Object(self.compose())
    }

    pub async fn raw(&mut self) -> Result<Value> {
        self.raw_with(Map::new()).await
    }

    /// Execute the composed search with `overrides` merged over the
    /// top-level parameters.
    pub async fn raw_with(&mut self, overrides: Map<String, Value>) -> Result<Value> {
        let mut params = self.compose();
        for (key, value) in overrides {
            params.insert(key, value);
        }

        let params = Value::Object(params);
        let result = self.ctx.client.search(&params).await?;
        self.record("search", params, &result);
        Ok(result)
    }

    /// Number of matching documents.
    pub async fn count(&mut self) -> Result<u64> {
        let mut params = self.common_params(true);
        self.inject_query(&mut params);
        with_body(&mut params, |body| {
            body.insert("size".to_string(), Value::from(0));
        });

        let params = Value::Object(params);
        let result = self.ctx.client.search(&params).await?;
        self.record("count", params, &result);
        Ok(hits_total(&result))
    }

    /// Scoring explanation of the current query against document `id`.
    pub async fn explain(&mut self, id: &str) -> Result<Value> {
        let mut params = self.common_params(true);
        self.inject_query(&mut params);
        let query = params
            .get("body")
            .and_then(|body| body.get("query"))
            .cloned()
            .unwrap_or_else(|| json!({"match_all": {}}));
        params.insert("id".to_string(), Value::from(id));
        params.insert("body".to_string(), json!({ "query": query }));

        let params = Value::Object(params);
        let result = self.ctx.client.explain(&params).await?;
        self.record("explain", params, &result);
        Ok(result)
    }

    /// Document `id` hydrated into a record.
    ///
    /// A missing document yields `None`. Other failures propagate, except in
    /// production where they are reported and also yield `None`.
    pub async fn find(&mut self, id: &str) -> Result<Option<S::Entity>> {
        match self.fetch(id).await {
            Ok(entity) => Ok(entity),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) if self.ctx.config.environment.is_production() => {
                let context = format!("fetching {} <{}>", self.search_type(), id);
                self.ctx.logger.error_suppressed(&context, &e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Matching records, in hit order, each carrying its hit.
    pub async fn get(&mut self) -> Result<Vec<S::Entity>> {
        let result = self.raw().await?;
        if hits_total(&result) == 0 {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut hits_by_id = HashMap::new();
        for hit in hits(&result) {
            if let Some(id) = self.source.primary_from_hit(hit) {
                if !hits_by_id.contains_key(&id) {
                    ids.push(id.clone());
                    hits_by_id.insert(id, hit.clone());
                }
            }
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut entities = self.source.find_by_ids(&ids, &self.relations).await?;
        entities.sort_by_key(|entity| {
            let key = entity.search_key();
            ids.iter().position(|id| *id == key).unwrap_or(usize::MAX)
        });
        for entity in &mut entities {
            if let Some(hit) = hits_by_id.get(&entity.search_key()) {
                entity.set_search_data(hit.clone());
            }
        }

        tracing::debug!(
            "Hydrated {} of {} hits for {}",
            entities.len(),
            ids.len(),
            self.search_type()
        );
        Ok(entities)
    }

    /// One page of records.
    ///
    /// `per_page` defaults to the source's page size, then the configured
    /// one; `current_page` defaults to 1.
    pub async fn paginate(
        &mut self,
        per_page: Option<usize>,
        page_name: &str,
        current_page: Option<usize>,
    ) -> Result<Page<S::Entity>> {
        let per_page = per_page
            .filter(|n| *n > 0)
            .or_else(|| self.source.page_size())
            .unwrap_or(self.ctx.config.page_size);
        let current_page = current_page.filter(|n| *n > 0).unwrap_or(1);

        let total = self.count().await?;
        let items = if total > 0 {
            self.for_page(current_page, per_page);
            self.get().await?
        } else {
            Vec::new()
        };

        Ok(Page {
            items,
            total,
            per_page,
            current_page,
            page_name: page_name.to_string(),
        })
    }

    async fn fetch(&mut self, id: &str) -> Result<Option<S::Entity>> {
        let mut params = self.common_params(false);
        params.insert("id".to_string(), Value::from(id));

        let params = Value::Object(params);
        let result = self.ctx.client.get(&params).await?;
        self.record("get", params, &result);

        if result.get("found") == Some(&Value::Bool(false)) {
            return Err(QuarryError::DocumentNotFound(id.to_string()));
        }
        let primary = self
            .source
            .primary_from_hit(&result)
            .ok_or_else(|| QuarryError::DocumentNotFound(id.to_string()))?;

        let Some(mut entity) = self.source.find_by_id(&primary).await? else {
            return Ok(None);
        };
        entity.set_search_data(result);
        Ok(Some(entity))
    }

    fn record(&mut self, operation: &str, params: Value, result: &Value) {
        self.ctx
            .logger
            .request_executed(&RequestExecuted::new(operation, params, result.clone()));
        self.last_result = Some(result.clone());
    }

    fn common_params(&self, with_body: bool) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("index".to_string(), Value::from(self.index.as_str()));
        params.insert("type".to_string(), Value::from(self.search_type()));
        if with_body {
            if let Some(raw) = &self.request_raw {
                params.insert("body".to_string(), Value::Object(raw.clone()));
            }
        }
        params
    }

    fn compose(&self) -> Map<String, Value> {
        let mut params = self.common_params(true);
        self.inject_query(&mut params);
        self.inject_sort(&mut params);
        self.inject_pagination(&mut params);
        self.inject_highlight(&mut params);
        params
    }

    fn inject_query(&self, params: &mut Map<String, Value>) {
        if let Some(query) = self.bool_query.as_ref().and_then(|q| q.to_value()) {
            with_body(params, |body| {
                body.insert("query".to_string(), query);
            });
        }

        // The DSL root stands for the body itself: its top-level keys win.
        if let Some(dsl) = self.dsl.as_ref().filter(|dsl| !dsl.is_empty()) {
            with_body(params, |body| {
                for (key, value) in dsl.to_map() {
                    body.insert(key, value);
                }
            });
        }
    }

    fn inject_sort(&self, params: &mut Map<String, Value>) {
        if self.order_by.is_empty() {
            return;
        }
        let sort: Vec<Value> = self.order_by.iter().map(SortField::to_value).collect();
        with_body(params, |body| {
            body.insert("sort".to_string(), Value::Array(sort));
        });
    }

    fn inject_pagination(&self, params: &mut Map<String, Value>) {
        let Some(limit) = self.limit else {
            return;
        };
        let offset = self.offset;
        with_body(params, |body| {
            body.insert("size".to_string(), Value::from(limit));
            if let Some(offset) = offset {
                body.insert("from".to_string(), Value::from(offset));
            }
        });
    }

    fn inject_highlight(&self, params: &mut Map<String, Value>) {
        if let Some(highlight) = &self.highlight {
            let highlight = Value::Object(highlight.clone());
            with_body(params, |body| {
                body.insert("highlight".to_string(), highlight);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{RangeQuery, TermQuery};
    use crate::testing::{User, UserSource, builder, context, scripted_client, search_response};
    use crate::config::ConfigBuilder;
    use crate::error::ClientError;
    use crate::types::Environment;
    use rstest::rstest;
    use std::sync::atomic::Ordering;
    use tracing_test::traced_test;

    fn users() -> Vec<User> {
        vec![
            User::new(1, "Ada", "ada@example.com"),
            User::new(2, "Grace", "grace@example.com"),
            User::new(3, "Linus", "linus@example.com"),
        ]
    }

    #[test]
    fn test_default_request_matches_all() {
        let (_client, ctx) = scripted_client();
        let builder = builder(ctx, UserSource::new(vec![]));

        assert_eq!(
            builder.to_request(),
            json!({
                "index": "app",
                "type": "users",
                "body": {"query": {"match_all": {}}}
            })
        );
    }

    #[test]
    fn test_bool_query_replaces_default_query() {
        let (_client, ctx) = scripted_client();
        let mut builder = builder(ctx, UserSource::new(vec![]));
        builder
            .bool_query()
            .must(TermQuery::new("status", "active"))
            .filter(RangeQuery::new("age").gte(18));

        assert_eq!(
            builder.to_request()["body"],
            json!({"query": {"bool": {
                "must": [{"term": {"status": {"value": "active"}}}],
                "filter": [{"range": {"age": {"gte": 18}}}]
            }}})
        );
    }

    #[test]
    fn test_empty_bool_query_keeps_default() {
        let (_client, ctx) = scripted_client();
        let mut builder = builder(ctx, UserSource::new(vec![]));
        builder.bool_query().filter(RangeQuery::new("age"));

        assert_eq!(
            builder.to_request()["body"],
            json!({"query": {"match_all": {}}})
        );
    }

    #[test]
    fn test_sort_pagination_and_highlight() {
        let (_client, ctx) = scripted_client();
        let mut builder = builder(ctx, UserSource::new(vec![]));
        builder
            .add_order_by("created_at", SortOrder::default())
            .add_order_by("name", SortOrder::Asc)
            .limit(10)
            .offset(20);
        let mut highlight = Highlight::new();
        highlight.field("name").fragment_size(50);
        builder.highlight_with(&highlight);

        let body = &builder.to_request()["body"];
        assert_eq!(body["sort"], json!([{"created_at": "desc"}, {"name": "asc"}]));
        assert_eq!(body["size"], json!(10));
        assert_eq!(body["from"], json!(20));
        assert_eq!(
            body["highlight"],
            json!({"fields": {"name": {"fragment_size": 50}}})
        );
    }

    #[rstest]
    #[case(0, 5)]
    #[case(-3, 5)]
    fn test_non_positive_limit_is_absent(#[case] limit: i64, #[case] offset: i64) {
        let (_client, ctx) = scripted_client();
        let mut builder = builder(ctx, UserSource::new(vec![]));
        builder.limit(limit).offset(offset);

        let request = builder.to_request();
        assert_eq!(builder.get_limit(), None);
        assert!(request["body"].get("size").is_none());
        assert!(request["body"].get("from").is_none());
    }

    #[test]
    fn test_offset_without_limit_is_ignored() {
        let (_client, ctx) = scripted_client();
        let mut builder = builder(ctx, UserSource::new(vec![]));
        builder.offset(10);

        assert_eq!(builder.get_offset(), Some(10));
        assert!(builder.to_request()["body"].get("from").is_none());
    }

    #[test]
    fn test_highlight_empty_field_settings_become_objects() {
        let (_client, ctx) = scripted_client();
        let mut builder = builder(ctx, UserSource::new(vec![]));
        let fields = match json!({"name": [], "email": null, "bio": {"number_of_fragments": 1}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let mut settings = Map::new();
        settings.insert("pre_tags".to_string(), json!(["<b>"]));
        builder.highlight(fields, settings);

        let highlight = &builder.to_request()["body"]["highlight"];
        assert!(highlight["fields"]["name"].is_object());
        assert!(highlight["fields"]["email"].is_object());
        assert_eq!(highlight["fields"]["bio"], json!({"number_of_fragments": 1}));
        assert_eq!(highlight["pre_tags"], json!(["<b>"]));
    }

    #[test]
    fn test_relations_deduplicated_and_removed() {
        let (_client, ctx) = scripted_client();
        let mut builder = builder(ctx, UserSource::new(vec![]));
        builder
            .with(["posts", "comments"])
            .with(["posts"])
            .without(["comments"]);

        assert_eq!(builder.relations(), ["posts".to_string()]);
    }

    #[test]
    fn test_dsl_merges_over_bool_query() {
        let (_client, ctx) = scripted_client();
        let mut builder = builder(ctx, UserSource::new(vec![]));
        builder.bool_query().must(TermQuery::new("status", "active"));
        builder
            .query()
            .set("min_score", 1)
            .unwrap()
            .node("aggs")
            .unwrap()
            .node("by_status")
            .unwrap()
            .node("terms")
            .unwrap()
            .set("field", "status")
            .unwrap();

        let body = &builder.to_request()["body"];
        assert_eq!(body["min_score"], json!(1));
        assert_eq!(body["aggs"], json!({"by_status": {"terms": {"field": "status"}}}));
        assert!(body["query"]["bool"].is_object());
    }

    #[tokio::test]
    async fn test_get_hydrates_in_hit_order() {
        let (client, ctx) = scripted_client();
        client.push_response(
            "search",
            Ok(search_response(
                2,
                vec![
                    json!({"_id": "3", "_score": 2.0}),
                    json!({"_id": "1", "_score": 1.0}),
                ],
            )),
        );
        let source = UserSource::new(users());
        let mut builder = builder(ctx, source);

        let found = builder.get().await.unwrap();
        let ids: Vec<String> = found.iter().map(|u| u.search_key()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert_eq!(found[0].search_data().unwrap()["_score"], json!(2.0));
        assert_eq!(builder.last_result_at("hits.total"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_get_with_no_hits_skips_hydration() {
        let (client, ctx) = scripted_client();
        client.push_response("search", Ok(search_response(0, vec![])));
        let source = UserSource::new(users());
        let mut builder = builder(ctx, source);

        assert!(builder.get().await.unwrap().is_empty());
        assert_eq!(builder.source().hydrations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_passes_relations() {
        let (client, ctx) = scripted_client();
        client.push_response(
            "search",
            Ok(search_response(1, vec![json!({"_id": "2"})])),
        );
        let mut builder = builder(ctx, UserSource::new(users()));
        builder.with(["posts"]);

        builder.get().await.unwrap();
        assert_eq!(
            *builder.source().last_relations.lock().unwrap(),
            vec!["posts".to_string()]
        );
    }

    #[tokio::test]
    async fn test_count_sends_size_zero() {
        let (client, ctx) = scripted_client();
        client.push_response(
            "search",
            Ok(json!({"hits": {"total": {"value": 42, "relation": "eq"}, "hits": []}})),
        );
        let mut builder = builder(ctx, UserSource::new(vec![]));
        builder.limit(5).add_order_by("name", SortOrder::Asc);

        assert_eq!(builder.count().await.unwrap(), 42);
        let (_, request) = client.calls().pop().unwrap();
        assert_eq!(request["body"]["size"], json!(0));
        assert!(request["body"].get("sort").is_none());
    }

    #[tokio::test]
    async fn test_raw_overrides_top_level_params() {
        let (client, ctx) = scripted_client();
        let mut builder = builder(ctx, UserSource::new(vec![]));

        let mut overrides = Map::new();
        overrides.insert("index".to_string(), json!("archive"));
        overrides.insert("routing".to_string(), json!("eu"));
        builder.raw_with(overrides).await.unwrap();

        let (operation, request) = client.calls().pop().unwrap();
        assert_eq!(operation, "search");
        assert_eq!(request["index"], json!("archive"));
        assert_eq!(request["routing"], json!("eu"));
    }

    #[tokio::test]
    async fn test_find_hydrates_document() {
        let (client, ctx) = scripted_client();
        client.push_response(
            "get",
            Ok(json!({"_index": "app", "_id": "2", "found": true, "_source": {"name": "Grace"}})),
        );
        let mut builder = builder(ctx, UserSource::new(users()));

        let user = builder.find("2").await.unwrap().unwrap();
        assert_eq!(user.name, "Grace");
        assert_eq!(user.search_data().unwrap()["_source"]["name"], json!("Grace"));

        let (_, request) = client.calls().pop().unwrap();
        assert_eq!(request, json!({"index": "app", "type": "users", "id": "2"}));
    }

    #[tokio::test]
    async fn test_find_missing_document_is_none() {
        let (client, ctx) = scripted_client();
        client.push_response("get", Err(ClientError::NotFound("users/9".to_string())));
        let mut builder = builder(ctx, UserSource::new(users()));

        assert!(builder.find("9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_propagates_errors_outside_production() {
        let config = ConfigBuilder::new()
            .default_index("app")
            .environment(Environment::Development)
            .build();
        let (client, ctx) = context(config);
        client.push_response(
            "get",
            Err(ClientError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
        );
        let mut builder = builder(ctx, UserSource::new(users()));

        let err = builder.find("1").await.unwrap_err();
        assert!(matches!(err, QuarryError::Client(ClientError::Status { status: 500, .. })));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_find_suppresses_errors_in_production() {
        let (client, ctx) = scripted_client();
        client.push_response("get", Err(ClientError::Transport("refused".to_string())));
        let mut builder = builder(ctx, UserSource::new(users()));

        assert!(builder.find("1").await.unwrap().is_none());
        assert!(logs_contain("Suppressed error while fetching users <1>"));
    }

    #[tokio::test]
    async fn test_paginate_counts_then_fetches_page() {
        let (client, ctx) = scripted_client();
        client.push_response("search", Ok(search_response(3, vec![])));
        client.push_response(
            "search",
            Ok(search_response(3, vec![json!({"_id": "3"})])),
        );
        let mut builder = builder(ctx, UserSource::new(users()));

        let page = builder.paginate(Some(2), "page", Some(2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.last_page(), 2);
        assert_eq!(page.len(), 1);

        let (_, request) = client.calls().pop().unwrap();
        assert_eq!(request["body"]["size"], json!(2));
        assert_eq!(request["body"]["from"], json!(2));
    }

    #[rstest]
    #[case(usize::MAX, 10)]
    #[case(usize::MAX / 2, 4)]
    fn test_for_page_saturates_huge_pages(#[case] page: usize, #[case] per_page: usize) {
        let (_client, ctx) = scripted_client();
        let mut builder = builder(ctx, UserSource::new(vec![]));
        builder.for_page(page, per_page);

        assert_eq!(builder.get_limit(), Some(per_page));
        assert_eq!(builder.get_offset(), Some(usize::MAX));
    }

    #[tokio::test]
    async fn test_paginate_far_past_last_page() {
        let (client, ctx) = scripted_client();
        client.push_response("search", Ok(search_response(3, vec![])));
        let mut builder = builder(ctx, UserSource::new(users()));

        let page = builder
            .paginate(Some(10), "page", Some(usize::MAX))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert!(page.is_empty());

        let (_, request) = client.calls().pop().unwrap();
        assert_eq!(request["body"]["from"], json!(usize::MAX));
    }

    #[tokio::test]
    async fn test_paginate_empty_result_short_circuits() {
        let (client, ctx) = scripted_client();
        client.push_response("search", Ok(search_response(0, vec![])));
        let mut builder = builder(ctx, UserSource::new(users()));

        let page = builder.paginate(None, "page", None).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.per_page, 15);
        assert_eq!(page.current_page, 1);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_explain_sends_query_only() {
        let (client, ctx) = scripted_client();
        client.push_response("explain", Ok(json!({"matched": true})));
        let mut builder = builder(ctx, UserSource::new(vec![]));
        builder.limit(3);

        let result = builder.explain("7").await.unwrap();
        assert_eq!(result["matched"], json!(true));

        let (_, request) = client.calls().pop().unwrap();
        assert_eq!(request["id"], json!("7"));
        assert_eq!(request["body"], json!({"query": {"match_all": {}}}));
    }

    #[test]
    fn test_unresolvable_index_fails() {
        let config = ConfigBuilder::new().build();
        let (_client, ctx) = context(config);

        let result = Builder::new(Arc::new(UserSource::new(vec![])), ctx);
        assert!(matches!(result, Err(QuarryError::NoIndexForType(_))));
    }
}
