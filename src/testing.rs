//! In-memory doubles shared by the unit tests.

use crate::builder::Builder;
use crate::client::{ClientResult, SearchClient};
use crate::config::{Config, ConfigBuilder};
use crate::engine::SearchContext;
use crate::error::Result;
use crate::schema::{FieldType, SchemaDefinition};
use crate::searchable::{Omittable, PartiallyUpdatable, Searchable, SearchableSource};
use crate::types::Refresh;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Client that records every call and replays queued responses.
#[derive(Default)]
pub struct ScriptedClient {
    calls: Mutex<Vec<(String, Value)>>,
    responses: Mutex<HashMap<String, VecDeque<ClientResult<Value>>>>,
    indices: Mutex<HashSet<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response of `operation`.
    pub fn push_response(&self, operation: &str, response: ClientResult<Value>) {
        self.responses
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn add_index(&self, index: &str) {
        self.indices.lock().unwrap().insert(index.to_string());
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(operation, _)| operation.clone())
            .collect()
    }

    fn respond(&self, operation: &str, params: &Value) -> ClientResult<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((operation.to_string(), params.clone()));

        let queued = self
            .responses
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front);
        match queued {
            Some(response) => response,
            None => Ok(default_response(operation)),
        }
    }
}

fn default_response(operation: &str) -> Value {
    match operation {
        "search" => search_response(0, vec![]),
        "bulk" => json!({"errors": false, "items": []}),
        _ => json!({"acknowledged": true}),
    }
}

#[async_trait]
impl SearchClient for ScriptedClient {
    async fn search(&self, params: &Value) -> ClientResult<Value> {
        self.respond("search", params)
    }

    async fn get(&self, params: &Value) -> ClientResult<Value> {
        self.respond("get", params)
    }

    async fn explain(&self, params: &Value) -> ClientResult<Value> {
        self.respond("explain", params)
    }

    async fn index(&self, params: &Value) -> ClientResult<Value> {
        self.respond("index", params)
    }

    async fn update(&self, params: &Value) -> ClientResult<Value> {
        self.respond("update", params)
    }

    async fn delete(&self, params: &Value) -> ClientResult<Value> {
        self.respond("delete", params)
    }

    async fn bulk(&self, params: &Value) -> ClientResult<Value> {
        self.respond("bulk", params)
    }

    async fn index_exists(&self, index: &str) -> ClientResult<bool> {
        self.respond("index_exists", &json!({ "index": index }))?;
        Ok(self.indices.lock().unwrap().contains(index))
    }

    async fn create_index(&self, params: &Value) -> ClientResult<Value> {
        if let Some(index) = params.get("index").and_then(Value::as_str) {
            self.add_index(index);
        }
        self.respond("create_index", params)
    }

    async fn delete_index(&self, index: &str) -> ClientResult<Value> {
        self.indices.lock().unwrap().remove(index);
        self.respond("delete_index", &json!({ "index": index }))
    }
}

/// `{hits: {total, hits}}`
pub fn search_response(total: u64, hits: Vec<Value>) -> Value {
    json!({"took": 1, "hits": {"total": total, "hits": hits}})
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub hidden: bool,
    pub refresh: Refresh,
    search_data: Option<Value>,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            hidden: false,
            refresh: Refresh::False,
            search_data: None,
        }
    }
}

impl Searchable for User {
    fn search_key(&self) -> String {
        self.id.to_string()
    }

    fn to_search_document(&self) -> Map<String, Value> {
        let mut document = Map::new();
        document.insert("id".to_string(), Value::from(self.id));
        document.insert("name".to_string(), Value::from(self.name.as_str()));
        document.insert("email".to_string(), Value::from(self.email.as_str()));
        document
    }

    fn set_search_data(&mut self, data: Value) {
        self.search_data = Some(data);
    }

    fn search_data(&self) -> Option<&Value> {
        self.search_data.as_ref()
    }

    fn refresh(&self) -> Refresh {
        self.refresh
    }

    fn partial_updates(&self) -> Option<&dyn PartiallyUpdatable> {
        Some(self)
    }

    fn omittable(&self) -> Option<&dyn Omittable> {
        Some(self)
    }
}

impl PartiallyUpdatable for User {
    fn partial_update_map(&self) -> HashMap<String, Vec<String>> {
        HashMap::from([
            ("email".to_string(), vec!["email".to_string()]),
            (
                "name".to_string(),
                vec!["name".to_string(), "display_name".to_string()],
            ),
            (
                "first_name".to_string(),
                vec!["name".to_string(), "display_name".to_string()],
            ),
        ])
    }
}

impl Omittable for User {
    fn should_be_omitted(&self) -> bool {
        self.hidden
    }
}

/// In-memory user table
pub struct UserSource {
    users: Vec<User>,
    type_name: String,
    pub hydrations: AtomicUsize,
    pub last_relations: Mutex<Vec<String>>,
}

impl UserSource {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users,
            type_name: "users".to_string(),
            hydrations: AtomicUsize::new(0),
            last_relations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_type(mut self, type_name: &str) -> Self {
        self.type_name = type_name.to_string();
        self
    }
}

#[async_trait]
impl SearchableSource for UserSource {
    type Entity = User;

    fn search_type(&self) -> &str {
        &self.type_name
    }

    fn type_mapping(&self) -> Map<String, Value> {
        SchemaDefinition::new()
            .field("id", FieldType::Long)
            .field("name", FieldType::text())
            .field("email", FieldType::keyword())
            .to_mapping()
    }

    fn type_settings(&self) -> Map<String, Value> {
        let mut settings = Map::new();
        settings.insert("number_of_shards".to_string(), Value::from(1));
        settings
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.search_key() == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String], relations: &[String]) -> Result<Vec<User>> {
        self.hydrations.fetch_add(1, Ordering::SeqCst);
        *self.last_relations.lock().unwrap() = relations.to_vec();

        Ok(ids
            .iter()
            .filter_map(|id| self.users.iter().find(|u| u.search_key() == *id))
            .cloned()
            .collect())
    }

    async fn chunk(&self, offset: usize, limit: usize) -> Result<Vec<User>> {
        Ok(self.users.iter().skip(offset).take(limit).cloned().collect())
    }
}

/// Context over a fresh scripted client.
pub fn context(config: Config) -> (Arc<ScriptedClient>, SearchContext) {
    let client = Arc::new(ScriptedClient::new());
    let ctx = SearchContext::new(config, client.clone());
    (client, ctx)
}

/// Context with `default_index = "app"` in production.
pub fn scripted_client() -> (Arc<ScriptedClient>, SearchContext) {
    context(ConfigBuilder::new().default_index("app").build())
}

pub fn builder(ctx: SearchContext, source: UserSource) -> Builder<UserSource> {
    Builder::new(Arc::new(source), ctx).unwrap()
}
