//! REST transport over reqwest.

use super::{ClientResult, SearchClient};
use crate::config::{Config, HostConfig};
use crate::error::ClientError;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Keys of a parameter object that are not forwarded as URL parameters
const RESERVED_PARAMS: [&str; 4] = ["index", "type", "id", "body"];

/// Client for the search service REST API.
///
/// Only the first configured host is used.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl HttpClient {
    pub fn new(host: &HostConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let credentials = match (&host.user, &host.pass) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            (Some(user), None) => Some((user.clone(), String::new())),
            _ => None,
        };

        Ok(Self {
            http,
            base_url: host.base_url(),
            credentials,
        })
    }

    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let host = config
            .hosts
            .first()
            .cloned()
            .unwrap_or_default();
        Self::new(&host)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, params: &Value) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, url).query(&url_params(params));
        if let Some((user, pass)) = &self.credentials {
            request = request.basic_auth(user, Some(pass));
        }
        request
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!("Search service answered {}", status);

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(text));
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        params: &Value,
    ) -> ClientResult<Value> {
        let mut request = self.request(method, path, params);
        if let Some(body) = params.get("body") {
            request = request.json(body);
        }
        self.send(request).await
    }
}

#[async_trait]
impl SearchClient for HttpClient {
    async fn search(&self, params: &Value) -> ClientResult<Value> {
        let path = format!("{}/_search", collection_path(params));
        self.send_json(Method::POST, &path, params).await
    }

    async fn get(&self, params: &Value) -> ClientResult<Value> {
        let path = document_path(params)?;
        self.send(self.request(Method::GET, &path, params)).await
    }

    async fn explain(&self, params: &Value) -> ClientResult<Value> {
        let path = format!("{}/_explain", document_path(params)?);
        self.send_json(Method::POST, &path, params).await
    }

    async fn index(&self, params: &Value) -> ClientResult<Value> {
        let path = document_path(params)?;
        self.send_json(Method::PUT, &path, params).await
    }

    async fn update(&self, params: &Value) -> ClientResult<Value> {
        let path = format!("{}/_update", document_path(params)?);
        self.send_json(Method::POST, &path, params).await
    }

    async fn delete(&self, params: &Value) -> ClientResult<Value> {
        let path = document_path(params)?;
        self.send(self.request(Method::DELETE, &path, params)).await
    }

    async fn bulk(&self, params: &Value) -> ClientResult<Value> {
        let body = ndjson(params.get("body"))?;
        let request = self
            .request(Method::POST, "/_bulk", params)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        self.send(request).await
    }

    async fn index_exists(&self, index: &str) -> ClientResult<bool> {
        let path = format!("/{index}");
        match self.send(self.request(Method::HEAD, &path, &Value::Null)).await {
            Ok(_) => Ok(true),
            Err(ClientError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_index(&self, params: &Value) -> ClientResult<Value> {
        let path = format!("/{}", required_str(params, "index")?);
        self.send_json(Method::PUT, &path, params).await
    }

    async fn delete_index(&self, index: &str) -> ClientResult<Value> {
        let path = format!("/{index}");
        self.send(self.request(Method::DELETE, &path, &Value::Null))
            .await
    }
}

fn required_str<'a>(params: &'a Value, key: &str) -> ClientResult<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::Transport(format!("request is missing '{key}'")))
}

/// `/{index}` or `/{index}/{type}`; empty when no index is given.
fn collection_path(params: &Value) -> String {
    let mut path = String::new();
    if let Some(index) = params.get("index").and_then(Value::as_str) {
        path.push('/');
        path.push_str(index);
        if let Some(doc_type) = params.get("type").and_then(Value::as_str) {
            path.push('/');
            path.push_str(doc_type);
        }
    }
    path
}

/// `/{index}/{type}/{id}`, with `_doc` standing in for a missing type.
fn document_path(params: &Value) -> ClientResult<String> {
    let index = required_str(params, "index")?;
    let doc_type = params
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("_doc");
    let id = match params.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(ClientError::Transport("request is missing 'id'".to_string())),
    };
    Ok(format!("/{index}/{doc_type}/{id}"))
}

/// Every non-reserved scalar parameter, rendered for the query string.
fn url_params(params: &Value) -> Vec<(String, String)> {
    let Some(map) = params.as_object() else {
        return Vec::new();
    };

    map.iter()
        .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str()))
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

/// One JSON document per line, newline terminated.
fn ndjson(body: Option<&Value>) -> ClientResult<String> {
    let lines = match body {
        Some(Value::Array(lines)) => lines,
        _ => {
            return Err(ClientError::Transport(
                "bulk request body must be a list".to_string(),
            ));
        }
    };

    let mut out = String::new();
    for line in lines {
        out.push_str(&line.to_string());
        out.push('\n');
    }
    Ok(out)
}
