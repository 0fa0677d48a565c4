//! Search service transport.
//!
//! Requests are described by JSON parameter objects in the shape
//! `{index, type, id?, body?, refresh?, ...}`. Keys other than these are
//! passed through as URL parameters.

pub mod http;

pub use http::HttpClient;

use crate::error::ClientError;
use async_trait::async_trait;
use serde_json::Value;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Operations the library needs from a search service
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, params: &Value) -> ClientResult<Value>;

    /// Fetch one document. Missing documents fail with `ClientError::NotFound`.
    async fn get(&self, params: &Value) -> ClientResult<Value>;

    async fn explain(&self, params: &Value) -> ClientResult<Value>;

    async fn index(&self, params: &Value) -> ClientResult<Value>;

    /// Partial document update (`body: {doc: {...}}`).
    async fn update(&self, params: &Value) -> ClientResult<Value>;

    async fn delete(&self, params: &Value) -> ClientResult<Value>;

    /// `body` is the list of alternating action and source lines.
    async fn bulk(&self, params: &Value) -> ClientResult<Value>;

    async fn index_exists(&self, index: &str) -> ClientResult<bool>;

    /// `params` carries `index` and the creation `body` (mappings and settings).
    async fn create_index(&self, params: &Value) -> ClientResult<Value>;

    async fn delete_index(&self, index: &str) -> ClientResult<Value>;
}
