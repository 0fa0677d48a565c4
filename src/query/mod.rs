//! Typed query expressions.
//!
//! Every query is a small value object that turns itself into the JSON
//! query-DSL form on demand. A query whose mandatory state is missing
//! serializes to `None` and is dropped by whatever contains it.

pub mod compound;
pub mod factory;
pub mod fulltext;
pub mod term;

pub use compound::{BoolQuery, Bucket, BucketArg, BucketValue};
pub use factory::Factory;
pub use fulltext::{
    MatchPhrasePrefixQuery, MatchPhraseQuery, MatchQuery, MultiMatchQuery, MultiMatchType,
    Operator, ZeroTermsQuery,
};
pub use term::{RangeQuery, TermQuery, TermsQuery};

use serde_json::{Map, Value};
use std::fmt::Debug;

/// A query-DSL expression
pub trait Query: Debug + Send + Sync {
    /// JSON form of the query, or `None` if the query is incomplete.
    fn to_value(&self) -> Option<Value>;
}

/// Optional per-query parameters.
///
/// Each query type exposes setters only for the modifiers it supports; they
/// all land here and are written out in a fixed order next to the query's
/// own parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifiers {
    pub boost: Option<f64>,
    pub analyzer: Option<String>,
    pub operator: Option<Operator>,
    pub minimum_should_match: Option<Value>,
    pub max_expansions: Option<u32>,
    pub zero_terms_query: Option<ZeroTermsQuery>,
    pub format: Option<String>,
    pub time_zone: Option<String>,
}

impl Modifiers {
    /// Write every set modifier into `params` under its snake_case key.
    pub fn inject(&self, params: &mut Map<String, Value>) {
        if let Some(boost) = self.boost {
            params.insert("boost".to_string(), Value::from(boost));
        }
        if let Some(analyzer) = &self.analyzer {
            params.insert("analyzer".to_string(), Value::from(analyzer.as_str()));
        }
        if let Some(operator) = self.operator {
            params.insert("operator".to_string(), Value::from(operator.as_ref()));
        }
        if let Some(minimum) = &self.minimum_should_match {
            params.insert("minimum_should_match".to_string(), minimum.clone());
        }
        if let Some(max_expansions) = self.max_expansions {
            params.insert("max_expansions".to_string(), Value::from(max_expansions));
        }
        if let Some(zero_terms) = self.zero_terms_query {
            params.insert("zero_terms_query".to_string(), Value::from(zero_terms.as_ref()));
        }
        if let Some(format) = &self.format {
            params.insert("format".to_string(), Value::from(format.as_str()));
        }
        if let Some(time_zone) = &self.time_zone {
            params.insert("time_zone".to_string(), Value::from(time_zone.as_str()));
        }
    }
}

/// `{key: {inner_key: params}}`
pub(crate) fn wrap(key: &str, inner_key: &str, params: Map<String, Value>) -> Value {
    let mut inner = Map::new();
    inner.insert(inner_key.to_string(), Value::Object(params));
    let mut outer = Map::new();
    outer.insert(key.to_string(), Value::Object(inner));
    Value::Object(outer)
}

/// Setter for the `boost` modifier, shared by every query type.
macro_rules! boostable {
    ($ty:ty) => {
        impl $ty {
            pub fn boost(mut self, value: f64) -> Self {
                self.modifiers.boost = Some(value);
                self
            }
        }
    };
}

pub(crate) use boostable;
