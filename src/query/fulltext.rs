//! Full-text queries.

use super::{Modifiers, Query, boostable, wrap};
use crate::error::{QuarryError, Result};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

/// Boolean logic used to interpret text in a match query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Operator {
    And,
    Or,
}

/// What a match query returns when the analyzer removes every token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ZeroTermsQuery {
    None,
    All,
}

/// How a multi-match query combines per-field scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum MultiMatchType {
    #[default]
    BestFields,
    MostFields,
    CrossFields,
    Phrase,
    PhrasePrefix,
}

/// `{match: {field: {query, boost?, operator?, minimum_should_match?, zero_terms_query?}}}`
#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    field: String,
    query: Value,
    modifiers: Modifiers,
}

impl MatchQuery {
    pub fn new(field: impl Into<String>, query: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            query: query.into(),
            modifiers: Modifiers::default(),
        }
    }

    /// Fails with `UnsupportedOperator` for anything but `and`/`or`.
    pub fn operator(self, operator: &str) -> Result<Self> {
        let parsed = operator
            .parse::<Operator>()
            .map_err(|_| QuarryError::UnsupportedOperator(operator.to_string()))?;
        Ok(self.with_operator(parsed))
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.modifiers.operator = Some(operator);
        self
    }

    pub fn minimum_should_match(mut self, value: impl Into<Value>) -> Self {
        self.modifiers.minimum_should_match = Some(value.into());
        self
    }

    pub fn zero_terms_query(mut self, value: &str) -> Result<Self> {
        let parsed = value
            .parse::<ZeroTermsQuery>()
            .map_err(|_| QuarryError::unsupported_type(value))?;
        self.modifiers.zero_terms_query = Some(parsed);
        Ok(self)
    }
}

boostable!(MatchQuery);

impl Query for MatchQuery {
    fn to_value(&self) -> Option<Value> {
        let mut params = Map::new();
        params.insert("query".to_string(), self.query.clone());
        self.modifiers.inject(&mut params);

        Some(wrap("match", &self.field, params))
    }
}

/// `{match_phrase: {field: {query, boost?, analyzer?}}}`
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPhraseQuery {
    field: String,
    query: Value,
    modifiers: Modifiers,
}

impl MatchPhraseQuery {
    pub fn new(field: impl Into<String>, query: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            query: query.into(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.modifiers.analyzer = Some(analyzer.into());
        self
    }
}

boostable!(MatchPhraseQuery);

impl Query for MatchPhraseQuery {
    fn to_value(&self) -> Option<Value> {
        let mut params = Map::new();
        params.insert("query".to_string(), self.query.clone());
        self.modifiers.inject(&mut params);

        Some(wrap("match_phrase", &self.field, params))
    }
}

/// `{match_phrase_prefix: {field: {query, boost?, analyzer?, max_expansions?}}}`
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPhrasePrefixQuery {
    field: String,
    query: Value,
    modifiers: Modifiers,
}

impl MatchPhrasePrefixQuery {
    pub fn new(field: impl Into<String>, query: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            query: query.into(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.modifiers.analyzer = Some(analyzer.into());
        self
    }

    pub fn max_expansions(mut self, max_expansions: u32) -> Self {
        self.modifiers.max_expansions = Some(max_expansions);
        self
    }
}

boostable!(MatchPhrasePrefixQuery);

impl Query for MatchPhrasePrefixQuery {
    fn to_value(&self) -> Option<Value> {
        let mut params = Map::new();
        params.insert("query".to_string(), self.query.clone());
        self.modifiers.inject(&mut params);

        Some(wrap("match_phrase_prefix", &self.field, params))
    }
}

/// `{multi_match: {query, fields, boost?, type?}}`
#[derive(Debug, Clone, PartialEq)]
pub struct MultiMatchQuery {
    fields: Value,
    query: Value,
    kind: Option<MultiMatchType>,
    modifiers: Modifiers,
}

impl MultiMatchQuery {
    /// `fields` is either a single field name or an array of them.
    pub fn new(fields: impl Into<Value>, query: impl Into<Value>) -> Self {
        Self {
            fields: fields.into(),
            query: query.into(),
            kind: None,
            modifiers: Modifiers::default(),
        }
    }

    /// Fails with `UnsupportedType` outside best_fields, most_fields,
    /// cross_fields, phrase and phrase_prefix.
    pub fn kind(self, kind: &str) -> Result<Self> {
        let parsed = kind
            .parse::<MultiMatchType>()
            .map_err(|_| QuarryError::unsupported_type(kind))?;
        Ok(self.with_kind(parsed))
    }

    pub fn with_kind(mut self, kind: MultiMatchType) -> Self {
        self.kind = Some(kind);
        self
    }
}

boostable!(MultiMatchQuery);

impl Query for MultiMatchQuery {
    fn to_value(&self) -> Option<Value> {
        let mut params = Map::new();
        params.insert("query".to_string(), self.query.clone());
        params.insert("fields".to_string(), self.fields.clone());
        self.modifiers.inject(&mut params);
        if let Some(kind) = self.kind {
            params.insert("type".to_string(), Value::from(kind.as_ref()));
        }

        let mut result = Map::new();
        result.insert("multi_match".to_string(), Value::Object(params));
        Some(Value::Object(result))
    }
}
