//! Construction of queries by helper name.

use super::{
    BoolQuery, MatchPhrasePrefixQuery, MatchPhraseQuery, MatchQuery, MultiMatchQuery, Query,
    RangeQuery, TermQuery, TermsQuery,
};
use crate::error::{QuarryError, Result};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind {
    Range,
    Term,
    Terms,
    Match,
    MatchPhrase,
    MatchPhrasePrefix,
    MultiMatch,
    Bool,
}

/// Helper names accepted by [`Factory::make`], in both spellings.
static SUPPORTED_QUERIES: Lazy<HashMap<&'static str, QueryKind>> = Lazy::new(|| {
    HashMap::from([
        ("range", QueryKind::Range),
        ("term", QueryKind::Term),
        ("terms", QueryKind::Terms),
        ("match", QueryKind::Match),
        ("matchPhrase", QueryKind::MatchPhrase),
        ("match_phrase", QueryKind::MatchPhrase),
        ("matchPhrasePrefix", QueryKind::MatchPhrasePrefix),
        ("match_phrase_prefix", QueryKind::MatchPhrasePrefix),
        ("multiMatch", QueryKind::MultiMatch),
        ("multi_match", QueryKind::MultiMatch),
        ("bool", QueryKind::Bool),
    ])
});

/// Builds query objects, either through typed helpers or by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct Factory;

impl Factory {
    pub fn new() -> Self {
        Self
    }

    /// Build the query registered under `name` from positional arguments.
    ///
    /// Field-value queries take `[field, value]`, `range` takes `[field]`,
    /// `multi_match` takes `[fields, query]` and `bool` takes nothing.
    pub fn make(&self, name: &str, args: Vec<Value>) -> Result<Box<dyn Query>> {
        let kind = SUPPORTED_QUERIES
            .get(name)
            .copied()
            .ok_or_else(|| QuarryError::UnsupportedQuery(name.to_string()))?;

        let mut args = args.into_iter();
        let query: Box<dyn Query> = match kind {
            QueryKind::Range => Box::new(self.range(field_arg(name, args.next())?)),
            QueryKind::Term => {
                let field = field_arg(name, args.next())?;
                Box::new(self.term(field, value_arg(name, args.next())?))
            }
            QueryKind::Terms => {
                let field = field_arg(name, args.next())?;
                let values = value_arg(name, args.next())?;
                if !values.is_array() {
                    return Err(QuarryError::UnknownArgumentType(format!(
                        "{name} expects an array of values"
                    )));
                }
                Box::new(self.terms(field, values))
            }
            QueryKind::Match => {
                let field = field_arg(name, args.next())?;
                Box::new(self.match_query(field, value_arg(name, args.next())?))
            }
            QueryKind::MatchPhrase => {
                let field = field_arg(name, args.next())?;
                Box::new(self.match_phrase(field, value_arg(name, args.next())?))
            }
            QueryKind::MatchPhrasePrefix => {
                let field = field_arg(name, args.next())?;
                Box::new(self.match_phrase_prefix(field, value_arg(name, args.next())?))
            }
            QueryKind::MultiMatch => {
                let fields = match args.next() {
                    Some(fields @ (Value::String(_) | Value::Array(_))) => fields,
                    other => return Err(unexpected(name, other.as_ref())),
                };
                Box::new(self.multi_match(fields, value_arg(name, args.next())?))
            }
            QueryKind::Bool => Box::new(self.bool_query()),
        };

        Ok(query)
    }

    pub fn range(&self, field: impl Into<String>) -> RangeQuery {
        RangeQuery::new(field)
    }

    pub fn term(&self, field: impl Into<String>, value: impl Into<Value>) -> TermQuery {
        TermQuery::new(field, value)
    }

    pub fn terms(&self, field: impl Into<String>, values: impl Into<Value>) -> TermsQuery {
        TermsQuery::new(field, values)
    }

    pub fn match_query(&self, field: impl Into<String>, query: impl Into<Value>) -> MatchQuery {
        MatchQuery::new(field, query)
    }

    pub fn match_phrase(
        &self,
        field: impl Into<String>,
        query: impl Into<Value>,
    ) -> MatchPhraseQuery {
        MatchPhraseQuery::new(field, query)
    }

    pub fn match_phrase_prefix(
        &self,
        field: impl Into<String>,
        query: impl Into<Value>,
    ) -> MatchPhrasePrefixQuery {
        MatchPhrasePrefixQuery::new(field, query)
    }

    pub fn multi_match(&self, fields: impl Into<Value>, query: impl Into<Value>) -> MultiMatchQuery {
        MultiMatchQuery::new(fields, query)
    }

    pub fn bool_query(&self) -> BoolQuery {
        BoolQuery::new()
    }

    /// True when `name` is a helper [`Factory::make`] understands.
    pub fn supports(&self, name: &str) -> bool {
        SUPPORTED_QUERIES.contains_key(name)
    }
}

fn field_arg(name: &str, arg: Option<Value>) -> Result<String> {
    match arg {
        Some(Value::String(field)) => Ok(field),
        other => Err(unexpected(name, other.as_ref())),
    }
}

fn value_arg(name: &str, arg: Option<Value>) -> Result<Value> {
    match arg {
        Some(Value::Null) | None => Err(unexpected(name, None)),
        Some(value) => Ok(value),
    }
}

fn unexpected(name: &str, arg: Option<&Value>) -> QuarryError {
    match arg {
        Some(value) => {
            QuarryError::UnknownArgumentType(format!("{name} does not accept {value}"))
        }
        None => QuarryError::UnknownArgumentType(format!("{name} is missing an argument")),
    }
}
