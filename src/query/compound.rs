//! Boolean composition of queries.

use super::{Modifiers, Query};
use crate::error::{QuarryError, Result};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

/// Occurrence bucket of a bool query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Bucket {
    Must,
    Should,
    Filter,
    MustNot,
}

impl Bucket {
    /// Parse a bucket name, rejecting anything but the four known buckets.
    pub fn parse(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| QuarryError::unsupported_type(name))
    }
}

/// Content of a bucket: a list of queries or one nested bool query
#[derive(Debug)]
pub enum BucketValue {
    List(Vec<Box<dyn Query>>),
    Compound(BoolQuery),
}

impl BucketValue {
    fn to_value(&self) -> Option<Value> {
        match self {
            BucketValue::List(queries) => {
                let items: Vec<Value> = queries.iter().filter_map(|q| q.to_value()).collect();
                if items.is_empty() {
                    None
                } else {
                    Some(Value::Array(items))
                }
            }
            BucketValue::Compound(query) => query.to_value(),
        }
    }
}

/// Argument accepted by [`BoolQuery::add`]
#[derive(Debug)]
pub enum BucketArg {
    Query(Box<dyn Query>),
    Queries(Vec<Box<dyn Query>>),
    Compound(BoolQuery),
}

/// `{bool: {must?, should?, filter?, must_not?, minimum_should_match?, boost?}}`
///
/// Buckets keep their insertion order. Adding queries to a bucket appends to
/// its list, while setting a nested bool query replaces the whole bucket.
#[derive(Debug, Default)]
pub struct BoolQuery {
    buckets: Vec<(Bucket, BucketValue)>,
    modifiers: Modifiers,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(&mut self, query: impl Query + 'static) -> &mut Self {
        self.push(Bucket::Must, Box::new(query))
    }

    pub fn should(&mut self, query: impl Query + 'static) -> &mut Self {
        self.push(Bucket::Should, Box::new(query))
    }

    pub fn filter(&mut self, query: impl Query + 'static) -> &mut Self {
        self.push(Bucket::Filter, Box::new(query))
    }

    pub fn must_not(&mut self, query: impl Query + 'static) -> &mut Self {
        self.push(Bucket::MustNot, Box::new(query))
    }

    /// Append a query to `bucket`. A nested bool query previously stored
    /// there is dropped.
    pub fn push(&mut self, bucket: Bucket, query: Box<dyn Query>) -> &mut Self {
        self.extend(bucket, vec![query])
    }

    pub fn extend(&mut self, bucket: Bucket, queries: Vec<Box<dyn Query>>) -> &mut Self {
        match self.slot_mut(bucket) {
            Some(BucketValue::List(existing)) => existing.extend(queries),
            Some(slot) => *slot = BucketValue::List(queries),
            None => self.buckets.push((bucket, BucketValue::List(queries))),
        }
        self
    }

    /// Store a nested bool query as the whole content of `bucket`.
    pub fn set_compound(&mut self, bucket: Bucket, query: BoolQuery) -> &mut Self {
        match self.slot_mut(bucket) {
            Some(slot) => *slot = BucketValue::Compound(query),
            None => self.buckets.push((bucket, BucketValue::Compound(query))),
        }
        self
    }

    /// Add to a bucket given by name.
    pub fn add(&mut self, name: &str, arg: BucketArg) -> Result<&mut Self> {
        let bucket = Bucket::parse(name)?;
        Ok(match arg {
            BucketArg::Query(query) => self.push(bucket, query),
            BucketArg::Queries(queries) => self.extend(bucket, queries),
            BucketArg::Compound(query) => self.set_compound(bucket, query),
        })
    }

    /// Nested bool query stored in `bucket`, created empty when the bucket
    /// is unset. Fails if the bucket already holds a list of queries.
    pub fn nested(&mut self, bucket: Bucket) -> Result<&mut BoolQuery> {
        if self.slot_mut(bucket).is_none() {
            self.buckets
                .push((bucket, BucketValue::Compound(BoolQuery::new())));
        }

        match self.slot_mut(bucket) {
            Some(BucketValue::Compound(query)) => Ok(query),
            _ => Err(QuarryError::UnknownArgumentType(format!(
                "bucket <{bucket}> holds a list of queries"
            ))),
        }
    }

    pub fn bucket(&self, bucket: Bucket) -> Option<&BucketValue> {
        self.buckets
            .iter()
            .find(|(b, _)| *b == bucket)
            .map(|(_, value)| value)
    }

    pub fn minimum_should_match(&mut self, value: impl Into<Value>) -> &mut Self {
        self.modifiers.minimum_should_match = Some(value.into());
        self
    }

    pub fn boost(&mut self, value: f64) -> &mut Self {
        self.modifiers.boost = Some(value);
        self
    }

    /// True when serialization would produce nothing.
    pub fn is_empty(&self) -> bool {
        self.to_value().is_none()
    }

    fn slot_mut(&mut self, bucket: Bucket) -> Option<&mut BucketValue> {
        self.buckets
            .iter_mut()
            .find(|(b, _)| *b == bucket)
            .map(|(_, value)| value)
    }
}

impl Query for BoolQuery {
    fn to_value(&self) -> Option<Value> {
        let mut params = Map::new();
        for (bucket, value) in &self.buckets {
            if let Some(value) = value.to_value() {
                params.insert(bucket.to_string(), value);
            }
        }

        if params.is_empty() {
            return None;
        }
        self.modifiers.inject(&mut params);

        let mut result = Map::new();
        result.insert("bool".to_string(), Value::Object(params));
        Some(Value::Object(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{MatchQuery, RangeQuery, TermQuery};
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_must_and_filter() {
        let mut query = BoolQuery::new();
        query
            .must(TermQuery::new("status", "active"))
            .filter(RangeQuery::new("age").gte(18));

        assert_eq!(
            query.to_value(),
            Some(json!({"bool": {
                "must": [{"term": {"status": {"value": "active"}}}],
                "filter": [{"range": {"age": {"gte": 18}}}]
            }}))
        );
    }

    #[test]
    fn test_incomplete_children_are_dropped() {
        let mut query = BoolQuery::new();
        query
            .must(TermQuery::new("a", 1))
            .must(RangeQuery::new("age"))
            .should(RangeQuery::new("score"));

        assert_eq!(
            query.to_value(),
            Some(json!({"bool": {"must": [{"term": {"a": {"value": 1}}}]}}))
        );
    }

    #[test]
    fn test_empty_bool_query_is_absent() {
        let mut query = BoolQuery::new();
        assert_eq!(query.to_value(), None);

        query.filter(RangeQuery::new("age")).minimum_should_match(1);
        assert_eq!(query.to_value(), None);
        assert!(query.is_empty());
    }

    #[test]
    fn test_nested_bool_query() {
        let mut query = BoolQuery::new();
        query
            .nested(Bucket::Should)
            .unwrap()
            .must(MatchQuery::new("title", "rust"));
        query.minimum_should_match(1);

        assert_eq!(
            query.to_value(),
            Some(json!({"bool": {
                "should": {"bool": {"must": [{"match": {"title": {"query": "rust"}}}]}},
                "minimum_should_match": 1
            }}))
        );
    }

    #[test]
    fn test_list_replaces_compound_and_compound_replaces_list() {
        let mut query = BoolQuery::new();
        query.set_compound(Bucket::Must, BoolQuery::new());
        query.must(TermQuery::new("a", 1));
        assert!(matches!(query.bucket(Bucket::Must), Some(BucketValue::List(l)) if l.len() == 1));

        let mut inner = BoolQuery::new();
        inner.filter(TermQuery::new("b", 2));
        query.set_compound(Bucket::Must, inner);
        assert!(matches!(query.bucket(Bucket::Must), Some(BucketValue::Compound(_))));
        assert!(query.nested(Bucket::Must).is_ok());
    }

    #[test]
    fn test_nested_on_list_bucket_fails() {
        let mut query = BoolQuery::new();
        query.must(TermQuery::new("a", 1));
        assert!(matches!(
            query.nested(Bucket::Must),
            Err(QuarryError::UnknownArgumentType(_))
        ));
    }

    #[rstest]
    #[case("must", Bucket::Must)]
    #[case("should", Bucket::Should)]
    #[case("filter", Bucket::Filter)]
    #[case("must_not", Bucket::MustNot)]
    fn test_bucket_names(#[case] name: &str, #[case] expected: Bucket) {
        assert_eq!(Bucket::parse(name).unwrap(), expected);
    }

    #[test]
    fn test_unknown_bucket_rejected() {
        let mut query = BoolQuery::new();
        let result = query.add("maybe", BucketArg::Query(Box::new(TermQuery::new("a", 1))));
        assert!(matches!(result, Err(QuarryError::UnsupportedType(name)) if name == "maybe"));
    }

    #[test]
    fn test_add_by_name_and_boost() {
        let mut query = BoolQuery::new();
        query
            .add(
                "must_not",
                BucketArg::Queries(vec![
                    Box::new(TermQuery::new("deleted", true)),
                    Box::new(TermQuery::new("banned", true)),
                ]),
            )
            .unwrap()
            .boost(1.5);

        assert_eq!(
            query.to_value(),
            Some(json!({"bool": {
                "must_not": [
                    {"term": {"deleted": {"value": true}}},
                    {"term": {"banned": {"value": true}}}
                ],
                "boost": 1.5
            }}))
        );
    }
}
