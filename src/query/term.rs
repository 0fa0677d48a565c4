//! Term-level queries: exact values and ranges.

use super::{Modifiers, Query, boostable, wrap};
use serde_json::{Map, Value};

/// `{term: {field: {value, boost?}}}`
#[derive(Debug, Clone, PartialEq)]
pub struct TermQuery {
    field: String,
    value: Value,
    modifiers: Modifiers,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            modifiers: Modifiers::default(),
        }
    }
}

boostable!(TermQuery);

impl Query for TermQuery {
    fn to_value(&self) -> Option<Value> {
        let mut params = Map::new();
        params.insert("value".to_string(), self.value.clone());
        self.modifiers.inject(&mut params);

        Some(wrap("term", &self.field, params))
    }
}

/// `{terms: {field: [values], boost?}}`
#[derive(Debug, Clone, PartialEq)]
pub struct TermsQuery {
    field: String,
    values: Value,
    modifiers: Modifiers,
}

impl TermsQuery {
    pub fn new(field: impl Into<String>, values: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            values: values.into(),
            modifiers: Modifiers::default(),
        }
    }
}

boostable!(TermsQuery);

impl Query for TermsQuery {
    fn to_value(&self) -> Option<Value> {
        let mut params = Map::new();
        params.insert(self.field.clone(), self.values.clone());
        self.modifiers.inject(&mut params);

        let mut result = Map::new();
        result.insert("terms".to_string(), Value::Object(params));
        Some(Value::Object(result))
    }
}

/// Lower bound of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lower {
    Gt,
    Gte,
}

/// Upper bound of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upper {
    Lt,
    Lte,
}

/// `{range: {field: {gt|gte?, lt|lte?, boost?, format?, time_zone?}}}`
///
/// Incomplete (and therefore omitted) until at least one bound is set.
/// Setting a bound replaces the previous bound on the same side.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    field: String,
    lower: Option<(Lower, Value)>,
    upper: Option<(Upper, Value)>,
    modifiers: Modifiers,
}

impl RangeQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            lower: None,
            upper: None,
            modifiers: Modifiers::default(),
        }
    }

    pub fn gt(mut self, value: impl Into<Value>) -> Self {
        self.lower = Some((Lower::Gt, value.into()));
        self
    }

    pub fn gte(mut self, value: impl Into<Value>) -> Self {
        self.lower = Some((Lower::Gte, value.into()));
        self
    }

    pub fn lt(mut self, value: impl Into<Value>) -> Self {
        self.upper = Some((Upper::Lt, value.into()));
        self
    }

    pub fn lte(mut self, value: impl Into<Value>) -> Self {
        self.upper = Some((Upper::Lte, value.into()));
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.modifiers.format = Some(format.into());
        self
    }

    pub fn time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.modifiers.time_zone = Some(time_zone.into());
        self
    }

    pub fn has_bounds(&self) -> bool {
        self.lower.is_some() || self.upper.is_some()
    }
}

boostable!(RangeQuery);

impl Query for RangeQuery {
    fn to_value(&self) -> Option<Value> {
        if !self.has_bounds() {
            return None;
        }

        let mut params = Map::new();
        if let Some((rule, value)) = &self.lower {
            let key = match rule {
                Lower::Gt => "gt",
                Lower::Gte => "gte",
            };
            params.insert(key.to_string(), value.clone());
        }
        if let Some((rule, value)) = &self.upper {
            let key = match rule {
                Upper::Lt => "lt",
                Upper::Lte => "lte",
            };
            params.insert(key.to_string(), value.clone());
        }
        self.modifiers.inject(&mut params);

        Some(wrap("range", &self.field, params))
    }
}
