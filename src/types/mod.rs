use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use strum::{AsRefStr, Display, EnumString};

/// Sort order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sort field specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    /// `{field: "asc"|"desc"}` as expected inside a request's `sort` array.
    pub fn to_value(&self) -> Value {
        json!({ self.field.clone(): self.order.as_ref() })
    }
}

/// Read-after-write visibility directive for write requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refresh {
    True,
    #[default]
    False,
    WaitFor,
}

impl Refresh {
    pub fn to_value(self) -> Value {
        match self {
            Refresh::True => Value::Bool(true),
            Refresh::False => Value::Bool(false),
            Refresh::WaitFor => Value::String("wait_for".to_string()),
        }
    }

    /// Query-string form used on the REST API.
    pub fn as_param(self) -> &'static str {
        match self {
            Refresh::True => "true",
            Refresh::False => "false",
            Refresh::WaitFor => "wait_for",
        }
    }

    /// Parse the `refresh` entry of a request parameter object.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => Refresh::True,
            Some(Value::String(s)) if s == "wait_for" => Refresh::WaitFor,
            Some(Value::String(s)) if s == "true" => Refresh::True,
            _ => Refresh::False,
        }
    }
}

impl From<bool> for Refresh {
    fn from(refresh: bool) -> Self {
        if refresh { Refresh::True } else { Refresh::False }
    }
}

/// Runtime context the library is running in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    #[default]
    Production,
    Development,
    Testing,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// One page of hydrated search results
#[derive(Debug, Clone, PartialEq, Deref, IntoIterator)]
pub struct Page<T> {
    #[deref]
    #[into_iterator(owned, ref)]
    pub items: Vec<T>,
    pub total: u64,
    pub per_page: usize,
    pub current_page: usize,
    pub page_name: String,
}

impl<T> Page<T> {
    pub fn last_page(&self) -> usize {
        if self.per_page == 0 {
            return 1;
        }
        (self.total as usize).div_ceil(self.per_page).max(1)
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page()
    }
}

/// Document ready to be written to an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl IndexDocument {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Total hit count of a search response.
///
/// Accepts both the bare integer form and the `{value, relation}` object
/// newer servers return.
pub fn hits_total(response: &Value) -> u64 {
    match response.pointer("/hits/total") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::Object(o)) => o.get("value").and_then(Value::as_u64).unwrap_or(0),
        _ => 0,
    }
}

/// Hits of a search response, in response order.
pub fn hits(response: &Value) -> &[Value] {
    response
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Dotted-path lookup (`"hits.total"`) into a JSON value.
pub fn value_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(json!({"hits": {"total": 7, "hits": []}}), 7)]
    #[case(json!({"hits": {"total": {"value": 12, "relation": "eq"}}}), 12)]
    #[case(json!({"took": 3}), 0)]
    fn test_hits_total(#[case] response: Value, #[case] expected: u64) {
        assert_eq!(hits_total(&response), expected);
    }

    #[test]
    fn test_sort_field_value() {
        let sort = SortField::new("created_at", SortOrder::Desc);
        assert_eq!(sort.to_value(), json!({"created_at": "desc"}));
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
    }

    #[test]
    fn test_refresh_values() {
        assert_eq!(Refresh::WaitFor.to_value(), json!("wait_for"));
        assert_eq!(Refresh::from(true), Refresh::True);
        assert_eq!(Refresh::from_value(Some(&json!("wait_for"))), Refresh::WaitFor);
        assert_eq!(Refresh::from_value(None), Refresh::False);
    }

    #[test]
    fn test_value_at() {
        let response = json!({"hits": {"total": 3, "hits": [{"_id": "a"}]}});
        assert_eq!(value_at(&response, "hits.total"), Some(&json!(3)));
        assert_eq!(value_at(&response, "hits.hits.0._id"), Some(&json!("a")));
        assert_eq!(value_at(&response, "hits.missing"), None);
    }

    #[test]
    fn test_page_bounds() {
        let page = Page {
            items: vec![1, 2],
            total: 5,
            per_page: 2,
            current_page: 1,
            page_name: "page".to_string(),
        };
        assert_eq!(page.len(), 2);
        assert_eq!(page.last_page(), 3);
        assert!(page.has_more_pages());
    }
}
