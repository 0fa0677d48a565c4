//! Typed field definitions rendered into index mappings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field type with its mapping options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Text {
        #[serde(default)]
        analyzer: Option<String>,
        #[serde(default = "default_true")]
        indexed: bool,
        #[serde(default)]
        stored: bool,
    },
    Keyword {
        #[serde(default = "default_true")]
        indexed: bool,
        #[serde(default)]
        stored: bool,
    },
    Long,
    Integer,
    Double,
    Boolean,
    Date {
        #[serde(default)]
        format: Option<String>,
    },
    Object {
        properties: Box<SchemaDefinition>,
    },
}

fn default_true() -> bool {
    true
}

impl FieldType {
    pub fn text() -> Self {
        FieldType::Text {
            analyzer: None,
            indexed: true,
            stored: false,
        }
    }

    pub fn keyword() -> Self {
        FieldType::Keyword {
            indexed: true,
            stored: false,
        }
    }

    /// Mapping entry for a single field.
    pub fn to_mapping(&self) -> Map<String, Value> {
        let mut mapping = Map::new();
        match self {
            FieldType::Text {
                analyzer,
                indexed,
                stored,
            } => {
                mapping.insert("type".to_string(), Value::from("text"));
                if let Some(analyzer) = analyzer {
                    mapping.insert("analyzer".to_string(), Value::from(analyzer.as_str()));
                }
                insert_flags(&mut mapping, *indexed, *stored);
            }
            FieldType::Keyword { indexed, stored } => {
                mapping.insert("type".to_string(), Value::from("keyword"));
                insert_flags(&mut mapping, *indexed, *stored);
            }
            FieldType::Long => {
                mapping.insert("type".to_string(), Value::from("long"));
            }
            FieldType::Integer => {
                mapping.insert("type".to_string(), Value::from("integer"));
            }
            FieldType::Double => {
                mapping.insert("type".to_string(), Value::from("double"));
            }
            FieldType::Boolean => {
                mapping.insert("type".to_string(), Value::from("boolean"));
            }
            FieldType::Date { format } => {
                mapping.insert("type".to_string(), Value::from("date"));
                if let Some(format) = format {
                    mapping.insert("format".to_string(), Value::from(format.as_str()));
                }
            }
            FieldType::Object { properties } => {
                mapping.insert("type".to_string(), Value::from("object"));
                mapping.insert(
                    "properties".to_string(),
                    Value::Object(properties.properties()),
                );
            }
        }
        mapping
    }
}

/// Defaults (`index: true`, `store: false`) are left out.
fn insert_flags(mapping: &mut Map<String, Value>, indexed: bool, stored: bool) {
    if !indexed {
        mapping.insert("index".to_string(), Value::Bool(false));
    }
    if stored {
        mapping.insert("store".to_string(), Value::Bool(true));
    }
}

/// Ordered set of typed fields describing one document type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub fields: Vec<(String, FieldType)>,
    #[serde(default)]
    pub dynamic: Option<bool>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = field_type,
            None => self.fields.push((name, field_type)),
        }
        self
    }

    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    fn properties(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(name, field_type)| (name.clone(), Value::Object(field_type.to_mapping())))
            .collect()
    }

    /// `{dynamic?, properties: {...}}` mapping of the type.
    pub fn to_mapping(&self) -> Map<String, Value> {
        let mut mapping = Map::new();
        if let Some(dynamic) = self.dynamic {
            mapping.insert("dynamic".to_string(), Value::Bool(dynamic));
        }
        mapping.insert("properties".to_string(), Value::Object(self.properties()));
        mapping
    }
}
