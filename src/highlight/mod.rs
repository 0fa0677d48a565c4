//! Highlighting settings.

use serde_json::{Map, Value};

/// Per-field highlight settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightField {
    name: String,
    fragment_size: Option<u32>,
    number_of_fragments: Option<u32>,
    no_match_size: Option<u32>,
}

impl HighlightField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fragment_size(&mut self, size: u32) -> &mut Self {
        self.fragment_size = Some(size);
        self
    }

    pub fn number_of_fragments(&mut self, count: u32) -> &mut Self {
        self.number_of_fragments = Some(count);
        self
    }

    pub fn no_match_size(&mut self, size: u32) -> &mut Self {
        self.no_match_size = Some(size);
        self
    }

    /// Settings of this field. Empty when nothing was set.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut settings = Map::new();
        if let Some(size) = self.fragment_size {
            settings.insert("fragment_size".to_string(), Value::from(size));
        }
        if let Some(count) = self.number_of_fragments {
            settings.insert("number_of_fragments".to_string(), Value::from(count));
        }
        if let Some(size) = self.no_match_size {
            settings.insert("no_match_size".to_string(), Value::from(size));
        }
        settings
    }
}

/// Highlight section of a search request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Highlight {
    fields: Vec<HighlightField>,
}

impl Highlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for `name`, registered on first access.
    pub fn field(&mut self, name: &str) -> &mut HighlightField {
        let index = match self.fields.iter().position(|f| f.name == name) {
            Some(index) => index,
            None => {
                self.fields.push(HighlightField::new(name));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index]
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `{fields: {name: {...}}}`, with `{}` for fields without settings.
    pub fn to_map(&self) -> Map<String, Value> {
        let fields: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| (field.name.clone(), Value::Object(field.to_map())))
            .collect();

        let mut result = Map::new();
        result.insert("fields".to_string(), Value::Object(fields));
        result
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }
}
