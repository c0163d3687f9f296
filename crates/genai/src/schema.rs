//! Response schemas for structured output

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema value types understood by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Type {
    Object,
    String,
    Integer,
}

/// Subset of the OpenAPI schema accepted as `responseSchema`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: Type,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl Schema {
    fn of(schema_type: Type) -> Self {
        Self {
            schema_type,
            description: None,
            enum_values: None,
            properties: None,
            required: None,
        }
    }

    pub fn object() -> Self {
        Self::of(Type::Object)
    }

    pub fn string() -> Self {
        Self::of(Type::String)
    }

    pub fn integer() -> Self {
        Self::of(Type::Integer)
    }

    /// String restricted to the given values
    pub fn string_enum<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enum_values: Some(values.into_iter().map(Into::into).collect()),
            ..Self::of(Type::String)
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Adds a property to an object schema
    pub fn property(mut self, name: &str, schema: Schema) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), schema);
        self
    }

    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = Some(names.into_iter().map(Into::into).collect());
        self
    }
}
