//! Schema Validator (spec §4.6 step 2).
//!
//! Validates a structured output against a required-field list plus
//! per-field type/range/pattern constraints, ported from the original's
//! `SchemaValidator` (`type_mapping`, `_validate_field`).

use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    List,
    Dict,
}

impl FieldType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_f64() || value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::List => value.is_array(),
            Self::Dict => value.is_object(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Dict => "dict",
        }
    }
}

/// Constraints on one field of a schema.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    pub field_type: Option<FieldType>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<String>,
}

/// Required fields plus per-field constraints (spec's `{required, properties}`).
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub required: Vec<String>,
    pub properties: Vec<(String, FieldSchema)>,
}

/// Stateless; holds no configuration beyond the fixed type-mapping table.
#[derive(Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// `(is_valid, error_messages)`, matching the original's return shape.
    pub fn validate(&self, output: &serde_json::Map<String, Value>, schema: &Schema) -> (bool, Vec<String>) {
        let mut errors = Vec::new();

        for field_name in &schema.required {
            if !output.contains_key(field_name) {
                errors.push(format!("Missing required field: {field_name}"));
            }
        }

        for (field_name, field_schema) in &schema.properties {
            if let Some(value) = output.get(field_name) {
                errors.extend(self.validate_field(value, field_schema));
            }
        }

        (errors.is_empty(), errors)
    }

    fn validate_field(&self, value: &Value, schema: &FieldSchema) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(expected) = schema.field_type {
            if !expected.matches(value) {
                errors.push(format!(
                    "Field type mismatch: expected {}, got {}",
                    expected.as_str(),
                    json_type_name(value)
                ));
            }
        }

        if let Some(number) = value.as_f64() {
            if let Some(min) = schema.min {
                if number < min {
                    errors.push(format!("Value {number} below minimum {min}"));
                }
            }
            if let Some(max) = schema.max {
                if number > max {
                    errors.push(format!("Value {number} above maximum {max}"));
                }
            }
        }

        if let (Some(pattern), Some(text)) = (&schema.pattern, value.as_str()) {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(text) => {
                    errors.push(format!("Value '{text}' does not match pattern {pattern}"));
                }
                Err(_) => errors.push(format!("invalid pattern: {pattern}")),
                _ => {}
            }
        }

        errors
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
