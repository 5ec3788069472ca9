use std::collections::HashMap;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;

use crate::network::AttrValue;

const EMBEDDED: &str = include_str!("../res/cntk-metadata.json");

static METADATA: Lazy<OperatorMetadata> = Lazy::new(|| {
    OperatorMetadata::from_json(EMBEDDED).unwrap_or_else(|err| {
        crate::error!("metadata: embedded operator table rejected: {:#}", err);
        OperatorMetadata::default()
    })
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentOption {
    Optional,
    Variadic,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArgumentSchema {
    pub name: String,
    #[serde(default)]
    pub option: Option<ArgumentOption>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttributeSchema {
    pub name: String,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub default: Option<Value>,
}

/// Display schema of one operator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OperatorSchema {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub inputs: Option<Vec<ArgumentSchema>>,
    #[serde(default)]
    pub outputs: Option<Vec<ArgumentSchema>>,
    #[serde(default)]
    pub attributes: Vec<AttributeSchema>,
}

impl OperatorSchema {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    name: String,
    schema: OperatorSchema,
}

/// Operator schemas keyed by operator name.
#[derive(Debug, Clone, Default)]
pub struct OperatorMetadata {
    schemas: HashMap<String, OperatorSchema>,
}

impl OperatorMetadata {
    /// The table compiled into the crate.
    pub fn global() -> &'static OperatorMetadata {
        &METADATA
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let entries: Vec<MetadataEntry> =
            serde_json::from_str(text).with_context(|| "parse operator metadata")?;
        let schemas = entries
            .into_iter()
            .map(|entry| (entry.name, entry.schema))
            .collect();
        Ok(Self { schemas })
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn schema(&self, operator: &str) -> Option<&OperatorSchema> {
        self.schemas.get(operator)
    }

    pub fn category(&self, operator: &str) -> Option<&str> {
        self.schema(operator)?.category.as_deref()
    }

    /// Whether an attribute is worth showing: hidden when the schema marks
    /// it invisible or the value equals the schema default.
    pub fn is_attribute_visible(&self, operator: &str, name: &str, value: &AttrValue) -> bool {
        let Some(attr) = self.schema(operator).and_then(|schema| schema.attribute(name)) else {
            return true;
        };
        if attr.visible == Some(false) {
            return false;
        }
        let Some(default) = &attr.default else {
            return true;
        };
        let value = attr_to_json(value);
        if loose_eq(&value, default) {
            return false;
        }
        if let (Value::Array(items), Value::Array(defaults)) = (&value, default) {
            let defaults = expand_defaults(defaults, items.len());
            let all_default = items
                .iter()
                .enumerate()
                .all(|(index, item)| defaults.get(index).is_some_and(|d| loose_eq(item, d)));
            if all_default {
                return false;
            }
        }
        true
    }
}

/// A trailing `null` repeats the preceding default up to `len` entries.
fn expand_defaults(defaults: &[Value], len: usize) -> Vec<Value> {
    let mut expanded = defaults.to_vec();
    if expanded.len() > 1 && expanded.last() == Some(&Value::Null) {
        expanded.pop();
        if let Some(last) = expanded.last().cloned() {
            while expanded.len() < len {
                expanded.push(last.clone());
            }
        }
    }
    expanded
}

/// Numbers and booleans compare by numeric value.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn attr_to_json(value: &AttrValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
