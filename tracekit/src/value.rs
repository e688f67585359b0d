//! Attribute values and normalization.
//!
//! Attributes cross an API boundary where the host hands the tracer
//! whatever it has: typed scalars, decoded JSON, nested arrays. Everything
//! is normalized into the JSON-safe [`AttributeValue`] set on the way in,
//! so the exporter never meets a value it cannot serialize.

use serde_json::Value as JsonValue;

/// The JSON-safe value set allowed in span and event attributes.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    /// String values.
    Str(String),
    /// Signed integer values.
    Int(i64),
    /// Floating point values.
    Float(f64),
    /// Boolean values.
    Bool(bool),
    /// Homogeneous or mixed arrays of normalized values.
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Normalize arbitrary decoded JSON into the attribute value set.
    ///
    /// Scalars pass through unchanged, `null` becomes the empty string,
    /// arrays are normalized element-wise preserving order, and objects
    /// collapse to the empty string since JSON objects carry no string
    /// form. Values that do have a string form should be converted by the
    /// caller before they get here ([`From<String>`] covers that path).
    pub fn normalize(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => AttributeValue::Str(String::new()),
            JsonValue::Bool(value) => AttributeValue::Bool(value),
            JsonValue::Number(number) => match number.as_i64() {
                Some(int) => AttributeValue::Int(int),
                None => AttributeValue::Float(number.as_f64().unwrap_or(0.0)),
            },
            JsonValue::String(value) => AttributeValue::Str(value),
            JsonValue::Array(items) => {
                AttributeValue::Array(items.into_iter().map(Self::normalize).collect())
            }
            JsonValue::Object(_) => AttributeValue::Str(String::new()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Int(value.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(value: Vec<AttributeValue>) -> Self {
        AttributeValue::Array(value)
    }
}

impl From<JsonValue> for AttributeValue {
    fn from(value: JsonValue) -> Self {
        AttributeValue::normalize(value)
    }
}

/// A key-value pair describing an attribute of a span or event.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValue {
    /// Attribute key.
    pub key: String,
    /// Normalized attribute value.
    pub value: AttributeValue,
}

impl KeyValue {
    /// Create a new `KeyValue` pair.
    pub fn new(key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Normalize a decoded JSON object into an attribute list.
///
/// Non-object inputs produce an empty list; the host passes whatever it
/// decoded and the tracer stays fail-open.
pub fn attributes_from_json(value: JsonValue) -> Vec<KeyValue> {
    match value {
        JsonValue::Object(map) => map
            .into_iter()
            .map(|(key, value)| KeyValue {
                key,
                value: AttributeValue::normalize(value),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Merge `incoming` into `target`: existing keys are overwritten in place,
/// new keys appended in order.
pub(crate) fn merge_attributes(target: &mut Vec<KeyValue>, incoming: Vec<KeyValue>) {
    for kv in incoming {
        match target.iter_mut().find(|existing| existing.key == kv.key) {
            Some(existing) => existing.value = kv.value,
            None => target.push(kv),
        }
    }
}
