//! Bridge between [`Node`] and `serde_yaml::Value`
//!
//! Flow collections are parsed through `serde_yaml`, and typed views of a
//! document (`to_typed`) go through the same value model.

use serde::de::DeserializeOwned;
use serde_yaml::Value;

use crate::node::{Mapping, Node, NodeKind, Scalar, ScalarStyle, ScalarTag};

impl Node {
    /// Convert to a `serde_yaml` value (formatting is dropped)
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self.kind() {
            NodeKind::Scalar(s) => scalar_to_value(s),
            NodeKind::Sequence(seq) => Value::Sequence(seq.iter().map(Node::to_value).collect()),
            NodeKind::Mapping(map) => Value::Mapping(
                map.iter()
                    .map(|(k, v)| (Value::String(k.to_string()), v.to_value()))
                    .collect(),
            ),
        }
    }

    /// Build a node from a `serde_yaml` value
    ///
    /// Strings that would read back as another type are double-quoted.
    /// Non-string keys are stringified; tags are dropped.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Node::scalar("null"),
            Value::Bool(b) => Node::scalar(b.to_string()),
            Value::Number(n) => Node::scalar(n.to_string()),
            Value::String(s) => {
                let plain = Scalar::new(s.as_str(), ScalarStyle::Plain);
                if plain.tag() == ScalarTag::Str {
                    Node::from(plain)
                } else {
                    Node::string(s.as_str())
                }
            }
            Value::Sequence(items) => Node::sequence(items.iter().map(Node::from_value).collect()),
            Value::Mapping(map) => Node::from(
                map.iter()
                    .map(|(k, v)| (key_to_string(k), Node::from_value(v)))
                    .collect::<Mapping>(),
            ),
            Value::Tagged(tagged) => Node::from_value(&tagged.value),
        }
    }

    /// Deserialize this subtree into a typed value
    ///
    /// # Errors
    /// Returns error if the tree doesn't match `T`
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, serde_yaml::Error> {
        serde_yaml::from_value(self.to_value())
    }

    /// Mark this node and every collection below it as flow style
    pub fn set_flow_recursive(&mut self) {
        match self.kind_mut() {
            NodeKind::Scalar(_) => {}
            NodeKind::Sequence(seq) => {
                seq.set_flow(true);
                seq.items_mut().iter_mut().for_each(Node::set_flow_recursive);
            }
            NodeKind::Mapping(map) => {
                map.set_flow(true);
                map.iter_mut().for_each(|(_, v)| v.set_flow_recursive());
            }
        }
    }
}

fn scalar_to_value(scalar: &Scalar) -> Value {
    let text = scalar.value();
    match scalar.tag() {
        ScalarTag::Null => Value::Null,
        ScalarTag::Bool => Value::Bool(text.eq_ignore_ascii_case("true")),
        ScalarTag::Int => parse_int(text).unwrap_or_else(|| Value::String(text.to_string())),
        ScalarTag::Float => parse_float(text)
            .map(|f| Value::Number(f.into()))
            .unwrap_or_else(|| Value::String(text.to_string())),
        ScalarTag::Str => Value::String(text.to_string()),
    }
}

fn parse_int(text: &str) -> Option<Value> {
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(oct) = text.strip_prefix("0o") {
        (oct, 8)
    } else {
        (text, 10)
    };
    if let Ok(i) = i64::from_str_radix(digits, radix) {
        return Some(Value::Number(i.into()));
    }
    u64::from_str_radix(digits.trim_start_matches('+'), radix)
        .ok()
        .map(|u| Value::Number(u.into()))
}

fn parse_float(text: &str) -> Option<f64> {
    match text.trim_start_matches('+').to_ascii_lowercase().as_str() {
        ".inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        ".nan" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
