//! Interface schema sent by the parameter server.
//!
//! The server describes its interface as an ordered tree of nodes. Leaves are
//! parameters (typed values, optionally bounded, or actions); inner nodes are
//! named groups. The tree arrives once per `interface` message and is the
//! authoritative structure until the next one.
//!
//! ```
//! use param_panel::schema::{Node, ValueType};
//!
//! let node: Node = serde_json::from_str(
//!     r#"{"id":"gain","name":"Gain","type":"parameter","valueType":"f","value":0.5,"min":0,"max":1}"#,
//! ).unwrap();
//! let Node::Parameter(param) = node else { unreachable!() };
//! assert_eq!(param.value_type, ValueType::Float);
//! assert_eq!(param.bounds().map(|b| b.span()), Some(1.0));
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Ordered sequence of top-level nodes. `null` entries are kept so that the
/// renderer sees the tree exactly as sent.
pub type SchemaTree = Vec<Option<Node>>;

/// Decodes each node on its own. A node that does not decode is skipped and
/// its siblings are kept.
pub fn decode_tree(entries: Vec<Value>) -> SchemaTree {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Option<Node>>(entry) {
            Ok(node) => Some(node),
            Err(error) => {
                debug!(%error, "skipping malformed schema node");
                None
            }
        })
        .collect()
}

fn lenient_tree<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SchemaTree, D::Error> {
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(decode_tree(entries.unwrap_or_default()))
}

/// One node of the schema tree, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// `"type": "parameter"`
    Parameter(ParameterDescriptor),
    /// `"type": "group"`
    Group(GroupDescriptor),
    /// Any other `type`; renders nothing.
    #[serde(other)]
    Unknown,
}

/// A single typed parameter (or action) exposed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Key for updates in both directions.
    pub id: String,
    /// Label shown next to the control.
    pub name: String,
    /// Picks the control.
    #[serde(rename = "valueType")]
    pub value_type: ValueType,
    /// Current value; absent for actions.
    #[serde(default)]
    pub value: Value,
    /// Lower slider bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper slider bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ParameterDescriptor {
    /// Slider bounds, present only when both `min` and `max` were sent.
    pub fn bounds(&self) -> Option<Bounds> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some(Bounds { min, max }),
            _ => None,
        }
    }
}

/// A named, ordered collection of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    /// Servers may omit group ids; groups never take part in synchronization.
    #[serde(default)]
    pub id: String,
    /// Section label.
    pub name: String,
    /// Children in display order.
    #[serde(default, deserialize_with = "lenient_tree")]
    pub content: SchemaTree,
}

/// Closed range of a bounded parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lower end, inclusive.
    pub min: f64,
    /// Upper end, inclusive.
    pub max: f64,
}

impl Bounds {
    /// `max - min`
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Declared value type of a parameter.
///
/// The wire carries one-letter codes (`i`, `f`, `d`, `b`, `a`, `s`); the long
/// names are accepted too. Unrecognized tags are preserved in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueType {
    /// `i`
    Integer,
    /// `f`
    Float,
    /// `d`, drawn like `f`
    Double,
    /// `b`
    Boolean,
    /// `a`, a button without a value
    Action,
    /// `s`, shown as a label
    String,
    /// Unrecognized tag, shown as a label.
    Other(String),
}

impl ValueType {
    /// Wire code emitted for this type.
    pub fn code(&self) -> &str {
        match self {
            ValueType::Integer => "i",
            ValueType::Float => "f",
            ValueType::Double => "d",
            ValueType::Boolean => "b",
            ValueType::Action => "a",
            ValueType::String => "s",
            ValueType::Other(tag) => tag,
        }
    }
}

impl From<String> for ValueType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "i" | "integer" | "int" => ValueType::Integer,
            "f" | "float" => ValueType::Float,
            "d" | "double" => ValueType::Double,
            "b" | "boolean" | "bool" => ValueType::Boolean,
            "a" | "action" => ValueType::Action,
            "s" | "string" => ValueType::String,
            _ => ValueType::Other(tag),
        }
    }
}

impl From<ValueType> for String {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Other(tag) => tag,
            known => known.code().to_string(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_tree_in_order() {
        let tree: SchemaTree = serde_json::from_value(json!([
            { "id": "p1", "name": "Param1", "type": "parameter", "value": 0, "valueType": "i" },
            { "name": "MyGroup", "type": "group", "content": [
                { "id": "p2", "name": "ParamInGroup", "type": "parameter", "value": "hello", "valueType": "s" },
                null,
                { "id": "p3", "name": "Toggle", "type": "parameter", "value": 1, "valueType": "b" }
            ]}
        ]))
        .unwrap();

        assert_eq!(tree.len(), 2);
        let Some(Node::Group(group)) = &tree[1] else {
            panic!("expected group, got {:?}", tree[1]);
        };
        assert_eq!(group.name, "MyGroup");
        assert_eq!(group.id, "");
        assert_eq!(group.content.len(), 3);
        assert!(group.content[1].is_none());
        let Some(Node::Parameter(toggle)) = &group.content[2] else {
            panic!("expected parameter");
        };
        assert_eq!(toggle.value_type, ValueType::Boolean);
    }

    #[test]
    fn malformed_node_is_skipped_not_fatal() {
        let tree = decode_tree(vec![
            json!({ "id": "p1", "type": "parameter", "valueType": "i", "value": 0 }),
            json!({ "id": "p2", "name": "Kept", "type": "parameter", "valueType": "i", "value": 1 }),
            json!({ "name": "G", "type": "group", "content": [
                { "id": 7, "name": "Bad id", "type": "parameter", "valueType": "b" },
                { "id": "p3", "name": "Inner", "type": "parameter", "valueType": "b", "value": true }
            ]}),
        ]);

        assert_eq!(tree.len(), 2);
        assert!(matches!(&tree[0], Some(Node::Parameter(p)) if p.id == "p2"));
        let Some(Node::Group(group)) = &tree[1] else {
            panic!("expected group, got {:?}", tree[1]);
        };
        assert_eq!(group.content.len(), 1);
        assert!(matches!(&group.content[0], Some(Node::Parameter(p)) if p.id == "p3"));
    }

    #[test]
    fn unknown_node_type_is_kept() {
        let node: Node = serde_json::from_value(json!({ "type": "separator", "name": "x" })).unwrap();
        assert_eq!(node, Node::Unknown);
    }

    #[test]
    fn bounds_need_both_ends() {
        let mut param: ParameterDescriptor = serde_json::from_value(json!({
            "id": "p", "name": "P", "valueType": "f", "value": 1.0, "min": 0.01
        }))
        .unwrap();
        assert!(param.bounds().is_none());

        param.max = Some(2.0);
        assert_eq!(param.bounds(), Some(Bounds { min: 0.01, max: 2.0 }));
    }

    #[test]
    fn value_type_codes_and_aliases() {
        assert_eq!(ValueType::from("d".to_string()), ValueType::Double);
        assert_eq!(ValueType::from("integer".to_string()), ValueType::Integer);
        assert_eq!(
            ValueType::from("rgb".to_string()),
            ValueType::Other("rgb".to_string())
        );
        assert_eq!(String::from(ValueType::Action), "a");
        assert_eq!(String::from(ValueType::Other("rgb".into())), "rgb");
    }

    #[test]
    fn action_without_value_reads_null() {
        let param: ParameterDescriptor = serde_json::from_value(json!({
            "id": "go", "name": "Go", "type": "parameter", "valueType": "a"
        }))
        .unwrap();
        assert!(param.value.is_null());
    }
}
