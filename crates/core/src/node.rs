use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map as JsonMap, Number, Value as Json};
use std::borrow::Cow;
use std::fmt;

/// Attribute name to value, in source order.
pub type Mapping = IndexMap<String, ConfigNode>;

/// A leaf value of a configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// Canonical text of the scalar. HCL source and its JSON rendering disagree on
    /// whether `true` is a bool or a string, so comparisons go through this.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::Bool(b) => Cow::Owned(b.to_string()),
            Scalar::Number(n) => Cow::Owned(n.to_string()),
            Scalar::String(s) => Cow::Borrowed(s.as_str()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Case-sensitive comparison of canonical text.
    pub fn text_eq(&self, other: &Scalar) -> bool {
        self.as_text() == other.as_text()
    }

    pub fn text_eq_ignore_ascii_case(&self, other: &Scalar) -> bool {
        self.as_text().eq_ignore_ascii_case(&other.as_text())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

/// One node of an HCL2-shaped configuration tree.
///
/// Blocks usually arrive wrapped in a singleton `Sequence`, so code reading a tree should
/// go through [`crate::path`] instead of matching on the shape directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigNode {
    Scalar(Scalar),
    Mapping(Mapping),
    Sequence(Vec<ConfigNode>),
}

impl ConfigNode {
    /// Converts parser output into a node. `null` means "unset" in Terraform and yields
    /// `None`; null entries of nested objects and arrays are dropped the same way.
    pub fn from_json(value: &Json) -> Option<ConfigNode> {
        let node = match value {
            Json::Null => return None,
            Json::Bool(b) => ConfigNode::Scalar(Scalar::Bool(*b)),
            Json::Number(n) => ConfigNode::Scalar(Scalar::Number(n.clone())),
            Json::String(s) => ConfigNode::Scalar(Scalar::String(s.clone())),
            Json::Array(items) => {
                ConfigNode::Sequence(items.iter().filter_map(ConfigNode::from_json).collect())
            }
            Json::Object(map) => ConfigNode::Mapping(mapping_from_json(map)),
        };
        Some(node)
    }

    pub fn to_json(&self) -> Json {
        match self {
            ConfigNode::Scalar(Scalar::Bool(b)) => Json::Bool(*b),
            ConfigNode::Scalar(Scalar::Number(n)) => Json::Number(n.clone()),
            ConfigNode::Scalar(Scalar::String(s)) => Json::String(s.clone()),
            ConfigNode::Sequence(items) => Json::Array(items.iter().map(ConfigNode::to_json).collect()),
            ConfigNode::Mapping(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            ConfigNode::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            ConfigNode::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigNode]> {
        match self {
            ConfigNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Strips singleton-sequence wrapping, e.g. `[["Enabled"]]` becomes `"Enabled"`.
    pub fn leaf(&self) -> &ConfigNode {
        let mut node = self;
        while let ConfigNode::Sequence(items) = node {
            match items.as_slice() {
                [only] => node = only,
                _ => break,
            }
        }
        node
    }

    /// The block instances this node stands for: the items of a sequence, or the node
    /// itself.
    pub fn instances(&self) -> Vec<&ConfigNode> {
        match self {
            ConfigNode::Sequence(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    /// True for literal values that iterate zero times: `[]`, `{}`, `""` and `false`,
    /// after unwrapping singleton sequences.
    pub fn is_empty_literal(&self) -> bool {
        match self.leaf() {
            ConfigNode::Sequence(items) => items.is_empty(),
            ConfigNode::Mapping(map) => map.is_empty(),
            ConfigNode::Scalar(Scalar::Bool(b)) => !b,
            ConfigNode::Scalar(Scalar::String(s)) => s.is_empty(),
            ConfigNode::Scalar(Scalar::Number(_)) => false,
        }
    }
}

impl From<Scalar> for ConfigNode {
    fn from(s: Scalar) -> Self {
        ConfigNode::Scalar(s)
    }
}

impl From<Mapping> for ConfigNode {
    fn from(m: Mapping) -> Self {
        ConfigNode::Mapping(m)
    }
}

pub fn mapping_from_json(map: &JsonMap<String, Json>) -> Mapping {
    map.iter()
        .filter_map(|(k, v)| ConfigNode::from_json(v).map(|node| (k.clone(), node)))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_json_drops_nulls() {
        let node = ConfigNode::from_json(&json!({
            "bucket": "b",
            "acl": null,
            "tags": [null, {"Name": "x"}]
        }))
        .unwrap();

        assert_eq!(node.to_json(), json!({"bucket": "b", "tags": [{"Name": "x"}]}));
        assert_eq!(ConfigNode::from_json(&Json::Null), None);
    }

    #[test]
    fn test_from_json_preserves_order() {
        let node = ConfigNode::from_json(&json!({"z": 1, "a": 2, "m": 3})).unwrap();
        let keys: Vec<_> = node.as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_leaf() {
        let node = ConfigNode::from_json(&json!([["Enabled"]])).unwrap();
        assert_eq!(node.leaf(), &ConfigNode::Scalar("Enabled".into()));

        let node = ConfigNode::from_json(&json!(["a", "b"])).unwrap();
        assert_eq!(node.leaf(), &node);
    }

    #[test]
    fn test_is_empty_literal() {
        for v in [json!([]), json!([[]]), json!({}), json!(false), json!([false]), json!("")] {
            assert!(ConfigNode::from_json(&v).unwrap().is_empty_literal(), "{v}");
        }
        for v in [json!(["x"]), json!("${var.enabled ? [1] : []}"), json!(true), json!(0)] {
            assert!(!ConfigNode::from_json(&v).unwrap().is_empty_literal(), "{v}");
        }
    }

    #[test]
    fn test_scalar_text_eq() {
        assert!(Scalar::Bool(true).text_eq(&"true".into()));
        assert!(Scalar::from(3).text_eq(&"3".into()));
        assert!(!Scalar::from("Enabled").text_eq(&"enabled".into()));
        assert!(Scalar::from("Enabled").text_eq_ignore_ascii_case(&"enabled".into()));
    }
}
