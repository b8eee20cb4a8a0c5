//! Extraction of resource blocks from a parsed Terraform document.

use crate::node::{ConfigNode, Mapping};
use crate::{CoreError, ResourceBlock};
use serde_json::Value as Json;
use std::path::Path;

pub const RESOURCE_KEY: &str = "resource";

/// Collects every `resource "<type>" "<name>"` body in `doc`.
///
/// `resource` may be `{type: {name: body}}` (Terraform JSON, hcl-rs) or a sequence of such
/// mappings (python-hcl2). Bodies may be singleton-wrapped; a sequence of several bodies
/// under one name yields one block each. A document without `resource`, or one that is
/// not a mapping at all (a JSON array, an Ansible playbook), yields nothing.
pub fn collect_resources(doc: &Json, file: Option<&Path>) -> Result<Vec<ResourceBlock>, CoreError> {
    let Some(root) = ConfigNode::from_json(doc) else {
        return Ok(Vec::new());
    };
    let Some(resources) = root.leaf().as_mapping().and_then(|m| m.get(RESOURCE_KEY)) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for by_type in resources.instances() {
        let by_type = by_type.as_mapping().ok_or_else(|| shape(RESOURCE_KEY, "a mapping of resource types"))?;
        for (resource_type, by_name) in by_type {
            for by_name in by_name.instances() {
                let by_name = by_name
                    .as_mapping()
                    .ok_or_else(|| shape(&format!("{RESOURCE_KEY}.{resource_type}"), "a mapping of resource names"))?;
                for (name, body) in by_name {
                    for attrs in bodies(body, resource_type, name)? {
                        let mut block = ResourceBlock::new(resource_type.clone(), name.clone(), attrs.clone());
                        if let Some(f) = file {
                            block = block.with_file(f);
                        }
                        out.push(block);
                    }
                }
            }
        }
    }
    Ok(out)
}

fn bodies<'a>(body: &'a ConfigNode, resource_type: &str, name: &str) -> Result<Vec<&'a Mapping>, CoreError> {
    body.leaf()
        .instances()
        .into_iter()
        .map(|b| {
            b.leaf()
                .as_mapping()
                .ok_or_else(|| shape(&format!("{resource_type}.{name}"), "a resource body"))
        })
        .collect()
}

fn shape(at: &str, expected: &'static str) -> CoreError {
    CoreError::Shape { at: at.to_string(), expected }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ids(blocks: &[ResourceBlock]) -> Vec<String> {
        blocks.iter().map(|b| b.id().to_string()).collect()
    }

    #[test]
    fn test_collect_terraform_json() {
        let doc = json!({
            "provider": {"aws": {"region": "eu-west-1"}},
            "resource": {
                "aws_s3_bucket": {
                    "logs": {"bucket": "logs"},
                    "data": {"bucket": "data"}
                },
                "aws_kms_key": {"main": {"enable_key_rotation": true}}
            }
        });
        let blocks = collect_resources(&doc, Some(Path::new("main.tf.json"))).unwrap();
        assert_eq!(ids(&blocks), vec!["aws_s3_bucket.logs", "aws_s3_bucket.data", "aws_kms_key.main"]);
        assert_eq!(blocks[0].file(), Some(Path::new("main.tf.json")));
        assert_eq!(blocks[2].attributes().get("enable_key_rotation"), Some(&ConfigNode::Scalar(true.into())));
    }

    #[test]
    fn test_collect_hcl2_shape() {
        let doc = json!({
            "resource": [
                {"aws_s3_bucket": {"test": {"bucket": ["my-tf-test-bucket"]}}},
                {"aws_s3_bucket": {"other": [{"bucket": ["other"]}]}}
            ]
        });
        let blocks = collect_resources(&doc, None).unwrap();
        assert_eq!(ids(&blocks), vec!["aws_s3_bucket.test", "aws_s3_bucket.other"]);
        assert_eq!(blocks[1].file(), None);
    }

    #[test]
    fn test_collect_no_resources() {
        assert!(collect_resources(&json!({"variable": {"x": {}}}), None).unwrap().is_empty());
        assert!(collect_resources(&Json::Null, None).unwrap().is_empty());
        assert!(collect_resources(&json!(["not", "a", "doc"]), None).unwrap().is_empty());
        assert!(collect_resources(&json!([{"hosts": "all", "tasks": []}]), None).unwrap().is_empty());
    }

    #[test]
    fn test_collect_repeated_name() {
        let doc = json!({
            "resource": {"aws_s3_bucket": {"x": [{"bucket": "a"}, {"bucket": "b"}]}}
        });
        let blocks = collect_resources(&doc, None).unwrap();
        assert_eq!(ids(&blocks), vec!["aws_s3_bucket.x", "aws_s3_bucket.x"]);
        assert_eq!(blocks[0].attributes().get("bucket"), Some(&ConfigNode::Scalar("a".into())));
        assert_eq!(blocks[1].attributes().get("bucket"), Some(&ConfigNode::Scalar("b".into())));
    }

    #[test]
    fn test_collect_bad_shape() {
        let err = collect_resources(&json!({"resource": {"aws_s3_bucket": {"x": "oops"}}}), None).unwrap_err();
        assert_eq!(err.to_string(), "aws_s3_bucket.x: expected a resource body");
    }
}
