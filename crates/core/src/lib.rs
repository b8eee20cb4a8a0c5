use serde::{Serialize, Deserialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod collect;
pub mod dynamic;
pub mod node;
pub mod path;

pub use collect::collect_resources;
pub use dynamic::{resolve_dynamic_blocks, DynamicBlock};
pub use node::{mapping_from_json, ConfigNode, Mapping, Scalar};
pub use path::{AttrPath, Query, Segment};

/// `<type>.<name>`, the way Terraform addresses a resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub String);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict { Passed, Failed, Skipped }

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Passed => "PASSED",
            Verdict::Failed => "FAILED",
            Verdict::Skipped => "SKIPPED",
        })
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{at}: expected {expected}")]
    Shape { at: String, expected: &'static str },
}

/// One declared resource. Built once by the collector and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceBlock {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    attributes: Mapping,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<PathBuf>,
}

impl ResourceBlock {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>, attributes: Mapping) -> Self {
        Self { resource_type: resource_type.into(), name: name.into(), attributes, file: None }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn id(&self) -> ResourceId {
        ResourceId(format!("{}.{}", self.resource_type, self.name))
    }

    pub fn resource_type(&self) -> &str { &self.resource_type }
    pub fn name(&self) -> &str { &self.name }
    pub fn attributes(&self) -> &Mapping { &self.attributes }
    pub fn file(&self) -> Option<&Path> { self.file.as_deref() }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_resource_id() {
        let r = ResourceBlock::new("aws_s3_bucket", "test", Mapping::new()).with_file("main.tf");
        assert_eq!(r.id().to_string(), "aws_s3_bucket.test");
        assert_eq!(r.file(), Some(Path::new("main.tf")));
    }

    #[test]
    fn test_verdict_serde() {
        assert_eq!(serde_json::to_value(Verdict::Skipped).unwrap(), json!("SKIPPED"));
        assert_eq!(serde_json::from_value::<Verdict>(json!("FAILED")).unwrap(), Verdict::Failed);
        assert_eq!(Verdict::Passed.to_string(), "PASSED");
    }
}
