use serde::{Serialize, Deserialize};
use thiserror::Error;
use tfguard_core::{Mapping, ResourceBlock, Verdict};

pub mod attribute;
pub mod config;
pub mod registry;
pub mod runner;

pub use attribute::{AttributeCheck, Matching};
pub use config::{Filter, PolicyConfig};
pub use registry::Registry;
pub use runner::{CheckRecord, Report, Runner, Summary};

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("invalid check id '{0}'")]
    InvalidId(String),
    #[error("check '{0}' is already registered")]
    Duplicate(String),
    #[error("check '{0}' does not name any resource type")]
    NoResources(String),
    #[error("invalid check pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid policy config")]
    Config(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    GeneralSecurity,
    Encryption,
    BackupAndRecovery,
    Logging,
    Iam,
    Networking,
}

/// Verdict for a resource that does not set the checked attribute at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Absent {
    #[default]
    Pass,
    Fail,
}

/// Verdict for an attribute that is present but is not a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Malformed {
    #[default]
    Fail,
    Skip,
}

/// What a check saw, before rule policy turns it into a [`Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finding {
    Absent,
    Satisfied,
    Violated,
    Malformed,
}

impl Finding {
    pub fn verdict(self, absent: Absent, malformed: Malformed) -> Verdict {
        match self {
            Finding::Satisfied => Verdict::Passed,
            Finding::Violated => Verdict::Failed,
            Finding::Absent => match absent {
                Absent::Pass => Verdict::Passed,
                Absent::Fail => Verdict::Failed,
            },
            Finding::Malformed => match malformed {
                Malformed::Fail => Verdict::Failed,
                Malformed::Skip => Verdict::Skipped,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckMetadata {
    pub id: String,
    pub name: String,
    pub categories: Vec<Category>,
    pub supported_resources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guideline: Option<String>,
    pub absent: Absent,
    pub malformed: Malformed,
}

impl CheckMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            categories: Vec::new(),
            supported_resources: Vec::new(),
            guideline: None,
            absent: Absent::default(),
            malformed: Malformed::default(),
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.categories.push(category);
        self
    }

    pub fn resources<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_resources.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn guideline(mut self, url: impl Into<String>) -> Self {
        self.guideline = Some(url.into());
        self
    }

    pub fn absent(mut self, absent: Absent) -> Self {
        self.absent = absent;
        self
    }

    pub fn malformed(mut self, malformed: Malformed) -> Self {
        self.malformed = malformed;
        self
    }

    pub fn supports(&self, resource_type: &str) -> bool {
        self.supported_resources.iter().any(|t| t == resource_type)
    }
}

/// A single policy rule. Implementations are pure: they read the attribute tree and
/// return, never mutate and never block.
pub trait Check: Send + Sync {
    fn metadata(&self) -> &CheckMetadata;

    fn evaluate(&self, conf: &Mapping) -> Finding;

    /// Verdict using the rule's own absent and malformed defaults.
    fn scan_resource_conf(&self, conf: &Mapping) -> Verdict {
        let meta = self.metadata();
        self.evaluate(conf).verdict(meta.absent, meta.malformed)
    }

    fn scan(&self, resource: &ResourceBlock) -> Verdict {
        self.scan_resource_conf(resource.attributes())
    }
}
