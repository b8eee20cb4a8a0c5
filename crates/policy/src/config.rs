use crate::{Absent, CheckMetadata, PolicyError};
use regex::Regex;
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

/// Which checks run and how absent attributes are judged.
///
/// ```yaml
/// checks: ["CKV_AWS_*"]
/// skip_checks: ["CKV_AWS_21"]
/// absent:
///   CKV_AWS_143: fail
/// strict_absent: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Allow-list of ids or `*` globs; empty runs everything.
    pub checks: Vec<String>,
    /// Matching checks still produce a record, with a SKIPPED verdict.
    pub skip_checks: Vec<String>,
    /// Per-check override of the rule's absent default.
    pub absent: BTreeMap<String, Absent>,
    /// Every rule fails on absence unless `absent` says otherwise.
    pub strict_absent: bool,
}

impl PolicyConfig {
    pub fn from_yaml(src: &str) -> Result<Self, PolicyError> {
        if src.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(src)?)
    }

    /// Overlays `other` (usually command-line flags) on top of `self`.
    pub fn merge(mut self, other: PolicyConfig) -> Self {
        self.checks.extend(other.checks);
        self.skip_checks.extend(other.skip_checks);
        self.absent.extend(other.absent);
        self.strict_absent |= other.strict_absent;
        self
    }

    pub fn compile(&self) -> Result<Filter, PolicyError> {
        Ok(Filter {
            include: compile_patterns(&self.checks)?,
            exclude: compile_patterns(&self.skip_checks)?,
            absent: self.absent.clone(),
            strict_absent: self.strict_absent,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    absent: BTreeMap<String, Absent>,
    strict_absent: bool,
}

impl Filter {
    pub fn is_selected(&self, id: &str) -> bool {
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(id))
    }

    pub fn is_skipped(&self, id: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(id))
    }

    pub fn absent_for(&self, meta: &CheckMetadata) -> Absent {
        match self.absent.get(&meta.id) {
            Some(absent) => *absent,
            None if self.strict_absent => Absent::Fail,
            None => meta.absent,
        }
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, PolicyError> {
    patterns.iter().map(|p| glob_regex(p)).collect()
}

fn glob_regex(pattern: &str) -> Result<Regex, PolicyError> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).map_err(|source| PolicyError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}
