//! The generic "attribute at path must hold one of these values" check.

use crate::{Check, CheckMetadata, Finding};
use tfguard_core::path::lookup;
use tfguard_core::{resolve_dynamic_blocks, AttrPath, Mapping, Query, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Matching {
    #[default]
    Exact,
    IgnoreAsciiCase,
}

/// Looks up `path` after dynamic-block expansion and compares the scalar it finds against
/// the accepted values. With [`Query::All`] every match must be accepted.
#[derive(Debug, Clone)]
pub struct AttributeCheck {
    metadata: CheckMetadata,
    path: AttrPath,
    expected: Vec<Scalar>,
    matching: Matching,
    query: Query,
}

impl AttributeCheck {
    pub fn new<I, S>(metadata: CheckMetadata, path: &str, expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        Self {
            metadata,
            path: AttrPath::from(path),
            expected: expected.into_iter().map(Into::into).collect(),
            matching: Matching::Exact,
            query: Query::First,
        }
    }

    pub fn matching(mut self, matching: Matching) -> Self {
        self.matching = matching;
        self
    }

    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn path(&self) -> &AttrPath {
        &self.path
    }

    fn accepts(&self, value: &Scalar) -> bool {
        self.expected.iter().any(|e| match self.matching {
            Matching::Exact => value.text_eq(e),
            Matching::IgnoreAsciiCase => value.text_eq_ignore_ascii_case(e),
        })
    }
}

impl Check for AttributeCheck {
    fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    fn evaluate(&self, conf: &Mapping) -> Finding {
        let conf = resolve_dynamic_blocks(conf);
        let found = lookup(&conf, &self.path, self.query);
        if found.is_empty() {
            return Finding::Absent;
        }
        for node in found {
            match node.leaf().as_scalar() {
                None => return Finding::Malformed,
                Some(value) if !self.accepts(value) => return Finding::Violated,
                Some(_) => {}
            }
        }
        Finding::Satisfied
    }
}
