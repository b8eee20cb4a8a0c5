//! Safe navigation through HCL2-shaped trees.
//!
//! Lookups never fail loudly: a missing key, a scalar where a block was expected or an
//! empty sequence all come back as "not found".

use crate::node::{ConfigNode, Mapping};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    /// Explicit position in a sequence. On a mapping it falls back to a key lookup.
    Index(usize),
}

/// A dotted attribute path such as `object_lock_configuration.object_lock_enabled`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrPath(Vec<Segment>);

impl AttrPath {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }
}

impl FromStr for AttrPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for AttrPath {
    fn from(s: &str) -> Self {
        let segments = s
            .split('.')
            .filter(|part| !part.is_empty())
            .map(|part| match part.parse::<usize>() {
                Ok(ix) => Segment::Index(ix),
                Err(_) => Segment::Key(part.to_string()),
            })
            .collect();
        Self(segments)
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match seg {
                Segment::Key(k) => f.write_str(k)?,
                Segment::Index(ix) => write!(f, "{ix}")?,
            }
        }
        Ok(())
    }
}

/// How a lookup treats sequences holding more than one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Query {
    /// The first element that yields the key wins.
    #[default]
    First,
    /// Every element is followed; all matches are returned.
    All,
}

fn key_in<'a>(map: &'a Mapping, seg: &Segment) -> Option<&'a ConfigNode> {
    match seg {
        Segment::Key(k) => map.get(k),
        Segment::Index(ix) => map.get(&ix.to_string()),
    }
}

fn step_first<'a>(node: &'a ConfigNode, seg: &Segment) -> Option<&'a ConfigNode> {
    match (node, seg) {
        (ConfigNode::Mapping(map), _) => key_in(map, seg),
        (ConfigNode::Sequence(items), Segment::Index(ix)) => items.get(*ix),
        (ConfigNode::Sequence(items), Segment::Key(_)) => {
            items.iter().find_map(|item| step_first(item, seg))
        }
        (ConfigNode::Scalar(_), _) => None,
    }
}

fn step_all<'a>(node: &'a ConfigNode, seg: &Segment, out: &mut Vec<&'a ConfigNode>) {
    match (node, seg) {
        (ConfigNode::Mapping(map), _) => out.extend(key_in(map, seg)),
        (ConfigNode::Sequence(items), Segment::Index(ix)) => out.extend(items.get(*ix)),
        (ConfigNode::Sequence(items), Segment::Key(_)) => {
            for item in items {
                step_all(item, seg, out);
            }
        }
        (ConfigNode::Scalar(_), _) => {}
    }
}

/// Follows `path` from `node`, unwrapping sequences on the way. Returns the first match.
pub fn get<'a>(node: &'a ConfigNode, path: &AttrPath) -> Option<&'a ConfigNode> {
    path.segments()
        .iter()
        .try_fold(node, |cur, seg| step_first(cur, seg))
}

/// Like [`get`] but follows every element of multi-block sequences.
pub fn get_all<'a>(node: &'a ConfigNode, path: &AttrPath) -> Vec<&'a ConfigNode> {
    let mut frontier = vec![node];
    for seg in path.segments() {
        let mut next = Vec::new();
        for cur in frontier {
            step_all(cur, seg, &mut next);
        }
        if next.is_empty() {
            return next;
        }
        frontier = next;
    }
    frontier
}

/// Lookup rooted at a resource's attribute mapping.
pub fn lookup<'a>(attrs: &'a Mapping, path: &AttrPath, query: Query) -> Vec<&'a ConfigNode> {
    let Some((head, rest)) = path.segments().split_first() else {
        return Vec::new();
    };
    let Some(root) = key_in(attrs, head) else {
        return Vec::new();
    };
    let rest = AttrPath(rest.to_vec());
    match query {
        Query::First => get(root, &rest).into_iter().collect(),
        Query::All => get_all(root, &rest),
    }
}
