//! Expansion of `dynamic "<name>" { for_each = ...; content { ... } }` constructs.
//!
//! `for_each` is never evaluated. A construct whose `for_each` is anything other than a
//! literal empty collection (or `false`) is taken to produce its block, so a check sees
//! `<name>` exactly as if it had been written out directly.

use crate::node::{ConfigNode, Mapping};

pub const DYNAMIC_KEY: &str = "dynamic";
pub const FOR_EACH_KEY: &str = "for_each";
pub const CONTENT_KEY: &str = "content";

/// A borrowed view of one well-formed dynamic construct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicBlock<'a> {
    pub block_name: &'a str,
    pub for_each: &'a ConfigNode,
    pub content: &'a ConfigNode,
}

impl<'a> DynamicBlock<'a> {
    /// `None` unless `spec` is a mapping carrying both `for_each` and `content`.
    pub fn from_spec(block_name: &'a str, spec: &'a ConfigNode) -> Option<Self> {
        let spec = spec.leaf().as_mapping()?;
        Some(Self {
            block_name,
            for_each: spec.get(FOR_EACH_KEY)?,
            content: spec.get(CONTENT_KEY)?,
        })
    }

    pub fn produces_instances(&self) -> bool {
        !self.for_each.is_empty_literal()
    }
}

/// Returns a copy of `attrs` with every resolvable dynamic construct, at any depth,
/// replaced by the block it generates. Constructs missing `for_each` or `content` stay
/// under `dynamic` untouched. Applying this twice gives the same tree as applying it once.
pub fn resolve_dynamic_blocks(attrs: &Mapping) -> Mapping {
    let mut out = Mapping::with_capacity(attrs.len());
    let mut expanded: Vec<(String, ConfigNode)> = Vec::new();
    let mut leftover = Mapping::new();
    let mut untouched: Option<ConfigNode> = None;

    for (key, value) in attrs {
        if key != DYNAMIC_KEY {
            out.insert(key.clone(), resolve_node(value));
            continue;
        }
        let Some(entries) = dynamic_entries(value) else {
            untouched = Some(value.clone());
            continue;
        };
        let total = entries.len();
        let mut unresolved = Vec::new();
        for (name, spec) in entries {
            match DynamicBlock::from_spec(name, spec) {
                Some(block) if block.produces_instances() => {
                    expanded.push((name.to_string(), resolve_node(block.content)));
                }
                Some(_) => {}
                None => unresolved.push((name, spec)),
            }
        }
        if unresolved.len() == total {
            // nothing under this key could be used; keep its original shape
            untouched = Some(value.clone());
            continue;
        }
        for (name, spec) in unresolved {
            merge_instances(&mut leftover, name, spec.clone());
        }
    }

    for (name, content) in expanded {
        merge_instances(&mut out, &name, content);
    }
    match untouched {
        Some(node) => {
            out.insert(DYNAMIC_KEY.to_string(), node);
        }
        None if !leftover.is_empty() => {
            out.insert(DYNAMIC_KEY.to_string(), ConfigNode::Mapping(leftover));
        }
        None => {}
    }
    out
}

fn resolve_node(node: &ConfigNode) -> ConfigNode {
    match node {
        ConfigNode::Mapping(map) => ConfigNode::Mapping(resolve_dynamic_blocks(map)),
        ConfigNode::Sequence(items) => ConfigNode::Sequence(items.iter().map(resolve_node).collect()),
        scalar @ ConfigNode::Scalar(_) => scalar.clone(),
    }
}

/// Flattens the value of a `dynamic` key into `(block name, spec)` pairs.
///
/// hcl-rs and Terraform JSON give `{"name": spec}`, python-hcl2 gives `[{"name": spec}]`,
/// and repeated labels give `{"name": [spec, spec]}`.
fn dynamic_entries(value: &ConfigNode) -> Option<Vec<(&str, &ConfigNode)>> {
    let mut entries = Vec::new();
    for instance in value.instances() {
        let map = instance.as_mapping()?;
        for (name, spec) in map {
            match spec {
                ConfigNode::Sequence(specs) if specs.len() > 1 => {
                    entries.extend(specs.iter().map(|s| (name.as_str(), s)));
                }
                _ => entries.push((name.as_str(), spec)),
            }
        }
    }
    Some(entries)
}

/// Inserts `node` under `name`, turning an existing entry into a sequence of instances.
fn merge_instances(map: &mut Mapping, name: &str, node: ConfigNode) {
    match map.get_mut(name) {
        None => {
            map.insert(name.to_string(), node);
        }
        Some(existing) => {
            let mut instances: Vec<ConfigNode> =
                existing.instances().into_iter().cloned().collect();
            instances.extend(node.instances().into_iter().cloned());
            *existing = ConfigNode::Sequence(instances);
        }
    }
}
