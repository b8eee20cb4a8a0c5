use crate::{Check, PolicyError};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

fn id_pattern() -> &'static Regex {
    static ID: OnceLock<Regex> = OnceLock::new();
    ID.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9]*(_[A-Z0-9]+)*_[0-9]+$").unwrap())
}

/// Checks keyed by id. Filled once at start-up, read-only while scanning.
#[derive(Default, Clone)]
pub struct Registry {
    checks: BTreeMap<String, Arc<dyn Check>>,
    by_type: HashMap<String, Vec<String>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, check: impl Check + 'static) -> Result<(), PolicyError> {
        self.register_arc(Arc::new(check))
    }

    pub fn register_arc(&mut self, check: Arc<dyn Check>) -> Result<(), PolicyError> {
        let meta = check.metadata();
        if !id_pattern().is_match(&meta.id) {
            return Err(PolicyError::InvalidId(meta.id.clone()));
        }
        if self.checks.contains_key(&meta.id) {
            return Err(PolicyError::Duplicate(meta.id.clone()));
        }
        if meta.supported_resources.is_empty() {
            return Err(PolicyError::NoResources(meta.id.clone()));
        }
        let id = meta.id.clone();
        for resource_type in &meta.supported_resources {
            let ids = self.by_type.entry(resource_type.clone()).or_default();
            ids.push(id.clone());
            ids.sort();
        }
        self.checks.insert(id, check);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Check>> {
        self.checks.get(id)
    }

    /// All checks, ordered by id.
    pub fn checks(&self) -> impl Iterator<Item = &Arc<dyn Check>> {
        self.checks.values()
    }

    /// Checks that apply to `resource_type`, ordered by id.
    pub fn for_resource_type(&self, resource_type: &str) -> Vec<&Arc<dyn Check>> {
        self.by_type
            .get(resource_type)
            .into_iter()
            .flatten()
            .filter_map(|id| self.checks.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("checks", &self.checks.keys().collect::<Vec<_>>())
            .finish()
    }
}
