use crate::{Check, Filter, PolicyConfig, PolicyError, Registry};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tfguard_core::{ResourceBlock, ResourceId, Verdict};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckRecord {
    pub check_id: String,
    pub check_name: String,
    pub resource: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guideline: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub resources: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub records: Vec<CheckRecord>,
}

impl Report {
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

/// Evaluates every applicable (check, resource) pair.
pub struct Runner<'r> {
    registry: &'r Registry,
    filter: Filter,
    jobs: Option<usize>,
}

impl<'r> Runner<'r> {
    pub fn new(registry: &'r Registry, config: &PolicyConfig) -> Result<Self, PolicyError> {
        Ok(Self { registry, filter: config.compile()?, jobs: None })
    }

    /// Worker threads to use; `1` evaluates on the calling thread.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs.max(1));
        self
    }

    #[tracing::instrument(skip_all, fields(resources = resources.len()))]
    pub fn run(&self, resources: &[ResourceBlock]) -> Report {
        let mut records: Vec<CheckRecord> = match self.jobs {
            Some(1) => resources.iter().flat_map(|r| self.scan_resource(r)).collect(),
            Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(|| self.par_scan(resources)),
                Err(err) => {
                    warn!(%err, "cannot build thread pool, using the global one");
                    self.par_scan(resources)
                }
            },
            None => self.par_scan(resources),
        };
        records.sort_by(|a, b| {
            (&a.file, &a.resource, &a.check_id).cmp(&(&b.file, &b.resource, &b.check_id))
        });

        let mut summary = Summary { resources: resources.len(), ..Default::default() };
        for record in &records {
            match record.verdict {
                Verdict::Passed => summary.passed += 1,
                Verdict::Failed => summary.failed += 1,
                Verdict::Skipped => summary.skipped += 1,
            }
        }
        info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "scan finished"
        );
        Report { summary, records }
    }

    fn par_scan(&self, resources: &[ResourceBlock]) -> Vec<CheckRecord> {
        resources
            .par_iter()
            .flat_map_iter(|r| self.scan_resource(r))
            .collect()
    }

    fn scan_resource(&self, resource: &ResourceBlock) -> Vec<CheckRecord> {
        let id = resource.id();
        self.registry
            .for_resource_type(resource.resource_type())
            .into_iter()
            .filter(|check| self.filter.is_selected(&check.metadata().id))
            .map(|check| {
                let verdict = self.verdict(check, resource);
                let meta = check.metadata();
                debug!(check = %meta.id, resource = %id, %verdict, "evaluated");
                CheckRecord {
                    check_id: meta.id.clone(),
                    check_name: meta.name.clone(),
                    resource: id.clone(),
                    file: resource.file().map(PathBuf::from),
                    verdict,
                    guideline: meta.guideline.clone(),
                }
            })
            .collect()
    }

    fn verdict(&self, check: &Arc<dyn Check>, resource: &ResourceBlock) -> Verdict {
        let meta = check.metadata();
        if self.filter.is_skipped(&meta.id) {
            return Verdict::Skipped;
        }
        check
            .evaluate(resource.attributes())
            .verdict(self.filter.absent_for(meta), meta.malformed)
    }
}
