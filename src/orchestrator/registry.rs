//! Job Registry
//!
//! Process-memory bookkeeping for submitted jobs. The provider holds the
//! authoritative task state; this map only remembers what the quota layer
//! needs: which client a job belongs to, whether it still holds a quota
//! slot, and whether a terminal state has already been observed, so the
//! slot is released exactly once no matter how many times a terminal status
//! is polled.

use dashmap::DashMap;

use crate::types::{ClientId, Job, JobKind, TaskId};

/// Terminal outcome recorded at settle time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettledOutcome {
    Succeeded,
    Failed,
    Expired,
}

/// What the caller must do after a first terminal observation
#[derive(Debug, Clone)]
pub struct SettleAction {
    pub client_id: ClientId,
    /// True when the job held a quota slot that must now be released
    pub holds_slot: bool,
}

#[derive(Debug)]
struct TrackedJob {
    job: Job,
    holds_slot: bool,
    settled: Option<SettledOutcome>,
}

/// Concurrent map of in-flight and recently settled jobs
#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<TaskId, TrackedJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly submitted job. `holds_slot` is false for refine
    /// continuations, which never took a slot of their own.
    pub fn register(&self, job: Job, holds_slot: bool) {
        self.jobs.insert(
            job.task_id.clone(),
            TrackedJob {
                job,
                holds_slot,
                settled: None,
            },
        );
    }

    /// Record the first terminal observation for a task.
    ///
    /// Returns the action to take only when this call was the
    /// first to observe a terminal state. Later calls and unknown tasks
    /// return `None`, which is what makes the quota release exactly-once.
    pub fn settle(&self, task_id: &TaskId, outcome: SettledOutcome) -> Option<SettleAction> {
        let mut entry = self.jobs.get_mut(task_id)?;
        if entry.settled.is_some() {
            return None;
        }
        entry.settled = Some(outcome);
        Some(SettleAction {
            client_id: entry.job.client_id.clone(),
            holds_slot: entry.holds_slot,
        })
    }

    /// The preview job a refine submission may chain from, if it exists and
    /// settled successfully.
    pub fn succeeded_preview(&self, task_id: &TaskId) -> Option<Job> {
        let entry = self.jobs.get(task_id)?;
        (entry.job.kind == JobKind::Preview && entry.settled == Some(SettledOutcome::Succeeded))
            .then(|| entry.job.clone())
    }

    /// Look a tracked job up by task id
    pub fn get(&self, task_id: &TaskId) -> Option<Job> {
        self.jobs.get(task_id).map(|entry| entry.job.clone())
    }

    /// Number of tracked jobs (settled entries included)
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview(task: &str, client: &str) -> Job {
        Job::new(TaskId::new(task), JobKind::Preview, ClientId::new(client))
    }

    #[test]
    fn test_settle_fires_once() {
        let registry = JobRegistry::new();
        registry.register(preview("T1", "10.0.0.1"), true);

        let first = registry.settle(&TaskId::new("T1"), SettledOutcome::Succeeded);
        assert!(first.is_some());
        let action = first.unwrap();
        assert!(action.holds_slot);
        assert_eq!(action.client_id, ClientId::new("10.0.0.1"));

        // Duplicate terminal observations are absorbed here
        assert!(
            registry
                .settle(&TaskId::new("T1"), SettledOutcome::Succeeded)
                .is_none()
        );
        assert!(
            registry
                .settle(&TaskId::new("T1"), SettledOutcome::Failed)
                .is_none()
        );
    }

    #[test]
    fn test_settle_unknown_task_is_noop() {
        let registry = JobRegistry::new();
        assert!(
            registry
                .settle(&TaskId::new("ghost"), SettledOutcome::Failed)
                .is_none()
        );
    }

    #[test]
    fn test_refine_jobs_do_not_hold_slots() {
        let registry = JobRegistry::new();
        let job = Job::new(
            TaskId::new("R1"),
            JobKind::Refine,
            ClientId::new("10.0.0.1"),
        );
        registry.register(job, false);

        let action = registry
            .settle(&TaskId::new("R1"), SettledOutcome::Succeeded)
            .unwrap();
        assert!(!action.holds_slot);
    }

    #[test]
    fn test_succeeded_preview_lookup() {
        let registry = JobRegistry::new();
        registry.register(preview("T1", "10.0.0.1"), true);

        // Unsettled previews are not valid refine sources
        assert!(registry.succeeded_preview(&TaskId::new("T1")).is_none());

        registry.settle(&TaskId::new("T1"), SettledOutcome::Succeeded);
        let source = registry.succeeded_preview(&TaskId::new("T1")).unwrap();
        assert_eq!(source.task_id, TaskId::new("T1"));
    }

    #[test]
    fn test_failed_preview_is_not_a_refine_source() {
        let registry = JobRegistry::new();
        registry.register(preview("T1", "10.0.0.1"), true);
        registry.settle(&TaskId::new("T1"), SettledOutcome::Failed);

        assert!(registry.succeeded_preview(&TaskId::new("T1")).is_none());
    }

    #[test]
    fn test_skybox_job_is_not_a_refine_source() {
        let registry = JobRegistry::new();
        let job = Job::new(
            TaskId::new("S1"),
            JobKind::Skybox,
            ClientId::new("10.0.0.1"),
        );
        registry.register(job, true);
        registry.settle(&TaskId::new("S1"), SettledOutcome::Succeeded);

        assert!(registry.succeeded_preview(&TaskId::new("S1")).is_none());
    }
}
