//! Job contract and bookkeeping: the uniform callable trait, the wrapper
//! record tracking status and last error, and the wave metadata carried by
//! multi-spec registrations.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::guard::RunOutcome;

/// Opaque entry identifier, unique within a controller instance and
/// monotonically increasing in registration order.
pub type EntryId = u64;

/// The uniform contract for a unit of scheduled work.
#[async_trait]
pub trait Runnable: Send + Sync {
    async fn run(&self, ctx: JobContext) -> anyhow::Result<()>;
}

/// Adapter wrapping a plain async closure into a [`Runnable`].
///
/// ```no_run
/// # use chime_scheduler::JobFn;
/// let job = JobFn::new(|_ctx| async {
///     println!("tick");
///     Ok(())
/// });
/// ```
pub struct JobFn {
    f: Box<dyn Fn(JobContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>,
}

impl JobFn {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            f: Box::new(move |ctx| Box::pin(f(ctx))),
        }
    }
}

#[async_trait]
impl Runnable for JobFn {
    async fn run(&self, ctx: JobContext) -> anyhow::Result<()> {
        (self.f)(ctx).await
    }
}

/// Lifecycle state of a registered job.
///
/// Live jobs start `Scheduled` and move to `Running` on each execution,
/// landing on `Succeeded` or `Failed`; that outcome persists until the
/// next due time, when the job re-enters `Running`. `Down` is terminal:
/// the spec failed to parse and the job was never scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Scheduled,
    Running,
    Succeeded,
    Failed,
    Down,
}

/// Ordinal position of one sub-registration within a multi-spec group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveMetadata {
    /// 1-based position among the sibling registrations.
    pub wave: usize,
    /// Count of sibling registrations sharing one logical job.
    pub total_wave: usize,
    pub is_last_wave: bool,
}

/// Read-only metadata handed to a job body on each run.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub entry_id: EntryId,
    /// The original schedule expression, retained for diagnostics.
    pub spec: String,
    pub wave: Option<WaveMetadata>,
}

#[derive(Debug)]
struct JobState {
    status: JobStatus,
    last_error: Option<String>,
}

/// A registered unit of work plus its execution bookkeeping.
///
/// Status and last-error mutation is owned exclusively by the guard
/// pipeline; everything else reads snapshots.
pub struct Job {
    id: EntryId,
    spec: String,
    wave: Option<WaveMetadata>,
    runnable: Arc<dyn Runnable>,
    state: Mutex<JobState>,
}

impl Job {
    pub(crate) fn new(
        id: EntryId,
        spec: impl Into<String>,
        runnable: Arc<dyn Runnable>,
        wave: Option<WaveMetadata>,
    ) -> Self {
        Self {
            id,
            spec: spec.into(),
            wave,
            runnable,
            state: Mutex::new(JobState {
                status: JobStatus::Scheduled,
                last_error: None,
            }),
        }
    }

    /// A job whose spec failed to parse. Terminal, never scheduled.
    pub(crate) fn down(
        id: EntryId,
        spec: impl Into<String>,
        runnable: Arc<dyn Runnable>,
        parse_error: String,
    ) -> Self {
        Self {
            id,
            spec: spec.into(),
            wave: None,
            runnable,
            state: Mutex::new(JobState {
                status: JobStatus::Down,
                last_error: Some(parse_error),
            }),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn status(&self) -> JobStatus {
        self.lock_state().status
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock_state().last_error.clone()
    }

    pub fn wave(&self) -> Option<WaveMetadata> {
        self.wave
    }

    pub(crate) fn runnable(&self) -> Arc<dyn Runnable> {
        Arc::clone(&self.runnable)
    }

    /// The context handed to the job body on each run.
    pub fn context(&self) -> JobContext {
        JobContext {
            entry_id: self.id,
            spec: self.spec.clone(),
            wave: self.wave,
        }
    }

    pub(crate) fn mark_running(&self) {
        self.lock_state().status = JobStatus::Running;
    }

    pub(crate) fn record_outcome(&self, outcome: &RunOutcome) {
        let mut state = self.lock_state();
        match outcome {
            RunOutcome::Succeeded => {
                state.status = JobStatus::Succeeded;
                state.last_error = None;
            }
            RunOutcome::Failed(message) => {
                state.status = JobStatus::Failed;
                state.last_error = Some(message.clone());
            }
            RunOutcome::Panicked(report) => {
                state.status = JobStatus::Failed;
                state.last_error = Some(report.message.clone());
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, JobState> {
        // The lock is only held for field reads/writes; poisoning would
        // require a panic inside those, which cannot happen.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::FaultReport;

    fn noop() -> Arc<dyn Runnable> {
        Arc::new(JobFn::new(|_ctx| async { Ok(()) }))
    }

    #[test]
    fn new_jobs_start_scheduled() {
        let job = Job::new(1, "@daily", noop(), None);
        assert_eq!(job.status(), JobStatus::Scheduled);
        assert!(job.last_error().is_none());
    }

    #[test]
    fn outcome_recording_follows_the_state_machine() {
        let job = Job::new(1, "@daily", noop(), None);

        job.mark_running();
        assert_eq!(job.status(), JobStatus::Running);

        job.record_outcome(&RunOutcome::Failed("boom".to_string()));
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.last_error().as_deref(), Some("boom"));

        // A later successful run clears the previous failure.
        job.mark_running();
        job.record_outcome(&RunOutcome::Succeeded);
        assert_eq!(job.status(), JobStatus::Succeeded);
        assert!(job.last_error().is_none());
    }

    #[test]
    fn panic_outcome_marks_failed_with_fault_message() {
        let job = Job::new(1, "@daily", noop(), None);
        job.record_outcome(&RunOutcome::Panicked(FaultReport {
            message: "panicked: oh no".to_string(),
            backtrace: String::new(),
        }));
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.last_error().as_deref(), Some("panicked: oh no"));
    }

    #[test]
    fn down_jobs_carry_the_parse_error() {
        let job = Job::down(7, "bad spec", noop(), "unexpected token".to_string());
        assert_eq!(job.status(), JobStatus::Down);
        assert_eq!(job.last_error().as_deref(), Some("unexpected token"));
    }

    #[test]
    fn context_carries_wave_metadata() {
        let wave = WaveMetadata {
            wave: 2,
            total_wave: 3,
            is_last_wave: false,
        };
        let job = Job::new(4, "0 0 2 * * *", noop(), Some(wave));
        let ctx = job.context();
        assert_eq!(ctx.entry_id, 4);
        assert_eq!(ctx.wave, Some(wave));
    }
}
