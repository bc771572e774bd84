//! Fault guard: runs one job body so that neither a returned error nor a
//! panic can reach the dispatcher or take the process down.

use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, error};

use crate::job::{Job, JobContext};

/// Structured description of a recovered runtime fault.
#[derive(Debug, Clone)]
pub struct FaultReport {
    /// Stringified panic payload.
    pub message: String,
    /// Backtrace captured at the recovery site.
    pub backtrace: String,
}

impl FaultReport {
    fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("panicked: {s}")
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("panicked: {s}")
        } else {
            "panicked: non-string payload".to_string()
        };
        Self {
            message,
            backtrace: Backtrace::force_capture().to_string(),
        }
    }
}

/// Result of one guarded job execution.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Succeeded,
    /// The job body returned an error.
    Failed(String),
    /// The job body panicked and was recovered.
    Panicked(FaultReport),
}

/// Hook invoked after a panic has been recovered. Receives the job's
/// metadata and the fault description; the default implementation logs
/// and continues.
pub type RecoverHook = Arc<dyn Fn(&JobContext, &FaultReport) + Send + Sync>;

/// The default log-and-continue recovery hook.
pub fn default_recover_hook() -> RecoverHook {
    Arc::new(|ctx, report| {
        error!(
            entry_id = ctx.entry_id,
            spec = %ctx.spec,
            fault = %report.message,
            backtrace = %report.backtrace,
            "recovered from job panic"
        );
    })
}

/// Execute one job run under the guard.
///
/// Updates the job's status and last error, emits the structured failure
/// record, and invokes `hook` on the panic variant. Never unwinds.
pub async fn run_guarded(job: &Job, ctx: JobContext, hook: &RecoverHook) -> RunOutcome {
    job.mark_running();

    let runnable = job.runnable();
    let outcome = match AssertUnwindSafe(runnable.run(ctx.clone()))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => RunOutcome::Succeeded,
        Ok(Err(e)) => RunOutcome::Failed(format!("{e:#}")),
        Err(payload) => RunOutcome::Panicked(FaultReport::from_payload(payload)),
    };

    job.record_outcome(&outcome);

    match &outcome {
        RunOutcome::Succeeded => {
            debug!(entry_id = ctx.entry_id, spec = %ctx.spec, "job run succeeded");
        }
        RunOutcome::Failed(message) => {
            error!(
                entry_id = ctx.entry_id,
                spec = %ctx.spec,
                error = %message,
                "job run failed"
            );
        }
        RunOutcome::Panicked(report) => {
            hook(&ctx, report);
        }
    }

    outcome
}
