//! The dispatcher ("commander"): owns the entry set and the single timer
//! loop that fires jobs at their computed due times.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::guard::{run_guarded, RecoverHook};
use crate::job::{EntryId, Job, JobStatus, WaveMetadata};
use crate::pool::Pool;
use crate::spec::{Location, Schedule};

/// Sleep horizon when no entry has an upcoming due time.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// One registered schedule bound to its job and next due time.
struct Entry {
    id: EntryId,
    schedule: Schedule,
    job: Arc<Job>,
    /// `None` when the schedule has no future occurrence.
    next: Option<DateTime<Utc>>,
}

/// Serializable read-only view of an entry, safe to take while the loop
/// runs. Down jobs are exported with `next_run: None`.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySnapshot {
    pub id: EntryId,
    pub spec: String,
    pub status: JobStatus,
    pub last_error: Option<String>,
    pub wave: Option<WaveMetadata>,
    pub next_run: Option<DateTime<Utc>>,
}

impl EntrySnapshot {
    pub(crate) fn for_down_job(job: &Job) -> Self {
        Self {
            id: job.id(),
            spec: job.spec().to_string(),
            status: job.status(),
            last_error: job.last_error(),
            wave: job.wave(),
            next_run: None,
        }
    }
}

/// Maintains the live entry set and triggers jobs when they come due.
///
/// Bookkeeping happens on the caller's thread under a short-lived mutex;
/// the timer loop runs as one spawned task and never blocks on job
/// execution; due jobs are handed to the pool/guard pipeline with
/// fire-and-continue semantics.
pub struct Dispatcher {
    entries: Arc<Mutex<Vec<Entry>>>,
    nudge_tx: mpsc::UnboundedSender<()>,
    stop_tx: watch::Sender<bool>,
    location: Location,
}

impl Dispatcher {
    /// Create the dispatcher and spawn its timer loop.
    pub fn start(location: Location, pool: Pool, hook: RecoverHook) -> Self {
        let entries: Arc<Mutex<Vec<Entry>>> = Arc::new(Mutex::new(Vec::new()));
        let (nudge_tx, nudge_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let loop_entries = Arc::clone(&entries);
        tokio::spawn(async move {
            timer_loop(loop_entries, nudge_rx, stop_rx, location, pool, hook).await;
        });

        Self {
            entries,
            nudge_tx,
            stop_tx,
            location,
        }
    }

    /// Register an entry. Its first due time is computed immediately so the
    /// snapshot reflects the registration before the loop next wakes.
    pub fn add(&self, schedule: Schedule, job: Arc<Job>) {
        let next = schedule.next_after(Utc::now(), self.location);
        let id = job.id();
        self.lock_entries().push(Entry {
            id,
            schedule,
            job,
            next,
        });
        debug!(entry_id = id, next = ?next, "entry registered");
        let _ = self.nudge_tx.send(());
    }

    /// Deregister an entry. Idempotent: removing an unknown id is a no-op.
    /// An in-flight run of the entry completes uninterrupted.
    pub fn remove(&self, id: EntryId) {
        let removed = {
            let mut entries = self.lock_entries();
            let before = entries.len();
            entries.retain(|e| e.id != id);
            before != entries.len()
        };
        if removed {
            info!(entry_id = id, "entry removed");
            let _ = self.nudge_tx.send(());
        } else {
            debug!(entry_id = id, "remove ignored: unknown entry");
        }
    }

    /// Halt the timer loop. In-flight executions are not cancelled.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Snapshot of all live entries in registration order.
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.lock_entries()
            .iter()
            .map(|e| EntrySnapshot {
                id: e.id,
                spec: e.job.spec().to_string(),
                status: e.job.status(),
                last_error: e.job.last_error(),
                wave: e.job.wave(),
                next_run: e.next,
            })
            .collect()
    }

    fn lock_entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// The single timer loop: wait for the earliest due time (or a membership
/// change), submit everything due, recompute, repeat.
async fn timer_loop(
    entries: Arc<Mutex<Vec<Entry>>>,
    mut nudge_rx: mpsc::UnboundedReceiver<()>,
    mut stop_rx: watch::Receiver<bool>,
    location: Location,
    pool: Pool,
    hook: RecoverHook,
) {
    info!("dispatcher loop started");
    loop {
        let next_due = {
            let entries = entries
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            entries.iter().filter_map(|e| e.next).min()
        };
        let sleep_for = match next_due {
            Some(at) => (at - Utc::now()).to_std().unwrap_or(Duration::ZERO),
            None => IDLE_WAIT,
        };

        tokio::select! {
            _ = tokio::time::sleep(sleep_for) => {
                let now = Utc::now();
                let due: Vec<Arc<Job>> = {
                    let mut entries = entries
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    let mut due = Vec::new();
                    // Registration order is the stable submission order for
                    // entries due at the same instant.
                    for entry in entries.iter_mut() {
                        if entry.next.is_some_and(|next| next <= now) {
                            due.push(Arc::clone(&entry.job));
                            entry.next = entry.schedule.next_after(now, location);
                        }
                    }
                    due
                };
                for job in due {
                    submit(job, &pool, &hook);
                }
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            nudged = nudge_rx.recv() => {
                // A membership change may have introduced an earlier due
                // time; fall through and re-evaluate. A closed channel
                // means the dispatcher handle is gone.
                if nudged.is_none() {
                    break;
                }
            }
        }
    }
    info!("dispatcher loop stopped");
}

/// Hand one due job to the pool/guard pipeline without blocking the loop.
fn submit(job: Arc<Job>, pool: &Pool, hook: &RecoverHook) {
    let pool = pool.clone();
    let hook = Arc::clone(hook);
    tokio::spawn(async move {
        let Some(_permit) = pool.acquire().await else {
            return;
        };
        let ctx = job.context();
        run_guarded(&job, ctx, &hook).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::default_recover_hook;
    use crate::job::JobFn;
    use crate::spec::parse;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_job(id: EntryId, spec: &str, counter: Arc<AtomicUsize>) -> Arc<Job> {
        Arc::new(Job::new(
            id,
            spec,
            Arc::new(JobFn::new(move |_ctx| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })),
            None,
        ))
    }

    #[tokio::test]
    async fn snapshot_reflects_registration_immediately() {
        let dispatcher = Dispatcher::start(
            Location::Local,
            Pool::new(4),
            default_recover_hook(),
        );
        let counter = Arc::new(AtomicUsize::new(0));
        dispatcher.add(parse("@daily").unwrap(), counting_job(1, "@daily", counter));

        let snapshot = dispatcher.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, 1);
        assert_eq!(snapshot[0].status, JobStatus::Scheduled);
        assert!(snapshot[0].next_run.is_some());
        dispatcher.stop();
    }

    #[tokio::test]
    async fn due_entries_fire_and_reschedule() {
        let dispatcher = Dispatcher::start(
            Location::Local,
            Pool::new(4),
            default_recover_hook(),
        );
        let counter = Arc::new(AtomicUsize::new(0));
        dispatcher.add(
            parse("@every 1s").unwrap(),
            counting_job(1, "@every 1s", Arc::clone(&counter)),
        );

        tokio::time::sleep(Duration::from_millis(1300)).await;
        assert!(counter.load(Ordering::SeqCst) >= 1);

        // Still registered with a future due time after firing.
        let snapshot = dispatcher.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].next_run.unwrap() > Utc::now());
        dispatcher.stop();
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dispatcher = Dispatcher::start(
            Location::Local,
            Pool::new(4),
            default_recover_hook(),
        );
        let counter = Arc::new(AtomicUsize::new(0));
        dispatcher.add(parse("@daily").unwrap(), counting_job(9, "@daily", counter));

        dispatcher.remove(9);
        assert!(dispatcher.snapshot().is_empty());
        // Second removal of the same id has no observable effect.
        dispatcher.remove(9);
        assert!(dispatcher.snapshot().is_empty());
        dispatcher.stop();
    }

    #[tokio::test]
    async fn stop_halts_future_triggering() {
        let dispatcher = Dispatcher::start(
            Location::Local,
            Pool::new(4),
            default_recover_hook(),
        );
        let counter = Arc::new(AtomicUsize::new(0));
        dispatcher.add(
            parse("@every 1s").unwrap(),
            counting_job(1, "@every 1s", Arc::clone(&counter)),
        );
        dispatcher.stop();

        tokio::time::sleep(Duration::from_millis(1300)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
