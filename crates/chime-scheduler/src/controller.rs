//! Controller: the single entry point for scheduling calls. Owns the
//! parser, the dispatcher, the admission pool, and the registry of jobs
//! whose specs failed to parse.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{info, warn};

use chime_core::config::SchedulerSettings;

use crate::dispatcher::{Dispatcher, EntrySnapshot};
use crate::error::{Result, SchedulerError};
use crate::guard::{default_recover_hook, RecoverHook};
use crate::job::{EntryId, Job, Runnable, WaveMetadata};
use crate::pool::Pool;
use crate::spec::{parse, Location, Schedule};

/// Separator characters reserved by cron field syntax. Callers of
/// [`Controller::schedules`] must never pick one of these.
pub const RESERVED_SEPARATORS: &[char] = &['*', '/', ',', '-', '?'];

/// One scheduler per process, constructed explicitly by the hosting
/// application and shared as `Arc<Controller>`.
pub struct Controller {
    dispatcher: Dispatcher,
    pool: Pool,
    next_id: AtomicU64,
    down_jobs: Mutex<Vec<Arc<Job>>>,
    running: AtomicBool,
}

impl Controller {
    /// Build the controller and start the dispatcher loop.
    ///
    /// Must be called from within a tokio runtime. Fails only when the
    /// configured timezone is not a known IANA zone.
    pub fn new(settings: &SchedulerSettings) -> Result<Arc<Self>> {
        Self::with_recover_hook(settings, default_recover_hook())
    }

    /// Like [`Controller::new`] with a custom panic-recovery hook.
    pub fn with_recover_hook(settings: &SchedulerSettings, hook: RecoverHook) -> Result<Arc<Self>> {
        let location = Location::resolve(settings.location.as_deref())?;
        let pool = Pool::new(settings.effective_pool_size());
        let dispatcher = Dispatcher::start(location, pool.clone(), hook);

        info!(
            pool_size = pool.capacity(),
            location = ?location,
            "scheduler controller started"
        );

        Ok(Arc::new(Self {
            dispatcher,
            pool,
            next_id: AtomicU64::new(1),
            down_jobs: Mutex::new(Vec::new()),
            running: AtomicBool::new(true),
        }))
    }

    /// Register a job under a schedule expression.
    ///
    /// On parse failure the job is recorded as Down (visible via
    /// [`Controller::down_jobs`], never scheduled) and the parse error is
    /// returned.
    pub fn schedule<R>(&self, spec: &str, job: R) -> Result<EntryId>
    where
        R: Runnable + 'static,
    {
        self.register(spec, Arc::new(job), None)
    }

    /// Register one logical job under several schedule expressions.
    ///
    /// `spec` is split on `separator`; each sub-spec is registered in order
    /// and tagged with its wave ordinal. The characters `*/,-?` are
    /// reserved by cron syntax and must never be used as the separator.
    ///
    /// The first parse error stops registration and is returned;
    /// previously registered sub-specs stay active (no rollback).
    pub fn schedules<R>(&self, spec: &str, separator: &str, job: R) -> Result<Vec<EntryId>>
    where
        R: Runnable + 'static,
    {
        if spec.is_empty() {
            return Err(SchedulerError::InvalidArgument(
                "empty specification".to_string(),
            ));
        }
        if separator.is_empty() {
            return Err(SchedulerError::InvalidArgument(
                "empty separator".to_string(),
            ));
        }
        if separator.contains(RESERVED_SEPARATORS) {
            return Err(SchedulerError::InvalidArgument(format!(
                "separator {separator:?} collides with cron syntax"
            )));
        }

        let job: Arc<dyn Runnable> = Arc::new(job);
        let sub_specs: Vec<&str> = spec.split(separator).collect();
        let total_wave = sub_specs.len();

        let mut ids = Vec::with_capacity(total_wave);
        for (index, sub_spec) in sub_specs.into_iter().enumerate() {
            let wave = WaveMetadata {
                wave: index + 1,
                total_wave,
                is_last_wave: index + 1 == total_wave,
            };
            let id = self.register(sub_spec, Arc::clone(&job), Some(wave))?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Register a job at a fixed interval. Intervals shorter than one
    /// second are rounded up.
    pub fn every<R>(&self, interval: Duration, job: R) -> Result<EntryId>
    where
        R: Runnable + 'static,
    {
        self.ensure_running()?;

        let interval = interval.max(Duration::from_secs(1));
        let spec = if interval.subsec_millis() == 0 {
            format!("@every {}s", interval.as_secs())
        } else {
            format!("@every {}s{}ms", interval.as_secs(), interval.subsec_millis())
        };
        let schedule = Schedule::Every(interval);
        Ok(self.add_entry(schedule, &spec, Arc::new(job), None))
    }

    /// Deregister an entry. Idempotent; an in-flight run completes
    /// uninterrupted.
    pub fn remove(&self, id: EntryId) {
        self.dispatcher.remove(id);
    }

    /// Halt the dispatcher loop. Scheduling calls after this return
    /// [`SchedulerError::NotRunning`]; in-flight executions finish.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.dispatcher.stop();
            info!("scheduler controller stopped");
        }
    }

    /// Snapshot of live entries in registration order.
    pub fn entries(&self) -> Vec<EntrySnapshot> {
        self.dispatcher.snapshot()
    }

    /// Jobs whose specs failed to parse. Terminal, never scheduled.
    pub fn down_jobs(&self) -> Vec<EntrySnapshot> {
        self.lock_down()
            .iter()
            .map(|job| EntrySnapshot::for_down_job(job))
            .collect()
    }

    pub fn pool_capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn pool_available(&self) -> usize {
        self.pool.available()
    }

    fn register(
        &self,
        spec: &str,
        job: Arc<dyn Runnable>,
        wave: Option<WaveMetadata>,
    ) -> Result<EntryId> {
        self.ensure_running()?;

        match parse(spec) {
            Ok(schedule) => Ok(self.add_entry(schedule, spec, job, wave)),
            Err(e) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let down = Arc::new(Job::down(id, spec, job, e.to_string()));
                self.lock_down().push(down);
                warn!(entry_id = id, spec = %spec, error = %e, "spec rejected, job marked down");
                Err(e)
            }
        }
    }

    fn add_entry(
        &self,
        schedule: Schedule,
        spec: &str,
        job: Arc<dyn Runnable>,
        wave: Option<WaveMetadata>,
    ) -> EntryId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let job = Arc::new(Job::new(id, spec, job, wave));
        self.dispatcher.add(schedule, job);
        id
    }

    fn ensure_running(&self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SchedulerError::NotRunning)
        }
    }

    fn lock_down(&self) -> std::sync::MutexGuard<'_, Vec<Arc<Job>>> {
        self.down_jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
