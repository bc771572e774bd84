//! `chime-scheduler`: cron-style job scheduling engine.
//!
//! # Overview
//!
//! A [`Controller`] owns the full pipeline: schedule specs are parsed into
//! [`Schedule`]s, registered jobs become dispatcher entries, and a single
//! timer loop fires each entry at its computed due time. Fired jobs pass
//! through a counting admission pool (bounding process-wide concurrency) and
//! a fault guard that keeps panicking job bodies from taking the scheduler
//! down.
//!
//! # Spec grammar
//!
//! | Form         | Example                  | Behaviour                         |
//! |--------------|--------------------------|-----------------------------------|
//! | Cron         | `0 */10 * * * *`         | Six fields, seconds granularity   |
//! | Descriptor   | `@daily`, `@hourly`      | Named shorthand                   |
//! | Interval     | `@every 1h30m`           | Fixed interval, minimum 1 second  |
//!
//! # Example
//!
//! ```no_run
//! use chime_scheduler::{Controller, JobFn};
//! use chime_core::config::SchedulerSettings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let controller = Controller::new(&SchedulerSettings::default())?;
//! controller.schedule("@every 5m", JobFn::new(|_ctx| async {
//!     println!("tick");
//!     Ok(())
//! }))?;
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod guard;
pub mod job;
pub mod pool;
pub mod spec;

pub use controller::Controller;
pub use dispatcher::EntrySnapshot;
pub use error::{Result, SchedulerError};
pub use guard::{default_recover_hook, FaultReport, RecoverHook, RunOutcome};
pub use job::{EntryId, Job, JobContext, JobFn, JobStatus, Runnable, WaveMetadata};
pub use pool::Pool;
pub use spec::{parse, Location, Schedule};
