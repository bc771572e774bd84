//! Demo jobs registered at startup so the status page has something to
//! show. Mirrors a typical consumer: plain jobs, a failing job, and a
//! wave-tagged subscription sweep.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use chime_scheduler::{Controller, JobContext, Runnable};

struct SendEmail;

#[async_trait]
impl Runnable for SendEmail {
    async fn run(&self, _ctx: JobContext) -> anyhow::Result<()> {
        info!("sending email batch");
        Ok(())
    }
}

struct PayBill;

#[async_trait]
impl Runnable for PayBill {
    async fn run(&self, _ctx: JobContext) -> anyhow::Result<()> {
        info!("paying bills");
        Ok(())
    }
}

struct AlwaysError;

#[async_trait]
impl Runnable for AlwaysError {
    async fn run(&self, _ctx: JobContext) -> anyhow::Result<()> {
        anyhow::bail!("some super long error message that you want to see in the log")
    }
}

struct HeartBeat;

#[async_trait]
impl Runnable for HeartBeat {
    async fn run(&self, _ctx: JobContext) -> anyhow::Result<()> {
        info!("heartbeat");
        Ok(())
    }
}

/// One logical subscription sweep registered under three schedules; each
/// run knows its ordinal so the last wave can do the final accounting.
struct Subscription;

#[async_trait]
impl Runnable for Subscription {
    async fn run(&self, ctx: JobContext) -> anyhow::Result<()> {
        let Some(wave) = ctx.wave else {
            anyhow::bail!("subscription job requires wave metadata");
        };
        info!(
            wave = wave.wave,
            total_wave = wave.total_wave,
            "charging residual subscriptions"
        );
        if wave.is_last_wave {
            info!("final subscription wave, closing the billing cycle");
        }
        Ok(())
    }
}

/// Register the demo jobs. Errors are logged, not fatal: a rejected spec
/// shows up on the status page as a Down job, which is part of the demo.
pub fn register(controller: &Arc<Controller>) {
    if let Err(e) = controller.schedule("0 */9 * * * *", SendEmail) {
        warn!(error = %e, "send-email registration failed");
    }
    if let Err(e) = controller.schedule("0 */1 * * * *", PayBill) {
        warn!(error = %e, "pay-bill registration failed");
    }
    if let Err(e) = controller.schedule("@every 30s", AlwaysError) {
        warn!(error = %e, "always-error registration failed");
    }
    if let Err(e) = controller.every(Duration::from_secs(60), HeartBeat) {
        warn!(error = %e, "heartbeat registration failed");
    }
    if let Err(e) = controller.schedules("0 0 1 * * *#0 0 2 * * *#0 0 3 * * *", "#", Subscription)
    {
        warn!(error = %e, "subscription registration failed");
    }
    // Deliberately broken spec, lands in the Down list on /jobs.
    if let Err(e) = controller.schedule("this is not a schedule", SendEmail) {
        warn!(error = %e, "broken-spec registration failed (expected)");
    }
}
