//! Periodic monitoring: check now, then every interval until Ctrl-C.

use crate::cli::check_cmd;
use crate::cli::output::{self, Styled};
use crate::config::Config;
use crate::monitor::Monitor;
use anyhow::{bail, Context, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

pub const DEFAULT_INTERVAL_HOURS: u64 = 6;

pub async fn run(config: &Config, interval_hours: u64) -> Result<()> {
    let every = interval(interval_hours)?;
    let monitor = Monitor::from_config(config)?;
    let s = Styled::new();

    if !output::is_quiet() && !output::is_json() {
        eprintln!(
            "  {} Monitoring prices every {interval_hours} hour(s). Press Ctrl-C to stop.",
            s.ok_sym()
        );
    }
    info!("monitor started: interval={}s", every.as_secs());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        info!("received shutdown signal");
    };
    run_until(&monitor, every, &config.currency, shutdown).await;

    if !output::is_quiet() && !output::is_json() {
        eprintln!("  {} Monitoring stopped.", s.ok_sym());
    }
    Ok(())
}

/// Hours to a tick period. Zero and out-of-range values are rejected.
fn interval(hours: u64) -> Result<Duration> {
    if hours == 0 {
        bail!("interval must be at least one hour");
    }
    let secs = hours
        .checked_mul(3600)
        .with_context(|| format!("interval of {hours} hours is too large"))?;
    Ok(Duration::from_secs(secs))
}

/// Run check cycles every `every` until `shutdown` resolves, including while
/// a cycle is in flight. Returns the number of cycles that completed.
async fn run_until(
    monitor: &Monitor,
    every: Duration,
    currency: &str,
    shutdown: impl Future<Output = ()>,
) -> usize {
    tokio::pin!(shutdown);

    // The first tick fires immediately, giving the initial check.
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut completed = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => break,
        }
        tokio::select! {
            result = monitor.run_cycle() => {
                completed += 1;
                match result {
                    Ok(report) => check_cmd::print_report(&report, currency),
                    Err(e) => error!("check cycle failed: {e}"),
                }
            }
            _ = &mut shutdown => {
                warn!("stopping in the middle of a check cycle");
                break;
            }
        }
    }
    completed
}
