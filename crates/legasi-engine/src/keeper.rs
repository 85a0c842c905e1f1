//! GAD keeper - periodic sweep cranking every indebted position

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use legasi_common::AccountId;

use crate::context::ProtocolContext;
use crate::gad::{CrankOutcome, GadController, GadExecution};

/// Result of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub evaluated: usize,
    pub unwound: usize,
    pub skipped: usize,
    pub failed: usize,
    pub executions: Vec<GadExecution>,
}

/// Background cranker
#[derive(Debug)]
pub struct GadKeeper {
    ctx: Arc<ProtocolContext>,
    gad: Arc<GadController>,
    /// Receives cranker rewards, if any
    cranker: Option<AccountId>,
    interval: Duration,
    sweeps: AtomicU64,
}

impl GadKeeper {
    pub fn new(ctx: Arc<ProtocolContext>, gad: Arc<GadController>, cranker: Option<AccountId>) -> Self {
        let interval = Duration::from_secs(ctx.config.gad.keeper_interval_secs);
        Self {
            ctx,
            gad,
            cranker,
            interval,
            sweeps: AtomicU64::new(0),
        }
    }

    /// Crank every position that carries debt
    ///
    /// Per-account failures are logged and counted; they never stop the sweep.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for account in self.ctx.ledger.accounts() {
            let has_debt = self
                .ctx
                .ledger
                .get(&account)
                .map(|p| p.has_debt())
                .unwrap_or(false);
            if !has_debt {
                continue;
            }
            report.evaluated += 1;

            match self.gad.crank(&account, self.cranker.as_ref()) {
                Ok(CrankOutcome::Unwound(execution)) => {
                    report.unwound += 1;
                    report.executions.push(execution);
                }
                Ok(_) => report.skipped += 1,
                Err(err) => {
                    warn!(%account, error = %err, transient = err.is_transient(), "Keeper crank failed");
                    report.failed += 1;
                }
            }
        }

        self.sweeps.fetch_add(1, Ordering::Relaxed);
        debug!(
            evaluated = report.evaluated,
            unwound = report.unwound,
            failed = report.failed,
            "GAD sweep complete"
        );
        report
    }

    /// Sweeps completed since start
    pub fn sweeps_completed(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }

    /// Sweep on every interval tick until `shutdown` resolves
    pub async fn run(self: Arc<Self>, shutdown: impl Future<Output = ()>) {
        info!(interval_secs = self.interval.as_secs(), "GAD keeper started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(sweeps = self.sweeps_completed(), "GAD keeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.sweep();
                    if report.unwound > 0 || report.failed > 0 {
                        info!(unwound = report.unwound, failed = report.failed, "GAD keeper sweep");
                    }
                }
            }
        }
    }
}
