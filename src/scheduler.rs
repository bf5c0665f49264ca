//! Periodic and on-demand cycle driving.
//!
//! One spawned task owns the reconciler and is the only place a cycle ever
//! runs, so at most one cycle executes process-wide. A trigger arriving
//! while a cycle is active queues in a capacity-1 channel and runs right
//! after the current cycle; further triggers coalesce into the pending one.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::reconciler::{CycleError, Reconciler};

/// Outcome of a [`SchedulerHandle::trigger_now`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A cycle will run as soon as the scheduler picks the trigger up.
    Queued,
    /// A trigger was already pending; this request merged into it.
    Coalesced,
    /// The scheduler loop has stopped.
    ShuttingDown,
}

/// Cheap handle for requesting on-demand cycles.
#[derive(Clone)]
pub struct SchedulerHandle {
    trigger_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    pub fn trigger_now(&self) -> TriggerOutcome {
        match self.trigger_tx.try_send(()) {
            Ok(()) => TriggerOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(())) => TriggerOutcome::Coalesced,
            Err(mpsc::error::TrySendError::Closed(())) => TriggerOutcome::ShuttingDown,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> (Self, mpsc::Receiver<()>) {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        (Self { trigger_tx }, trigger_rx)
    }
}

pub struct Scheduler {
    trigger_tx: mpsc::Sender<()>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the scheduler loop. The first periodic cycle runs one full
    /// `interval` after start; there is no immediate cycle at startup.
    pub fn spawn(reconciler: Reconciler, interval: Duration) -> Self {
        let (trigger_tx, mut trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut loop_shutdown = shutdown_rx.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_once(&reconciler, &shutdown_rx, "periodic").await;
                    }
                    Some(()) = trigger_rx.recv() => {
                        run_once(&reconciler, &shutdown_rx, "on_demand").await;
                    }
                    _ = loop_shutdown.changed() => {
                        tracing::info!("scheduler stopping");
                        break;
                    }
                }
            }
        });

        Self {
            trigger_tx,
            shutdown_tx,
            handle,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            trigger_tx: self.trigger_tx.clone(),
        }
    }

    /// Stop the loop and wait for it. An in-flight record commit finishes;
    /// the remainder of an active cycle is abandoned.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(err) = self.handle.await {
            tracing::error!(error = %err, "scheduler task panicked");
        }
    }
}

async fn run_once(reconciler: &Reconciler, shutdown: &watch::Receiver<bool>, origin: &'static str) {
    tracing::info!(origin, "reconciliation cycle starting");
    match reconciler.run_cycle(shutdown).await {
        Ok(summary) => {
            tracing::info!(
                origin,
                created = summary.created,
                updated = summary.updated,
                "reconciliation cycle finished"
            );
        }
        Err(CycleError::Cancelled) => {
            tracing::info!(origin, "reconciliation cycle abandoned during shutdown");
        }
        // A bad cycle must not kill the periodic loop.
        Err(err) => {
            tracing::error!(origin, error = %err, "reconciliation cycle failed");
        }
    }
}
