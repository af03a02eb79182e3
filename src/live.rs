//! Live refresh
//!
//! Re-fetches the dashboard on a fixed interval and hands each render to
//! a callback. A terminated session always ends the loop.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::views::{Dashboard, DashboardView, HistoryView, Notifier};

/// Posted when a refresh starts failing
pub const REFRESH_FAILED: &str = "Live refresh failed; retrying";

/// Posted when a refresh succeeds again after a failure
pub const REFRESH_RECOVERED: &str = "Live refresh recovered";

/// Why a live loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Terminated,
    Stopped,
    Interrupted,
}

pub struct LiveRefresh {
    interval: Duration,
    notifier: Option<Arc<Notifier>>,
}

/// Whether a render shows a failed fetch
fn is_failure(view: &DashboardView) -> bool {
    match view {
        DashboardView::Error { .. } => true,
        DashboardView::Ready(ready) => matches!(ready.history, HistoryView::Error { .. }),
        _ => false,
    }
}

impl LiveRefresh {
    pub fn new(interval: Duration) -> Self {
        // tokio::time::interval panics on zero
        let interval = interval.max(Duration::from_millis(1));
        Self {
            interval,
            notifier: None,
        }
    }

    /// Report failing and recovering refreshes, and age out old notices
    pub fn with_notifier(mut self, notifier: Arc<Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until the session ends or Ctrl-C
    pub async fn run<F>(&self, dashboard: &mut Dashboard, on_render: F) -> StopReason
    where
        F: FnMut(&DashboardView) -> ControlFlow<()>,
    {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.run_until(dashboard, on_render, shutdown).await
    }

    /// Like [`LiveRefresh::run`] with a caller-supplied shutdown future
    pub async fn run_until<F, S>(&self, dashboard: &mut Dashboard, mut on_render: F, shutdown: S) -> StopReason
    where
        F: FnMut(&DashboardView) -> ControlFlow<()>,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(self.interval);
        let mut first = true;
        let mut failing = false;

        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Live refresh started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Live refresh interrupted");
                    return StopReason::Interrupted;
                }
                _ = ticker.tick() => {}
            }

            // First tick completes immediately; reuse whatever is cached
            if first {
                dashboard.load().await;
                first = false;
            } else {
                dashboard.refresh().await;
            }

            let view = dashboard.render();
            failing = self.report(failing, &view);
            if on_render(&view).is_break() {
                return StopReason::Stopped;
            }
            if dashboard.is_terminated() {
                return StopReason::Terminated;
            }
        }
    }

    /// Post a notice when the failure state flips; returns the new state
    fn report(&self, was_failing: bool, view: &DashboardView) -> bool {
        let failing = is_failure(view);
        let Some(notifier) = &self.notifier else {
            return failing;
        };

        let expired = notifier.expire(Utc::now());
        if expired > 0 {
            tracing::debug!(expired, "Notifications expired");
        }

        match (was_failing, failing) {
            (false, true) => {
                notifier.error(REFRESH_FAILED);
            }
            (true, false) => {
                notifier.success(REFRESH_RECOVERED);
            }
            _ => {}
        }
        failing
    }
}
