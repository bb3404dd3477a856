//! Periodic enforcement of overdue loans.
//!
//! [`LoanMonitor`] runs [`Engine::sweep_overdue_loans`] on a fixed interval
//! and hands every resulting [`Notice`] to a [`Notifier`]. A sweep that fails
//! as a whole is retried after a shorter delay.

use std::{error::Error, future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Balances, Engine, ResetSummary, ResultEngine, SweepReport};

pub type NotifyResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Message for a single user produced by a sweep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    OverdueWarning {
        user_id: String,
        days_past_due: i64,
        days_until_reset: i64,
        outstanding: Balances,
    },
    AccountReset(ResetSummary),
}

impl Notice {
    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::OverdueWarning { user_id, .. } => user_id,
            Self::AccountReset(summary) => &summary.user_id,
        }
    }

    /// Plain-text body suitable for a direct message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::OverdueWarning {
                days_past_due,
                days_until_reset,
                outstanding,
                ..
            } => format!(
                "Your loan repayment is {days_past_due} day(s) overdue. You still owe {} gold and {} silver. \
                 If it is not repaid within {days_until_reset} day(s), your account will be reset.",
                outstanding.gold, outstanding.silver
            ),
            Self::AccountReset(summary) => format!(
                "Your account has been reset because of {}. Seized: {} gold and {} silver; \
                 {} business(es) closed, {} loan(s) marked defaulted.",
                summary.reason,
                summary.seized.gold,
                summary.seized.silver,
                summary.businesses_closed,
                summary.loans_defaulted
            ),
        }
    }
}

/// Delivery channel for sweep notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice) -> impl Future<Output = NotifyResult> + Send;
}

/// Writes notices to the log. Used when no chat front end is running.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notice: &Notice) -> NotifyResult {
        tracing::info!(user_id = notice.user_id(), "{}", notice.message());
        Ok(())
    }
}

pub struct LoanMonitor<N> {
    engine: Arc<Engine>,
    notifier: N,
    interval: Duration,
    retry_after: Duration,
}

impl<N: Notifier> LoanMonitor<N> {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
    pub const DEFAULT_RETRY: Duration = Duration::from_secs(60 * 60);

    pub fn new(engine: Arc<Engine>, notifier: N) -> Self {
        Self {
            engine,
            notifier,
            interval: Self::DEFAULT_INTERVAL,
            retry_after: Self::DEFAULT_RETRY,
        }
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Runs one sweep and delivers its notices. Delivery failures are logged
    /// and do not fail the sweep.
    pub async fn run_once(&self, now: DateTime<Utc>) -> ResultEngine<SweepReport> {
        let report = self.engine.sweep_overdue_loans(now).await?;
        for notice in &report.notices {
            if let Err(err) = self.notifier.notify(notice).await {
                tracing::warn!(user_id = notice.user_id(), error = %err, "failed to deliver notice");
            }
        }
        Ok(report)
    }

    /// Runs one sweep and returns how long to wait before the next one:
    /// `interval` after a successful sweep, `retry_after` after a failed one.
    pub async fn tick(&self, now: DateTime<Utc>) -> Duration {
        match self.run_once(now).await {
            Ok(report) => {
                tracing::info!(
                    warned = report.warned(),
                    reset = report.resets().count(),
                    failed = report.failures.len(),
                    "overdue loan sweep finished"
                );
                self.interval
            }
            Err(err) => {
                tracing::error!(error = %err, "overdue loan sweep failed");
                self.retry_after
            }
        }
    }

    /// Sweeps forever.
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            retry_secs = self.retry_after.as_secs(),
            "loan monitor started"
        );
        loop {
            let delay = self.tick(Utc::now()).await;
            tokio::time::sleep(delay).await;
        }
    }
}
