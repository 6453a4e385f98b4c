//! Autosave scheduler for charrank.
//!
//! Re-runs the ranking refresh on the latest page snapshot at a fixed
//! interval. Changing the interval restarts the timer; a refresh that is
//! already running is left to finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::app::{refresh, App, RefreshOutcome};
use crate::types::errors::AppError;
use crate::types::settings::AutosaveSettings;

/// One scheduled refresh, with its outcome logged.
async fn run_pass(app: Arc<Mutex<App>>) {
    match refresh(&app, None).await {
        Ok(RefreshOutcome::Recorded { timestamp, characters, .. }) => {
            info!(%timestamp, characters, "Autosave recorded ranking")
        }
        Ok(RefreshOutcome::Empty) => info!("Autosave found no characters"),
        Err(AppError::NoPageSnapshot) => debug!("Autosave skipped: no page snapshot yet"),
        Err(e) => warn!(error = %e, "Autosave failed"),
    }
}

/// Owns the background timer task.
#[derive(Default)]
pub struct AutosaveScheduler {
    handle: Option<JoinHandle<()>>,
    period: Option<Duration>,
}

impl AutosaveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the timer, replacing any running one. The first run happens
    /// one full period after the call.
    pub fn start(&mut self, app: Arc<Mutex<App>>, period: Duration) {
        self.stop();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // The pass runs in its own task: aborting the timer detaches it
                // instead of cancelling it.
                let pass = tokio::spawn(run_pass(Arc::clone(&app)));
                if let Err(e) = pass.await {
                    warn!(error = %e, "Autosave pass panicked");
                }
            }
        });
        self.handle = Some(handle);
        self.period = Some(period);
        info!(period_secs = period.as_secs_f64(), "Autosave scheduled");
    }

    /// Stops the timer if running. A pass already in flight still completes.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Autosave stopped");
        }
        self.period = None;
    }

    /// Starts, restarts, or stops the timer to match `settings`.
    pub fn apply(&mut self, app: Arc<Mutex<App>>, settings: &AutosaveSettings) {
        if settings.enabled {
            let period = Duration::from_secs(u64::from(settings.interval_minutes) * 60);
            if self.period != Some(period) || !self.is_running() {
                self.start(app, period);
            }
        } else {
            self.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
