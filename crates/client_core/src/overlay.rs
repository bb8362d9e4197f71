//! Simulated progress for the loading overlay while a backend call is
//! outstanding. Two tickers run per overlay: the progress bar and the hint
//! rotation. Both always stop together.

use std::{sync::Arc, time::Duration};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::debug;

use crate::{config::SessionSettings, hints::HintDeck, session::SharedState};

pub const SIMULATED_PROGRESS_CAP: f64 = 95.0;
const MIN_STEP: f64 = 2.0;
const MAX_STEP: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayTiming {
    pub progress_tick: Duration,
    pub hint_rotation: Duration,
    pub close_hold: Duration,
}

impl From<&SessionSettings> for OverlayTiming {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            progress_tick: settings.progress_tick,
            hint_rotation: settings.hint_rotation,
            close_hold: settings.overlay_close_hold,
        }
    }
}

/// One tick of simulated progress: grows by `step` below the cap, never past it.
pub fn advance_progress(current: f64, step: f64) -> f64 {
    if current < SIMULATED_PROGRESS_CAP {
        (current + step).min(SIMULATED_PROGRESS_CAP)
    } else {
        current
    }
}

/// An open loading overlay owning both ticker tasks.
pub struct OverlaySession {
    state: SharedState,
    progress_ticker: Option<JoinHandle<()>>,
    hint_ticker: Option<JoinHandle<()>>,
    close_hold: Duration,
}

impl OverlaySession {
    pub async fn open(state: SharedState, hints: Arc<HintDeck>, timing: OverlayTiming) -> Self {
        let mut rng = StdRng::from_entropy();
        {
            let mut guard = state.lock().await;
            guard.view.loading.percent = 0;
            guard.view.loading.hint = hints.pick(&mut rng).to_string();
            guard.view.loading.visible = true;
        }

        let progress_ticker = {
            let state = state.clone();
            let mut rng = StdRng::from_rng(&mut rng).unwrap_or_else(|_| StdRng::from_entropy());
            tokio::spawn(async move {
                let mut progress = 0.0;
                let mut ticker = every(timing.progress_tick);
                loop {
                    ticker.tick().await;
                    if progress >= SIMULATED_PROGRESS_CAP {
                        continue;
                    }
                    progress = advance_progress(progress, rng.gen_range(MIN_STEP..MAX_STEP));
                    state.lock().await.view.loading.percent = progress.floor() as u8;
                }
            })
        };

        let hint_ticker = {
            let state = state.clone();
            tokio::spawn(async move {
                let mut ticker = every(timing.hint_rotation);
                loop {
                    ticker.tick().await;
                    let hint = hints.pick(&mut rng).to_string();
                    state.lock().await.view.loading.hint = hint;
                }
            })
        };

        debug!("loading overlay opened");
        Self {
            state,
            progress_ticker: Some(progress_ticker),
            hint_ticker: Some(hint_ticker),
            close_hold: timing.close_hold,
        }
    }

    pub fn is_active(&self) -> bool {
        self.progress_ticker.is_some() || self.hint_ticker.is_some()
    }

    /// Stops both tickers. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if let Some(ticker) = self.progress_ticker.take() {
            ticker.abort();
        }
        if let Some(ticker) = self.hint_ticker.take() {
            ticker.abort();
        }
    }

    /// Snaps to 100%, holds briefly, then hides the overlay.
    pub async fn close(mut self) {
        self.cancel();
        self.state.lock().await.view.loading.percent = 100;
        time::sleep(self.close_hold).await;
        {
            let mut guard = self.state.lock().await;
            guard.view.loading.visible = false;
            guard.view.loading.percent = 0;
        }
        debug!("loading overlay closed");
    }
}

impl Drop for OverlaySession {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Interval whose first tick lands one `period` from now.
fn every(period: Duration) -> time::Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = time::interval_at(time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
#[path = "tests/overlay_tests.rs"]
mod tests;
