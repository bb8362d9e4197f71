use std::sync::Arc;

use host_bridge::HostBridge;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::FlowError,
    hints::HintDeck,
    overlay::{OverlaySession, OverlayTiming},
    selection::FUSION_LABEL,
    session::SharedState,
    view::{Cue, Notice},
};

pub const PROCESSING_LABEL: &str = "PROCESANDO...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FusionOutcome {
    /// Nothing selected; no side effects.
    Skipped,
    /// The action control is disabled while a fusion is in flight.
    Busy,
    Completed { message: String },
    Failed(FlowError),
}

/// Turns the current selection into one backend merge call.
pub struct FusionWorkflow {
    bridge: Arc<dyn HostBridge>,
    state: SharedState,
    hints: Arc<HintDeck>,
    timing: OverlayTiming,
    overlay: Mutex<Option<OverlaySession>>,
}

impl FusionWorkflow {
    pub fn new(
        bridge: Arc<dyn HostBridge>,
        state: SharedState,
        hints: Arc<HintDeck>,
        timing: OverlayTiming,
    ) -> Self {
        Self {
            bridge,
            state,
            hints,
            timing,
            overlay: Mutex::new(None),
        }
    }

    pub async fn overlay_active(&self) -> bool {
        self.overlay
            .lock()
            .await
            .as_ref()
            .is_some_and(OverlaySession::is_active)
    }

    pub async fn run(&self) -> FusionOutcome {
        let ids = {
            let mut guard = self.state.lock().await;
            if guard.selection.is_empty() {
                debug!("fusion requested with empty selection");
                return FusionOutcome::Skipped;
            }
            if !guard.view.fusion_button.enabled {
                return FusionOutcome::Busy;
            }
            guard.view.play(Cue::Click);
            guard.view.fusion_button.enabled = false;
            guard.view.fusion_button.label = PROCESSING_LABEL.to_string();
            guard.selection.ids().to_vec()
        };

        self.open_overlay().await;
        info!(count = ids.len(), "starting fusion");
        let response = self.bridge.merge_mods(&ids).await;
        self.close_overlay().await;

        let mut guard = self.state.lock().await;
        let outcome = match response {
            Ok(result) if result.is_ok() => {
                info!(message = %result.msg, "fusion completed");
                guard.view.show_notice(Notice::success(result.msg.clone()));
                guard.view.play(Cue::Complete);
                guard.view.fusion_button.label = FUSION_LABEL.to_string();
                guard.selection.clear();
                guard.view.grid.clear_selection();
                FusionOutcome::Completed {
                    message: result.msg,
                }
            }
            Ok(result) => {
                warn!(message = %result.msg, "backend reported fusion failure");
                FusionOutcome::Failed(FlowError::BackendReported(result.msg))
            }
            Err(error) => {
                let failure = FlowError::transport(&error);
                warn!(error = %failure, "merge request failed");
                FusionOutcome::Failed(failure)
            }
        };
        if let FusionOutcome::Failed(failure) = &outcome {
            if let Some(notice) = failure.notice() {
                guard.view.show_notice(notice);
            }
        }
        guard.view.fusion_button.enabled = true;
        outcome
    }

    async fn open_overlay(&self) {
        let session =
            OverlaySession::open(self.state.clone(), self.hints.clone(), self.timing).await;
        if let Some(mut stale) = self.overlay.lock().await.replace(session) {
            stale.cancel();
        }
    }

    async fn close_overlay(&self) {
        let session = self.overlay.lock().await.take();
        if let Some(session) = session {
            session.close().await;
        }
    }

    /// Cancels any open overlay without the closing animation.
    pub async fn cancel_overlay(&self) {
        if let Some(mut session) = self.overlay.lock().await.take() {
            session.cancel();
            let mut guard = self.state.lock().await;
            guard.view.loading.visible = false;
            guard.view.loading.percent = 0;
        }
    }
}

#[cfg(test)]
#[path = "tests/fusion_tests.rs"]
mod tests;
