//! The orchestrator: one per process, owning every piece of mutable
//! client state and the background tasks that touch it.

use std::sync::Arc;

use host_bridge::{
    EventChannel, HostBridge, MissingEventChannel, MissingHostBridge, MissingProcessControl,
    ProcessControl, Updater,
};
use shared::domain::ModId;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    config::SessionSettings,
    fusion::{FusionOutcome, FusionWorkflow},
    hints::HintDeck,
    overlay::OverlayTiming,
    scan,
    selection::SelectionState,
    update::{UpdateManager, UpdateOutcome, UpdatePrompt},
    view::{Cue, ViewState},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub view: ViewState,
    pub selection: SelectionState,
}

pub type SharedState = Arc<Mutex<SessionState>>;

/// Host capabilities handed to a session. Absent ones use the
/// `Missing*` stand-ins, which fail every call.
pub struct SessionDeps {
    pub bridge: Arc<dyn HostBridge>,
    pub events: Arc<dyn EventChannel>,
    pub updater: Option<Arc<dyn Updater>>,
    pub prompt: Option<Arc<dyn UpdatePrompt>>,
    pub process: Arc<dyn ProcessControl>,
}

impl Default for SessionDeps {
    fn default() -> Self {
        Self {
            bridge: Arc::new(MissingHostBridge),
            events: Arc::new(MissingEventChannel),
            updater: None,
            prompt: None,
            process: Arc::new(MissingProcessControl),
        }
    }
}

#[derive(Default)]
struct SessionTasks {
    started: bool,
    update: Option<JoinHandle<UpdateOutcome>>,
    ingestion: Option<JoinHandle<()>>,
}

pub struct Session {
    state: SharedState,
    settings: SessionSettings,
    bridge: Arc<dyn HostBridge>,
    events: Arc<dyn EventChannel>,
    updates: Arc<UpdateManager>,
    fusion: FusionWorkflow,
    tasks: Mutex<SessionTasks>,
}

impl Session {
    /// Builds a session, loading the hint list from `settings.hints_path`.
    pub fn new(deps: SessionDeps, settings: SessionSettings) -> Arc<Self> {
        let hints = HintDeck::load(&settings.hints_path);
        Self::with_hints(deps, settings, hints)
    }

    pub fn with_hints(deps: SessionDeps, settings: SessionSettings, hints: HintDeck) -> Arc<Self> {
        let state: SharedState = Arc::new(Mutex::new(SessionState::default()));
        let updates = Arc::new(UpdateManager::new(
            deps.updater,
            deps.prompt,
            deps.process,
            state.clone(),
            settings.install_restart_delay,
        ));
        let fusion = FusionWorkflow::new(
            deps.bridge.clone(),
            state.clone(),
            Arc::new(hints),
            OverlayTiming::from(&settings),
        );
        Arc::new(Self {
            state,
            settings,
            bridge: deps.bridge,
            events: deps.events,
            updates,
            fusion,
            tasks: Mutex::new(SessionTasks::default()),
        })
    }

    /// Schedules the delayed update check, then starts scan ingestion.
    /// Runs once per session; later calls are ignored.
    pub async fn start(&self) {
        {
            let mut tasks = self.tasks.lock().await;
            if tasks.started {
                warn!("session already started");
                return;
            }
            tasks.started = true;
            info!("starting session");
            tasks.update = Some(self.updates.schedule(self.settings.update_check_delay));
        }
        self.rescan().await;
    }

    /// Drops the current grid and selection and scans again.
    pub async fn rescan(&self) {
        if let Some(ingestion) = self.tasks.lock().await.ingestion.take() {
            ingestion.abort();
        }
        let ingestion =
            scan::start_ingestion(self.state.clone(), self.events.as_ref(), self.bridge.as_ref())
                .await;
        self.tasks.lock().await.ingestion = ingestion;
    }

    /// Toggles selection of a grid entry. `None` when the id is not on the
    /// grid or an overlay is blocking interaction.
    pub async fn toggle(&self, id: &ModId) -> Option<bool> {
        let mut guard = self.state.lock().await;
        if guard.view.is_blocked() || !guard.view.grid.contains(id) {
            debug!(%id, "ignoring toggle");
            return None;
        }
        let selected = guard.selection.toggle(id);
        guard.view.grid.set_selected(id, selected);
        let summary = guard.selection.summary();
        guard.view.apply_selection_summary(summary);
        Some(selected)
    }

    pub async fn fuse(&self) -> FusionOutcome {
        self.fusion.run().await
    }

    pub async fn dismiss_notice(&self) {
        self.state.lock().await.view.notice = None;
    }

    pub async fn view(&self) -> ViewState {
        self.state.lock().await.view.clone()
    }

    pub async fn selection(&self) -> SelectionState {
        self.state.lock().await.selection.clone()
    }

    pub async fn take_cues(&self) -> Vec<Cue> {
        self.state.lock().await.view.take_cues()
    }

    pub fn updates(&self) -> &Arc<UpdateManager> {
        &self.updates
    }

    pub async fn overlay_active(&self) -> bool {
        self.fusion.overlay_active().await
    }

    /// Waits for the scheduled update flow, if one was started.
    pub async fn wait_for_update(&self) -> Option<UpdateOutcome> {
        let handle = self.tasks.lock().await.update.take()?;
        handle.await.ok()
    }

    pub async fn shutdown(&self) {
        let (update, ingestion) = {
            let mut tasks = self.tasks.lock().await;
            (tasks.update.take(), tasks.ingestion.take())
        };
        if let Some(update) = update {
            update.abort();
        }
        if let Some(ingestion) = ingestion {
            ingestion.abort();
        }
        self.fusion.cancel_overlay().await;
        info!("session shut down");
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
