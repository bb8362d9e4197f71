use host_bridge::{EventChannel, HostBridge};
use shared::{
    domain::{ModEntry, ModId},
    protocol::HostEvent,
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    error::FlowError,
    session::{SessionState, SharedState},
};

pub const SCANNING_PLACEHOLDER: &str = "Escaneando Workshop...";
pub const EMPTY_PLACEHOLDER: &str = "No se encontraron mods.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCard {
    pub entry: ModEntry,
    pub selected: bool,
}

/// Cards in discovery order plus the pending-scan placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModGrid {
    cards: Vec<GridCard>,
    placeholder: Option<String>,
    reported_total: Option<usize>,
}

impl ModGrid {
    pub fn pending() -> Self {
        Self {
            cards: Vec::new(),
            placeholder: Some(SCANNING_PLACEHOLDER.to_string()),
            reported_total: None,
        }
    }

    pub fn cards(&self) -> &[GridCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// Count carried by `scan-completed`, once it has arrived.
    pub fn reported_total(&self) -> Option<usize> {
        self.reported_total
    }

    pub fn contains(&self, id: &ModId) -> bool {
        self.cards.iter().any(|card| &card.entry.id == id)
    }

    pub fn selected_cards(&self) -> impl Iterator<Item = &GridCard> {
        self.cards.iter().filter(|card| card.selected)
    }

    pub(crate) fn push(&mut self, entry: ModEntry, selected: bool) {
        self.placeholder = None;
        self.cards.push(GridCard { entry, selected });
    }

    fn complete(&mut self, count: usize) {
        self.reported_total = Some(count);
        if self.placeholder.is_some() {
            self.placeholder = (count == 0).then(|| EMPTY_PLACEHOLDER.to_string());
        }
    }

    /// Marks every card carrying `id`; duplicates share one selection state.
    pub(crate) fn set_selected(&mut self, id: &ModId, selected: bool) {
        for card in self.cards.iter_mut().filter(|card| &card.entry.id == id) {
            card.selected = selected;
        }
    }

    pub(crate) fn clear_selection(&mut self) {
        for card in &mut self.cards {
            card.selected = false;
        }
    }
}

pub fn scan_status(count: usize) -> String {
    format!("Escaneo completado. {count} mods encontrados.")
}

/// Applies one discovery event to the grid and status line.
pub(crate) fn ingest(state: &mut SessionState, event: HostEvent) {
    match event {
        HostEvent::ModFound(entry) => {
            debug!(id = %entry.id, title = entry.display_title(), "mod found");
            let selected = state.selection.contains(&entry.id);
            state.view.grid.push(entry, selected);
        }
        HostEvent::ScanCompleted(count) => {
            let shown = state.view.grid.len();
            if shown != count {
                debug!(count, shown, "scan completed before all cards were ingested");
            }
            info!(count, "scan completed");
            state.view.grid.complete(count);
            state.view.status.text = scan_status(count);
        }
    }
}

/// Resets the grid, subscribes to discovery events and asks the backend to
/// scan. Returns the ingestion task when the event channel is available.
pub(crate) async fn start_ingestion(
    state: SharedState,
    events: &dyn EventChannel,
    bridge: &dyn HostBridge,
) -> Option<JoinHandle<()>> {
    {
        let mut guard = state.lock().await;
        guard.selection.clear();
        let summary = guard.selection.summary();
        guard.view.apply_selection_summary(summary);
        guard.view.grid = ModGrid::pending();
    }

    let ingestion = match events.subscribe() {
        Ok(mut subscription) => {
            debug!(subscription = subscription.id(), "listening for scan events");
            let state = state.clone();
            Some(tokio::spawn(async move {
                while let Some(event) = subscription.next().await {
                    let mut guard = state.lock().await;
                    ingest(&mut guard, event);
                }
                debug!("scan event channel closed");
            }))
        }
        Err(err) => {
            let failure = FlowError::ConfigurationUnavailable(err.to_string());
            error!(error = %failure, "event system not found; grid will not populate");
            None
        }
    };

    info!("requesting mod scan");
    if let Err(error) = bridge.start_scan().await {
        let message = format!("{error:#}");
        warn!(error = %message, "start-scan request failed");
        state.lock().await.view.status.text = format!("Error: {message}");
    }

    ingestion
}

#[cfg(test)]
#[path = "tests/scan_tests.rs"]
mod tests;
