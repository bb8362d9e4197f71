//! Application self-update: check, confirm, download with progress,
//! install, restart.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use host_bridge::{ProcessControl, Updater};
use shared::protocol::{DownloadEvent, UpdateCheck};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time,
};
use tracing::{debug, error, info, warn};

use crate::{error::FlowError, session::SharedState, view::UpdateOverlay};

pub const DEFAULT_RELEASE_NOTES: &str = "Mejoras y correcciones.";
pub const DOWNLOADING_STATUS: &str = "Descargando actualización...";
pub const INSTALLING_STATUS: &str = "Instalando... la app se reiniciará";
/// Percent shown while the download size is unknown.
pub const DOWNLOAD_PERCENT_FLOOR: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub version: String,
    pub release_notes: String,
}

impl UpdateInfo {
    pub fn from_check(check: UpdateCheck) -> Option<Self> {
        if !check.available {
            return None;
        }
        Some(Self {
            version: check.version.unwrap_or_default(),
            release_notes: check
                .body
                .filter(|body| !body.is_empty())
                .unwrap_or_else(|| DEFAULT_RELEASE_NOTES.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    total_bytes: u64,
    downloaded_bytes: u64,
}

impl DownloadProgress {
    /// `None` or zero means the size is unknown.
    pub fn start(&mut self, content_length: Option<u64>) {
        self.total_bytes = content_length.unwrap_or(0);
    }

    pub fn advance(&mut self, chunk_length: u64) {
        self.downloaded_bytes = self.downloaded_bytes.saturating_add(chunk_length);
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded_bytes
    }

    /// Rounded percent, capped at 100; `None` until the total is known.
    pub fn percent(&self) -> Option<u8> {
        if self.total_bytes == 0 {
            return None;
        }
        let total = u128::from(self.total_bytes);
        let rounded = (u128::from(self.downloaded_bytes) * 200 + total) / (2 * total);
        Some(rounded.min(100) as u8)
    }

    pub fn display_percent(&self) -> u8 {
        self.percent().unwrap_or(DOWNLOAD_PERCENT_FLOOR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    Checking,
    AwaitingUserDecision,
    Downloading,
    Installing,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    Accept,
    Later,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No updater capability in this session.
    Unavailable,
    /// Another run is already past `Idle`.
    Busy,
    UpToDate,
    Declined,
    /// Exit was requested; the process is going away.
    Restarting,
    Failed(String),
    ExitFailed(String),
}

/// Surface that asks the user whether to install an update.
#[async_trait]
pub trait UpdatePrompt: Send + Sync {
    async fn decide(&self, info: &UpdateInfo) -> Result<UpdateDecision>;
}

/// Prompt answered through a [`PromptHandle`], typically wired to the
/// "update now" / "later" buttons.
pub struct ChannelPrompt {
    decisions: Mutex<mpsc::Receiver<UpdateDecision>>,
}

#[derive(Clone)]
pub struct PromptHandle {
    decisions: mpsc::Sender<UpdateDecision>,
}

impl ChannelPrompt {
    pub fn new() -> (Self, PromptHandle) {
        let (tx, rx) = mpsc::channel(1);
        (
            Self {
                decisions: Mutex::new(rx),
            },
            PromptHandle { decisions: tx },
        )
    }
}

impl PromptHandle {
    /// Returns false when nobody can receive the answer anymore.
    pub async fn answer(&self, decision: UpdateDecision) -> bool {
        self.decisions.send(decision).await.is_ok()
    }
}

#[async_trait]
impl UpdatePrompt for ChannelPrompt {
    async fn decide(&self, info: &UpdateInfo) -> Result<UpdateDecision> {
        debug!(version = %info.version, "waiting for update decision");
        self.decisions
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| anyhow!("update prompt closed before a decision was made"))
    }
}

pub struct UpdateManager {
    updater: Option<Arc<dyn Updater>>,
    prompt: Option<Arc<dyn UpdatePrompt>>,
    process: Arc<dyn ProcessControl>,
    state: SharedState,
    phase: Mutex<UpdatePhase>,
    install_restart_delay: Duration,
}

impl UpdateManager {
    pub fn new(
        updater: Option<Arc<dyn Updater>>,
        prompt: Option<Arc<dyn UpdatePrompt>>,
        process: Arc<dyn ProcessControl>,
        state: SharedState,
        install_restart_delay: Duration,
    ) -> Self {
        Self {
            updater,
            prompt,
            process,
            state,
            phase: Mutex::new(UpdatePhase::Idle),
            install_restart_delay,
        }
    }

    pub async fn phase(&self) -> UpdatePhase {
        *self.phase.lock().await
    }

    /// Runs the protocol once after `delay`, without blocking the caller.
    pub fn schedule(self: &Arc<Self>, delay: Duration) -> JoinHandle<UpdateOutcome> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            time::sleep(delay).await;
            manager.run().await
        })
    }

    pub async fn run(&self) -> UpdateOutcome {
        let Some(updater) = self.updater.clone() else {
            let failure = FlowError::ConfigurationUnavailable("updater plugin".to_string());
            info!(reason = %failure, "skipping update check");
            return UpdateOutcome::Unavailable;
        };

        {
            let mut phase = self.phase.lock().await;
            if *phase != UpdatePhase::Idle {
                debug!(phase = ?*phase, "update flow already in progress");
                return UpdateOutcome::Busy;
            }
            *phase = UpdatePhase::Checking;
        }

        let outcome = match self.drive(updater.as_ref()).await {
            Ok(outcome) => outcome,
            Err(error) => {
                let message = format!("{error:#}");
                error!(error = %message, "update check failed");
                self.state.lock().await.view.update = UpdateOverlay::Hidden;
                UpdateOutcome::Failed(message)
            }
        };

        if matches!(
            outcome,
            UpdateOutcome::UpToDate | UpdateOutcome::Declined | UpdateOutcome::Failed(_)
        ) {
            self.set_phase(UpdatePhase::Idle).await;
        }
        outcome
    }

    async fn drive(&self, updater: &dyn Updater) -> Result<UpdateOutcome> {
        info!("checking for updates");
        let check = updater.check().await.context("update check")?;
        let Some(info) = UpdateInfo::from_check(check) else {
            info!("no updates available");
            return Ok(UpdateOutcome::UpToDate);
        };
        info!(version = %info.version, "update available");

        self.set_phase(UpdatePhase::AwaitingUserDecision).await;
        if self.await_decision(&info).await? == UpdateDecision::Later {
            info!(version = %info.version, "update postponed by user");
            self.state.lock().await.view.update = UpdateOverlay::Hidden;
            return Ok(UpdateOutcome::Declined);
        }

        self.set_phase(UpdatePhase::Downloading).await;
        self.state.lock().await.view.update = UpdateOverlay::Download {
            percent: 0,
            status: DOWNLOADING_STATUS.to_string(),
        };
        self.download(updater).await?;

        Ok(self.install().await)
    }

    async fn await_decision(&self, info: &UpdateInfo) -> Result<UpdateDecision> {
        let Some(prompt) = &self.prompt else {
            debug!("no prompt surface; accepting update");
            return Ok(UpdateDecision::Accept);
        };
        self.state.lock().await.view.update = UpdateOverlay::Question {
            version: info.version.clone(),
            notes: info.release_notes.clone(),
        };
        prompt.decide(info).await.context("update prompt")
    }

    async fn download(&self, updater: &dyn Updater) -> Result<()> {
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let download = updater.download_and_install(progress_tx);
        tokio::pin!(download);

        let mut progress = DownloadProgress::default();
        let mut finished = false;
        let mut result = None;
        loop {
            tokio::select! {
                biased;
                event = progress_rx.recv() => match event {
                    Some(event) => finished |= self.apply_download_event(&mut progress, event).await,
                    None => break,
                },
                res = &mut download, if result.is_none() => result = Some(res),
            }
        }
        let result = match result {
            Some(result) => result,
            None => download.await,
        };
        result.context("update download")?;

        if !finished {
            warn!("download resolved without a Finished event; installing anyway");
        }
        Ok(())
    }

    /// Returns true once the download reports it has finished.
    async fn apply_download_event(
        &self,
        progress: &mut DownloadProgress,
        event: DownloadEvent,
    ) -> bool {
        match event {
            DownloadEvent::Started { content_length } => {
                progress.start(content_length);
                info!(total_bytes = progress.total_bytes(), "download started");
                false
            }
            DownloadEvent::Progress { chunk_length } => {
                progress.advance(chunk_length);
                let percent = progress.display_percent();
                if let UpdateOverlay::Download { percent: shown, .. } =
                    &mut self.state.lock().await.view.update
                {
                    *shown = percent;
                }
                false
            }
            DownloadEvent::Finished => {
                info!(
                    downloaded_bytes = progress.downloaded_bytes(),
                    "download finished, installing"
                );
                self.show_installing().await;
                true
            }
        }
    }

    async fn show_installing(&self) {
        self.set_phase(UpdatePhase::Installing).await;
        self.state.lock().await.view.update = UpdateOverlay::Download {
            percent: 100,
            status: INSTALLING_STATUS.to_string(),
        };
    }

    async fn install(&self) -> UpdateOutcome {
        if self.phase().await != UpdatePhase::Installing {
            self.show_installing().await;
        }
        time::sleep(self.install_restart_delay).await;

        self.set_phase(UpdatePhase::Exiting).await;
        info!("requesting process exit for update restart");
        match self.process.exit(0).await {
            Ok(()) => UpdateOutcome::Restarting,
            Err(error) => {
                let failure = FlowError::FatalFlow(format!("EXIT FAILED: {error:#}"));
                error!(error = %failure, "could not exit for update restart");
                if let Some(notice) = failure.notice() {
                    self.state.lock().await.view.show_notice(notice);
                }
                UpdateOutcome::ExitFailed(failure.to_string())
            }
        }
    }

    async fn set_phase(&self, next: UpdatePhase) {
        let mut phase = self.phase.lock().await;
        debug!(from = ?*phase, to = ?next, "update phase");
        *phase = next;
    }
}

#[cfg(test)]
#[path = "tests/update_tests.rs"]
mod tests;
