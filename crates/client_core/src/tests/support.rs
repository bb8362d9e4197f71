//! Test doubles for the host boundaries.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex as StdMutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use host_bridge::{HostBridge, LocalEventChannel, ProcessControl, ProgressSender, Updater};
use shared::{
    domain::{ModEntry, ModId},
    protocol::{DownloadEvent, HostEvent, MergeResult, UpdateCheck},
};
use tokio::time;

use crate::{
    config::SessionSettings,
    session::{SessionState, SharedState},
};

pub fn shared_state() -> SharedState {
    Arc::new(tokio::sync::Mutex::new(SessionState::default()))
}

pub fn settings() -> SessionSettings {
    SessionSettings {
        hints_path: "/nonexistent/tips.json".into(),
        ..SessionSettings::default()
    }
}

pub fn entries(ids: &[&str]) -> Vec<ModEntry> {
    ids.iter()
        .map(|id| ModEntry::new(*id).with_title(format!("Mod {id}")))
        .collect()
}

/// Backend double: records merge calls and, on `start_scan`, replays a
/// catalog onto the event channel.
pub struct RecordingBridge {
    reply: StdMutex<Result<MergeResult, String>>,
    merge_delay: Duration,
    catalog: Vec<ModEntry>,
    events: Option<LocalEventChannel>,
    scan_error: Option<String>,
    merges: StdMutex<Vec<Vec<ModId>>>,
    scans: AtomicUsize,
}

impl RecordingBridge {
    pub fn replying(reply: MergeResult) -> Self {
        Self {
            reply: StdMutex::new(Ok(reply)),
            merge_delay: Duration::from_millis(1200),
            catalog: Vec::new(),
            events: None,
            scan_error: None,
            merges: StdMutex::new(Vec::new()),
            scans: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(error: impl Into<String>) -> Self {
        let bridge = Self::replying(MergeResult::ok(""));
        *bridge.reply.lock().expect("reply") = Err(error.into());
        bridge
    }

    pub fn with_catalog(mut self, events: LocalEventChannel, catalog: Vec<ModEntry>) -> Self {
        self.events = Some(events);
        self.catalog = catalog;
        self
    }

    pub fn with_scan_error(mut self, error: impl Into<String>) -> Self {
        self.scan_error = Some(error.into());
        self
    }

    pub fn set_reply(&self, reply: Result<MergeResult, String>) {
        *self.reply.lock().expect("reply") = reply;
    }

    pub fn merges(&self) -> Vec<Vec<ModId>> {
        self.merges.lock().expect("merges").clone()
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostBridge for RecordingBridge {
    async fn start_scan(&self) -> Result<()> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.scan_error {
            return Err(anyhow!(error.clone()));
        }
        if let Some(events) = &self.events {
            for entry in &self.catalog {
                events.emit(HostEvent::ModFound(entry.clone()));
            }
            events.emit(HostEvent::ScanCompleted(self.catalog.len()));
        }
        Ok(())
    }

    async fn merge_mods(&self, ids: &[ModId]) -> Result<MergeResult> {
        self.merges.lock().expect("merges").push(ids.to_vec());
        time::sleep(self.merge_delay).await;
        self.reply.lock().expect("reply").clone().map_err(|error| anyhow!(error))
    }
}

/// Updater double with a scripted check result and download stream.
pub struct ScriptedUpdater {
    check: Result<UpdateCheck, String>,
    events: Vec<DownloadEvent>,
    download_error: Option<String>,
    checks: AtomicUsize,
    downloads: AtomicUsize,
}

impl ScriptedUpdater {
    pub fn offering(version: &str, body: Option<&str>) -> Self {
        Self {
            check: Ok(UpdateCheck::available(version, body.map(str::to_string))),
            events: vec![
                DownloadEvent::Started {
                    content_length: Some(1000),
                },
                DownloadEvent::Progress { chunk_length: 250 },
                DownloadEvent::Progress { chunk_length: 250 },
                DownloadEvent::Progress { chunk_length: 500 },
                DownloadEvent::Finished,
            ],
            download_error: None,
            checks: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn up_to_date() -> Self {
        Self {
            check: Ok(UpdateCheck::none()),
            ..Self::offering("0.0.0", None)
        }
    }

    pub fn failing_check(error: &str) -> Self {
        Self {
            check: Err(error.to_string()),
            ..Self::offering("0.0.0", None)
        }
    }

    pub fn with_events(mut self, events: Vec<DownloadEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_download_error(mut self, error: &str) -> Self {
        self.download_error = Some(error.to_string());
        self
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Updater for ScriptedUpdater {
    async fn check(&self) -> Result<UpdateCheck> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.check.clone().map_err(|error| anyhow!(error))
    }

    async fn download_and_install(&self, progress: ProgressSender) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        for event in &self.events {
            time::sleep(Duration::from_millis(10)).await;
            let _ = progress.send(event.clone());
        }
        match &self.download_error {
            Some(error) => Err(anyhow!(error.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct RecordingProcess {
    fail_with: Option<String>,
    exits: StdMutex<Vec<i32>>,
}

impl RecordingProcess {
    pub fn failing(error: &str) -> Self {
        Self {
            fail_with: Some(error.to_string()),
            exits: StdMutex::new(Vec::new()),
        }
    }

    pub fn exits(&self) -> Vec<i32> {
        self.exits.lock().expect("exits").clone()
    }
}

#[async_trait]
impl ProcessControl for RecordingProcess {
    async fn exit(&self, code: i32) -> Result<()> {
        self.exits.lock().expect("exits").push(code);
        match &self.fail_with {
            Some(error) => Err(anyhow!(error.clone())),
            None => Ok(()),
        }
    }
}
