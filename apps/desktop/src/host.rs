//! Scripted stand-in for the backend process: replays a catalog as
//! discovery events and answers merge, update and exit requests.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use host_bridge::{HostBridge, LocalEventChannel, ProcessControl, ProgressSender, Updater};
use shared::{
    domain::{ModEntry, ModId},
    protocol::{DownloadEvent, HostEvent, MergeResult, UpdateCheck},
};
use tracing::{info, warn};

const DOWNLOAD_SIZE: u64 = 4 * 1024 * 1024;
const DOWNLOAD_CHUNK: u64 = 512 * 1024;

pub struct ScriptedHost {
    events: LocalEventChannel,
    catalog: Vec<ModEntry>,
    merge_error: Option<String>,
    offered_version: Option<String>,
}

impl ScriptedHost {
    pub fn new(events: LocalEventChannel, catalog: Vec<ModEntry>) -> Self {
        Self {
            events,
            catalog,
            merge_error: None,
            offered_version: None,
        }
    }

    pub fn failing_merges(mut self, message: Option<String>) -> Self {
        self.merge_error = message;
        self
    }

    pub fn offering_update(mut self, version: Option<String>) -> Self {
        self.offered_version = version;
        self
    }
}

#[async_trait]
impl HostBridge for ScriptedHost {
    async fn start_scan(&self) -> Result<()> {
        let found = self.catalog.iter().cloned().map(HostEvent::ModFound);
        for event in found.chain([HostEvent::ScanCompleted(self.catalog.len())]) {
            // Round-trip through the wire form the real backend emits.
            let reached = self.events.emit_named(event.name(), event.payload());
            if reached == 0 {
                warn!(event = event.name(), "no listener for host event");
            }
        }
        Ok(())
    }

    async fn merge_mods(&self, ids: &[ModId]) -> Result<MergeResult> {
        info!(count = ids.len(), "merging mods");
        tokio::time::sleep(Duration::from_millis(800)).await;
        Ok(match &self.merge_error {
            Some(message) => MergeResult::error(message.clone()),
            None => MergeResult::ok(format!("{} mods fusionados en pak01_dir.vpk", ids.len())),
        })
    }
}

#[async_trait]
impl Updater for ScriptedHost {
    async fn check(&self) -> Result<UpdateCheck> {
        Ok(match &self.offered_version {
            Some(version) => UpdateCheck::available(version.clone(), None),
            None => UpdateCheck::none(),
        })
    }

    async fn download_and_install(&self, progress: ProgressSender) -> Result<()> {
        let _ = progress.send(DownloadEvent::Started {
            content_length: Some(DOWNLOAD_SIZE),
        });
        let mut sent = 0;
        while sent < DOWNLOAD_SIZE {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let chunk_length = DOWNLOAD_CHUNK.min(DOWNLOAD_SIZE - sent);
            sent += chunk_length;
            let _ = progress.send(DownloadEvent::Progress { chunk_length });
        }
        let _ = progress.send(DownloadEvent::Finished);
        Ok(())
    }
}

#[async_trait]
impl ProcessControl for ScriptedHost {
    async fn exit(&self, code: i32) -> Result<()> {
        info!(code, "restart requested; leaving process running in headless mode");
        Ok(())
    }
}
