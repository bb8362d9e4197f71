//! Boundaries between the client orchestration layer and the backend
//! process: request/response operations and the push-event channel.

use async_trait::async_trait;
use shared::{
    domain::ModId,
    protocol::{DownloadEvent, MergeResult, UpdateCheck},
};
use thiserror::Error;
use tokio::sync::mpsc;

mod events;
pub use events::{EventChannel, LocalEventChannel, MissingEventChannel, Subscription};

/// Sink for download progress. Implementations drop it once the download
/// future resolves.
pub type ProgressSender = mpsc::UnboundedSender<DownloadEvent>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{capability} is unavailable")]
    Unavailable { capability: &'static str },
}

#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Fire-and-forget: results arrive later on the event channel.
    async fn start_scan(&self) -> anyhow::Result<()>;
    async fn merge_mods(&self, ids: &[ModId]) -> anyhow::Result<MergeResult>;
}

pub struct MissingHostBridge;

#[async_trait]
impl HostBridge for MissingHostBridge {
    async fn start_scan(&self) -> anyhow::Result<()> {
        Err(BridgeError::Unavailable {
            capability: "host bridge",
        }
        .into())
    }

    async fn merge_mods(&self, _ids: &[ModId]) -> anyhow::Result<MergeResult> {
        Err(BridgeError::Unavailable {
            capability: "host bridge",
        }
        .into())
    }
}

#[async_trait]
pub trait Updater: Send + Sync {
    async fn check(&self) -> anyhow::Result<UpdateCheck>;
    async fn download_and_install(&self, progress: ProgressSender) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ProcessControl: Send + Sync {
    async fn exit(&self, code: i32) -> anyhow::Result<()>;
}

pub struct MissingProcessControl;

#[async_trait]
impl ProcessControl for MissingProcessControl {
    async fn exit(&self, _code: i32) -> anyhow::Result<()> {
        Err(BridgeError::Unavailable {
            capability: "process control",
        }
        .into())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
