use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::ModEntry, error::EventDecodeError};

pub const MOD_FOUND_EVENT: &str = "mod-found";
pub const SCAN_COMPLETED_EVENT: &str = "scan-completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    Ok,
    Error,
}

/// Response of the backend `merge` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub status: MergeStatus,
    pub msg: String,
}

impl MergeResult {
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            status: MergeStatus::Ok,
            msg: msg.into(),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: MergeStatus::Error,
            msg: msg.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == MergeStatus::Ok
    }
}

/// Response of the updater `check` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCheck {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl UpdateCheck {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn available(version: impl Into<String>, body: Option<String>) -> Self {
        Self {
            available: true,
            version: Some(version.into()),
            body,
        }
    }
}

/// Progress sub-events emitted while an update downloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum DownloadEvent {
    Started {
        #[serde(rename = "contentLength", default, skip_serializing_if = "Option::is_none")]
        content_length: Option<u64>,
    },
    Progress {
        #[serde(rename = "chunkLength", default)]
        chunk_length: u64,
    },
    Finished,
}

/// Push notifications delivered by the host event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    ModFound(ModEntry),
    ScanCompleted(usize),
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModFound(_) => MOD_FOUND_EVENT,
            Self::ScanCompleted(_) => SCAN_COMPLETED_EVENT,
        }
    }

    /// Decodes a raw `(name, payload)` pair. Unknown names yield `Ok(None)`.
    pub fn decode(name: &str, payload: Value) -> Result<Option<Self>, EventDecodeError> {
        let event = match name {
            MOD_FOUND_EVENT => serde_json::from_value(payload).map(Self::ModFound),
            SCAN_COMPLETED_EVENT => serde_json::from_value(payload).map(Self::ScanCompleted),
            _ => return Ok(None),
        };
        event
            .map(Some)
            .map_err(|source| EventDecodeError::new(name, source))
    }

    pub fn payload(&self) -> Value {
        match self {
            Self::ModFound(entry) => serde_json::to_value(entry).unwrap_or(Value::Null),
            Self::ScanCompleted(count) => Value::from(*count),
        }
    }
}
