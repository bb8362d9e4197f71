//! Failure taxonomy shared by the update and fusion flows.

use thiserror::Error;

use crate::view::Notice;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// An expected host capability is missing. Logged, never shown.
    #[error("{0} is unavailable")]
    ConfigurationUnavailable(String),
    /// Well-formed negative result carrying the backend's own message.
    #[error("{0}")]
    BackendReported(String),
    /// The request mechanism itself failed.
    #[error("{0}")]
    Transport(String),
    /// Failure while terminating for an update restart.
    #[error("{0}")]
    FatalFlow(String),
}

impl FlowError {
    pub fn transport(error: &anyhow::Error) -> Self {
        Self::Transport(format!("{error:#}"))
    }

    /// The error-styled notice for this failure, if it reaches the user.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::ConfigurationUnavailable(_) => None,
            Self::BackendReported(message) | Self::Transport(message) => {
                Some(Notice::error(message.clone()))
            }
            Self::FatalFlow(message) => Some(Notice::fatal(message.clone())),
        }
    }
}
