//! Client-side orchestration for browsing discovered mods, fusing a
//! selection through the backend, and self-updating the application.

pub mod config;
pub mod error;
pub mod fusion;
pub mod hints;
pub mod overlay;
pub mod scan;
pub mod selection;
pub mod session;
pub mod update;
pub mod view;

pub use config::{load_settings, SessionSettings};
pub use error::FlowError;
pub use fusion::FusionOutcome;
pub use hints::HintDeck;
pub use scan::{GridCard, ModGrid};
pub use selection::SelectionState;
pub use session::{Session, SessionDeps};
pub use update::{
    ChannelPrompt, PromptHandle, UpdateDecision, UpdateInfo, UpdateOutcome, UpdatePhase,
    UpdatePrompt,
};
pub use view::{Cue, Notice, NoticeKind, ViewState};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
