//! Presentation model the UI renders. Every flow mutates it under the
//! session lock; a renderer only reads snapshots.

use crate::{scan::ModGrid, selection::SelectionSummary};

pub const SUCCESS_TITLE: &str = "PROCESO COMPLETADO";
pub const ERROR_TITLE: &str = "ERROR CRÍTICO";
pub const FATAL_TITLE: &str = "Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Neutral,
    Active,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
}

impl StatusLine {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: SUCCESS_TITLE.to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: ERROR_TITLE.to_string(),
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: FATAL_TITLE.to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// Sounds the UI should play; playback is the renderer's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Click,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadingOverlay {
    pub visible: bool,
    pub percent: u8,
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpdateOverlay {
    #[default]
    Hidden,
    Question {
        version: String,
        notes: String,
    },
    Download {
        percent: u8,
        status: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub grid: ModGrid,
    pub status: StatusLine,
    pub fusion_button: ActionButton,
    pub loading: LoadingOverlay,
    pub update: UpdateOverlay,
    pub notice: Option<Notice>,
    cues: Vec<Cue>,
}

impl Default for ViewState {
    fn default() -> Self {
        let mut view = Self {
            grid: ModGrid::default(),
            status: StatusLine::default(),
            fusion_button: ActionButton {
                label: String::new(),
                enabled: true,
            },
            loading: LoadingOverlay::default(),
            update: UpdateOverlay::Hidden,
            notice: None,
            cues: Vec::new(),
        };
        view.apply_selection_summary(SelectionSummary::empty());
        view
    }
}

impl ViewState {
    pub fn apply_selection_summary(&mut self, summary: SelectionSummary) {
        self.fusion_button.label = summary.action_label;
        self.status = summary.status;
    }

    /// Any overlay currently suspends grid interaction.
    pub fn is_blocked(&self) -> bool {
        self.loading.visible || self.update != UpdateOverlay::Hidden || self.notice.is_some()
    }

    pub fn show_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn play(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    pub fn pending_cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn take_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }
}
