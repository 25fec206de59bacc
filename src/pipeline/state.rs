//! Pipeline state machine and per-run context.
//!
//! [`PipelineState`] tracks where a single run is.  [`RunOutput`] is the
//! explicit per-run context threaded through the stages: every run starts
//! from a fresh one, and nothing survives from one run to the next.

use std::sync::Arc;

use crate::catalog::{Language, Voice};
use crate::image_input::InputImage;
use crate::speech::AudioArtifact;
use crate::translate::TranslatedStory;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The four transformation stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Captioning,
    StoryGenerating,
    Translating,
    Synthesizing,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Captioning => "Captioning",
            Stage::StoryGenerating => "Writing story",
            Stage::Translating => "Translating",
            Stage::Synthesizing => "Synthesizing speech",
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// States of a single run.
///
/// ```text
/// Idle ─▶ Captioning ─▶ StoryGenerating ─▶ Translating ─▶ Synthesizing ─▶ Done
///              │               │                 │               │
///              └───────────────┴────── error ────┴───────────────┴─▶ Failed
/// ```
///
/// `Done` and `Failed` are terminal; the next run starts again at `Idle`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Captioning,
    StoryGenerating,
    Translating,
    Synthesizing,
    Done,
    Failed { stage: Stage, reason: String },
}

impl PipelineState {
    /// State entered when `stage` begins.
    pub fn running(stage: Stage) -> Self {
        match stage {
            Stage::Captioning => PipelineState::Captioning,
            Stage::StoryGenerating => PipelineState::StoryGenerating,
            Stage::Translating => PipelineState::Translating,
            Stage::Synthesizing => PipelineState::Synthesizing,
        }
    }

    /// Returns `true` while a stage is executing.
    ///
    /// ```
    /// use image_story::pipeline::PipelineState;
    ///
    /// assert!(!PipelineState::Idle.is_busy());
    /// assert!(PipelineState::Captioning.is_busy());
    /// assert!(PipelineState::Synthesizing.is_busy());
    /// assert!(!PipelineState::Done.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        self.stage().is_some()
    }

    /// `true` for `Done` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed { .. })
    }

    /// The stage currently executing, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Captioning => Some(Stage::Captioning),
            PipelineState::StoryGenerating => Some(Stage::StoryGenerating),
            PipelineState::Translating => Some(Stage::Translating),
            PipelineState::Synthesizing => Some(Stage::Synthesizing),
            _ => None,
        }
    }

    /// A short human-readable label suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Done => "Done",
            PipelineState::Failed { .. } => "Failed",
            running => running.stage().map(Stage::label).unwrap_or("Idle"),
        }
    }
}

// ---------------------------------------------------------------------------
// RunRequest / RunOutput
// ---------------------------------------------------------------------------

/// Everything the user chose for one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub image: Arc<InputImage>,
    pub language: Language,
    pub voice: Voice,
}

/// Artifacts produced by one run.
///
/// A run that stops at stage N leaves the fields for later stages `None`.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub state: PipelineState,
    pub caption: Option<String>,
    pub story: Option<String>,
    pub translation: Option<TranslatedStory>,
    pub audio: Option<AudioArtifact>,
}

impl RunOutput {
    /// The translated story, but only when it differs from the native draft.
    pub fn foreign_translation(&self) -> Option<&TranslatedStory> {
        self.translation
            .as_ref()
            .filter(|t| !t.language.is_native())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
