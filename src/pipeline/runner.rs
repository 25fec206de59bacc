//! Pipeline orchestrator — drives caption → story → translation → speech.
//!
//! [`StoryPipeline`] owns one handle per capability provider and executes a
//! run whenever a [`PipelineCommand::Run`] arrives over a
//! `tokio::sync::mpsc` channel.
//!
//! # Run flow
//!
//! ```text
//! PipelineCommand::Run(request)
//!   └─▶ captioner.caption(image)                     [Captioning]
//!         └─▶ generator.generate(prompt, max_tokens)   [StoryGenerating]
//!               └─▶ native?  → identity                [Translating]
//!                   foreign? → translator.translate
//!                     └─▶ speech.synthesize → temp MP3 [Synthesizing]
//!                           └─▶ Finished               [Done]
//! any error ─▶ Failed { stage, message }               [Failed]
//! ```
//!
//! Runs are strictly sequential: a command that arrives mid-run waits in the
//! channel.  There is no retry and no cancellation.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::caption::{CaptionError, Captioner};
use crate::catalog::{Language, Voice};
use crate::image_input::InputImage;
use crate::speech::{AudioArtifact, SpeechError, SpeechSynthesizer};
use crate::story::{build_story_prompt, enforce_budget, GenerationError, StoryGenerator};
use crate::translate::{TranslatedStory, TranslationError, Translator};

use super::state::{PipelineState, RunOutput, RunRequest, Stage};

/// Shown when the captioning provider fails.
pub const CAPTION_FAILED_MESSAGE: &str =
    "Failed to caption the image. Please check the captioning service.";

/// Shown when the generation provider fails.
pub const STORY_FAILED_MESSAGE: &str =
    "Failed to generate a story. Please check your model setup.";

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// A stage failure.  Every variant halts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("captioning failed: {0}")]
    Captioning(#[source] CaptionError),

    #[error("story generation failed: {0}")]
    Generation(#[source] GenerationError),

    #[error("translation failed: {0}")]
    Translation(#[source] TranslationError),

    #[error("speech synthesis failed: {0}")]
    Synthesis(#[source] SpeechError),
}

impl PipelineError {
    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Captioning(_) => Stage::Captioning,
            PipelineError::Generation(_) => Stage::StoryGenerating,
            PipelineError::Translation(_) => Stage::Translating,
            PipelineError::Synthesis(_) => Stage::Synthesizing,
        }
    }

    /// Captioning and generation failures have dedicated user-facing
    /// messages; translation and synthesis failures are reported generically.
    pub fn is_guarded(&self) -> bool {
        matches!(
            self,
            PipelineError::Captioning(_) | PipelineError::Generation(_)
        )
    }

    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Captioning(_) => CAPTION_FAILED_MESSAGE.to_string(),
            PipelineError::Generation(_) => STORY_FAILED_MESSAGE.to_string(),
            other => format!("Unexpected error: {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands / events
// ---------------------------------------------------------------------------

/// Commands sent from the UI thread to the orchestrator.
#[derive(Debug, Clone)]
pub enum PipelineCommand {
    /// Start a fresh run.
    Run(RunRequest),
}

/// Progress delivered from the orchestrator to the UI, in order.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StageStarted(Stage),
    CaptionReady(String),
    StoryReady(String),
    TranslationReady(TranslatedStory),
    AudioReady(AudioArtifact),
    /// The run reached `Done`.
    Finished,
    /// The run stopped at `stage`; no later artifacts will follow.
    Failed {
        stage: Stage,
        message: String,
        guarded: bool,
    },
}

// ---------------------------------------------------------------------------
// StoryPipeline
// ---------------------------------------------------------------------------

/// Sequences the four stages over shared, read-only provider handles.
pub struct StoryPipeline {
    captioner: Arc<dyn Captioner>,
    generator: Arc<dyn StoryGenerator>,
    translator: Arc<dyn Translator>,
    speech: Arc<dyn SpeechSynthesizer>,
    max_tokens: u32,
    audio_dir: PathBuf,
}

impl StoryPipeline {
    /// Create a new orchestrator.
    ///
    /// * `max_tokens` — story budget handed to the generator.
    /// * `audio_dir`  — where per-run MP3 files are written.
    pub fn new(
        captioner: Arc<dyn Captioner>,
        generator: Arc<dyn StoryGenerator>,
        translator: Arc<dyn Translator>,
        speech: Arc<dyn SpeechSynthesizer>,
        max_tokens: u32,
        audio_dir: PathBuf,
    ) -> Self {
        Self {
            captioner,
            generator,
            translator,
            speech,
            max_tokens,
            audio_dir,
        }
    }

    // -----------------------------------------------------------------------
    // Command loop
    // -----------------------------------------------------------------------

    /// Execute runs until `commands` is closed.
    pub async fn serve(
        self,
        mut commands: mpsc::Receiver<PipelineCommand>,
        events: mpsc::Sender<PipelineEvent>,
    ) {
        while let Some(cmd) = commands.recv().await {
            match cmd {
                PipelineCommand::Run(request) => {
                    self.run(request, &events).await;
                }
            }
        }

        log::info!("pipeline: command channel closed, orchestrator shutting down");
    }

    /// Execute one full run, reporting progress on `events`.
    pub async fn run(&self, request: RunRequest, events: &mpsc::Sender<PipelineEvent>) -> RunOutput {
        log::info!(
            "pipeline: run started ({}, {}, {})",
            request.image.name(),
            request.language.code(),
            request.voice.label()
        );

        let mut out = RunOutput::default();

        match self.run_stages(&request, &mut out, events).await {
            Ok(()) => {
                out.state = PipelineState::Done;
                log::info!("pipeline: run finished");
                let _ = events.send(PipelineEvent::Finished).await;
            }
            Err(e) => {
                let stage = e.stage();
                log::error!("pipeline error at {}: {e}", stage.label());
                out.state = PipelineState::Failed {
                    stage,
                    reason: e.to_string(),
                };
                let _ = events
                    .send(PipelineEvent::Failed {
                        stage,
                        message: e.user_message(),
                        guarded: e.is_guarded(),
                    })
                    .await;
            }
        }

        out
    }

    async fn run_stages(
        &self,
        request: &RunRequest,
        out: &mut RunOutput,
        events: &mpsc::Sender<PipelineEvent>,
    ) -> Result<(), PipelineError> {
        // ── 1. Caption ───────────────────────────────────────────────────
        self.enter(Stage::Captioning, out, events).await;
        let caption = self.caption(&request.image).await?;
        out.caption = Some(caption.clone());
        let _ = events.send(PipelineEvent::CaptionReady(caption.clone())).await;

        // ── 2. Story ─────────────────────────────────────────────────────
        self.enter(Stage::StoryGenerating, out, events).await;
        let story = self.generate_story(&caption, self.max_tokens).await?;
        out.story = Some(story.clone());
        let _ = events.send(PipelineEvent::StoryReady(story.clone())).await;

        // ── 3. Translation ───────────────────────────────────────────────
        self.enter(Stage::Translating, out, events).await;
        let translated = self.translate(&story, request.language).await?;
        out.translation = Some(translated.clone());
        let _ = events
            .send(PipelineEvent::TranslationReady(translated.clone()))
            .await;

        // ── 4. Speech ────────────────────────────────────────────────────
        self.enter(Stage::Synthesizing, out, events).await;
        let audio = self
            .synthesize(&translated.text, translated.language, request.voice)
            .await?;
        out.audio = Some(audio.clone());
        let _ = events.send(PipelineEvent::AudioReady(audio)).await;

        Ok(())
    }

    async fn enter(&self, stage: Stage, out: &mut RunOutput, events: &mpsc::Sender<PipelineEvent>) {
        log::debug!("pipeline: → {}", stage.label());
        out.state = PipelineState::running(stage);
        let _ = events.send(PipelineEvent::StageStarted(stage)).await;
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    /// Describe `image` via the captioning provider.
    pub async fn caption(&self, image: &InputImage) -> Result<String, PipelineError> {
        let caption = self
            .captioner
            .caption(image)
            .await
            .map_err(PipelineError::Captioning)?;

        let caption = caption.trim();
        if caption.is_empty() {
            return Err(PipelineError::Captioning(CaptionError::EmptyResponse));
        }
        Ok(caption.to_string())
    }

    /// Expand `caption` into a story of at most `max_tokens` tokens.
    pub async fn generate_story(
        &self,
        caption: &str,
        max_tokens: u32,
    ) -> Result<String, PipelineError> {
        let prompt = build_story_prompt(caption);
        let raw = self
            .generator
            .generate(&prompt, max_tokens)
            .await
            .map_err(PipelineError::Generation)?;

        let story = enforce_budget(&raw, max_tokens);
        if story.is_empty() {
            return Err(PipelineError::Generation(GenerationError::EmptyResponse));
        }
        Ok(story)
    }

    /// Translate `story` into `target`; the native language is returned
    /// unchanged without contacting the provider.
    pub async fn translate(
        &self,
        story: &str,
        target: Language,
    ) -> Result<TranslatedStory, PipelineError> {
        if target.is_native() {
            return Ok(TranslatedStory {
                text: story.to_string(),
                language: target,
            });
        }

        let text = self
            .translator
            .translate(story, target.code())
            .await
            .map_err(PipelineError::Translation)?;

        Ok(TranslatedStory {
            text,
            language: target,
        })
    }

    /// Speak `text` and write the audio to a fresh file.
    ///
    /// `voice` is recorded on the artifact only; the speech provider takes
    /// no voice parameter.
    pub async fn synthesize(
        &self,
        text: &str,
        language: Language,
        voice: Voice,
    ) -> Result<AudioArtifact, PipelineError> {
        log::debug!(
            "pipeline: voice {} requested (not forwarded to provider)",
            voice.id()
        );

        let mp3 = self
            .speech
            .synthesize(text, language.code())
            .await
            .map_err(PipelineError::Synthesis)?;

        let dir = self.audio_dir.clone();
        tokio::task::spawn_blocking(move || AudioArtifact::write(&dir, &mp3, language, voice))
            .await
            .map_err(|e| PipelineError::Synthesis(SpeechError::Internal(e.to_string())))?
            .map_err(PipelineError::Synthesis)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::MockCaptioner;
    use crate::speech::MockSynthesizer;
    use crate::story::MockGenerator;
    use crate::translate::MockTranslator;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    const STORY: &str = "Max the dog chased the waves until the sun went down.";

    struct Harness {
        pipeline: StoryPipeline,
        captioner: Arc<MockCaptioner>,
        generator: Arc<MockGenerator>,
        translator: Arc<MockTranslator>,
        _audio_dir: TempDir,
    }

    fn harness(
        captioner: MockCaptioner,
        generator: MockGenerator,
        translator: MockTranslator,
        speech: MockSynthesizer,
    ) -> Harness {
        let audio_dir = tempfile::tempdir().unwrap();
        let captioner = Arc::new(captioner);
        let generator = Arc::new(generator);
        let translator = Arc::new(translator);

        let pipeline = StoryPipeline::new(
            captioner.clone(),
            generator.clone(),
            translator.clone(),
            Arc::new(speech),
            300,
            audio_dir.path().to_path_buf(),
        );

        Harness {
            pipeline,
            captioner,
            generator,
            translator,
            _audio_dir: audio_dir,
        }
    }

    fn happy() -> Harness {
        harness(
            MockCaptioner::ok("a dog running on a beach"),
            MockGenerator::ok(STORY),
            MockTranslator::ok(),
            MockSynthesizer::ok(),
        )
    }

    fn request(language: Language) -> RunRequest {
        RunRequest {
            image: Arc::new(InputImage::from_rgb(
                "beach.jpg",
                RgbImage::from_pixel(4, 4, Rgb([240, 220, 160])),
            )),
            language,
            voice: Voice::Female,
        }
    }

    fn drain(rx: &mut mpsc::Receiver<PipelineEvent>) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        while let Ok(e) = rx.try_recv() {
            events.push(e);
        }
        events
    }

    // -----------------------------------------------------------------------
    // Full runs
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn native_run_skips_translation() {
        let h = happy();
        let (tx, _rx) = mpsc::channel(64);

        let out = h.pipeline.run(request(Language::English), &tx).await;

        assert_eq!(out.state, PipelineState::Done);
        assert_eq!(out.caption.as_deref(), Some("a dog running on a beach"));
        assert_eq!(out.story.as_deref(), Some(STORY));
        let translation = out.translation.as_ref().unwrap();
        assert_eq!(translation.text, STORY);
        assert_eq!(translation.code(), "en");
        assert!(out.foreign_translation().is_none());
        assert_eq!(h.translator.calls(), 0);

        let audio = out.audio.as_ref().unwrap();
        assert_eq!(audio.language(), Language::English);
        assert_eq!(std::fs::read(audio.path()).unwrap(), b"ID3en");
    }

    #[tokio::test]
    async fn prompt_embeds_caption() {
        let h = happy();
        let (tx, _rx) = mpsc::channel(64);

        h.pipeline.run(request(Language::English), &tx).await;

        let prompts = h.generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("'a dog running on a beach'"));
        assert_eq!(prompts[0].1, 300);
    }

    #[tokio::test]
    async fn foreign_run_tags_translation_and_audio() {
        let h = happy();
        let (tx, _rx) = mpsc::channel(64);

        let out = h.pipeline.run(request(Language::French), &tx).await;

        assert_eq!(out.state, PipelineState::Done);
        assert_eq!(out.caption.as_deref(), Some("a dog running on a beach"));
        assert_eq!(out.story.as_deref(), Some(STORY));

        let translation = out.foreign_translation().unwrap();
        assert_eq!(translation.code(), "fr");
        assert_eq!(translation.text, format!("[fr] {STORY}"));
        assert_eq!(h.translator.calls(), 1);

        let audio = out.audio.as_ref().unwrap();
        assert_eq!(audio.language(), Language::French);
        assert_eq!(audio.voice(), Voice::Female);
        assert_eq!(std::fs::read(audio.path()).unwrap(), b"ID3fr");
    }

    #[tokio::test]
    async fn events_arrive_in_stage_order() {
        let h = happy();
        let (tx, mut rx) = mpsc::channel(64);

        h.pipeline.run(request(Language::Spanish), &tx).await;
        let events = drain(&mut rx);

        assert_eq!(events.len(), 9);
        assert!(matches!(events[0], PipelineEvent::StageStarted(Stage::Captioning)));
        assert!(matches!(events[1], PipelineEvent::CaptionReady(_)));
        assert!(matches!(events[2], PipelineEvent::StageStarted(Stage::StoryGenerating)));
        assert!(matches!(events[3], PipelineEvent::StoryReady(_)));
        assert!(matches!(events[4], PipelineEvent::StageStarted(Stage::Translating)));
        assert!(matches!(events[5], PipelineEvent::TranslationReady(ref t) if t.code() == "es"));
        assert!(matches!(events[6], PipelineEvent::StageStarted(Stage::Synthesizing)));
        assert!(matches!(events[7], PipelineEvent::AudioReady(_)));
        assert!(matches!(events[8], PipelineEvent::Finished));
    }

    // -----------------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn caption_failure_halts_before_story() {
        let h = harness(
            MockCaptioner::failing(),
            MockGenerator::ok(STORY),
            MockTranslator::ok(),
            MockSynthesizer::ok(),
        );
        let (tx, mut rx) = mpsc::channel(64);

        let out = h.pipeline.run(request(Language::French), &tx).await;

        assert!(matches!(
            out.state,
            PipelineState::Failed { stage: Stage::Captioning, .. }
        ));
        assert!(out.caption.is_none());
        assert!(out.story.is_none());
        assert!(out.translation.is_none());
        assert!(out.audio.is_none());
        assert!(h.generator.prompts().is_empty());

        let last = drain(&mut rx).pop().unwrap();
        match last {
            PipelineEvent::Failed {
                stage,
                message,
                guarded,
            } => {
                assert_eq!(stage, Stage::Captioning);
                assert_eq!(message, CAPTION_FAILED_MESSAGE);
                assert!(guarded);
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_caption_counts_as_caption_failure() {
        let h = harness(
            MockCaptioner::ok("   "),
            MockGenerator::ok(STORY),
            MockTranslator::ok(),
            MockSynthesizer::ok(),
        );
        let (tx, _rx) = mpsc::channel(64);

        let out = h.pipeline.run(request(Language::English), &tx).await;
        assert!(matches!(
            out.state,
            PipelineState::Failed { stage: Stage::Captioning, .. }
        ));
        assert!(h.generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn generation_failure_keeps_caption_only() {
        let h = harness(
            MockCaptioner::ok("a cat"),
            MockGenerator::failing(),
            MockTranslator::ok(),
            MockSynthesizer::ok(),
        );
        let (tx, mut rx) = mpsc::channel(64);

        let out = h.pipeline.run(request(Language::German), &tx).await;

        assert!(matches!(
            out.state,
            PipelineState::Failed { stage: Stage::StoryGenerating, .. }
        ));
        assert_eq!(out.caption.as_deref(), Some("a cat"));
        assert!(out.story.is_none());
        assert!(out.translation.is_none());
        assert!(out.audio.is_none());
        assert_eq!(h.translator.calls(), 0);

        let last = drain(&mut rx).pop().unwrap();
        assert!(matches!(
            last,
            PipelineEvent::Failed { ref message, guarded: true, .. } if message == STORY_FAILED_MESSAGE
        ));
    }

    #[tokio::test]
    async fn translation_failure_is_unguarded() {
        let h = harness(
            MockCaptioner::ok("a cat"),
            MockGenerator::ok(STORY),
            MockTranslator::failing(),
            MockSynthesizer::ok(),
        );
        let (tx, mut rx) = mpsc::channel(64);

        let out = h.pipeline.run(request(Language::Hindi), &tx).await;

        assert!(matches!(
            out.state,
            PipelineState::Failed { stage: Stage::Translating, .. }
        ));
        assert_eq!(out.story.as_deref(), Some(STORY));
        assert!(out.translation.is_none());
        assert!(out.audio.is_none());

        let last = drain(&mut rx).pop().unwrap();
        assert!(matches!(
            last,
            PipelineEvent::Failed { ref message, guarded: false, .. }
                if message.starts_with("Unexpected error:")
        ));
    }

    #[tokio::test]
    async fn synthesis_failure_is_unguarded() {
        let h = harness(
            MockCaptioner::ok("a cat"),
            MockGenerator::ok(STORY),
            MockTranslator::ok(),
            MockSynthesizer::failing(),
        );
        let (tx, _rx) = mpsc::channel(64);

        let out = h.pipeline.run(request(Language::Arabic), &tx).await;

        assert!(matches!(
            out.state,
            PipelineState::Failed { stage: Stage::Synthesizing, .. }
        ));
        assert!(out.translation.is_some());
        assert!(out.audio.is_none());
    }

    #[test]
    fn error_classification() {
        let cases = [
            (PipelineError::Captioning(CaptionError::Timeout), Stage::Captioning, true),
            (PipelineError::Generation(GenerationError::Timeout), Stage::StoryGenerating, true),
            (PipelineError::Translation(TranslationError::Timeout), Stage::Translating, false),
            (PipelineError::Synthesis(SpeechError::Timeout), Stage::Synthesizing, false),
        ];
        for (err, stage, guarded) in cases {
            assert_eq!(err.stage(), stage);
            assert_eq!(err.is_guarded(), guarded);
        }
    }

    // -----------------------------------------------------------------------
    // Individual stages
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn native_translation_is_identity() {
        let h = happy();
        for text in ["", "Hello.", "  spaced  \n text ", "ünïcödé ✓"] {
            let out = h.pipeline.translate(text, Language::NATIVE).await.unwrap();
            assert_eq!(out.text, text);
            assert!(out.language.is_native());
        }
        assert_eq!(h.translator.calls(), 0);
    }

    #[tokio::test]
    async fn foreign_translation_tag_matches_target() {
        let h = happy();
        for lang in Language::ALL.into_iter().filter(|l| !l.is_native()) {
            let out = h.pipeline.translate("story", lang).await.unwrap();
            assert_eq!(out.code(), lang.code());
        }
        assert_eq!(h.translator.calls(), 8);
    }

    #[tokio::test]
    async fn story_is_bounded_by_budget() {
        let long = vec!["word"; 500].join(" ");
        let h = harness(
            MockCaptioner::ok("a cat"),
            MockGenerator::ok(long),
            MockTranslator::ok(),
            MockSynthesizer::ok(),
        );

        let story = h.pipeline.generate_story("a cat", 300).await.unwrap();
        assert_eq!(story.split_whitespace().count(), 300);
    }

    #[tokio::test]
    async fn caption_is_trimmed() {
        let h = harness(
            MockCaptioner::ok("  a kite in the sky \n"),
            MockGenerator::ok(STORY),
            MockTranslator::ok(),
            MockSynthesizer::ok(),
        );
        let image = InputImage::from_rgb("k.png", RgbImage::new(1, 1));
        assert_eq!(h.pipeline.caption(&image).await.unwrap(), "a kite in the sky");
        assert_eq!(h.captioner.calls(), 1);
    }

    // -----------------------------------------------------------------------
    // Command loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn serve_runs_each_command_from_idle() {
        let h = happy();
        let captioner = h.captioner.clone();
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (evt_tx, mut evt_rx) = mpsc::channel(64);

        cmd_tx
            .send(PipelineCommand::Run(request(Language::English)))
            .await
            .unwrap();
        cmd_tx
            .send(PipelineCommand::Run(request(Language::Tamil)))
            .await
            .unwrap();
        drop(cmd_tx);

        h.pipeline.serve(cmd_rx, evt_tx).await;

        let events = drain(&mut evt_rx);
        let finished = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::Finished))
            .count();
        let captions_started = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::StageStarted(Stage::Captioning)))
            .count();
        assert_eq!(finished, 2);
        assert_eq!(captions_started, 2);
        assert_eq!(captioner.calls(), 2);
    }
}
