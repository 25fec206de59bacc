//! Pipeline orchestrator module.
//!
//! This module wires the image → caption → story → translation → speech
//! chain and the message types exchanged with the UI.
//!
//! # Architecture
//!
//! ```text
//! StoryApp (egui, UI thread)
//!        │  PipelineCommand::Run(RunRequest)        (mpsc)
//!        ▼
//! StoryPipeline::serve()  ← async tokio task
//!        │
//!        ├─ Captioner::caption            → Captioning
//!        ├─ StoryGenerator::generate      → StoryGenerating
//!        ├─ Translator::translate         → Translating   (skipped for native)
//!        └─ SpeechSynthesizer::synthesize → Synthesizing
//!        │
//!        ▼  PipelineEvent                             (mpsc)
//! StoryApp::poll_events() — try_recv each frame
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use image_story::caption::ApiCaptioner;
//! use image_story::config::{AppConfig, AppPaths};
//! use image_story::pipeline::StoryPipeline;
//! use image_story::speech::GoogleTts;
//! use image_story::story::ApiGenerator;
//! use image_story::translate::GoogleTranslator;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let generator = ApiGenerator::load(&config.generation).await.unwrap();
//!
//!     let pipeline = StoryPipeline::new(
//!         Arc::new(ApiCaptioner::from_config(&config.caption)),
//!         Arc::new(generator),
//!         Arc::new(GoogleTranslator::from_config(&config.translation)),
//!         Arc::new(GoogleTts::from_config(&config.speech)),
//!         config.generation.max_tokens,
//!         AppPaths::new().audio_dir,
//!     );
//!
//!     let (command_tx, command_rx) = mpsc::channel(4);
//!     let (event_tx, event_rx) = mpsc::channel(32);
//!     tokio::spawn(pipeline.serve(command_rx, event_tx));
//!
//!     // command_tx / event_rx are handed to the UI.
//!     # drop((command_tx, event_rx));
//! }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{
    PipelineCommand, PipelineError, PipelineEvent, StoryPipeline, CAPTION_FAILED_MESSAGE,
    STORY_FAILED_MESSAGE,
};
pub use state::{PipelineState, RunOutput, RunRequest, Stage};
