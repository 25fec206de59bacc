//! Application entry point — Image Story Generator.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Load the story model; on failure open a window that only shows the
//!    error.
//! 5. Build the captioning, translation and speech providers from config.
//! 6. Create pipeline channels (`command`, `event`).
//! 7. Spawn the pipeline orchestrator on the tokio runtime.
//! 8. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use anyhow::Context as _;
use image_story::{
    app::StoryApp,
    caption::{ApiCaptioner, Captioner},
    config::{AppConfig, AppPaths},
    pipeline::{PipelineCommand, PipelineEvent, StoryPipeline},
    speech::{GoogleTts, SpeechSynthesizer},
    story::{ApiGenerator, StoryGenerator},
    translate::{GoogleTranslator, Translator},
};
use tokio::sync::mpsc;

const WINDOW_TITLE: &str = "Image Story Generator";

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (w, h) = config.ui.window_size;
    let vp = egui::ViewportBuilder::default()
        .with_title(WINDOW_TITLE)
        .with_inner_size([w, h])
        .with_min_inner_size([480.0, 360.0])
        .with_drag_and_drop(true);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Image Story Generator starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 worker threads; stages are I/O bound)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. One-time model load
    let app = match rt.block_on(ApiGenerator::load(&config.generation)) {
        Ok(generator) => {
            // 5. Providers
            let captioner: Arc<dyn Captioner> = Arc::new(ApiCaptioner::from_config(&config.caption));
            let generator: Arc<dyn StoryGenerator> = Arc::new(generator);
            let translator: Arc<dyn Translator> =
                Arc::new(GoogleTranslator::from_config(&config.translation));
            let speech: Arc<dyn SpeechSynthesizer> = Arc::new(GoogleTts::from_config(&config.speech));

            let pipeline = StoryPipeline::new(
                captioner,
                generator,
                translator,
                speech,
                config.generation.max_tokens,
                AppPaths::new().audio_dir,
            );

            // 6. Channel setup
            let (command_tx, command_rx) = mpsc::channel::<PipelineCommand>(4);
            let (event_tx, event_rx) = mpsc::channel::<PipelineEvent>(32);

            // 7. Orchestrator
            rt.spawn(pipeline.serve(command_rx, event_tx));

            StoryApp::new(command_tx, event_rx, &config)
        }
        Err(e) => {
            log::error!("Story model failed to load: {e}");
            StoryApp::startup_failed(e.to_string(), &config)
        }
    };

    // 8. Run the window (blocks until closed)
    let options = native_options(&config);
    eframe::run_native(WINDOW_TITLE, options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("window error: {e}"))?;

    // Drop the runtime only after the window (and its command sender) is gone.
    drop(rt);
    log::info!("Image Story Generator shut down");
    Ok(())
}
