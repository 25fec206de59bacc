//! Story generator window — egui/eframe application.
//!
//! # Architecture
//!
//! [`StoryApp`] is the top-level [`eframe::App`] that owns the UI state and
//! two channel endpoints:
//!
//! * `command_tx` — sends [`PipelineCommand`] to the pipeline orchestrator.
//! * `event_rx`   — receives [`PipelineEvent`] progress from the orchestrator.
//!
//! The window mirrors the current run in a [`RunOutput`] that is rebuilt from
//! events, so artifacts appear as soon as their stage completes.
//!
//! # Views
//!
//! | Situation | Visual |
//! |-----------|--------|
//! | Model failed to load | Fatal error only; upload controls never shown |
//! | No image | Drop hint + path field |
//! | Image loaded | Preview, language/voice boxes, "Generate Story" |
//! | Run in progress | Spinner + completed artifacts so far |
//! | Done | Caption, story, translation (non-native only), audio player |
//! | Failed | Artifacts before the failed stage + error annotation |

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::catalog::{Language, Voice};
use crate::config::AppConfig;
use crate::image_input::InputImage;
use crate::pipeline::{PipelineCommand, PipelineEvent, PipelineState, RunOutput, RunRequest};
use crate::speech::AudioPlayer;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(75, 139, 59);
const ERROR: egui::Color32 = egui::Color32::from_rgb(255, 111, 97);
const MUTED: egui::Color32 = egui::Color32::from_rgb(140, 140, 140);

/// Longest side of the preview texture, in pixels.
const PREVIEW_MAX_SIDE: usize = 1024;

/// A failure reported by the orchestrator for the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunFailure {
    pub message: String,
    /// Guarded failures get a styled annotation; others render as plain text.
    pub guarded: bool,
}

// ---------------------------------------------------------------------------
// StoryApp
// ---------------------------------------------------------------------------

pub struct StoryApp {
    // ── Startup ──────────────────────────────────────────────────────────
    /// Set when the generation model could not be loaded.
    startup_error: Option<String>,

    // ── Inputs ───────────────────────────────────────────────────────────
    image: Option<Arc<InputImage>>,
    texture: Option<egui::TextureHandle>,
    path_input: String,
    load_error: Option<String>,
    language: Language,
    voice: Voice,

    // ── Current run ──────────────────────────────────────────────────────
    run: RunOutput,
    failure: Option<RunFailure>,
    /// A run command has been sent and its terminal event not yet received.
    in_flight: bool,

    // ── Playback ─────────────────────────────────────────────────────────
    player: Option<AudioPlayer>,
    player_error: Option<String>,

    spinner_phase: f32,

    // ── Channels ─────────────────────────────────────────────────────────
    command_tx: Option<mpsc::Sender<PipelineCommand>>,
    event_rx: Option<mpsc::Receiver<PipelineEvent>>,
}

impl StoryApp {
    /// Create the interactive window.
    pub fn new(
        command_tx: mpsc::Sender<PipelineCommand>,
        event_rx: mpsc::Receiver<PipelineEvent>,
        config: &AppConfig,
    ) -> Self {
        Self {
            command_tx: Some(command_tx),
            event_rx: Some(event_rx),
            ..Self::blank(config)
        }
    }

    /// Create a window that only reports a fatal start-up error.
    pub fn startup_failed(message: impl Into<String>, config: &AppConfig) -> Self {
        Self {
            startup_error: Some(message.into()),
            ..Self::blank(config)
        }
    }

    fn blank(config: &AppConfig) -> Self {
        Self {
            startup_error: None,
            image: None,
            texture: None,
            path_input: String::new(),
            load_error: None,
            language: config.ui.default_language,
            voice: config.ui.default_voice,
            run: RunOutput::default(),
            failure: None,
            in_flight: false,
            player: None,
            player_error: None,
            spinner_phase: 0.0,
            command_tx: None,
            event_rx: None,
        }
    }

    // ── Inputs ───────────────────────────────────────────────────────────

    /// Replace the current image; the preview texture is rebuilt lazily.
    pub fn set_image(&mut self, image: InputImage) {
        log::info!(
            "image loaded: {} ({}x{})",
            image.name(),
            image.width(),
            image.height()
        );
        self.image = Some(Arc::new(image));
        self.texture = None;
        self.load_error = None;
    }

    fn load_path(&mut self, path: &Path) {
        match InputImage::open(path) {
            Ok(image) => self.set_image(image),
            Err(e) => {
                log::warn!("could not load {}: {e}", path.display());
                self.load_error = Some(e.to_string());
            }
        }
    }

    fn load_bytes(&mut self, name: &str, bytes: &[u8]) {
        match InputImage::from_bytes(name, bytes) {
            Ok(image) => self.set_image(image),
            Err(e) => self.load_error = Some(e.to_string()),
        }
    }

    /// Load any files dropped onto the window (last one wins).
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            if let Some(path) = file.path {
                self.path_input = path.display().to_string();
                self.load_path(&path);
            } else if let Some(bytes) = file.bytes {
                self.load_bytes(&file.name, &bytes);
            }
        }
    }

    // ── Run control ──────────────────────────────────────────────────────

    /// `true` when "Generate Story" may be pressed.
    pub fn can_start(&self) -> bool {
        self.startup_error.is_none()
            && self.command_tx.is_some()
            && self.image.is_some()
            && !self.in_flight
    }

    /// Discard the previous run and ask the orchestrator for a new one.
    pub fn start_run(&mut self) {
        if !self.can_start() {
            return;
        }
        let (Some(image), Some(tx)) = (self.image.clone(), self.command_tx.as_ref()) else {
            return;
        };

        let request = RunRequest {
            image,
            language: self.language,
            voice: self.voice,
        };

        match tx.try_send(PipelineCommand::Run(request)) {
            Ok(()) => {
                self.stop_playback();
                // Dropping the old output also removes its audio file.
                self.run = RunOutput::default();
                self.failure = None;
                self.player_error = None;
                self.in_flight = true;
            }
            Err(e) => {
                log::error!("could not reach pipeline: {e}");
                self.failure = Some(RunFailure {
                    message: format!("Unexpected error: {e}"),
                    guarded: false,
                });
            }
        }
    }

    /// Drain all pending pipeline events (non-blocking).
    fn poll_events(&mut self) {
        let mut pending = Vec::new();
        if let Some(rx) = self.event_rx.as_mut() {
            while let Ok(event) = rx.try_recv() {
                pending.push(event);
            }
        }
        for event in pending {
            self.apply_event(event);
        }
    }

    /// Fold one orchestrator event into the mirrored run.
    pub fn apply_event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::StageStarted(stage) => {
                self.run.state = PipelineState::running(stage);
            }
            PipelineEvent::CaptionReady(caption) => self.run.caption = Some(caption),
            PipelineEvent::StoryReady(story) => self.run.story = Some(story),
            PipelineEvent::TranslationReady(t) => self.run.translation = Some(t),
            PipelineEvent::AudioReady(audio) => self.run.audio = Some(audio),
            PipelineEvent::Finished => {
                self.run.state = PipelineState::Done;
                self.in_flight = false;
            }
            PipelineEvent::Failed {
                stage,
                message,
                guarded,
            } => {
                self.run.state = PipelineState::Failed {
                    stage,
                    reason: message.clone(),
                };
                self.failure = Some(RunFailure { message, guarded });
                self.in_flight = false;
            }
        }
    }

    pub fn run(&self) -> &RunOutput {
        &self.run
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        self.failure.as_ref()
    }

    // ── Playback ─────────────────────────────────────────────────────────

    fn play_audio(&mut self) {
        let Some(audio) = self.run.audio.clone() else {
            return;
        };

        if self.player.is_none() {
            match AudioPlayer::new() {
                Ok(p) => self.player = Some(p),
                Err(e) => {
                    self.player_error = Some(e.to_string());
                    return;
                }
            }
        }

        if let Some(player) = self.player.as_mut() {
            if let Err(e) = player.play(audio.path()) {
                log::warn!("playback failed: {e}");
                self.player_error = Some(e.to_string());
            }
        }
    }

    fn stop_playback(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.player.as_ref().is_some_and(AudioPlayer::is_playing)
    }

    // ── Renderers ────────────────────────────────────────────────────────

    fn draw_startup_error(&self, ui: &mut egui::Ui, message: &str) {
        ui.add_space(24.0);
        ui.heading("AI Image-to-Multilingual Story Generator");
        ui.add_space(12.0);
        ui.label(
            egui::RichText::new("Failed to load the story model. Please check your model path or the generation server.")
                .color(ERROR)
                .size(15.0),
        );
        ui.add_space(4.0);
        ui.label(egui::RichText::new(message).color(MUTED).size(12.0));
    }

    fn draw_inputs(&mut self, ui: &mut egui::Ui) {
        ui.label(
            egui::RichText::new(
                "Upload an image and let the AI generate a story. Choose the output language and hear it read aloud!",
            )
            .color(MUTED),
        );
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label("Image (jpg, jpeg, png):");
            ui.text_edit_singleline(&mut self.path_input);
            if ui.button("Load").clicked() {
                let path = std::path::PathBuf::from(self.path_input.trim());
                self.load_path(&path);
            }
        });
        ui.label(egui::RichText::new("…or drop a file onto this window").color(MUTED).size(11.0));

        if let Some(err) = &self.load_error {
            ui.label(egui::RichText::new(err.as_str()).color(ERROR));
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            egui::ComboBox::from_label("Choose output language")
                .selected_text(self.language.label())
                .show_ui(ui, |ui| {
                    for lang in Language::ALL {
                        ui.selectable_value(&mut self.language, lang, lang.label());
                    }
                });
            ui.add_space(16.0);
            egui::ComboBox::from_label("Choose voice")
                .selected_text(self.voice.label())
                .show_ui(ui, |ui| {
                    for voice in Voice::ALL {
                        ui.selectable_value(&mut self.voice, voice, voice.label());
                    }
                });
        });
    }

    fn draw_preview(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let Some(image) = self.image.clone() else {
            return;
        };

        let texture = self.texture.get_or_insert_with(|| {
            // Textures above the GPU limit make the renderer panic.
            let max_side = ctx.input(|i| i.max_texture_side).min(PREVIEW_MAX_SIDE) as u32;
            let preview = image.preview(max_side);
            let size = [preview.width() as usize, preview.height() as usize];
            let color = egui::ColorImage::from_rgb(size, preview.as_raw());
            ctx.load_texture("input-image", color, egui::TextureOptions::LINEAR)
        });

        ui.add_space(8.0);
        ui.add(
            egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                .max_height(280.0)
                .maintain_aspect_ratio(true),
        );
        ui.label(egui::RichText::new(image.name()).color(MUTED).size(11.0));
    }

    fn draw_results(&mut self, ui: &mut egui::Ui) {
        if let Some(caption) = &self.run.caption {
            ui.add_space(8.0);
            ui.label(egui::RichText::new("Caption:").italics().color(ACCENT));
            ui.label(caption.as_str());
        }

        if let Some(story) = &self.run.story {
            ui.add_space(8.0);
            ui.label(
                egui::RichText::new(format!("Story ({}):", Language::NATIVE.label()))
                    .italics()
                    .color(ACCENT),
            );
            ui.label(story.as_str());
        }

        if let Some(t) = self.run.foreign_translation() {
            ui.add_space(8.0);
            ui.label(
                egui::RichText::new(format!("Translated Story ({}):", t.language.label()))
                    .italics()
                    .color(ACCENT),
            );
            ui.label(t.text.as_str());
        }

        if let Some(audio) = self.run.audio.clone() {
            ui.add_space(8.0);
            ui.label(egui::RichText::new("Listen to the Story:").italics().color(ACCENT));
            ui.horizontal(|ui| {
                if ui.button("Play").clicked() {
                    self.play_audio();
                }
                if ui
                    .add_enabled(self.is_playing(), egui::Button::new("Stop"))
                    .clicked()
                {
                    self.stop_playback();
                }
                ui.label(
                    egui::RichText::new(format!(
                        "{} · {} · {} KB",
                        audio.language().label(),
                        audio.voice().label(),
                        audio.size_bytes() / 1024
                    ))
                    .color(MUTED)
                    .size(11.0),
                );
            });
            ui.label(
                egui::RichText::new(audio.path().display().to_string())
                    .color(MUTED)
                    .size(10.0),
            );
            if let Some(err) = &self.player_error {
                ui.label(egui::RichText::new(err.as_str()).color(ERROR));
            }
        }

        if let Some(failure) = &self.failure {
            ui.add_space(8.0);
            if failure.guarded {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_premultiplied(80, 20, 20, 200))
                    .corner_radius(egui::CornerRadius::same(6))
                    .inner_margin(egui::Margin::same(8))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(format!("⚠ {}", failure.message)).color(ERROR),
                        );
                    });
            } else {
                ui.label(failure.message.as_str());
            }
        }
    }

    /// A simple rotating ASCII spinner character driven by `spinner_phase`.
    fn spinner_char(&self) -> char {
        let chars = ['|', '/', '-', '\\'];
        let idx = (self.spinner_phase as usize) % chars.len();
        chars[idx]
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for StoryApp {
    /// Called every frame by eframe.  Polls the event channel, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(message) = self.startup_error.clone() {
            egui::CentralPanel::default().show(ctx, |ui| self.draw_startup_error(ui, &message));
            return;
        }

        self.poll_events();
        self.handle_dropped_files(ctx);

        self.spinner_phase += 0.08;
        if self.spinner_phase >= 4.0 {
            self.spinner_phase = 0.0;
        }

        if self.in_flight || self.is_playing() {
            // Keep polling the channel / playback state while work is pending.
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("AI Image-to-Multilingual Story Generator");
                ui.separator();

                self.draw_inputs(ui);
                self.draw_preview(ui, ctx);

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(self.can_start(), egui::Button::new("Generate Story"))
                        .clicked()
                    {
                        self.start_run();
                    }
                    if self.in_flight {
                        ui.label(
                            egui::RichText::new(format!(
                                "{} {}...",
                                self.spinner_char(),
                                self.run.state.label()
                            ))
                            .color(egui::Color32::from_rgb(68, 136, 255)),
                        );
                    }
                });

                ui.separator();
                self.draw_results(ui);
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.stop_playback();
        log::info!("story window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
