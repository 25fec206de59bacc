//! Story-generation provider.
//!
//! This module provides:
//! * [`StoryGenerator`] — async trait implemented by generation backends.
//! * [`ApiGenerator`] — OpenAI-compatible `/v1/completions` client with a
//!   start-up model check ([`ApiGenerator::load`]).
//! * [`build_story_prompt`] / [`enforce_budget`] — prompt template and
//!   output-length bound.
//! * [`GenerationError`] — error variants for generation.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use image_story::config::AppConfig;
//! use image_story::story::{build_story_prompt, ApiGenerator, StoryGenerator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let generator = ApiGenerator::load(&config.generation)
//!         .await
//!         .expect("model not served");
//!
//!     let prompt = build_story_prompt("a dog running on a beach");
//!     let story = generator.generate(&prompt, 300).await.unwrap();
//!     println!("{story}");
//! }
//! ```

pub mod generator;
pub mod prompt;

pub use generator::{ApiGenerator, GenerationError, StoryGenerator};
pub use prompt::{build_story_prompt, enforce_budget};

#[cfg(test)]
pub use generator::MockGenerator;
