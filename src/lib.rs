//! Image-to-multilingual story generator.
//!
//! Caption an image, expand the caption into a short story, translate it
//! into the selected language and narrate it.  See [`pipeline`] for the
//! orchestration and [`app`] for the egui front end.

pub mod app;
pub mod caption;
pub mod catalog;
pub mod config;
mod http;
pub mod image_input;
pub mod pipeline;
pub mod speech;
pub mod story;
pub mod translate;

#[cfg(test)]
mod testutil;
