#![forbid(unsafe_code)]

//! Headless core of tikzgen: turning descriptions, TikZ and photographs of mathematical figures
//! into TikZ and SVG through a hosted generative model.
//!
//! - [`extract`]: pull a TikZ or SVG fragment out of (streamed) model output
//! - [`viewport`]: pan/zoom/crop state machine for the displayed SVG
//! - [`pipeline`]: the generation stages, written against the [`Generator`] trait
//! - [`session`]: mode, inputs, outputs and status of one interactive user
//!
//! Nothing here performs I/O; the HTTP client lives in `tikzgen-gemini` and rasterization in
//! `tikzgen` behind the `raster` feature.

pub mod config;
pub mod error;
pub mod extract;
pub mod image_input;
pub mod pipeline;
pub mod prompt;
pub mod session;
pub mod viewport;

pub use config::{GenerationSettings, ModelTier, StageSettings};
pub use error::{BoxError, Error, Result};
pub use extract::{
    StreamBuffer, VectorFragment, classify_vector_image, extract_environment, extract_markup,
    extract_vector_image,
};
pub use image_input::ImagePayload;
pub use pipeline::{GenerationRequest, Generator, ModelRequest, Pipelines, Stage};
pub use prompt::MathTopic;
pub use session::{Mode, Session, Status};
pub use viewport::{PointerEvent, ViewportController, ViewportState};

#[cfg(test)]
mod tests;
