#![forbid(unsafe_code)]

//! `tikzgen` turns a description, a TikZ snippet or a photograph of a mathematical figure into
//! TikZ and SVG, using a hosted generative model for the heavy lifting.
//!
//! The crate re-exports [`tikzgen_core`]: fragment extraction, the viewport/crop state machine,
//! the generation pipelines and the interactive session model.
//!
//! # Features
//!
//! - `raster`: SVG → PNG rendering and crop export via pure-Rust rasterization (`tikzgen::raster`)
//! - `gemini`: the blocking Gemini client implementing [`Generator`] (`tikzgen::gemini`)

pub use tikzgen_core::*;

#[cfg(feature = "raster")]
pub mod raster;

#[cfg(feature = "gemini")]
pub use tikzgen_gemini as gemini;
