//! The four generation stages, written against the [`Generator`] seam.

use crate::config::GenerationSettings;
use crate::error::BoxError;
use crate::extract::{StreamBuffer, extract_markup, extract_vector_image};
use crate::image_input::ImagePayload;
use crate::prompt::{self, MathTopic};
use crate::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ImageToDescription,
    DescriptionToMarkup,
    MarkupToVector,
    ImageToMarkup,
}

impl Stage {
    pub fn user_message(&self) -> &'static str {
        match self {
            Stage::ImageToDescription => "Description generation failed.",
            Stage::DescriptionToMarkup => "TikZ generation failed.",
            Stage::MarkupToVector => "SVG compilation failed.",
            Stage::ImageToMarkup => "TikZ extraction failed.",
        }
    }

    pub fn output_kind(&self) -> &'static str {
        match self {
            Stage::ImageToDescription => "description",
            Stage::DescriptionToMarkup | Stage::ImageToMarkup => "TikZ",
            Stage::MarkupToVector => "SVG",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ImageToDescription => "image-to-description",
            Stage::DescriptionToMarkup => "description-to-tikz",
            Stage::MarkupToVector => "tikz-to-svg",
            Stage::ImageToMarkup => "image-to-tikz",
        })
    }
}

/// One call to the hosted model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub prompt: String,
    pub image: Option<ImagePayload>,
    pub temperature: f32,
    pub thinking_budget: Option<u32>,
}

/// Text (and optionally an image) in, text out.
pub trait Generator {
    fn generate(&self, request: &ModelRequest) -> std::result::Result<String, BoxError>;

    /// Streams the completion, calling `on_chunk` with each increment of text.
    ///
    /// The default implementation delivers the whole completion as a single chunk.
    fn generate_stream(
        &self,
        request: &ModelRequest,
        on_chunk: &mut dyn FnMut(&str),
    ) -> std::result::Result<(), BoxError> {
        let text = self.generate(request)?;
        on_chunk(&text);
        Ok(())
    }
}

/// The user's input under one of the three modes.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    Describe {
        topic: MathTopic,
        description: String,
    },
    Compile {
        markup: String,
    },
    Photograph {
        image: ImagePayload,
    },
}

impl GenerationRequest {
    pub fn stage(&self) -> Stage {
        match self {
            GenerationRequest::Describe { .. } => Stage::DescriptionToMarkup,
            GenerationRequest::Compile { .. } => Stage::MarkupToVector,
            GenerationRequest::Photograph { .. } => Stage::ImageToMarkup,
        }
    }
}

pub struct Pipelines<'a, G: Generator + ?Sized> {
    generator: &'a G,
    settings: &'a GenerationSettings,
}

impl<'a, G: Generator + ?Sized> Pipelines<'a, G> {
    pub fn new(generator: &'a G, settings: &'a GenerationSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        self.settings
    }

    /// Assembles the model call for `stage` from the configured parameters.
    pub fn build_request(
        &self,
        stage: Stage,
        prompt: String,
        image: Option<ImagePayload>,
        deep: bool,
    ) -> ModelRequest {
        let params = self.settings.stage(stage);
        let system_instruction = match stage {
            Stage::ImageToDescription => prompt::IMAGE_ANALYST_INSTRUCTION,
            _ => prompt::SYSTEM_INSTRUCTION,
        };
        ModelRequest {
            model: self.settings.model(params.tier).to_string(),
            system_instruction: Some(system_instruction.to_string()),
            prompt,
            image,
            temperature: params.temperature(deep),
            thinking_budget: params.thinking_budget(deep),
        }
    }

    /// Runs the stage matching `request`. `on_partial` receives progressive SVG fragments and
    /// is only used by [`GenerationRequest::Compile`].
    pub fn run(
        &self,
        request: &GenerationRequest,
        deep: bool,
        on_partial: Option<&mut dyn FnMut(&str)>,
    ) -> Result<String> {
        match request {
            GenerationRequest::Describe { topic, description } => {
                self.markup_from_description(*topic, description, deep)
            }
            GenerationRequest::Compile { markup } => {
                self.vector_from_markup(markup, deep, on_partial)
            }
            GenerationRequest::Photograph { image } => self.markup_from_image(image, deep),
        }
    }

    pub fn markup_from_description(
        &self,
        topic: MathTopic,
        description: &str,
        deep: bool,
    ) -> Result<String> {
        let stage = Stage::DescriptionToMarkup;
        let request =
            self.build_request(stage, prompt::description_to_markup(topic, description), None, deep);
        let text = self.call(stage, &request)?;
        non_empty(stage, extract_markup(&text))
    }

    pub fn description_from_image(&self, image: &ImagePayload) -> Result<String> {
        let stage = Stage::ImageToDescription;
        let request = self.build_request(
            stage,
            prompt::IMAGE_TO_DESCRIPTION.to_string(),
            Some(image.clone()),
            false,
        );
        let text = self.call(stage, &request)?;
        non_empty(stage, text.trim().to_string())
    }

    pub fn markup_from_image(&self, image: &ImagePayload, deep: bool) -> Result<String> {
        let stage = Stage::ImageToMarkup;
        let request = self.build_request(
            stage,
            prompt::IMAGE_TO_MARKUP.to_string(),
            Some(image.clone()),
            deep,
        );
        let text = self.call(stage, &request)?;
        non_empty(stage, extract_markup(&text))
    }

    /// Compiles TikZ to SVG.
    ///
    /// With `on_partial` the completion is streamed and every non-empty fragment of the growing
    /// buffer is reported, partial ones included. The returned SVG is the final fragment.
    pub fn vector_from_markup(
        &self,
        markup: &str,
        deep: bool,
        on_partial: Option<&mut dyn FnMut(&str)>,
    ) -> Result<String> {
        let stage = Stage::MarkupToVector;
        let request = self.build_request(stage, prompt::markup_to_vector(markup), None, deep);

        let svg = match on_partial {
            Some(on_partial) => {
                tracing::info!(%stage, model = %request.model, "streaming generation started");
                let mut buffer = StreamBuffer::new();
                self.generator
                    .generate_stream(&request, &mut |chunk: &str| {
                        let fragment = buffer.push(chunk);
                        if !fragment.is_empty() {
                            on_partial(fragment.as_str());
                        }
                    })
                    .map_err(|source| failed(stage, source))?;
                tracing::debug!(%stage, chunks = buffer.chunks().len(), "stream finished");
                buffer.finish()
            }
            None => extract_vector_image(&self.call(stage, &request)?),
        };
        non_empty(stage, svg)
    }

    fn call(&self, stage: Stage, request: &ModelRequest) -> Result<String> {
        tracing::info!(%stage, model = %request.model, "generation started");
        let text = self
            .generator
            .generate(request)
            .map_err(|source| failed(stage, source))?;
        tracing::debug!(%stage, bytes = text.len(), "generation finished");
        Ok(text)
    }
}

fn failed(stage: Stage, source: BoxError) -> Error {
    tracing::warn!(%stage, error = %source, "generation failed");
    Error::GenerationFailed { stage, source }
}

fn non_empty(stage: Stage, text: String) -> Result<String> {
    if text.is_empty() {
        tracing::warn!(%stage, "nothing extracted from the response");
        return Err(Error::ExtractionEmpty { stage });
    }
    Ok(text)
}
