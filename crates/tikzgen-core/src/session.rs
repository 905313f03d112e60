use crate::config::GenerationSettings;
use crate::image_input::ImagePayload;
use crate::pipeline::{Generator, Pipelines};
use crate::prompt::MathTopic;
use crate::viewport::{ListenerHost, PointerEvent, ViewportController, ViewportState};
use crate::{Error, Result};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    DescribeToMarkup,
    MarkupToVector,
    ImageToMarkup,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Status {
    pub loading: bool,
    /// Short message of the last failure; cleared by the next action or by dismissal.
    pub error: Option<String>,
    /// What the running action is doing, for a progress line.
    pub progress: Option<&'static str>,
}

/// Inputs, outputs and UI status for one user working through the three modes.
///
/// Only one action runs at a time: every action takes `&mut self` for its whole duration.
pub struct Session {
    pub mode: Mode,
    pub topic: MathTopic,
    pub description: String,
    pub markup: String,
    pub vector: String,
    pub preview_image: Option<ImagePayload>,
    pub deep_reasoning: bool,
    settings: GenerationSettings,
    status: Status,
    viewport: ViewportController,
}

impl Session {
    pub fn new(settings: GenerationSettings) -> Self {
        Self::with_viewport(settings, ViewportController::headless())
    }

    pub fn with_listener_host(settings: GenerationSettings, host: Rc<dyn ListenerHost>) -> Self {
        Self::with_viewport(settings, ViewportController::new(host))
    }

    fn with_viewport(settings: GenerationSettings, viewport: ViewportController) -> Self {
        Self {
            mode: Mode::default(),
            topic: MathTopic::default(),
            description: String::new(),
            markup: String::new(),
            vector: String::new(),
            preview_image: None,
            deep_reasoning: settings.deep_reasoning,
            settings,
            status: Status::default(),
            viewport,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn viewport(&self) -> &ViewportState {
        self.viewport.state()
    }

    pub fn viewport_controller(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    pub fn has_image(&self) -> bool {
        !self.vector.is_empty()
    }

    pub fn dismiss_error(&mut self) {
        self.status.error = None;
    }

    /// Routes a pointer event to the viewport. Pan and zoom only apply to a displayed SVG.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> &ViewportState {
        let has_image = self.mode == Mode::MarkupToVector && self.has_image();
        self.viewport.handle(event, has_image)
    }

    /// Description + topic → TikZ. No-op on a blank description.
    pub fn generate_markup<G: Generator + ?Sized>(&mut self, generator: &G) {
        if self.description.trim().is_empty() {
            return;
        }
        self.begin(if self.deep_reasoning {
            "Reasoning about the figure..."
        } else {
            "Generating TikZ..."
        });
        let result = Pipelines::new(generator, &self.settings).markup_from_description(
            self.topic,
            &self.description,
            self.deep_reasoning,
        );
        if let Some(markup) = self.finish(result) {
            self.markup = markup;
        }
    }

    /// TikZ → SVG, streaming partial fragments into [`Session::vector`].
    ///
    /// Clears the previous image and resets the viewport before the first chunk arrives.
    pub fn compile_vector<G: Generator + ?Sized>(&mut self, generator: &G) {
        if self.markup.trim().is_empty() {
            return;
        }
        self.begin("Drawing the vector image...");
        self.vector.clear();
        self.viewport.reset();

        let pipelines = Pipelines::new(generator, &self.settings);
        let vector = &mut self.vector;
        let mut show = |svg: &str| {
            vector.clear();
            vector.push_str(svg);
        };
        let result = pipelines.vector_from_markup(&self.markup, self.deep_reasoning, Some(&mut show));
        if let Some(svg) = self.finish(result) {
            self.vector = svg;
        }
    }

    /// Previewed photograph → TikZ. No-op without a preview.
    pub fn extract_markup<G: Generator + ?Sized>(&mut self, generator: &G) {
        let Some(image) = self.preview_image.clone() else {
            return;
        };
        self.begin("Extracting TikZ from the image...");
        let result =
            Pipelines::new(generator, &self.settings).markup_from_image(&image, self.deep_reasoning);
        if let Some(markup) = self.finish(result) {
            self.markup = markup;
        }
    }

    /// Accepts a pasted or dropped file.
    ///
    /// Non-images are rejected with a visible error. In the description mode (or with
    /// `target = Some(Mode::DescribeToMarkup)`) the image is turned into a description;
    /// otherwise it becomes the preview of the image mode.
    pub fn accept_image<G: Generator + ?Sized>(
        &mut self,
        mime_type: &str,
        bytes: Vec<u8>,
        target: Option<Mode>,
        generator: &G,
    ) {
        let image = match ImagePayload::new(mime_type, bytes) {
            Ok(image) => image,
            Err(err) => {
                self.reject(err);
                return;
            }
        };

        match target.unwrap_or(self.mode) {
            Mode::DescribeToMarkup => {
                self.begin("Reading the image into a description...");
                let result = Pipelines::new(generator, &self.settings).description_from_image(&image);
                if let Some(description) = self.finish(result) {
                    self.description = description;
                    self.mode = Mode::DescribeToMarkup;
                }
            }
            _ => {
                self.preview_image = Some(image);
                self.mode = Mode::ImageToMarkup;
                self.status = Status::default();
            }
        }
    }

    fn begin(&mut self, progress: &'static str) {
        self.status = Status {
            loading: true,
            error: None,
            progress: Some(progress),
        };
    }

    fn finish(&mut self, result: Result<String>) -> Option<String> {
        self.status.loading = false;
        self.status.progress = None;
        match result {
            Ok(text) => Some(text),
            Err(err) => {
                self.reject(err);
                None
            }
        }
    }

    fn reject(&mut self, err: Error) {
        tracing::warn!(error = %err, "action failed");
        self.status.loading = false;
        self.status.error = Some(err.user_message().to_string());
    }
}
