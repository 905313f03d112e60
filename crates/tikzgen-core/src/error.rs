use crate::pipeline::Stage;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by a [`Generator`](crate::pipeline::Generator) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Input is not an image (got `{mime_type}`)")]
    InputRejected { mime_type: String },

    #[error("Malformed image data URL")]
    MalformedDataUrl,

    #[error("{}", stage.user_message())]
    GenerationFailed {
        stage: Stage,
        #[source]
        source: BoxError,
    },

    #[error("{} (no {} found in the response)", stage.user_message(), stage.output_kind())]
    ExtractionEmpty { stage: Stage },
}

impl Error {
    /// Short message suitable for showing to the user, without source chains.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::InputRejected { .. } => "The file is not an image.",
            Error::MalformedDataUrl => "The image data is invalid.",
            Error::GenerationFailed { stage, .. } | Error::ExtractionEmpty { stage } => {
                stage.user_message()
            }
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::GenerationFailed { stage, .. } | Error::ExtractionEmpty { stage } => {
                Some(*stage)
            }
            _ => None,
        }
    }
}
