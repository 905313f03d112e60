use crate::error::BoxError;
use crate::pipeline::{Generator, ModelRequest};
use std::cell::RefCell;

mod viewport;

/// Replays a fixed completion (split into chunks) or a fixed failure, recording every request.
pub(crate) struct ScriptedGenerator {
    reply: Result<Vec<String>, String>,
    pub(crate) requests: RefCell<Vec<ModelRequest>>,
}

impl ScriptedGenerator {
    pub(crate) fn chunks(chunks: &[&str]) -> Self {
        Self {
            reply: Ok(chunks.iter().map(|c| c.to_string()).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn text(text: &str) -> Self {
        Self::chunks(&[text])
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn last_request(&self) -> ModelRequest {
        self.requests.borrow().last().cloned().unwrap()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, request: &ModelRequest) -> Result<String, BoxError> {
        self.requests.borrow_mut().push(request.clone());
        match &self.reply {
            Ok(chunks) => Ok(chunks.concat()),
            Err(message) => Err(message.clone().into()),
        }
    }

    fn generate_stream(
        &self,
        request: &ModelRequest,
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<(), BoxError> {
        self.requests.borrow_mut().push(request.clone());
        match &self.reply {
            Ok(chunks) => {
                for chunk in chunks {
                    on_chunk(chunk);
                }
                Ok(())
            }
            Err(message) => Err(message.clone().into()),
        }
    }
}
