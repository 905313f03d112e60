use crate::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// An image handed in from a file, the clipboard, or a data URL.
///
/// Only the MIME type is checked; size and dimensions are not validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime_type: String,
    bytes: Vec<u8>,
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("image/")
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let mime_type = mime_type.into();
        if !is_image_mime(&mime_type) {
            return Err(Error::InputRejected { mime_type });
        }
        Ok(Self {
            mime_type: mime_type.trim().to_ascii_lowercase(),
            bytes,
        })
    }

    /// Detects the MIME type from the leading magic bytes.
    pub fn sniff(bytes: Vec<u8>) -> Result<Self> {
        match image::guess_format(&bytes) {
            Ok(format) => Self::new(format.to_mime_type(), bytes),
            Err(_) => Err(Error::InputRejected {
                mime_type: "application/octet-stream".to_string(),
            }),
        }
    }

    /// Parses `data:<mime>;base64,<payload>`.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or(Error::MalformedDataUrl)?;
        let (mime_type, data) = rest.split_once(";base64,").ok_or(Error::MalformedDataUrl)?;
        if mime_type.is_empty() || data.is_empty() {
            return Err(Error::MalformedDataUrl);
        }
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|_| Error::MalformedDataUrl)?;
        Self::new(mime_type, bytes)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}
