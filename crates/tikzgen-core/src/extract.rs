//! Fragment extraction from free-form model output.
//!
//! Models wrap their answer in prose, code fences, or both, and streamed answers arrive a few
//! tokens at a time. Everything in this module is a pure function of the text seen so far: a
//! caller re-derives the fragment from the whole buffer after each chunk instead of patching a
//! previous result, so any prefix of a stream can be checked directly.

use regex::Regex;
use std::sync::LazyLock;

pub const SVG_OPEN: &str = "<svg";
pub const SVG_CLOSE: &str = "</svg>";
pub const TIKZ_ENVIRONMENT: &str = "tikzpicture";

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:latex|tikz)?").unwrap());

/// Extracts the first `tikzpicture` environment from `buffer`.
///
/// See [`extract_environment`] for the fallback used when the model omits the environment.
pub fn extract_markup(buffer: &str) -> String {
    extract_environment(buffer, TIKZ_ENVIRONMENT)
}

/// Returns the first `\begin{env} ... \end{env}` block (delimiters included).
///
/// When the pair is incomplete the whole buffer is returned with code fences removed and
/// surrounding whitespace trimmed.
pub fn extract_environment(buffer: &str, env: &str) -> String {
    let begin = format!("\\begin{{{env}}}");
    let end = format!("\\end{{{env}}}");

    if let Some(start) = buffer.find(&begin) {
        let body = start + begin.len();
        if let Some(rel) = buffer[body..].find(&end) {
            return buffer[start..body + rel + end.len()].to_string();
        }
    }
    strip_code_fences(buffer)
}

pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE_RE.replace_all(text, "").trim().to_string()
}

/// State of the SVG document found in a (possibly still growing) buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFragment<'a> {
    /// Nothing renderable yet. Not an error while a stream is still arriving.
    Empty,
    /// Opening tag seen, closing tag not yet. Only fit for progressive rendering.
    Partial(&'a str),
    /// From the first `<svg` to the last `</svg>`, inclusive.
    Complete(&'a str),
}

impl<'a> VectorFragment<'a> {
    pub fn as_str(&self) -> &'a str {
        match *self {
            VectorFragment::Empty => "",
            VectorFragment::Partial(s) | VectorFragment::Complete(s) => s,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, VectorFragment::Empty)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, VectorFragment::Complete(_))
    }
}

/// Classifies the SVG content of `buffer`.
///
/// The span runs from the *first* `<svg` to the *last* `</svg>`. If a response holds two
/// complete documents, both are captured together along with whatever sits between them.
pub fn classify_vector_image(buffer: &str) -> VectorFragment<'_> {
    let clean = buffer.trim();
    let Some(start) = clean.find(SVG_OPEN) else {
        return VectorFragment::Empty;
    };

    match clean.rfind(SVG_CLOSE) {
        Some(end) if end > start => VectorFragment::Complete(&clean[start..end + SVG_CLOSE.len()]),
        _ => {
            let partial = &clean[start..];
            if is_bare_start_tag(partial) {
                VectorFragment::Empty
            } else {
                VectorFragment::Partial(partial)
            }
        }
    }
}

/// Returns the SVG fragment of `buffer`, or an empty string when there is none yet.
pub fn extract_vector_image(buffer: &str) -> String {
    classify_vector_image(buffer).as_str().to_string()
}

/// `true` when `s` is exactly one finished, non-self-closing start tag (e.g. `<svg width="1">`).
fn is_bare_start_tag(s: &str) -> bool {
    match start_tag_end(s) {
        Some(end) => end + 1 == s.len() && !s[..end].ends_with('/'),
        None => false,
    }
}

/// Byte index of the `>` closing the start tag at the beginning of `s`, skipping quoted values.
fn start_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, ch) in s.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '>') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

/// Append-only text buffer for one streamed generation call.
///
/// Holds the raw chunks and their concatenation; fragments are always derived from the full
/// concatenation.
#[derive(Debug, Clone, Default)]
pub struct StreamBuffer {
    chunks: Vec<String>,
    text: String,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns the SVG fragment of the buffer so far.
    pub fn push(&mut self, chunk: &str) -> VectorFragment<'_> {
        self.chunks.push(chunk.to_string());
        self.text.push_str(chunk);
        classify_vector_image(&self.text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn vector_fragment(&self) -> VectorFragment<'_> {
        classify_vector_image(&self.text)
    }

    pub fn markup(&self) -> String {
        extract_markup(&self.text)
    }

    /// Consumes the buffer and returns the final SVG fragment.
    pub fn finish(self) -> String {
        extract_vector_image(&self.text)
    }
}
