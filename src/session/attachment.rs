//! Image attachment capture and encoding.
//!
//! A captured image is turned into a `data:` URI so the same string can be
//! previewed locally and embedded in the outgoing request body.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;

/// A file picked by the user, before validation.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its media type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            media_type,
            bytes,
        })
    }

    fn is_image(&self) -> bool {
        self.media_type
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
    }
}

/// An accepted image in transportable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    name: String,
    media_type: String,
    data_uri: String,
    size: usize,
}

impl EncodedImage {
    /// Original file name, for display.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// `data:<media type>;base64,<payload>`
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    /// Size of the decoded image in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Validate and encode a picked file.
///
/// Non-image files yield `None`; the caller keeps whatever it had staged.
pub fn capture(file: RawFile) -> Option<EncodedImage> {
    if !file.is_image() {
        tracing::debug!(
            "Ignoring attachment {} with media type {}",
            file.name,
            file.media_type
        );
        return None;
    }

    let encoded = base64::engine::general_purpose::STANDARD.encode(&file.bytes);
    let media_type = file.media_type.to_ascii_lowercase();
    let data_uri = format!("data:{};base64,{}", media_type, encoded);

    Some(EncodedImage {
        name: file.name,
        media_type,
        data_uri,
        size: file.bytes.len(),
    })
}
