//! Image records and the byte containers they carry.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::ImageFormat;

use crate::error::Result;

/// Mimetype used when a file's extension is not a known image format.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Opaque unique identifier of an [`ImageRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(String);

impl ImageId {
    /// Allocate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Borrow the id as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A user-supplied file: raw bytes plus its declared mimetype.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File name as shown to the user.
    pub name: String,
    /// Declared mimetype, e.g. `image/png`.
    pub mime_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Wrap in-memory bytes.
    #[must_use]
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its mimetype from the extension.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |f| f.to_string_lossy().to_string(),
        );
        Ok(Self::new(name, mime_for_path(path), bytes))
    }

    /// View the file contents as an encoded image with the declared mimetype.
    #[must_use]
    pub fn to_encoded(&self) -> EncodedImage {
        EncodedImage::new(self.mime_type.clone(), self.bytes.clone())
    }
}

/// Declared mimetype for a path, derived from its extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    ImageFormat::from_path(path).map_or(UNKNOWN_MIME, |f| f.to_mime_type())
}

/// A self-contained encoded raster (format bytes plus mimetype).
///
/// Cloning shares the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Mimetype of `data`.
    pub mime_type: String,
    /// Encoded bytes.
    pub data: Arc<[u8]>,
}

impl EncodedImage {
    /// Wrap encoded bytes.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Decode the payload into pixels.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Image`] if the bytes are not a decodable image.
    pub fn decode(&self) -> Result<image::DynamicImage> {
        Ok(image::load_from_memory(&self.data)?)
    }
}

/// Processing state of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    /// Accepted, not yet sent.
    Pending,
    /// A remote edit is in flight.
    Processing,
    /// A processed image is attached.
    Done,
    /// The last remote edit failed.
    Error,
}

impl ImageStatus {
    /// Whether the record is still waiting on the remote service.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Whether a record may move from `self` to `next`.
    ///
    /// Settled records re-enter `Processing` only through a refine pass.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Done | Self::Error)
                | (Self::Done | Self::Error, Self::Processing)
        )
    }
}

/// One uploaded image and its processing outcome.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Unique id.
    pub id: ImageId,
    /// The original upload.
    pub source: Arc<SourceFile>,
    /// The edited image, once one has been received.
    pub processed: Option<EncodedImage>,
    /// Pixel width of the original.
    pub width: u32,
    /// Pixel height of the original.
    pub height: u32,
    /// Current processing state.
    pub status: ImageStatus,
}

impl ImageRecord {
    /// The original file, as uploaded.
    #[must_use]
    pub fn original(&self) -> &SourceFile {
        &self.source
    }
}
