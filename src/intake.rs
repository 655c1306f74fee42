//! Image intake: turn user-selected files into pending records.

use std::io::Cursor;
use std::sync::Arc;

use image::ImageReader;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{ImageId, ImageRecord, ImageStatus, SourceFile};

/// Whether a declared mimetype names an image.
#[must_use]
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

/// Read pixel dimensions from an encoded image header without decoding pixels.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the format cannot be recognised or the header is invalid.
pub fn probe_dimensions(file: &SourceFile) -> Result<(u32, u32)> {
    let decode_err = |source| Error::Decode {
        name: file.name.clone(),
        source,
    };
    ImageReader::new(Cursor::new(&file.bytes))
        .with_guessed_format()
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?
        .into_dimensions()
        .map_err(decode_err)
}

/// Accept the image files of an upload and build a pending record for each.
///
/// Files whose declared type is not `image/*` are dropped silently. An empty
/// result means nothing was accepted and the caller should leave its state alone.
///
/// # Errors
///
/// Returns [`Error::Decode`] if an accepted file's dimensions cannot be read.
pub fn intake(files: Vec<SourceFile>) -> Result<Vec<ImageRecord>> {
    let total = files.len();
    let accepted: Vec<SourceFile> = files
        .into_iter()
        .filter(|f| {
            let keep = is_image_mime(&f.mime_type);
            if !keep {
                debug!(name = %f.name, mime = %f.mime_type, "dropping non-image file");
            }
            keep
        })
        .collect();

    #[cfg(feature = "cli")]
    let records: Result<Vec<ImageRecord>> = {
        use rayon::prelude::*;
        accepted.into_par_iter().map(make_record).collect()
    };

    #[cfg(not(feature = "cli"))]
    let records: Result<Vec<ImageRecord>> = accepted.into_iter().map(make_record).collect();

    let records = records?;
    info!(accepted = records.len(), total, "intake complete");
    Ok(records)
}

fn make_record(file: SourceFile) -> Result<ImageRecord> {
    let (width, height) = probe_dimensions(&file)?;
    Ok(ImageRecord {
        id: ImageId::generate(),
        source: Arc::new(file),
        processed: None,
        width,
        height,
        status: ImageStatus::Pending,
    })
}
