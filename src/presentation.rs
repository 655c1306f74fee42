//! Result presentation: what each tile shows and how results are exported.

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::DynamicImage;
use tracing::{debug, info};

use crate::error::Result;
use crate::record::{ImageRecord, ImageStatus, SourceFile};

/// File name used when saving a single processed image.
pub const SINGLE_EXPORT_NAME: &str = "processed.png";

/// Blur radius applied to originals behind the processing indicator.
pub const PROCESSING_BLUR_SIGMA: f32 = 8.0;

/// What a tile renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileView {
    /// Blurred original under a processing indicator.
    Processing,
    /// The original upload (processed image held back while pressed).
    Original,
    /// The processed image.
    Processed,
    /// Original with a failure marker.
    Failed,
}

/// Choose the tile content for `record`, given whether the user is pressing it.
#[must_use]
pub fn tile_view(record: &ImageRecord, pressed: bool) -> TileView {
    match record.status {
        ImageStatus::Pending | ImageStatus::Processing => TileView::Processing,
        ImageStatus::Done if pressed => TileView::Original,
        ImageStatus::Done => TileView::Processed,
        ImageStatus::Error => TileView::Failed,
    }
}

/// Blurred copy of the original shown while a record is in flight.
///
/// # Errors
///
/// Returns [`crate::Error::Image`] if the original cannot be decoded.
pub fn blurred_preview(source: &SourceFile, sigma: f32) -> Result<DynamicImage> {
    Ok(image::load_from_memory(&source.bytes)?.blur(sigma))
}

/// One staggered download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Index of the record in the batch.
    pub index: usize,
    /// Target file name, `cleared_<index + 1>.png`.
    pub file_name: String,
    /// Delay before the download starts, counted from "download all".
    pub delay: Duration,
}

/// Plan "download all": one job per processed record, staggered by `stagger`
/// per batch position so the host does not suppress simultaneous downloads.
#[must_use]
pub fn download_plan(records: &[ImageRecord], stagger: Duration) -> Vec<DownloadJob> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.processed.is_some())
        .map(|(index, _)| DownloadJob {
            index,
            file_name: format!("cleared_{}.png", index + 1),
            delay: stagger * u32::try_from(index).unwrap_or(u32::MAX),
        })
        .collect()
}

/// Label of the "download all" action, present only once some record is done.
#[must_use]
pub fn download_all_label(records: &[ImageRecord]) -> Option<String> {
    records
        .iter()
        .any(|r| r.status == ImageStatus::Done)
        .then(|| format!("Download All ({})", records.len()))
}

/// Write one record's processed image to `path`. Returns `false` if there is nothing to write.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if the file cannot be written.
pub async fn export_one(record: &ImageRecord, path: &Path) -> Result<bool> {
    let Some(processed) = &record.processed else {
        return Ok(false);
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, &processed.data).await?;
    debug!(id = %record.id, path = %path.display(), "exported image");
    Ok(true)
}

/// Default output path for a refined single image.
///
/// Example: `"photo.jpg"` becomes `"photo_cleared.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_cleared.png"))
}

/// Run the download plan into `dir`, honouring each job's delay.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] on the first write that fails.
pub async fn export_all(
    records: &[ImageRecord],
    dir: &Path,
    stagger: Duration,
) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;
    let start = tokio::time::Instant::now();
    let mut written = Vec::new();
    for job in download_plan(records, stagger) {
        tokio::time::sleep_until(start + job.delay).await;
        let path = dir.join(&job.file_name);
        if export_one(&records[job.index], &path).await? {
            written.push(path);
        }
    }
    info!(count = written.len(), dir = %dir.display(), "exported results");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::intake;
    use crate::record::EncodedImage;
    use crate::test_support::png_file;

    fn records(statuses: &[ImageStatus]) -> Vec<ImageRecord> {
        let files = (0..statuses.len())
            .map(|i| png_file(&format!("{i}.png"), 4, 4))
            .collect();
        let mut records = intake(files).unwrap();
        for (r, status) in records.iter_mut().zip(statuses) {
            r.status = *status;
            if *status == ImageStatus::Done {
                r.processed = Some(EncodedImage::new("image/png", r.source.name.clone().into_bytes()));
            }
        }
        records
    }

    #[test]
    fn busy_tiles_ignore_press() {
        for status in [ImageStatus::Pending, ImageStatus::Processing] {
            let r = &records(&[status])[0];
            assert_eq!(tile_view(r, false), TileView::Processing);
            assert_eq!(tile_view(r, true), TileView::Processing);
        }
    }

    #[test]
    fn done_tile_shows_original_while_pressed() {
        let r = &records(&[ImageStatus::Done])[0];
        assert_eq!(tile_view(r, false), TileView::Processed);
        assert_eq!(tile_view(r, true), TileView::Original);
    }

    #[test]
    fn error_tile_shows_failure() {
        let r = &records(&[ImageStatus::Error])[0];
        assert_eq!(tile_view(r, false), TileView::Failed);
        assert_eq!(tile_view(r, true), TileView::Failed);
    }

    #[test]
    fn blurred_preview_keeps_dimensions() {
        let file = png_file("p.png", 12, 7);
        let preview = blurred_preview(&file, PROCESSING_BLUR_SIGMA).unwrap();
        assert_eq!((preview.width(), preview.height()), (12, 7));
    }

    #[test]
    fn plan_skips_unprocessed_and_staggers_by_position() {
        let rs = records(&[ImageStatus::Done, ImageStatus::Error, ImageStatus::Done]);
        let plan = download_plan(&rs, Duration::from_millis(300));
        assert_eq!(
            plan,
            vec![
                DownloadJob {
                    index: 0,
                    file_name: "cleared_1.png".into(),
                    delay: Duration::ZERO,
                },
                DownloadJob {
                    index: 2,
                    file_name: "cleared_3.png".into(),
                    delay: Duration::from_millis(600),
                },
            ]
        );
    }

    #[test]
    fn download_all_needs_one_done_record() {
        let rs = records(&[ImageStatus::Error, ImageStatus::Done, ImageStatus::Error]);
        assert_eq!(download_all_label(&rs).as_deref(), Some("Download All (3)"));

        let rs = records(&[ImageStatus::Error, ImageStatus::Error]);
        assert_eq!(download_all_label(&rs), None);
        assert_eq!(download_all_label(&[]), None);
    }

    #[test]
    fn default_output_path_appends_cleared_suffix() {
        let p = default_output_path(Path::new("/tmp/photo.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/photo_cleared.png"));

        let p = default_output_path(Path::new("image.webp"));
        assert_eq!(p.file_name().unwrap().to_str().unwrap(), "image_cleared.png");
    }

    #[tokio::test(start_paused = true)]
    async fn export_all_writes_staggered_files() {
        let dir = tempfile::tempdir().unwrap();
        let rs = records(&[ImageStatus::Done, ImageStatus::Error, ImageStatus::Done]);
        let started = tokio::time::Instant::now();
        let written = export_all(&rs, dir.path(), Duration::from_millis(300))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(600));
        assert_eq!(
            written,
            vec![dir.path().join("cleared_1.png"), dir.path().join("cleared_3.png")]
        );
        assert_eq!(std::fs::read(&written[1]).unwrap(), b"2.png");
    }

    #[tokio::test]
    async fn export_one_without_result_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let r = &records(&[ImageStatus::Error])[0];
        let path = dir.path().join(SINGLE_EXPORT_NAME);
        assert!(!export_one(r, &path).await.unwrap());
        assert!(!path.exists());
    }
}
