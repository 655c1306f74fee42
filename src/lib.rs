//! Batch watermark eraser backed by a generative image model.
//!
//! Uploaded images are sent, concurrently, to a remote image-editing model
//! with an instruction to erase watermarks, logos and overlaid text. Any
//! result can then be refined: the user paints a mask over the regions that
//! still need work and the original is sent again with a targeted instruction.
//!
//! # Quick Start
//!
//! ```no_run
//! use pixel_clear::{Config, GeminiClient, Orchestrator, SourceFile, Workspace};
//!
//! # async fn run() -> pixel_clear::Result<()> {
//! let config = Config::from_env();
//! let mut workspace = Workspace::new(Orchestrator::new(GeminiClient::new(&config)));
//! let file = SourceFile::from_path("photo.jpg".as_ref())?;
//! if let Some(summary) = workspace.upload(vec![file]).await? {
//!     println!("{} cleared, {} failed", summary.done, summary.failed);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Refining
//!
//! ```no_run
//! use pixel_clear::{Point, Viewport, Workspace, EditService};
//!
//! # async fn refine<S: EditService>(workspace: &mut Workspace<S>) -> pixel_clear::Result<()> {
//! let id = workspace.records()[0].id.clone();
//! workspace.start_refine(&id, Viewport::new(800.0, 600.0))?;
//! if let Some(editor) = workspace.editor_mut() {
//!     editor.pointer_down(Point::new(40.0, 40.0));
//!     editor.pointer_move(Point::new(120.0, 60.0));
//!     editor.pointer_up();
//! }
//! workspace.finish_refine().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod config;
pub mod editor;
pub mod error;
pub mod intake;
pub mod orchestrator;
pub mod presentation;
pub mod record;
pub mod workspace;

#[cfg(test)]
mod test_support;

pub use client::{EditRequest, EditService, GeminiClient, DEFAULT_INSTRUCTION, REFINE_INSTRUCTION};
pub use config::Config;
pub use editor::{
    fit_to_viewport, parse_strokes, EditorState, MaskEditor, Point, PointerEvent, PointerInput,
    Stroke, Viewport,
};
pub use error::{Error, Result};
pub use intake::{intake, is_image_mime};
pub use orchestrator::{BatchSummary, Orchestrator, RefineOutcome, StatusChange};
pub use presentation::{
    default_output_path, download_plan, export_all, export_one, tile_view, DownloadJob, TileView,
};
pub use record::{EncodedImage, ImageId, ImageRecord, ImageStatus, SourceFile};
pub use workspace::{AppPhase, Session, Workspace};
