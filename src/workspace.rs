//! The session-wide state holder.
//!
//! [`Workspace`] owns the orchestrator, the global [`AppPhase`], the single
//! editor session and the top-level notice. The editor session is stored
//! inside the refining phase itself, so "refining" and "one active session"
//! cannot drift apart.

use std::time::Duration;

use tracing::{info, warn};

use crate::client::EditService;
use crate::editor::{MaskEditor, Viewport};
use crate::error::{Error, Result};
use crate::intake::intake;
use crate::orchestrator::{BatchSummary, Orchestrator, RefineOutcome};
use crate::presentation::{download_all_label, download_plan, DownloadJob};
use crate::record::{ImageId, ImageRecord, ImageStatus, SourceFile};

/// Notice shown when a refine pass fails.
pub const REFINE_FAILED_NOTICE: &str = "Refinement failed.";

/// Global mode of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    /// Waiting for an upload.
    Idle,
    /// Remote edits are in flight.
    Processing,
    /// Results are on screen.
    Result,
    /// The mask editor is open for one image.
    Refining,
}

impl AppPhase {
    /// Whether the workspace may move from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (_, Self::Idle)
                | (Self::Idle | Self::Refining, Self::Processing)
                | (Self::Processing | Self::Refining, Self::Result)
                | (Self::Result, Self::Refining)
        )
    }
}

/// Editor session for one record.
pub struct Session {
    /// Record being refined.
    pub image_id: ImageId,
    /// Mask editor for that record.
    pub editor: MaskEditor,
}

enum PhaseState {
    Idle,
    Processing,
    Result,
    Refining(Session),
}

impl PhaseState {
    fn phase(&self) -> AppPhase {
        match self {
            Self::Idle => AppPhase::Idle,
            Self::Processing => AppPhase::Processing,
            Self::Result => AppPhase::Result,
            Self::Refining(_) => AppPhase::Refining,
        }
    }
}

/// Session-wide state: records, phase, editor session and notice.
pub struct Workspace<S> {
    orchestrator: Orchestrator<S>,
    state: PhaseState,
    notice: Option<String>,
}

impl<S: EditService> Workspace<S> {
    /// An idle workspace around `orchestrator`.
    pub fn new(orchestrator: Orchestrator<S>) -> Self {
        Self {
            orchestrator,
            state: PhaseState::Idle,
            notice: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> AppPhase {
        self.state.phase()
    }

    /// Top-level notice, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// The orchestrator driving remote edits.
    pub fn orchestrator(&self) -> &Orchestrator<S> {
        &self.orchestrator
    }

    /// A copy of the current records.
    pub fn records(&self) -> Vec<ImageRecord> {
        self.orchestrator.snapshot()
    }

    /// Active editor session, when refining.
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            PhaseState::Refining(session) => Some(session),
            _ => None,
        }
    }

    /// Active editor, when refining.
    pub fn editor_mut(&mut self) -> Option<&mut MaskEditor> {
        match &mut self.state {
            PhaseState::Refining(session) => Some(&mut session.editor),
            _ => None,
        }
    }

    fn enter(&mut self, next: PhaseState) -> Result<()> {
        let (from, to) = (self.phase(), next.phase());
        if !from.can_transition_to(to) {
            return Err(Error::InvalidTransition { from, to });
        }
        info!(from = ?from, to = ?to, "phase change");
        self.state = next;
        Ok(())
    }

    /// Accept an upload and process it.
    ///
    /// Returns `None` (and changes nothing) when no file is an image.
    /// Otherwise the workspace passes through `Processing` and lands in
    /// `Result` once every image has settled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside `Idle`,
    /// [`Error::MissingCredential`] if the service is not configured (the
    /// workspace stays idle), and [`Error::Decode`] for an unreadable image.
    pub async fn upload(&mut self, files: Vec<SourceFile>) -> Result<Option<BatchSummary>> {
        if self.phase() != AppPhase::Idle {
            return Err(Error::InvalidTransition {
                from: self.phase(),
                to: AppPhase::Processing,
            });
        }
        let records = intake(files)?;
        if records.is_empty() {
            return Ok(None);
        }

        self.notice = None;
        if let Err(e) = self.orchestrator.service().check_ready() {
            self.notice = Some(e.to_string());
            return Err(e);
        }

        self.enter(PhaseState::Processing)?;
        self.orchestrator.load(records);
        let summary = self.orchestrator.process_batch().await;
        self.enter(PhaseState::Result)?;
        summary.map(Some)
    }

    /// Open the mask editor for a processed record.
    ///
    /// A record whose last refine failed still holds its earlier result and
    /// may be refined again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside `Result`,
    /// [`Error::UnknownImage`] / [`Error::NotRefinable`] for a missing or
    /// unprocessed record, and [`Error::Image`] if the original cannot be decoded.
    pub fn start_refine(&mut self, id: &ImageId, viewport: Viewport) -> Result<()> {
        if !self.phase().can_transition_to(AppPhase::Refining) {
            return Err(Error::InvalidTransition {
                from: self.phase(),
                to: AppPhase::Refining,
            });
        }
        let record = self
            .orchestrator
            .record(id)
            .ok_or_else(|| Error::UnknownImage(id.to_string()))?;
        let refinable = match record.status {
            ImageStatus::Done => true,
            ImageStatus::Error => record.processed.is_some(),
            ImageStatus::Pending | ImageStatus::Processing => false,
        };
        if !refinable {
            return Err(Error::NotRefinable { id: id.to_string() });
        }
        let editor = MaskEditor::open(&record.source, viewport)?;
        self.enter(PhaseState::Refining(Session {
            image_id: id.clone(),
            editor,
        }))
    }

    /// Close the editor without exporting a mask.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] when no session is active.
    pub fn cancel_refine(&mut self) -> Result<()> {
        let session = self.take_session(AppPhase::Result)?;
        session.editor.cancel();
        self.state = PhaseState::Result;
        Ok(())
    }

    /// Export the mask, close the editor and run the refine pass.
    ///
    /// Failures of the remote edit set the [`REFINE_FAILED_NOTICE`] notice and
    /// keep the previous result. The workspace always returns to `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] when no session is active, and
    /// mask encoding or configuration errors.
    pub async fn finish_refine(&mut self) -> Result<RefineOutcome> {
        let session = self.take_session(AppPhase::Processing)?;
        self.state = PhaseState::Processing;

        let outcome = match session.editor.save() {
            Ok(mask) => self.orchestrator.refine(&session.image_id, mask).await,
            Err(e) => Err(e),
        };
        self.state = PhaseState::Result;

        match outcome {
            Ok(RefineOutcome::Failed(e)) => {
                warn!(id = %session.image_id, error = %e, "refinement failed");
                self.notice = Some(REFINE_FAILED_NOTICE.to_string());
                Ok(RefineOutcome::Failed(e))
            }
            Ok(other) => Ok(other),
            Err(e) => {
                self.notice = Some(REFINE_FAILED_NOTICE.to_string());
                Err(e)
            }
        }
    }

    fn take_session(&mut self, to: AppPhase) -> Result<Session> {
        match std::mem::replace(&mut self.state, PhaseState::Idle) {
            PhaseState::Refining(session) => Ok(session),
            other => {
                let from = other.phase();
                self.state = other;
                Err(Error::InvalidTransition { from, to })
            }
        }
    }

    /// Drop everything and return to `Idle`.
    pub fn reset(&mut self) {
        if let PhaseState::Refining(session) = std::mem::replace(&mut self.state, PhaseState::Idle) {
            session.editor.cancel();
        }
        self.orchestrator.clear();
        self.notice = None;
        info!("workspace reset");
    }

    /// Staggered downloads for every processed record.
    pub fn download_plan(&self, stagger: Duration) -> Vec<DownloadJob> {
        download_plan(&self.records(), stagger)
    }

    /// "Download all" label; only offered in `Result` with at least one done record.
    pub fn download_all_label(&self) -> Option<String> {
        if self.phase() != AppPhase::Result {
            return None;
        }
        download_all_label(&self.records())
    }
}
