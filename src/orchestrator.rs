//! Batch orchestration of remote edits.
//!
//! Records live in a [`watch`] channel holding the current snapshot. Each
//! per-image task only ever replaces its own entry (matched by id), so
//! completions may land in any order without disturbing sibling records.
//! All per-image futures are joined on the calling task: they interleave at
//! network boundaries but never run in parallel.

use futures::future::join_all;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::client::{EditRequest, EditService, REFINE_INSTRUCTION};
use crate::error::{Error, Result};
use crate::record::{EncodedImage, ImageId, ImageRecord, ImageStatus};

/// A status transition observed on one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Record that changed.
    pub id: ImageId,
    /// Status before.
    pub from: ImageStatus,
    /// Status after.
    pub to: ImageStatus,
}

/// Counts of settled records after a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Records that received a processed image.
    pub done: usize,
    /// Records that ended in error.
    pub failed: usize,
}

impl BatchSummary {
    /// Total records settled by the batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.done + self.failed
    }
}

/// Result of a mask-guided refine pass.
#[derive(Debug)]
pub enum RefineOutcome {
    /// The processed image was replaced.
    Refined,
    /// The service answered without an image; the previous result stands.
    NoResult,
    /// The edit failed; the previous result stands.
    Failed(Error),
}

/// Drives records through `Pending → Processing → Done | Error`.
pub struct Orchestrator<S> {
    service: S,
    records: watch::Sender<Vec<ImageRecord>>,
    events: Option<mpsc::UnboundedSender<StatusChange>>,
}

impl<S: EditService> Orchestrator<S> {
    /// An orchestrator with an empty record set.
    pub fn new(service: S) -> Self {
        let (records, _) = watch::channel(Vec::new());
        Self {
            service,
            records,
            events: None,
        }
    }

    /// Publish every status transition on `events`.
    #[must_use]
    pub fn with_status_events(mut self, events: mpsc::UnboundedSender<StatusChange>) -> Self {
        self.events = Some(events);
        self
    }

    /// The edit service in use.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Replace the record set.
    pub fn load(&self, records: Vec<ImageRecord>) {
        self.records.send_replace(records);
    }

    /// Drop all records.
    pub fn clear(&self) {
        self.records.send_replace(Vec::new());
    }

    /// A copy of the current records.
    pub fn snapshot(&self) -> Vec<ImageRecord> {
        self.records.borrow().clone()
    }

    /// A copy of one record.
    pub fn record(&self, id: &ImageId) -> Option<ImageRecord> {
        self.records.borrow().iter().find(|r| &r.id == id).cloned()
    }

    /// Watch the record set; the receiver sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ImageRecord>> {
        self.records.subscribe()
    }

    /// Send every pending record to the edit service concurrently and wait
    /// until all of them have settled.
    ///
    /// One image failing never affects another.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] (and touches no record) if the
    /// service is not configured.
    pub async fn process_batch(&self) -> Result<BatchSummary> {
        self.service.check_ready()?;

        let pending: Vec<ImageRecord> = self
            .records
            .borrow()
            .iter()
            .filter(|r| r.status == ImageStatus::Pending)
            .cloned()
            .collect();
        info!(count = pending.len(), "processing batch");

        let outcomes = join_all(pending.into_iter().map(|r| self.process_one(r))).await;

        let summary = outcomes
            .into_iter()
            .fold(BatchSummary::default(), |mut acc, status| {
                if status == ImageStatus::Done {
                    acc.done += 1;
                } else {
                    acc.failed += 1;
                }
                acc
            });
        info!(done = summary.done, failed = summary.failed, "batch settled");
        Ok(summary)
    }

    async fn process_one(&self, record: ImageRecord) -> ImageStatus {
        let id = record.id;
        self.transition(&id, ImageStatus::Processing, |_| {});

        let request = EditRequest::new(record.source.to_encoded());
        match self.service.edit(request).await {
            Ok(Some(image)) => {
                debug!(id = %id, bytes = image.data.len(), "image processed");
                self.transition(&id, ImageStatus::Done, |r| r.processed = Some(image));
                ImageStatus::Done
            }
            Ok(None) => {
                warn!(id = %id, name = %record.source.name, "service returned no image");
                self.transition(&id, ImageStatus::Error, |_| {});
                ImageStatus::Error
            }
            Err(e) => {
                error!(id = %id, name = %record.source.name, error = %e, "failed to process image");
                self.transition(&id, ImageStatus::Error, |_| {});
                ImageStatus::Error
            }
        }
    }

    /// Re-process a settled record with the refine instruction and `mask`.
    ///
    /// The original upload (not the previous result) is sent again. On
    /// success the processed image is replaced; otherwise the previous one is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownImage`] for an unknown id, [`Error::NotRefinable`]
    /// if the record is still pending or processing, and [`Error::MissingCredential`]
    /// if the service is not configured. Edit failures are reported as
    /// [`RefineOutcome::Failed`], not as errors.
    pub async fn refine(&self, id: &ImageId, mask: EncodedImage) -> Result<RefineOutcome> {
        let record = self
            .record(id)
            .ok_or_else(|| Error::UnknownImage(id.to_string()))?;
        if record.status.is_busy() {
            return Err(Error::NotRefinable { id: id.to_string() });
        }
        self.service.check_ready()?;

        self.transition(id, ImageStatus::Processing, |_| {});
        let request = EditRequest::new(record.source.to_encoded())
            .with_instruction(REFINE_INSTRUCTION)
            .with_mask(mask);

        match self.service.edit(request).await {
            Ok(Some(image)) => {
                info!(id = %id, "refined image");
                self.transition(id, ImageStatus::Done, |r| r.processed = Some(image));
                Ok(RefineOutcome::Refined)
            }
            Ok(None) => {
                warn!(id = %id, "refine returned no image; keeping previous result");
                let restored = if record.processed.is_some() {
                    ImageStatus::Done
                } else {
                    ImageStatus::Error
                };
                self.transition(id, restored, |_| {});
                Ok(RefineOutcome::NoResult)
            }
            Err(e) => {
                error!(id = %id, error = %e, "refine failed");
                self.transition(id, ImageStatus::Error, |_| {});
                Ok(RefineOutcome::Failed(e))
            }
        }
    }

    /// Replace the record matching `id`, leaving all others untouched.
    fn transition(&self, id: &ImageId, to: ImageStatus, update: impl FnOnce(&mut ImageRecord)) {
        let mut change = None;
        self.records.send_if_modified(|records| {
            let Some(record) = records.iter_mut().find(|r| &r.id == id) else {
                warn!(id = %id, "status update for a record no longer in the batch");
                return false;
            };
            if !record.status.can_become(to) {
                warn!(id = %id, from = ?record.status, to = ?to, "ignoring illegal status transition");
                return false;
            }
            change = Some(StatusChange {
                id: id.clone(),
                from: record.status,
                to,
            });
            record.status = to;
            update(record);
            true
        });

        if let (Some(change), Some(events)) = (change, &self.events) {
            if events.send(change).is_err() {
                debug!(id = %id, "status observer dropped");
            }
        }
    }
}
