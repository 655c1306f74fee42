//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};

use crate::client::{EditRequest, EditService};
use crate::error::{Error, Result};
use crate::record::{EncodedImage, SourceFile};

/// A PNG whose pixel color is derived from its name, so distinct names give distinct bytes.
pub(crate) fn png_file(name: &str, width: u32, height: u32) -> SourceFile {
    let hash = name
        .bytes()
        .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
    let [r, g, b, _] = hash.to_le_bytes();
    let img = RgbImage::from_pixel(width, height, Rgb([r, g, b]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    SourceFile::new(name, "image/png", buf.into_inner())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Outcome {
    #[default]
    Image,
    Empty,
    Fail,
}

/// An edit service answering from a script keyed by the request's image bytes.
#[derive(Default)]
pub(crate) struct ScriptedService {
    outcomes: HashMap<Vec<u8>, Outcome>,
    delays: HashMap<Vec<u8>, Duration>,
    fallback: Mutex<Outcome>,
    unconfigured: bool,
    calls: AtomicUsize,
    last: Mutex<Option<EditRequest>>,
}

impl ScriptedService {
    pub(crate) fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Self::default()
        }
    }

    pub(crate) fn with(mut self, file: &SourceFile, outcome: Outcome) -> Self {
        self.outcomes.insert(file.bytes.clone(), outcome);
        self
    }

    pub(crate) fn delay(mut self, file: &SourceFile, delay: Duration) -> Self {
        self.delays.insert(file.bytes.clone(), delay);
        self
    }

    pub(crate) fn set_default(&self, outcome: Outcome) {
        *self.fallback.lock().unwrap() = outcome;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<EditRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl EditService for ScriptedService {
    fn check_ready(&self) -> Result<()> {
        if self.unconfigured {
            Err(Error::MissingCredential)
        } else {
            Ok(())
        }
    }

    async fn edit(&self, request: EditRequest) -> Result<Option<EncodedImage>> {
        self.check_ready()?;
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let key = request.image.data.to_vec();
        let mime = request.image.mime_type.clone();
        *self.last.lock().unwrap() = Some(request);

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        let outcome = self
            .outcomes
            .get(&key)
            .copied()
            .unwrap_or_else(|| *self.fallback.lock().unwrap());
        match outcome {
            Outcome::Image => Ok(Some(EncodedImage::new(mime, format!("edited-{n}").into_bytes()))),
            Outcome::Empty => Ok(None),
            Outcome::Fail => Err(Error::Service {
                status: 500,
                message: "scripted failure".to_string(),
            }),
        }
    }
}
