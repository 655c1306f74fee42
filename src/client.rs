//! Remote edit client.
//!
//! The [`EditService`] trait is the seam between the orchestrator and the
//! generative image service. [`GeminiClient`] implements it against the Gemini
//! `generateContent` REST endpoint: the image travels as base64 inline data
//! next to a text instruction (the mask joins it only when
//! [`Config::send_mask`] is set), and the first inline image
//! part of the first candidate is the result.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::EncodedImage;

/// Instruction used when the caller does not supply one.
pub const DEFAULT_INSTRUCTION: &str = "Please remove all watermarks, logos, brand names, and \
     overlapping text from this image while preserving the background and subject details \
     perfectly. Ensure the result is clean and natural.";

/// Instruction used for the second, mask-guided pass.
pub const REFINE_INSTRUCTION: &str = "A user has marked specific areas in this image to be \
     removed. Please precisely erase any watermarks, text, or objects that look like overlays \
     in the image, filling them in with a seamless background that matches the surrounding \
     textures perfectly.";

/// One remote edit.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// Image to edit.
    pub image: EncodedImage,
    /// Text instruction; [`DEFAULT_INSTRUCTION`] when absent.
    pub instruction: Option<String>,
    /// Painted mask marking regions of interest.
    pub mask: Option<EncodedImage>,
}

impl EditRequest {
    /// A request with the default instruction and no mask.
    #[must_use]
    pub fn new(image: EncodedImage) -> Self {
        Self {
            image,
            instruction: None,
            mask: None,
        }
    }

    /// Set a custom instruction.
    #[must_use]
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Attach a mask image.
    #[must_use]
    pub fn with_mask(mut self, mask: EncodedImage) -> Self {
        self.mask = Some(mask);
        self
    }

    /// The instruction that will be sent.
    #[must_use]
    pub fn instruction(&self) -> &str {
        self.instruction.as_deref().unwrap_or(DEFAULT_INSTRUCTION)
    }
}

/// A service able to edit images from a text instruction.
///
/// `Ok(None)` means the service answered but produced no image; it is not an error.
/// Implementations do not retry.
#[async_trait]
pub trait EditService: Send + Sync {
    /// Fail fast when the service cannot be called at all (e.g. no credential).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] when no credential is configured.
    fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Perform one edit.
    async fn edit(&self, request: EditRequest) -> Result<Option<EncodedImage>>;
}

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    send_mask: bool,
}

impl GeminiClient {
    /// Build a client from configuration.
    ///
    /// A missing API key is not rejected here; every call fails fast with
    /// [`Error::MissingCredential`] instead.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            send_mask: config.send_mask,
        }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl EditService for GeminiClient {
    fn check_ready(&self) -> Result<()> {
        if self.has_credential() {
            Ok(())
        } else {
            Err(Error::MissingCredential)
        }
    }

    #[instrument(skip_all, fields(model = %self.model, mime = %request.image.mime_type))]
    async fn edit(&self, request: EditRequest) -> Result<Option<EncodedImage>> {
        let api_key = self.api_key.as_deref().ok_or(Error::MissingCredential)?;

        let body = GenerateRequest::from_edit(&request, self.send_mask);
        debug!(
            bytes = request.image.data.len(),
            masked = self.send_mask && request.mask.is_some(),
            "sending edit"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "edit service rejected request");
            return Err(Error::Service {
                status: status.as_u16(),
                message: service_message(&text),
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| Error::MalformedResponse(e.to_string()))?;
        extract_image(parsed, &request.image.mime_type)
    }
}

/// Pull the first inline image out of a response, labelled with `mime_type`.
///
/// # Errors
///
/// Returns [`Error::Base64`] if the inline payload is not valid base64.
pub(crate) fn extract_image(
    response: GenerateResponse,
    mime_type: &str,
) -> Result<Option<EncodedImage>> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        debug!("response has no candidates");
        return Ok(None);
    };
    let inline = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .find_map(|p| p.inline_data);

    match inline {
        Some(blob) => {
            let bytes = STANDARD.decode(blob.data.as_bytes())?;
            Ok(Some(EncodedImage::new(mime_type, bytes)))
        }
        None => {
            debug!("first candidate carries no image part");
            Ok(None)
        }
    }
}

/// Prefer the structured `error.message` of a Gemini error body.
fn service_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest {
    contents: Vec<Content>,
}

impl GenerateRequest {
    fn from_edit(request: &EditRequest, send_mask: bool) -> Self {
        let mut parts = vec![Part::inline(&request.image)];
        if let Some(mask) = request.mask.as_ref().filter(|_| send_mask) {
            parts.push(Part::inline(mask));
        }
        parts.push(Part::text(request.instruction()));
        Self {
            contents: vec![Content { parts }],
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<Blob>,
}

impl Part {
    fn inline(image: &EncodedImage) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: image.mime_type.clone(),
                data: STANDARD.encode(&image.data),
            }),
        }
    }

    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Blob {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
