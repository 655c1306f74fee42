//! Runtime configuration.

use std::time::Duration;

use crate::editor::{Viewport, DEFAULT_BRUSH_SIZE};

/// Default image-output model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Default API root for the Gemini REST service.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default delay increment between staggered downloads.
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(300);

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Options controlling remote processing, editing and export.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the edit service. Checked on every call.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Service root URL.
    pub base_url: String,
    /// Viewport the mask editor fits images into.
    pub viewport: Viewport,
    /// Initial brush size of the mask editor.
    pub brush_size: f32,
    /// Delay increment between downloads in "download all".
    pub stagger: Duration,
    /// Attach the painted mask to refine requests as a second image part.
    /// Off by default: the service then sees only the image and the instruction.
    pub send_mask: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            viewport: Viewport::default(),
            brush_size: DEFAULT_BRUSH_SIZE,
            stagger: DEFAULT_STAGGER,
            send_mask: false,
        }
    }
}

impl Config {
    /// Defaults overlaid with `GEMINI_API_KEY`/`API_KEY`, `PIXELCLEAR_MODEL`,
    /// `PIXELCLEAR_BASE_URL` and `PIXELCLEAR_SEND_MASK` (`1`/`true`/`yes`).
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self {
            api_key: API_KEY_VARS.iter().find_map(|k| non_empty(k)),
            ..Self::default()
        };
        if let Some(model) = non_empty("PIXELCLEAR_MODEL") {
            config.model = model;
        }
        if let Some(url) = non_empty("PIXELCLEAR_BASE_URL") {
            config.base_url = url;
        }
        if let Some(flag) = non_empty("PIXELCLEAR_SEND_MASK") {
            config.send_mask = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        config
    }
}
