//! Backend configuration. Every field has a default so partial JSON loads.

use serde::{Deserialize, Serialize};

/// Settings for backend negotiation and the fallback decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Format probed once at startup to decide whether the fallback is needed.
    #[serde(default = "default_reference_content_type")]
    pub reference_content_type: String,
    /// Content types routed to the fallback when the native element rejects them.
    #[serde(default = "default_fallback_content_types")]
    pub fallback_content_types: Vec<String>,
    #[serde(default = "default_fallback_script_url")]
    pub fallback_script_url: String,
    /// Enable compiled-bytecode execution in the fallback decoder.
    #[serde(default = "default_true")]
    pub fallback_wasm: bool,
    /// Enable multi-threaded decoding in the fallback decoder.
    #[serde(default = "default_true")]
    pub fallback_threading: bool,
    #[serde(default = "default_preload")]
    pub preload: String,
}

fn default_reference_content_type() -> String {
    "audio/ogg".to_string()
}

fn default_fallback_content_types() -> Vec<String> {
    vec![default_reference_content_type()]
}

fn default_fallback_script_url() -> String {
    "ogvjs/ogv.js".to_string()
}

fn default_true() -> bool {
    true
}

fn default_preload() -> String {
    "auto".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            reference_content_type: default_reference_content_type(),
            fallback_content_types: default_fallback_content_types(),
            fallback_script_url: default_fallback_script_url(),
            fallback_wasm: true,
            fallback_threading: true,
            preload: default_preload(),
        }
    }
}

impl BackendConfig {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Strips MIME parameters: `audio/ogg; codecs=opus` -> `audio/ogg`.
pub fn essence(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}
