use tracing::info;

use super::{BackendKind, CanPlay, MediaElement};
use crate::config::{essence, BackendConfig};

/// Result of the one-time capability probe, cached by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    reference_content_type: String,
    native_reference: CanPlay,
    fallback_content_types: Vec<String>,
}

impl Capabilities {
    pub fn probe(native: &dyn MediaElement, config: &BackendConfig) -> Self {
        let native_reference = native.can_play_type(&config.reference_content_type);
        info!(
            reference = %config.reference_content_type,
            answer = ?native_reference,
            "probed native media element"
        );
        Self {
            reference_content_type: config.reference_content_type.clone(),
            native_reference,
            fallback_content_types: config.fallback_content_types.clone(),
        }
    }

    pub fn reference_content_type(&self) -> &str {
        &self.reference_content_type
    }

    /// Whether the native element failed the reference format.
    pub fn needs_fallback(&self) -> bool {
        !self.native_reference.is_playable()
    }

    /// Backend that should play `content_type`.
    pub fn negotiate(&self, content_type: &str) -> BackendKind {
        let essence = essence(content_type);
        let routed = self
            .fallback_content_types
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(essence));
        if routed && self.needs_fallback() {
            BackendKind::Fallback
        } else {
            BackendKind::Native
        }
    }
}
