//! Media backend seam: the element a player drives and the platform that makes
//! elements, temporary resource handles and the fallback decoder.

use std::rc::Rc;

use futures_util::future::LocalBoxFuture;

use crate::error::Result;

mod capabilities;
#[cfg(target_arch = "wasm32")]
mod web_backend;

pub use capabilities::Capabilities;
#[cfg(target_arch = "wasm32")]
pub use web_backend::WebPlatform;

/// Which engine backs a media handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Native,
    Fallback,
}

/// Answer of `canPlayType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanPlay {
    No,
    Maybe,
    Probably,
}

impl CanPlay {
    pub fn from_answer(answer: &str) -> Self {
        match answer {
            "probably" => CanPlay::Probably,
            "maybe" => CanPlay::Maybe,
            _ => CanPlay::No,
        }
    }

    pub fn is_playable(self) -> bool {
        self != CanPlay::No
    }
}

/// The subset of a media element a player drives.
///
/// Setters take `&self`; implementations hold interior state the same way a
/// DOM element does. `play` and `pause` return `'static` futures so they can be
/// awaited without keeping the element borrowed.
pub trait MediaElement {
    fn kind(&self) -> BackendKind;

    fn can_play_type(&self, content_type: &str) -> CanPlay;

    fn src(&self) -> String;
    fn set_src(&self, src: &str);
    fn set_preload(&self, preload: &str);
    fn load(&self);

    fn play(&self) -> LocalBoxFuture<'static, Result<()>>;
    fn pause(&self) -> LocalBoxFuture<'static, Result<()>>;

    fn muted(&self) -> bool;
    fn set_muted(&self, muted: bool);

    fn volume(&self) -> f64;
    fn set_volume(&self, volume: f64);

    fn looping(&self) -> bool;
    fn set_looping(&self, looping: bool);

    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
}

/// Platform services a registry is built on.
pub trait MediaPlatform {
    /// Creates a fresh element. `Fallback` is only requested after
    /// [`MediaPlatform::load_fallback`] has resolved.
    fn create_element(&self, kind: BackendKind) -> Result<Rc<dyn MediaElement>>;

    /// Wraps `bytes` in a byte container tagged with `content_type` and returns
    /// a temporary URL for it.
    fn create_object_url(&self, bytes: &[u8], content_type: &str) -> Result<String>;

    fn revoke_object_url(&self, url: &str);

    /// Starts loading the fallback decoder. Called at most once per registry.
    fn load_fallback(&self) -> LocalBoxFuture<'static, Result<()>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_play_answers() {
        assert_eq!(CanPlay::from_answer(""), CanPlay::No);
        assert!(CanPlay::from_answer("maybe").is_playable());
        assert!(CanPlay::from_answer("probably").is_playable());
        assert!(!CanPlay::from_answer("no").is_playable());
    }
}
