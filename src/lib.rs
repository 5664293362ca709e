//! blobsound - plays encoded audio blobs through the platform media element.
//!
//! A [`PlayerRegistry`] is created once at startup from a [`MediaPlatform`]
//! and handed to every [`Player`]. It owns the global volume and decides, once,
//! whether sources need the fallback decoder instead of the native element.
//!
//! ```ignore
//! let registry = PlayerRegistry::with_defaults(Rc::new(WebPlatform::new(BackendConfig::default())))?;
//! let player = Player::new(&registry)?;
//! player.open(bytes, "audio/ogg")?;
//! player.play().await?;
//! registry.set_global_volume(50_000);
//! ```

pub mod backend;
pub mod config;
mod diagnostics;
pub mod error;
pub mod player;
pub mod registry;
pub mod task_queue;
pub mod volume;

pub use backend::{BackendKind, CanPlay, Capabilities, MediaElement, MediaPlatform};
#[cfg(target_arch = "wasm32")]
pub use backend::WebPlatform;
pub use config::BackendConfig;
pub use error::{PlayerError, Result};
pub use player::{LoadStatus, Player};
pub use registry::{PlayerId, PlayerRegistry};
pub use task_queue::TaskQueue;
pub use volume::{effective_volume, Volume};
