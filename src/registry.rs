//! Live players, the global volume and the one-shot fallback initialization.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

use futures_util::future::{LocalBoxFuture, Shared};
use futures_util::FutureExt;
use once_cell::unsync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{BackendKind, Capabilities, MediaPlatform};
use crate::config::BackendConfig;
use crate::error::Result;
use crate::player::PlayerCore;
use crate::volume::Volume;

pub type PlayerId = Uuid;

type FallbackInit = Shared<LocalBoxFuture<'static, Result<()>>>;

struct RegistryInner {
    platform: Rc<dyn MediaPlatform>,
    config: BackendConfig,
    capabilities: Capabilities,
    global_volume: Cell<Volume>,
    players: RefCell<Vec<(PlayerId, Weak<PlayerCore>)>>,
    fallback: OnceCell<FallbackInit>,
}

/// Shared handle to the set of live players. Cloning is cheap.
#[derive(Clone)]
pub struct PlayerRegistry {
    inner: Rc<RegistryInner>,
}

impl PlayerRegistry {
    /// Probes the native element once and, when it cannot decode the reference
    /// format, starts loading the fallback right away.
    pub fn new(platform: Rc<dyn MediaPlatform>, config: BackendConfig) -> Result<Self> {
        let probe = platform.create_element(BackendKind::Native)?;
        let capabilities = Capabilities::probe(probe.as_ref(), &config);
        drop(probe);

        let registry = Self {
            inner: Rc::new(RegistryInner {
                platform,
                config,
                capabilities,
                global_volume: Cell::new(Volume::FULL),
                players: RefCell::new(Vec::new()),
                fallback: OnceCell::new(),
            }),
        };

        if registry.inner.capabilities.needs_fallback() {
            registry.fallback_init();
        }
        Ok(registry)
    }

    pub fn with_defaults(platform: Rc<dyn MediaPlatform>) -> Result<Self> {
        Self::new(platform, BackendConfig::default())
    }

    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.inner.capabilities
    }

    pub fn global_volume(&self) -> Volume {
        self.inner.global_volume.get()
    }

    pub fn set_global_volume(&self, volume: impl Into<Volume>) {
        let volume = volume.into();
        self.inner.global_volume.set(volume);
        debug!(global_volume = volume.get(), "global volume changed");
        self.apply_volume_to_all();
    }

    /// Writes every live player's effective volume to its element.
    pub fn apply_volume_to_all(&self) {
        let global = self.global_volume();
        for core in self.live_players() {
            core.apply_local_volume(global);
        }
    }

    pub fn len(&self) -> usize {
        self.live_players().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.inner
            .players
            .borrow()
            .iter()
            .any(|(candidate, core)| *candidate == id && core.strong_count() > 0)
    }

    /// Resolves once the fallback backend is ready. Every caller shares the
    /// same initialization; the platform loader runs at most once.
    pub fn fallback_ready(&self) -> impl Future<Output = Result<()>> + 'static {
        self.fallback_init().clone()
    }

    fn fallback_init(&self) -> &FallbackInit {
        self.inner.fallback.get_or_init(|| {
            info!(
                script = %self.inner.config.fallback_script_url,
                "loading fallback media backend"
            );
            let load = self.inner.platform.load_fallback();
            async move {
                let result = load.await;
                match &result {
                    Ok(()) => info!("fallback media backend ready"),
                    Err(err) => warn!(error = %err, "fallback media backend failed to load"),
                }
                result
            }
            .boxed_local()
            .shared()
        })
    }

    pub(crate) fn platform(&self) -> &Rc<dyn MediaPlatform> {
        &self.inner.platform
    }

    pub(crate) fn register(&self, id: PlayerId, core: Weak<PlayerCore>) {
        self.inner.players.borrow_mut().push((id, core));
    }

    pub(crate) fn unregister(&self, id: PlayerId) {
        self.inner
            .players
            .borrow_mut()
            .retain(|(candidate, core)| *candidate != id && core.strong_count() > 0);
    }

    fn live_players(&self) -> Vec<Rc<PlayerCore>> {
        let mut players = self.inner.players.borrow_mut();
        players.retain(|(_, core)| core.strong_count() > 0);
        players.iter().filter_map(|(_, core)| core.upgrade()).collect()
    }
}
