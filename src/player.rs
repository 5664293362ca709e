//! A single playable media handle with its task queue and volume state.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info};
use uuid::Uuid;
use web_time::Instant;

use crate::backend::{BackendKind, MediaElement, MediaPlatform};
use crate::diagnostics::log_perf;
use crate::error::{PlayerError, Result};
use crate::registry::{PlayerId, PlayerRegistry};
use crate::task_queue::TaskQueue;
use crate::volume::{effective_volume, Volume};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Unloaded,
    Loaded,
}

/// State shared between a [`Player`], its queued tasks and the registry.
pub(crate) struct PlayerCore {
    element: RefCell<Rc<dyn MediaElement>>,
    object_url: RefCell<Option<String>>,
    volume: Cell<Volume>,
    volume2: Cell<Volume>,
    status: Cell<LoadStatus>,
    opened: Cell<bool>,
    disposed: Cell<bool>,
}

impl PlayerCore {
    fn element(&self) -> Rc<dyn MediaElement> {
        self.element.borrow().clone()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed.get() {
            Err(PlayerError::Disposed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn apply_local_volume(&self, global: Volume) {
        if self.disposed.get() {
            return;
        }
        let volume = effective_volume(self.volume.get(), self.volume2.get(), global);
        self.element().set_volume(volume);
    }

    fn revoke_object_url(&self, platform: &dyn MediaPlatform) {
        if let Some(url) = self.object_url.borrow_mut().take() {
            platform.revoke_object_url(&url);
        }
    }
}

/// Plays one encoded audio source.
///
/// `play`, `pause` and `stop` run through a FIFO task queue and return once the
/// queue is empty, so they observe every earlier operation on this player.
/// `open` only enqueues; its outcome surfaces from the next drain.
pub struct Player {
    id: PlayerId,
    core: Rc<PlayerCore>,
    queue: TaskQueue,
    registry: PlayerRegistry,
}

impl Player {
    pub fn new(registry: &PlayerRegistry) -> Result<Self> {
        let element = registry.platform().create_element(BackendKind::Native)?;
        let core = Rc::new(PlayerCore {
            element: RefCell::new(element),
            object_url: RefCell::new(None),
            volume: Cell::new(Volume::FULL),
            volume2: Cell::new(Volume::FULL),
            status: Cell::new(LoadStatus::Unloaded),
            opened: Cell::new(false),
            disposed: Cell::new(false),
        });
        let id = Uuid::new_v4();
        registry.register(id, Rc::downgrade(&core));
        core.apply_local_volume(registry.global_volume());
        debug!(%id, "player created");

        Ok(Self {
            id,
            core,
            queue: TaskQueue::new(),
            registry: registry.clone(),
        })
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn status(&self) -> LoadStatus {
        self.core.status.get()
    }

    pub fn is_opened(&self) -> bool {
        self.core.opened.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.core.disposed.get()
    }

    pub fn backend(&self) -> BackendKind {
        self.core.element().kind()
    }

    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    /// Queues binding `bytes` as the new source. Does not start playback.
    pub fn open(&self, bytes: impl Into<Vec<u8>>, content_type: &str) -> Result<()> {
        self.core.ensure_live()?;
        let bytes = bytes.into();
        let content_type = content_type.to_string();
        let core = self.core.clone();
        let registry = self.registry.clone();
        let id = self.id;
        debug!(%id, %content_type, len = bytes.len(), "open queued");
        self.queue.enqueue(async move {
            open_source(id, &core, &registry, &bytes, &content_type).await
        });
        Ok(())
    }

    pub async fn play(&self) -> Result<()> {
        self.core.ensure_live()?;
        let core = self.core.clone();
        self.queue.enqueue(async move {
            core.ensure_live()?;
            let element = core.element();
            element.play().await
        });
        self.queue.drain().await
    }

    /// Pauses with output muted around the backend call.
    pub async fn pause(&self) -> Result<()> {
        self.core.ensure_live()?;
        self.queue.enqueue(muted_pause(self.core.clone()));
        self.queue.drain().await
    }

    /// Pauses and rewinds to the start.
    pub async fn stop(&self) -> Result<()> {
        self.core.ensure_live()?;
        self.queue.enqueue(muted_pause(self.core.clone()));
        let core = self.core.clone();
        self.queue.enqueue(async move {
            core.ensure_live()?;
            core.element().set_current_time(0.0);
            Ok(())
        });
        self.queue.drain().await
    }

    /// Waits for every queued task, including pending `open`s.
    pub async fn flush(&self) -> Result<()> {
        self.queue.drain().await
    }

    pub fn volume(&self) -> Volume {
        self.core.volume.get()
    }

    pub fn set_volume(&self, volume: impl Into<Volume>) {
        self.core.volume.set(volume.into());
        self.core.apply_local_volume(self.registry.global_volume());
    }

    pub fn volume2(&self) -> Volume {
        self.core.volume2.get()
    }

    pub fn set_volume2(&self, volume2: impl Into<Volume>) {
        self.core.volume2.set(volume2.into());
        self.core.apply_local_volume(self.registry.global_volume());
    }

    /// Volume currently written to the element, in `[0, 1]`.
    pub fn effective_volume(&self) -> f64 {
        effective_volume(
            self.core.volume.get(),
            self.core.volume2.get(),
            self.registry.global_volume(),
        )
    }

    pub fn is_looping(&self) -> bool {
        self.core.element().looping()
    }

    pub fn set_looping(&self, looping: bool) {
        if !self.core.disposed.get() {
            self.core.element().set_looping(looping);
        }
    }

    /// Releases the source and leaves the registry. Safe to call twice.
    pub fn dispose(&self) {
        if self.core.disposed.replace(true) {
            return;
        }
        self.core.revoke_object_url(self.registry.platform().as_ref());
        self.registry.unregister(self.id);
        self.core.element().set_src("");
        self.core.status.set(LoadStatus::Unloaded);
        self.core.opened.set(false);
        debug!(id = %self.id, "player disposed");
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn open_source(
    id: PlayerId,
    core: &PlayerCore,
    registry: &PlayerRegistry,
    bytes: &[u8],
    content_type: &str,
) -> Result<()> {
    core.ensure_live()?;
    let started_at = Instant::now();
    let platform = registry.platform().as_ref();
    core.revoke_object_url(platform);

    let wanted = registry.capabilities().negotiate(content_type);
    if wanted != core.element().kind() {
        if wanted == BackendKind::Fallback {
            registry.fallback_ready().await?;
            // Disposal may have happened while the fallback was loading.
            core.ensure_live()?;
        }
        swap_element(id, core, registry, wanted)?;
    }

    let url = platform.create_object_url(bytes, content_type)?;
    let element = core.element();
    element.set_preload(&registry.config().preload);
    element.set_src(&url);
    *core.object_url.borrow_mut() = Some(url);
    element.load();

    core.opened.set(true);
    core.status.set(LoadStatus::Loaded);
    log_perf(
        "player.open",
        started_at,
        &format!("id={id} type={content_type} bytes={}", bytes.len()),
    );
    Ok(())
}

/// Replaces the element, carrying loop flag, position and mute over.
fn swap_element(
    id: PlayerId,
    core: &PlayerCore,
    registry: &PlayerRegistry,
    kind: BackendKind,
) -> Result<()> {
    let previous = core.element();
    let next = registry.platform().create_element(kind)?;
    next.set_looping(previous.looping());
    next.set_current_time(previous.current_time());
    next.set_muted(previous.muted());
    previous.set_src("");

    *core.element.borrow_mut() = next;
    core.apply_local_volume(registry.global_volume());
    info!(%id, from = ?previous.kind(), to = ?kind, "swapped media backend");
    Ok(())
}

async fn muted_pause(core: Rc<PlayerCore>) -> Result<()> {
    core.ensure_live()?;
    let element = core.element();
    let was_muted = element.muted();
    element.set_muted(true);
    let result = element.pause().await;
    element.set_muted(was_muted);
    result
}
