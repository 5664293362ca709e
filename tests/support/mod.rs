#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::rc::Rc;

use blobsound::{BackendKind, CanPlay, MediaElement, MediaPlatform, PlayerError, Result};
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use tokio::sync::oneshot;

pub type EventLog = Rc<RefCell<Vec<String>>>;

pub struct ElementState {
    pub kind: BackendKind,
    pub plays_ogg: bool,
    pub events: EventLog,
    pub src: RefCell<String>,
    pub preload: RefCell<String>,
    pub muted: Cell<bool>,
    pub volume: Cell<f64>,
    pub volume_writes: Cell<usize>,
    pub looping: Cell<bool>,
    pub current_time: Cell<f64>,
    pub paused: Cell<bool>,
    pub play_error: RefCell<Option<String>>,
}

#[derive(Clone)]
pub struct MockElement(Rc<ElementState>);

impl Deref for MockElement {
    type Target = ElementState;

    fn deref(&self) -> &ElementState {
        &self.0
    }
}

impl MockElement {
    fn log(&self, event: &str) {
        let tag = match self.kind {
            BackendKind::Native => "native",
            BackendKind::Fallback => "fallback",
        };
        self.events.borrow_mut().push(format!("{tag}:{event}"));
    }

    pub fn reject_play(&self, message: &str) {
        *self.play_error.borrow_mut() = Some(message.to_string());
    }

    /// Simulates playback progressing.
    pub fn advance(&self, seconds: f64) {
        self.current_time.set(self.current_time.get() + seconds);
    }
}

impl MediaElement for MockElement {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn can_play_type(&self, content_type: &str) -> CanPlay {
        if content_type.starts_with("audio/ogg") && !self.plays_ogg {
            CanPlay::No
        } else {
            CanPlay::Maybe
        }
    }

    fn src(&self) -> String {
        self.src.borrow().clone()
    }

    fn set_src(&self, src: &str) {
        *self.src.borrow_mut() = src.to_string();
        self.log(&format!("src={src}"));
    }

    fn set_preload(&self, preload: &str) {
        *self.preload.borrow_mut() = preload.to_string();
    }

    fn load(&self) {
        self.log("load");
    }

    fn play(&self) -> LocalBoxFuture<'static, Result<()>> {
        let element = self.clone();
        async move {
            element.log("play:start");
            tokio::task::yield_now().await;
            if let Some(message) = element.play_error.borrow().clone() {
                element.log("play:rejected");
                return Err(PlayerError::backend("play", message));
            }
            element.paused.set(false);
            element.log("play:end");
            Ok(())
        }
        .boxed_local()
    }

    fn pause(&self) -> LocalBoxFuture<'static, Result<()>> {
        let element = self.clone();
        async move {
            element.log(&format!("pause muted={}", element.muted.get()));
            tokio::task::yield_now().await;
            element.paused.set(true);
            Ok(())
        }
        .boxed_local()
    }

    fn muted(&self) -> bool {
        self.muted.get()
    }

    fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
    }

    fn volume(&self) -> f64 {
        self.volume.get()
    }

    fn set_volume(&self, volume: f64) {
        self.volume.set(volume);
        self.volume_writes.set(self.volume_writes.get() + 1);
    }

    fn looping(&self) -> bool {
        self.looping.get()
    }

    fn set_looping(&self, looping: bool) {
        self.looping.set(looping);
    }

    fn current_time(&self) -> f64 {
        self.current_time.get()
    }

    fn set_current_time(&self, seconds: f64) {
        self.current_time.set(seconds);
    }
}

/// In-memory platform recording every element, URL and fallback load.
pub struct MockPlatform {
    pub native_plays_ogg: bool,
    pub events: EventLog,
    pub elements: RefCell<Vec<MockElement>>,
    pub live_urls: RefCell<Vec<String>>,
    pub revoked_urls: RefCell<Vec<String>>,
    pub fallback_loads: Cell<usize>,
    next_url: Cell<usize>,
    fallback_gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl MockPlatform {
    pub fn new(native_plays_ogg: bool) -> Rc<Self> {
        Rc::new(Self {
            native_plays_ogg,
            events: Rc::new(RefCell::new(Vec::new())),
            elements: RefCell::new(Vec::new()),
            live_urls: RefCell::new(Vec::new()),
            revoked_urls: RefCell::new(Vec::new()),
            fallback_loads: Cell::new(0),
            next_url: Cell::new(0),
            fallback_gate: RefCell::new(None),
        })
    }

    /// Makes the next fallback load wait until the returned sender fires.
    pub fn gate_fallback(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.fallback_gate.borrow_mut() = Some(rx);
        tx
    }

    pub fn latest_element(&self) -> MockElement {
        self.elements
            .borrow()
            .last()
            .cloned()
            .expect("no element created")
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }
}

impl MediaPlatform for MockPlatform {
    fn create_element(&self, kind: BackendKind) -> Result<Rc<dyn MediaElement>> {
        let element = MockElement(Rc::new(ElementState {
            kind,
            plays_ogg: kind == BackendKind::Fallback || self.native_plays_ogg,
            events: self.events.clone(),
            src: RefCell::new(String::new()),
            preload: RefCell::new(String::new()),
            muted: Cell::new(false),
            volume: Cell::new(1.0),
            volume_writes: Cell::new(0),
            looping: Cell::new(false),
            current_time: Cell::new(0.0),
            paused: Cell::new(true),
            play_error: RefCell::new(None),
        }));
        self.elements.borrow_mut().push(element.clone());
        Ok(Rc::new(element))
    }

    fn create_object_url(&self, bytes: &[u8], content_type: &str) -> Result<String> {
        let index = self.next_url.get();
        self.next_url.set(index + 1);
        let url = format!("blob:mock/{index}?type={content_type}&len={}", bytes.len());
        self.live_urls.borrow_mut().push(url.clone());
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        self.live_urls.borrow_mut().retain(|live| live != url);
        self.revoked_urls.borrow_mut().push(url.to_string());
    }

    fn load_fallback(&self) -> LocalBoxFuture<'static, Result<()>> {
        self.fallback_loads.set(self.fallback_loads.get() + 1);
        let gate = self.fallback_gate.borrow_mut().take();
        let events = self.events.clone();
        async move {
            if let Some(gate) = gate {
                gate.await
                    .map_err(|_| PlayerError::FallbackUnavailable("gate dropped".into()))?;
            }
            events.borrow_mut().push("fallback:ready".to_string());
            Ok(())
        }
        .boxed_local()
    }
}
