//! Browser platform: `HTMLAudioElement` for native playback, ogv.js's
//! `OGVPlayer` as the fallback, blob URLs as temporary resource handles.

use std::rc::Rc;

use futures_util::future::{ready, LocalBoxFuture, Shared};
use futures_util::FutureExt;
use js_sys::{Array, Object, Promise, Reflect, Uint8Array};
use once_cell::unsync::OnceCell;
use tracing::debug;
use wasm_bindgen::{closure::Closure, prelude::*, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, Blob, BlobPropertyBag, HtmlAudioElement, HtmlScriptElement, Url};

use super::{BackendKind, CanPlay, MediaElement, MediaPlatform};
use crate::config::BackendConfig;
use crate::error::PlayerError;

#[wasm_bindgen]
extern "C" {
    /// Media element exposed by the ogv.js script once it has loaded.
    #[wasm_bindgen(js_name = OGVPlayer)]
    #[derive(Clone, Debug)]
    type OgvPlayer;

    #[wasm_bindgen(catch, constructor, js_class = "OGVPlayer")]
    fn new(options: &JsValue) -> Result<OgvPlayer, JsValue>;

    #[wasm_bindgen(method, js_name = canPlayType)]
    fn can_play_type(this: &OgvPlayer, content_type: &str) -> String;

    #[wasm_bindgen(method, getter)]
    fn src(this: &OgvPlayer) -> String;
    #[wasm_bindgen(method, setter)]
    fn set_src(this: &OgvPlayer, src: &str);

    #[wasm_bindgen(method, setter)]
    fn set_preload(this: &OgvPlayer, preload: &str);

    #[wasm_bindgen(method)]
    fn load(this: &OgvPlayer);

    #[wasm_bindgen(catch, method)]
    fn play(this: &OgvPlayer) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, method)]
    fn pause(this: &OgvPlayer) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn muted(this: &OgvPlayer) -> bool;
    #[wasm_bindgen(method, setter)]
    fn set_muted(this: &OgvPlayer, muted: bool);

    #[wasm_bindgen(method, getter)]
    fn volume(this: &OgvPlayer) -> f64;
    #[wasm_bindgen(method, setter)]
    fn set_volume(this: &OgvPlayer, volume: f64);

    #[wasm_bindgen(method, getter, js_name = loop)]
    fn looping(this: &OgvPlayer) -> bool;
    #[wasm_bindgen(method, setter, js_name = loop)]
    fn set_looping(this: &OgvPlayer, looping: bool);

    #[wasm_bindgen(method, getter, js_name = currentTime)]
    fn current_time(this: &OgvPlayer) -> f64;
    #[wasm_bindgen(method, setter, js_name = currentTime)]
    fn set_current_time(this: &OgvPlayer, seconds: f64);
}

type ScriptLoad = Shared<LocalBoxFuture<'static, crate::error::Result<()>>>;

thread_local! {
    // One script tag per page, however many registries exist.
    static FALLBACK_SCRIPT: OnceCell<ScriptLoad> = OnceCell::new();
}

fn describe_js_error(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    let field = |name: &str| {
        Reflect::get(value, &name.into())
            .ok()
            .and_then(|field| field.as_string())
            .filter(|text| !text.is_empty())
    };
    match (field("name"), field("message")) {
        (Some(name), Some(message)) => format!("{name}: {message}"),
        (None, Some(message)) => message,
        (Some(name), None) => name,
        (None, None) => format!("{value:?}"),
    }
}

fn await_js(
    operation: &'static str,
    value: JsValue,
) -> LocalBoxFuture<'static, crate::error::Result<()>> {
    match value.dyn_into::<Promise>() {
        Ok(promise) => async move {
            JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(|err| PlayerError::backend(operation, describe_js_error(&err)))
        }
        .boxed_local(),
        Err(_) => ready(Ok(())).boxed_local(),
    }
}

fn rejected(
    operation: &'static str,
    err: JsValue,
) -> LocalBoxFuture<'static, crate::error::Result<()>> {
    ready(Err(PlayerError::backend(operation, describe_js_error(&err)))).boxed_local()
}

struct NativeElement(HtmlAudioElement);

impl MediaElement for NativeElement {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn can_play_type(&self, content_type: &str) -> CanPlay {
        CanPlay::from_answer(&self.0.can_play_type(content_type))
    }

    fn src(&self) -> String {
        self.0.src()
    }

    fn set_src(&self, src: &str) {
        self.0.set_src(src);
    }

    fn set_preload(&self, preload: &str) {
        self.0.set_preload(preload);
    }

    fn load(&self) {
        self.0.load();
    }

    fn play(&self) -> LocalBoxFuture<'static, crate::error::Result<()>> {
        match self.0.play() {
            Ok(promise) => await_js("play", promise.into()),
            Err(err) => rejected("play", err),
        }
    }

    fn pause(&self) -> LocalBoxFuture<'static, crate::error::Result<()>> {
        match self.0.pause() {
            Ok(()) => ready(Ok(())).boxed_local(),
            Err(err) => rejected("pause", err),
        }
    }

    fn muted(&self) -> bool {
        self.0.muted()
    }

    fn set_muted(&self, muted: bool) {
        self.0.set_muted(muted);
    }

    fn volume(&self) -> f64 {
        self.0.volume()
    }

    fn set_volume(&self, volume: f64) {
        self.0.set_volume(volume.clamp(0.0, 1.0));
    }

    fn looping(&self) -> bool {
        self.0.loop_()
    }

    fn set_looping(&self, looping: bool) {
        self.0.set_loop(looping);
    }

    fn current_time(&self) -> f64 {
        self.0.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.0.set_current_time(seconds);
    }
}

struct FallbackElement(OgvPlayer);

impl MediaElement for FallbackElement {
    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    fn can_play_type(&self, content_type: &str) -> CanPlay {
        CanPlay::from_answer(&self.0.can_play_type(content_type))
    }

    fn src(&self) -> String {
        self.0.src()
    }

    fn set_src(&self, src: &str) {
        self.0.set_src(src);
    }

    fn set_preload(&self, preload: &str) {
        self.0.set_preload(preload);
    }

    fn load(&self) {
        self.0.load();
    }

    fn play(&self) -> LocalBoxFuture<'static, crate::error::Result<()>> {
        match self.0.play() {
            Ok(value) => await_js("play", value),
            Err(err) => rejected("play", err),
        }
    }

    // ogv.js pauses asynchronously; wait when it hands back a promise.
    fn pause(&self) -> LocalBoxFuture<'static, crate::error::Result<()>> {
        match self.0.pause() {
            Ok(value) => await_js("pause", value),
            Err(err) => rejected("pause", err),
        }
    }

    fn muted(&self) -> bool {
        self.0.muted()
    }

    fn set_muted(&self, muted: bool) {
        self.0.set_muted(muted);
    }

    fn volume(&self) -> f64 {
        self.0.volume()
    }

    fn set_volume(&self, volume: f64) {
        self.0.set_volume(volume.clamp(0.0, 1.0));
    }

    fn looping(&self) -> bool {
        self.0.looping()
    }

    fn set_looping(&self, looping: bool) {
        self.0.set_looping(looping);
    }

    fn current_time(&self) -> f64 {
        self.0.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.0.set_current_time(seconds);
    }
}

/// [`MediaPlatform`] backed by the DOM.
pub struct WebPlatform {
    config: BackendConfig,
}

impl WebPlatform {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    fn fallback_options(&self) -> Result<JsValue, JsValue> {
        let options = Object::new();
        Reflect::set(&options, &"wasm".into(), &self.config.fallback_wasm.into())?;
        Reflect::set(
            &options,
            &"threading".into(),
            &self.config.fallback_threading.into(),
        )?;
        Ok(options.into())
    }
}

impl Default for WebPlatform {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

impl MediaPlatform for WebPlatform {
    fn create_element(&self, kind: BackendKind) -> crate::error::Result<Rc<dyn MediaElement>> {
        match kind {
            BackendKind::Native => {
                let audio = HtmlAudioElement::new()
                    .map_err(|err| PlayerError::backend("create element", describe_js_error(&err)))?;
                Ok(Rc::new(NativeElement(audio)))
            }
            BackendKind::Fallback => {
                let player = self
                    .fallback_options()
                    .and_then(|options| OgvPlayer::new(&options))
                    .map_err(|err| PlayerError::FallbackUnavailable(describe_js_error(&err)))?;
                Ok(Rc::new(FallbackElement(player)))
            }
        }
    }

    fn create_object_url(&self, bytes: &[u8], content_type: &str) -> crate::error::Result<String> {
        let parts = Array::new();
        parts.push(&Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type(content_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|err| PlayerError::Resource(describe_js_error(&err)))?;
        let url = Url::create_object_url_with_blob(&blob)
            .map_err(|err| PlayerError::Resource(describe_js_error(&err)))?;
        debug!(%url, %content_type, len = bytes.len(), "created blob url");
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        if url.is_empty() {
            return;
        }
        if let Err(err) = Url::revoke_object_url(url) {
            debug!(%url, error = %describe_js_error(&err), "failed to revoke blob url");
        }
    }

    fn load_fallback(&self) -> LocalBoxFuture<'static, crate::error::Result<()>> {
        let script_url = self.config.fallback_script_url.clone();
        let load = FALLBACK_SCRIPT.with(|slot| {
            slot.get_or_init(|| {
                let load = match inject_script(&script_url) {
                    Ok(promise) => async move {
                        JsFuture::from(promise)
                            .await
                            .map(|_| ())
                            .map_err(|err| PlayerError::FallbackUnavailable(describe_js_error(&err)))
                    }
                    .boxed_local(),
                    Err(err) => ready(Err(err)).boxed_local(),
                };
                load.shared()
            })
            .clone()
        });
        load.boxed_local()
    }
}

/// Appends a `<script>` tag and returns a promise settled by its load events.
fn inject_script(url: &str) -> crate::error::Result<Promise> {
    let unavailable = |message: &str| PlayerError::FallbackUnavailable(message.to_string());
    let document = window()
        .and_then(|w| w.document())
        .ok_or_else(|| unavailable("no document"))?;
    let head = document.head().ok_or_else(|| unavailable("no <head>"))?;
    let script: HtmlScriptElement = document
        .create_element("script")
        .map_err(|err| PlayerError::FallbackUnavailable(describe_js_error(&err)))?
        .dyn_into()
        .map_err(|_| unavailable("created element is not a script"))?;

    let promise = Promise::new(&mut |resolve, reject| {
        let on_load = Closure::once_into_js(move || {
            let _ = resolve.call0(&JsValue::NULL);
        });
        let on_error = Closure::once_into_js(move || {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("failed to load fallback script"));
        });
        script.set_onload(Some(on_load.unchecked_ref()));
        script.set_onerror(Some(on_error.unchecked_ref()));
    });

    script.set_src(url);
    head.append_child(&script)
        .map_err(|err| PlayerError::FallbackUnavailable(describe_js_error(&err)))?;
    debug!(%url, "injected fallback script");
    Ok(promise)
}
