//! Image loading through the same-origin relay.
//!
//! Images referenced by a page usually live on other origins. Instead of
//! fetching them directly, the [`RelayClient`] rewrites every request to the
//! relay endpoint (`/imageproxy?url=...`), which streams the remote bytes back
//! unchanged. Each call makes a single attempt; retry policy belongs to the
//! caller.
//!
//! Loads never settle inside the call that requested them: the fetch is
//! queued on the shared [`TaskQueue`] and completes when the host pumps it.

pub mod data_url;
#[cfg(feature = "relay")]
pub mod http;
#[cfg(feature = "relay")]
pub mod server;

use std::rc::Rc;

use tiny_skia::{ColorU8, Pixmap};

use crate::completion::Completion;
use crate::scheduler::TaskQueue;
use crate::{Error, Result};

/// A decoded image, shared between every draw that uses it.
pub type Image = Rc<Pixmap>;

/// Capability the renderer uses to obtain decoded images.
pub trait ImageLoader {
    fn load(&self, url: &str) -> Completion<Image>;
}

/// Transport used by the relay client to retrieve raw bytes.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetcher for builds without network support; every fetch fails.
pub struct OfflineFetcher;

impl ImageFetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(Error::image_load(url, "network fetching is disabled"))
    }
}

/// Loads images through the relay endpoint.
pub struct RelayClient {
    relay_base: String,
    fetcher: Rc<dyn ImageFetcher>,
    queue: TaskQueue,
}

impl RelayClient {
    /// `relay_base` is the relay origin, e.g. `http://127.0.0.1:8080`. An
    /// empty base produces origin-relative URLs.
    pub fn new(relay_base: impl Into<String>, fetcher: Rc<dyn ImageFetcher>, queue: TaskQueue) -> Self {
        Self {
            relay_base: relay_base.into(),
            fetcher,
            queue,
        }
    }

    /// The relay URL that fetches `url` on our behalf.
    pub fn proxy_url(&self, url: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
        format!("{}/imageproxy?url={}", self.relay_base.trim_end_matches('/'), encoded)
    }

    /// Fetch and decode `url` through the relay.
    pub fn get(&self, url: &str) -> Completion<Image> {
        let done = Completion::new();
        let settle = done.clone();
        let fetcher = Rc::clone(&self.fetcher);
        let original = url.to_string();
        let proxied = self.proxy_url(url);

        self.queue.spawn(move || {
            log::debug!("fetching {} via {}", original, proxied);
            let outcome = fetcher
                .fetch(&proxied)
                .map_err(|e| match e {
                    Error::ImageLoad { reason, .. } => Error::ImageLoad {
                        url: original.clone(),
                        reason,
                    },
                    other => Error::image_load(&original, other),
                })
                .and_then(|bytes| decode_image(&original, &bytes))
                .map(Rc::new);
            if let Err(e) = &outcome {
                log::warn!("{}", e);
            }
            settle.complete(outcome);
        });

        done
    }
}

impl ImageLoader for RelayClient {
    fn load(&self, url: &str) -> Completion<Image> {
        if data_url::is_data_url(url) {
            return Completion::from_result(load_inline(url));
        }
        self.get(url)
    }
}

/// Decode an inline `data:` image without touching the network.
pub fn load_inline(url: &str) -> Result<Image> {
    let bytes = data_url::decode_data_url(url)?;
    decode_image("data:", &bytes).map(Rc::new)
}

/// Decode PNG/JPEG/GIF bytes into a premultiplied pixmap.
pub fn decode_image(url: &str, bytes: &[u8]) -> Result<Pixmap> {
    let rgba = image::load_from_memory(bytes)
        .map_err(|e| Error::image_load(url, e))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::image_load(url, format!("unsupported image size {width}x{height}")))?;
    for (dst, px) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = px.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}
