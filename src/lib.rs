//! domsnap
//!
//! Renders an already laid-out document tree into a single raster image,
//! without any "print to image" facility of the host. The host supplies the
//! tree, the computed styles and the layout rectangles; domsnap paints
//! backgrounds, borders, rounded-corner and overflow clipping, images and
//! text onto a `tiny_skia` surface and exports it as PNG.
//!
//! # Features
//!
//! - **Paced walk**: a depth-first [`Walker`] hands out one node at a time
//! - **Completions**: single-assignment [`Completion`] values sequence the
//!   asynchronous per-node work
//! - **Image relay** (`relay` feature, default): images are fetched through a
//!   same-origin relay endpoint; the [`relay::server`] module implements it
//!
//! # Example
//!
//! ```no_run
//! use std::rc::Rc;
//! use domsnap::{Document, SnapshotConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = Document::from_path("page.json")?;
//! let config = SnapshotConfig {
//!     relay_url: "http://127.0.0.1:8080".to_string(),
//!     ..Default::default()
//! };
//! let snapshot = domsnap::render_document(Rc::new(document), &config)?;
//! snapshot.screenshot.save("page.png")?;
//! # Ok(())
//! # }
//! ```

pub mod completion;
pub mod dom;
pub mod error;
pub mod relay;
pub mod rendering;
pub mod scheduler;
pub mod snapshot;
pub mod walker;

pub use completion::{Completion, Status};
pub use dom::{Document, LayoutRect, NodeId, NodeKind, Page};
pub use error::{Error, Result};
pub use relay::{ImageFetcher, ImageLoader, RelayClient};
pub use rendering::{RenderOptions, Renderer, Screenshot};
pub use scheduler::TaskQueue;
pub use snapshot::{render_document, FailurePolicy, Snapshot, SnapshotConfig, SnapshotDriver};
pub use walker::{WalkEvent, WalkHooks, Walker};

/// User agent sent with relay and upstream requests.
pub const DEFAULT_USER_AGENT: &str = concat!("domsnap/", env!("CARGO_PKG_VERSION"));
