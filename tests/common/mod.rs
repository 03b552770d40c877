#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use domsnap::relay::Image;
use domsnap::{Completion, Error, ImageLoader, TaskQueue};
use tiny_skia::Pixmap;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn solid_pixmap(width: u32, height: u32, rgba: [u8; 4]) -> Pixmap {
    let mut p = Pixmap::new(width, height).unwrap();
    p.fill(tiny_skia::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
    p
}

pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    solid_pixmap(width, height, rgba).encode_png().unwrap()
}

/// Loader whose loads settle only when the task queue is pumped.
pub struct QueuedImages {
    queue: TaskQueue,
    images: HashMap<String, Image>,
    pub requested: Rc<RefCell<Vec<String>>>,
}

impl QueuedImages {
    pub fn new(queue: TaskQueue) -> Self {
        Self {
            queue,
            images: HashMap::new(),
            requested: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with(mut self, url: &str, image: Pixmap) -> Self {
        self.images.insert(url.to_string(), Rc::new(image));
        self
    }
}

impl ImageLoader for QueuedImages {
    fn load(&self, url: &str) -> Completion<Image> {
        self.requested.borrow_mut().push(url.to_string());
        let outcome = self
            .images
            .get(url)
            .cloned()
            .ok_or_else(|| Error::image_load(url, "HTTP 404"));
        let done = Completion::new();
        let settle = done.clone();
        self.queue.spawn(move || {
            settle.complete(outcome);
        });
        done
    }
}
