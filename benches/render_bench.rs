use std::rc::Rc;

use criterion::{criterion_group, criterion_main, Criterion};

use domsnap::dom::{ComputedStyle, Rgba, Sides};
use domsnap::rendering::text::BlockText;
use domsnap::relay::{OfflineFetcher, RelayClient};
use domsnap::{Document, LayoutRect, Page, SnapshotConfig, SnapshotDriver, TaskQueue, WalkEvent, Walker};

/// A list of `rows` bordered cards, each with a line of text.
fn card_list(rows: usize) -> Document {
    let mut doc = Document::new();
    let height = rows as f32 * 40.0;
    let body = doc.add_element(None, "body", ComputedStyle::default(), vec![LayoutRect::new(0.0, 0.0, 400.0, height)]);
    for i in 0..rows {
        let top = i as f32 * 40.0;
        let card = doc.add_element(
            Some(body),
            "div",
            ComputedStyle {
                background_color: Rgba::new(230, 240, 255, 255),
                border_width: Sides::all(1.0),
                padding: Sides::all(4.0),
                ..ComputedStyle::default()
            },
            vec![LayoutRect::new(0.0, top, 400.0, top + 36.0)],
        );
        doc.add_text(
            Some(card),
            "Lorem ipsum dolor sit amet, consectetur adipiscing elit",
            vec![LayoutRect::new(5.0, top + 5.0, 395.0, top + 21.0)],
        );
    }
    doc
}

fn bench_walk(c: &mut Criterion) {
    let doc = Rc::new(card_list(1000));
    c.bench_function("walk_1000_cards", |b| {
        b.iter(|| {
            Walker::new(doc.clone(), domsnap::NodeId(0))
                .filter(|e| matches!(e, WalkEvent::Visit(_)))
                .count()
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let doc = Rc::new(card_list(50));
    let config = SnapshotConfig::default();
    c.bench_function("render_50_cards", |b| {
        b.iter(|| {
            let queue = TaskQueue::new();
            let images = Rc::new(RelayClient::new("", Rc::new(OfflineFetcher), queue.clone()));
            let driver = SnapshotDriver::new(
                Page::from_document(doc.clone()),
                domsnap::NodeId(0),
                images,
                Rc::new(BlockText),
                queue,
                &config,
            );
            driver.run().unwrap().screenshot.png_data.len()
        })
    });
}

criterion_group!(benches, bench_walk, bench_render);
criterion_main!(benches);
