use std::collections::HashSet;

use super::*;
use document::{Brush, Stroke};
use model::{TileLayout, Vec2i};
use protocol::RenderFlags;
use view::{CanvasView, ViewConfig};

const SCREEN: Vec2i = Vec2i::new(100, 70);

fn layout() -> TileLayout {
    TileLayout::new(SCREEN, 8, 2).expect("layout")
}

fn scene_with_line(from: (i32, i32), to: (i32, i32)) -> Arc<RenderScene> {
    let mut view = CanvasView::new(ViewConfig::default()).expect("view");
    view.resize(Vec2i::ZERO, SCREEN).expect("resize");
    let mut scene = RenderScene::new(view, RenderFlags::FULL_REDRAW);
    scene.push_stroke(Stroke::from_points(
        Brush::default().with_radius(view.pixels_to_canvas(4)),
        [
            view.raster_to_canvas(Vec2i::new(from.0, from.1)),
            view.raster_to_canvas(Vec2i::new(to.0, to.1)),
        ],
    ));
    Arc::new(scene)
}

fn single_threaded(scene: &RenderScene) -> Vec<u8> {
    let mut out = Vec::new();
    rasterize_tile(
        scene,
        ScreenRect::from_size(SCREEN),
        8,
        &mut TileScratch::new(),
        &mut out,
    );
    out
}

fn buffers() -> RasterBuffers {
    let mut buffers = RasterBuffers::new(SCREEN);
    buffers.set_size(SCREEN).expect("size");
    buffers
}

fn queue(worker_count: usize) -> RenderQueue {
    RenderQueue::start(RenderQueueConfig { worker_count }).expect("start render queue")
}

#[test]
fn zero_workers_is_rejected() {
    assert_eq!(
        RenderQueue::start(RenderQueueConfig { worker_count: 0 }).err(),
        Some(RenderQueueError::ZeroWorkers)
    );
}

#[test]
fn default_worker_count_is_twice_the_cores() {
    let cores = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    assert_eq!(RenderQueueConfig::default().worker_count, cores * 2);
}

#[test]
fn every_enqueued_tile_completes_exactly_once() {
    let mut queue = queue(3);
    let scene = scene_with_line((0, 0), (99, 69));
    let layout = layout();
    for (tile, rect) in layout.iter_tiles() {
        queue
            .enqueue(tile, rect, layout.block_width(), &scene)
            .expect("enqueue");
    }
    assert_eq!(queue.outstanding(), layout.max_tiles());

    let mut seen = HashSet::new();
    let failed = queue
        .wait_for_completion(|output| {
            assert_eq!(output.pixels.len(), output.rect.area() * 4);
            assert!(seen.insert(output.tile), "tile {:?} completed twice", output.tile);
        })
        .expect("wait");
    assert_eq!(failed, 0);
    assert_eq!(seen.len(), layout.max_tiles());
    assert_eq!(queue.outstanding(), 0);
}

#[test]
fn full_render_matches_a_single_threaded_pass() {
    let mut queue = queue(4);
    let scene = scene_with_line((5, 60), (95, 4));
    let mut buffers = buffers();

    let report = queue
        .render(
            Arc::clone(&scene),
            &TileMask::full(layout()),
            true,
            &mut buffers,
        )
        .expect("render");

    assert_eq!(report.tiles_rendered, layout().max_tiles());
    assert_eq!(report.tiles_failed, 0);
    assert!(report.flipped);
    assert_eq!(buffers.active_index(), 1);
    assert_eq!(buffers.active().pixels, single_threaded(&scene).as_slice());
}

#[test]
fn incremental_render_keeps_unmarked_tiles() {
    let mut queue = queue(2);
    let mut buffers = buffers();
    let blank = scene_with_line((-50, -50), (-40, -40));
    queue
        .render(blank, &TileMask::full(layout()), true, &mut buffers)
        .expect("full render");

    // The new line crosses the whole screen but only the first tile is redrawn.
    let scene = scene_with_line((0, 5), (99, 5));
    let mut mask = TileMask::empty(layout());
    mask.mark(TilePos { x: 0, y: 0 }).expect("mark");
    let report = queue
        .render(scene, &mask, false, &mut buffers)
        .expect("incremental render");
    assert_eq!(report.tiles_rendered, 1);

    let frame = buffers.active();
    assert_eq!(frame.pixel(5, 5), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(50, 5), Some([255, 255, 255, 255]));
}

#[test]
fn empty_mask_renders_nothing_and_keeps_the_active_buffer() {
    let mut queue = queue(1);
    let mut buffers = buffers();
    let report = queue
        .render(
            scene_with_line((0, 0), (10, 10)),
            &TileMask::empty(layout()),
            false,
            &mut buffers,
        )
        .expect("render");
    assert_eq!(report, RenderCycleReport::default());
    assert_eq!(buffers.active_index(), 0);
}

fn panic_on_first_tile(
    scene: &RenderScene,
    rect: ScreenRect,
    block_width: u32,
    scratch: &mut TileScratch,
    out: &mut Vec<u8>,
) {
    if rect.left == 0 && rect.top == 0 {
        out.clear();
        out.resize(rect.area() * 4, 0);
        panic!("malformed stroke data");
    }
    rasterize_tile(scene, rect, block_width, scratch, out);
}

#[test]
fn a_panicking_tile_is_reported_and_the_pool_survives() {
    let mut queue = RenderQueue::start_with_rasterizer(
        RenderQueueConfig { worker_count: 2 },
        panic_on_first_tile,
    )
    .expect("start render queue");
    let mut buffers = buffers();
    let scene = scene_with_line((0, 0), (99, 69));

    for _ in 0..2 {
        let report = queue
            .render(
                Arc::clone(&scene),
                &TileMask::full(layout()),
                true,
                &mut buffers,
            )
            .expect("render despite a failing tile");
        assert_eq!(report.tiles_failed, 1);
        assert_eq!(report.tiles_rendered, layout().max_tiles());

        // The line crosses the failed tile; it is left as background instead.
        let frame = buffers.active();
        assert_eq!(frame.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(frame.pixel(15, 15), Some([255, 255, 255, 255]));
        assert_ne!(frame.pixel(50, 35), Some([255, 255, 255, 255]));
    }
    assert_eq!(queue.worker_count(), 2);
}

#[test]
fn dropping_the_queue_joins_idle_workers() {
    let queue = queue(4);
    assert_eq!(queue.worker_count(), 4);
    drop(queue);
}
