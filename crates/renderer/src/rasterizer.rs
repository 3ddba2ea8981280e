use model::{BYTES_PER_PIXEL, CanvasBounds, Rgb, ScreenRect, Vec2i};

use crate::FEATHER_PX;
use crate::coverage::coverage_at;
use crate::scene::RenderScene;

/// Per-worker scratch memory, reset at the start of every tile.
///
/// Holds nothing between tiles; it only keeps the allocations warm.
#[derive(Debug, Default)]
pub struct TileScratch {
    candidates: Vec<usize>,
    samples: Vec<Rgb>,
}

impl TileScratch {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, sample_count: usize, background: Rgb) {
        self.candidates.clear();
        self.samples.clear();
        self.samples.resize(sample_count, background);
    }
}

/// Rasterizes the pixels of `rect` into `out` as tile-local, row-major RGBA8.
///
/// `out` is resized to `rect.area() * 4`. The tile is walked in
/// `block_width`-sized blocks; each block only shades strokes whose inflated
/// bounds reach it. With a downsampling factor `n > 1` one sample is shaded per
/// `n x n` pixel group and copied to the rest of the group.
pub fn rasterize_tile(
    scene: &RenderScene,
    rect: ScreenRect,
    block_width: u32,
    scratch: &mut TileScratch,
    out: &mut Vec<u8>,
) {
    let sample_count = rect.area();
    out.clear();
    out.resize(sample_count * BYTES_PER_PIXEL, 0);
    scratch.reset(sample_count, scene.background);
    if sample_count == 0 {
        return;
    }

    let view = &scene.view;
    let step = view.downsampling_factor().max(1);
    let feather = view.pixels_to_canvas(FEATHER_PX);
    let block_width = block_width.clamp(1, i32::MAX as u32) as i32;
    let TileScratch {
        candidates,
        samples,
    } = scratch;

    let mut block_top = rect.top;
    while block_top < rect.bottom {
        let block_bottom = block_top.saturating_add(block_width).min(rect.bottom);
        let mut block_left = rect.left;
        while block_left < rect.right {
            let block_right = block_left.saturating_add(block_width).min(rect.right);
            let block = ScreenRect::new(block_left, block_top, block_right, block_bottom);
            collect_candidates(scene, block, feather, candidates);
            if !candidates.is_empty() {
                shade_block(scene, rect, block, step, feather, candidates, samples);
            }
            block_left = block_right;
        }
        block_top = block_bottom;
    }

    for (pixel, sample) in out.chunks_exact_mut(BYTES_PER_PIXEL).zip(samples.iter()) {
        pixel.copy_from_slice(&sample.to_rgba8());
    }
}

fn collect_candidates(
    scene: &RenderScene,
    block: ScreenRect,
    feather: i64,
    candidates: &mut Vec<usize>,
) {
    candidates.clear();
    let view = &scene.view;
    let mut block_bounds =
        CanvasBounds::from_point(view.raster_to_canvas(Vec2i::new(block.left, block.top)));
    block_bounds.include(view.raster_to_canvas(Vec2i::new(block.right - 1, block.bottom - 1)));

    for (index, stroke) in scene.strokes_in_draw_order().enumerate() {
        let Some(bounds) = stroke.bounds() else {
            continue;
        };
        let reach = stroke.brush().radius.max(0).saturating_add(feather.max(1));
        if bounds.inflated(reach).intersects(&block_bounds) {
            candidates.push(index);
        }
    }
}

fn shade_block(
    scene: &RenderScene,
    tile: ScreenRect,
    block: ScreenRect,
    step: i32,
    feather: i64,
    candidates: &[usize],
    samples: &mut [Rgb],
) {
    let tile_width = tile.width() as usize;
    let mut y = block.top;
    while y < block.bottom {
        let group_bottom = y.saturating_add(step).min(block.bottom);
        let mut x = block.left;
        while x < block.right {
            let group_right = x.saturating_add(step).min(block.right);
            let color = shade_pixel(scene, Vec2i::new(x, y), feather, candidates);
            for row in y..group_bottom {
                let row_start = (row - tile.top) as usize * tile_width;
                let from = row_start + (x - tile.left) as usize;
                let to = row_start + (group_right - tile.left) as usize;
                samples[from..to].fill(color);
            }
            x = group_right;
        }
        y = group_bottom;
    }
}

fn shade_pixel(scene: &RenderScene, pixel: Vec2i, feather: i64, candidates: &[usize]) -> Rgb {
    let canvas = scene.view.raster_to_canvas(pixel);
    let mut color = scene.background;
    for &index in candidates {
        let stroke = scene.stroke(index);
        let coverage = coverage_at(stroke, canvas, feather);
        if coverage <= 0.0 {
            continue;
        }
        let alpha = (coverage * stroke.brush().alpha).clamp(0.0, 1.0);
        if !alpha.is_finite() {
            continue;
        }
        color = stroke.brush().color.over(color, alpha);
    }
    color
}
