use std::sync::Arc;

use document::{Brush, StrokeStore, StrokeStoreError};
use engine::{RenderQueue, RenderQueueConfig, RenderQueueError};
use frame_scheduler::{FrameScheduler, RedrawReason};
use model::{ScreenRect, TileLayout, TileMask, Vec2i, hsv_to_rgb};
use protocol::{InputFlags, InputFrame};
use renderer::{FEATHER_PX, RasterBuffers, RasterFrame, RenderScene};
use tracing::{debug, info, warn};
use view::{CanvasView, ViewError};

use crate::config::{CoreConfig, CoreConfigError};
use crate::picker::ColorPicker;
use crate::report::{UpdateReport, UpdateWarning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Point input does not draw.
    None,
    Eraser,
    #[default]
    Brush,
}

/// All painting state plus the worker pool, driven one update cycle at a time.
///
/// Only the owning thread mutates it; workers see an immutable snapshot per
/// cycle and are joined when the core is dropped.
pub struct CanvasCore<P: ColorPicker> {
    config: CoreConfig,
    view: CanvasView,
    store: StrokeStore,
    scheduler: FrameScheduler,
    queue: RenderQueue,
    buffers: RasterBuffers,
    layout: TileLayout,
    picker: P,
    mode: Mode,
    brush: Brush,
    eraser_brush: Brush,
    // Picker owns the current gesture; points do not reach the canvas.
    canvas_blocked: bool,
    frame_sequence_id: u64,
    pending_full_redraw: Option<RedrawReason>,
}

impl<P: ColorPicker> CanvasCore<P> {
    pub fn new(config: CoreConfig, picker: P) -> Result<Self, CoreConfigError> {
        config.validate()?;
        let view = CanvasView::new(config.view_config())?;
        let layout = tile_layout(&config, view.screen_size());
        let queue = RenderQueue::start(RenderQueueConfig {
            worker_count: config.worker_count,
        })?;
        let radius = config.brush_size_px * view.scale();
        let brush = Brush {
            radius,
            color: hsv_to_rgb(config.picker_hsv),
            alpha: config.brush_alpha,
        };
        info!(
            max_width = config.max_width,
            max_height = config.max_height,
            worker_count = config.worker_count,
            "canvas core initialized"
        );

        Ok(Self {
            view,
            store: StrokeStore::new(config.stroke_store_config()),
            scheduler: FrameScheduler::new(config.scheduler),
            queue,
            buffers: RasterBuffers::new(config.max_screen_size()),
            layout,
            picker,
            mode: Mode::default(),
            brush,
            eraser_brush: Brush::eraser(radius),
            canvas_blocked: false,
            frame_sequence_id: 0,
            pending_full_redraw: Some(RedrawReason::Resize),
            config,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn view(&self) -> &CanvasView {
        &self.view
    }

    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    pub fn picker(&self) -> &P {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut P {
        &mut self.picker
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn eraser_brush(&self) -> &Brush {
        &self.eraser_brush
    }

    pub fn canvas_blocked(&self) -> bool {
        self.canvas_blocked
    }

    pub fn worker_count(&self) -> usize {
        self.queue.worker_count()
    }

    /// The last fully rendered frame. Stays valid until the next cycle flips it.
    pub fn active_frame(&self) -> RasterFrame<'_> {
        self.buffers.active()
    }

    /// Applies a pan delta and a new screen size. Rejected sizes leave every
    /// piece of state untouched.
    ///
    /// The raster buffers follow on the next [`CanvasCore::update`]; until then
    /// [`CanvasCore::active_frame`] still returns the last rendered frame at its
    /// old size.
    pub fn resize(&mut self, pan_delta: Vec2i, new_screen_size: Vec2i) -> Result<(), ViewError> {
        if let Err(error) = self.view.resize(pan_delta, new_screen_size) {
            warn!(
                width = new_screen_size.x,
                height = new_screen_size.y,
                %error,
                "resize rejected"
            );
            return Err(error);
        }
        self.layout = tile_layout(&self.config, new_screen_size);
        self.pending_full_redraw.get_or_insert(RedrawReason::Resize);
        debug!(
            width = new_screen_size.x,
            height = new_screen_size.y,
            tiles = self.layout.max_tiles(),
            "resized"
        );
        Ok(())
    }

    /// Runs one update cycle: applies `input` in a fixed precedence order,
    /// then renders and flips before returning.
    pub fn update(&mut self, input: &InputFrame) -> Result<UpdateReport, RenderQueueError> {
        self.frame_sequence_id += 1;
        let mut report = UpdateReport {
            frame_sequence_id: self.frame_sequence_id,
            ..UpdateReport::default()
        };
        let flags = input.flags;

        let downsampling = self
            .scheduler
            .begin_frame(self.frame_sequence_id, flags.contains(InputFlags::FAST_DRAW));
        self.view.set_downsampling_factor(downsampling);
        if let Some(reason) = self.pending_full_redraw.take() {
            self.scheduler.request_full_redraw(reason);
        }

        if flags.contains(InputFlags::FULL_REFRESH) {
            self.scheduler.request_full_redraw(RedrawReason::FullRefresh);
        }

        if input.scale != 0 {
            self.scheduler.request_full_redraw(RedrawReason::Zoom);
            if self.view.apply_zoom(input.scale) {
                debug!(scale = self.view.scale(), "zoomed");
            }
            self.refresh_brush_radii();
        }

        if input.pan_delta != Vec2i::ZERO {
            match self.view.resize(input.pan_delta, self.view.screen_size()) {
                Ok(()) => self.scheduler.request_full_redraw(RedrawReason::Pan),
                Err(error) => push_warning(&mut report, UpdateWarning::PanRejected(error)),
            }
        }

        if flags.contains(InputFlags::SET_MODE_BRUSH) {
            self.mode = Mode::Brush;
        }
        if flags.contains(InputFlags::SET_MODE_ERASER) {
            self.mode = Mode::Eraser;
        }

        if flags.contains(InputFlags::UNDO) {
            match self.store.undo() {
                Ok(true) => self.scheduler.request_full_redraw(RedrawReason::History),
                Ok(false) => {}
                Err(_) => push_warning(&mut report, UpdateWarning::UndoWhileDrawing),
            }
        } else if flags.contains(InputFlags::REDO) && self.store.redo() {
            self.scheduler.request_full_redraw(RedrawReason::History);
        }

        if flags.contains(InputFlags::RESET) {
            self.scheduler.request_full_redraw(RedrawReason::Reset);
            self.store.reset();
        }

        if let Some(point) = input.point {
            self.handle_point(point, &mut report);
        }

        if flags.contains(InputFlags::END_STROKE) {
            self.end_stroke(&mut report);
        }

        self.render(report)
    }

    fn handle_point(&mut self, point: Vec2i, report: &mut UpdateReport) {
        if !self.store.is_drawing() && self.picker.contains(point) {
            let picked = self.picker.pick(point);
            if picked.color_changed && self.mode == Mode::Brush {
                self.brush.color = hsv_to_rgb(self.picker.hsv());
            }
            self.canvas_blocked = true;
            self.scheduler.mark_picker_updated();
        } else if !self.canvas_blocked {
            self.draw_point(point, report);
        }

        if self.canvas_blocked && self.picker.wheel_active() {
            if self.picker.is_inside_triangle(point) {
                self.picker.deactivate_wheel();
            } else if self.mode == Mode::Brush {
                self.picker.update_wheel(point);
                self.brush.color = hsv_to_rgb(self.picker.hsv());
            }
            self.scheduler.mark_picker_updated();
        }

        // Any new edit invalidates the redo history.
        self.store.discard_redo();
    }

    fn draw_point(&mut self, point: Vec2i, report: &mut UpdateReport) {
        let brush = match self.mode {
            Mode::Brush => self.brush,
            Mode::Eraser => self.eraser_brush,
            Mode::None => return,
        };
        // Projected through the current view: a zoom or pan since the last
        // point moves it on screen.
        let previous = self
            .store
            .working_stroke()
            .points()
            .last()
            .map_or(point, |&last| self.view.canvas_to_raster(last));

        let canvas_point = self.view.raster_to_canvas(point);
        match self.store.push_point(canvas_point, &brush) {
            Ok(()) => {
                let span = ScreenRect::spanning(previous, point).inflated(self.stroke_reach_px());
                self.scheduler.mark_dirty(span);
            }
            Err(StrokeStoreError::PointCapacityExceeded { max_stroke_points }) => {
                push_warning(report, UpdateWarning::PointDropped { max_stroke_points });
            }
            Err(error) => panic!("push_point only fails on point capacity: {error}"),
        }
    }

    /// Screen pixels the working stroke can touch beyond its centerline.
    ///
    /// The stroke keeps the radius of its first point, so it is measured at
    /// the current scale rather than taken from the configured brush size.
    fn stroke_reach_px(&self) -> i32 {
        let scale = self.view.scale().max(1);
        let radius = self.store.working_stroke().brush().radius.max(0);
        let radius_px = radius / scale + i64::from(radius % scale != 0);
        i32::try_from(radius_px + FEATHER_PX + 1).unwrap_or(i32::MAX)
    }

    fn end_stroke(&mut self, report: &mut UpdateReport) {
        if self.canvas_blocked {
            self.picker.deactivate_wheel();
            self.canvas_blocked = false;
            return;
        }
        match self.store.commit_working_stroke() {
            Ok(committed) => report.committed_stroke = committed,
            Err(StrokeStoreError::StrokeCapacityExceeded { max_strokes }) => {
                push_warning(report, UpdateWarning::StrokeDropped { max_strokes });
                // Its pixels are already on screen.
                self.scheduler.request_full_redraw(RedrawReason::StrokeDropped);
            }
            Err(error) => panic!("commit only fails on stroke capacity: {error}"),
        }
    }

    fn refresh_brush_radii(&mut self) {
        let radius = self.config.brush_size_px * self.view.scale();
        self.brush.radius = radius;
        self.eraser_brush.radius = radius;
    }

    fn render(&mut self, mut report: UpdateReport) -> Result<UpdateReport, RenderQueueError> {
        let decision = self.scheduler.finish_frame();
        report.render_flags = decision.render_flags;
        report.full_redraw_reason = decision.full_redraw_reason;
        if !decision.needs_render() {
            return Ok(report);
        }

        let screen_size = self.view.screen_size();
        if self.buffers.size() != screen_size {
            // Only reached through a resize, which always forces a full redraw.
            self.buffers
                .set_size(screen_size)
                .unwrap_or_else(|error| panic!("raster buffers share the view's maximum: {error}"));
        }
        let full_redraw = decision.is_full_redraw();
        let mask = if full_redraw {
            TileMask::full(self.layout)
        } else {
            let mut mask = TileMask::empty(self.layout);
            mask.mark_rect(decision.dirty_rect);
            mask
        };
        let scene = Arc::new(RenderScene::capture(
            self.view,
            &self.store,
            decision.render_flags,
        ));
        report.rendered = self
            .queue
            .render(scene, &mask, full_redraw, &mut self.buffers)?;
        if report.rendered.tiles_failed > 0 {
            let count = report.rendered.tiles_failed;
            push_warning(&mut report, UpdateWarning::TilesFailed { count });
        }
        debug!(
            frame = report.frame_sequence_id,
            full_redraw,
            reason = ?report.full_redraw_reason,
            tiles = report.rendered.tiles_rendered,
            "update cycle rendered"
        );
        Ok(report)
    }
}

fn tile_layout(config: &CoreConfig, screen_size: Vec2i) -> TileLayout {
    TileLayout::new(screen_size, config.block_width, config.blocks_per_tile)
        .unwrap_or_else(|error| panic!("validated config yields a tile layout: {error}"))
}

fn push_warning(report: &mut UpdateReport, warning: UpdateWarning) {
    warn!(frame = report.frame_sequence_id, %warning, "update warning");
    report.warnings.push(warning);
}
