use model::ScreenRect;
use protocol::RenderFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSchedulerConfig {
    /// Pixel group edge sampled once while fast drawing.
    pub fast_draw_downsampling: i32,
}

impl Default for FrameSchedulerConfig {
    fn default() -> Self {
        Self {
            fast_draw_downsampling: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawReason {
    QualityRestored,
    FullRefresh,
    Zoom,
    Pan,
    Resize,
    Reset,
    History,
    StrokeDropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSchedulerDecision {
    pub frame_sequence_id: u64,
    pub render_flags: RenderFlags,
    pub downsampling_factor: i32,
    /// Union of the cycle's input footprints. Ignored on a full redraw.
    pub dirty_rect: ScreenRect,
    /// First reason that forced a full redraw this cycle.
    pub full_redraw_reason: Option<RedrawReason>,
}

impl FrameSchedulerDecision {
    pub fn is_full_redraw(&self) -> bool {
        self.render_flags.contains(RenderFlags::FULL_REDRAW)
    }

    pub fn needs_render(&self) -> bool {
        self.is_full_redraw() || !self.dirty_rect.is_empty()
    }
}

/// Decides, once per update cycle, how much of the screen to rasterize.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    config: FrameSchedulerConfig,
    quality_redraw_pending: bool,
    frame_sequence_id: u64,
    downsampling_factor: i32,
    render_flags: RenderFlags,
    dirty_rect: ScreenRect,
    full_redraw_reason: Option<RedrawReason>,
}

impl FrameScheduler {
    pub fn new(config: FrameSchedulerConfig) -> Self {
        Self {
            config,
            quality_redraw_pending: false,
            frame_sequence_id: 0,
            downsampling_factor: 1,
            render_flags: RenderFlags::empty(),
            dirty_rect: ScreenRect::default(),
            full_redraw_reason: None,
        }
    }

    pub fn config(&self) -> FrameSchedulerConfig {
        self.config
    }

    pub fn quality_redraw_pending(&self) -> bool {
        self.quality_redraw_pending
    }

    /// Starts a cycle and returns the downsampling factor to render with.
    ///
    /// Fast drawing lowers quality and arms a quality redraw; the first cycle
    /// without fast drawing consumes it as a full redraw.
    pub fn begin_frame(&mut self, frame_sequence_id: u64, fast_draw: bool) -> i32 {
        self.frame_sequence_id = frame_sequence_id;
        self.render_flags = RenderFlags::empty();
        self.dirty_rect = ScreenRect::default();
        self.full_redraw_reason = None;

        if fast_draw {
            self.downsampling_factor = self.config.fast_draw_downsampling.max(1);
            self.quality_redraw_pending = true;
        } else {
            self.downsampling_factor = 1;
            if self.quality_redraw_pending {
                self.quality_redraw_pending = false;
                self.request_full_redraw(RedrawReason::QualityRestored);
            }
        }
        self.downsampling_factor
    }

    pub fn request_full_redraw(&mut self, reason: RedrawReason) {
        self.render_flags |= RenderFlags::FULL_REDRAW;
        self.full_redraw_reason.get_or_insert(reason);
    }

    pub fn mark_dirty(&mut self, rect: ScreenRect) {
        self.dirty_rect = self.dirty_rect.union(&rect);
    }

    pub fn mark_picker_updated(&mut self) {
        self.render_flags |= RenderFlags::PICKER_UPDATED;
    }

    pub fn finish_frame(&mut self) -> FrameSchedulerDecision {
        FrameSchedulerDecision {
            frame_sequence_id: self.frame_sequence_id,
            render_flags: self.render_flags,
            downsampling_factor: self.downsampling_factor,
            dirty_rect: std::mem::take(&mut self.dirty_rect),
            full_redraw_reason: self.full_redraw_reason.take(),
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(FrameSchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_draw_lowers_quality_and_arms_redraw() {
        let mut scheduler = FrameScheduler::default();

        let factor = scheduler.begin_frame(1, true);
        let decision = scheduler.finish_frame();

        assert_eq!(factor, 2);
        assert_eq!(decision.downsampling_factor, 2);
        assert!(!decision.is_full_redraw());
        assert!(scheduler.quality_redraw_pending());
    }

    #[test]
    fn clearing_fast_draw_triggers_exactly_one_quality_redraw() {
        let mut scheduler = FrameScheduler::default();
        scheduler.begin_frame(1, true);
        scheduler.finish_frame();

        scheduler.begin_frame(2, false);
        let restored = scheduler.finish_frame();
        assert!(restored.is_full_redraw());
        assert_eq!(
            restored.full_redraw_reason,
            Some(RedrawReason::QualityRestored)
        );
        assert_eq!(restored.downsampling_factor, 1);

        scheduler.begin_frame(3, false);
        let idle = scheduler.finish_frame();
        assert!(!idle.is_full_redraw());
        assert!(!idle.needs_render());
    }

    #[test]
    fn first_full_redraw_reason_wins() {
        let mut scheduler = FrameScheduler::default();
        scheduler.begin_frame(9, false);
        scheduler.request_full_redraw(RedrawReason::FullRefresh);
        scheduler.request_full_redraw(RedrawReason::Zoom);
        let decision = scheduler.finish_frame();
        assert_eq!(decision.frame_sequence_id, 9);
        assert_eq!(decision.full_redraw_reason, Some(RedrawReason::FullRefresh));
    }

    #[test]
    fn dirty_rects_union_within_a_cycle_and_reset_after() {
        let mut scheduler = FrameScheduler::default();
        scheduler.begin_frame(1, false);
        scheduler.mark_dirty(ScreenRect::new(0, 0, 4, 4));
        scheduler.mark_dirty(ScreenRect::new(10, 10, 12, 12));
        scheduler.mark_picker_updated();
        let decision = scheduler.finish_frame();
        assert_eq!(decision.dirty_rect, ScreenRect::new(0, 0, 12, 12));
        assert!(decision.render_flags.contains(RenderFlags::PICKER_UPDATED));
        assert!(decision.needs_render());

        scheduler.begin_frame(2, false);
        assert!(scheduler.finish_frame().dirty_rect.is_empty());
    }
}
