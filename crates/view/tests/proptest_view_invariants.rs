//! Property tests for the raster/canvas transform.
//!
//! 1. raster -> canvas -> raster returns the original pixel for any pan/zoom.
//! 2. Pan normalization leaves the pan vector in `(-radius, radius]` and moves
//!    exactly the crossed radius-widths into the tile focus.

use model::Vec2i;
use proptest::prelude::*;
use view::{CanvasView, ViewConfig};

fn view_with(radius: i64, scale: i64) -> CanvasView {
    CanvasView::new(ViewConfig {
        max_screen_size: Vec2i::new(4096, 4096),
        initial_scale: scale,
        canvas_tile_radius: radius,
        ..ViewConfig::default()
    })
    .expect("view")
}

proptest! {
    #[test]
    fn raster_canvas_round_trip(
        scale in 1i64..20_000,
        radius in 1i64..1_000_000_000,
        pans in proptest::collection::vec((-5_000i32..5_000, -5_000i32..5_000), 0..6),
        px in 0i32..2048,
        py in 0i32..2048,
    ) {
        let mut view = view_with(radius, scale);
        for (dx, dy) in pans {
            view.resize(Vec2i::new(dx, dy), Vec2i::new(2048, 2048)).expect("pan");
        }
        let point = Vec2i::new(px, py);
        let back = view.canvas_to_raster(view.raster_to_canvas(point));
        prop_assert!((back.x - point.x).abs() <= 1 && (back.y - point.y).abs() <= 1,
            "round trip {:?} -> {:?}", point, back);
    }

    #[test]
    fn pan_normalization_counts_crossed_widths(
        radius in 1i64..100_000,
        dx in -1_000_000i32..1_000_000,
        dy in -1_000_000i32..1_000_000,
    ) {
        let mut view = view_with(radius, 1);
        let before_focus = view.canvas_tile_focus();
        let before_pan = view.pan_vector();
        view.resize(Vec2i::new(dx, dy), Vec2i::new(100, 100)).expect("pan");

        let pan = view.pan_vector();
        let focus = view.canvas_tile_focus();
        prop_assert!(pan.x > -radius && pan.x <= radius);
        prop_assert!(pan.y > -radius && pan.y <= radius);

        // Total canvas offset is preserved across the wrap.
        prop_assert_eq!(
            before_pan.x + before_focus.x * radius + dx as i64,
            pan.x + focus.x * radius
        );
        prop_assert_eq!(
            before_pan.y + before_focus.y * radius + dy as i64,
            pan.y + focus.y * radius
        );
    }
}
