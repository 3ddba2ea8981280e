//! Anti-aliased coverage of a round brush swept along a polyline.

use document::Stroke;
use model::CanvasPoint;

/// Euclidean distance from `point` to the segment `a`-`b`, in canvas units.
pub fn distance_to_segment(point: CanvasPoint, a: CanvasPoint, b: CanvasPoint) -> f64 {
    // Work relative to `point` so the f64 operands stay small.
    let ax = (a.x - point.x) as f64;
    let ay = (a.y - point.y) as f64;
    let bx = (b.x - point.x) as f64;
    let by = (b.y - point.y) as f64;
    let dx = bx - ax;
    let dy = by - ay;
    let length_squared = dx * dx + dy * dy;
    let t = if length_squared > 0.0 {
        (-(ax * dx + ay * dy) / length_squared).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = ax + t * dx;
    let cy = ay + t * dy;
    (cx * cx + cy * cy).sqrt()
}

/// Coverage in `[0, 1]` of `stroke` at `point`.
///
/// Full inside the brush radius, linear falloff across `feather` canvas units,
/// zero beyond `radius + feather`.
pub fn coverage_at(stroke: &Stroke, point: CanvasPoint, feather: i64) -> f32 {
    let radius = stroke.brush().radius.max(0);
    let feather = feather.max(1);
    let reach = radius.saturating_add(feather);

    let mut nearest = f64::INFINITY;
    for (a, b) in stroke.segments() {
        if point.x < a.x.min(b.x).saturating_sub(reach)
            || point.x > a.x.max(b.x).saturating_add(reach)
            || point.y < a.y.min(b.y).saturating_sub(reach)
            || point.y > a.y.max(b.y).saturating_add(reach)
        {
            continue;
        }
        nearest = nearest.min(distance_to_segment(point, a, b));
        if nearest <= radius as f64 {
            return 1.0;
        }
    }

    if nearest >= reach as f64 {
        return 0.0;
    }
    (1.0 - (nearest - radius as f64) / feather as f64) as f32
}
