use crate::math::Vector2;

/// Returns the intersection of the infinite lines through `(p1, p2)` and
/// `(p3, p4)`, or `None` when the lines are parallel.
pub fn lines_intersection(p1: Vector2, p2: Vector2, p3: Vector2, p4: Vector2) -> Option<Vector2> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let denom = d1.cross(&d2);
    if denom.abs() < crate::math::TINY {
        return None;
    }
    let t = (p3 - p1).cross(&d2) / denom;
    Some(p1 + d1 * t)
}

/// Returns the intersection of segments `(p1, p2)` and `(p3, p4)`,
/// or `None` when they do not cross.
pub fn segments_intersection(
    p1: Vector2,
    p2: Vector2,
    p3: Vector2,
    p4: Vector2,
) -> Option<Vector2> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let denom = d1.cross(&d2);
    if denom.abs() < crate::math::TINY {
        return None;
    }
    let t = (p3 - p1).cross(&d2) / denom;
    let u = (p3 - p1).cross(&d1) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(p1 + d1 * t)
    } else {
        None
    }
}

/// Unsigned distance from point `p` to the segment `(a, b)`.
pub fn point_segment_distance(p: Vector2, a: Vector2, b: Vector2) -> f64 {
    let d = b - a;
    let len_sq = d.length_squared();
    if len_sq < crate::math::TINY {
        return p.distance(&a);
    }
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    p.distance(&(a + d * t))
}

/// Projection parameter of point `p` onto the infinite line through `(a, b)`,
/// where 0 maps to `a` and 1 maps to `b`.
pub fn line_projection_param(p: Vector2, a: Vector2, b: Vector2) -> f64 {
    let d = b - a;
    let len_sq = d.length_squared();
    if len_sq < crate::math::TINY {
        return 0.0;
    }
    (p - a).dot(&d) / len_sq
}

/// Brings `angle` into the half-open interval `[low, low + 2*PI)`.
pub fn limit_angle(angle: f64, low: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let mut a = angle;
    while a < low {
        a += two_pi;
    }
    while a >= low + two_pi {
        a -= two_pi;
    }
    a
}
