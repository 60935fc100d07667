mod geometry;
mod rng;
mod vector;

pub use geometry::{
    limit_angle, line_projection_param, lines_intersection, point_segment_distance,
    segments_intersection,
};
pub use rng::RandomLcg;
pub use vector::Vector2;

/// Threshold below which a length or denominator is treated as degenerate
pub const TINY: f64 = 1.0e-14;

/// Constant for a very small number, used for comparisons
pub const EPSILON: f64 = 1.0e-10;

/// Returns true if the two floating point values are approximately equal
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Returns true if the value is approximately zero
#[inline]
pub fn approx_zero(a: f64) -> bool {
    a.abs() < EPSILON
}
