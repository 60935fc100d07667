use crate::math::{limit_angle, Vector2};

/// Overshoot applied to the tightest centroid-to-edge bound so that proximity
/// tests never miss by a hair.
const CENTROID_RADIUS_OVERSHOOT: f64 = 1.25;

/// The geometric variant of an edge
#[derive(Debug, Clone)]
pub enum EdgeShape {
    /// A straight segment
    Straight {
        /// Whether the outside of the polygon is on the positive-y side of
        /// the edge line (positive-x side for vertical edges)
        outside_is_up: bool,

        /// Cached outward unit normal in body coordinates
        normal: Vector2,
    },

    /// An arc of a circle
    Circular {
        /// Circle center in body coordinates
        center: Vector2,

        /// Circle radius
        radius: f64,

        /// Whether the arc runs clockwise from start to end vertex
        clockwise: bool,

        /// Whether the outside of the polygon is away from the center
        outside_is_out: bool,

        /// Angle of the start vertex, measured at the center
        angle_start: f64,

        /// Angle of the end vertex; >= angle_start for counter-clockwise
        /// arcs, <= angle_start for clockwise arcs
        angle_end: f64,
    },
}

/// One boundary element of a polygon.
///
/// Endpoint positions are cached from the owning polygon's vertices when the
/// polygon is finished; the vertex list is frozen from then on.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Index of this edge within its polygon
    index: usize,

    /// Start vertex index
    v1: usize,

    /// End vertex index
    v2: usize,

    /// Start point in body coordinates
    p1: Vector2,

    /// End point in body coordinates
    p2: Vector2,

    /// Centroid of the edge in body coordinates
    centroid_body: Vector2,

    /// Tightest distance from the centroid that encloses the whole edge
    max_distance: f64,

    shape: EdgeShape,
}

impl Edge {
    /// Creates a straight edge between the given endpoints
    pub(crate) fn new_straight(
        index: usize,
        v1: usize,
        v2: usize,
        p1: Vector2,
        p2: Vector2,
        outside_is_up: bool,
    ) -> Self {
        let d = p2 - p1;
        let candidate = d.perpendicular().normalize();
        // pick the perpendicular whose "up" sense matches the flag;
        // vertical edges break the tie on x
        let up = if candidate.y.abs() > crate::math::TINY {
            candidate.y > 0.0
        } else {
            candidate.x > 0.0
        };
        let normal = if up == outside_is_up {
            candidate
        } else {
            -candidate
        };
        let centroid_body = (p1 + p2) * 0.5;
        let max_distance = p1.distance(&p2) * 0.5;
        Self {
            index,
            v1,
            v2,
            p1,
            p2,
            centroid_body,
            max_distance,
            shape: EdgeShape::Straight {
                outside_is_up,
                normal,
            },
        }
    }

    /// Creates a circular edge from `p1` to `p2` around `center`
    pub(crate) fn new_circular(
        index: usize,
        v1: usize,
        v2: usize,
        p1: Vector2,
        p2: Vector2,
        center: Vector2,
        clockwise: bool,
        outside_is_out: bool,
    ) -> Self {
        let radius = ((p1 - center).length() + (p2 - center).length()) * 0.5;
        let angle_start = (p1 - center).angle();
        let mut angle_end = (p2 - center).angle();
        let two_pi = 2.0 * std::f64::consts::PI;
        if clockwise {
            while angle_end > angle_start - crate::math::TINY {
                angle_end -= two_pi;
            }
        } else {
            while angle_end < angle_start + crate::math::TINY {
                angle_end += two_pi;
            }
        }
        let mid_angle = (angle_start + angle_end) * 0.5;
        let centroid_body = center + Vector2::new(mid_angle.cos(), mid_angle.sin()) * radius;
        let span = (angle_end - angle_start).abs();
        let max_distance = if span >= two_pi - 1e-9 {
            2.0 * radius
        } else {
            centroid_body.distance(&p1).max(centroid_body.distance(&p2))
        };
        Self {
            index,
            v1,
            v2,
            p1,
            p2,
            centroid_body,
            max_distance,
            shape: EdgeShape::Circular {
                center,
                radius,
                clockwise,
                outside_is_out,
                angle_start,
                angle_end,
            },
        }
    }

    /// Returns the index of this edge within its polygon
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the start vertex index
    pub fn vertex1(&self) -> usize {
        self.v1
    }

    /// Returns the end vertex index
    pub fn vertex2(&self) -> usize {
        self.v2
    }

    /// Returns the start point in body coordinates
    pub fn point1(&self) -> Vector2 {
        self.p1
    }

    /// Returns the end point in body coordinates
    pub fn point2(&self) -> Vector2 {
        self.p2
    }

    /// Returns the edge shape variant
    pub fn shape(&self) -> &EdgeShape {
        &self.shape
    }

    /// Returns true for the straight variant
    pub fn is_straight(&self) -> bool {
        matches!(self.shape, EdgeShape::Straight { .. })
    }

    /// Returns the centroid of the edge in body coordinates
    pub fn centroid_body(&self) -> Vector2 {
        self.centroid_body
    }

    /// Returns the maximum distance from the centroid to any point on the edge
    pub fn max_distance_from_centroid(&self) -> f64 {
        self.max_distance
    }

    /// Returns the centroid-radius: the enclosing bound used by proximity
    /// tests, deliberately larger than the tightest bound
    pub fn centroid_radius(&self) -> f64 {
        self.max_distance * CENTROID_RADIUS_OVERSHOOT
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn set_vertex2(&mut self, v2: usize) {
        self.v2 = v2;
    }

    /// Signed distance from a body-coordinate point to this edge: positive on
    /// the outside, negative inside. Returns infinity when the point is
    /// beyond the reach of the segment or arc.
    pub fn distance_to_point(&self, p: Vector2) -> f64 {
        match &self.shape {
            EdgeShape::Straight { normal, .. } => {
                let t = crate::math::line_projection_param(p, self.p1, self.p2);
                if !(0.0..=1.0).contains(&t) {
                    return f64::INFINITY;
                }
                (p - self.p1).dot(normal)
            }
            EdgeShape::Circular {
                center,
                radius,
                outside_is_out,
                ..
            } => {
                let v = p - *center;
                if !self.is_within_arc(v.angle()) {
                    return f64::INFINITY;
                }
                let d = v.length() - radius;
                if *outside_is_out {
                    d
                } else {
                    -d
                }
            }
        }
    }

    /// Outward unit normal at a body-coordinate point on (or near) the edge
    pub fn normal_at(&self, p: Vector2) -> Vector2 {
        match &self.shape {
            EdgeShape::Straight { normal, .. } => *normal,
            EdgeShape::Circular {
                center,
                outside_is_out,
                ..
            } => {
                let radial = (p - *center).normalize();
                if *outside_is_out {
                    radial
                } else {
                    -radial
                }
            }
        }
    }

    /// Signed radius of curvature at a point on the edge: infinite for
    /// straight edges, positive when the outside is convex, negative when
    /// concave.
    pub fn curvature_at(&self, _p: Vector2) -> f64 {
        match &self.shape {
            EdgeShape::Straight { .. } => f64::INFINITY,
            EdgeShape::Circular {
                radius,
                outside_is_out,
                ..
            } => {
                if *outside_is_out {
                    *radius
                } else {
                    -*radius
                }
            }
        }
    }

    /// The point on the edge nearest to a body-coordinate point
    pub fn nearest_point(&self, p: Vector2) -> Vector2 {
        match &self.shape {
            EdgeShape::Straight { .. } => {
                let t = crate::math::line_projection_param(p, self.p1, self.p2).clamp(0.0, 1.0);
                self.p1 + (self.p2 - self.p1) * t
            }
            EdgeShape::Circular { center, radius, .. } => {
                let v = p - *center;
                if v.length_squared() < crate::math::TINY {
                    return self.p1;
                }
                *center + v.normalize() * *radius
            }
        }
    }

    /// Coarse test: can this edge possibly come within `swellage` of the
    /// other edge, given both edges' current world centroids?
    pub fn intersection_possible(
        &self,
        my_centroid_world: Vector2,
        other: &Edge,
        other_centroid_world: Vector2,
        swellage: f64,
    ) -> bool {
        let reach = self.centroid_radius() + other.centroid_radius() + swellage;
        my_centroid_world.distance_squared(&other_centroid_world) <= reach * reach
    }

    /// Whether the given angle (measured at the circle center) falls on the
    /// arc. Always true for straight edges.
    pub fn is_within_arc(&self, angle: f64) -> bool {
        match &self.shape {
            EdgeShape::Straight { .. } => true,
            EdgeShape::Circular {
                clockwise,
                angle_start,
                angle_end,
                ..
            } => {
                let slack = 1e-9;
                if *clockwise {
                    // arc covers [angle_end, angle_start]
                    let a = limit_angle(angle, *angle_end - slack);
                    a <= *angle_start + slack
                } else {
                    // arc covers [angle_start, angle_end]
                    let a = limit_angle(angle, *angle_start - slack);
                    a <= *angle_end + slack
                }
            }
        }
    }
}
