use crate::bodies::{BodyId, Edge, Vertex};
use crate::error::PhysicsError;
use crate::math::Vector2;
use crate::Result;

use bitflags::bitflags;

bitflags! {
    /// Flags recording a polygon's lifecycle state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PolygonFlags: u32 {
        /// Geometry is frozen; the body may be added to a simulation
        const FINISHED = 0x01;
    }
}

/// A rigid body: an ordered list of vertices and edges forming one or more
/// closed paths, plus mass properties and a world pose.
///
/// Construction happens through the path-builder operations (`start_path`,
/// `add_straight_edge`, `add_circular_edge`, `close_path`, `finish`); after
/// `finish` the geometry is frozen and only pose, velocity, and material
/// properties may change.
#[derive(Debug, Clone)]
pub struct Polygon {
    name: String,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    flags: PolygonFlags,

    // path-builder state
    open_path_start: Option<usize>,
    last_vertex: Option<usize>,

    /// Mass; may be infinite for immovable bodies
    mass: f64,

    /// Moment of inertia about the center of mass
    moment: f64,

    /// Center of mass in body coordinates
    cm_body: Vector2,
    cm_set: bool,

    /// World position of the center of mass
    position: Vector2,
    angle: f64,
    sin_angle: f64,
    cos_angle: f64,

    velocity: Vector2,
    angular_velocity: f64,

    elasticity: f64,
    distance_tol: f64,
    velocity_tol: f64,
    accuracy: f64,

    /// Slot index of this body's 6 variables in the simulation state vector
    vars_index: Option<usize>,

    /// Bodies this one never collides with
    non_collide_bodies: Vec<BodyId>,

    /// Own edges excluded from collision (for composite bodies)
    non_collide_edges: Vec<usize>,

    /// When set, only this edge participates in collision tests
    special_edge: Option<usize>,

    // computed by finish()
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    centroid_body: Vector2,
    centroid_radius: f64,
    min_height: f64,

    /// World-coordinate edge centroids, refreshed whenever the pose changes
    edge_centroids_world: Vec<Vector2>,
    centroid_world: Vector2,
}

impl Polygon {
    /// Creates a new, empty polygon with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            edges: Vec::new(),
            flags: PolygonFlags::empty(),
            open_path_start: None,
            last_vertex: None,
            mass: 1.0,
            moment: 1.0,
            cm_body: Vector2::zero(),
            cm_set: false,
            position: Vector2::zero(),
            angle: 0.0,
            sin_angle: 0.0,
            cos_angle: 1.0,
            velocity: Vector2::zero(),
            angular_velocity: 0.0,
            elasticity: 1.0,
            distance_tol: 0.01,
            velocity_tol: 0.5,
            accuracy: 0.6,
            vars_index: None,
            non_collide_bodies: Vec::new(),
            non_collide_edges: Vec::new(),
            special_edge: None,
            left: 0.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
            centroid_body: Vector2::zero(),
            centroid_radius: 0.0,
            min_height: 0.0,
            edge_centroids_world: Vec::new(),
            centroid_world: Vector2::zero(),
        }
    }

    /// Returns the polygon's name
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Returns the polygon's flags
    pub fn get_flags(&self) -> PolygonFlags {
        self.flags
    }

    // === path building ===

    /// Begins a new path at the given vertex
    pub fn start_path(&mut self, vertex: Vertex) -> Result<()> {
        self.check_not_finished()?;
        if self.open_path_start.is_some() {
            return Err(PhysicsError::InvalidParameter(
                "previous path is still open".to_string(),
            ));
        }
        self.vertices.push(vertex);
        let idx = self.vertices.len() - 1;
        self.open_path_start = Some(idx);
        self.last_vertex = Some(idx);
        Ok(())
    }

    /// Adds a straight edge from the current path end to `end_point`.
    ///
    /// `outside_is_up` tells which side of the edge line is outside the body:
    /// the positive-y side, or the positive-x side for vertical edges.
    pub fn add_straight_edge(&mut self, end_point: Vector2, outside_is_up: bool) -> Result<usize> {
        self.check_not_finished()?;
        let v1 = self.open_vertex()?;
        let p1 = self.vertices[v1].loc_body();
        self.vertices.push(Vertex::new(end_point));
        let v2 = self.vertices.len() - 1;
        let index = self.edges.len();
        self.edges
            .push(Edge::new_straight(index, v1, v2, p1, end_point, outside_is_up));
        self.wire_edge(index, v1, v2);
        Ok(index)
    }

    /// Adds a circular edge from the current path end to `end_point`, an arc
    /// of the circle around `center`.
    pub fn add_circular_edge(
        &mut self,
        end_point: Vector2,
        center: Vector2,
        clockwise: bool,
        outside_is_out: bool,
    ) -> Result<usize> {
        self.check_not_finished()?;
        let v1 = self.open_vertex()?;
        let p1 = self.vertices[v1].loc_body();
        let r1 = (p1 - center).length();
        let r2 = (end_point - center).length();
        if (r1 - r2).abs() > 1e-6 * r1.max(1.0) {
            return Err(PhysicsError::InvalidParameter(format!(
                "arc endpoints have unequal radii: {} vs {}",
                r1, r2
            )));
        }
        self.vertices.push(Vertex::new(end_point));
        let v2 = self.vertices.len() - 1;
        let index = self.edges.len();
        self.edges.push(Edge::new_circular(
            index,
            v1,
            v2,
            p1,
            end_point,
            center,
            clockwise,
            outside_is_out,
        ));
        self.wire_edge(index, v1, v2);
        Ok(index)
    }

    /// Closes the current path by merging its final vertex with its starting
    /// vertex. The last edge added must end at the path's starting point.
    pub fn close_path(&mut self) -> Result<()> {
        self.check_not_finished()?;
        let start = self.open_path_start.ok_or_else(|| {
            PhysicsError::InvalidParameter("no open path to close".to_string())
        })?;
        let last = self.last_vertex.unwrap();
        if last == start {
            return Err(PhysicsError::InvalidParameter(
                "path has no edges".to_string(),
            ));
        }
        let start_loc = self.vertices[start].loc_body();
        let last_loc = self.vertices[last].loc_body();
        if start_loc.distance(&last_loc) > 1e-8 {
            return Err(PhysicsError::InvalidParameter(format!(
                "path is not contiguous: {} != {}",
                last_loc, start_loc
            )));
        }
        // merge the duplicate final vertex into the starting vertex
        let closing_edge = self.vertices[last].prev_edge().unwrap();
        self.edges[closing_edge].set_vertex2(start);
        self.vertices[start].set_prev_edge(closing_edge);
        debug_assert_eq!(last, self.vertices.len() - 1);
        self.vertices.pop();
        self.open_path_start = None;
        self.last_vertex = None;
        Ok(())
    }

    /// Freezes the polygon: computes centroids, bounds, and caches.
    /// Must be called before adding the body to a simulation.
    pub fn finish(&mut self) -> Result<()> {
        self.check_not_finished()?;
        if self.open_path_start.is_some() {
            return Err(PhysicsError::InvalidParameter(
                "cannot finish with an open path".to_string(),
            ));
        }
        if self.edges.is_empty() {
            return Err(PhysicsError::InvalidParameter(
                "polygon has no edges".to_string(),
            ));
        }
        for (i, edge) in self.edges.iter_mut().enumerate() {
            edge.set_index(i);
        }
        self.compute_bounds();
        if !self.cm_set {
            self.cm_body = Vector2::new(
                (self.left + self.right) * 0.5,
                (self.top + self.bottom) * 0.5,
            );
        }
        self.centroid_body = Vector2::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        );
        self.centroid_radius = self
            .edges
            .iter()
            .map(|e| self.centroid_body.distance(&e.centroid_body()) + e.centroid_radius())
            .fold(0.0, f64::max);
        self.min_height = self
            .edges
            .iter()
            .map(|e| self.cm_body.distance(&e.nearest_point(self.cm_body)))
            .fold(f64::INFINITY, f64::min);
        self.flags.insert(PolygonFlags::FINISHED);
        self.update_cached();
        Ok(())
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.flags.contains(PolygonFlags::FINISHED) {
            Err(PhysicsError::InvalidParameter(
                "polygon is already finished".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn open_vertex(&self) -> Result<usize> {
        self.last_vertex.ok_or_else(|| {
            PhysicsError::InvalidParameter("start a path before adding edges".to_string())
        })
    }

    fn wire_edge(&mut self, edge: usize, v1: usize, v2: usize) {
        self.vertices[v1].set_next_edge(edge);
        self.vertices[v2].set_prev_edge(edge);
        self.last_vertex = Some(v2);
    }

    fn compute_bounds(&mut self) {
        let mut left = f64::INFINITY;
        let mut right = f64::NEG_INFINITY;
        let mut bottom = f64::INFINITY;
        let mut top = f64::NEG_INFINITY;
        let mut extend = |p: Vector2| {
            left = left.min(p.x);
            right = right.max(p.x);
            bottom = bottom.min(p.y);
            top = top.max(p.y);
        };
        for edge in &self.edges {
            extend(edge.point1());
            extend(edge.point2());
            if let crate::bodies::EdgeShape::Circular { center, radius, .. } = edge.shape() {
                // arc extremes along each axis, when on the arc
                let extremes = [0.0, std::f64::consts::FRAC_PI_2, std::f64::consts::PI,
                    3.0 * std::f64::consts::FRAC_PI_2];
                for a in extremes {
                    if edge.is_within_arc(a) {
                        extend(*center + Vector2::new(a.cos(), a.sin()) * *radius);
                    }
                }
            }
        }
        self.left = left;
        self.right = right;
        self.top = top;
        self.bottom = bottom;
    }

    // === geometry accessors ===

    /// Returns the vertices of the polygon
    pub fn get_vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns the edges of the polygon
    pub fn get_edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Width of the bounding rectangle in body coordinates
    pub fn get_width(&self) -> f64 {
        self.right - self.left
    }

    /// Height of the bounding rectangle in body coordinates
    pub fn get_height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Left extent in body coordinates
    pub fn get_left_body(&self) -> f64 {
        self.left
    }

    /// Right extent in body coordinates
    pub fn get_right_body(&self) -> f64 {
        self.right
    }

    /// Top extent in body coordinates
    pub fn get_top_body(&self) -> f64 {
        self.top
    }

    /// Bottom extent in body coordinates
    pub fn get_bottom_body(&self) -> f64 {
        self.bottom
    }

    /// Centroid of the body in body coordinates
    pub fn get_centroid_body(&self) -> Vector2 {
        self.centroid_body
    }

    /// Centroid of the body in world coordinates
    pub fn get_centroid_world(&self) -> Vector2 {
        self.centroid_world
    }

    /// Radius of the bounding disc around the centroid
    pub fn get_centroid_radius(&self) -> f64 {
        self.centroid_radius
    }

    /// Smallest distance from the center of mass to the boundary
    pub fn get_min_height(&self) -> f64 {
        self.min_height
    }

    /// World-coordinate centroid of the given edge
    pub fn edge_centroid_world(&self, edge: usize) -> Vector2 {
        self.edge_centroids_world[edge]
    }

    // === mass properties ===

    /// Returns the mass; infinite for immovable bodies
    pub fn get_mass(&self) -> f64 {
        self.mass
    }

    /// Sets the mass, rescaling the moment of inertia proportionally.
    /// Infinite mass makes the body immovable and zeroes its velocity.
    pub fn set_mass(&mut self, mass: f64) -> Result<()> {
        if mass.is_nan() || mass <= 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "mass must be positive: {}",
                mass
            )));
        }
        if mass.is_infinite() {
            self.moment = f64::INFINITY;
            self.velocity = Vector2::zero();
            self.angular_velocity = 0.0;
        } else if self.mass.is_finite() && self.mass > 0.0 && self.moment.is_finite() {
            self.moment *= mass / self.mass;
        }
        self.mass = mass;
        Ok(())
    }

    /// Returns the moment of inertia about the center of mass
    pub fn get_moment(&self) -> f64 {
        self.moment
    }

    /// Sets the moment of inertia about the center of mass
    pub fn set_moment_about_cm(&mut self, moment: f64) -> Result<()> {
        if moment.is_nan() || moment <= 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "moment must be positive: {}",
                moment
            )));
        }
        self.moment = moment;
        Ok(())
    }

    /// Reciprocal of the mass; zero for immovable bodies
    #[inline]
    pub fn recip_mass(&self) -> f64 {
        if self.mass.is_finite() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Reciprocal of the moment of inertia; zero for immovable bodies
    #[inline]
    pub fn recip_moment(&self) -> f64 {
        if self.moment.is_finite() {
            1.0 / self.moment
        } else {
            0.0
        }
    }

    /// Returns the center of mass in body coordinates
    pub fn get_center_of_mass(&self) -> Vector2 {
        self.cm_body
    }

    /// Sets the center of mass in body coordinates
    pub fn set_center_of_mass(&mut self, cm: Vector2) {
        self.cm_body = cm;
        self.cm_set = true;
        if self.flags.contains(PolygonFlags::FINISHED) {
            self.min_height = self
                .edges
                .iter()
                .map(|e| self.cm_body.distance(&e.nearest_point(self.cm_body)))
                .fold(f64::INFINITY, f64::min);
            self.update_cached();
        }
    }

    // === pose and velocity ===

    /// World position of the center of mass
    pub fn get_position(&self) -> Vector2 {
        self.position
    }

    /// Rotation angle in radians
    pub fn get_angle(&self) -> f64 {
        self.angle
    }

    /// Sets the world position of the center of mass and the rotation angle
    pub fn set_position(&mut self, position: Vector2, angle: f64) {
        self.position = position;
        self.angle = angle;
        self.sin_angle = angle.sin();
        self.cos_angle = angle.cos();
        self.update_cached();
    }

    /// Linear velocity of the center of mass
    pub fn get_velocity(&self) -> Vector2 {
        self.velocity
    }

    /// Angular velocity in radians per second
    pub fn get_angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Sets linear and angular velocity
    pub fn set_velocity(&mut self, velocity: Vector2, angular_velocity: f64) {
        self.velocity = velocity;
        self.angular_velocity = angular_velocity;
    }

    /// Transforms a body-coordinate point to world coordinates
    pub fn body_to_world(&self, p_body: Vector2) -> Vector2 {
        self.position + (p_body - self.cm_body).rotate_cs(self.cos_angle, self.sin_angle)
    }

    /// Transforms a world-coordinate point to body coordinates
    pub fn world_to_body(&self, p_world: Vector2) -> Vector2 {
        self.cm_body + (p_world - self.position).rotate_cs(self.cos_angle, -self.sin_angle)
    }

    /// Rotates a body-coordinate vector into world coordinates
    pub fn rotate_body_to_world(&self, v: Vector2) -> Vector2 {
        v.rotate_cs(self.cos_angle, self.sin_angle)
    }

    /// Rotates a world-coordinate vector into body coordinates
    pub fn rotate_world_to_body(&self, v: Vector2) -> Vector2 {
        v.rotate_cs(self.cos_angle, -self.sin_angle)
    }

    /// Velocity of a world-coordinate point moving with the body
    pub fn world_point_velocity(&self, p_world: Vector2) -> Vector2 {
        self.velocity + (p_world - self.position).perpendicular() * self.angular_velocity
    }

    fn update_cached(&mut self) {
        self.centroid_world = self.body_to_world(self.centroid_body);
        self.edge_centroids_world.resize(self.edges.len(), Vector2::zero());
        for i in 0..self.edges.len() {
            let c = self.body_to_world(self.edges[i].centroid_body());
            self.edge_centroids_world[i] = c;
        }
    }

    // === material and tolerances ===

    /// Coefficient of elasticity in [0, 1]
    pub fn get_elasticity(&self) -> f64 {
        self.elasticity
    }

    /// Sets the coefficient of elasticity
    pub fn set_elasticity(&mut self, elasticity: f64) {
        self.elasticity = elasticity.clamp(0.0, 1.0);
    }

    /// Distance tolerance for contact detection
    pub fn get_distance_tol(&self) -> f64 {
        self.distance_tol
    }

    /// Sets the distance tolerance
    pub fn set_distance_tol(&mut self, tol: f64) {
        self.distance_tol = tol;
    }

    /// Velocity tolerance separating contacts from imminent collisions
    pub fn get_velocity_tol(&self) -> f64 {
        self.velocity_tol
    }

    /// Sets the velocity tolerance
    pub fn set_velocity_tol(&mut self, tol: f64) {
        self.velocity_tol = tol;
    }

    /// Collision-accuracy fraction in (0, 1]
    pub fn get_accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Sets the collision-accuracy fraction
    pub fn set_accuracy(&mut self, accuracy: f64) {
        self.accuracy = accuracy.clamp(f64::MIN_POSITIVE, 1.0);
    }

    // === simulation bookkeeping ===

    /// Slot index of this body's 6 variables in the state vector
    pub fn get_vars_index(&self) -> Option<usize> {
        self.vars_index
    }

    pub(crate) fn set_vars_index(&mut self, index: Option<usize>) {
        self.vars_index = index;
    }

    /// Declares that this body never collides with the given bodies
    pub fn add_non_collide_bodies(&mut self, bodies: &[BodyId]) {
        for &b in bodies {
            if !self.non_collide_bodies.contains(&b) {
                self.non_collide_bodies.push(b);
            }
        }
    }

    /// Whether collisions with the given body are suppressed
    pub fn does_not_collide(&self, body: BodyId) -> bool {
        self.non_collide_bodies.contains(&body)
    }

    /// Excludes the polygon's own edges from collision (for composite bodies)
    pub fn set_non_collide_edges(&mut self, edges: &[usize]) {
        self.non_collide_edges = edges.to_vec();
    }

    /// Whether the given edge is excluded from collision
    pub fn edge_excluded(&self, edge: usize) -> bool {
        self.non_collide_edges.contains(&edge)
    }

    /// Restricts collision testing to a single edge (for wall-like bodies)
    pub fn set_special_edge(&mut self, edge: usize) -> Result<()> {
        if edge >= self.edges.len() {
            return Err(PhysicsError::InvalidParameter(format!(
                "no such edge: {}",
                edge
            )));
        }
        self.special_edge = Some(edge);
        Ok(())
    }

    /// The single collide-capable edge, if one is set
    pub fn get_special_edge(&self) -> Option<usize> {
        self.special_edge
    }

    // === energy ===

    /// Kinetic energy of translation, zero for immovable bodies
    pub fn translational_energy(&self) -> f64 {
        if self.mass.is_finite() {
            0.5 * self.mass * self.velocity.length_squared()
        } else {
            0.0
        }
    }

    /// Kinetic energy of rotation, zero for immovable bodies
    pub fn rotational_energy(&self) -> f64 {
        if self.moment.is_finite() {
            0.5 * self.moment * self.angular_velocity * self.angular_velocity
        } else {
            0.0
        }
    }
}
