use crate::bodies::{BodyId, Polygon};
use crate::forces::{live_body, Force, ForceLaw};
use crate::math::Vector2;
use std::any::Any;

/// A spring between an attachment point on one body and a point on a second
/// body or a fixed world point
#[derive(Debug, Clone)]
pub struct Spring {
    /// The first body connected by the spring
    body_a: BodyId,

    /// The second body, or None when anchored to a fixed world point
    body_b: Option<BodyId>,

    /// Attachment point on the first body, body coordinates
    attach_a: Vector2,

    /// Attachment point on the second body (body coordinates) or the fixed
    /// world anchor when `body_b` is None
    attach_b: Vector2,

    /// Length at which the spring exerts no force
    rest_length: f64,

    /// Spring stiffness
    stiffness: f64,

    /// Damping along the spring axis
    damping: f64,
}

impl Spring {
    /// Creates a spring between two bodies
    pub fn new_between_bodies(
        body_a: BodyId,
        body_b: BodyId,
        attach_a: Vector2,
        attach_b: Vector2,
        rest_length: f64,
        stiffness: f64,
    ) -> Self {
        Self {
            body_a,
            body_b: Some(body_b),
            attach_a,
            attach_b,
            rest_length: rest_length.max(0.0),
            stiffness: stiffness.max(0.0),
            damping: 0.0,
        }
    }

    /// Creates a spring from a body to a fixed world point
    pub fn new_to_world_point(
        body: BodyId,
        attach: Vector2,
        world_point: Vector2,
        rest_length: f64,
        stiffness: f64,
    ) -> Self {
        Self {
            body_a: body,
            body_b: None,
            attach_a: attach,
            attach_b: world_point,
            rest_length: rest_length.max(0.0),
            stiffness: stiffness.max(0.0),
            damping: 0.0,
        }
    }

    /// Returns the spring stiffness
    pub fn get_stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Sets the spring stiffness
    pub fn set_stiffness(&mut self, stiffness: f64) {
        self.stiffness = stiffness.max(0.0);
    }

    /// Sets the damping along the spring axis
    pub fn set_damping(&mut self, damping: f64) {
        self.damping = damping.max(0.0);
    }

    fn endpoints(&self, bodies: &[Option<Polygon>]) -> Option<(Vector2, Vector2)> {
        let a = live_body(bodies, self.body_a)?;
        let pa = a.body_to_world(self.attach_a);
        let pb = match self.body_b {
            Some(id) => live_body(bodies, id)?.body_to_world(self.attach_b),
            None => self.attach_b,
        };
        Some((pa, pb))
    }
}

impl ForceLaw for Spring {
    fn law_type(&self) -> &'static str {
        "Spring"
    }

    fn calculate_forces(&self, bodies: &[Option<Polygon>]) -> Vec<Force> {
        let mut forces = Vec::new();
        let (pa, pb) = match self.endpoints(bodies) {
            Some(points) => points,
            None => return forces,
        };
        let axis = pb - pa;
        let length = axis.length();
        if length < crate::math::TINY {
            return forces;
        }
        let direction = axis / length;
        let mut magnitude = self.stiffness * (length - self.rest_length);
        if self.damping > 0.0 {
            let va = live_body(bodies, self.body_a)
                .map(|b| b.world_point_velocity(pa))
                .unwrap_or_default();
            let vb = self
                .body_b
                .and_then(|id| live_body(bodies, id))
                .map(|b| b.world_point_velocity(pb))
                .unwrap_or_default();
            magnitude += self.damping * (vb - va).dot(&direction);
        }
        let force = direction * magnitude;
        forces.push(Force::new(self.body_a, pa, force));
        if let Some(id) = self.body_b {
            forces.push(Force::new(id, pb, -force));
        }
        forces
    }

    fn potential_energy(&self, bodies: &[Option<Polygon>]) -> f64 {
        match self.endpoints(bodies) {
            Some((pa, pb)) => {
                let stretch = pa.distance(&pb) - self.rest_length;
                0.5 * self.stiffness * stretch * stretch
            }
            None => 0.0,
        }
    }

    fn affects_body(&self, body: BodyId) -> bool {
        self.body_a == body || self.body_b == Some(body)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
