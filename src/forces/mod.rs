mod damping;
mod gravity;
mod spring;

pub use self::damping::DampingLaw;
pub use self::gravity::GravityLaw;
pub use self::spring::Spring;

use crate::bodies::{BodyId, Polygon};
use crate::math::Vector2;
use std::any::Any;

/// A force applied to one body at a world-coordinate point, with an optional
/// additional pure torque.
#[derive(Debug, Clone, Copy)]
pub struct Force {
    /// The body the force acts on
    pub body: BodyId,

    /// Application point in world coordinates
    pub location: Vector2,

    /// Force vector in world coordinates
    pub vector: Vector2,

    /// Additional torque about the center of mass
    pub torque: f64,
}

impl Force {
    /// Creates a force with no additional torque
    pub fn new(body: BodyId, location: Vector2, vector: Vector2) -> Self {
        Self {
            body,
            location,
            vector,
            torque: 0.0,
        }
    }

    /// Returns true if the force vector and torque are finite
    pub fn is_finite(&self) -> bool {
        self.vector.is_finite() && self.torque.is_finite() && self.location.is_finite()
    }
}

/// Base trait for laws that apply forces to bodies each evaluation
pub trait ForceLaw: Send + Sync + std::fmt::Debug + 'static {
    /// Returns the type name of the force law
    fn law_type(&self) -> &'static str;

    /// Computes the forces on the given bodies in their current state
    fn calculate_forces(&self, bodies: &[Option<Polygon>]) -> Vec<Force>;

    /// Potential energy stored by this law in the current state
    fn potential_energy(&self, _bodies: &[Option<Polygon>]) -> f64 {
        0.0
    }

    /// Returns true if the force law affects the given body
    fn affects_body(&self, body: BodyId) -> bool;

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;
}

pub(crate) fn live_body(bodies: &[Option<Polygon>], id: BodyId) -> Option<&Polygon> {
    bodies.get(id).and_then(|b| b.as_ref())
}
