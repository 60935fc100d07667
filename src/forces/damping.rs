use crate::bodies::{BodyId, Polygon};
use crate::forces::{Force, ForceLaw};
use std::any::Any;

/// Viscous damping proportional to each body's velocity
#[derive(Debug, Clone)]
pub struct DampingLaw {
    /// Linear damping coefficient
    damping: f64,

    /// Ratio of rotational to linear damping
    rotate_ratio: f64,
}

impl DampingLaw {
    /// Creates a damping law with the given coefficient and rotational ratio
    pub fn new(damping: f64, rotate_ratio: f64) -> Self {
        Self {
            damping: damping.max(0.0),
            rotate_ratio: rotate_ratio.max(0.0),
        }
    }

    /// Returns the linear damping coefficient
    pub fn get_damping(&self) -> f64 {
        self.damping
    }

    /// Sets the linear damping coefficient
    pub fn set_damping(&mut self, damping: f64) {
        self.damping = damping.max(0.0);
    }
}

impl ForceLaw for DampingLaw {
    fn law_type(&self) -> &'static str {
        "Damping"
    }

    fn calculate_forces(&self, bodies: &[Option<Polygon>]) -> Vec<Force> {
        let mut forces = Vec::new();
        if self.damping == 0.0 {
            return forces;
        }
        for (id, body) in bodies.iter().enumerate() {
            let body = match body {
                Some(body) if body.get_mass().is_finite() => body,
                _ => continue,
            };
            let mut force = Force::new(id, body.get_position(), -body.get_velocity() * self.damping);
            force.torque = -self.damping * self.rotate_ratio * body.get_angular_velocity();
            forces.push(force);
        }
        forces
    }

    fn affects_body(&self, _body: BodyId) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
