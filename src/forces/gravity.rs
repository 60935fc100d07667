use crate::bodies::{BodyId, Polygon};
use crate::forces::{Force, ForceLaw};
use crate::math::Vector2;
use std::any::Any;

/// Uniform downward gravity acting on every finite-mass body
#[derive(Debug, Clone)]
pub struct GravityLaw {
    /// Acceleration magnitude
    gravity: f64,

    /// Height at which gravitational potential energy is zero
    zero_energy_level: f64,
}

impl GravityLaw {
    /// Creates a gravity law with the given downward acceleration
    pub fn new(gravity: f64) -> Self {
        Self {
            gravity,
            zero_energy_level: 0.0,
        }
    }

    /// Returns the acceleration magnitude
    pub fn get_gravity(&self) -> f64 {
        self.gravity
    }

    /// Sets the acceleration magnitude
    pub fn set_gravity(&mut self, gravity: f64) {
        self.gravity = gravity;
    }

    /// Sets the height at which potential energy is zero
    pub fn set_zero_energy_level(&mut self, level: f64) {
        self.zero_energy_level = level;
    }
}

impl ForceLaw for GravityLaw {
    fn law_type(&self) -> &'static str {
        "Gravity"
    }

    fn calculate_forces(&self, bodies: &[Option<Polygon>]) -> Vec<Force> {
        let mut forces = Vec::new();
        for (id, body) in bodies.iter().enumerate() {
            let body = match body {
                Some(body) if body.get_mass().is_finite() => body,
                _ => continue,
            };
            forces.push(Force::new(
                id,
                body.get_position(),
                Vector2::new(0.0, -self.gravity * body.get_mass()),
            ));
        }
        forces
    }

    fn potential_energy(&self, bodies: &[Option<Polygon>]) -> f64 {
        bodies
            .iter()
            .flatten()
            .filter(|b| b.get_mass().is_finite())
            .map(|b| b.get_mass() * self.gravity * (b.get_position().y - self.zero_energy_level))
            .sum()
    }

    fn affects_body(&self, _body: BodyId) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
