mod collision_advance;
mod runge_kutta;

pub use self::collision_advance::CollisionAdvance;
pub use self::runge_kutta::RungeKutta;

use crate::collision::ContactRecord;
use crate::core::RigidBodySim;
use crate::Result;

/// Trait for numerical integration algorithms driving the simulation's
/// state vector through its `evaluate` operation.
pub trait Integrator: Send {
    /// Advances the simulation by one step. Returns the contact records
    /// when the step was rejected because of an illegal penetration; the
    /// simulation is left at its incoming state in that case.
    fn step(&mut self, sim: &mut RigidBodySim, step_size: f64)
        -> Result<Option<Vec<ContactRecord>>>;

    /// Returns the name of the integrator
    fn name(&self) -> &str;
}
