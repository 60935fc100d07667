use crate::collision::ContactRecord;
use crate::core::RigidBodySim;
use crate::error::PhysicsError;
use crate::integration::{Integrator, RungeKutta};
use crate::Result;

/// Drives the integrator over a time interval, localizing collision events
/// by binary subdivision of rejected steps and applying collision impulses
/// before resuming.
pub struct CollisionAdvance {
    integrator: Box<dyn Integrator>,
    backup: Vec<f64>,
    collisions: Vec<ContactRecord>,
}

impl Default for CollisionAdvance {
    fn default() -> Self {
        Self::new(Box::new(RungeKutta::new()))
    }
}

impl CollisionAdvance {
    /// Creates a time-advance loop around the given integrator
    pub fn new(integrator: Box<dyn Integrator>) -> Self {
        Self {
            integrator,
            backup: Vec::new(),
            collisions: Vec::new(),
        }
    }

    /// Returns the contact records found at the end of the last sub-step
    pub fn get_collisions(&self) -> &[ContactRecord] {
        &self.collisions
    }

    /// Advances the simulation by `time_step`, subdividing around collision
    /// instants and resolving them with impulses.
    pub fn advance(&mut self, sim: &mut RigidBodySim, time_step: f64) -> Result<()> {
        let mut remaining = time_step;
        let min_step = time_step * 1e-9;
        let mut stalled = 0;
        while remaining > 1e-12 {
            self.backup.clear();
            self.backup.extend_from_slice(sim.get_state().values());
            let mut h = remaining;
            let mut advanced = false;
            while h >= min_step {
                match self.integrator.step(sim, h)? {
                    None => {
                        advanced = true;
                        break;
                    }
                    Some(_) => {
                        // back up and retry closer to the collision instant
                        sim.set_state_values(&self.backup)?;
                        sim.synchronize_bodies();
                        h *= 0.5;
                    }
                }
            }
            if advanced {
                remaining -= h;
                stalled = 0;
            } else {
                stalled += 1;
                if stalled > 100 {
                    return Err(PhysicsError::SolverError(
                        "time advance unable to get past collision".to_string(),
                    ));
                }
            }
            // resolve any imminent or illegal collisions at the current state
            self.collisions.clear();
            sim.detect_collisions(&mut self.collisions, remaining.max(min_step))?;
            if self.collisions.iter().any(|c| c.needs_impulse()) {
                sim.handle_collisions(&mut self.collisions, None)?;
            } else if !advanced {
                return Err(PhysicsError::SolverError(
                    "step rejected with no collision to resolve".to_string(),
                ));
            }
        }
        Ok(())
    }
}
