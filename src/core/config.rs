use bitflags::bitflags;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Policy for the extra acceleration added at contacts to bleed off residual
/// gap velocity and penetration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ExtraAccelPolicy {
    /// No extra acceleration
    None,

    /// Remove residual normal velocity at contacts
    Velocity,

    /// Remove residual normal velocity at contacts and joints
    VelocityJoints,

    /// Remove residual normal velocity and gap error at contacts
    VelocityAndDistance,

    /// Remove residual normal velocity and gap error at contacts and joints
    VelocityAndDistanceJoints,
}

/// Policy for resolving simultaneous collisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum CollisionHandling {
    /// Solve all collisions in a single simultaneous pass
    Simultaneous,

    /// Repeatedly solve the worst collision grouped with everything it touches
    Hybrid,

    /// Serial focus, including joints connected to the focus
    SerialGrouped,

    /// Serial grouped, with a final zero-elasticity cleanup pass
    SerialGroupedLastPass,

    /// Serial focus on single collisions only
    SerialSeparate,

    /// Serial separate, with a final zero-elasticity cleanup pass
    SerialSeparateLastPass,
}

bitflags! {
    /// Visualization hints; these do not affect the simulation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DebugFlags: u32 {
        /// Record contact forces for display
        const SHOW_FORCES = 0x01;

        /// Record collisions for display
        const SHOW_COLLISIONS = 0x02;
    }
}

/// Configuration parameters for the simulation
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Distance tolerance: gap at which bodies are considered in contact
    pub distance_tol: f64,

    /// Velocity tolerance: relative normal speed separating resting contact
    /// from imminent collision
    pub velocity_tol: f64,

    /// Fraction of the gap to travel when binary-searching for the moment of
    /// collision, in (0, 1]
    pub collision_accuracy: f64,

    /// Extra-acceleration policy for the contact-force solver
    pub extra_accel: ExtraAccelPolicy,

    /// Collision-handling policy for the impulse solver
    pub collision_handling: CollisionHandling,

    /// Seed for the deterministic random number generator
    pub random_seed: u32,

    /// Nominal step size used by the extra-acceleration terms, independent
    /// of the integrator's internal sub-step
    pub contact_step: f64,

    /// Solve contact subsets (weakly connected components) independently
    pub subset_collisions: bool,

    /// Visualization hints
    pub debug: DebugFlags,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            distance_tol: 0.01,
            velocity_tol: 0.5,
            collision_accuracy: 0.6,
            extra_accel: ExtraAccelPolicy::VelocityAndDistanceJoints,
            collision_handling: CollisionHandling::SerialGroupedLastPass,
            random_seed: 0,
            contact_step: 0.025,
            subset_collisions: true,
            debug: DebugFlags::empty(),
        }
    }
}
