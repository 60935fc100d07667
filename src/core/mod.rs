pub mod config;
pub mod events;
pub mod sim;
pub mod state;

pub use self::config::{CollisionHandling, DebugFlags, ExtraAccelPolicy, SimulationConfig};
pub use self::events::{EventQueue, SimEvent, SimEventType};
pub use self::sim::RigidBodySim;
pub use self::state::StateVector;

/// Energy of the simulation, split into its components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyInfo {
    /// Potential energy stored by the force laws
    pub potential: f64,

    /// Kinetic energy of translation
    pub translational: f64,

    /// Kinetic energy of rotation
    pub rotational: f64,
}

impl EnergyInfo {
    /// Total energy
    pub fn total(&self) -> f64 {
        self.potential + self.translational + self.rotational
    }
}
