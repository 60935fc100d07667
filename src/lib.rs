pub mod bodies;
pub mod collision;
pub mod constraints;
pub mod core;
pub mod forces;
pub mod integration;
pub mod math;
pub mod solver;

/// Re-export common types for easier usage
pub use crate::bodies::{make_ball, make_block, make_wall, BodyId, BodyRef, Polygon};
pub use crate::collision::{ContactRecord, ContactStatus};
pub use crate::core::{CollisionHandling, ExtraAccelPolicy, RigidBodySim, SimulationConfig};
pub use crate::integration::CollisionAdvance;
pub use crate::math::Vector2;

/// Error types for the physics engine
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum PhysicsError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Not found: {0}")]
        NotFound(String),

        #[error("State violation: {0}")]
        StateViolation(String),

        #[error("Solver error: {0}")]
        SolverError(String),
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
