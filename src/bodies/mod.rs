mod edge;
mod polygon;
mod shapes;
mod vertex;

pub use self::edge::{Edge, EdgeShape};
pub use self::polygon::{Polygon, PolygonFlags};
pub use self::shapes::{make_ball, make_block, make_wall};
pub use self::vertex::Vertex;

/// Index of a body in the simulation list
pub type BodyId = usize;

/// Reference to a participant in a contact or joint.
///
/// `Scrim` is the conceptual immovable, zero-dimensional body used as the
/// world-frame endpoint for fixed joints. It has infinite mass and never
/// moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyRef {
    /// The immovable world-frame body
    Scrim,

    /// A polygon in the simulation list
    Body(BodyId),
}

impl BodyRef {
    /// Returns the body id, or None for the scrim
    pub fn id(&self) -> Option<BodyId> {
        match self {
            BodyRef::Scrim => None,
            BodyRef::Body(id) => Some(*id),
        }
    }
}
