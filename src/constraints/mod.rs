mod joint;

pub use self::joint::{pin_to_scrim, Joint};

use crate::bodies::{BodyId, BodyRef, Polygon};
use crate::collision::ContactRecord;
use std::any::Any;

/// Base trait for bilateral constraints connecting two bodies.
///
/// A connector contributes joint contact records to collision detection and
/// can snap its bodies into alignment when added to a simulation.
pub trait Connector: Send + Sync + std::fmt::Debug + 'static {
    /// Returns the type name of the connector
    fn connector_type(&self) -> &'static str;

    /// Appends this connector's contact records to the list
    fn add_collision(
        &self,
        list: &mut Vec<ContactRecord>,
        bodies: &[Option<Polygon>],
        time: f64,
        accuracy: f64,
    );

    /// Moves the second body (or the first, when the second is the scrim) so
    /// the connector is exactly satisfied
    fn align(&self, bodies: &mut [Option<Polygon>]);

    /// The two bodies joined by this connector
    fn get_bodies(&self) -> (BodyRef, BodyRef);

    /// Whether the connector involves the given body
    fn involves_body(&self, body: BodyId) -> bool {
        let (a, b) = self.get_bodies();
        a == BodyRef::Body(body) || b == BodyRef::Body(body)
    }

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;
}
