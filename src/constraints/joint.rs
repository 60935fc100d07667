use crate::bodies::{BodyId, BodyRef, Polygon};
use crate::collision::ContactRecord;
use crate::constraints::Connector;
use crate::math::Vector2;
use std::any::Any;

/// A bilateral constraint holding an attachment point on one body against an
/// attachment point on a second body (or on the scrim) along a single normal
/// direction.
///
/// One joint removes one degree of freedom; a pin is two joints with
/// perpendicular normals at the same point (see [`pin_to_scrim`]).
#[derive(Debug, Clone)]
pub struct Joint {
    /// The primary body
    body1: BodyRef,

    /// The normal body; its frame carries the normal direction
    body2: BodyRef,

    /// Attachment on body1: body coordinates, or world coordinates when
    /// body1 is the scrim
    attach1: Vector2,

    /// Attachment on body2: body coordinates, or world coordinates when
    /// body2 is the scrim
    attach2: Vector2,

    /// Unit normal in body2's frame (world frame when body2 is the scrim)
    normal: Vector2,
}

impl Joint {
    /// Creates a joint between two participants
    pub fn new(
        body1: BodyRef,
        attach1: Vector2,
        body2: BodyRef,
        attach2: Vector2,
        normal: Vector2,
    ) -> Self {
        Self {
            body1,
            body2,
            attach1,
            attach2,
            normal: normal.normalize(),
        }
    }

    fn attach1_world(&self, bodies: &[Option<Polygon>]) -> Vector2 {
        match self.body1 {
            BodyRef::Scrim => self.attach1,
            BodyRef::Body(id) => match bodies.get(id).and_then(|b| b.as_ref()) {
                Some(b) => b.body_to_world(self.attach1),
                None => self.attach1,
            },
        }
    }

    fn attach2_world(&self, bodies: &[Option<Polygon>]) -> Vector2 {
        match self.body2 {
            BodyRef::Scrim => self.attach2,
            BodyRef::Body(id) => match bodies.get(id).and_then(|b| b.as_ref()) {
                Some(b) => b.body_to_world(self.attach2),
                None => self.attach2,
            },
        }
    }

    fn normal_world(&self, bodies: &[Option<Polygon>]) -> Vector2 {
        match self.body2 {
            BodyRef::Scrim => self.normal,
            BodyRef::Body(id) => match bodies.get(id).and_then(|b| b.as_ref()) {
                Some(b) => b.rotate_body_to_world(self.normal),
                None => self.normal,
            },
        }
    }

    /// Signed gap along the normal between the two attachment points
    pub fn get_normal_distance(&self, bodies: &[Option<Polygon>]) -> f64 {
        let p1 = self.attach1_world(bodies);
        let p2 = self.attach2_world(bodies);
        self.normal_world(bodies).dot(&(p1 - p2))
    }
}

impl Connector for Joint {
    fn connector_type(&self) -> &'static str {
        "Joint"
    }

    fn add_collision(
        &self,
        list: &mut Vec<ContactRecord>,
        bodies: &[Option<Polygon>],
        _time: f64,
        _accuracy: f64,
    ) {
        let p1 = self.attach1_world(bodies);
        let p2 = self.attach2_world(bodies);
        let n = self.normal_world(bodies);
        let body = |r: BodyRef| match r {
            BodyRef::Scrim => None,
            BodyRef::Body(id) => bodies.get(id).and_then(|b| b.as_ref()),
        };
        let b1 = body(self.body1);
        let b2 = body(self.body2);
        let v1 = b1.map(|b| b.world_point_velocity(p1)).unwrap_or_default();
        let v2 = b2.map(|b| b.world_point_velocity(p2)).unwrap_or_default();
        // the normal turns with the normal body
        let omega2 = b2.map(|b| b.get_angular_velocity()).unwrap_or(0.0);
        let distance_tol = b1
            .map(|b| b.get_distance_tol())
            .or_else(|| b2.map(|b| b.get_distance_tol()))
            .unwrap_or(0.01);
        let velocity_tol = b1
            .map(|b| b.get_velocity_tol())
            .or_else(|| b2.map(|b| b.get_velocity_tol()))
            .unwrap_or(0.5);
        list.push(ContactRecord {
            primary: self.body1,
            normal_body: self.body2,
            primary_edge: None,
            normal_edge: None,
            impact1: p1,
            impact2: p2,
            normal: n,
            distance: n.dot(&(p1 - p2)),
            normal_velocity: n.dot(&(v1 - v2)),
            joint: true,
            r1: f64::INFINITY,
            r2: f64::INFINITY,
            elasticity: 0.0,
            normal_dot: Some(n.perpendicular() * omega2),
            impulse: 0.0,
            distance_tol,
            velocity_tol,
        });
    }

    fn align(&self, bodies: &mut [Option<Polygon>]) {
        let shift = {
            let bodies_ref: &[Option<Polygon>] = bodies;
            self.attach1_world(bodies_ref) - self.attach2_world(bodies_ref)
        };
        match self.body2 {
            BodyRef::Body(id) => {
                if let Some(b) = bodies.get_mut(id).and_then(|b| b.as_mut()) {
                    let angle = b.get_angle();
                    let pos = b.get_position() + shift;
                    b.set_position(pos, angle);
                }
            }
            BodyRef::Scrim => {
                if let BodyRef::Body(id) = self.body1 {
                    if let Some(b) = bodies.get_mut(id).and_then(|b| b.as_mut()) {
                        let angle = b.get_angle();
                        let pos = b.get_position() - shift;
                        b.set_position(pos, angle);
                    }
                }
            }
        }
    }

    fn get_bodies(&self) -> (BodyRef, BodyRef) {
        (self.body1, self.body2)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Pins a point of a body to a fixed world point with two joints whose
/// normals are perpendicular.
pub fn pin_to_scrim(body: BodyId, attach: Vector2, world_point: Vector2) -> (Joint, Joint) {
    let horizontal = Joint::new(
        BodyRef::Body(body),
        attach,
        BodyRef::Scrim,
        world_point,
        Vector2::unit_x(),
    );
    let vertical = Joint::new(
        BodyRef::Body(body),
        attach,
        BodyRef::Scrim,
        world_point,
        Vector2::unit_y(),
    );
    (horizontal, vertical)
}
