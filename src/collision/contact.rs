use crate::bodies::BodyRef;
use crate::math::Vector2;

/// Classification of a contact record at the moment it was created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactStatus {
    /// Interpenetrating deeper than half the distance tolerance while
    /// approaching; the current step must be rejected
    Illegal,

    /// Within the distance tolerance with small relative normal speed;
    /// handled by the contact-force solver
    Contact,

    /// Within the distance tolerance but approaching faster than the
    /// velocity tolerance; handled by the impulse solver
    ImminentCollision,

    /// Moving apart, or too far away to matter
    Separating,
}

/// A contact, collision, or joint between two bodies.
///
/// The normal points out of the normal body and into the primary body, so a
/// positive normal velocity means the bodies are separating. Once created
/// for a time step a record is immutable except for its computed impulse or
/// force magnitude.
#[derive(Debug, Clone)]
pub struct ContactRecord {
    /// The body whose vertex or curved edge defines the contact point
    pub primary: BodyRef,

    /// The body whose edge supplies the contact normal
    pub normal_body: BodyRef,

    /// Index of the participating edge on the primary body, if any
    pub primary_edge: Option<usize>,

    /// Index of the participating edge on the normal body, if any
    pub normal_edge: Option<usize>,

    /// Impact point on the primary body, world coordinates
    pub impact1: Vector2,

    /// Impact point on the normal body, world coordinates
    pub impact2: Vector2,

    /// Unit normal, world coordinates, pointing from the normal body into
    /// the primary body
    pub normal: Vector2,

    /// Signed gap: positive when separated, negative when interpenetrating
    pub distance: f64,

    /// Relative normal velocity at creation: positive when separating
    pub normal_velocity: f64,

    /// Whether this is a bilateral constraint
    pub joint: bool,

    /// Signed radius of curvature on the primary side: 0 at a corner,
    /// infinite on a straight edge, negative when concave
    pub r1: f64,

    /// Signed radius of curvature on the normal side
    pub r2: f64,

    /// Combined elasticity of the two bodies
    pub elasticity: f64,

    /// Pre-computed time derivative of the normal, for connectors whose
    /// normal rotates in a known way
    pub normal_dot: Option<Vector2>,

    /// Solved impulse or force magnitude; written by the solvers
    pub impulse: f64,

    /// Distance tolerance governing this contact
    pub distance_tol: f64,

    /// Velocity tolerance governing this contact
    pub velocity_tol: f64,
}

impl ContactRecord {
    /// Classifies the record from its distance and normal velocity
    pub fn status(&self) -> ContactStatus {
        if self.joint {
            return ContactStatus::Contact;
        }
        let half_tol = self.distance_tol / 2.0;
        if self.distance < -half_tol {
            if self.normal_velocity < 0.0 {
                ContactStatus::Illegal
            } else {
                ContactStatus::Separating
            }
        } else if self.distance <= self.distance_tol {
            if self.normal_velocity < -self.velocity_tol {
                ContactStatus::ImminentCollision
            } else if self.normal_velocity <= self.velocity_tol {
                ContactStatus::Contact
            } else {
                ContactStatus::Separating
            }
        } else {
            ContactStatus::Separating
        }
    }

    /// Whether the record invalidates the current step
    pub fn is_illegal(&self) -> bool {
        self.status() == ContactStatus::Illegal
    }

    /// Whether the record should receive a contact force this step
    pub fn is_contact(&self) -> bool {
        self.status() == ContactStatus::Contact
    }

    /// Whether the record should receive a collision impulse
    pub fn needs_impulse(&self) -> bool {
        if self.joint {
            return self.normal_velocity.abs() > self.velocity_tol;
        }
        matches!(
            self.status(),
            ContactStatus::Illegal | ContactStatus::ImminentCollision
        )
    }

    /// Whether the given body participates in this record
    pub fn involves(&self, body: BodyRef) -> bool {
        self.primary == body || self.normal_body == body
    }

    /// The impact point of the given participant
    pub fn impact_on(&self, body: BodyRef) -> Vector2 {
        if self.primary == body {
            self.impact1
        } else {
            self.impact2
        }
    }

    /// Sum of the signed curvature radii; infinite when either side is
    /// straight
    pub fn radius_sum(&self) -> f64 {
        self.r1 + self.r2
    }

    /// Whether this record duplicates another: same bodies and edges, nearby
    /// impact points, nearly parallel normals.
    ///
    /// The nearness threshold scales with the local curvature: on a curved
    /// boundary of radius r the gap changes by the distance tolerance over a
    /// chord of about sqrt(2 * r * tol).
    pub fn similar_to(&self, other: &ContactRecord) -> bool {
        if self.primary != other.primary || self.normal_body != other.normal_body {
            return false;
        }
        if self.primary_edge != other.primary_edge || self.normal_edge != other.normal_edge {
            return false;
        }
        if self.normal.dot(&other.normal) < 0.9 {
            return false;
        }
        let r = [self.r1.abs(), self.r2.abs()]
            .into_iter()
            .filter(|r| r.is_finite() && *r > 0.0)
            .fold(f64::INFINITY, f64::min);
        let r = if r.is_finite() { r } else { 1.0 };
        let near = (2.0 * r * self.distance_tol).sqrt().max(self.distance_tol);
        self.impact1.distance(&other.impact1) < near
    }
}
