mod contact_force;
mod impulse;
mod lcp;

pub use self::contact_force::ContactForces;
pub use self::impulse::ImpulseResolver;
pub use self::lcp::{
    check_force_accel, ComputeForces, NextContactPolicy, ERR_LINEAR_SOLVE, ERR_LOOP_DETECTED,
    ERR_MAX_ITERATIONS, ERR_NO_STEP, SMALL_POSITIVE, SUCCESS,
};

use crate::bodies::{BodyRef, Polygon};
use crate::collision::ContactRecord;
use crate::math::Vector2;

/// Mass properties a contact solver needs from one participant
struct BodyMotion {
    recip_mass: f64,
    recip_moment: f64,
    position: Vector2,
}

fn body_motion(bodies: &[Option<Polygon>], body: BodyRef) -> Option<BodyMotion> {
    match body {
        BodyRef::Scrim => None,
        BodyRef::Body(id) => {
            let b = bodies.get(id).and_then(|b| b.as_ref())?;
            if !b.get_mass().is_finite() {
                return None;
            }
            Some(BodyMotion {
                recip_mass: b.recip_mass(),
                recip_moment: b.recip_moment(),
                position: b.get_position(),
            })
        }
    }
}

/// The change in relative normal velocity (or acceleration) at contact `ci`
/// caused by a unit impulse (or force) at contact `ck`, through the given
/// body. Zero when the body is immovable or does not participate in `ck`.
fn influence(
    bodies: &[Option<Polygon>],
    ci: &ContactRecord,
    impact_i: Vector2,
    sign_i: f64,
    ck: &ContactRecord,
    body: BodyRef,
) -> f64 {
    let motion = match body_motion(bodies, body) {
        Some(m) => m,
        None => return 0.0,
    };
    let sign_k = if ck.primary == body {
        1.0
    } else if ck.normal_body == body {
        -1.0
    } else {
        return 0.0;
    };
    let r_k = ck.impact_on(body) - motion.position;
    let r_i = impact_i - motion.position;
    let unit = ck.normal * sign_k;
    let delta_omega = r_k.cross(&unit) * motion.recip_moment;
    let delta_v = unit * motion.recip_mass + r_i.perpendicular() * delta_omega;
    sign_i * ci.normal.dot(&delta_v)
}

/// One entry of the A-matrix: the effect of a unit impulse or force at
/// contact `ck` on the relative normal velocity or acceleration at `ci`,
/// summed over `ci`'s two participants.
pub(crate) fn a_matrix_entry(
    bodies: &[Option<Polygon>],
    ci: &ContactRecord,
    ck: &ContactRecord,
) -> f64 {
    influence(bodies, ci, ci.impact1, 1.0, ck, ci.primary)
        + influence(bodies, ci, ci.impact2, -1.0, ck, ci.normal_body)
}

/// Relative normal velocity of a contact from the bodies' current velocities
pub(crate) fn live_normal_velocity(bodies: &[Option<Polygon>], c: &ContactRecord) -> f64 {
    let point_velocity = |r: BodyRef, p: Vector2| match r {
        BodyRef::Scrim => Vector2::zero(),
        BodyRef::Body(id) => bodies
            .get(id)
            .and_then(|b| b.as_ref())
            .map(|b| b.world_point_velocity(p))
            .unwrap_or_default(),
    };
    let v1 = point_velocity(c.primary, c.impact1);
    let v2 = point_velocity(c.normal_body, c.impact2);
    c.normal.dot(&(v1 - v2))
}

/// Whether the given participant is a finite-mass body; only these transmit
/// connectivity between contacts
pub(crate) fn is_finite_body(bodies: &[Option<Polygon>], r: BodyRef) -> bool {
    match r {
        BodyRef::Scrim => false,
        BodyRef::Body(id) => bodies
            .get(id)
            .and_then(|b| b.as_ref())
            .map(|b| b.get_mass().is_finite())
            .unwrap_or(false),
    }
}

/// Whether two contacts share a finite-mass body
pub(crate) fn contacts_connected(
    bodies: &[Option<Polygon>],
    a: &ContactRecord,
    b: &ContactRecord,
) -> bool {
    for r in [a.primary, a.normal_body] {
        if is_finite_body(bodies, r) && (b.primary == r || b.normal_body == r) {
            return true;
        }
    }
    false
}

/// Grows a square matrix workspace to hold at least `n` rows and columns,
/// doubling so repeated solves do not reallocate
pub(crate) fn ensure_matrix(matrix: &mut Vec<Vec<f64>>, n: usize) {
    if matrix.len() >= n && matrix.first().map_or(n == 0, |r| r.len() >= n) {
        return;
    }
    let cap = n.next_power_of_two();
    matrix.resize(cap, Vec::new());
    for row in matrix.iter_mut() {
        row.resize(cap, 0.0);
    }
}
