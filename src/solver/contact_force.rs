use crate::bodies::{BodyRef, Polygon};
use crate::collision::ContactRecord;
use crate::core::config::{ExtraAccelPolicy, SimulationConfig};
use crate::core::state;
use crate::error::PhysicsError;
use crate::math::{RandomLcg, Vector2};
use crate::solver::{
    a_matrix_entry, check_force_accel, contacts_connected, ensure_matrix, ComputeForces, SUCCESS,
};
use crate::Result;

/// Residual above which a contact-force solution is rejected as fatal
const ACCEPT_TOLERANCE: f64 = 1e-4;

/// Computes simultaneous contact forces: non-negative at contacts, signed at
/// joints, such that relative normal accelerations are zero or separating.
/// Forces are applied as accelerations into the rate-of-change vector.
///
/// Work arrays are retained between calls.
pub struct ContactForces {
    lcp: ComputeForces,
    a: Vec<Vec<f64>>,
    b: Vec<f64>,
    joint: Vec<bool>,
    f: Vec<f64>,
    component: Vec<usize>,
    members: Vec<usize>,
}

impl Default for ContactForces {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactForces {
    /// Creates a solver with empty workspaces
    pub fn new() -> Self {
        Self {
            lcp: ComputeForces::new(),
            a: Vec::new(),
            b: Vec::new(),
            joint: Vec::new(),
            f: Vec::new(),
            component: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Access to the underlying complementarity solver
    pub fn lcp_mut(&mut self) -> &mut ComputeForces {
        &mut self.lcp
    }

    /// Solves for contact forces at the given contacts and joints, writing
    /// each solved magnitude into its record and the resulting accelerations
    /// into `change`.
    pub fn compute_forces(
        &mut self,
        contacts: &mut [ContactRecord],
        bodies: &[Option<Polygon>],
        change: &mut [f64],
        config: &SimulationConfig,
        rng: &mut RandomLcg,
    ) -> Result<()> {
        let n = contacts.len();
        if n == 0 {
            return Ok(());
        }
        if !config.subset_collisions {
            let all: Vec<usize> = (0..n).collect();
            return self.solve_component(&all, contacts, bodies, change, config, rng);
        }
        // partition into weakly connected components: contacts interact only
        // when they share a finite-mass body
        self.component.resize(n, usize::MAX);
        self.component[..n].fill(usize::MAX);
        let mut next_component = 0;
        for start in 0..n {
            if self.component[start] != usize::MAX {
                continue;
            }
            self.component[start] = next_component;
            loop {
                let mut grew = false;
                for i in 0..n {
                    if self.component[i] != next_component {
                        continue;
                    }
                    for k in 0..n {
                        if self.component[k] == usize::MAX
                            && contacts_connected(bodies, &contacts[i], &contacts[k])
                        {
                            self.component[k] = next_component;
                            grew = true;
                        }
                    }
                }
                if !grew {
                    break;
                }
            }
            next_component += 1;
        }
        for c in 0..next_component {
            self.members.clear();
            for i in 0..n {
                if self.component[i] == c {
                    self.members.push(i);
                }
            }
            let members = std::mem::take(&mut self.members);
            let result = self.solve_component(&members, contacts, bodies, change, config, rng);
            self.members = members;
            result?;
        }
        Ok(())
    }

    fn solve_component(
        &mut self,
        subset: &[usize],
        contacts: &mut [ContactRecord],
        bodies: &[Option<Polygon>],
        change: &mut [f64],
        config: &SimulationConfig,
        rng: &mut RandomLcg,
    ) -> Result<()> {
        let n = subset.len();
        ensure_matrix(&mut self.a, n);
        self.b.resize(n.max(self.b.len()), 0.0);
        self.joint.resize(n.max(self.joint.len()), false);
        self.f.resize(n.max(self.f.len()), 0.0);
        for (row, &i) in subset.iter().enumerate() {
            let ci = &contacts[i];
            for (col, &k) in subset.iter().enumerate() {
                self.a[row][col] = a_matrix_entry(bodies, ci, &contacts[k]);
            }
            self.b[row] = b_vector_entry(bodies, ci, change, config);
            self.joint[row] = ci.joint;
        }
        let code = self.lcp.compute_forces(
            &self.a[..n],
            &self.b[..n],
            &self.joint[..n],
            &mut self.f[..n],
            rng,
        );
        let residual = check_force_accel(
            &self.a[..n],
            &self.b[..n],
            &self.joint[..n],
            &self.f[..n],
            crate::solver::SMALL_POSITIVE,
        );
        if residual > ACCEPT_TOLERANCE {
            return Err(PhysicsError::SolverError(format!(
                "contact force solve error {} with residual {:.3e}",
                code, residual
            )));
        }
        if code != SUCCESS {
            log::warn!(
                "contact force solve error {} accepted with residual {:.3e}",
                code,
                residual
            );
        }
        for (row, &i) in subset.iter().enumerate() {
            let force = self.f[row];
            contacts[i].impulse = force;
            apply_contact_force(bodies, &contacts[i], force, change);
        }
        Ok(())
    }
}

/// The force-independent part of the relative normal acceleration at one
/// contact: the acceleration the external forces already produce, the
/// rotation of the contact normal, and the configured extra acceleration
/// that bleeds off residual gap velocity and penetration.
fn b_vector_entry(
    bodies: &[Option<Polygon>],
    c: &ContactRecord,
    change: &[f64],
    config: &SimulationConfig,
) -> f64 {
    let side = |r: BodyRef, impact: Vector2| -> (Vector2, Vector2, f64) {
        // (acceleration of the impact point, velocity of the impact point,
        //  angular velocity) for one participant
        match r {
            BodyRef::Scrim => (Vector2::zero(), Vector2::zero(), 0.0),
            BodyRef::Body(id) => {
                let body = match bodies.get(id).and_then(|b| b.as_ref()) {
                    Some(b) if b.get_mass().is_finite() => b,
                    _ => return (Vector2::zero(), Vector2::zero(), 0.0),
                };
                let vars = match body.get_vars_index() {
                    Some(vars) => vars,
                    None => return (Vector2::zero(), Vector2::zero(), 0.0),
                };
                let linear = Vector2::new(change[vars + state::VX], change[vars + state::VY]);
                let alpha = change[vars + state::ANGULAR_VELOCITY];
                let omega = body.get_angular_velocity();
                let r_vec = impact - body.get_position();
                let accel = linear + r_vec.perpendicular() * alpha - r_vec * (omega * omega);
                (accel, body.world_point_velocity(impact), omega)
            }
        }
    };
    let (a1, v1, _w1) = side(c.primary, c.impact1);
    let (a2, v2, w2) = side(c.normal_body, c.impact2);
    let mut b = c.normal.dot(&(a1 - a2));
    let rv = v1 - v2;
    // rotation of the normal direction
    if let Some(normal_dot) = c.normal_dot {
        b += normal_dot.dot(&rv);
    } else {
        let radius_sum = c.radius_sum();
        if radius_sum.is_finite() {
            if radius_sum.abs() > crate::math::TINY {
                let tangential = rv - c.normal * rv.dot(&c.normal);
                b += tangential.length_squared() / radius_sum;
            }
        } else if c.r1.is_finite() && !c.r2.is_finite() {
            // curved primary against a straight, rotating normal edge
            b += -c.r1 * w2 * w2;
        }
    }
    // extra acceleration
    let h = config.contact_step;
    let v = c.normal.dot(&rv);
    let extra = match config.extra_accel {
        ExtraAccelPolicy::None => 0.0,
        ExtraAccelPolicy::Velocity => {
            if c.joint {
                0.0
            } else {
                v / h
            }
        }
        ExtraAccelPolicy::VelocityJoints => v / h,
        ExtraAccelPolicy::VelocityAndDistance => {
            if c.joint {
                0.0
            } else {
                let x0 = c.distance - c.distance_tol / 2.0;
                (2.0 * v * h + x0) / (h * h)
            }
        }
        ExtraAccelPolicy::VelocityAndDistanceJoints => {
            let x0 = if c.joint {
                c.distance
            } else {
                c.distance - c.distance_tol / 2.0
            };
            (2.0 * v * h + x0) / (h * h)
        }
    };
    b + extra
}

/// Applies a solved force along the contact normal at both impact points,
/// as accelerations in the rate-of-change vector. Immovable bodies receive
/// no update.
fn apply_contact_force(
    bodies: &[Option<Polygon>],
    c: &ContactRecord,
    force: f64,
    change: &mut [f64],
) {
    if force == 0.0 {
        return;
    }
    for (body, impact, sign) in [(c.primary, c.impact1, 1.0), (c.normal_body, c.impact2, -1.0)] {
        let id = match body {
            BodyRef::Body(id) => id,
            BodyRef::Scrim => continue,
        };
        let b = match bodies.get(id).and_then(|b| b.as_ref()) {
            Some(b) if b.get_mass().is_finite() => b,
            _ => continue,
        };
        let vars = match b.get_vars_index() {
            Some(vars) => vars,
            None => continue,
        };
        let f_vec = c.normal * (sign * force);
        let r = impact - b.get_position();
        change[vars + state::VX] += f_vec.x * b.recip_mass();
        change[vars + state::VY] += f_vec.y * b.recip_mass();
        change[vars + state::ANGULAR_VELOCITY] += r.cross(&f_vec) * b.recip_moment();
    }
}
