use crate::bodies::{BodyRef, Polygon};
use crate::collision::ContactRecord;
use crate::core::config::CollisionHandling;
use crate::error::PhysicsError;
use crate::math::RandomLcg;
use crate::solver::{
    a_matrix_entry, check_force_accel, contacts_connected, ensure_matrix, live_normal_velocity,
    ComputeForces, SUCCESS,
};
use crate::Result;

/// Velocity below which a contact is no longer considered violating
const VELOCITY_TOLERANCE: f64 = 1e-5;

/// Impulses smaller than this are reported as trivial
const TRIVIAL_IMPULSE: f64 = 1e-8;

/// Residual above which an unconverged impulse solve is fatal
const ACCEPT_TOLERANCE: f64 = 1e-4;

/// Resolves simultaneous collisions by computing impulses through the
/// complementarity solver and applying them to body velocities.
///
/// Work arrays are retained between calls.
pub struct ImpulseResolver {
    lcp: ComputeForces,
    a: Vec<Vec<f64>>,
    b: Vec<f64>,
    joint: Vec<bool>,
    f: Vec<f64>,
    subset: Vec<usize>,
}

impl Default for ImpulseResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ImpulseResolver {
    /// Creates a resolver with empty workspaces
    pub fn new() -> Self {
        Self {
            lcp: ComputeForces::new(),
            a: Vec::new(),
            b: Vec::new(),
            joint: Vec::new(),
            f: Vec::new(),
            subset: Vec::new(),
        }
    }

    /// Access to the underlying complementarity solver
    pub fn lcp_mut(&mut self) -> &mut ComputeForces {
        &mut self.lcp
    }

    /// Computes and applies impulses for the given contact records under the
    /// selected policy. Returns whether any non-trivial impulse was applied.
    pub fn handle_collisions(
        &mut self,
        contacts: &mut [ContactRecord],
        bodies: &mut [Option<Polygon>],
        policy: CollisionHandling,
        rng: &mut RandomLcg,
    ) -> Result<bool> {
        if contacts.is_empty() {
            return Ok(false);
        }
        match policy {
            CollisionHandling::Simultaneous => {
                self.subset.clear();
                self.subset.extend(0..contacts.len());
                let subset = std::mem::take(&mut self.subset);
                let applied = self.solve_subset(&subset, contacts, bodies, false, rng)?;
                self.subset = subset;
                Ok(applied)
            }
            CollisionHandling::Hybrid => self.serial_loop(contacts, bodies, rng, true, true, true),
            CollisionHandling::SerialGrouped => {
                self.serial_loop(contacts, bodies, rng, false, true, false)
            }
            CollisionHandling::SerialGroupedLastPass => {
                self.serial_loop(contacts, bodies, rng, false, true, true)
            }
            CollisionHandling::SerialSeparate => {
                self.serial_loop(contacts, bodies, rng, false, false, false)
            }
            CollisionHandling::SerialSeparateLastPass => {
                self.serial_loop(contacts, bodies, rng, false, false, true)
            }
        }
    }

    /// The serial focus loop shared by the hybrid and serial policies.
    ///
    /// `hybrid` also pulls in non-joint collisions that share a body with the
    /// focus and picks the worst violation instead of a random one; `grouped`
    /// includes the joints reachable from the focus through shared bodies;
    /// `last_pass` ends with a zero-elasticity cleanup solve over everything.
    fn serial_loop(
        &mut self,
        contacts: &mut [ContactRecord],
        bodies: &mut [Option<Polygon>],
        rng: &mut RandomLcg,
        hybrid: bool,
        grouped: bool,
        last_pass: bool,
    ) -> Result<bool> {
        let n = contacts.len();
        let mut velocity_tol = VELOCITY_TOLERANCE;
        let mut applied = false;
        let mut iteration = 0usize;
        loop {
            iteration += 1;
            if iteration > 10_000 {
                return Err(PhysicsError::SolverError(
                    "impulse solve failed to converge".to_string(),
                ));
            }
            // the loop-panic escape: when progress stalls, accept a larger
            // residual velocity rather than iterating forever
            if iteration % (20 * n.max(1)) == 0 {
                velocity_tol *= 2.0;
                log::warn!(
                    "impulse solve stalled, velocity tolerance raised to {:.3e}",
                    velocity_tol
                );
            }
            let focus = if hybrid {
                self.worst_violation(contacts, bodies, velocity_tol)
            } else {
                self.random_violation(contacts, bodies, velocity_tol, rng)
            };
            let focus = match focus {
                Some(focus) => focus,
                None => break,
            };
            self.collect_subset(focus, contacts, bodies, hybrid, grouped);
            let subset = std::mem::take(&mut self.subset);
            applied |= self.solve_subset(&subset, contacts, bodies, false, rng)?;
            self.subset = subset;
        }
        if last_pass {
            self.subset.clear();
            self.subset.extend(0..n);
            let subset = std::mem::take(&mut self.subset);
            applied |= self.solve_subset(&subset, contacts, bodies, true, rng)?;
            self.subset = subset;
        }
        Ok(applied)
    }

    fn violation(&self, bodies: &[Option<Polygon>], c: &ContactRecord, tol: f64) -> Option<f64> {
        let v = live_normal_velocity(bodies, c);
        if c.joint {
            if v.abs() > tol {
                return Some(v.abs());
            }
        } else if v < -tol {
            return Some(-v);
        }
        None
    }

    fn worst_violation(
        &self,
        contacts: &[ContactRecord],
        bodies: &[Option<Polygon>],
        tol: f64,
    ) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, c) in contacts.iter().enumerate() {
            if let Some(v) = self.violation(bodies, c, tol) {
                if best.map_or(true, |(_, bv)| v > bv) {
                    best = Some((i, v));
                }
            }
        }
        best.map(|(i, _)| i)
    }

    fn random_violation(
        &self,
        contacts: &[ContactRecord],
        bodies: &[Option<Polygon>],
        tol: f64,
        rng: &mut RandomLcg,
    ) -> Option<usize> {
        let violating: Vec<usize> = contacts
            .iter()
            .enumerate()
            .filter(|(_, c)| self.violation(bodies, c, tol).is_some())
            .map(|(i, _)| i)
            .collect();
        if violating.is_empty() {
            None
        } else {
            Some(violating[rng.next_range(violating.len())])
        }
    }

    /// Gathers the focus contact, the joints reachable from it through
    /// shared finite-mass bodies, and (for the hybrid policy) the non-joint
    /// collisions sharing a body with the focus.
    fn collect_subset(
        &mut self,
        focus: usize,
        contacts: &[ContactRecord],
        bodies: &[Option<Polygon>],
        hybrid: bool,
        grouped: bool,
    ) {
        self.subset.clear();
        self.subset.push(focus);
        if grouped {
            // transitive closure over joints
            let mut changed = true;
            while changed {
                changed = false;
                for (i, c) in contacts.iter().enumerate() {
                    if !c.joint || self.subset.contains(&i) {
                        continue;
                    }
                    let connected = self.subset.iter().any(|&s| {
                        contacts_connected(bodies, &contacts[s], c)
                    });
                    if connected {
                        self.subset.push(i);
                        changed = true;
                    }
                }
            }
        }
        if hybrid {
            for (i, c) in contacts.iter().enumerate() {
                if c.joint || self.subset.contains(&i) {
                    continue;
                }
                if contacts_connected(bodies, &contacts[focus], c) {
                    self.subset.push(i);
                }
            }
        }
        self.subset.sort_unstable();
    }

    /// Builds and solves the complementarity problem for one subset of
    /// contacts, then applies the impulses to the bodies.
    fn solve_subset(
        &mut self,
        subset: &[usize],
        contacts: &mut [ContactRecord],
        bodies: &mut [Option<Polygon>],
        zero_elasticity: bool,
        rng: &mut RandomLcg,
    ) -> Result<bool> {
        let n = subset.len();
        if n == 0 {
            return Ok(false);
        }
        ensure_matrix(&mut self.a, n);
        self.b.resize(n.max(self.b.len()), 0.0);
        self.joint.resize(n.max(self.joint.len()), false);
        self.f.resize(n.max(self.f.len()), 0.0);
        for (row, &i) in subset.iter().enumerate() {
            let ci = &contacts[i];
            for (col, &k) in subset.iter().enumerate() {
                self.a[row][col] = a_matrix_entry(bodies, ci, &contacts[k]);
            }
            let v0 = live_normal_velocity(bodies, ci);
            let elasticity = if zero_elasticity || ci.joint {
                0.0
            } else {
                ci.elasticity
            };
            self.b[row] = (1.0 + elasticity) * v0;
            self.joint[row] = ci.joint;
        }
        let code = self.lcp.compute_forces(
            &self.a[..n],
            &self.b[..n],
            &self.joint[..n],
            &mut self.f[..n],
            rng,
        );
        if code != SUCCESS {
            let residual = check_force_accel(
                &self.a[..n],
                &self.b[..n],
                &self.joint[..n],
                &self.f[..n],
                crate::solver::SMALL_POSITIVE,
            );
            if residual > ACCEPT_TOLERANCE {
                return Err(PhysicsError::SolverError(format!(
                    "impulse solve error {} with residual {:.3e}",
                    code, residual
                )));
            }
            log::warn!(
                "impulse solve error {} accepted with residual {:.3e}",
                code,
                residual
            );
        }
        let mut applied = false;
        for (row, &i) in subset.iter().enumerate() {
            let impulse = self.f[row];
            if impulse.abs() > TRIVIAL_IMPULSE {
                applied = true;
            }
            apply_impulse(bodies, &contacts[i], impulse);
            contacts[i].impulse += impulse;
        }
        Ok(applied)
    }
}

/// Applies an impulse along the contact normal to both participants
fn apply_impulse(bodies: &mut [Option<Polygon>], c: &ContactRecord, impulse: f64) {
    if impulse == 0.0 {
        return;
    }
    for (body, impact, sign) in [(c.primary, c.impact1, 1.0), (c.normal_body, c.impact2, -1.0)] {
        let id = match body {
            BodyRef::Body(id) => id,
            BodyRef::Scrim => continue,
        };
        let b = match bodies.get_mut(id).and_then(|b| b.as_mut()) {
            Some(b) if b.get_mass().is_finite() => b,
            _ => continue,
        };
        let r = impact - b.get_position();
        let delta_v = c.normal * (sign * impulse * b.recip_mass());
        let delta_omega = sign * impulse * r.cross(&c.normal) * b.recip_moment();
        let velocity = b.get_velocity() + delta_v;
        let angular = b.get_angular_velocity() + delta_omega;
        b.set_velocity(velocity, angular);
    }
}
