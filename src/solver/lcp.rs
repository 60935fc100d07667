use crate::math::RandomLcg;

/// Tolerance governing all zero-equality tests in the solver
pub const SMALL_POSITIVE: f64 = 1e-10;

/// Minimum diagonal after Gaussian elimination below which a submatrix is
/// treated as singular
const SINGULAR_DIAGONAL: f64 = 2e-3;

/// Residual the reduced linear solve must reach
const SOLVE_RESIDUAL: f64 = 1e-7;

/// Solver finished normally
pub const SUCCESS: i32 = -1;

/// A drive-to-zero invocation exceeded its iteration cap
pub const ERR_MAX_ITERATIONS: i32 = 1;

/// No usable step could be found along the drive direction
pub const ERR_NO_STEP: i32 = 2;

/// The outer loop revisited a previous membership pattern
pub const ERR_LOOP_DETECTED: i32 = 3;

/// The reduced linear system could not be solved at all
pub const ERR_LINEAR_SOLVE: i32 = 4;

/// Policy for choosing the next contact to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextContactPolicy {
    /// Joints first in random order, then non-joints by most-negative
    /// acceleration, finally rejects with large violation
    Hybrid,

    /// Largest violation first
    MinAccel,

    /// Random order
    Random,

    /// Index order
    PreOrdered,
}

/// Membership of a contact in the solver's partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Not yet handled
    Untreated,

    /// Clamped set C: zero acceleration, non-zero force
    Clamped,

    /// Not-clamped set NC: zero force, non-negative acceleration
    NotClamped,

    /// Rejected set R: deferred because it would make the clamped submatrix
    /// singular, or because it flip-flopped
    Rejected,
}

enum Drive {
    Success,
    Defer,
    Error(i32),
}

/// The contact-force linear complementarity solver.
///
/// For a symmetric matrix `A`, vector `b`, and joint mask, finds `f` with
/// `a = A*f + b` such that non-joints satisfy `a >= 0`, `f >= 0`,
/// `f*a = 0`, while joints get `a = 0` with `f` of either sign. Uses the
/// Baraff pivoting method extended with deferral of redundant contacts.
///
/// Work arrays are retained between calls and grown by doubling; the solver
/// performs no steady-state allocation.
pub struct ComputeForces {
    tolerance: f64,
    policy: NextContactPolicy,

    acc: Vec<f64>,
    delta_f: Vec<f64>,
    delta_a: Vec<f64>,
    marks: Vec<Mark>,
    zero_steps: Vec<bool>,
    re_rejects: Vec<bool>,
    c_list: Vec<usize>,
    rows_scratch: Vec<usize>,
    matrix: Vec<Vec<f64>>,
    solution: Vec<f64>,
    snapshots: Vec<Vec<u8>>,
    scratch: Vec<u8>,
}

impl Default for ComputeForces {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeForces {
    /// Creates a solver with the default tolerance and the hybrid policy
    pub fn new() -> Self {
        Self {
            tolerance: SMALL_POSITIVE,
            policy: NextContactPolicy::Hybrid,
            acc: Vec::new(),
            delta_f: Vec::new(),
            delta_a: Vec::new(),
            marks: Vec::new(),
            zero_steps: Vec::new(),
            re_rejects: Vec::new(),
            c_list: Vec::new(),
            rows_scratch: Vec::new(),
            matrix: Vec::new(),
            solution: Vec::new(),
            snapshots: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Sets the zero-equality tolerance
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance.max(f64::MIN_POSITIVE);
    }

    /// Returns the zero-equality tolerance
    pub fn get_tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Sets the next-contact policy
    pub fn set_policy(&mut self, policy: NextContactPolicy) {
        self.policy = policy;
    }

    /// Returns the next-contact policy
    pub fn get_policy(&self) -> NextContactPolicy {
        self.policy
    }

    /// Solves the complementarity problem, writing force magnitudes into
    /// `f`. Returns [`SUCCESS`] or a positive error code, in which case `f`
    /// holds the best solution found; the caller decides acceptability via
    /// [`check_force_accel`].
    pub fn compute_forces(
        &mut self,
        a: &[Vec<f64>],
        b: &[f64],
        joint: &[bool],
        f: &mut [f64],
        rng: &mut RandomLcg,
    ) -> i32 {
        let n = b.len();
        debug_assert_eq!(a.len(), n);
        debug_assert_eq!(joint.len(), n);
        debug_assert_eq!(f.len(), n);
        if n == 0 {
            return SUCCESS;
        }
        self.ensure_capacity(n);
        f[..n].fill(0.0);
        self.acc[..n].copy_from_slice(b);
        self.marks[..n].fill(Mark::Untreated);
        self.re_rejects[..n].fill(false);
        self.snapshots.clear();

        loop {
            let (d, from_reject) = match self.next_contact(n, joint, rng) {
                Some(choice) => choice,
                None => return SUCCESS,
            };
            if from_reject {
                self.marks[d] = Mark::Untreated;
                self.re_rejects[d] = true;
            }
            if !joint[d] && self.acc[d] >= -self.tolerance {
                self.marks[d] = Mark::NotClamped;
            } else if joint[d] && self.acc[d].abs() <= self.tolerance {
                self.marks[d] = Mark::NotClamped;
            } else {
                match self.drive_to_zero(d, n, a, joint, f, from_reject) {
                    Drive::Success => {
                        if from_reject {
                            self.re_rejects[..n].fill(false);
                        }
                    }
                    Drive::Defer => {
                        self.marks[d] = Mark::Rejected;
                    }
                    Drive::Error(code) => return code,
                }
            }
            // loop detection: once every contact is settled, a repeated
            // membership pattern means no further progress is possible
            if self.marks[..n].iter().all(|m| *m != Mark::Untreated) {
                self.scratch.clear();
                for m in &self.marks[..n] {
                    self.scratch.push(*m as u8);
                }
                self.scratch.extend_from_slice(&(d as u32).to_le_bytes());
                if self.snapshots.iter().any(|s| *s == self.scratch) {
                    return ERR_LOOP_DETECTED;
                }
                let snapshot = self.scratch.clone();
                self.snapshots.push(snapshot);
            }
        }
    }

    fn ensure_capacity(&mut self, n: usize) {
        if self.acc.len() >= n {
            return;
        }
        let cap = n.next_power_of_two();
        self.acc.resize(cap, 0.0);
        self.delta_f.resize(cap, 0.0);
        self.delta_a.resize(cap, 0.0);
        self.marks.resize(cap, Mark::Untreated);
        self.zero_steps.resize(cap, false);
        self.re_rejects.resize(cap, false);
        self.solution.resize(cap + 2, 0.0);
        self.matrix.resize(cap + 2, Vec::new());
        for row in &mut self.matrix {
            row.resize(cap + 3, 0.0);
        }
    }

    fn next_contact(
        &self,
        n: usize,
        joint: &[bool],
        rng: &mut RandomLcg,
    ) -> Option<(usize, bool)> {
        match self.policy {
            NextContactPolicy::Hybrid => {
                let joints: Vec<usize> = (0..n)
                    .filter(|&i| self.marks[i] == Mark::Untreated && joint[i])
                    .collect();
                if !joints.is_empty() {
                    return Some((joints[rng.next_range(joints.len())], false));
                }
                self.most_negative_untreated(n, joint)
                    .map(|i| (i, false))
                    .or_else(|| self.next_reject(n, joint))
            }
            NextContactPolicy::MinAccel => self
                .most_negative_untreated(n, joint)
                .map(|i| (i, false))
                .or_else(|| self.next_reject(n, joint)),
            NextContactPolicy::Random => {
                let untreated: Vec<usize> = (0..n)
                    .filter(|&i| self.marks[i] == Mark::Untreated)
                    .collect();
                if !untreated.is_empty() {
                    return Some((untreated[rng.next_range(untreated.len())], false));
                }
                self.next_reject(n, joint)
            }
            NextContactPolicy::PreOrdered => (0..n)
                .find(|&i| self.marks[i] == Mark::Untreated)
                .map(|i| (i, false))
                .or_else(|| self.next_reject(n, joint)),
        }
    }

    fn most_negative_untreated(&self, n: usize, joint: &[bool]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for i in 0..n {
            if self.marks[i] != Mark::Untreated {
                continue;
            }
            let violation = if joint[i] {
                self.acc[i].abs()
            } else {
                -self.acc[i]
            };
            if best.map_or(true, |(_, v)| violation > v) {
                best = Some((i, violation));
            }
        }
        best.map(|(i, _)| i)
    }

    fn next_reject(&self, n: usize, joint: &[bool]) -> Option<(usize, bool)> {
        let mut best: Option<(usize, f64)> = None;
        for i in 0..n {
            if self.marks[i] != Mark::Rejected || self.re_rejects[i] {
                continue;
            }
            let violation = if joint[i] {
                self.acc[i].abs()
            } else {
                -self.acc[i]
            };
            if violation > 100.0 * self.tolerance && best.map_or(true, |(_, v)| violation > v) {
                best = Some((i, violation));
            }
        }
        best.map(|(i, _)| (i, true))
    }

    fn drive_to_zero(
        &mut self,
        d: usize,
        n: usize,
        a: &[Vec<f64>],
        joint: &[bool],
        f: &mut [f64],
        from_reject: bool,
    ) -> Drive {
        self.collect_clamped(n);
        if !self.c_list.is_empty() && self.test_singular(a, d, None) && !from_reject {
            return Drive::Defer;
        }
        self.zero_steps[..n].fill(false);
        let mut accel_tol = self.tolerance;
        let mut tolerance_raised = false;
        let mut iteration = 0usize;
        loop {
            iteration += 1;
            if iteration > 1000 * n {
                log::warn!("drive_to_zero({}) exceeded {} iterations", d, 1000 * n);
                return Drive::Error(ERR_MAX_ITERATIONS);
            }
            if iteration == 10 * n {
                log::debug!(
                    "drive_to_zero({}) slow convergence: acc={:.3e} |C|={}",
                    d,
                    self.acc[d],
                    self.c_list.len()
                );
            }
            if joint[d] {
                if self.acc[d].abs() <= accel_tol {
                    break;
                }
            } else if self.acc[d] >= -accel_tol {
                break;
            }
            if !self.fdirection(a, d) {
                return Drive::Error(ERR_LINEAR_SOLVE);
            }
            // delta_a = A * delta_f; delta_f is zero outside C and d
            for i in 0..n {
                let mut sum = a[i][d];
                for &c in &self.c_list {
                    sum += a[i][c] * self.delta_f[c];
                }
                self.delta_a[i] = sum;
            }
            let step = self.max_step(d, n, joint, f);
            let (s, limiting) = match step {
                Some((s, j)) if s.abs() <= 1e5 => (s, j),
                _ => {
                    // cannot choose a step
                    if f[d].abs() < 10.0 * self.tolerance {
                        return Drive::Defer;
                    }
                    if !tolerance_raised {
                        tolerance_raised = true;
                        accel_tol *= 100.0;
                        continue;
                    }
                    return Drive::Error(ERR_NO_STEP);
                }
            };
            // apply the step
            f[d] += s * self.delta_f[d];
            for &c in &self.c_list {
                f[c] += s * self.delta_f[c];
            }
            for i in 0..n {
                self.acc[i] += s * self.delta_a[i];
            }
            if s.abs() < 1e-12 {
                if self.zero_steps[limiting] {
                    // flip-flop: the same contact keeps producing zero-sized
                    // steps; defer it to break the cycle
                    if f[limiting].abs() < 10.0 * self.tolerance {
                        self.marks[limiting] = Mark::Rejected;
                        self.collect_clamped(n);
                        continue;
                    }
                    return Drive::Error(ERR_NO_STEP);
                }
                self.zero_steps[limiting] = true;
            }
            if limiting == d {
                break;
            }
            match self.marks[limiting] {
                Mark::Clamped => {
                    self.marks[limiting] = Mark::NotClamped;
                    if f[limiting].abs() > 10.0 * self.tolerance {
                        // residual force survived the flip; re-queue
                        self.marks[limiting] = Mark::Rejected;
                    }
                }
                Mark::NotClamped => {
                    if self.test_singular(a, d, Some(limiting)) {
                        self.marks[limiting] = Mark::Rejected;
                    } else {
                        self.marks[limiting] = Mark::Clamped;
                    }
                }
                _ => {}
            }
            self.collect_clamped(n);
        }
        self.marks[d] = if f[d].abs() > self.tolerance {
            Mark::Clamped
        } else {
            Mark::NotClamped
        };
        Drive::Success
    }

    fn collect_clamped(&mut self, n: usize) {
        self.c_list.clear();
        for i in 0..n {
            if self.marks[i] == Mark::Clamped {
                self.c_list.push(i);
            }
        }
    }

    /// Computes the direction of force change: a unit increase at `d` with
    /// compensating changes at the clamped contacts so their accelerations
    /// stay zero. Solves `A_CC * x = -A_C,d`.
    fn fdirection(&mut self, a: &[Vec<f64>], d: usize) -> bool {
        self.delta_f.fill(0.0);
        self.delta_f[d] = 1.0;
        let m = self.c_list.len();
        if m == 0 {
            return true;
        }
        let mut best_residual = f64::INFINITY;
        let mut have_best = false;
        // retry ladder: tighten first, then fall back to looser pivots
        let pivot_tols = [SOLVE_RESIDUAL, 1e-9, 1e-11, 1e-13, 1e-15, 1e-17];
        for &pivot_tol in &pivot_tols {
            for (ri, &i) in self.c_list.iter().enumerate() {
                for (rk, &k) in self.c_list.iter().enumerate() {
                    self.matrix[ri][rk] = a[i][k];
                }
                self.matrix[ri][m] = -a[i][d];
            }
            let min_diag = gaussian_eliminate(&mut self.matrix, m, pivot_tol);
            if min_diag <= 0.0 {
                continue;
            }
            back_substitute(&self.matrix, m, &mut self.solution);
            // residual of the reduced system
            let mut residual: f64 = 0.0;
            for (ri, &i) in self.c_list.iter().enumerate() {
                let mut sum = a[i][d];
                for (rk, &k) in self.c_list.iter().enumerate() {
                    sum += a[i][k] * self.solution[rk];
                }
                residual = residual.max(sum.abs());
            }
            if residual < best_residual {
                best_residual = residual;
                for (rk, &k) in self.c_list.iter().enumerate() {
                    self.delta_f[k] = self.solution[rk];
                }
                have_best = true;
            }
            if residual <= SOLVE_RESIDUAL {
                return true;
            }
        }
        if have_best {
            log::debug!(
                "fdirection accepted residual {:.3e} for |C|={}",
                best_residual,
                m
            );
        }
        have_best
    }

    /// Tests whether the clamped submatrix extended by `d` (and optionally
    /// `extra`) is singular: eliminated to upper-triangular form, its
    /// smallest diagonal falls below the singularity threshold.
    fn test_singular(&mut self, a: &[Vec<f64>], d: usize, extra: Option<usize>) -> bool {
        self.rows_scratch.clear();
        self.rows_scratch.extend_from_slice(&self.c_list);
        self.rows_scratch.push(d);
        if let Some(extra) = extra {
            self.rows_scratch.push(extra);
        }
        let m = self.rows_scratch.len();
        for ri in 0..m {
            let i = self.rows_scratch[ri];
            for rk in 0..m {
                let k = self.rows_scratch[rk];
                self.matrix[ri][rk] = a[i][k];
            }
            self.matrix[ri][m] = 0.0;
        }
        let min_diag = gaussian_eliminate(&mut self.matrix, m, 0.0);
        min_diag.abs() < SINGULAR_DIAGONAL
    }

    /// Finds the largest step along `(delta_f, delta_a)` before a constraint
    /// breaks: the driven contact's acceleration reaching zero, a clamped
    /// force reaching zero, or an unclamped acceleration leaving its
    /// feasible region. Joints may require a negative step.
    fn max_step(
        &self,
        d: usize,
        n: usize,
        joint: &[bool],
        f: &[f64],
    ) -> Option<(f64, usize)> {
        // direction of travel: non-joints push force upward; joints go
        // whichever way reduces the acceleration
        let sign = if joint[d] {
            if self.delta_a[d].abs() > crate::math::TINY {
                if -self.acc[d] / self.delta_a[d] >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            } else {
                1.0
            }
        } else {
            1.0
        };
        let mut best: Option<(f64, usize)> = None;
        let mut consider = |s: f64, j: usize, best: &mut Option<(f64, usize)>| {
            if s * sign < -1e-12 {
                return;
            }
            if best.map_or(true, |(bs, _)| s.abs() < bs.abs()) {
                *best = Some((s, j));
            }
        };
        // the driven contact reaching zero acceleration
        if self.delta_a[d].abs() > crate::math::TINY {
            consider(-self.acc[d] / self.delta_a[d], d, &mut best);
        }
        for i in 0..n {
            if i == d {
                continue;
            }
            match self.marks[i] {
                Mark::Clamped => {
                    // non-joint clamped forces may not go negative
                    if !joint[i] && self.delta_f[i].abs() > crate::math::TINY {
                        let s = -f[i] / self.delta_f[i];
                        // only a force heading toward zero limits the step
                        if s * sign >= -1e-12 && f[i] * self.delta_f[i] * sign <= 0.0 {
                            consider(s, i, &mut best);
                        }
                    }
                }
                Mark::NotClamped => {
                    if self.delta_a[i].abs() > crate::math::TINY {
                        if joint[i] {
                            // a joint in NC must hold zero acceleration
                            consider(-self.acc[i] / self.delta_a[i], i, &mut best);
                        } else if self.delta_a[i] * sign < 0.0 {
                            // acceleration heading negative
                            consider(-self.acc[i] / self.delta_a[i], i, &mut best);
                        }
                    }
                }
                _ => {}
            }
        }
        best
    }
}

/// Verifies a solution of the complementarity problem: returns the largest
/// violation of the acceleration and complementarity conditions.
pub fn check_force_accel(
    a: &[Vec<f64>],
    b: &[f64],
    joint: &[bool],
    f: &[f64],
    tolerance: f64,
) -> f64 {
    let n = b.len();
    let mut max_violation: f64 = 0.0;
    for i in 0..n {
        let mut acc = b[i];
        for k in 0..n {
            acc += a[i][k] * f[k];
        }
        let violation = if joint[i] || f[i].abs() > tolerance {
            acc.abs()
        } else if acc < 0.0 {
            -acc
        } else {
            0.0
        };
        max_violation = max_violation.max(violation);
    }
    max_violation
}

/// Reduces the `m x (m+1)` augmented system stored in `matrix` to upper
/// triangular form with partial pivoting. Pivots smaller than `pivot_tol`
/// are rejected. Returns the smallest diagonal magnitude seen, or a
/// non-positive value when elimination broke down.
fn gaussian_eliminate(matrix: &mut [Vec<f64>], m: usize, pivot_tol: f64) -> f64 {
    let mut min_diag = f64::INFINITY;
    for col in 0..m {
        // partial pivoting
        let mut pivot_row = col;
        let mut pivot_val = matrix[col][col].abs();
        for row in (col + 1)..m {
            let v = matrix[row][col].abs();
            if v > pivot_val {
                pivot_val = v;
                pivot_row = row;
            }
        }
        if pivot_val <= pivot_tol {
            return -pivot_val.min(0.0) - f64::MIN_POSITIVE;
        }
        if pivot_row != col {
            matrix.swap(pivot_row, col);
        }
        min_diag = min_diag.min(pivot_val);
        for row in (col + 1)..m {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..=m {
                let v = matrix[col][k];
                matrix[row][k] -= factor * v;
            }
        }
    }
    min_diag
}

/// Back-substitution for a system left in upper triangular form by
/// [`gaussian_eliminate`]
fn back_substitute(matrix: &[Vec<f64>], m: usize, solution: &mut [f64]) {
    for row in (0..m).rev() {
        let mut sum = matrix[row][m];
        for col in (row + 1)..m {
            sum -= matrix[row][col] * solution[col];
        }
        solution[row] = sum / matrix[row][row];
    }
}
