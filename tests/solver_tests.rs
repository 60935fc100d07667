use rigid2d::math::RandomLcg;
use rigid2d::solver::{check_force_accel, ComputeForces, NextContactPolicy, SUCCESS};

fn solve(
    a: &[Vec<f64>],
    b: &[f64],
    joint: &[bool],
    solver: &mut ComputeForces,
    rng: &mut RandomLcg,
) -> (Vec<f64>, i32) {
    let mut f = vec![0.0; b.len()];
    let code = solver.compute_forces(a, b, joint, &mut f, rng);
    (f, code)
}

#[test]
fn test_single_contact() {
    let mut solver = ComputeForces::new();
    let mut rng = RandomLcg::new(0);
    let a = vec![vec![2.0]];
    let b = vec![-4.0];
    let (f, code) = solve(&a, &b, &[false], &mut solver, &mut rng);
    assert_eq!(code, SUCCESS);
    assert!((f[0] - 2.0).abs() < 1e-10);
}

#[test]
fn test_separating_contact_gets_no_force() {
    let mut solver = ComputeForces::new();
    let mut rng = RandomLcg::new(0);
    let a = vec![vec![2.0]];
    let b = vec![1.0];
    let (f, code) = solve(&a, &b, &[false], &mut solver, &mut rng);
    assert_eq!(code, SUCCESS);
    assert_eq!(f[0], 0.0);
}

#[test]
fn test_joint_takes_signed_force() {
    let mut solver = ComputeForces::new();
    let mut rng = RandomLcg::new(0);
    let a = vec![vec![2.0]];
    // positive acceleration at a joint demands a negative (pulling) force
    let b = vec![3.0];
    let (f, code) = solve(&a, &b, &[true], &mut solver, &mut rng);
    assert_eq!(code, SUCCESS);
    assert!((f[0] + 1.5).abs() < 1e-10);
    assert!(check_force_accel(&a, &b, &[true], &f, 1e-10) < 1e-8);
}

#[test]
fn test_resting_block_pair() {
    // the classic square block resting on two corners: mass 1, moment 1/6,
    // corners at x = +-0.5
    let mut solver = ComputeForces::new();
    let mut rng = RandomLcg::new(0);
    let a = vec![vec![2.5, -0.5], vec![-0.5, 2.5]];
    let b = vec![-9.8, -9.8];
    let joint = [false, false];
    let (f, code) = solve(&a, &b, &joint, &mut solver, &mut rng);
    assert_eq!(code, SUCCESS);
    assert!((f[0] - 4.9).abs() < 1e-9);
    assert!((f[1] - 4.9).abs() < 1e-9);
    assert!(check_force_accel(&a, &b, &joint, &f, 1e-10) < 1e-8);
}

#[test]
fn test_redundant_contacts_are_deferred() {
    // two identical rows: the matrix is singular, so the solver must defer
    // one contact rather than wedge on a singular submatrix
    let mut solver = ComputeForces::new();
    let mut rng = RandomLcg::new(0);
    let a = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
    let b = vec![-1.0, -1.0];
    let joint = [false, false];
    let (f, code) = solve(&a, &b, &joint, &mut solver, &mut rng);
    assert_eq!(code, SUCCESS);
    // total force carries the load, however it is distributed
    assert!((f[0] + f[1] - 1.0).abs() < 1e-9);
    assert!(f[0] >= -1e-10 && f[1] >= -1e-10);
    assert!(check_force_accel(&a, &b, &joint, &f, 1e-10) < 1e-8);
}

#[test]
fn test_complementarity_on_mixed_problem() {
    let mut solver = ComputeForces::new();
    let mut rng = RandomLcg::new(7);
    let a = vec![
        vec![4.0, 1.0, 0.5, 0.0],
        vec![1.0, 3.0, 0.0, 0.5],
        vec![0.5, 0.0, 2.0, 1.0],
        vec![0.0, 0.5, 1.0, 5.0],
    ];
    let b = vec![-1.0, 2.0, -3.0, 0.5];
    let joint = [false, false, false, true];
    let (f, code) = solve(&a, &b, &joint, &mut solver, &mut rng);
    assert_eq!(code, SUCCESS);
    // complementary slackness: a[i] * f[i] vanishes except at joints,
    // where the acceleration itself vanishes
    for i in 0..4 {
        let mut acc = b[i];
        for k in 0..4 {
            acc += a[i][k] * f[k];
        }
        if joint[i] {
            assert!(acc.abs() < 1e-8);
        } else {
            assert!(acc > -1e-8);
            assert!(f[i] > -1e-10);
            assert!((acc * f[i]).abs() < 1e-8);
        }
    }
}

#[test]
fn test_solution_is_idempotent() {
    // solving the same problem twice yields the same forces
    let mut solver = ComputeForces::new();
    let a = vec![vec![2.5, -0.5], vec![-0.5, 2.5]];
    let b = vec![-9.8, -3.0];
    let joint = [false, false];
    let mut rng = RandomLcg::new(3);
    let (f1, code1) = solve(&a, &b, &joint, &mut solver, &mut rng);
    let mut rng = RandomLcg::new(3);
    let (f2, code2) = solve(&a, &b, &joint, &mut solver, &mut rng);
    assert_eq!(code1, SUCCESS);
    assert_eq!(code2, SUCCESS);
    assert_eq!(f1, f2);
}

#[test]
fn test_policies_agree() {
    let a = vec![vec![2.5, -0.5], vec![-0.5, 2.5]];
    let b = vec![-9.8, -9.8];
    let joint = [false, false];
    for policy in [
        NextContactPolicy::Hybrid,
        NextContactPolicy::MinAccel,
        NextContactPolicy::Random,
        NextContactPolicy::PreOrdered,
    ] {
        let mut solver = ComputeForces::new();
        solver.set_policy(policy);
        let mut rng = RandomLcg::new(11);
        let (f, code) = solve(&a, &b, &joint, &mut solver, &mut rng);
        assert_eq!(code, SUCCESS);
        assert!((f[0] - 4.9).abs() < 1e-9, "policy {:?}", policy);
        assert!((f[1] - 4.9).abs() < 1e-9, "policy {:?}", policy);
    }
}
