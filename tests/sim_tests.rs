use rigid2d::core::state;
use rigid2d::core::SimEventType;
use rigid2d::forces::GravityLaw;
use rigid2d::constraints::pin_to_scrim;
use rigid2d::math::Vector2;
use rigid2d::{make_ball, make_block, make_wall, CollisionAdvance, RigidBodySim};

#[test]
fn test_two_block_add_remove() {
    let mut sim = RigidBodySim::new();

    let mut block1 = make_block(1.0, 3.0, "block1").unwrap();
    block1.set_position(Vector2::new(-1.0, -1.0), std::f64::consts::PI / 4.0);
    let id1 = sim.add_body(block1).unwrap();

    let mut block2 = make_block(1.0, 3.0, "block2").unwrap();
    block2.set_position(Vector2::new(5.0, 5.0), std::f64::consts::PI / 3.0);
    block2.set_velocity(Vector2::new(-1.0, -1.0), 2.0);
    let id2 = sim.add_body(block2).unwrap();

    // 4 global slots, then 6 per body
    assert_eq!(sim.get_body(id1).unwrap().get_vars_index(), Some(4));
    assert_eq!(sim.get_body(id2).unwrap().get_vars_index(), Some(10));
    assert_eq!(sim.get_state().len(), 16);
    assert_eq!(sim.get_state().get(4), -1.0);
    assert_eq!(sim.get_state().get(10), 5.0);
    assert_eq!(sim.get_state().get(11), -1.0);
    assert_eq!(sim.get_state().get(15), 2.0);

    // removing block1 tombstones its slots but shifts nothing
    sim.remove_body(id1).unwrap();
    for slot in 4..10 {
        assert!(sim.get_state().is_deleted(slot));
    }
    assert!(sim.get_body_by_name("block1").is_err());
    assert_eq!(sim.get_body(id2).unwrap().get_vars_index(), Some(10));
    assert_eq!(sim.get_state().len(), 16);

    // a later body reuses the tombstoned run
    let block3 = make_block(1.0, 1.0, "block3").unwrap();
    let id3 = sim.add_body(block3).unwrap();
    assert_eq!(sim.get_body(id3).unwrap().get_vars_index(), Some(4));
    assert_eq!(sim.get_state().len(), 16);
}

#[test]
fn test_resting_block_contact_force() {
    let mut sim = RigidBodySim::new();

    let mut floor = make_wall(12.0, 1.0, "floor").unwrap();
    floor.set_position(Vector2::new(0.0, -0.5), 0.0);
    sim.add_body(floor).unwrap();

    // block resting with its corners half a tolerance above the floor
    let mut block = make_block(1.0, 1.0, "block").unwrap();
    block.set_position(Vector2::new(0.0, 0.505), 0.0);
    let block_id = sim.add_body(block).unwrap();

    sim.add_force_law(Box::new(GravityLaw::new(9.8)));

    let mut advance = CollisionAdvance::default();
    advance.advance(&mut sim, 0.01).unwrap();

    // the contact forces carry exactly the block's weight
    let total: f64 = sim.get_contacts().iter().map(|c| c.impulse).sum();
    assert_eq!(sim.get_contacts().len(), 2);
    assert!((total - 9.8).abs() < 1e-6, "total force {}", total);

    // and the block does not move
    let position = sim.get_body(block_id).unwrap().get_position();
    assert!((position.y - 0.505).abs() < 1e-7);
    assert!(position.x.abs() < 1e-7);
}

#[test]
fn test_elastic_head_on_collision() {
    let mut sim = RigidBodySim::new();

    let mut left = make_ball(0.5, "left").unwrap();
    left.set_position(Vector2::new(-1.035, 0.0), 0.0);
    left.set_velocity(Vector2::new(1.0, 0.0), 0.0);
    let left_id = sim.add_body(left).unwrap();

    let mut right = make_ball(0.5, "right").unwrap();
    right.set_position(Vector2::new(1.035, 0.0), 0.0);
    right.set_velocity(Vector2::new(-1.0, 0.0), 0.0);
    let right_id = sim.add_body(right).unwrap();

    sim.set_elasticity(1.0).unwrap();
    let initial_energy = sim.get_energy_info().total();

    let mut advance = CollisionAdvance::default();
    for _ in 0..60 {
        advance.advance(&mut sim, 0.025).unwrap();
    }

    // equal masses with elasticity 1 swap velocities
    let v_left = sim.get_body(left_id).unwrap().get_velocity();
    let v_right = sim.get_body(right_id).unwrap().get_velocity();
    assert!((v_left.x + 1.0).abs() < 1e-9, "left velocity {}", v_left);
    assert!((v_right.x - 1.0).abs() < 1e-9, "right velocity {}", v_right);
    assert!(v_left.y.abs() < 1e-9);
    assert!(v_right.y.abs() < 1e-9);

    // kinetic energy is conserved across the collision
    let final_energy = sim.get_energy_info().total();
    assert!((final_energy - initial_energy).abs() < 1e-6);

    // and the balls flew apart again
    let gap = sim.get_body(right_id).unwrap().get_position().x
        - sim.get_body(left_id).unwrap().get_position().x;
    assert!(gap > 2.0);
}

#[test]
fn test_three_block_pile() {
    let mut sim = RigidBodySim::new();

    let mut floor = make_wall(12.0, 1.0, "floor").unwrap();
    floor.set_position(Vector2::new(0.0, -0.5), 0.0);
    sim.add_body(floor).unwrap();

    // three blocks stacked with half-tolerance gaps
    let mut ids = Vec::new();
    let mut initial = Vec::new();
    for (i, y) in [0.505, 1.51, 2.515].iter().enumerate() {
        let mut block = make_block(1.0, 1.0, &format!("block{}", i + 1)).unwrap();
        block.set_position(Vector2::new(0.0, *y), 0.0);
        ids.push(sim.add_body(block).unwrap());
        initial.push(Vector2::new(0.0, *y));
    }
    sim.add_force_law(Box::new(GravityLaw::new(9.8)));
    sim.set_elasticity(0.0).unwrap();

    let initial_energy = sim.get_energy_info().total();

    let mut advance = CollisionAdvance::default();
    for _ in 0..100 {
        advance.advance(&mut sim, 0.01).unwrap();
    }

    // the pile holds: every block within the distance tolerance of where
    // it started
    for (id, start) in ids.iter().zip(&initial) {
        let position = sim.get_body(*id).unwrap().get_position();
        assert!(
            (position - *start).length() < 0.01,
            "block drifted from {} to {}",
            start,
            position
        );
    }

    // energy drifts less than half a percent
    let final_energy = sim.get_energy_info().total();
    assert!((final_energy - initial_energy).abs() < 0.005 * initial_energy.abs());
}

#[test]
fn test_pendulum_joint_holds() {
    let mut sim = RigidBodySim::new();

    let mut bob = make_block(0.2, 1.0, "bob").unwrap();
    bob.set_position(Vector2::new(0.0, 0.0), 0.8);
    let bob_id = sim.add_body(bob).unwrap();

    // pin the top of the bob to a fixed point with two perpendicular joints
    let (horizontal, vertical) = pin_to_scrim(bob_id, Vector2::new(0.0, 0.5), Vector2::new(0.0, 2.0));
    sim.add_connector(Box::new(horizontal), None);
    sim.add_connector(Box::new(vertical), None);
    sim.add_force_law(Box::new(GravityLaw::new(9.8)));
    sim.set_elasticity(0.0).unwrap();

    // the pin leaves the bob hanging from the fixed point
    let attach = sim.get_body(bob_id).unwrap().body_to_world(Vector2::new(0.0, 0.5));
    assert!((attach - Vector2::new(0.0, 2.0)).length() < 1e-9);

    let mut advance = CollisionAdvance::default();
    let mut worst_gap: f64 = 0.0;
    for _ in 0..400 {
        advance.advance(&mut sim, 0.025).unwrap();
        let mut records = Vec::new();
        sim.detect_collisions(&mut records, 0.025).unwrap();
        for record in records.iter().filter(|r| r.joint) {
            worst_gap = worst_gap.max(record.distance.abs());
        }
    }
    // ten simulated seconds without the pin letting go
    assert!(worst_gap < 0.01, "worst joint gap {}", worst_gap);

    // the bob is still swinging somewhere below the pin
    let position = sim.get_body(bob_id).unwrap().get_position();
    assert!(position.y < 2.0);
}

#[test]
fn test_energy_restored_after_add_remove() {
    let mut sim = RigidBodySim::new();
    sim.add_force_law(Box::new(GravityLaw::new(9.8)));
    let initial = sim.get_energy_info().total();

    let mut block = make_block(1.0, 1.0, "visitor").unwrap();
    block.set_position(Vector2::new(0.0, 3.0), 0.0);
    let id = sim.add_body(block).unwrap();
    assert!(sim.get_energy_info().total() > initial);

    sim.remove_body(id).unwrap();
    assert_eq!(sim.get_energy_info().total(), initial);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let run = |seed: u32| -> Vec<f64> {
        let mut sim = RigidBodySim::new();
        sim.set_random_seed(seed);
        let mut floor = make_wall(12.0, 1.0, "floor").unwrap();
        floor.set_position(Vector2::new(0.0, -0.5), 0.0);
        sim.add_body(floor).unwrap();
        for (i, y) in [0.505, 1.51].iter().enumerate() {
            let mut block = make_block(1.0, 1.0, &format!("block{}", i + 1)).unwrap();
            block.set_position(Vector2::new(0.0, *y), 0.0);
            sim.add_body(block).unwrap();
        }
        sim.add_force_law(Box::new(GravityLaw::new(9.8)));
        let mut advance = CollisionAdvance::default();
        for _ in 0..20 {
            advance.advance(&mut sim, 0.01).unwrap();
        }
        sim.get_state().values().to_vec()
    };
    assert_eq!(run(17), run(17));
    assert_ne!(run(17)[state::TIME], 0.0);
}

#[test]
fn test_elasticity_broadcast() {
    let mut sim = RigidBodySim::new();
    let block = make_block(1.0, 1.0, "block").unwrap();
    let id = sim.add_body(block).unwrap();

    sim.set_elasticity(0.8).unwrap();
    assert_eq!(sim.get_body(id).unwrap().get_elasticity(), 0.8);
    assert!(sim
        .get_events()
        .iter()
        .any(|e| e.event_type == SimEventType::ElasticitySet && e.value == Some(0.8)));

    // out-of-range elasticity is rejected
    assert!(sim.set_elasticity(1.5).is_err());
}

#[test]
fn test_infinite_mass_body_must_not_move() {
    let mut sim = RigidBodySim::new();
    let mut wall = make_wall(4.0, 1.0, "wall").unwrap();
    wall.set_position(Vector2::new(0.0, 0.0), 0.0);
    let id = sim.add_body(wall).unwrap();

    // force a velocity onto the immovable wall through the state vector
    let vars = sim.get_body(id).unwrap().get_vars_index().unwrap();
    let mut values = sim.get_state().values().to_vec();
    values[vars + state::VX] = 1.0;
    sim.set_state_values(&values).unwrap();
    sim.synchronize_bodies();

    let mut records = Vec::new();
    assert!(sim.detect_collisions(&mut records, 0.01).is_err());
}
