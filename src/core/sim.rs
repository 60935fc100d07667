use crate::bodies::{BodyId, Polygon, PolygonFlags};
use crate::collision::{self, ContactRecord};
use crate::constraints::Connector;
use crate::core::config::{CollisionHandling, ExtraAccelPolicy, SimulationConfig};
use crate::core::events::{EventQueue, SimEvent, SimEventType};
use crate::core::state::{self, StateVector};
use crate::core::EnergyInfo;
use crate::error::PhysicsError;
use crate::forces::{Force, ForceLaw};
use crate::math::{RandomLcg, Vector2};
use crate::solver::{ContactForces, ImpulseResolver};
use crate::Result;

/// The 2D rigid-body simulation: owns the bodies, the state vector, the
/// force laws and connectors, and the contact and impulse solvers.
///
/// Bodies live in tombstoned slots so their ids and state-vector positions
/// stay stable across removals; a removed body's slots become eligible for
/// reuse by a later added body.
pub struct RigidBodySim {
    bodies: Vec<Option<Polygon>>,
    state: StateVector,
    force_laws: Vec<Box<dyn ForceLaw>>,
    connectors: Vec<Box<dyn Connector>>,
    config: SimulationConfig,
    rng: RandomLcg,
    events: EventQueue,
    contact_solver: ContactForces,
    impulse_resolver: ImpulseResolver,
    contacts: Vec<ContactRecord>,
}

impl Default for RigidBodySim {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBodySim {
    /// Creates a simulation with the default configuration
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a simulation with the given configuration
    pub fn with_config(config: SimulationConfig) -> Self {
        let rng = RandomLcg::new(config.random_seed);
        Self {
            bodies: Vec::new(),
            state: StateVector::new(),
            force_laws: Vec::new(),
            connectors: Vec::new(),
            config,
            rng,
            events: EventQueue::new(),
            contact_solver: ContactForces::new(),
            impulse_resolver: ImpulseResolver::new(),
            contacts: Vec::new(),
        }
    }

    /// Returns the simulation configuration
    pub fn get_config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns a mutable reference to the simulation configuration
    pub fn get_config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    /// Returns the current simulation time
    pub fn get_time(&self) -> f64 {
        self.state.time()
    }

    /// Returns the state vector
    pub fn get_state(&self) -> &StateVector {
        &self.state
    }

    /// Overwrites the state vector values; bodies are not synchronized until
    /// [`RigidBodySim::synchronize_bodies`] runs
    pub fn set_state_values(&mut self, values: &[f64]) -> Result<()> {
        self.state.set_values(values)
    }

    /// Returns the event queue
    pub fn get_events(&self) -> &EventQueue {
        &self.events
    }

    /// Returns a mutable reference to the event queue
    pub fn get_events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Returns the contact records solved in the most recent evaluation,
    /// with their force magnitudes
    pub fn get_contacts(&self) -> &[ContactRecord] {
        &self.contacts
    }

    // === bodies ===

    /// Adds a finished body, allocating its 6 state-vector slots. Returns
    /// the body's id.
    pub fn add_body(&mut self, body: Polygon) -> Result<BodyId> {
        if !body.get_flags().contains(PolygonFlags::FINISHED) {
            return Err(PhysicsError::InvalidParameter(
                "body must be finished before it is added".to_string(),
            ));
        }
        if self.body_id_by_name(body.get_name()).is_some() {
            return Err(PhysicsError::InvalidParameter(format!(
                "a body named \"{}\" is already in the simulation",
                body.get_name()
            )));
        }
        let mut body = body;
        let vars = self.state.add_body_vars(body.get_name());
        body.set_vars_index(Some(vars));
        let id = match self.bodies.iter().position(|slot| slot.is_none()) {
            Some(slot) => {
                self.bodies[slot] = Some(body);
                slot
            }
            None => {
                self.bodies.push(Some(body));
                self.bodies.len() - 1
            }
        };
        self.write_body_state(id);
        self.events.push(SimEvent {
            event_type: SimEventType::BodyAdded,
            body: Some(id),
            value: None,
        });
        Ok(id)
    }

    /// Removes a body, marking its state-vector slots deleted. Connectors
    /// involving the body are removed as well.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Polygon> {
        let mut body = self
            .bodies
            .get_mut(id)
            .and_then(|slot| slot.take())
            .ok_or_else(|| PhysicsError::NotFound(format!("no body with id {}", id)))?;
        if let Some(vars) = body.get_vars_index() {
            self.state.delete_body_vars(vars);
        }
        body.set_vars_index(None);
        self.connectors.retain(|c| !c.involves_body(id));
        self.events.push(SimEvent {
            event_type: SimEventType::BodyRemoved,
            body: Some(id),
            value: None,
        });
        Ok(body)
    }

    /// Returns the live bodies with their ids
    pub fn get_bodies(&self) -> impl Iterator<Item = (BodyId, &Polygon)> {
        self.bodies
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|b| (id, b)))
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.bodies.iter().flatten().count()
    }

    /// Returns the body with the given id
    pub fn get_body(&self, id: BodyId) -> Result<&Polygon> {
        self.bodies
            .get(id)
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| PhysicsError::NotFound(format!("no body with id {}", id)))
    }

    /// Returns a mutable reference to the body with the given id
    pub fn get_body_mut(&mut self, id: BodyId) -> Result<&mut Polygon> {
        self.bodies
            .get_mut(id)
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| PhysicsError::NotFound(format!("no body with id {}", id)))
    }

    /// Returns the id of the body with the given name
    pub fn body_id_by_name(&self, name: &str) -> Option<BodyId> {
        self.get_bodies()
            .find(|(_, b)| b.get_name() == name)
            .map(|(id, _)| id)
    }

    /// Returns the body with the given name
    pub fn get_body_by_name(&self, name: &str) -> Result<&Polygon> {
        self.body_id_by_name(name)
            .and_then(|id| self.bodies[id].as_ref())
            .ok_or_else(|| PhysicsError::NotFound(format!("no body named \"{}\"", name)))
    }

    /// Writes a body's pose and velocity into its state-vector slots
    pub fn write_body_state(&mut self, id: BodyId) {
        if let Some(body) = self.bodies.get(id).and_then(|slot| slot.as_ref()) {
            if let Some(vars) = body.get_vars_index() {
                let position = body.get_position();
                let velocity = body.get_velocity();
                self.state.set(vars + state::X, position.x);
                self.state.set(vars + state::VX, velocity.x);
                self.state.set(vars + state::Y, position.y);
                self.state.set(vars + state::VY, velocity.y);
                self.state.set(vars + state::ANGLE, body.get_angle());
                self.state
                    .set(vars + state::ANGULAR_VELOCITY, body.get_angular_velocity());
            }
        }
    }

    fn write_all_body_states(&mut self) {
        for id in 0..self.bodies.len() {
            self.write_body_state(id);
        }
    }

    /// Updates body poses and velocities from the state vector and
    /// recomputes the energy slots
    pub fn synchronize_bodies(&mut self) {
        for slot in self.bodies.iter_mut().flatten() {
            if let Some(vars) = slot.get_vars_index() {
                let values = self.state.values();
                slot.set_position(
                    Vector2::new(values[vars + state::X], values[vars + state::Y]),
                    values[vars + state::ANGLE],
                );
                slot.set_velocity(
                    Vector2::new(values[vars + state::VX], values[vars + state::VY]),
                    values[vars + state::ANGULAR_VELOCITY],
                );
            }
        }
        let energy = self.get_energy_info();
        self.state
            .set(state::KINETIC_ENERGY, energy.translational + energy.rotational);
        self.state.set(state::POTENTIAL_ENERGY, energy.potential);
        self.state.set(state::TOTAL_ENERGY, energy.total());
    }

    /// Current energy of the simulation: potential from the force laws,
    /// kinetic split into translation and rotation
    pub fn get_energy_info(&self) -> EnergyInfo {
        let potential = self
            .force_laws
            .iter()
            .map(|law| law.potential_energy(&self.bodies))
            .sum();
        let mut translational = 0.0;
        let mut rotational = 0.0;
        for (_, body) in self.get_bodies() {
            translational += body.translational_energy();
            rotational += body.rotational_energy();
        }
        EnergyInfo {
            potential,
            translational,
            rotational,
        }
    }

    // === force laws and connectors ===

    /// Adds a force law; returns its index
    pub fn add_force_law(&mut self, law: Box<dyn ForceLaw>) -> usize {
        self.force_laws.push(law);
        self.force_laws.len() - 1
    }

    /// Removes the force law at the given index
    pub fn remove_force_law(&mut self, index: usize) -> Result<Box<dyn ForceLaw>> {
        if index < self.force_laws.len() {
            Ok(self.force_laws.remove(index))
        } else {
            Err(PhysicsError::NotFound(format!(
                "no force law at index {}",
                index
            )))
        }
    }

    /// Removes all force laws
    pub fn clear_force_laws(&mut self) {
        self.force_laws.clear();
    }

    /// Returns the force laws
    pub fn get_force_laws(&self) -> &[Box<dyn ForceLaw>] {
        &self.force_laws
    }

    /// Adds a connector, aligning its bodies. With `follow`, the connector
    /// is inserted after that position in the list, which sets the order of
    /// alignment for chains.
    pub fn add_connector(&mut self, connector: Box<dyn Connector>, follow: Option<usize>) {
        connector.align(&mut self.bodies);
        match follow {
            Some(index) if index < self.connectors.len() => {
                self.connectors.insert(index + 1, connector);
            }
            _ => self.connectors.push(connector),
        }
        self.write_all_body_states();
        self.synchronize_bodies();
    }

    /// Removes the connector at the given index
    pub fn remove_connector(&mut self, index: usize) -> Result<Box<dyn Connector>> {
        if index < self.connectors.len() {
            Ok(self.connectors.remove(index))
        } else {
            Err(PhysicsError::NotFound(format!(
                "no connector at index {}",
                index
            )))
        }
    }

    /// Returns the connectors
    pub fn get_connectors(&self) -> &[Box<dyn Connector>] {
        &self.connectors
    }

    // === configuration ===

    /// Sets elasticity on every body and broadcasts the change
    pub fn set_elasticity(&mut self, elasticity: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&elasticity) {
            return Err(PhysicsError::InvalidParameter(format!(
                "elasticity must be in [0, 1]: {}",
                elasticity
            )));
        }
        for body in self.bodies.iter_mut().flatten() {
            body.set_elasticity(elasticity);
        }
        self.events.push(SimEvent {
            event_type: SimEventType::ElasticitySet,
            body: None,
            value: Some(elasticity),
        });
        Ok(())
    }

    /// Sets the distance tolerance on the configuration and every body
    pub fn set_distance_tol(&mut self, tolerance: f64) {
        self.config.distance_tol = tolerance;
        for body in self.bodies.iter_mut().flatten() {
            body.set_distance_tol(tolerance);
        }
    }

    /// Sets the velocity tolerance on the configuration and every body
    pub fn set_velocity_tol(&mut self, tolerance: f64) {
        self.config.velocity_tol = tolerance;
        for body in self.bodies.iter_mut().flatten() {
            body.set_velocity_tol(tolerance);
        }
    }

    /// Sets the collision accuracy on the configuration and every body
    pub fn set_collision_accuracy(&mut self, accuracy: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&accuracy) || accuracy == 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "collision accuracy must be in (0, 1]: {}",
                accuracy
            )));
        }
        self.config.collision_accuracy = accuracy;
        for body in self.bodies.iter_mut().flatten() {
            body.set_accuracy(accuracy);
        }
        Ok(())
    }

    /// Sets the extra-acceleration policy
    pub fn set_extra_accel(&mut self, policy: ExtraAccelPolicy) {
        self.config.extra_accel = policy;
    }

    /// Sets the collision-handling policy
    pub fn set_collision_handling(&mut self, policy: CollisionHandling) {
        self.config.collision_handling = policy;
    }

    /// Seeds the random number generator, making the simulation reproducible
    pub fn set_random_seed(&mut self, seed: u32) {
        self.config.random_seed = seed;
        self.rng.set_seed(seed);
    }

    /// Returns the current seed of the random number generator
    pub fn get_random_seed(&self) -> u32 {
        self.rng.get_seed()
    }

    // === simulation core ===

    /// An immovable body must never move
    fn check_infinite_mass_invariant(&self) -> Result<()> {
        for (_, body) in self.get_bodies() {
            if body.get_mass().is_infinite()
                && (body.get_velocity().length() > 0.0 || body.get_angular_velocity() != 0.0)
            {
                return Err(PhysicsError::StateViolation(format!(
                    "infinite-mass body \"{}\" is moving: velocity {} angular {}",
                    body.get_name(),
                    body.get_velocity(),
                    body.get_angular_velocity()
                )));
            }
        }
        Ok(())
    }

    /// Evaluates the equations of motion at the given state: writes the
    /// rates of change of every variable into `change`, applying external
    /// forces and contact forces.
    ///
    /// Returns `Some(records)` when an illegal penetration requires the
    /// caller to reject this step, `None` on success.
    pub fn evaluate(
        &mut self,
        state_values: &[f64],
        change: &mut [f64],
        step_size: f64,
    ) -> Result<Option<Vec<ContactRecord>>> {
        if state_values.len() != self.state.len() || change.len() != self.state.len() {
            return Err(PhysicsError::InvalidParameter(format!(
                "state length mismatch: {} / {} vs {}",
                state_values.len(),
                change.len(),
                self.state.len()
            )));
        }
        sync_bodies_from(&mut self.bodies, state_values);
        change.fill(0.0);
        change[state::TIME] = 1.0;
        for body in self.bodies.iter().flatten() {
            if !body.get_mass().is_finite() {
                continue;
            }
            if let Some(vars) = body.get_vars_index() {
                change[vars + state::X] = state_values[vars + state::VX];
                change[vars + state::Y] = state_values[vars + state::VY];
                change[vars + state::ANGLE] = state_values[vars + state::ANGULAR_VELOCITY];
            }
        }
        // external force laws
        for law in &self.force_laws {
            for force in law.calculate_forces(&self.bodies) {
                if !force.is_finite() {
                    return Err(PhysicsError::StateViolation(format!(
                        "force law {} produced a non-finite force",
                        law.law_type()
                    )));
                }
                apply_force(&self.bodies, &force, change);
            }
        }
        // contacts and collisions
        self.check_infinite_mass_invariant()?;
        self.contacts.clear();
        collision::find_collisions(&self.bodies, step_size, &mut self.contacts);
        for connector in &self.connectors {
            connector.add_collision(
                &mut self.contacts,
                &self.bodies,
                state_values[state::TIME],
                self.config.collision_accuracy,
            );
        }
        if self.contacts.iter().any(|c| c.is_illegal()) {
            return Ok(Some(self.contacts.clone()));
        }
        // keep the persistent contacts; imminent collisions wait for the
        // impulse solver
        self.contacts.retain(|c| c.is_contact());
        self.contact_solver.compute_forces(
            &mut self.contacts,
            &self.bodies,
            change,
            &self.config,
            &mut self.rng,
        )?;
        Ok(None)
    }

    /// Finds all contacts and collisions at the given state and appends them
    /// to the caller's list
    pub fn find_collisions(
        &mut self,
        list: &mut Vec<ContactRecord>,
        state_values: &[f64],
        step_size: f64,
    ) -> Result<()> {
        sync_bodies_from(&mut self.bodies, state_values);
        self.detect_collisions(list, step_size)
    }

    /// Finds all contacts and collisions at the current body poses
    pub fn detect_collisions(
        &mut self,
        list: &mut Vec<ContactRecord>,
        step_size: f64,
    ) -> Result<()> {
        self.check_infinite_mass_invariant()?;
        collision::find_collisions(&self.bodies, step_size, list);
        for connector in &self.connectors {
            connector.add_collision(list, &self.bodies, self.state.time(), self.config.collision_accuracy);
        }
        Ok(())
    }

    /// Applies collision impulses to the given records under the configured
    /// policy. Returns whether any non-trivial impulse was applied; the
    /// optional `totals` accumulates the applied impulse magnitudes.
    pub fn handle_collisions(
        &mut self,
        records: &mut [ContactRecord],
        totals: Option<&mut f64>,
    ) -> Result<bool> {
        let applied = self.impulse_resolver.handle_collisions(
            records,
            &mut self.bodies,
            self.config.collision_handling,
            &mut self.rng,
        )?;
        if let Some(totals) = totals {
            *totals += records.iter().map(|r| r.impulse.abs()).sum::<f64>();
        }
        self.write_all_body_states();
        self.synchronize_bodies();
        Ok(applied)
    }
}

/// Updates body poses and velocities from a state array
fn sync_bodies_from(bodies: &mut [Option<Polygon>], values: &[f64]) {
    for body in bodies.iter_mut().flatten() {
        if let Some(vars) = body.get_vars_index() {
            body.set_position(
                Vector2::new(values[vars + state::X], values[vars + state::Y]),
                values[vars + state::ANGLE],
            );
            body.set_velocity(
                Vector2::new(values[vars + state::VX], values[vars + state::VY]),
                values[vars + state::ANGULAR_VELOCITY],
            );
        }
    }
}

/// Applies one external force into the rate-of-change vector
fn apply_force(bodies: &[Option<Polygon>], force: &Force, change: &mut [f64]) {
    let body = match bodies.get(force.body).and_then(|slot| slot.as_ref()) {
        Some(body) if body.get_mass().is_finite() => body,
        _ => return,
    };
    let vars = match body.get_vars_index() {
        Some(vars) => vars,
        None => return,
    };
    change[vars + state::VX] += force.vector.x * body.recip_mass();
    change[vars + state::VY] += force.vector.y * body.recip_mass();
    let r = force.location - body.get_position();
    change[vars + state::ANGULAR_VELOCITY] +=
        (r.cross(&force.vector) + force.torque) * body.recip_moment();
}
