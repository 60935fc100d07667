use crate::collision::ContactRecord;
use crate::core::RigidBodySim;
use crate::integration::Integrator;
use crate::Result;

/// Classic fourth-order Runge-Kutta integration over the simulation state
/// vector.
///
/// Sample buffers are retained between steps.
#[derive(Default)]
pub struct RungeKutta {
    y0: Vec<f64>,
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    temp: Vec<f64>,
}

impl RungeKutta {
    /// Creates a new Runge-Kutta integrator
    pub fn new() -> Self {
        Self::default()
    }
}

impl Integrator for RungeKutta {
    fn step(
        &mut self,
        sim: &mut RigidBodySim,
        step_size: f64,
    ) -> Result<Option<Vec<ContactRecord>>> {
        let n = sim.get_state().len();
        self.y0.clear();
        self.y0.extend_from_slice(sim.get_state().values());
        for buffer in [&mut self.k1, &mut self.k2, &mut self.k3, &mut self.k4, &mut self.temp] {
            buffer.resize(n, 0.0);
        }
        let h = step_size;

        if let Some(records) = sim.evaluate(&self.y0, &mut self.k1, h)? {
            sim.synchronize_bodies();
            return Ok(Some(records));
        }
        for i in 0..n {
            self.temp[i] = self.y0[i] + 0.5 * h * self.k1[i];
        }
        if let Some(records) = sim.evaluate(&self.temp, &mut self.k2, h)? {
            sim.synchronize_bodies();
            return Ok(Some(records));
        }
        for i in 0..n {
            self.temp[i] = self.y0[i] + 0.5 * h * self.k2[i];
        }
        if let Some(records) = sim.evaluate(&self.temp, &mut self.k3, h)? {
            sim.synchronize_bodies();
            return Ok(Some(records));
        }
        for i in 0..n {
            self.temp[i] = self.y0[i] + h * self.k3[i];
        }
        if let Some(records) = sim.evaluate(&self.temp, &mut self.k4, h)? {
            sim.synchronize_bodies();
            return Ok(Some(records));
        }
        for i in 0..n {
            self.temp[i] = self.y0[i]
                + (h / 6.0) * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }
        sim.set_state_values(&self.temp)?;
        sim.synchronize_bodies();
        Ok(None)
    }

    fn name(&self) -> &str {
        "RungeKutta4"
    }
}
