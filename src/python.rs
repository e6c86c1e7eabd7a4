use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::SimConfig;
use crate::core::scenario::{Billiards, Crystal, EmptyScenario, ExpandingGas, RandomGas};
use crate::core::{
    FrameInput, Interaction, Particle, PointerInput, Rect, Simulation, ToolMode, Vec2, Wall,
};
use crate::error::Error;

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn build(
    config: SimConfig,
    scenario: &str,
    count: usize,
    radius: f64,
    mass: f64,
) -> crate::error::Result<Simulation> {
    match scenario {
        "empty" => Simulation::new(config, EmptyScenario),
        "gas" => Simulation::new(config, RandomGas { count, radius, mass }),
        "expanding" => Simulation::new(config, ExpandingGas { count }),
        "crystal" => Simulation::new(config, Crystal { count, strength: 1.0 }),
        "billiards" => Simulation::new(
            config,
            Billiards {
                layers: None,
                cue_speed: 5.0,
            },
        ),
        other => Err(Error::Configuration(format!("unknown scenario '{other}'"))),
    }
}

/// Python-facing wrapper around the Rust Simulation core.
///
/// API:
/// - __new__(config_json=None, scenario="empty", count=0, radius=1.0, mass=1.0)
/// - update(timestamp_ms, tool="none", x=0.0, y=0.0, is_down=False, transitions=0)
/// - advance_to(time), step(), reset(), pause(), resume()
/// - get_positions() / get_velocities() -> np.ndarray, shape (N, 2)
/// - get_region_series(index) -> dict of np.ndarray
#[pyclass(unsendable)]
pub struct ParticleSim {
    sim: Simulation,
}

#[pymethods]
impl ParticleSim {
    /// Create a simulation from an optional JSON configuration and a named scenario
    /// ("empty", "gas", "expanding", "crystal", "billiards").
    ///
    /// Errors: raises ValueError on invalid configuration or an unknown scenario.
    #[new]
    #[pyo3(signature = (config_json=None, scenario="empty", count=0, radius=1.0, mass=1.0))]
    fn new(
        config_json: Option<&str>,
        scenario: &str,
        count: usize,
        radius: f64,
        mass: f64,
    ) -> PyResult<Self> {
        let config = match config_json {
            Some(text) => SimConfig::from_json(text).map_err(py_err)?,
            None => SimConfig::default(),
        };
        let sim = build(config, scenario, count, radius, mass).map_err(py_err)?;
        Ok(Self { sim })
    }

    fn reset(&mut self) -> PyResult<()> {
        self.sim.reset().map_err(py_err)
    }

    /// Run one rendered frame; returns the number of sub-steps taken.
    #[pyo3(signature = (timestamp_ms, tool="none", x=0.0, y=0.0, is_down=false, transitions=0))]
    fn update(
        &mut self,
        timestamp_ms: f64,
        tool: &str,
        x: f64,
        y: f64,
        is_down: bool,
        transitions: u32,
    ) -> PyResult<usize> {
        let tool: ToolMode = tool.parse().map_err(py_err)?;
        let template = Particle::at(Vec2::zeros()).map_err(py_err)?;
        let mut factory = || template.clone();
        let frame = FrameInput {
            timestamp_ms,
            tool,
            pointer: PointerInput {
                position: Vec2::new(x, y),
                is_down,
                transitions,
            },
            factory: Some(&mut factory as &mut dyn FnMut() -> Particle),
        };
        Ok(self.sim.update(frame))
    }

    /// Advance the simulation to the specified absolute time.
    fn advance_to(&mut self, target_time: f64) -> PyResult<()> {
        self.sim.advance_to(target_time).map_err(py_err)
    }

    fn step(&mut self) {
        self.sim.step();
    }

    fn pause(&mut self) {
        self.sim.pause();
    }

    fn resume(&mut self) {
        self.sim.resume();
    }

    /// Add a particle; returns False when it does not fit.
    #[pyo3(signature = (x, y, vx=0.0, vy=0.0, radius=1.0, mass=1.0, kind=0, color=0))]
    #[allow(clippy::too_many_arguments)]
    fn add_particle(
        &mut self,
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        radius: f64,
        mass: f64,
        kind: usize,
        color: u32,
    ) -> PyResult<bool> {
        let particle = Particle::new(Vec2::new(x, y), Vec2::new(vx, vy), radius, mass)
            .map_err(py_err)?
            .with_kind(kind)
            .with_color(color);
        Ok(self.sim.add_particle(particle))
    }

    fn remove_particle(&mut self, id: u32) -> bool {
        self.sim.remove_particle(id).is_some()
    }

    /// Install an interaction ("repulsive" or "lennard_jones") between kinds a and b.
    #[pyo3(signature = (a, b, kind="lennard_jones", strength=1.0, separation=2.0))]
    fn set_interaction(
        &mut self,
        a: usize,
        b: usize,
        kind: &str,
        strength: f64,
        separation: f64,
    ) -> PyResult<()> {
        let interaction = match kind {
            "repulsive" => Interaction::Repulsive { strength, separation },
            "lennard_jones" => Interaction::LennardJones { strength, separation },
            other => return Err(py_err(format!("unknown interaction '{other}'"))),
        };
        self.sim.set_interaction(a, b, interaction).map_err(py_err)
    }

    fn add_wall(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> PyResult<()> {
        let wall = Wall::new(Vec2::new(x0, y0), Vec2::new(x1, y1)).map_err(py_err)?;
        self.sim.add_wall(wall);
        Ok(())
    }

    /// Add a measurement region; returns its index.
    fn add_region(&mut self, left: f64, bottom: f64, right: f64, top: f64) -> PyResult<usize> {
        let rect = Rect::from_edges(left, bottom, right, top);
        self.sim.add_measurement_region(rect).map_err(py_err)
    }

    /// Return positions as a NumPy array of shape (N, 2), dtype=float64.
    fn get_positions<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let particles = self.sim.particles();
        let mut arr = Array2::<f64>::zeros((particles.len(), 2));
        for (i, p) in particles.iter().enumerate() {
            arr[[i, 0]] = p.position.x;
            arr[[i, 1]] = p.position.y;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Return velocities as a NumPy array of shape (N, 2), dtype=float64.
    fn get_velocities<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let particles = self.sim.particles();
        let mut arr = Array2::<f64>::zeros((particles.len(), 2));
        for (i, p) in particles.iter().enumerate() {
            arr[[i, 0]] = p.velocity.x;
            arr[[i, 1]] = p.velocity.y;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Set all particle velocities from a NumPy array of shape (N, 2). Values must be finite.
    fn set_velocities<'py>(&mut self, velocities: PyReadonlyArray2<'py, f64>) -> PyResult<()> {
        let arr = velocities.as_array();
        let n = self.sim.num_particles();
        if arr.shape() != [n, 2] {
            return Err(py_err(format!(
                "velocities must have shape ({n}, 2), got {:?}",
                arr.shape()
            )));
        }
        for (i, p) in self.sim.particles_mut().iter_mut().enumerate() {
            p.set_velocity(Vec2::new(arr[[i, 0]], arr[[i, 1]])).map_err(py_err)?;
        }
        Ok(())
    }

    fn get_ids(&self) -> Vec<u32> {
        self.sim.particles().iter().map(|p| p.id).collect()
    }

    /// Return the rolling series of region `index` as a dict of NumPy arrays.
    fn get_region_series<'py>(&self, py: Python<'py>, index: usize) -> PyResult<Py<PyDict>> {
        let region = self
            .sim
            .regions()
            .get(index)
            .ok_or_else(|| py_err(format!("no region {index}")))?;
        let s = &region.series;
        let out = PyDict::new(py);
        for (name, values) in [
            ("time", &s.time),
            ("count", &s.count),
            ("energy", &s.energy),
            ("temperature", &s.temperature),
            ("pressure", &s.pressure),
            ("virial_pressure", &s.virial_pressure),
        ] {
            let v: Vec<f64> = values.iter().copied().collect();
            out.set_item(name, v.into_pyarray(py))?;
        }
        Ok(out.into())
    }

    /// Return a (M, 3) NumPy array of [time, entropy, probability] samples.
    fn get_entropy_series<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let m = self.sim.measurements();
        let mut arr = Array2::<f64>::zeros((m.time.len(), 3));
        for (i, ((t, s), p)) in m.time.iter().zip(&m.entropy).zip(&m.probability).enumerate() {
            arr[[i, 0]] = *t;
            arr[[i, 1]] = *s;
            arr[[i, 2]] = *p;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    #[getter]
    fn time(&self) -> f64 {
        self.sim.time()
    }

    #[getter]
    fn num_particles(&self) -> usize {
        self.sim.num_particles()
    }

    #[getter]
    fn reset_recommended(&self) -> bool {
        self.sim.reset_recommended()
    }

    fn total_energy(&self) -> f64 {
        self.sim.total_energy()
    }

    fn total_pressure(&self) -> f64 {
        self.sim.total_pressure()
    }
}

/// The partsim Python module entry point.
#[pymodule]
fn partsim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ParticleSim>()?;
    Ok(())
}
