//! Simulation configuration.
//!
//! [`SimConfig`] is a plain `serde`-deserializable parameter set. Every field has a
//! default, so a JSON document only needs to mention what it changes:
//!
//! ```json
//! {
//!   "boundary": "periodic",
//!   "dt": 0.005,
//!   "thermostat_speed": 1.0,
//!   "thermostat_temperature": 0.2
//! }
//! ```
//!
//! The configuration handed to [`Simulation::new`](crate::core::Simulation::new) is the
//! base configuration restored on every reset; scenarios may tweak the live copy during
//! their `initialize` callback.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How the box edges behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// Particles leaving one side reappear on the opposite side; separations wrap.
    Periodic,
    /// The box is closed by walls; escaped particles are removed.
    #[default]
    Walled,
}

/// Numerical and physical parameters of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub boundary: Boundary,
    /// Upper bound on the particle count; 0 means unbounded.
    pub max_particle_count: usize,
    /// Fixed sub-step size.
    pub dt: f64,
    /// Simulated seconds per real second.
    pub sim_time_per_second: f64,
    /// Langevin viscosity; 0 disables the thermostat.
    pub thermostat_speed: f64,
    pub thermostat_temperature: f64,
    /// Downward gravitational acceleration.
    pub gravity: f64,
    pub friction: f64,
    pub wall_strength: f64,
    /// Lennard-Jones truncation radius in units of the interaction separation.
    pub cutoff_factor: f64,
    pub restitution: f64,
    pub attract_strength: f64,
    pub repel_strength: f64,
    pub drag_strength: f64,
    pub impulse_strength: f64,
    /// Resolve hard-sphere collisions exactly instead of evaluating soft forces.
    pub discrete_collisions: bool,
    /// Pure billiards mode: implies discrete collisions and `dt = sim_time_per_second / 60`.
    pub hard_spheres_only: bool,
    pub box_width: f64,
    pub box_height: f64,
    /// Length of the displayed measurement window in sim time.
    pub measurement_window: f64,
    pub measurement_enabled: bool,
    /// Per-unit-time velocity scale factor; 1 leaves velocities alone.
    pub velocity_amplification: f64,
    /// Raise the reset-recommended flag when particles are lost.
    pub remind_on_escape: bool,
    /// Max rim distance at which the pointer grabs a particle.
    pub pick_distance: f64,
    /// Upper bound for speeds drawn by the random scenario generators.
    pub max_initial_speed: f64,
    /// RNG seed for the thermostat and generators; `None` is nondeterministic.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            boundary: Boundary::Walled,
            max_particle_count: 0,
            dt: 0.005,
            sim_time_per_second: 5.0,
            thermostat_speed: 0.0,
            thermostat_temperature: 0.01,
            gravity: 0.0,
            friction: 0.0,
            wall_strength: 1.0,
            cutoff_factor: 2.5,
            restitution: 1.0,
            attract_strength: 1.0,
            repel_strength: 1.0,
            drag_strength: 1.0,
            impulse_strength: 1.0,
            discrete_collisions: false,
            hard_spheres_only: false,
            box_width: 25.0,
            box_height: 25.0,
            measurement_window: 100.0,
            measurement_enabled: true,
            velocity_amplification: 1.0,
            remind_on_escape: true,
            pick_distance: 0.25,
            max_initial_speed: 0.1,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Parse a (partial) configuration from JSON and validate it.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.boundary == Boundary::Periodic
    }

    /// Whether sub-steps go through the collision scheduler.
    #[inline]
    pub fn uses_discrete_collisions(&self) -> bool {
        self.discrete_collisions || self.hard_spheres_only
    }

    /// Check ranges; any violation is a configuration error.
    pub fn validate(&self) -> Result<()> {
        positive("dt", self.dt)?;
        positive("sim_time_per_second", self.sim_time_per_second)?;
        positive("box_width", self.box_width)?;
        positive("box_height", self.box_height)?;
        positive("cutoff_factor", self.cutoff_factor)?;
        positive("velocity_amplification", self.velocity_amplification)?;
        non_negative("thermostat_speed", self.thermostat_speed)?;
        non_negative("thermostat_temperature", self.thermostat_temperature)?;
        non_negative("friction", self.friction)?;
        non_negative("measurement_window", self.measurement_window)?;
        non_negative("pick_distance", self.pick_distance)?;
        non_negative("max_initial_speed", self.max_initial_speed)?;
        for (name, value) in [
            ("gravity", self.gravity),
            ("wall_strength", self.wall_strength),
            ("attract_strength", self.attract_strength),
            ("repel_strength", self.repel_strength),
            ("drag_strength", self.drag_strength),
            ("impulse_strength", self.impulse_strength),
        ] {
            if !value.is_finite() {
                return Err(Error::Configuration(format!("{name} must be finite")));
            }
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(Error::Configuration(
                "restitution must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::Configuration(format!(
            "{name} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Configuration(format!(
            "{name} must be finite and >= 0, got {value}"
        )));
    }
    Ok(())
}
