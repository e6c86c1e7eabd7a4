//! Scenario setup: the initialization hook run on every reset, lattice and random
//! placement helpers, and a few ready-made scenarios.

use crate::core::geometry::{Rect, Vec2};
use crate::core::interaction::Interaction;
use crate::core::particle::Particle;
use crate::core::sim::Simulation;
use crate::error::{Error, Result};
use rand::Rng;
use std::f64::consts::TAU;

/// Color tags used by the bundled scenarios.
pub const BLACK: u32 = 0x000000;
pub const RED: u32 = 0xd62728;

/// Populates a freshly reset simulation: particles, walls, interactions, regions and
/// per-scenario configuration tweaks.
pub trait Scenario {
    fn initialize(&self, sim: &mut Simulation) -> Result<()>;
}

impl<F> Scenario for F
where
    F: Fn(&mut Simulation) -> Result<()>,
{
    fn initialize(&self, sim: &mut Simulation) -> Result<()> {
        self(sim)
    }
}

/// Leaves the box empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScenario;

impl Scenario for EmptyScenario {
    fn initialize(&self, _sim: &mut Simulation) -> Result<()> {
        Ok(())
    }
}

// ============ Placement helpers ============

/// `index`-th site of a triangular lattice filling a wedge from the origin, row by row.
pub fn triangular_lattice_position(index: usize, spacing: f64) -> Vec2 {
    let row = ((((8 * index + 1) as f64).sqrt() - 1.0) / 2.0).floor() as usize;
    let rest = index - row * (row + 1) / 2;
    let (ix, iy) = (rest as f64, (row - rest) as f64);
    let rotation = -TAU / 12.0;
    polar(spacing * ix, rotation) + polar(spacing * iy, rotation + TAU / 6.0)
}

/// `index`-th site of a square lattice, spiralling out from the origin.
pub fn rectangular_lattice_position(index: usize, spacing: f64) -> Vec2 {
    if index == 0 {
        return Vec2::zeros();
    }
    let layer = (((index as f64).sqrt() + 1.0) / 2.0).floor() as usize;
    let rest = index - (2 * layer - 1) * (2 * layer - 1);
    let quadrant = rest / (2 * layer);
    let ix = layer as f64;
    let iy = (rest % (2 * layer)) as f64 - layer as f64 + 1.0;
    let rotation = quadrant as f64 * TAU / 4.0;
    polar(spacing * ix, rotation) + polar(spacing * iy, rotation + TAU / 4.0)
}

/// `index`-th site of a hexagonal cluster, filled shell by shell around the origin.
pub fn hexagonal_lattice_position(index: usize, spacing: f64) -> Vec2 {
    if index == 0 {
        return Vec2::zeros();
    }
    let k = index - 1;
    let shell = (((8.0 * (k as f64 / 6.0) + 1.0).sqrt() - 1.0) / 2.0).floor() as usize + 1;
    let rest = k - 3 * shell * (shell - 1);
    let sector = rest / shell;
    let ix = shell as f64;
    let iy = (rest % shell) as f64;
    let rotation = sector as f64 * TAU / 6.0;
    polar(spacing * ix, rotation) + polar(spacing * iy, rotation + 2.0 * TAU / 6.0)
}

#[inline]
fn polar(length: f64, angle: f64) -> Vec2 {
    Vec2::new(length * angle.cos(), length * angle.sin())
}

pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    polar(1.0, rng.random_range(0.0..TAU))
}

/// Uniform random direction with a speed drawn uniformly from `[0, max_speed]`.
pub fn random_velocity<R: Rng + ?Sized>(rng: &mut R, max_speed: f64) -> Vec2 {
    let speed = if max_speed > 0.0 {
        rng.random_range(0.0..=max_speed)
    } else {
        0.0
    };
    random_unit_vector(rng) * speed
}

/// Grow a loose random cluster: each new particle is dropped near a random already-placed
/// one. Candidates that repeatedly fail are retired; stops early when none remain.
/// Returns how many particles were added.
pub fn add_particles_randomly(sim: &mut Simulation, new_particles: Vec<Particle>) -> usize {
    const MAX_TRIES: usize = 10;
    let mut candidates: Vec<(Vec2, f64)> = sim.particles().iter().map(|p| (p.position, p.radius)).collect();
    let mut added = 0;
    let mut pending = new_particles.into_iter();

    if candidates.is_empty() {
        let Some(mut first) = pending.next() else {
            return 0;
        };
        let inner = sim.bounds().inset(first.radius);
        first.position = inner.random_point(sim.rng_mut());
        let (pos, radius) = (first.position, first.radius);
        if sim.add_particle(first) {
            candidates.push((pos, radius));
            added += 1;
        }
    }

    for mut particle in pending {
        let mut placed = false;
        while !placed {
            if candidates.is_empty() {
                return added;
            }
            let pick = sim.rng_mut().random_range(0..candidates.len());
            let (anchor, anchor_radius) = candidates[pick];
            let min_r = anchor_radius + particle.radius;
            for _ in 0..MAX_TRIES {
                let rng = sim.rng_mut();
                let r = rng.random_range(min_r..2.0 * min_r);
                particle.position = anchor + random_unit_vector(rng) * r;
                if !sim.is_colliding(&particle) {
                    placed = true;
                    break;
                }
            }
            if !placed {
                candidates.swap_remove(pick);
            }
        }
        let (pos, radius) = (particle.position, particle.radius);
        if sim.add_particle(particle) {
            candidates.push((pos, radius));
            added += 1;
        }
    }
    added
}

// ============ Scenarios ============

/// Ideal-gas start: `count` identical discs at random non-overlapping positions with
/// random velocities up to `max_initial_speed`.
#[derive(Debug, Clone, Copy)]
pub struct RandomGas {
    pub count: usize,
    pub radius: f64,
    pub mass: f64,
}

impl RandomGas {
    const MAX_ATTEMPTS: usize = 100_000;
}

impl Scenario for RandomGas {
    fn initialize(&self, sim: &mut Simulation) -> Result<()> {
        let area = sim.bounds().inset(self.radius);
        let max_speed = sim.config().max_initial_speed;
        for index in 0..self.count {
            let mut attempts = 0usize;
            loop {
                if attempts >= Self::MAX_ATTEMPTS {
                    return Err(Error::InvalidParam(format!(
                        "failed to place particle {index} without overlap; try fewer particles or smaller radius"
                    )));
                }
                attempts += 1;
                let rng = sim.rng_mut();
                let position = area.random_point(rng);
                let velocity = random_velocity(rng, max_speed);
                if sim.add_particle(Particle::new(position, velocity, self.radius, self.mass)?) {
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Two-colored gas confined to the left half, with the box split into measured halves so
/// the entropy series tracks the spreading.
#[derive(Debug, Clone, Copy)]
pub struct ExpandingGas {
    pub count: usize,
}

impl Scenario for ExpandingGas {
    fn initialize(&self, sim: &mut Simulation) -> Result<()> {
        let bounds = *sim.bounds();
        let (left, right) = bounds.split_halves();
        sim.add_measurement_region(left)?;
        sim.add_measurement_region(right)?;

        let spawn = left.inset(1.0);
        let max_speed = sim.config().max_initial_speed;
        let mut placed = 0usize;
        let mut attempts = 0usize;
        while placed < self.count && attempts < self.count * 1000 {
            attempts += 1;
            let rng = sim.rng_mut();
            let position = spawn.random_point(rng);
            let velocity = random_velocity(rng, max_speed);
            let color = if placed % 2 == 0 { BLACK } else { RED };
            let particle = Particle::new(position, velocity, 1.0, 1.0)?.with_color(color);
            if sim.add_particle(particle) {
                placed += 1;
            }
        }
        if placed < self.count {
            log::warn!("placed {placed} of {} particles in the left half", self.count);
        }
        Ok(())
    }
}

/// Hexagonal crystallite bound by a Lennard-Jones well.
#[derive(Debug, Clone, Copy)]
pub struct Crystal {
    pub count: usize,
    pub strength: f64,
}

impl Scenario for Crystal {
    fn initialize(&self, sim: &mut Simulation) -> Result<()> {
        let separation = 2.0;
        sim.set_interaction(
            0,
            0,
            Interaction::LennardJones {
                strength: self.strength,
                separation,
            },
        )?;
        let center = sim.bounds().center();
        for index in 0..self.count {
            let position = center + hexagonal_lattice_position(index, separation);
            if !sim.add_particle(Particle::at(position)?) {
                log::debug!("lattice site {index} does not fit in the box");
            }
        }
        Ok(())
    }
}

/// Billiards break: a cue ball aimed at a triangular rack. Switches the simulation to
/// pure hard-sphere dynamics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Billiards {
    /// Rack rows; `None` fits as many as the box allows.
    pub layers: Option<usize>,
    pub cue_speed: f64,
}

impl Billiards {
    const MARGIN: f64 = 0.1;
    const SPACING: f64 = 2.03;

    fn fitting_layers(bounds: &Rect) -> usize {
        let available = 1.0 - 2.0 * Self::MARGIN;
        let height = available * bounds.height() / Self::SPACING;
        let width = available * bounds.width() / 2.0 / (3.0_f64.sqrt() / 2.0 * Self::SPACING);
        height.min(width).floor().max(0.0) as usize
    }
}

impl Scenario for Billiards {
    fn initialize(&self, sim: &mut Simulation) -> Result<()> {
        sim.config_mut().hard_spheres_only = true;
        let bounds = *sim.bounds();
        let center = bounds.center();

        let cue = Particle::new(
            Vec2::new(bounds.left + bounds.width() / 4.0, center.y),
            Vec2::new(self.cue_speed, 0.0),
            1.0,
            1.0,
        )?
        .with_color(RED);
        if !sim.add_particle(cue) {
            return Err(Error::Configuration("cue ball does not fit in the box".into()));
        }

        let layers = self.layers.unwrap_or_else(|| Self::fitting_layers(&bounds));
        let offset = Vec2::new(center.x + Self::MARGIN * bounds.width() / 2.0, center.y);
        for index in 0..layers * (layers + 1) / 2 {
            let position = offset + triangular_lattice_position(index, Self::SPACING);
            sim.add_particle(Particle::at(position)?.with_color(BLACK));
        }
        Ok(())
    }
}
