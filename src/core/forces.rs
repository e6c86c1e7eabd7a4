//! Soft-force model: gravity, pair potentials, wall shells, friction and the Langevin
//! thermostat.
//!
//! All functions accumulate into the per-particle `acceleration`, `potential_energy`,
//! `virial` and `pressure` fields, which [`reset_accumulators`] clears once per sub-step.

use crate::core::geometry::{intersect_origin_line_line, periodicize, shortest_vector_from_segment, Rect, Vec2};
use crate::core::interaction::InteractionTable;
use crate::core::particle::Particle;
use crate::core::wall::Wall;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Reset accumulators to the gravity-only state. Pinned particles feel no acceleration.
pub fn reset_accumulators(particles: &mut [Particle], gravity: &Vec2) {
    for p in particles.iter_mut() {
        p.acceleration = if p.is_pinned() { Vec2::zeros() } else { *gravity };
        p.potential_energy = -p.position.dot(gravity);
        p.virial = 0.0;
        p.pressure = 0.0;
    }
}

pub fn reset_wall_forces(walls: &mut [Wall]) {
    for w in walls.iter_mut() {
        w.force = Vec2::zeros();
    }
}

/// Whether the segment `from -> from + rel` strictly crosses any wall.
pub fn crosses_wall(from: &Vec2, rel: &Vec2, walls: &[Wall]) -> bool {
    walls.iter().any(|w| {
        intersect_origin_line_line(&w.vector(), &(from - w.start), rel)
            .map(|hit| hit.t_origin > 0.0 && hit.t_origin < 1.0 && hit.t_line > 0.0 && hit.t_line < 1.0)
            .unwrap_or(false)
    })
}

/// Accumulate pair-potential forces over the candidate pairs produced by the grid.
///
/// Pairs separated by a wall do not interact. Each participant receives half of the
/// pair energy and half of the pair virial.
pub fn pair_forces(
    particles: &mut [Particle],
    pairs: &[(usize, usize)],
    walls: &[Wall],
    table: &InteractionTable,
    bounds: &Rect,
    cutoff_factor: f64,
    periodic: bool,
) {
    for &(i, j) in pairs {
        debug_assert!(i < j);
        let (head, tail) = particles.split_at_mut(j);
        let (a, b) = (&mut head[i], &mut tail[0]);

        let mut rel = b.position - a.position;
        if periodic {
            rel = periodicize(&rel, bounds);
        }
        let r_sq = rel.norm_squared();
        if r_sq == 0.0 {
            continue;
        }
        let Some(terms) = table.get(a.kind, b.kind).evaluate(r_sq, cutoff_factor) else {
            continue;
        };
        if !walls.is_empty() && crosses_wall(&a.position, &rel, walls) {
            continue;
        }

        let factor = -terms.virial / r_sq;
        let force = rel * factor;
        a.acceleration += force / a.mass;
        b.acceleration -= force / b.mass;
        a.potential_energy += 0.5 * terms.energy;
        b.potential_energy += 0.5 * terms.energy;
        a.virial += 0.5 * terms.virial;
        b.virial += 0.5 * terms.virial;
    }
}

/// Repulsive shell of thickness one particle radius around every wall.
///
/// The reaction force is accumulated on the wall; the pressure share per unit wall
/// length is accumulated on the particle.
pub fn wall_forces(particles: &mut [Particle], walls: &mut [Wall], strength: f64) {
    for wall in walls.iter_mut() {
        let length = wall.length();
        for p in particles.iter_mut() {
            let d = shortest_vector_from_segment(&p.position, &wall.start, &wall.end);
            let d_sq = d.norm_squared();
            let r_sq = p.radius * p.radius;
            if d_sq >= r_sq || d_sq == 0.0 {
                continue;
            }
            let a2 = r_sq / d_sq;
            let a6 = a2 * a2 * a2;
            p.potential_energy += strength * (a6 - 2.0) * a6 + strength;
            let virial = 12.0 * strength * (a6 - 1.0) * a6;
            p.virial += virial;

            let force = d * (-virial / d_sq);
            wall.force += force;
            p.acceleration -= force / p.mass;
            p.pressure += force.norm() / length;
        }
    }
}

/// Velocity-proportional drag, `a -= friction * v / m`.
pub fn apply_friction(particles: &mut [Particle], friction: f64) {
    if friction == 0.0 {
        return;
    }
    for p in particles.iter_mut() {
        p.acceleration -= p.velocity * (friction / p.mass);
    }
}

/// Scale velocities by `amplification^dt`; a factor of 1 is a no-op.
pub fn amplify_velocities(particles: &mut [Particle], amplification: f64, dt: f64) {
    if amplification == 1.0 {
        return;
    }
    let scale = amplification.powf(dt);
    for p in particles.iter_mut() {
        p.velocity *= scale;
    }
}

/// Langevin thermostat applied as a half-step velocity update at both ends of a sub-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Langevin {
    pub viscosity: f64,
    pub temperature: f64,
}

impl Langevin {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.viscosity > 0.0
    }

    pub fn apply<R: Rng + ?Sized>(&self, particles: &mut [Particle], dt: f64, rng: &mut R) {
        if !self.is_active() {
            return;
        }
        let f = (-self.viscosity * dt * 0.5).exp();
        let noise = (1.0 - f * f).sqrt();
        for p in particles.iter_mut().filter(|p| !p.is_pinned()) {
            let sigma = noise * (self.temperature / p.mass).sqrt();
            let kx: f64 = StandardNormal.sample(rng);
            let ky: f64 = StandardNormal.sample(rng);
            let kick = Vec2::new(kx, ky);
            p.velocity = p.velocity * f + kick * sigma;
        }
    }
}
