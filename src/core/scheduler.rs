//! Exact-time hard-sphere collision resolution within one sub-step.
//!
//! Every particle moves on a straight line between contacts. Contacts are predicted for
//! all particle pairs and wall/particle pairs, then processed in time order: all particles
//! drift to the earliest contact, the contact is resolved with an impulse along its normal,
//! and only the predictions involving the resolved participants are recomputed.

use crate::core::event::{Event, EventKind, EventPool};
use crate::core::geometry::{
    intersect_origin_circle_line, intersect_origin_line_line, periodicize, perp_ccw, Rect, Vec2,
};
use crate::core::particle::Particle;
use crate::core::wall::Wall;

/// Upper bound on event passes per sub-step before falling back to straight-line motion.
pub const MAX_COLLISION_PASSES: usize = 1000;

/// Slack on predicted times so contacts found slightly in the past still resolve.
pub const COLLISION_TOLERANCE: f64 = 1e-9;

/// Bookkeeping of the last sub-step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionStats {
    pub passes: usize,
    pub resolved: usize,
    pub bailed_out: bool,
}

/// Fixed inputs of one sweep.
#[derive(Debug, Clone, Copy)]
struct Sweep<'a> {
    walls: &'a [Wall],
    bounds: &'a Rect,
    periodic: bool,
    restitution: f64,
}

#[derive(Debug, Default)]
pub struct CollisionScheduler {
    pool: EventPool,
    due: Vec<usize>,
    stats: CollisionStats,
}

impl CollisionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats of the most recent [`advance`](Self::advance).
    pub fn stats(&self) -> CollisionStats {
        self.stats
    }

    /// Move `particles` forward by `dt`, resolving every contact on the way.
    ///
    /// The particle slice is structurally frozen during the sweep; events refer to
    /// particles and walls by index.
    pub fn advance(
        &mut self,
        particles: &mut [Particle],
        walls: &[Wall],
        bounds: &Rect,
        periodic: bool,
        restitution: f64,
        dt: f64,
    ) -> CollisionStats {
        let sweep = Sweep {
            walls,
            bounds,
            periodic,
            restitution,
        };
        self.pool.clear();
        self.stats = CollisionStats::default();
        let mut remaining = dt;

        for i in 0..particles.len() {
            for j in 0..i {
                self.schedule_pair(particles, &sweep, j, i, remaining);
            }
            for w in 0..walls.len() {
                self.schedule_wall(particles, &sweep, w, i, remaining);
            }
        }

        while let Some(next) = self.pool.earliest() {
            self.stats.passes += 1;
            if self.stats.passes > MAX_COLLISION_PASSES {
                log::warn!(
                    "collision scheduling gave up after {} passes; finishing the step without collisions",
                    MAX_COLLISION_PASSES
                );
                self.stats.bailed_out = true;
                self.pool.clear();
                break;
            }

            let t = next.time_f64();
            drift(particles, t);
            self.pool.advance_all(t);
            remaining -= t;

            let mut due = std::mem::take(&mut self.due);
            self.pool.due(0.0, &mut due);
            for &slot in &due {
                // An earlier resolution in this batch may have dropped the event, and its
                // slot may since hold a later prediction.
                let Some(event) = self.pool.get(slot).copied().filter(|e| e.time_f64() <= 0.0) else {
                    continue;
                };
                self.pool.take(slot);
                resolve(particles, &event, sweep.restitution);
                self.stats.resolved += 1;
                self.pool.retain(|e| !e.kind.shares_participant(&event.kind));
                self.reschedule(particles, &sweep, &event.kind, remaining);
            }
            self.due = due;
        }

        if remaining > 0.0 {
            drift(particles, remaining);
        }
        self.stats
    }

    fn push(&mut self, time: f64, kind: EventKind, normal: Vec2) {
        if let Ok(event) = Event::new(time, kind, normal) {
            self.pool.insert(event);
        }
    }

    fn schedule_pair(&mut self, particles: &[Particle], sweep: &Sweep, a: usize, b: usize, remaining: f64) {
        if let Some((t, n)) = predict_pair(&particles[a], &particles[b], sweep.bounds, sweep.periodic, remaining) {
            self.push(t, EventKind::particles(a, b), n);
        }
    }

    fn schedule_wall(&mut self, particles: &[Particle], sweep: &Sweep, w: usize, i: usize, remaining: f64) {
        if let Some((t, n)) = predict_wall(&particles[i], &sweep.walls[w], remaining) {
            self.push(t, EventKind::WallParticle { wall: w, particle: i }, n);
        }
    }

    /// Re-predict everything the participants of `kind` can run into next.
    fn reschedule(&mut self, particles: &[Particle], sweep: &Sweep, kind: &EventKind, remaining: f64) {
        let n = particles.len();
        match *kind {
            EventKind::ParticleParticle { first, second } => {
                for k in (0..n).filter(|&k| k != first && k != second) {
                    self.schedule_pair(particles, sweep, k, first, remaining);
                    self.schedule_pair(particles, sweep, k, second, remaining);
                }
                for w in 0..sweep.walls.len() {
                    self.schedule_wall(particles, sweep, w, first, remaining);
                    self.schedule_wall(particles, sweep, w, second, remaining);
                }
            }
            EventKind::WallParticle { wall, particle } => {
                for k in (0..n).filter(|&k| k != particle) {
                    self.schedule_wall(particles, sweep, wall, k, remaining);
                    self.schedule_pair(particles, sweep, k, particle, remaining);
                }
                for w in 0..sweep.walls.len() {
                    self.schedule_wall(particles, sweep, w, particle, remaining);
                }
            }
        }
    }
}

fn drift(particles: &mut [Particle], t: f64) {
    for p in particles.iter_mut() {
        p.position += p.velocity * t;
    }
}

/// Share of the impulse taken by a body of `mass` colliding with one of `other_mass`.
#[inline]
fn impulse_share(mass: f64, other_mass: f64) -> f64 {
    if mass.is_infinite() {
        0.0
    } else if other_mass.is_infinite() {
        1.0
    } else {
        other_mass / (mass + other_mass)
    }
}

fn resolve(particles: &mut [Particle], event: &Event, restitution: f64) {
    let n = event.normal;
    let scale = 1.0 + restitution;
    match event.kind {
        EventKind::ParticleParticle { first, second } => {
            let (head, tail) = particles.split_at_mut(second);
            let (a, b) = (&mut head[first], &mut tail[0]);
            let delta = n * (a.velocity - b.velocity).dot(&n);
            a.velocity -= delta * (scale * impulse_share(a.mass, b.mass));
            b.velocity += delta * (scale * impulse_share(b.mass, a.mass));
        }
        EventKind::WallParticle { particle, .. } => {
            let p = &mut particles[particle];
            if p.is_pinned() {
                return;
            }
            let delta = n * p.velocity.dot(&n);
            p.velocity -= delta * scale;
        }
    }
}

/// Time until `a` and `b` touch, with the contact normal from `a` to `b`.
pub fn predict_pair(
    a: &Particle,
    b: &Particle,
    bounds: &Rect,
    periodic: bool,
    remaining: f64,
) -> Option<(f64, Vec2)> {
    let mut rel = b.position - a.position;
    if periodic {
        rel = periodicize(&rel, bounds);
    }
    let rel_vel = b.velocity - a.velocity;
    if rel.dot(&rel_vel) >= 0.0 {
        return None;
    }
    let hit = intersect_origin_circle_line(a.radius + b.radius, &rel, &rel_vel)?;
    if hit.t1 < -COLLISION_TOLERANCE || hit.t1 >= remaining {
        return None;
    }
    let t = hit.t1.max(0.0);
    let normal = (rel + rel_vel * t).try_normalize(0.0)?;
    Some((t, normal))
}

/// Time until `p` touches `wall`, either along its face or at one of its endpoints.
pub fn predict_wall(p: &Particle, wall: &Wall, remaining: f64) -> Option<(f64, Vec2)> {
    let wall_vec = wall.vector();
    let mut normal = perp_ccw(&wall_vec.try_normalize(0.0)?);
    let approach = normal.dot(&p.velocity);
    if approach != 0.0 {
        // Face the particle side: the normal opposes the velocity.
        normal *= -approach.signum();
        let offset_start = wall.start - p.position + normal * p.radius;
        if let Some(hit) = intersect_origin_line_line(&p.velocity, &offset_start, &wall_vec) {
            if (0.0..=1.0).contains(&hit.t_line)
                && hit.t_origin >= -COLLISION_TOLERANCE
                && hit.t_origin < remaining
            {
                return Some((hit.t_origin.max(0.0), normal));
            }
        }
    }

    let mut best: Option<(f64, Vec2)> = None;
    for corner in wall.endpoints() {
        let rel = p.position - corner;
        if rel.dot(&p.velocity) >= 0.0 {
            continue;
        }
        let Some(hit) = intersect_origin_circle_line(p.radius, &rel, &p.velocity) else {
            continue;
        };
        if hit.t1 < -COLLISION_TOLERANCE || hit.t1 >= remaining {
            continue;
        }
        let t = hit.t1.max(0.0);
        if best.is_some_and(|(bt, _)| bt <= t) {
            continue;
        }
        if let Some(n) = (rel + p.velocity * t).try_normalize(0.0) {
            best = Some((t, n));
        }
    }
    best
}
