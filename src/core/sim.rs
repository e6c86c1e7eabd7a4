use crate::config::SimConfig;
use crate::core::clock::FrameClock;
use crate::core::forces::{self, Langevin};
use crate::core::geometry::{periodicize, shortest_vector_from_segment, wrap_position, Rect, Vec2};
use crate::core::grid::SpatialGrid;
use crate::core::interaction::{Interaction, InteractionTable};
use crate::core::measure::{Measurements, Region};
use crate::core::particle::{Particle, ParticleView};
use crate::core::scenario::Scenario;
use crate::core::scheduler::{CollisionScheduler, CollisionStats};
use crate::core::tools::{self, PointerInput, ToolMode, ToolState};
use crate::core::wall::{border_walls, Wall};
use crate::error::{Error, Result};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::fmt;

/// Small numeric tolerance for time checks.
const EPS_TIME: f64 = 1e-12;

/// Overlap slack when deciding whether a new particle collides with an existing one.
const OVERLAP_EPSILON: f64 = 1e-5;

/// Iteration cap for pushing a particle out of walls.
const MAX_UNCOLLIDE_ITERATIONS: usize = 64;

/// Host input for one rendered frame.
pub struct FrameInput<'a> {
    /// Frame timestamp in milliseconds.
    pub timestamp_ms: f64,
    pub tool: ToolMode,
    pub pointer: PointerInput,
    /// Builds the particle the create tool spawns; its position is set to the pointer.
    pub factory: Option<&'a mut dyn FnMut() -> Particle>,
}

impl FrameInput<'_> {
    /// A frame with no pointer activity.
    pub fn idle(timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            tool: ToolMode::None,
            pointer: PointerInput::default(),
            factory: None,
        }
    }
}

/// 2D particle simulation: soft pair potentials integrated with velocity Verlet, or exact
/// hard-sphere collisions, inside a periodic or walled box.
///
/// The simulation owns every piece of state. The scenario passed at construction is
/// re-run on every [`reset`](Self::reset) to repopulate the box.
pub struct Simulation {
    base_config: SimConfig,
    config: SimConfig,
    time_now: f64,
    bounds: Rect,
    particles: Vec<Particle>,
    walls: Vec<Wall>,
    interactions: InteractionTable,
    grid: SpatialGrid,
    scheduler: CollisionScheduler,
    measurements: Measurements,
    clock: FrameClock,
    tools: ToolState,
    rng: StdRng,
    next_id: u32,
    paused: bool,
    reset_recommended: bool,
    scenario: Option<Box<dyn Scenario>>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("time", &self.time_now)
            .field("bounds", &self.bounds)
            .field("particles", &self.particles.len())
            .field("walls", &self.walls.len())
            .field("paused", &self.paused)
            .field("reset_recommended", &self.reset_recommended)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Create a simulation from a validated configuration and populate it with `scenario`.
    pub fn new<S: Scenario + 'static>(config: SimConfig, scenario: S) -> Result<Self> {
        config.validate()?;
        let bounds = Rect::from_center_size(Vec2::zeros(), config.box_width, config.box_height);
        let (min_sep, max_sep) = InteractionTable::new().separation_bounds();
        let mut sim = Self {
            grid: SpatialGrid::new(&bounds, min_sep, max_sep, config.cutoff_factor),
            measurements: Measurements::new(bounds),
            rng: seeded_rng(config.seed),
            base_config: config.clone(),
            config,
            time_now: 0.0,
            bounds,
            particles: Vec::new(),
            walls: Vec::new(),
            interactions: InteractionTable::new(),
            scheduler: CollisionScheduler::new(),
            clock: FrameClock::new(),
            tools: ToolState::default(),
            next_id: 0,
            paused: false,
            reset_recommended: false,
            scenario: Some(Box::new(scenario)),
        };
        sim.reset()?;
        Ok(sim)
    }

    /// Rebuild the simulation from the base configuration and the scenario.
    pub fn reset(&mut self) -> Result<()> {
        self.config = self.base_config.clone();
        self.rng = seeded_rng(self.config.seed);
        self.time_now = 0.0;
        self.particles.clear();
        self.walls.clear();
        self.next_id = 0;
        self.interactions.clear();
        self.interactions.set(0, 0, Interaction::default())?;
        self.bounds = Rect::from_center_size(Vec2::zeros(), self.config.box_width, self.config.box_height);
        self.measurements.reset(self.bounds);
        self.resize_grid();

        if let Some(scenario) = self.scenario.take() {
            let outcome = scenario.initialize(self);
            self.scenario = Some(scenario);
            outcome?;
        }
        self.config.validate()?;
        self.resize_grid();

        if self.config.hard_spheres_only {
            self.config.dt = self.config.sim_time_per_second / 60.0;
            self.config.discrete_collisions = true;
        }
        if !self.config.is_periodic() && self.walls.is_empty() {
            self.walls = border_walls(&self.bounds);
        }
        self.measurements.set_whole_box(self.bounds);
        self.measurements.clear_series();

        self.compute_forces();
        for p in &mut self.particles {
            p.kinetic_energy = p.compute_kinetic_energy();
        }
        self.reset_recommended = false;
        self.tools.reset();
        self.clock.reset();
        log::debug!(
            "simulation reset: {} particles, {} walls, {:?} boundary",
            self.particles.len(),
            self.walls.len(),
            self.config.boundary
        );
        Ok(())
    }

    // ============ Accessors ============

    /// Returns current simulation time.
    pub fn time(&self) -> f64 {
        self.time_now
    }

    /// Number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable particle access for hosts that edit state directly.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn particle(&self, id: u32) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id == id)
    }

    /// Renderer view of every particle.
    pub fn snapshot(&self) -> Vec<ParticleView> {
        self.particles.iter().map(ParticleView::from).collect()
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Live configuration; changes last until the next reset. Edits are validated
    /// before the next sub-step runs; an invalid configuration stops stepping.
    pub fn config_mut(&mut self) -> &mut SimConfig {
        &mut self.config
    }

    pub fn interactions(&self) -> &InteractionTable {
        &self.interactions
    }

    pub fn regions(&self) -> &[Region] {
        self.measurements.regions()
    }

    pub fn measurements(&self) -> &Measurements {
        &self.measurements
    }

    pub fn tool_state(&self) -> &ToolState {
        &self.tools
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Particles were lost since the last reset.
    pub fn reset_recommended(&self) -> bool {
        self.reset_recommended
    }

    /// Collision bookkeeping of the last discrete sub-step.
    pub fn collision_stats(&self) -> CollisionStats {
        self.scheduler.stats()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
        self.clock.mark_resumed();
    }

    // ============ Setup ============

    /// Replace the walls.
    pub fn set_walls(&mut self, walls: Vec<Wall>) {
        self.walls = walls;
    }

    pub fn add_wall(&mut self, wall: Wall) {
        self.walls.push(wall);
    }

    /// Install the interaction between particle kinds `a` and `b` and resize the grid.
    pub fn set_interaction(&mut self, a: usize, b: usize, interaction: Interaction) -> Result<()> {
        self.interactions.set(a, b, interaction)?;
        self.resize_grid();
        Ok(())
    }

    /// Resize the box around the origin. Walls are left untouched.
    pub fn set_box_size(&mut self, width: f64, height: f64) -> Result<()> {
        if !width.is_finite() || width <= 0.0 || !height.is_finite() || height <= 0.0 {
            return Err(Error::InvalidParam("box dimensions must be finite and > 0".into()));
        }
        self.config.box_width = width;
        self.config.box_height = height;
        self.bounds = Rect::from_center_size(Vec2::zeros(), width, height);
        self.measurements.set_whole_box(self.bounds);
        self.resize_grid();
        Ok(())
    }

    /// Add a region to measure; regions after the whole box partition it for entropy.
    pub fn add_measurement_region(&mut self, bounds: Rect) -> Result<usize> {
        let area = bounds.area();
        if area.is_nan() || area <= 0.0 {
            return Err(Error::InvalidParam("measurement region must have positive area".into()));
        }
        Ok(self.measurements.add_region(bounds))
    }

    fn resize_grid(&mut self) {
        let (min_sep, max_sep) = self.interactions.separation_bounds();
        self.grid = SpatialGrid::new(&self.bounds, min_sep, max_sep, self.config.cutoff_factor);
    }

    // ============ Particles ============

    /// Insert `particle` unless it lies outside a walled box, would exceed the particle
    /// cap, or overlaps a particle or wall. Returns whether it was inserted.
    pub fn add_particle(&mut self, mut particle: Particle) -> bool {
        if !self.config.is_periodic() && !self.bounds.contains_point(&particle.position) {
            return false;
        }
        let max = self.config.max_particle_count;
        if max != 0 && self.particles.len() >= max {
            return false;
        }
        if self.is_colliding(&particle) {
            return false;
        }
        particle.id = self.next_id;
        self.next_id += 1;
        particle.removed = false;
        particle.kinetic_energy = particle.compute_kinetic_energy();
        self.particles.push(particle);
        true
    }

    /// Whether `particle` overlaps any particle or wall of the simulation.
    pub fn is_colliding(&self, particle: &Particle) -> bool {
        let overlaps_particle = self.particles.iter().any(|other| {
            let rel = self.separation(&particle.position, &other.position);
            let limit = particle.radius + other.radius - OVERLAP_EPSILON;
            rel.norm_squared() < limit * limit
        });
        overlaps_particle
            || self.walls.iter().any(|w| {
                shortest_vector_from_segment(&particle.position, &w.start, &w.end).norm_squared()
                    < particle.radius * particle.radius
            })
    }

    /// Remove the particle with `id`; returns it if it existed.
    pub fn remove_particle(&mut self, id: u32) -> Option<Particle> {
        let index = self.particles.iter().position(|p| p.id == id)?;
        let mut particle = self.particles.remove(index);
        particle.removed = true;
        self.tools.selection.retain(|&s| s != id);
        if self.tools.active == Some(id) {
            self.tools.release();
        }
        Some(particle)
    }

    /// Particle whose rim is closest to `point`.
    pub fn find_closest_particle(&self, point: &Vec2) -> Option<&Particle> {
        self.particles
            .iter()
            .map(|p| (p, (p.position - point).norm() - p.radius))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
    }

    /// Push particle `id` out of every wall it overlaps. Returns false if it is unknown or
    /// still overlapping after the iteration cap.
    pub fn move_out_of_collision(&mut self, id: u32) -> bool {
        let Some(index) = self.particles.iter().position(|p| p.id == id) else {
            return false;
        };
        let p = &mut self.particles[index];
        for _ in 0..MAX_UNCOLLIDE_ITERATIONS {
            let overlap = self.walls.iter().find_map(|w| {
                let d = shortest_vector_from_segment(&p.position, &w.start, &w.end);
                let dist = d.norm();
                (dist < p.radius && dist > 0.0).then(|| d * ((p.radius - dist) / dist))
            });
            match overlap {
                Some(push) => p.position += push,
                None => return true,
            }
        }
        log::warn!("particle {id} is still overlapping a wall after {MAX_UNCOLLIDE_ITERATIONS} pushes");
        false
    }

    // ============ Diagnostics ============

    /// Compute total kinetic energy (diagnostic).
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy).sum()
    }

    pub fn total_energy(&self) -> f64 {
        self.particles.iter().map(Particle::total_energy).sum()
    }

    pub fn total_momentum(&self) -> Vec2 {
        self.particles.iter().map(Particle::momentum).sum()
    }

    /// Sum of wall pressures.
    pub fn total_pressure(&self) -> f64 {
        self.walls.iter().map(Wall::pressure).sum()
    }

    // ============ Time stepping ============

    /// Run one rendered frame: apply pointer input, then as many sub-steps as the
    /// elapsed wall-clock time pays for, then record measurements. Returns the number of
    /// sub-steps run.
    pub fn update(&mut self, frame: FrameInput<'_>) -> usize {
        self.handle_pointer(frame.tool, &frame.pointer, frame.factory);
        if self.paused || !self.live_config_is_valid() {
            return 0;
        }
        let steps = self
            .clock
            .advance(frame.timestamp_ms, self.config.dt, self.config.sim_time_per_second);
        for _ in 0..steps {
            self.step();
        }
        if self.config.measurement_enabled {
            self.record_measurements();
        }
        steps
    }

    /// Advance the simulation to `target_time` (must be ≥ current time) in whole
    /// sub-steps, then record one measurement sample.
    pub fn advance_to(&mut self, target_time: f64) -> Result<()> {
        if !target_time.is_finite() {
            return Err(Error::InvalidParam("target_time must be finite".into()));
        }
        if target_time < self.time_now - EPS_TIME {
            return Err(Error::InvalidParam(
                "target_time cannot be earlier than current time".into(),
            ));
        }
        self.config.validate()?;
        let dt = self.config.dt;
        while self.time_now + 0.5 * dt < target_time {
            self.step();
        }
        if self.config.measurement_enabled {
            self.record_measurements();
        }
        Ok(())
    }

    /// Sample every region at the current time.
    pub fn record_measurements(&mut self) {
        self.measurements
            .record(self.time_now, &self.particles, self.config.measurement_window);
    }

    /// One fixed sub-step of length `dt`.
    pub fn step(&mut self) {
        if !self.live_config_is_valid() {
            return;
        }
        let dt = self.config.dt;
        let thermostat = self.thermostat();

        thermostat.apply(&mut self.particles, dt, &mut self.rng);
        forces::amplify_velocities(&mut self.particles, self.config.velocity_amplification, dt);
        half_kick(&mut self.particles, dt);

        if self.config.uses_discrete_collisions() {
            let stats = self.scheduler.advance(
                &mut self.particles,
                &self.walls,
                &self.bounds,
                self.config.is_periodic(),
                self.config.restitution,
                dt,
            );
            if stats.bailed_out {
                log::debug!("collision sweep at t = {:.4} fell back to free flight", self.time_now);
            }
        } else {
            for p in &mut self.particles {
                p.position += p.velocity * dt;
            }
        }
        self.time_now += dt;

        self.remove_lost_particles();
        self.compute_forces();
        half_kick(&mut self.particles, dt);
        for p in &mut self.particles {
            p.kinetic_energy = p.compute_kinetic_energy();
        }
        if self.config.is_periodic() {
            for p in &mut self.particles {
                p.position = wrap_position(&p.position, &self.bounds);
            }
        }
        thermostat.apply(&mut self.particles, dt, &mut self.rng);
    }

    fn live_config_is_valid(&self) -> bool {
        match self.config.validate() {
            Ok(()) => true,
            Err(e) => {
                log::error!("not stepping: {e}");
                false
            }
        }
    }

    fn thermostat(&self) -> Langevin {
        Langevin {
            viscosity: self.config.thermostat_speed,
            temperature: self.config.thermostat_temperature,
        }
    }

    /// Refresh accelerations, energies and wall forces for the current positions.
    fn compute_forces(&mut self) {
        let gravity = Vec2::new(0.0, -self.config.gravity);
        forces::reset_accumulators(&mut self.particles, &gravity);
        if !self.config.uses_discrete_collisions() {
            if self.grid.cutoff_factor() != self.config.cutoff_factor {
                self.resize_grid();
            }
            forces::reset_wall_forces(&mut self.walls);
            self.grid.rebuild(&self.bounds, &mut self.particles);
            let pairs = self.grid.candidate_pairs(&self.particles);
            forces::pair_forces(
                &mut self.particles,
                pairs,
                &self.walls,
                &self.interactions,
                &self.bounds,
                self.config.cutoff_factor,
                self.config.is_periodic(),
            );
            forces::wall_forces(&mut self.particles, &mut self.walls, self.config.wall_strength);
        }
        forces::apply_friction(&mut self.particles, self.config.friction);
        tools::apply_tool_forces(&mut self.particles, &self.tools, &self.config, self.bounds.width());
    }

    /// Drop particles that diverged or left a walled box.
    fn remove_lost_particles(&mut self) {
        let walled = !self.config.is_periodic();
        let mut lost = 0usize;
        for p in &mut self.particles {
            if !p.is_finite() {
                log::warn!("particle {} diverged at t = {:.4}; removing it", p.id, self.time_now);
                p.removed = true;
            } else if walled && !self.bounds.contains_point(&p.position) {
                log::warn!(
                    "particle {} escaped the box at ({:.3}, {:.3}); removing it",
                    p.id,
                    p.position.x,
                    p.position.y
                );
                p.removed = true;
            }
            lost += usize::from(p.removed);
        }
        if lost == 0 {
            return;
        }
        self.particles.retain(|p| !p.removed);
        let particles = &self.particles;
        self.tools.selection.retain(|&id| particles.iter().any(|p| p.id == id));
        if self.config.remind_on_escape {
            self.reset_recommended = true;
        }
    }

    // ============ Pointer tools ============

    fn handle_pointer(
        &mut self,
        tool: ToolMode,
        pointer: &PointerInput,
        factory: Option<&mut dyn FnMut() -> Particle>,
    ) {
        self.tools.pointer = pointer.position;

        if pointer.transitions > 0 {
            if self.tools.mode == ToolMode::Impulse {
                if let Some(id) = self.tools.active {
                    let strength = self.config.impulse_strength;
                    if let Some(p) = self.particles.iter_mut().find(|p| p.id == id) {
                        tools::apply_impulse(p, &pointer.position, strength);
                    }
                }
            }
            self.tools.release();
        }

        if !pointer.is_down {
            return;
        }

        let pick_distance = self.config.pick_distance;
        let closest = self
            .find_closest_particle(&pointer.position)
            .filter(|p| (p.position - pointer.position).norm() - p.radius <= pick_distance)
            .map(|p| p.id);

        if self.tools.mode == ToolMode::None {
            match tool {
                tool if tool.needs_particle() => {
                    if let Some(id) = closest {
                        self.tools.mode = tool;
                        self.tools.active = Some(id);
                    }
                }
                ToolMode::Select => {
                    self.tools.mode = tool;
                    self.tools.anchor = Some(pointer.position);
                    self.tools.selection.clear();
                }
                _ => self.tools.mode = tool,
            }
        }

        match self.tools.mode {
            ToolMode::Create => {
                if let Some(factory) = factory {
                    let mut particle = factory();
                    particle.position = pointer.position;
                    if self.add_particle(particle) {
                        log::trace!("created particle at ({:.3}, {:.3})", pointer.position.x, pointer.position.y);
                    }
                }
            }
            ToolMode::Delete => {
                if let Some(id) = closest {
                    self.remove_particle(id);
                }
            }
            ToolMode::Select => {
                if let Some(rect) = self.tools.selection_rect() {
                    self.tools.selection = self
                        .particles
                        .iter()
                        .filter(|p| rect.contains_point(&p.position))
                        .map(|p| p.id)
                        .collect();
                }
            }
            _ => {}
        }
    }

    /// Separation vector `to - from`, wrapped in periodic boxes.
    fn separation(&self, from: &Vec2, to: &Vec2) -> Vec2 {
        let rel = to - from;
        if self.config.is_periodic() {
            periodicize(&rel, &self.bounds)
        } else {
            rel
        }
    }
}

fn half_kick(particles: &mut [Particle], dt: f64) {
    for p in particles.iter_mut() {
        p.velocity += p.acceleration * (0.5 * dt);
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => SeedableRng::seed_from_u64(s),
        None => SeedableRng::seed_from_u64(rng().random()),
    }
}
