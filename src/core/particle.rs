use crate::core::geometry::Vec2;
use crate::error::{Error, Result};

/// A soft/hard disc in the 2D box.
///
/// Fields:
/// - `id`: stable identifier, assigned when the particle enters a simulation
/// - `position`, `velocity`, `acceleration`
/// - `mass`: `> 0`; `f64::INFINITY` pins the particle in place
/// - `radius`: `> 0`
/// - `kind`: type tag used to look up pair interactions
/// - `color`: opaque tag for the renderer
/// - energy/virial/pressure bookkeeping refreshed every sub-step
#[derive(Debug, Clone)]
pub struct Particle {
    /// Stable particle identifier.
    pub id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub mass: f64,
    pub radius: f64,
    /// Interaction type tag.
    pub kind: usize,
    /// Renderer color tag; never interpreted by the engine.
    pub color: u32,
    pub kinetic_energy: f64,
    pub potential_energy: f64,
    pub virial: f64,
    /// Wall pressure contributed by this particle during the last sub-step.
    pub pressure: f64,
    pub grid_col: usize,
    pub grid_row: usize,
    pub removed: bool,
}

impl Particle {
    /// Create a particle after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `radius` is non-positive, `mass` is non-positive or NaN,
    ///   or any component is NaN/inf.
    pub fn new(position: Vec2, velocity: Vec2, radius: f64, mass: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if mass.is_nan() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be > 0".into()));
        }
        if !position.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !velocity.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        let mut p = Self {
            id: 0,
            position,
            velocity,
            acceleration: Vec2::zeros(),
            mass,
            radius,
            kind: 0,
            color: 0,
            kinetic_energy: 0.0,
            potential_energy: 0.0,
            virial: 0.0,
            pressure: 0.0,
            grid_col: 0,
            grid_row: 0,
            removed: false,
        };
        p.kinetic_energy = p.compute_kinetic_energy();
        Ok(p)
    }

    /// Unit disc at rest at `position`, the default the create tool spawns.
    pub fn at(position: Vec2) -> Result<Self> {
        Self::new(position, Vec2::zeros(), 1.0, 1.0)
    }

    pub fn with_kind(mut self, kind: usize) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.mass.is_infinite()
    }

    /// Returns `1/2 m |v|^2`; pinned particles carry none.
    #[inline]
    pub fn compute_kinetic_energy(&self) -> f64 {
        if self.is_pinned() {
            return 0.0;
        }
        0.5 * self.mass * self.velocity.norm_squared()
    }

    #[inline]
    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy + self.potential_energy
    }

    #[inline]
    pub fn momentum(&self) -> Vec2 {
        if self.is_pinned() {
            return Vec2::zeros();
        }
        self.velocity * self.mass
    }

    /// Position and velocity are both finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|x| x.is_finite())
    }

    /// Set position (validated as finite).
    pub fn set_position(&mut self, position: Vec2) -> Result<()> {
        if !position.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        self.position = position;
        Ok(())
    }

    /// Set velocity (validated as finite).
    pub fn set_velocity(&mut self, velocity: Vec2) -> Result<()> {
        if !velocity.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        self.velocity = velocity;
        self.kinetic_energy = self.compute_kinetic_energy();
        Ok(())
    }
}

/// Read-only view of a particle handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleView {
    pub id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f64,
    pub color: u32,
    pub kinetic_energy: f64,
    pub potential_energy: f64,
}

impl From<&Particle> for ParticleView {
    fn from(p: &Particle) -> Self {
        Self {
            id: p.id,
            position: p.position,
            velocity: p.velocity,
            radius: p.radius,
            color: p.color,
            kinetic_energy: p.kinetic_energy,
            potential_energy: p.potential_energy,
        }
    }
}
