//! partsim: a 2D particle engine for interactive physics teaching.
//!
//! The engine advances discs in a periodic or walled box, either with soft pair
//! potentials under velocity Verlet or with exact hard-sphere collisions, and samples
//! thermodynamic observables over rectangular regions. Rendering and widgets live in the
//! host; the host drives the engine one frame at a time through
//! [`Simulation::update`](crate::core::Simulation::update).

pub mod config;
pub mod core;
pub mod error;

#[cfg(feature = "python")]
mod python;

pub use crate::config::{Boundary, SimConfig};
pub use crate::core::Simulation;
pub use crate::error::{Error, Result};
