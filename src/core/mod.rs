//! Core simulation data structures and the stepping engine.
//!
//! Bottom-up: geometry and particles, the pair/wall/tool force kernels, the spatial grid,
//! the hard-sphere collision scheduler, measurements, and finally [`Simulation`], which
//! owns all of it and is driven by the host one frame at a time.

pub mod clock;
pub mod event;
pub mod forces;
pub mod geometry;
pub mod grid;
pub mod interaction;
pub mod measure;
pub mod particle;
pub mod scenario;
pub mod scheduler;
pub mod sim;
pub mod tools;
pub mod wall;

pub use clock::FrameClock;
pub use event::{Event, EventKind, EventPool};
pub use geometry::{Rect, Vec2};
pub use grid::SpatialGrid;
pub use interaction::{Interaction, InteractionTable};
pub use measure::{Measurements, Region, RegionSample, RegionSeries};
pub use particle::{Particle, ParticleView};
pub use scenario::{EmptyScenario, Scenario};
pub use scheduler::{CollisionScheduler, CollisionStats};
pub use sim::{FrameInput, Simulation};
pub use tools::{PointerInput, ToolMode, ToolState};
pub use wall::Wall;
