//! Pointer-driven user tools.
//!
//! The host reports the selected [`ToolMode`] and a [`PointerInput`] every frame; the
//! simulation keeps a [`ToolState`] describing what the pointer is currently doing and
//! applies the matching forces during each sub-step.

use crate::config::SimConfig;
use crate::core::geometry::{Rect, Vec2};
use crate::core::particle::Particle;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// User tool selected in the host toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    None,
    Move,
    Select,
    Repel,
    Attract,
    Create,
    Delete,
    Impulse,
}

impl ToolMode {
    pub const ALL: [ToolMode; 8] = [
        ToolMode::None,
        ToolMode::Move,
        ToolMode::Select,
        ToolMode::Repel,
        ToolMode::Attract,
        ToolMode::Create,
        ToolMode::Delete,
        ToolMode::Impulse,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolMode::None => "none",
            ToolMode::Move => "move",
            ToolMode::Select => "select",
            ToolMode::Repel => "repel",
            ToolMode::Attract => "attract",
            ToolMode::Create => "create",
            ToolMode::Delete => "delete",
            ToolMode::Impulse => "impulse",
        }
    }

    /// Tools that only engage when the press lands on a particle.
    #[inline]
    pub fn needs_particle(&self) -> bool {
        matches!(self, ToolMode::Move | ToolMode::Impulse)
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ToolMode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| Error::Configuration(format!("unknown tool '{s}'")))
    }
}

/// Pointer state for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    /// Pointer position in world coordinates.
    pub position: Vec2,
    pub is_down: bool,
    /// Number of press/release transitions since the previous frame.
    pub transitions: u32,
}

impl Default for PointerInput {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            is_down: false,
            transitions: 0,
        }
    }
}

/// What the pointer is doing to the simulation right now.
///
/// Particles are referenced by id so the state survives removals between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolState {
    pub mode: ToolMode,
    /// Particle grabbed by the current press (move, impulse).
    pub active: Option<u32>,
    pub selection: Vec<u32>,
    /// Corner where the current selection drag started.
    pub anchor: Option<Vec2>,
    pub pointer: Vec2,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            mode: ToolMode::None,
            active: None,
            selection: Vec::new(),
            anchor: None,
            pointer: Vec2::zeros(),
        }
    }
}

impl ToolState {
    /// Release the pointer without touching the selection.
    pub fn release(&mut self) {
        self.mode = ToolMode::None;
        self.active = None;
        self.anchor = None;
    }

    pub fn reset(&mut self) {
        *self = ToolState::default();
    }

    /// Rectangle spanned by the selection anchor and the pointer.
    pub fn selection_rect(&self) -> Option<Rect> {
        let a = self.anchor?;
        let p = self.pointer;
        Some(Rect::from_edges(a.x.min(p.x), a.y.min(p.y), a.x.max(p.x), a.y.max(p.y)))
    }
}

/// Velocity kick towards the pointer, applied when an impulse drag is released.
pub fn apply_impulse(particle: &mut Particle, pointer: &Vec2, strength: f64) {
    if particle.is_pinned() {
        return;
    }
    particle.velocity += (pointer - particle.position) * strength;
    particle.kinetic_energy = particle.compute_kinetic_energy();
}

/// Accumulate the force of the active tool.
///
/// `box_width` scales the attract and repel tools so they feel the same in every box.
pub fn apply_tool_forces(particles: &mut [Particle], state: &ToolState, config: &SimConfig, box_width: f64) {
    let pointer = state.pointer;
    match state.mode {
        ToolMode::Attract => {
            for p in particles.iter_mut() {
                let d = p.position - pointer;
                let dist = d.norm();
                if dist == 0.0 {
                    continue;
                }
                p.acceleration += d * (-(box_width / 10.0) / dist) * (config.attract_strength / p.mass);
            }
        }
        ToolMode::Repel => {
            for p in particles.iter_mut() {
                let d = p.position - pointer;
                let dist_sq = d.norm_squared();
                if dist_sq == 0.0 {
                    continue;
                }
                p.acceleration += d * (box_width / dist_sq) * (config.repel_strength / p.mass);
            }
        }
        ToolMode::Move => {
            let Some(active) = state.active else {
                return;
            };
            let Some(grabbed) = particles.iter().find(|p| p.id == active) else {
                return;
            };
            let d = grabbed.position - pointer;
            let drag_group = state.selection.contains(&active);
            for p in particles.iter_mut() {
                let dragged = if drag_group {
                    state.selection.contains(&p.id)
                } else {
                    p.id == active
                };
                if dragged && !p.is_pinned() {
                    p.acceleration += (-d * config.drag_strength - p.velocity) / p.mass;
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle_at(x: f64, y: f64, id: u32) -> Result<Particle> {
        let mut p = Particle::at(Vec2::new(x, y))?;
        p.id = id;
        Ok(p)
    }

    #[test]
    fn tool_names_round_trip() -> Result<()> {
        for mode in ToolMode::ALL {
            assert_eq!(mode.name().parse::<ToolMode>()?, mode);
        }
        let err = "lasso".parse::<ToolMode>().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("lasso"));
        Ok(())
    }

    #[test]
    fn attract_pulls_and_repel_pushes() -> Result<()> {
        let config = SimConfig::default();
        let mut ps = vec![particle_at(3.0, 0.0, 1)?];
        let mut state = ToolState {
            mode: ToolMode::Attract,
            ..ToolState::default()
        };
        apply_tool_forces(&mut ps, &state, &config, 25.0);
        assert!((ps[0].acceleration.x + 2.5).abs() < 1e-12);

        ps[0].acceleration = Vec2::zeros();
        state.mode = ToolMode::Repel;
        apply_tool_forces(&mut ps, &state, &config, 25.0);
        assert!((ps[0].acceleration.x - 25.0 * 3.0 / 9.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn move_drags_the_selection_with_the_grabbed_particle() -> Result<()> {
        let config = SimConfig::default();
        let mut ps = vec![
            particle_at(1.0, 0.0, 1)?,
            particle_at(5.0, 0.0, 2)?,
            particle_at(9.0, 0.0, 3)?,
        ];
        let state = ToolState {
            mode: ToolMode::Move,
            active: Some(1),
            selection: vec![1, 2],
            pointer: Vec2::new(0.0, 0.0),
            ..ToolState::default()
        };
        apply_tool_forces(&mut ps, &state, &config, 25.0);
        assert!((ps[0].acceleration.x + 1.0).abs() < 1e-12);
        assert!((ps[1].acceleration.x + 1.0).abs() < 1e-12);
        assert_eq!(ps[2].acceleration, Vec2::zeros());
        Ok(())
    }

    #[test]
    fn impulse_kicks_towards_the_pointer() -> Result<()> {
        let mut p = particle_at(1.0, 1.0, 4)?;
        apply_impulse(&mut p, &Vec2::new(3.0, 1.0), 0.5);
        assert_eq!(p.velocity, Vec2::new(1.0, 0.0));
        assert!((p.kinetic_energy - 0.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn selection_rect_spans_anchor_and_pointer() {
        let state = ToolState {
            mode: ToolMode::Select,
            anchor: Some(Vec2::new(2.0, -1.0)),
            pointer: Vec2::new(-1.0, 3.0),
            ..ToolState::default()
        };
        let rect = state.selection_rect().unwrap();
        assert_eq!((rect.left, rect.bottom, rect.right, rect.top), (-1.0, -1.0, 2.0, 3.0));
    }
}
