use crate::core::geometry::{Rect, Vec2};
use crate::error::{Error, Result};

/// Immovable line segment. Walls have infinite mass; `force` accumulates the reaction
/// force exerted on the wall by particles during the last soft-force sub-step.
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    pub start: Vec2,
    pub end: Vec2,
    pub force: Vec2,
}

impl Wall {
    /// Create a wall; the endpoints must be finite and distinct.
    pub fn new(start: Vec2, end: Vec2) -> Result<Self> {
        if !start.iter().chain(end.iter()).all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("wall endpoints must be finite".into()));
        }
        if (end - start).norm_squared() == 0.0 {
            return Err(Error::MathError("wall endpoints coincide".into()));
        }
        Ok(Self {
            start,
            end,
            force: Vec2::zeros(),
        })
    }

    #[inline]
    pub fn vector(&self) -> Vec2 {
        self.end - self.start
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Wall pressure: reaction force magnitude per unit length.
    #[inline]
    pub fn pressure(&self) -> f64 {
        self.force.norm() / self.length()
    }

    #[inline]
    pub fn endpoints(&self) -> [Vec2; 2] {
        [self.start, self.end]
    }
}

/// The four walls tracing `bounds` counter-clockwise from the bottom-left corner.
pub fn border_walls(bounds: &Rect) -> Vec<Wall> {
    let corners = [
        Vec2::new(bounds.left, bounds.bottom),
        Vec2::new(bounds.right, bounds.bottom),
        Vec2::new(bounds.right, bounds.top),
        Vec2::new(bounds.left, bounds.top),
    ];
    (0..corners.len())
        .map(|i| Wall {
            start: corners[i],
            end: corners[(i + 1) % corners.len()],
            force: Vec2::zeros(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_wall_rejected() {
        let err = Wall::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0)).unwrap_err();
        assert!(err.to_string().contains("coincide"));
    }

    #[test]
    fn border_walls_close_the_box() {
        let b = Rect::from_edges(-2.0, -1.0, 2.0, 1.0);
        let walls = border_walls(&b);
        assert_eq!(walls.len(), 4);
        for (i, w) in walls.iter().enumerate() {
            assert_eq!(w.end, walls[(i + 1) % 4].start);
        }
        let perimeter: f64 = walls.iter().map(Wall::length).sum();
        assert!((perimeter - 12.0).abs() < 1e-12);
    }

    #[test]
    fn pressure_is_force_per_length() -> Result<()> {
        let mut w = Wall::new(Vec2::zeros(), Vec2::new(4.0, 0.0))?;
        w.force = Vec2::new(0.0, -2.0);
        assert!((w.pressure() - 0.5).abs() < 1e-12);
        Ok(())
    }
}
