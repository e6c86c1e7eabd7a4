//! 2D vector kernel: rectangles, periodic wrapping and the line/segment/circle
//! intersection primitives used by the force model and the collision scheduler.

use nalgebra::Vector2;
use rand::Rng;

/// Planar vector used throughout the engine.
pub type Vec2 = Vector2<f64>;

/// Scalar 2D cross product `a.x * b.y - a.y * b.x`.
#[inline]
pub fn cross(a: &Vec2, b: &Vec2) -> f64 {
    a.perp(b)
}

/// Counter-clockwise perpendicular.
#[inline]
pub fn perp_ccw(a: &Vec2) -> Vec2 {
    Vec2::new(-a.y, a.x)
}

/// Wrap a displacement onto the shortest image inside a periodic box.
#[inline]
pub fn periodicize(v: &Vec2, bounds: &Rect) -> Vec2 {
    Vec2::new(
        v.x - bounds.width() * (v.x / bounds.width() + 0.5).floor(),
        v.y - bounds.height() * (v.y / bounds.height() + 0.5).floor(),
    )
}

/// Wrap an absolute position back into `bounds` (periodic boundaries).
#[inline]
pub fn wrap_position(p: &Vec2, bounds: &Rect) -> Vec2 {
    let center = bounds.center();
    center + periodicize(&(p - center), bounds)
}

/// Vector from the closest point of segment `start..end` to `point`.
pub fn shortest_vector_from_segment(point: &Vec2, start: &Vec2, end: &Vec2) -> Vec2 {
    let line = end - start;
    let from_start = point - start;
    let len_sq = line.norm_squared();
    let t = if len_sq > 0.0 {
        (from_start.dot(&line) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    from_start - line * t
}

/// Both parameters of a ray/circle intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleHit {
    pub t1: f64,
    pub t2: f64,
}

/// Intersect the line `start + t * dir` with the origin-centred circle of `radius`.
///
/// Returns `None` for a degenerate direction or when the line misses (or only grazes) the circle.
pub fn intersect_origin_circle_line(radius: f64, start: &Vec2, dir: &Vec2) -> Option<CircleHit> {
    let dot = start.dot(dir);
    let b_sq = dir.norm_squared();
    let root_input = dot * dot + b_sq * (radius * radius - start.norm_squared());
    if b_sq > 0.0 && root_input > 0.0 {
        let root = root_input.sqrt();
        let inv = 1.0 / b_sq;
        Some(CircleHit {
            t1: (-dot - root) * inv,
            t2: (-dot + root) * inv,
        })
    } else {
        None
    }
}

/// Parameters of a line/line intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHit {
    /// Parameter along the line through the origin.
    pub t_origin: f64,
    /// Parameter along the offset line.
    pub t_line: f64,
}

/// Intersect `s * origin_dir` with `start + t * dir`. `None` for parallel lines.
pub fn intersect_origin_line_line(origin_dir: &Vec2, start: &Vec2, dir: &Vec2) -> Option<LineHit> {
    let denom = cross(origin_dir, dir);
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    let inv = 1.0 / denom;
    Some(LineHit {
        t_origin: cross(start, dir) * inv,
        t_line: cross(start, origin_dir) * inv,
    })
}

/// Axis-aligned rectangle with y pointing up (`bottom < top`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Rect {
    pub fn from_edges(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    pub fn from_center_size(center: Vec2, width: f64, height: f64) -> Self {
        let (hw, hh) = (0.5 * width, 0.5 * height);
        Self::from_edges(center.x - hw, center.y - hh, center.x + hw, center.y + hh)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(0.5 * (self.left + self.right), 0.5 * (self.bottom + self.top))
    }

    /// Inclusive containment test.
    #[inline]
    pub fn contains_point(&self, p: &Vec2) -> bool {
        self.left <= p.x && p.x <= self.right && self.bottom <= p.y && p.y <= self.top
    }

    pub fn contains_rect(&self, inner: &Rect) -> bool {
        self.left <= inner.left
            && inner.right <= self.right
            && self.bottom <= inner.bottom
            && inner.top <= self.top
    }

    /// Left and right halves.
    pub fn split_halves(&self) -> (Rect, Rect) {
        let mid = 0.5 * (self.left + self.right);
        (
            Rect::from_edges(self.left, self.bottom, mid, self.top),
            Rect::from_edges(mid, self.bottom, self.right, self.top),
        )
    }

    /// Shrink every edge by `margin` (clamped so the rectangle never inverts).
    pub fn inset(&self, margin: f64) -> Rect {
        let mx = margin.min(0.5 * self.width());
        let my = margin.min(0.5 * self.height());
        Rect::from_edges(self.left + mx, self.bottom + my, self.right - mx, self.top - my)
    }

    /// Uniform random point inside the rectangle.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            lerp(self.left, rng.random::<f64>(), self.right),
            lerp(self.bottom, rng.random::<f64>(), self.top),
        )
    }

    /// Map `p` from `from` coordinates into this rectangle.
    pub fn transform_from(&self, p: &Vec2, from: &Rect) -> Vec2 {
        let x = (p.x - from.left) / from.width();
        let y = (p.y - from.bottom) / from.height();
        Vec2::new(x * self.width() + self.left, y * self.height() + self.bottom)
    }
}

#[inline]
fn lerp(a: f64, t: f64, b: f64) -> f64 {
    (1.0 - t) * a + t * b
}
