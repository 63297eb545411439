use glam::Vec2;

/// Collision shape centered on an entity's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hitbox {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

impl Hitbox {
    pub fn circle(diameter: f32) -> Self {
        Self::Circle {
            radius: diameter / 2.0,
        }
    }

    pub fn square(size: f32) -> Self {
        Self::Rect {
            width: size,
            height: size,
        }
    }

    /// Radius of a circle, or half the width of a rect.
    pub fn radius(&self) -> f32 {
        match *self {
            Self::Circle { radius } => radius,
            Self::Rect { width, .. } => width / 2.0,
        }
    }

    /// Point on or inside this shape nearest to `point`.
    pub fn closest_point(&self, center: Vec2, point: Vec2) -> Vec2 {
        match *self {
            Self::Circle { radius } => {
                let offset = point - center;
                if offset.length() <= radius {
                    point
                } else {
                    center + offset.normalize_or_zero() * radius
                }
            }
            Self::Rect { width, height } => {
                let half = Vec2::new(width, height) / 2.0;
                point.clamp(center - half, center + half)
            }
        }
    }

    /// Signed gap between two shapes. Negative when they overlap.
    pub fn edge_distance(&self, center: Vec2, other: &Hitbox, other_center: Vec2) -> f32 {
        match (*self, *other) {
            (Self::Circle { radius: a }, Self::Circle { radius: b }) => {
                center.distance(other_center) - a - b
            }
            (Self::Circle { radius }, Self::Rect { .. }) => {
                let closest = other.closest_point(other_center, center);
                center.distance(closest) - radius
            }
            (Self::Rect { .. }, Self::Circle { .. }) => {
                other.edge_distance(other_center, self, center)
            }
            (
                Self::Rect { width: w1, height: h1 },
                Self::Rect { width: w2, height: h2 },
            ) => {
                let delta = (center - other_center).abs();
                let gap = delta - Vec2::new(w1 + w2, h1 + h2) / 2.0;
                if gap.x <= 0.0 && gap.y <= 0.0 {
                    gap.x.max(gap.y)
                } else {
                    gap.max(Vec2::ZERO).length()
                }
            }
        }
    }
}
