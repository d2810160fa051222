//! Shared body for everything that occupies space in the library

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;

/// Collision box relative to the body's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub offset: Vec2,
    pub size: Vec2,
}

/// Position, extent and motion of a world object
///
/// The visual box (`pos`, `size`) drives rendering and world clamping. The
/// hitbox is what solid collisions test against, and may be smaller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner
    pub pos: Vec2,
    /// Position at the start of the current tick (for render interpolation)
    pub prev_pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub hitbox: Hitbox,
    pub active: bool,
    pub visible: bool,
    pub solid: bool,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            prev_pos: pos,
            size,
            vel: Vec2::ZERO,
            hitbox: Hitbox {
                offset: Vec2::ZERO,
                size,
            },
            active: true,
            visible: true,
            solid: true,
        }
    }

    pub fn with_hitbox(mut self, offset: (f32, f32), size: (f32, f32)) -> Self {
        self.hitbox = Hitbox {
            offset: Vec2::new(offset.0, offset.1),
            size: Vec2::new(size.0, size.1),
        };
        self
    }

    /// Visual bounds
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    /// Collision bounds at the current position
    #[inline]
    pub fn hitbox_rect(&self) -> Rect {
        self.hitbox_at(self.pos)
    }

    /// Collision bounds if the body stood at `pos`
    #[inline]
    pub fn hitbox_at(&self, pos: Vec2) -> Rect {
        Rect::from_pos_size(pos + self.hitbox.offset, self.hitbox.size)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Move so the visual center lands on `center`
    pub fn set_center(&mut self, center: Vec2) {
        self.pos = center - self.size / 2.0;
    }

    /// Snapshot position for interpolation; call at the start of each update
    #[inline]
    pub fn begin_tick(&mut self) {
        self.prev_pos = self.pos;
    }

    /// Position blended between the last two ticks
    pub fn interpolated(&self, alpha: f32) -> Vec2 {
        self.prev_pos.lerp(self.pos, alpha.clamp(0.0, 1.0))
    }

    /// Keep the visual box inside `area`
    pub fn clamp_to(&mut self, area: &Rect) {
        let max_x = (area.right() - self.size.x).max(area.left());
        let max_y = (area.bottom() - self.size.y).max(area.top());
        self.pos.x = self.pos.x.clamp(area.left(), max_x);
        self.pos.y = self.pos.y.clamp(area.top(), max_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hitbox_offset_from_visual_box() {
        let body = Body::new(Vec2::new(100.0, 100.0), Vec2::new(48.0, 64.0))
            .with_hitbox((8.0, 24.0), (32.0, 36.0));
        let hit = body.hitbox_rect();
        assert_eq!(hit, Rect::new(108.0, 124.0, 32.0, 36.0));
        assert_eq!(body.center(), Vec2::new(124.0, 132.0));
    }

    #[test]
    fn test_clamp_and_interpolate() {
        let mut body = Body::new(Vec2::new(-20.0, 1030.0), Vec2::new(32.0, 40.0));
        body.begin_tick();
        body.clamp_to(&Rect::new(0.0, 0.0, 1600.0, 1040.0));
        assert_eq!(body.pos, Vec2::new(0.0, 1000.0));
        let mid = body.interpolated(0.5);
        assert_eq!(mid, Vec2::new(-10.0, 1015.0));
    }
}
