//! Axis-aligned collision and proximity tests
//!
//! Everything spatial in the game goes through three predicates: `overlaps`,
//! `contains` and `near_rect`. Movement (player, kids, sliding books) and the
//! gameplay triggers (grab, return) use the same closed-interval rules, so a
//! body that is "touching" for one system is touching for all of them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned box, top-left origin, +y down
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Grow by `margin` on every side
    pub fn expand(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.w + 2.0 * margin,
            self.h + 2.0 * margin,
        )
    }

    pub fn translate(&self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.w, self.h)
    }
}

/// Closed-interval overlap: shared edges count as touching
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    !(a.right() < b.left() || b.right() < a.left() || a.bottom() < b.top() || b.bottom() < a.top())
}

/// Closed-interval point containment
#[inline]
pub fn contains(r: &Rect, p: Vec2) -> bool {
    p.x >= r.left() && p.x <= r.right() && p.y >= r.top() && p.y <= r.bottom()
}

/// `a` overlaps `b` grown by `margin`
#[inline]
pub fn near_rect(a: &Rect, b: &Rect, margin: f32) -> bool {
    overlaps(a, &b.expand(margin))
}

/// Which axes of a tentative move are blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisBlock {
    pub x: bool,
    pub y: bool,
}

/// Test a move one axis at a time against a set of solid boxes
///
/// `hitbox` is the mover's collision box at its current position. The X move is
/// tested at the current Y and vice versa, so a body can slide along a wall.
/// With `prefilter`, solids whose origin is more than that far from the
/// mover's origin on either axis are skipped before the exact test.
pub fn sweep_axes<I>(hitbox: &Rect, delta: Vec2, solids: I, prefilter: Option<f32>) -> AxisBlock
where
    I: IntoIterator<Item = Rect>,
{
    let moved_x = hitbox.translate(Vec2::new(delta.x, 0.0));
    let moved_y = hitbox.translate(Vec2::new(0.0, delta.y));
    let mut block = AxisBlock::default();

    for solid in solids {
        if let Some(radius) = prefilter {
            if (solid.x - hitbox.x).abs() > radius || (solid.y - hitbox.y).abs() > radius {
                continue;
            }
        }
        if !block.x && delta.x != 0.0 && overlaps(&moved_x, &solid) {
            block.x = true;
        }
        if !block.y && delta.y != 0.0 && overlaps(&moved_y, &solid) {
            block.y = true;
        }
        if block.x && block.y {
            break;
        }
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_overlap_shared_edge_counts() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(overlaps(&a, &b));

        let c = Rect::new(10.5, 0.0, 10.0, 10.0);
        assert!(!overlaps(&a, &c));
    }

    #[test]
    fn test_contains_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 20.0);
        assert!(contains(&r, Vec2::new(0.0, 0.0)));
        assert!(contains(&r, Vec2::new(10.0, 20.0)));
        assert!(!contains(&r, Vec2::new(10.1, 5.0)));
    }

    #[test]
    fn test_near_rect_margin() {
        let shelf = Rect::new(100.0, 100.0, 64.0, 96.0);
        let kid = Rect::new(30.0, 120.0, 32.0, 40.0); // right edge at 62, 38 px short
        assert!(!near_rect(&kid, &shelf, 5.0));
        assert!(near_rect(&kid, &shelf, 38.0));
    }

    #[test]
    fn test_sweep_slides_along_wall() {
        let wall = Rect::new(50.0, 0.0, 10.0, 200.0);
        let mover = Rect::new(20.0, 50.0, 20.0, 20.0);
        // Moving right into the wall and down along it
        let block = sweep_axes(&mover, Vec2::new(15.0, 5.0), [wall], None);
        assert!(block.x);
        assert!(!block.y);
    }

    #[test]
    fn test_sweep_prefilter_skips_far_solids() {
        let far = Rect::new(500.0, 0.0, 10.0, 10.0);
        let mover = Rect::new(0.0, 0.0, 600.0, 20.0);
        let unfiltered = sweep_axes(&mover, Vec2::new(1.0, 0.0), [far], None);
        let filtered = sweep_axes(&mover, Vec2::new(1.0, 0.0), [far], Some(100.0));
        assert!(unfiltered.x);
        assert!(!filtered.x);
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (-500.0f32..500.0, -500.0f32..500.0, 0.0f32..200.0, 0.0f32..200.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(a in arb_rect(), b in arb_rect()) {
            prop_assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
        }

        #[test]
        fn prop_near_rect_zero_margin_is_overlap(a in arb_rect(), b in arb_rect()) {
            prop_assert_eq!(near_rect(&a, &b, 0.0), overlaps(&a, &b));
        }

        #[test]
        fn prop_near_rect_monotone_in_margin(a in arb_rect(), b in arb_rect(), m in 0.0f32..50.0) {
            if near_rect(&a, &b, m) {
                prop_assert!(near_rect(&a, &b, m + 1.0));
            }
        }

        #[test]
        fn prop_center_is_contained(a in arb_rect()) {
            prop_assert!(contains(&a, a.center()));
        }
    }
}
