//! Library floor plan
//!
//! A layout decides where shelves stand and what color each one is. It runs
//! once per run, before anything moves.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::item::Color;

/// One shelf to build
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShelfPlan {
    pub pos: Vec2,
    pub color: Color,
    /// Books placed on the shelf at the start (clamped to its capacity)
    pub fill: usize,
}

/// Produces the shelf plan for a run
pub trait LevelLayout {
    fn plan(&self, rng: &mut Pcg32) -> Vec<ShelfPlan>;
}

/// Rows of shelves on a fixed grid, colors spread evenly then shuffled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryGrid {
    pub rows: usize,
    pub cols: usize,
    pub origin: Vec2,
    pub spacing: Vec2,
    pub fill: usize,
}

impl Default for LibraryGrid {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 8,
            origin: Vec2::new(100.0, 100.0),
            spacing: Vec2::new(160.0, 200.0),
            fill: crate::consts::SHELF_CAPACITY,
        }
    }
}

impl LibraryGrid {
    /// Whole palette cycles, then the leading colors again for the remainder
    fn palette(count: usize) -> Vec<Color> {
        (0..count)
            .map(|i| Color::PALETTE[i % Color::PALETTE.len()])
            .collect()
    }
}

impl LevelLayout for LibraryGrid {
    fn plan(&self, rng: &mut Pcg32) -> Vec<ShelfPlan> {
        let mut colors = Self::palette(self.rows * self.cols);
        colors.shuffle(rng);

        let mut shelves = Vec::with_capacity(colors.len());
        for row in 0..self.rows {
            for col in 0..self.cols {
                let color = colors[row * self.cols + col];
                shelves.push(ShelfPlan {
                    pos: self.origin + Vec2::new(col as f32, row as f32) * self.spacing,
                    color,
                    fill: self.fill,
                });
            }
        }

        log::debug!(
            "Library layout: {} shelves ({} rows x {} cols)",
            shelves.len(),
            self.rows,
            self.cols
        );
        shelves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_default_grid_color_balance() {
        let mut rng = Pcg32::seed_from_u64(42);
        let plan = LibraryGrid::default().plan(&mut rng);
        assert_eq!(plan.len(), 32);

        let count = |c: Color| plan.iter().filter(|s| s.color == c).count();
        assert_eq!(count(Color::Red), 6);
        assert_eq!(count(Color::Blue), 6);
        for c in [Color::Green, Color::Yellow, Color::Purple, Color::Orange] {
            assert_eq!(count(c), 5);
        }
        assert!(plan.iter().all(|s| s.fill == 6));
    }

    #[test]
    fn test_grid_positions() {
        let mut rng = Pcg32::seed_from_u64(1);
        let plan = LibraryGrid::default().plan(&mut rng);
        assert_eq!(plan[0].pos, Vec2::new(100.0, 100.0));
        assert_eq!(plan[7].pos, Vec2::new(1220.0, 100.0));
        assert_eq!(plan[31].pos, Vec2::new(1220.0, 700.0));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = LibraryGrid::default().plan(&mut Pcg32::seed_from_u64(9));
        let b = LibraryGrid::default().plan(&mut Pcg32::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
