//! Shelves

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::Body;
use super::ids::{ContainerId, ItemId};
use super::item::{Color, Item, ItemState};
use crate::consts::*;

/// Books per row on a shelf
const SLOTS_PER_ROW: usize = 3;
/// First row's offset from the shelf top, and row pitch
const SLOT_TOP: f32 = 24.0;
const SLOT_PITCH: f32 = 24.0;

/// A solid shelf with a fixed number of book slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub color: Color,
    pub body: Body,
    /// A slot is free iff it is `None`
    pub slots: Vec<Option<ItemId>>,
}

impl Container {
    pub fn new(id: ContainerId, color: Color, pos: Vec2, capacity: usize) -> Self {
        Self {
            id,
            color,
            body: Body::new(pos, Vec2::new(SHELF_WIDTH, SHELF_HEIGHT)),
            slots: vec![None; capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn has_items(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    pub fn has_free_slot(&self) -> bool {
        self.slots.iter().any(Option::is_none)
    }

    pub fn first_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Where a book in `slot` sits (top-left)
    pub fn slot_position(&self, slot: usize) -> Vec2 {
        let slot_width = self.body.size.x / SLOTS_PER_ROW as f32;
        let row = (slot / SLOTS_PER_ROW) as f32;
        let col = (slot % SLOTS_PER_ROW) as f32;
        Vec2::new(
            self.body.pos.x + col * slot_width + (slot_width - BOOK_WIDTH) / 2.0,
            self.body.pos.y + SLOT_TOP + row * SLOT_PITCH,
        )
    }

    /// Put a matching book into the first free slot
    ///
    /// Returns false (and changes nothing) when the colors differ or the shelf
    /// is full. The caller must already have released the book from its
    /// previous owner.
    pub fn insert(&mut self, item: &mut Item) -> bool {
        if item.color != self.color {
            return false;
        }
        let Some(slot) = self.first_free_slot() else {
            return false;
        };
        self.slots[slot] = Some(item.id);
        item.mark_shelved(self.id, self.slot_position(slot));
        true
    }

    /// Empty one slot; the book lands on the floor where it stood
    pub fn remove_at(&mut self, slot: usize, items: &mut [Item]) -> Option<ItemId> {
        let id = self.slots.get_mut(slot)?.take()?;
        if let Some(item) = items.get_mut(id.index()) {
            if item.state == ItemState::Shelved(self.id) {
                let pos = item.body.pos;
                item.mark_floor(pos, Vec2::ZERO, 0.0);
            }
        }
        Some(id)
    }

    /// Empty a uniformly random occupied slot
    pub fn remove_random(&mut self, items: &mut [Item], rng: &mut Pcg32) -> Option<ItemId> {
        let occupied: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|_| i))
            .collect();
        if occupied.is_empty() {
            return None;
        }
        let pick = occupied[rng.random_range(0..occupied.len())];
        self.remove_at(pick, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn shelf_with(n: usize) -> (Container, Vec<Item>) {
        let mut shelf = Container::new(ContainerId(0), Color::Red, Vec2::new(100.0, 100.0), 6);
        let mut items: Vec<Item> = (0..n)
            .map(|i| Item::new(ItemId::from_index(i), Color::Red, Vec2::ZERO))
            .collect();
        for item in items.iter_mut() {
            assert!(shelf.insert(item));
        }
        (shelf, items)
    }

    #[test]
    fn test_insert_fills_first_free_slot() {
        let (mut shelf, mut items) = shelf_with(3);
        assert_eq!(shelf.count(), 3);
        shelf.remove_at(1, &mut items);
        assert_eq!(shelf.first_free_slot(), Some(1));
        assert!(items[1].is_on_floor());

        assert!(shelf.insert(&mut items[1]));
        assert_eq!(shelf.slots[1], Some(ItemId(1)));
        assert_eq!(items[1].state, ItemState::Shelved(ContainerId(0)));
        assert_eq!(items[1].body.pos, shelf.slot_position(1));
    }

    #[test]
    fn test_insert_rejects_wrong_color_and_full() {
        let (mut shelf, _) = shelf_with(6);
        let mut extra = Item::new(ItemId(6), Color::Red, Vec2::ZERO);
        assert!(!shelf.insert(&mut extra));
        assert!(extra.is_on_floor());

        let (mut shelf, _) = shelf_with(0);
        let mut blue = Item::new(ItemId(0), Color::Blue, Vec2::ZERO);
        assert!(!shelf.insert(&mut blue));
        assert_eq!(shelf.count(), 0);
    }

    #[test]
    fn test_remove_random_until_empty() {
        let mut rng = Pcg32::seed_from_u64(7);
        let (mut shelf, mut items) = shelf_with(6);
        let mut seen = Vec::new();
        while let Some(id) = shelf.remove_random(&mut items, &mut rng) {
            assert!(!seen.contains(&id));
            seen.push(id);
        }
        assert_eq!(seen.len(), 6);
        assert!(!shelf.has_items());
        assert!(items.iter().all(Item::is_on_floor));
    }

    #[test]
    fn test_slot_layout_two_rows_of_three() {
        let shelf = Container::new(ContainerId(0), Color::Red, Vec2::new(100.0, 100.0), 6);
        let first = shelf.slot_position(0);
        let fourth = shelf.slot_position(3);
        assert_eq!(first.y, 124.0);
        assert_eq!(fourth.y, 148.0);
        assert_eq!(first.x, fourth.x);
    }
}
