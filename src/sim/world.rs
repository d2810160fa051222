//! Entity registry for one run
//!
//! The world owns every body in the library. Cross-references between them
//! are arena ids, and the integrity audit is the only place that repairs a
//! reference that went stale.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use thiserror::Error;

use super::collision::{Rect, overlaps};
use super::container::Container;
use super::ids::{ContainerId, ItemId, NpcId};
use super::item::{Holder, Item, ItemState};
use super::layout::LevelLayout;
use super::npc::Npc;
use super::player::Player;
use crate::consts::*;
use crate::tuning::Tuning;

/// Extra clearance kept between a dropped book and any shelf
const DROP_SHELF_MARGIN: f32 = 30.0;
/// Dropped books land at least this far from the world edge
const DROP_EDGE_INSET: f32 = 50.0;
/// Shelves within this distance push a dropped book away
const DROP_PUSH_RADIUS: f32 = 100.0;
const DROP_PUSH_SPEED: f32 = 30.0;

/// A broken ownership link found (and repaired) by the audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntegrityIssue {
    #[error("shelf {container:?} slot {slot} references {item:?}, which is not shelved there")]
    StaleSlot {
        container: ContainerId,
        slot: usize,
        item: ItemId,
    },
    #[error("{item:?} is shelved on {container:?} but no slot holds it")]
    OrphanShelved { item: ItemId, container: ContainerId },
    #[error("player carries {item:?}, which is not held by the player")]
    StalePlayerEntry { item: ItemId },
    #[error("{item:?} is held by the player but not in the carried list")]
    OrphanPlayerHeld { item: ItemId },
    #[error("kid {npc:?} carries {item:?}, which is not held by that kid")]
    StaleNpcCarry { npc: NpcId, item: ItemId },
    #[error("{item:?} is held by kid {npc:?}, who is not carrying it")]
    OrphanNpcHeld { item: ItemId, npc: NpcId },
}

/// Everything that occupies the library during a run
#[derive(Debug, Clone)]
pub struct World {
    /// Playable area; every body is clamped inside it
    pub bounds: Rect,
    pub player: Player,
    pub npcs: Vec<Npc>,
    pub items: Vec<Item>,
    pub containers: Vec<Container>,
    /// Shelf hitboxes in container order (shelves never move)
    pub solids: Vec<Rect>,
}

impl World {
    /// Build the library from a layout; every planned book starts shelved
    pub fn build(tuning: &Tuning, layout: &dyn LevelLayout, rng: &mut Pcg32) -> Self {
        let mut containers = Vec::new();
        let mut items = Vec::new();

        for plan in layout.plan(rng) {
            let id = ContainerId::from_index(containers.len());
            let mut container = Container::new(id, plan.color, plan.pos, SHELF_CAPACITY);
            for _ in 0..plan.fill.min(container.capacity()) {
                let mut item = Item::new(ItemId::from_index(items.len()), plan.color, plan.pos);
                container.insert(&mut item);
                items.push(item);
            }
            containers.push(container);
        }

        let solids = containers
            .iter()
            .filter(|c| c.body.solid)
            .map(|c| c.body.hitbox_rect())
            .collect();
        log::info!(
            "Built library: {} shelves, {} books",
            containers.len(),
            items.len()
        );

        Self {
            bounds: Rect::new(0.0, 0.0, tuning.world.width, tuning.world.height),
            player: Player::new(tuning),
            npcs: Vec::new(),
            items,
            containers,
            solids,
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.index())
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(id.index())
    }

    pub fn npc(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.get(id.index())
    }

    /// Add a kid at `pos` (top-left)
    pub fn spawn_npc(&mut self, pos: Vec2, tier: u8, rng: &mut Pcg32) -> NpcId {
        let id = NpcId::from_index(self.npcs.len());
        let mut npc = Npc::new(id, pos, tier, rng);
        npc.body.clamp_to(&self.bounds);
        self.npcs.push(npc);
        id
    }

    /// Count books as (on floor, held, shelved)
    pub fn item_census(&self) -> (usize, usize, usize) {
        self.items
            .iter()
            .fold((0, 0, 0), |(floor, held, shelved), item| match item.state {
                ItemState::OnFloor => (floor + 1, held, shelved),
                ItemState::Held(_) => (floor, held + 1, shelved),
                ItemState::Shelved(_) => (floor, held, shelved + 1),
            })
    }

    /// Check every ownership link and clear the stale ones
    ///
    /// Orphaned books fall to the floor where they are. Returns one entry per
    /// repair.
    pub fn audit(&mut self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        // Shelf slots must point at books shelved on that shelf, once
        let mut shelved_in: Vec<Option<ContainerId>> = vec![None; self.items.len()];
        for container in &mut self.containers {
            for (slot, entry) in container.slots.iter_mut().enumerate() {
                let Some(id) = *entry else {
                    continue;
                };
                let valid = self
                    .items
                    .get(id.index())
                    .is_some_and(|item| item.state == ItemState::Shelved(container.id))
                    && shelved_in[id.index()].is_none();
                if valid {
                    shelved_in[id.index()] = Some(container.id);
                } else {
                    *entry = None;
                    issues.push(IntegrityIssue::StaleSlot {
                        container: container.id,
                        slot,
                        item: id,
                    });
                }
            }
        }

        // Player list must hold each player-held book exactly once
        let mut in_player_list = vec![false; self.items.len()];
        let items = &self.items;
        self.player.carried.retain(|&id| {
            let valid = items
                .get(id.index())
                .is_some_and(|item| item.state == ItemState::Held(Holder::Player))
                && !in_player_list[id.index()];
            if valid {
                in_player_list[id.index()] = true;
            } else {
                issues.push(IntegrityIssue::StalePlayerEntry { item: id });
            }
            valid
        });

        // Kid hands must hold books held by that kid
        let mut carried_by: Vec<Option<NpcId>> = vec![None; self.items.len()];
        for npc in &mut self.npcs {
            let Some(id) = npc.carrying else {
                continue;
            };
            let valid = self
                .items
                .get(id.index())
                .is_some_and(|item| item.state == ItemState::Held(Holder::Npc(npc.id)))
                && carried_by[id.index()].is_none();
            if valid {
                carried_by[id.index()] = Some(npc.id);
            } else {
                npc.carrying = None;
                npc.carry_timer = 0.0;
                issues.push(IntegrityIssue::StaleNpcCarry { npc: npc.id, item: id });
            }
        }

        // Books claiming an owner that does not claim them back
        for item in &mut self.items {
            let idx = item.id.index();
            let issue = match item.state {
                ItemState::OnFloor => None,
                ItemState::Shelved(container) if shelved_in[idx] != Some(container) => {
                    Some(IntegrityIssue::OrphanShelved {
                        item: item.id,
                        container,
                    })
                }
                ItemState::Held(Holder::Player) if !in_player_list[idx] => {
                    Some(IntegrityIssue::OrphanPlayerHeld { item: item.id })
                }
                ItemState::Held(Holder::Npc(npc)) if carried_by[idx] != Some(npc) => {
                    Some(IntegrityIssue::OrphanNpcHeld { item: item.id, npc })
                }
                _ => None,
            };
            if let Some(issue) = issue {
                let pos = item.body.pos;
                item.mark_floor(pos, Vec2::ZERO, 0.0);
                issues.push(issue);
            }
        }

        for issue in &issues {
            log::warn!("Integrity repair: {issue}");
        }
        issues
    }
}

/// Keep a book-sized box clear of every shelf (grown by `margin`)
///
/// An overlapping box is moved past the shelf edge closest to `reference`.
fn clear_of_shelves(mut pos: Vec2, reference: Vec2, containers: &[Container], margin: f32) -> Vec2 {
    for container in containers {
        let shelf = container.body.bounds();
        let book = Rect::new(pos.x, pos.y, BOOK_WIDTH, BOOK_HEIGHT);
        if !overlaps(&book, &shelf.expand(margin)) {
            continue;
        }

        let left = (reference.x - shelf.left()).abs();
        let right = (reference.x - shelf.right()).abs();
        let top = (reference.y - shelf.top()).abs();
        let bottom = (reference.y - shelf.bottom()).abs();
        let nearest = left.min(right).min(top).min(bottom);

        if nearest == left {
            pos.x = shelf.left() - BOOK_WIDTH - margin;
        } else if nearest == right {
            pos.x = shelf.right() + margin;
        } else if nearest == top {
            pos.y = shelf.top() - BOOK_HEIGHT - margin;
        } else {
            pos.y = shelf.bottom() + margin;
        }
    }
    pos
}

fn clamp_book(pos: Vec2, area: &Rect, inset: f32) -> Vec2 {
    let max_x = (area.right() - BOOK_WIDTH - inset).max(area.left() + inset);
    let max_y = (area.bottom() - BOOK_HEIGHT - inset).max(area.top() + inset);
    Vec2::new(
        pos.x.clamp(area.left() + inset, max_x),
        pos.y.clamp(area.top() + inset, max_y),
    )
}

/// Where a kid's dropped book lands, and how it starts moving
///
/// Starts at the kid's feet, steps out of any shelf's way and stays well
/// inside the world. The velocity is a small random toss, nudged away from
/// nearby shelves.
pub fn drop_placement(
    dropper: &Rect,
    containers: &[Container],
    area: &Rect,
    rng: &mut Pcg32,
) -> (Vec2, Vec2) {
    let start = Vec2::new(
        dropper.x + (dropper.w - BOOK_WIDTH) / 2.0,
        dropper.bottom(),
    );
    let pos = clear_of_shelves(start, dropper.center(), containers, DROP_SHELF_MARGIN);
    let pos = clamp_book(pos, area, DROP_EDGE_INSET);

    let mut vel = Vec2::new(
        (rng.random::<f32>() - 0.5) * 50.0,
        rng.random::<f32>() * 25.0 + 25.0,
    );
    let book_center = pos + Vec2::new(BOOK_WIDTH, BOOK_HEIGHT) / 2.0;
    for container in containers {
        let away = book_center - container.body.center();
        let dist = away.length();
        if dist < DROP_PUSH_RADIUS && dist > 0.0 {
            vel += away / dist * DROP_PUSH_SPEED;
        }
    }
    (pos, vel)
}

/// Where a book knocked off `shelf` lands, and how it starts moving
///
/// It lands beside the shelf (left or right at random), flying outward.
pub fn knockoff_placement(
    shelf: &Rect,
    containers: &[Container],
    area: &Rect,
    rng: &mut Pcg32,
) -> (Vec2, Vec2) {
    let dir = if rng.random_bool(0.5) { -1.0 } else { 1.0 };
    let x = if dir < 0.0 {
        shelf.left() - BOOK_WIDTH - 10.0
    } else {
        shelf.right() + 10.0
    };
    let start = Vec2::new(x, shelf.top() + shelf.h / 2.0);
    let vel = Vec2::new(
        dir * (50.0 + rng.random::<f32>() * 50.0),
        rng.random::<f32>() * 50.0 + 50.0,
    );

    let center = start + Vec2::new(BOOK_WIDTH, BOOK_HEIGHT) / 2.0;
    let pos = clear_of_shelves(start, center, containers, 0.0);
    (clamp_book(pos, area, 0.0), vel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::layout::LibraryGrid;
    use rand::SeedableRng;

    fn world() -> (World, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(11);
        let world = World::build(&Tuning::default(), &LibraryGrid::default(), &mut rng);
        (world, rng)
    }

    #[test]
    fn test_build_fills_every_shelf() {
        let (world, _) = world();
        assert_eq!(world.containers.len(), 32);
        assert_eq!(world.items.len(), 32 * 6);
        assert!(world.containers.iter().all(|c| c.count() == 6));
        assert_eq!(world.item_census(), (0, 0, 192));
        for item in &world.items {
            let ItemState::Shelved(cid) = item.state else {
                panic!("book not shelved");
            };
            assert_eq!(world.containers[cid.index()].color, item.color);
        }
    }

    #[test]
    fn test_clean_world_audits_clean() {
        let (mut world, _) = world();
        assert!(world.audit().is_empty());
    }

    #[test]
    fn test_audit_clears_stale_slot() {
        let (mut world, _) = world();
        // Book 0 "walks off" without its shelf noticing
        world.items[0].mark_floor(Vec2::new(40.0, 40.0), Vec2::ZERO, 0.0);
        let issues = world.audit();
        assert_eq!(
            issues,
            vec![IntegrityIssue::StaleSlot {
                container: ContainerId(0),
                slot: 0,
                item: ItemId(0)
            }]
        );
        assert_eq!(world.containers[0].count(), 5);
        assert!(world.audit().is_empty());
    }

    #[test]
    fn test_audit_drops_orphans() {
        let (mut world, mut rng) = world();
        let kid = world.spawn_npc(Vec2::new(50.0, 520.0), 1, &mut rng);
        world.containers[1].slots[0] = None;
        world.items[6].mark_held(Holder::Npc(kid));
        world.containers[2].slots[0] = None;
        world.items[12].mark_held(Holder::Player);
        world.player.carried.push(ItemId(13));

        let issues = world.audit();
        assert!(issues.contains(&IntegrityIssue::OrphanNpcHeld { item: ItemId(6), npc: kid }));
        assert!(issues.contains(&IntegrityIssue::OrphanPlayerHeld { item: ItemId(12) }));
        assert!(issues.contains(&IntegrityIssue::StalePlayerEntry { item: ItemId(13) }));
        assert!(world.items[6].is_on_floor());
        assert!(world.items[12].is_on_floor());
        assert!(world.player.carried.is_empty());
        assert!(world.audit().is_empty());
    }

    #[test]
    fn test_drop_lands_clear_of_shelves_and_inside_world() {
        let (world, mut rng) = world();
        // Kid standing right above a shelf
        let shelf = world.containers[9].body.bounds();
        let kid = Rect::new(shelf.x + 10.0, shelf.y - 45.0, KID_WIDTH, KID_HEIGHT);
        let (pos, vel) = drop_placement(&kid, &world.containers, &world.bounds, &mut rng);
        let book = Rect::new(pos.x, pos.y, BOOK_WIDTH, BOOK_HEIGHT);
        assert!(!overlaps(&book, &shelf));
        assert!(pos.x >= 50.0 && pos.y >= 50.0);
        assert!(vel.length() > 0.0);
    }

    #[test]
    fn test_knockoff_beside_shelf() {
        let (world, mut rng) = world();
        let shelf = world.containers[0].body.bounds();
        let (pos, vel) = knockoff_placement(&shelf, &world.containers, &world.bounds, &mut rng);
        assert_eq!(pos.y, shelf.y + 48.0);
        assert!(pos.x == shelf.left() - 26.0 || pos.x == shelf.right() + 10.0);
        assert!(vel.y >= 50.0);
        assert!(vel.x.abs() >= 50.0);
    }
}
