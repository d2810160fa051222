//! The librarian
//!
//! Movement, stamina and the three ways books change hands on the player's
//! side: picking them off the floor, snatching them from kids and putting
//! them back on shelves.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, near_rect, sweep_axes};
use super::economy::award_xp;
use super::entity::Body;
use super::ids::ItemId;
use super::item::Holder;
use super::npc::Behavior;
use super::state::{GameEvent, RunState};
use super::upgrades::Upgrade;
use super::world::World;
use crate::consts::*;
use crate::meters_to_pixels;
use crate::tuning::{PlayerTuning, Tuning};

/// Seconds per walk-cycle frame
const ANIM_FRAME_TIME: f32 = 0.2;

/// Upgradable player numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Meters per second
    pub move_speed: f32,
    /// Meters, center to book center
    pub pickup_radius: f32,
    /// Meters, player box to shelf edge
    pub return_radius: f32,
    pub carry_slots: usize,
    pub stamina: f32,
    pub max_stamina: f32,
    /// Percent of chaos gain removed
    pub chaos_dampening: f32,
    pub xp_multiplier: f32,
}

impl PlayerStats {
    pub fn new(tuning: &PlayerTuning) -> Self {
        Self {
            move_speed: tuning.move_speed,
            pickup_radius: tuning.pickup_radius,
            return_radius: tuning.return_radius,
            carry_slots: tuning.carry_slots,
            stamina: tuning.max_stamina,
            max_stamina: tuning.max_stamina,
            chaos_dampening: 0.0,
            xp_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    pub stats: PlayerStats,
    /// Carried books, oldest first
    pub carried: Vec<ItemId>,
    pub sprinting: bool,
    /// Holding sprint with an empty tank
    pub winded: bool,
    pub facing: Facing,
    /// Last left/right facing, for sprite flipping
    pub facing_right: bool,
    pub anim_frame: u8,
    anim_timer: f32,
    pub upgrades: BTreeMap<Upgrade, u8>,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        let (x, y) = tuning.player.start;
        Self {
            body: Body::new(Vec2::new(x, y), Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT))
                .with_hitbox(PLAYER_HITBOX_OFFSET, PLAYER_HITBOX_SIZE),
            stats: PlayerStats::new(&tuning.player),
            carried: Vec::new(),
            sprinting: false,
            winded: false,
            facing: Facing::Down,
            facing_right: false,
            anim_frame: 0,
            anim_timer: 0.0,
            upgrades: BTreeMap::new(),
        }
    }

    pub fn upgrade_level(&self, upgrade: Upgrade) -> u8 {
        self.upgrades.get(&upgrade).copied().unwrap_or(0)
    }

    #[inline]
    pub fn has_free_slot(&self) -> bool {
        self.carried.len() < self.stats.carry_slots
    }

    pub fn pickup_radius_px(&self) -> f32 {
        meters_to_pixels(self.stats.pickup_radius)
    }

    pub fn return_radius_px(&self) -> f32 {
        meters_to_pixels(self.stats.return_radius)
    }

    /// Walk speed in pixels per second
    pub fn walk_speed_px(&self) -> f32 {
        meters_to_pixels(self.stats.move_speed)
    }

    /// Stamina, sprint and movement for one tick
    ///
    /// `movement` is the raw intent; anything longer than a unit vector is
    /// normalized.
    pub fn update(
        &mut self,
        movement: Vec2,
        sprint: bool,
        solids: &[Rect],
        area: &Rect,
        tuning: &PlayerTuning,
        state: &mut RunState,
        dt: f32,
    ) {
        self.body.begin_tick();
        if !self.body.active {
            return;
        }

        self.sprinting = sprint && self.stats.stamina > 0.0;
        if self.sprinting {
            self.stats.stamina = (self.stats.stamina - tuning.stamina_drain * dt).max(0.0);
        } else {
            self.stats.stamina =
                (self.stats.stamina + tuning.stamina_regen * dt).min(self.stats.max_stamina);
        }

        if sprint && self.stats.stamina < 1.0 {
            if !self.winded {
                self.winded = true;
                state.push_event(GameEvent::OutOfBreath);
            }
        } else if self.winded {
            self.winded = false;
            state.push_event(GameEvent::CaughtBreath);
        }

        let intent = if movement.length_squared() > 1.0 {
            movement.normalize_or_zero()
        } else {
            movement
        };
        let mut speed = self.walk_speed_px();
        if self.sprinting && self.stats.stamina > 0.0 {
            speed *= tuning.sprint_multiplier;
        }
        self.body.vel = intent * speed;

        let delta = self.body.vel * dt;
        let block = sweep_axes(&self.body.hitbox_rect(), delta, solids.iter().copied(), None);
        if !block.x {
            self.body.pos.x += delta.x;
        }
        if !block.y {
            self.body.pos.y += delta.y;
        }
        self.body.clamp_to(area);

        self.animate(dt);
    }

    fn animate(&mut self, dt: f32) {
        let vel = self.body.vel;
        if vel.x != 0.0 {
            self.facing_right = vel.x > 0.0;
            self.facing = if self.facing_right {
                Facing::Right
            } else {
                Facing::Left
            };
        } else if vel.y != 0.0 {
            self.facing = if vel.y > 0.0 { Facing::Down } else { Facing::Up };
        }

        if vel != Vec2::ZERO {
            self.anim_timer += dt;
            if self.anim_timer >= ANIM_FRAME_TIME {
                self.anim_frame = (self.anim_frame + 1) % 2;
                self.anim_timer = 0.0;
            }
        } else {
            self.anim_frame = 0;
            self.anim_timer = 0.0;
        }
    }
}

/// Collect floor books within the pickup radius
///
/// Returns how many were picked up.
pub fn pickup_items(world: &mut World, state: &mut RunState, tuning: &Tuning) -> usize {
    let World { player, items, .. } = world;
    if !player.body.active {
        return 0;
    }
    let radius = player.pickup_radius_px();
    let center = player.body.center();
    let mut picked = 0;

    for item in items.iter_mut() {
        if !player.has_free_slot() {
            break;
        }
        if !item.is_on_floor() || item.body.center().distance(center) > radius {
            continue;
        }
        player.carried.push(item.id);
        item.mark_held(Holder::Player);

        state.stats.items_collected += 1;
        state.relieve(tuning.economy.pickup_relief);
        award_xp(state, player, tuning.economy.pickup_xp, &tuning.economy);
        state.push_event(GameEvent::ItemPickedUp { item: item.id });
        picked += 1;
    }
    picked
}

/// Take books from kids within the repel radius
///
/// A robbed kid runs off without counting as repelled.
pub fn snatch_items(world: &mut World, state: &mut RunState, tuning: &Tuning) -> usize {
    let World {
        player,
        items,
        npcs,
        ..
    } = world;
    if !player.body.active {
        return 0;
    }
    let radius = meters_to_pixels(tuning.player.repel_radius);
    let center = player.body.center();
    let mut snatched = 0;

    for npc in npcs.iter_mut() {
        if !player.has_free_slot() {
            break;
        }
        let Some(id) = npc.carrying else {
            continue;
        };
        if npc.body.center().distance(center) > radius {
            continue;
        }
        let Some(item) = items.get_mut(id.index()) else {
            continue;
        };

        npc.carrying = None;
        npc.carry_timer = 0.0;
        npc.behavior = Behavior::Fleeing {
            fallback: tuning.npc.blind_flee_time,
        };

        player.carried.push(id);
        item.mark_held(Holder::Player);

        state.stats.items_collected += 1;
        state.relieve(tuning.economy.snatch_relief);
        award_xp(state, player, tuning.economy.snatch_xp, &tuning.economy);
        state.push_event(GameEvent::ItemSnatched { item: id, npc: npc.id });
        log::debug!("Snatched book {} from kid {}", id.0, npc.id.0);
        snatched += 1;
    }
    snatched
}

/// Shelve carried books on touching shelves with room, one per shelf
pub fn return_items(world: &mut World, state: &mut RunState, tuning: &Tuning) -> usize {
    let World {
        player,
        items,
        containers,
        ..
    } = world;
    if !player.body.active || player.carried.is_empty() {
        return 0;
    }
    let margin = player.return_radius_px();
    let player_box = player.body.bounds();
    let mut returned = 0;

    for container in containers.iter_mut() {
        if player.carried.is_empty() {
            break;
        }
        if !container.has_free_slot() || !near_rect(&player_box, &container.body.bounds(), margin) {
            continue;
        }
        let Some(pos) = player.carried.iter().position(|id| {
            items
                .get(id.index())
                .is_some_and(|item| item.color == container.color)
        }) else {
            continue;
        };

        let id = player.carried.remove(pos);
        let item = &mut items[id.index()];
        if !container.insert(item) {
            player.carried.insert(pos, id);
            continue;
        }

        log::trace!("Shelved a {} book on shelf {}", container.color.as_str(), container.id.0);
        state.stats.items_returned += 1;
        state.relieve(tuning.economy.return_relief);
        award_xp(state, player, tuning.economy.return_xp, &tuning.economy);
        state.push_event(GameEvent::ItemReturned {
            item: id,
            container: container.id,
        });
        returned += 1;
    }
    returned
}
