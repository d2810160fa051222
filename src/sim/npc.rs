//! Kid behavior
//!
//! Kids wander toward full shelves, pull books off them and run when the
//! librarian gets close. Each kid only looks at the player, the shelves and
//! its own timers; there is no coordination between kids.

use std::f32::consts::{FRAC_PI_4, PI, TAU};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, near_rect, sweep_axes};
use super::container::Container;
use super::entity::Body;
use super::ids::{ContainerId, ItemId, NpcId};
use super::item::{Holder, Item, ItemState};
use super::state::{GameEvent, RunState};
use super::world::{drop_placement, knockoff_placement};
use crate::consts::*;
use crate::tuning::{TierProfile, Tuning};
use crate::{heading_toward, heading_vector, normalize_angle};

/// Seconds between heading re-rolls while seeking the world center
const SEEK_REROLL: f32 = 1.0;
/// Seconds between heading re-rolls while carrying or cooling down
const ROAM_REROLL: f32 = 1.5;
/// Random spread (radians) added when steering toward the center
const CENTER_JITTER: f32 = 0.5;
const ANIM_FRAME_TIME: f32 = 0.2;

/// What a kid is doing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Wandering,
    /// Walking to `target`, then waiting out the grab delay
    Stealing {
        target: ContainerId,
        grab_timer: Option<f32>,
    },
    /// Running from the player; `fallback` only counts down when there is no
    /// player to run from
    Fleeing { fallback: f32 },
}

impl Behavior {
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::Wandering => "wandering",
            Behavior::Stealing { .. } => "stealing",
            Behavior::Fleeing { .. } => "fleeing",
        }
    }
}

/// A kid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub id: NpcId,
    pub body: Body,
    /// Aggression tier, 1..=3
    pub tier: u8,
    pub behavior: Behavior,
    pub carrying: Option<ItemId>,
    /// Seconds the current book has been carried, and the rolled limit
    pub carry_timer: f32,
    pub carry_limit: f32,
    pub steal_cooldown: f32,
    /// Wander/flee heading (radians)
    pub heading: f32,
    pub heading_timer: f32,
    /// Shelf most recently targeted
    pub last_target: Option<ContainerId>,
    /// Set once per flee so the laugh and the repel count happen once
    pub flee_session: bool,
    /// Sprite and laugh variant, 1..=3
    pub voice: u8,
    pub facing_right: bool,
    pub anim_frame: u8,
    anim_timer: f32,
}

/// What a kid can see and touch during its update
pub struct NpcContext<'a> {
    pub items: &'a mut [Item],
    pub containers: &'a mut [Container],
    /// `None` when there is no active player
    pub player_center: Option<Vec2>,
    pub bounds: Rect,
    pub rng: &'a mut Pcg32,
    pub state: &'a mut RunState,
    pub tuning: &'a Tuning,
}

impl Npc {
    pub fn new(id: NpcId, pos: Vec2, tier: u8, rng: &mut Pcg32) -> Self {
        Self {
            id,
            body: Body::new(pos, Vec2::new(KID_WIDTH, KID_HEIGHT)),
            tier: tier.clamp(1, 3),
            behavior: Behavior::Wandering,
            carrying: None,
            carry_timer: 0.0,
            carry_limit: 0.0,
            steal_cooldown: 0.0,
            heading: rng.random::<f32>() * TAU,
            heading_timer: 0.0,
            last_target: None,
            flee_session: false,
            voice: rng.random_range(1..=3),
            facing_right: false,
            anim_frame: 0,
            anim_timer: 0.0,
        }
    }

    pub fn is_fleeing(&self) -> bool {
        matches!(self.behavior, Behavior::Fleeing { .. })
    }

    fn profile<'t>(&self, tuning: &'t Tuning) -> &'t TierProfile {
        tuning.tier(self.tier)
    }

    /// One tick of behavior, movement and carry bookkeeping
    pub fn update(&mut self, ctx: &mut NpcContext, dt: f32) {
        self.body.begin_tick();
        if !self.body.active {
            return;
        }

        if self.steal_cooldown > 0.0 {
            self.steal_cooldown -= dt;
        }

        match self.behavior {
            Behavior::Wandering => self.wander(ctx, dt),
            Behavior::Stealing { target, grab_timer } => self.steal(ctx, target, grab_timer, dt),
            Behavior::Fleeing { fallback } => self.flee(ctx, fallback, dt),
        }

        self.animate(dt);

        if self.carrying.is_some() {
            self.carry_timer += dt;
            if self.carry_timer > self.carry_limit {
                self.drop_carried(ctx);
                self.leave_for_wandering();
            }
        }

        self.body.clamp_to(&ctx.bounds);
    }

    fn player_in_range(&self, ctx: &NpcContext) -> bool {
        let range = self.profile(ctx.tuning).detection_range;
        ctx.player_center
            .is_some_and(|p| self.body.center().distance(p) < range)
    }

    fn start_fleeing(&mut self, ctx: &mut NpcContext) {
        if !self.flee_session {
            self.flee_session = true;
            ctx.state.stats.npcs_repelled += 1;
            ctx.state.push_event(GameEvent::NpcFled {
                npc: self.id,
                voice: self.voice,
            });
        }
        self.behavior = Behavior::Fleeing {
            fallback: ctx.tuning.npc.blind_flee_time,
        };
    }

    fn leave_for_wandering(&mut self) {
        self.behavior = Behavior::Wandering;
        self.flee_session = false;
    }

    /// Nearest stocked shelf, optionally limited to `range` (center distance)
    fn nearest_stocked(&self, containers: &[Container], range: Option<f32>) -> Option<ContainerId> {
        let center = self.body.center();
        let mut best: Option<(ContainerId, f32)> = None;
        for container in containers {
            if !container.has_items() {
                continue;
            }
            if let Some(range) = range {
                let origin = container.body.pos;
                if (origin.x - self.body.pos.x).abs() > range
                    || (origin.y - self.body.pos.y).abs() > range
                {
                    continue;
                }
            }
            let dist = center.distance(container.body.center());
            if range.is_some_and(|r| dist >= r) {
                continue;
            }
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((container.id, dist));
            }
        }
        best.map(|(id, _)| id)
    }

    fn wander(&mut self, ctx: &mut NpcContext, dt: f32) {
        if self.player_in_range(ctx) {
            self.start_fleeing(ctx);
            return;
        }

        let ready = self.carrying.is_none() && self.steal_cooldown <= 0.0;
        let detection = ctx.tuning.npc.shelf_detection_range;
        if ready {
            if let Some(target) = self.nearest_stocked(ctx.containers, Some(detection)) {
                self.behavior = Behavior::Stealing {
                    target,
                    grab_timer: None,
                };
                self.last_target = Some(target);
                log::debug!("Kid {} heading for shelf {}", self.id.0, target.0);
                return;
            }
        }

        let center = self.body.center();
        let world_center = ctx.bounds.center();
        if ready && !ctx.containers.is_empty() {
            match self.nearest_stocked(ctx.containers, None) {
                Some(shelf) => {
                    let to = ctx.containers[shelf.index()].body.center();
                    self.heading = heading_toward(center, to);
                }
                None => {
                    self.heading_timer -= dt;
                    if self.heading_timer <= 0.0 {
                        self.heading = heading_toward(center, world_center)
                            + (ctx.rng.random::<f32>() - 0.5) * CENTER_JITTER;
                        self.heading_timer = SEEK_REROLL;
                    }
                }
            }
        } else {
            self.heading_timer -= dt;
            if self.heading_timer <= 0.0 {
                let last = self
                    .last_target
                    .and_then(|id| ctx.containers.get(id.index()))
                    .map(|c| c.body.center());
                self.heading = match last {
                    Some(from) => {
                        heading_toward(from, center) + (ctx.rng.random::<f32>() - 0.5) * FRAC_PI_4 * 2.0
                    }
                    None => ctx.rng.random::<f32>() * TAU,
                };
                self.heading_timer = ROAM_REROLL;
            }
        }

        let speed = self.profile(ctx.tuning).speed;
        self.body.vel = heading_vector(self.heading) * speed;

        // Near an edge: turn back toward the shelves for the next tick
        let margin = ctx.tuning.npc.edge_margin;
        let b = &ctx.bounds;
        let pos = self.body.pos;
        if pos.x <= b.left() + margin
            || pos.x >= b.right() - self.body.size.x - margin
            || pos.y <= b.top() + margin
            || pos.y >= b.bottom() - self.body.size.y - margin
        {
            self.heading = heading_toward(center, world_center)
                + (ctx.rng.random::<f32>() - 0.5) * CENTER_JITTER;
        }

        self.move_and_collide(ctx, dt);
    }

    fn steal(
        &mut self,
        ctx: &mut NpcContext,
        target: ContainerId,
        grab_timer: Option<f32>,
        dt: f32,
    ) {
        if self.carrying.is_some() || target.index() >= ctx.containers.len() {
            self.behavior = Behavior::Wandering;
            return;
        }
        if self.player_in_range(ctx) {
            self.start_fleeing(ctx);
            return;
        }

        let shelf_box = ctx.containers[target.index()].body.bounds();
        if !near_rect(&self.body.bounds(), &shelf_box, ctx.tuning.npc.grab_margin) {
            let dir = (shelf_box.center() - self.body.center()).normalize_or_zero();
            self.body.vel = dir * self.profile(ctx.tuning).speed;
            self.move_and_collide(ctx, dt);
            return;
        }

        // At the shelf: wait out the grab delay
        self.body.vel = Vec2::ZERO;
        let profile = *self.profile(ctx.tuning);
        let remaining = match grab_timer {
            Some(t) if t > 0.0 => t,
            _ => profile.grab_delay,
        } - dt;
        if remaining > 0.0 {
            self.behavior = Behavior::Stealing {
                target,
                grab_timer: Some(remaining),
            };
            return;
        }

        let taken = ctx.containers[target.index()].remove_random(ctx.items, ctx.rng);
        let Some(item_id) = taken else {
            // Someone got there first
            self.behavior = Behavior::Wandering;
            self.steal_cooldown = ctx.tuning.npc.empty_shelf_cooldown;
            return;
        };

        let carried = ctx.rng.random_bool(0.5);
        if let Some(item) = ctx.items.get_mut(item_id.index()) {
            if carried {
                item.mark_held(Holder::Npc(self.id));
                self.carrying = Some(item_id);
                self.carry_timer = 0.0;
                self.carry_limit = profile.carry_min
                    + ctx.rng.random::<f32>() * (profile.carry_max - profile.carry_min);
            } else {
                let (pos, vel) =
                    knockoff_placement(&shelf_box, ctx.containers, &ctx.bounds, ctx.rng);
                let spin = (ctx.rng.random::<f32>() - 0.5) * 4.0;
                item.mark_floor(pos, vel, spin);
            }
        }

        log::debug!(
            "Kid {} {} book {} from shelf {}",
            self.id.0,
            if carried { "took" } else { "knocked down" },
            item_id.0,
            target.0
        );
        ctx.state.push_event(GameEvent::NpcStole {
            npc: self.id,
            container: target,
            item: item_id,
            carried,
        });
        self.steal_cooldown = profile.steal_cooldown;
        self.behavior = Behavior::Fleeing {
            fallback: ctx.tuning.npc.blind_flee_time,
        };
    }

    fn flee(&mut self, ctx: &mut NpcContext, fallback: f32, dt: f32) {
        let profile = *self.profile(ctx.tuning);

        let Some(player) = ctx.player_center else {
            // Nobody to run from: keep going straight for a moment
            self.body.vel = heading_vector(self.heading) * profile.flee_speed;
            self.move_and_collide(ctx, dt);
            let left = fallback - dt;
            if left <= 0.0 {
                self.leave_for_wandering();
            } else {
                self.behavior = Behavior::Fleeing { fallback: left };
            }
            return;
        };

        let release = profile.detection_range * ctx.tuning.npc.flee_release_factor;
        if self.body.center().distance(player) > release {
            self.leave_for_wandering();
            return;
        }

        let away = (self.body.center() - player).normalize_or_zero();
        if away != Vec2::ZERO {
            self.body.vel = away * profile.flee_speed;
            self.heading = heading_toward(Vec2::ZERO, away);
        }
        self.move_and_collide(ctx, dt);

        if self.carrying.is_some() && ctx.rng.random::<f32>() < ctx.tuning.npc.panic_drop_rate * dt {
            self.drop_carried(ctx);
        }
    }

    /// Move along `vel`, stopping and bouncing on each blocked axis
    fn move_and_collide(&mut self, ctx: &mut NpcContext, dt: f32) {
        let delta = self.body.vel * dt;
        let block = sweep_axes(
            &self.body.hitbox_rect(),
            delta,
            ctx.containers
                .iter()
                .filter(|c| c.body.solid)
                .map(|c| c.body.hitbox_rect()),
            Some(ctx.tuning.npc.collision_check_radius),
        );
        let wandering = self.behavior == Behavior::Wandering;

        if block.x {
            self.body.vel.x = -self.body.vel.x * 0.5;
            if wandering {
                self.heading = normalize_angle(PI - self.heading);
            }
        } else {
            self.body.pos.x += delta.x;
        }

        if block.y {
            self.body.vel.y = -self.body.vel.y * 0.5;
            if wandering {
                self.heading = normalize_angle(-self.heading);
            }
        } else {
            self.body.pos.y += delta.y;
        }

        self.body.clamp_to(&ctx.bounds);
    }

    /// Let go of the carried book near the kid's feet
    pub(crate) fn drop_carried(&mut self, ctx: &mut NpcContext) {
        let Some(id) = self.carrying.take() else {
            return;
        };
        self.carry_timer = 0.0;

        let Some(item) = ctx.items.get_mut(id.index()) else {
            return;
        };
        if item.state != ItemState::Held(Holder::Npc(self.id)) {
            return;
        }
        let (pos, vel) = drop_placement(&self.body.bounds(), ctx.containers, &ctx.bounds, ctx.rng);
        let spin = (ctx.rng.random::<f32>() - 0.5) * 4.0;
        item.mark_floor(pos, vel, spin);

        log::debug!("Kid {} dropped book {}", self.id.0, id.0);
        ctx.state
            .push_event(GameEvent::NpcDroppedItem { npc: self.id, item: id });
    }

    fn animate(&mut self, dt: f32) {
        let vel = self.body.vel;
        if vel.x.abs() > 0.1 {
            self.facing_right = vel.x > 0.0;
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
