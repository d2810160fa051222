//! Books and where they are

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, overlaps};
use super::entity::Body;
use super::ids::{ContainerId, ItemId, NpcId};
use crate::consts::*;

/// Book/shelf color tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl Color {
    /// Fixed palette, in distribution order
    pub const PALETTE: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Purple,
        Color::Orange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Purple => "purple",
            Color::Orange => "orange",
        }
    }

    /// Display color (0xRRGGBB) for renderers
    pub fn rgb(&self) -> u32 {
        match self {
            Color::Red => 0xff4444,
            Color::Blue => 0x4444ff,
            Color::Green => 0x44ff44,
            Color::Yellow => 0xffff44,
            Color::Purple => 0xff44ff,
            Color::Orange => 0xff8844,
        }
    }
}

/// Who is carrying a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holder {
    Player,
    Npc(NpcId),
}

/// Exactly one of these holds for every book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemState {
    OnFloor,
    Held(Holder),
    Shelved(ContainerId),
}

/// A book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub color: Color,
    pub body: Body,
    pub state: ItemState,
    /// Visual rotation (radians) and its decaying spin
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub spin: f32,
}

impl Item {
    pub fn new(id: ItemId, color: Color, pos: Vec2) -> Self {
        Self {
            id,
            color,
            body: Body::new(pos, Vec2::new(BOOK_WIDTH, BOOK_HEIGHT))
                .with_hitbox(BOOK_HITBOX_OFFSET, BOOK_HITBOX_SIZE),
            state: ItemState::OnFloor,
            rotation: 0.0,
            spin: 0.0,
        }
    }

    #[inline]
    pub fn is_on_floor(&self) -> bool {
        self.state == ItemState::OnFloor
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        matches!(self.state, ItemState::Held(_))
    }

    #[inline]
    pub fn is_shelved(&self) -> bool {
        matches!(self.state, ItemState::Shelved(_))
    }

    /// On the floor or in a kid's hands - the books that feed chaos
    pub fn is_contested(&self) -> bool {
        matches!(
            self.state,
            ItemState::OnFloor | ItemState::Held(Holder::Npc(_))
        )
    }

    /// Owner bookkeeping is the caller's job; this only updates the book side
    pub(crate) fn mark_held(&mut self, holder: Holder) {
        self.state = ItemState::Held(holder);
        self.body.vel = Vec2::ZERO;
        self.rotation = 0.0;
        self.spin = 0.0;
        self.body.visible = true;
    }

    pub(crate) fn mark_shelved(&mut self, container: ContainerId, slot_pos: Vec2) {
        self.state = ItemState::Shelved(container);
        self.body.pos = slot_pos;
        self.body.prev_pos = slot_pos;
        self.body.vel = Vec2::ZERO;
        self.rotation = 0.0;
        self.spin = 0.0;
        self.body.visible = true;
    }

    pub(crate) fn mark_floor(&mut self, pos: Vec2, vel: Vec2, spin: f32) {
        self.state = ItemState::OnFloor;
        self.body.pos = pos;
        self.body.vel = vel;
        self.spin = spin;
        self.body.visible = true;
    }

    /// Per-tick update
    ///
    /// Held books ride above their holder (`anchor` is the holder's visual
    /// box). Shelved books stay in their slot. Floor books slide with friction
    /// and bounce off shelves.
    pub fn update(
        &mut self,
        dt: f32,
        anchor: Option<Rect>,
        solids: &[Rect],
        area: &Rect,
        rng: &mut Pcg32,
    ) {
        self.body.begin_tick();

        match self.state {
            ItemState::Held(_) => {
                if let Some(holder) = anchor {
                    self.body.pos = Vec2::new(
                        holder.center().x - self.body.size.x / 2.0,
                        holder.top() - self.body.size.y - 4.0,
                    );
                }
            }
            ItemState::Shelved(_) => {}
            ItemState::OnFloor => self.slide(dt, solids, area, rng),
        }
    }

    fn slide(&mut self, dt: f32, solids: &[Rect], area: &Rect, rng: &mut Pcg32) {
        if self.body.vel == Vec2::ZERO && self.spin == 0.0 {
            return;
        }

        self.body.vel *= BOOK_FRICTION;
        let old = self.body.pos;
        self.body.pos += self.body.vel * dt;

        let bounds = self.body.bounds();
        if solids.iter().any(|shelf| overlaps(&bounds, shelf)) {
            // Back out and kick off in the other direction
            self.body.pos = old;
            self.body.vel = -self.body.vel * 0.5
                + Vec2::new(
                    (rng.random::<f32>() - 0.5) * 20.0,
                    (rng.random::<f32>() - 0.5) * 20.0,
                );
        }
        self.body.clamp_to(area);

        self.rotation += self.spin * dt;
        self.spin *= 0.95;
        if self.spin.abs() < 0.01 {
            self.spin = 0.0;
        }

        if self.body.vel.x.abs() < BOOK_REST_SPEED && self.body.vel.y.abs() < BOOK_REST_SPEED {
            self.body.vel = Vec2::ZERO;
        }
    }
}
