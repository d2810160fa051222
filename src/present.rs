//! Frame snapshots for the presentation layer
//!
//! A renderer gets one read-only `FrameSnapshot` per real frame. Positions
//! are already blended by the timestep's interpolation factor.

use glam::Vec2;
use serde::Serialize;

use crate::sim::{
    CapNotice, Color, ContainerId, Facing, ItemId, ItemState, NpcId, Run, RunOutcome,
};

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub facing: Facing,
    pub anim_frame: u8,
    pub sprinting: bool,
    pub winded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct KidView {
    pub id: NpcId,
    pub pos: Vec2,
    pub tier: u8,
    pub behavior: &'static str,
    pub carrying: bool,
    pub facing_right: bool,
    pub anim_frame: u8,
    pub voice: u8,
}

/// Books in play; shelved books are drawn from their shelf's count
#[derive(Debug, Clone, Serialize)]
pub struct BookView {
    pub id: ItemId,
    pub pos: Vec2,
    pub color: Color,
    pub rgb: u32,
    pub rotation: f32,
    pub held: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShelfView {
    pub id: ContainerId,
    pub pos: Vec2,
    pub color: Color,
    pub rgb: u32,
    pub count: usize,
    pub capacity: usize,
}

/// Numbers the HUD shows
#[derive(Debug, Clone, Serialize)]
pub struct Hud {
    pub elapsed: f32,
    pub remaining: f32,
    pub chaos: f32,
    pub chaos_fraction: f32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub stamina: f32,
    pub max_stamina: f32,
    pub carried: usize,
    pub carry_slots: usize,
    pub kids: usize,
    pub kid_cap: usize,
    pub pending_upgrades: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub alpha: f32,
    pub paused: bool,
    pub player: PlayerView,
    pub kids: Vec<KidView>,
    pub books: Vec<BookView>,
    pub shelves: Vec<ShelfView>,
    pub hud: Hud,
    pub notice: Option<CapNotice>,
    pub outcome: Option<RunOutcome>,
}

impl FrameSnapshot {
    /// Capture the run as it should look `alpha` of the way into the next tick
    pub fn capture(run: &Run, alpha: f32) -> Self {
        let world = &run.world;
        let state = &run.state;
        let player = &world.player;

        let kids = world
            .npcs
            .iter()
            .map(|npc| KidView {
                id: npc.id,
                pos: npc.body.interpolated(alpha),
                tier: npc.tier,
                behavior: npc.behavior.name(),
                carrying: npc.carrying.is_some(),
                facing_right: npc.facing_right,
                anim_frame: npc.anim_frame,
                voice: npc.voice,
            })
            .collect();

        let books = world
            .items
            .iter()
            .filter(|item| !item.is_shelved())
            .map(|item| BookView {
                id: item.id,
                pos: item.body.interpolated(alpha),
                color: item.color,
                rgb: item.color.rgb(),
                rotation: item.rotation,
                held: matches!(item.state, ItemState::Held(_)),
            })
            .collect();

        let shelves = world
            .containers
            .iter()
            .map(|c| ShelfView {
                id: c.id,
                pos: c.body.pos,
                color: c.color,
                rgb: c.color.rgb(),
                count: c.count(),
                capacity: c.capacity(),
            })
            .collect();

        Self {
            tick: state.tick,
            alpha,
            paused: state.paused,
            player: PlayerView {
                pos: player.body.interpolated(alpha),
                facing: player.facing,
                anim_frame: player.anim_frame,
                sprinting: player.sprinting,
                winded: player.winded,
            },
            kids,
            books,
            shelves,
            hud: Hud {
                elapsed: state.elapsed,
                remaining: state.remaining(),
                chaos: state.chaos,
                chaos_fraction: state.chaos_fraction(),
                level: state.level,
                xp: state.xp,
                xp_to_next: state.xp_to_next,
                stamina: player.stats.stamina,
                max_stamina: player.stats.max_stamina,
                carried: player.carried.len(),
                carry_slots: player.stats.carry_slots,
                kids: world.npcs.len(),
                kid_cap: run.waves.cap,
                pending_upgrades: state.pending_upgrades,
            },
            notice: run.waves.notice,
            outcome: state.outcome,
        }
    }
}

/// Rendering backend
pub trait Presenter {
    fn present(&mut self, frame: &FrameSnapshot);
}

/// Logs a HUD line every `interval` frames (headless runs)
#[derive(Debug, Clone)]
pub struct LogPresenter {
    interval: u64,
    frames: u64,
}

impl LogPresenter {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Presenter for LogPresenter {
    fn present(&mut self, frame: &FrameSnapshot) {
        self.frames += 1;
        if self.frames % self.interval != 0 {
            return;
        }
        let hud = &frame.hud;
        log::debug!(
            "t={:.0}s chaos={:.1} lvl={} kids={}/{} carried={}/{} loose={}",
            hud.elapsed,
            hud.chaos,
            hud.level,
            hud.kids,
            hud.kid_cap,
            hud.carried,
            hud.carry_slots,
            frame.books.iter().filter(|b| !b.held).count()
        );
        if let Some(notice) = frame.notice {
            log::debug!("More kids incoming: cap {} (+{})", notice.cap, notice.increase);
        }
    }
}
