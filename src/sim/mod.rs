//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by arena index)
//! - No rendering, audio or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod container;
pub mod economy;
pub mod entity;
pub mod ids;
pub mod item;
pub mod layout;
pub mod npc;
pub mod player;
pub mod state;
pub mod tick;
pub mod upgrades;
pub mod waves;
pub mod world;

pub use autopilot::autopilot;
pub use collision::Rect;
pub use container::Container;
pub use entity::Body;
pub use ids::{ContainerId, ItemId, NpcId};
pub use item::{Color, Holder, Item, ItemState};
pub use layout::{LevelLayout, LibraryGrid, ShelfPlan};
pub use npc::{Behavior, Npc};
pub use player::{Facing, Player, PlayerStats};
pub use state::{GameEvent, LossReason, RunOutcome, RunState, Stats};
pub use tick::{Run, TickInput, tick};
pub use upgrades::Upgrade;
pub use waves::{CapNotice, WaveScheduler};
pub use world::{IntegrityIssue, World};
