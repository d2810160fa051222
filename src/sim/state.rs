//! Run state and the event stream
//!
//! `RunState` holds everything about a run that is not an entity: the clock,
//! the chaos meter, progression and the tally shown on the game-over screen.
//! Components receive it by `&mut` and report what happened through `events`.

use serde::{Deserialize, Serialize};

use super::ids::{ContainerId, ItemId, NpcId};
use crate::tuning::Tuning;

/// Undrained events kept before the oldest are thrown away
pub const MAX_QUEUED_EVENTS: usize = 4096;

/// Why a run was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossReason {
    /// The chaos meter filled up
    Chaos,
}

impl LossReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossReason::Chaos => "chaos",
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Won,
    Lost(LossReason),
}

/// Cumulative tally for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Floor pickups plus snatches
    pub items_collected: u32,
    pub items_returned: u32,
    pub npcs_repelled: u32,
    /// Stale references cleared by the integrity audit
    pub integrity_repairs: u32,
}

/// Things that happened during a tick, for audio/UI/logging
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ItemPickedUp {
        item: ItemId,
    },
    ItemSnatched {
        item: ItemId,
        npc: NpcId,
    },
    ItemReturned {
        item: ItemId,
        container: ContainerId,
    },
    XpGained {
        amount: u32,
    },
    LevelUp {
        level: u32,
    },
    NpcSpawned {
        npc: NpcId,
        tier: u8,
    },
    /// A kid started running from the player (once per flee session)
    NpcFled {
        npc: NpcId,
        voice: u8,
    },
    /// A kid pulled a book off a shelf; `carried` is false when it was knocked
    /// to the floor instead
    NpcStole {
        npc: NpcId,
        container: ContainerId,
        item: ItemId,
        carried: bool,
    },
    NpcDroppedItem {
        npc: NpcId,
        item: ItemId,
    },
    WaveCapRaised {
        cap: usize,
        increase: usize,
    },
    OutOfBreath,
    CaughtBreath,
    RunWon,
    RunLost {
        reason: LossReason,
    },
}

/// Non-entity state for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Seconds of simulated play
    pub elapsed: f32,
    /// Survive this long to win
    pub target_time: f32,
    pub chaos: f32,
    pub max_chaos: f32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    /// While set, ticks do nothing
    pub paused: bool,
    /// Level-ups whose upgrade has not been picked yet
    pub pending_upgrades: u32,
    pub stats: Stats,
    /// Ticks executed (paused ticks are not counted)
    pub tick: u64,
    pub outcome: Option<RunOutcome>,
    /// Events raised since the last drain. Callers are expected to drain
    /// every frame; past `MAX_QUEUED_EVENTS` the oldest half is discarded.
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl RunState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            elapsed: 0.0,
            target_time: tuning.world.target_time,
            chaos: 0.0,
            max_chaos: tuning.world.max_chaos,
            level: 1,
            xp: 0,
            xp_to_next: tuning.economy.base_xp_to_next,
            paused: false,
            pending_upgrades: 0,
            stats: Stats::default(),
            tick: 0,
            outcome: None,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn minutes(&self) -> f32 {
        self.elapsed / 60.0
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Seconds left before the run is won
    pub fn remaining(&self) -> f32 {
        (self.target_time - self.elapsed).max(0.0)
    }

    /// Chaos as a fraction of the maximum
    pub fn chaos_fraction(&self) -> f32 {
        (self.chaos / self.max_chaos).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn push_event(&mut self, event: GameEvent) {
        if self.events.len() >= MAX_QUEUED_EVENTS {
            let stale = MAX_QUEUED_EVENTS / 2;
            self.events.drain(..stale);
            log::warn!("Event queue not drained, discarded {stale} old events");
        }
        self.events.push(event);
    }

    /// Take the events raised so far
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Lower chaos by a player action's relief, never below zero
    pub fn relieve(&mut self, amount: f32) {
        self.chaos = (self.chaos - amount).max(0.0);
    }

    pub(crate) fn finish(&mut self, outcome: RunOutcome) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        match outcome {
            RunOutcome::Won => {
                log::info!("Run won after {:.0}s", self.elapsed);
                self.push_event(GameEvent::RunWon);
            }
            RunOutcome::Lost(reason) => {
                log::info!(
                    "Run lost ({}) after {:.0}s",
                    reason.as_str(),
                    self.elapsed
                );
                self.push_event(GameEvent::RunLost { reason });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_defaults() {
        let state = RunState::new(&Tuning::default());
        assert_eq!(state.level, 1);
        assert_eq!(state.xp_to_next, 100);
        assert_eq!(state.max_chaos, 100.0);
        assert_eq!(state.target_time, 1800.0);
        assert!(!state.is_over());
    }

    #[test]
    fn test_relieve_floors_at_zero() {
        let mut state = RunState::new(&Tuning::default());
        state.chaos = 0.3;
        state.relieve(0.5);
        assert_eq!(state.chaos, 0.0);
    }

    #[test]
    fn test_finish_only_once() {
        let mut state = RunState::new(&Tuning::default());
        state.finish(RunOutcome::Lost(LossReason::Chaos));
        state.finish(RunOutcome::Won);
        assert_eq!(state.outcome, Some(RunOutcome::Lost(LossReason::Chaos)));
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::RunLost {
                reason: LossReason::Chaos
            }]
        );
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_undrained_events_are_bounded() {
        let mut state = RunState::new(&Tuning::default());
        for amount in 0..=MAX_QUEUED_EVENTS as u32 {
            state.push_event(GameEvent::XpGained { amount });
        }
        assert_eq!(state.events.len(), MAX_QUEUED_EVENTS / 2 + 1);
        assert_eq!(
            state.events.first(),
            Some(&GameEvent::XpGained {
                amount: (MAX_QUEUED_EVENTS / 2) as u32
            })
        );
        assert_eq!(
            state.events.last(),
            Some(&GameEvent::XpGained {
                amount: MAX_QUEUED_EVENTS as u32
            })
        );
    }
}
