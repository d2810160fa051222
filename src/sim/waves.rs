//! Kid admission schedule
//!
//! Elapsed minutes set both the headcount cap and how aggressive new kids
//! are. Admission runs on a fixed interval that only counts down while the
//! library has room.

use serde::{Deserialize, Serialize};

use super::state::{GameEvent, RunState};
use crate::tuning::WaveTuning;

/// Maximum kids allowed at `minutes` into the run
pub fn cap_for_minutes(tuning: &WaveTuning, minutes: f32) -> usize {
    if let Some(&(_, cap)) = tuning.cap_steps.iter().find(|(below, _)| minutes < *below) {
        return cap;
    }
    let (last_minutes, last_cap) = tuning.cap_steps.last().copied().unwrap_or((0.0, 0));
    let extra = (minutes - last_minutes).max(0.0).floor() as usize;
    last_cap + tuning.late_growth_per_minute * extra
}

/// Aggression tier for kids admitted at `minutes`
pub fn tier_for_minutes(tuning: &WaveTuning, minutes: f32) -> u8 {
    if minutes >= tuning.tier3_minutes {
        3
    } else if minutes >= tuning.tier2_minutes {
        2
    } else {
        1
    }
}

/// On-screen "more kids incoming" banner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapNotice {
    pub cap: usize,
    pub increase: usize,
    /// Seconds left on screen
    pub remaining: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveScheduler {
    /// Current headcount cap
    pub cap: usize,
    /// Seconds until the next admission
    pub spawn_timer: f32,
    pub notice: Option<CapNotice>,
}

impl WaveScheduler {
    pub fn new(tuning: &WaveTuning) -> Self {
        Self {
            cap: cap_for_minutes(tuning, 0.0),
            spawn_timer: tuning.spawn_interval,
            notice: None,
        }
    }

    /// Advance one tick
    ///
    /// Returns the tier of a kid to admit, if one is due. At or above the cap
    /// the timer holds its remaining value.
    pub fn update(
        &mut self,
        state: &mut RunState,
        npc_count: usize,
        tuning: &WaveTuning,
        dt: f32,
    ) -> Option<u8> {
        let minutes = state.minutes();

        let cap = cap_for_minutes(tuning, minutes);
        if cap > self.cap {
            let increase = cap - self.cap;
            self.cap = cap;
            self.notice = Some(CapNotice {
                cap,
                increase,
                remaining: tuning.notice_seconds,
            });
            log::info!("Wave cap raised to {cap} (+{increase})");
            state.push_event(GameEvent::WaveCapRaised { cap, increase });
        }

        if let Some(notice) = &mut self.notice {
            notice.remaining -= dt;
            if notice.remaining <= 0.0 {
                self.notice = None;
            }
        }

        if npc_count >= self.cap {
            return None;
        }

        self.spawn_timer -= dt;
        if self.spawn_timer > 0.0 {
            return None;
        }
        self.spawn_timer = tuning.spawn_interval;
        Some(tier_for_minutes(tuning, minutes))
    }
}
