//! Chaos meter and experience
//!
//! Chaos is derived from where the books are: every book on the floor or in a
//! kid's hands adds a little each second. It is recomputed from the item
//! distribution every tick rather than tracked by the actions that move books.

use super::item::Item;
use super::player::Player;
use super::state::{GameEvent, RunState};
use crate::tuning::EconomyTuning;

/// Books feeding chaos right now
pub fn contested_count(items: &[Item]) -> usize {
    items.iter().filter(|item| item.is_contested()).count()
}

/// Chaos per contested book per second at `minutes` into the run
pub fn chaos_rate(tuning: &EconomyTuning, minutes: f32) -> f32 {
    if minutes < tuning.early_until_minutes {
        tuning.early_rate
    } else if minutes < tuning.mid_until_minutes {
        tuning.mid_rate
    } else {
        tuning.late_rate
    }
}

/// Integrate chaos over one tick
///
/// `dampening` is the player's chaos dampening in percent. Chaos only decays
/// when nothing is contested.
pub fn update_chaos(
    state: &mut RunState,
    items: &[Item],
    dampening: f32,
    tuning: &EconomyTuning,
    dt: f32,
) {
    let contested = contested_count(items);

    if contested > 0 {
        let rate = contested as f32 * chaos_rate(tuning, state.minutes());
        let multiplier = (1.0 - dampening / 100.0).max(0.0);
        state.chaos += rate * dt * multiplier;
    } else if state.chaos > 0.0 {
        state.chaos -= tuning.passive_decay * dt;
    }

    state.chaos = state.chaos.clamp(0.0, state.max_chaos);
}

/// XP needed to go from `level` to the next one
pub fn xp_to_next(tuning: &EconomyTuning, level: u32) -> u32 {
    let exponent = level.saturating_sub(1) as i32;
    (tuning.base_xp_to_next as f32 * tuning.xp_growth.powi(exponent)).floor() as u32
}

/// Grant XP for a player action and resolve any level-ups
///
/// Returns the XP actually credited after multipliers.
pub fn award_xp(
    state: &mut RunState,
    player: &mut Player,
    base: u32,
    tuning: &EconomyTuning,
) -> u32 {
    let mut multiplier = player.stats.xp_multiplier;
    if state.elapsed < tuning.early_xp_seconds {
        multiplier *= tuning.early_xp_multiplier;
    }
    let amount = (base as f32 * multiplier).floor() as u32;
    if amount == 0 {
        return 0;
    }
    state.xp += amount;
    state.push_event(GameEvent::XpGained { amount });

    while state.xp_to_next > 0 && state.xp >= state.xp_to_next {
        state.xp -= state.xp_to_next;
        state.level += 1;
        state.xp_to_next = xp_to_next(tuning, state.level);
        player.stats.stamina = player.stats.max_stamina;
        state.pending_upgrades += 1;
        log::info!(
            "Level up: {} (next at {} xp)",
            state.level,
            state.xp_to_next
        );
        state.push_event(GameEvent::LevelUp { level: state.level });
    }

    amount
}
