//! Demo/idle mode - the game plays itself
//!
//! Produces the same `TickInput` a keyboard would, so a run driven by the
//! autopilot goes through exactly the same code paths as a human run.

use glam::Vec2;

use super::item::{Holder, ItemState};
use super::tick::{Run, TickInput};

/// Sprint only for long hauls with stamina to spare
const SPRINT_DISTANCE: f32 = 200.0;
const SPRINT_RESERVE: f32 = 30.0;
/// Close enough to a target point to stop steering
const ARRIVE_DISTANCE: f32 = 4.0;

/// Pick this tick's input for the current run state
pub fn autopilot(run: &Run) -> TickInput {
    let mut input = TickInput::default();
    let world = &run.world;
    let player = &world.player;
    let here = player.body.center();

    // Upgrade choices: always take the first card
    if run.state.pending_upgrades > 0 {
        input.choose = Some(0);
    }

    let target = if player.has_free_slot() {
        nearest_loose_book(run, here).or_else(|| nearest_return_shelf(run, here))
    } else {
        nearest_return_shelf(run, here)
    };

    if let Some(target) = target {
        let to = target - here;
        let dist = to.length();
        if dist > ARRIVE_DISTANCE {
            input.movement = to / dist;
            input.sprint = dist > SPRINT_DISTANCE && player.stats.stamina > SPRINT_RESERVE;
        }
    }
    input
}

/// Closest book on the floor or in a kid's hands
fn nearest_loose_book(run: &Run, here: Vec2) -> Option<Vec2> {
    let world = &run.world;
    world
        .items
        .iter()
        .filter_map(|item| match item.state {
            ItemState::OnFloor => Some(item.body.center()),
            ItemState::Held(Holder::Npc(npc)) => {
                world.npc(npc).map(|n| n.body.center())
            }
            _ => None,
        })
        .min_by(|a, b| a.distance(here).total_cmp(&b.distance(here)))
}

/// Side of the closest shelf with room for something we carry
fn nearest_return_shelf(run: &Run, here: Vec2) -> Option<Vec2> {
    let world = &run.world;
    let player = &world.player;
    world
        .containers
        .iter()
        .filter(|c| {
            c.has_free_slot()
                && player
                    .carried
                    .iter()
                    .any(|id| world.item(*id).is_some_and(|item| item.color == c.color))
        })
        .map(|c| {
            // Aim beside the shelf, on whichever side we are on
            let b = c.body.bounds();
            let x = if here.x < b.center().x {
                b.left() - 20.0
            } else {
                b.right() + 20.0
            };
            Vec2::new(x, b.center().y)
        })
        .min_by(|a, b| a.distance(here).total_cmp(&b.distance(here)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    #[test]
    fn test_idle_when_nothing_to_do() {
        let mut tuning = Tuning::default();
        tuning.waves.initial_kids = 0;
        let run = Run::new(1, tuning);
        let input = autopilot(&run);
        assert_eq!(input.movement, Vec2::ZERO);
        assert!(!input.sprint);
    }

    #[test]
    fn test_heads_for_floor_book() {
        let mut tuning = Tuning::default();
        tuning.waves.initial_kids = 0;
        let mut run = Run::new(1, tuning);
        let world = &mut run.world;
        world.containers[5].remove_at(0, &mut world.items);
        let input = autopilot(&run);
        assert!(input.movement.length() > 0.99);
    }

    #[test]
    fn test_heads_for_matching_shelf_when_full() {
        let mut tuning = Tuning::default();
        tuning.waves.initial_kids = 0;
        tuning.player.carry_slots = 1;
        let mut run = Run::new(1, tuning);
        let world = &mut run.world;
        let id = world.containers[3].remove_at(0, &mut world.items).unwrap();
        world.items[id.index()].mark_held(Holder::Player);
        world.player.carried.push(id);

        let input = autopilot(&run);
        let shelf = run.world.containers[3].body.center();
        let here = run.world.player.body.center();
        // Moving roughly toward the only shelf with room
        assert!(input.movement.dot((shelf - here).normalize()) > 0.5);
    }
}
