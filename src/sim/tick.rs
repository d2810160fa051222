//! Fixed timestep simulation tick
//!
//! Core game loop that advances a run deterministically.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::economy::update_chaos;
use super::item::{Holder, ItemState};
use super::layout::{LevelLayout, LibraryGrid};
use super::npc::NpcContext;
use super::player::{pickup_items, return_items, snatch_items};
use super::state::{GameEvent, LossReason, RunOutcome, RunState};
use super::upgrades::{self, Upgrade};
use super::waves::WaveScheduler;
use super::world::{IntegrityIssue, World};
use crate::consts::*;
use crate::tuning::Tuning;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Movement intent, unit length or shorter
    pub movement: Vec2,
    /// Sprint held
    pub sprint: bool,
    /// Action button held (menus, restart)
    pub interact: bool,
    /// Pause toggle (one-shot)
    pub pause: bool,
    /// Menu confirm (one-shot)
    pub confirm: bool,
    /// Menu navigation (one-shot)
    pub nav_left: bool,
    pub nav_right: bool,
    /// Direct pick of a menu entry (pointer/number key)
    pub choose: Option<usize>,
}

impl TickInput {
    /// Clear the edge-triggered flags once a step has seen them
    pub fn clear_one_shots(&mut self) {
        self.pause = false;
        self.confirm = false;
        self.nav_left = false;
        self.nav_right = false;
        self.choose = None;
    }
}

/// One playthrough: its world, state, difficulty schedule and RNG
#[derive(Debug, Clone)]
pub struct Run {
    pub seed: u64,
    pub tuning: Tuning,
    pub world: World,
    pub state: RunState,
    pub waves: WaveScheduler,
    rng: Pcg32,
}

impl Run {
    /// Start a run in the default library
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self::with_layout(seed, tuning, &LibraryGrid::default())
    }

    pub fn with_layout(seed: u64, tuning: Tuning, layout: &dyn LevelLayout) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut world = World::build(&tuning, layout, &mut rng);
        let mut state = RunState::new(&tuning);
        let waves = WaveScheduler::new(&tuning.waves);

        for _ in 0..tuning.waves.initial_kids {
            spawn_kid(&mut world, &mut state, 1, &mut rng, &tuning);
        }
        log::info!(
            "Run started (seed {seed}, {} kids, cap {})",
            world.npcs.len(),
            waves.cap
        );

        Self {
            seed,
            tuning,
            world,
            state,
            waves,
            rng,
        }
    }

    /// Advance one fixed step. Raised events queue in `state.events` until
    /// `drain_events` is called.
    pub fn step(&mut self, input: &TickInput, dt: f32) {
        tick(self, input, dt);
    }

    /// Run the integrity audit now
    pub fn audit(&mut self) -> Vec<IntegrityIssue> {
        audit(&mut self.world, &mut self.state)
    }

    /// Draw upgrade cards with the run RNG
    pub fn offer_upgrades(&mut self, count: usize) -> Vec<Upgrade> {
        upgrades::offer(&mut self.rng, &self.world.player, count)
    }

    /// Apply a chosen upgrade, settling one pending choice on success
    pub fn apply_upgrade(&mut self, upgrade: Upgrade) -> bool {
        let applied = upgrades::apply(upgrade, &mut self.world.player);
        if applied {
            self.state.pending_upgrades = self.state.pending_upgrades.saturating_sub(1);
        }
        applied
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }
}

/// Advance the run by one fixed timestep
///
/// Order: clock and win check, chaos and lose check, entities (player,
/// shelves, books, kids), kid admission, then pickups, snatches and returns.
pub fn tick(run: &mut Run, input: &TickInput, dt: f32) {
    let Run {
        tuning,
        world,
        state,
        waves,
        rng,
        ..
    } = run;

    if state.paused || state.is_over() {
        return;
    }
    state.tick += 1;

    state.elapsed += dt;
    if state.elapsed >= state.target_time {
        state.finish(RunOutcome::Won);
        return;
    }

    update_chaos(
        state,
        &world.items,
        world.player.stats.chaos_dampening,
        &tuning.economy,
        dt,
    );
    if state.chaos >= state.max_chaos {
        state.finish(RunOutcome::Lost(LossReason::Chaos));
        return;
    }

    let bounds = world.bounds;
    world.player.update(
        input.movement,
        input.sprint,
        &world.solids,
        &bounds,
        &tuning.player,
        state,
        dt,
    );
    for container in &mut world.containers {
        container.body.begin_tick();
    }
    update_items(world, rng, dt);
    update_npcs(world, state, rng, tuning, dt);

    if let Some(tier) = waves.update(state, world.npcs.len(), &tuning.waves, dt) {
        spawn_kid(world, state, tier, rng, tuning);
    }

    pickup_items(world, state, tuning);
    snatch_items(world, state, tuning);
    return_items(world, state, tuning);

    if state.tick % AUDIT_INTERVAL_TICKS == 0 {
        audit(world, state);
    }
}

fn update_items(world: &mut World, rng: &mut Pcg32, dt: f32) {
    let World {
        bounds,
        player,
        npcs,
        items,
        solids,
        ..
    } = world;

    for item in items.iter_mut() {
        let anchor = match item.state {
            ItemState::Held(Holder::Player) => Some(player.body.bounds()),
            ItemState::Held(Holder::Npc(id)) => npcs.get(id.index()).map(|n| n.body.bounds()),
            _ => None,
        };
        item.update(dt, anchor, solids, bounds, rng);
    }
}

fn update_npcs(
    world: &mut World,
    state: &mut RunState,
    rng: &mut Pcg32,
    tuning: &Tuning,
    dt: f32,
) {
    let World {
        bounds,
        player,
        npcs,
        items,
        containers,
        ..
    } = world;

    let mut ctx = NpcContext {
        items,
        containers,
        player_center: player.body.active.then(|| player.body.center()),
        bounds: *bounds,
        rng,
        state,
        tuning,
    };
    for npc in npcs.iter_mut() {
        npc.update(&mut ctx, dt);
    }
}

fn spawn_kid(world: &mut World, state: &mut RunState, tier: u8, rng: &mut Pcg32, tuning: &Tuning) {
    let points = &tuning.world.spawn_points;
    if points.is_empty() {
        return;
    }
    let (x, y) = points[rng.random_range(0..points.len())];
    let npc = world.spawn_npc(Vec2::new(x, y), tier, rng);
    log::debug!(
        "Kid {} (tier {tier}) entered at ({x}, {y}); {} in the library",
        npc.0,
        world.npcs.len()
    );
    state.push_event(GameEvent::NpcSpawned { npc, tier });
}

fn audit(world: &mut World, state: &mut RunState) -> Vec<IntegrityIssue> {
    let issues = world.audit();
    state.stats.integrity_repairs += issues.len() as u32;
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::autopilot::autopilot;
    use crate::sim::ids::{ContainerId, ItemId};

    /// A run with no kids, so only the player moves books
    fn quiet_run() -> Run {
        let mut tuning = Tuning::default();
        tuning.waves.initial_kids = 0;
        Run::new(7, tuning)
    }

    /// Take a book off shelf `container` and put it on the floor at `center`
    fn loose_book(run: &mut Run, container: usize, center: Vec2) -> ItemId {
        let world = &mut run.world;
        let id = world.containers[container]
            .remove_at(0, &mut world.items)
            .expect("shelf starts full");
        world.items[id.index()].body.set_center(center);
        id
    }

    #[test]
    fn test_initial_kids_spawn_at_entry_points() {
        let run = Run::new(3, Tuning::default());
        assert_eq!(run.world.npcs.len(), 2);
        for npc in &run.world.npcs {
            assert_eq!(npc.tier, 1);
            let p = (npc.body.pos.x, npc.body.pos.y);
            assert!(run.tuning.world.spawn_points.contains(&p));
        }
    }

    #[test]
    fn test_pickup_within_radius() {
        let mut run = quiet_run();
        run.state.chaos = 10.0;
        let center = run.world.player.body.center() + Vec2::new(10.0, 0.0);
        let id = loose_book(&mut run, 0, center);

        tick(&mut run, &TickInput::default(), SIM_DT);

        assert_eq!(run.world.player.carried, vec![id]);
        assert_eq!(run.world.items[id.index()].state, ItemState::Held(Holder::Player));
        assert_eq!(run.state.stats.items_collected, 1);
        // 1 contested book for one tick, then the pickup relief
        let expected = 10.0 + 0.05 * SIM_DT - 0.5;
        assert!((run.state.chaos - expected).abs() < 1e-4);
        // 5 XP with the opening 1.5x boost, floored
        assert_eq!(run.state.xp, 7);
        assert!(run
            .state
            .events
            .contains(&GameEvent::ItemPickedUp { item: id }));
    }

    #[test]
    fn test_pickup_relief_floors_at_zero() {
        let mut run = quiet_run();
        let center = run.world.player.body.center() + Vec2::new(10.0, 0.0);
        loose_book(&mut run, 0, center);
        tick(&mut run, &TickInput::default(), SIM_DT);
        assert_eq!(run.state.chaos, 0.0);
    }

    #[test]
    fn test_pickup_respects_carry_slots() {
        let mut run = quiet_run();
        run.world.player.stats.carry_slots = 1;
        let center = run.world.player.body.center();
        loose_book(&mut run, 0, center + Vec2::new(5.0, 0.0));
        loose_book(&mut run, 1, center + Vec2::new(-5.0, 0.0));
        tick(&mut run, &TickInput::default(), SIM_DT);
        assert_eq!(run.world.player.carried.len(), 1);
        assert_eq!(run.world.item_census().0, 1);
    }

    #[test]
    fn test_return_refills_shelf() {
        let mut run = quiet_run();
        let id = {
            let world = &mut run.world;
            let id = world.containers[0]
                .remove_at(0, &mut world.items)
                .expect("shelf starts full");
            world.items[id.index()].mark_held(Holder::Player);
            world.player.carried.push(id);
            id
        };
        // Shelf 0 is at (100, 100); stand 10 px to its left
        run.world.player.body.pos = Vec2::new(100.0 - PLAYER_WIDTH - 10.0, 110.0);

        tick(&mut run, &TickInput::default(), SIM_DT);

        assert_eq!(run.world.containers[0].count(), 6);
        assert!(run.world.player.carried.is_empty());
        assert_eq!(run.state.stats.items_returned, 1);
        assert_eq!(
            run.world.items[id.index()].state,
            ItemState::Shelved(ContainerId(0))
        );
        assert!(run.audit().is_empty());
    }

    #[test]
    fn test_return_needs_matching_color() {
        let mut run = quiet_run();
        let color0 = run.world.containers[0].color;
        let other = run
            .world
            .containers
            .iter()
            .position(|c| c.color != color0)
            .expect("more than one color");
        let id = {
            let world = &mut run.world;
            let id = world.containers[other]
                .remove_at(0, &mut world.items)
                .expect("shelf starts full");
            world.items[id.index()].mark_held(Holder::Player);
            world.player.carried.push(id);
            world.containers[0].remove_at(0, &mut world.items);
            id
        };
        run.world.player.body.pos = Vec2::new(100.0 - PLAYER_WIDTH - 10.0, 110.0);
        tick(&mut run, &TickInput::default(), SIM_DT);
        assert_eq!(run.world.player.carried, vec![id]);
    }

    #[test]
    fn test_snatch_from_kid() {
        let mut run = quiet_run();
        run.tuning.npc.panic_drop_rate = 0.0;
        let here = run.world.player.body.center();
        let npc = {
            let world = &mut run.world;
            let mut rng = Pcg32::seed_from_u64(0);
            let npc = world.spawn_npc(Vec2::ZERO, 1, &mut rng);
            world.npcs[npc.index()].body.set_center(here - Vec2::new(40.0, 0.0));
            npc
        };
        let id = {
            let world = &mut run.world;
            let id = world.containers[0]
                .remove_at(0, &mut world.items)
                .expect("shelf starts full");
            world.items[id.index()].mark_held(Holder::Npc(npc));
            world.npcs[npc.index()].carrying = Some(id);
            world.npcs[npc.index()].carry_limit = 100.0;
            id
        };

        tick(&mut run, &TickInput::default(), SIM_DT);

        let kid = &run.world.npcs[npc.index()];
        assert!(kid.carrying.is_none());
        assert!(kid.is_fleeing());
        assert_eq!(run.world.player.carried, vec![id]);
        assert_eq!(run.state.stats.items_collected, 1);
        assert!(run
            .state
            .events
            .contains(&GameEvent::ItemSnatched { item: id, npc }));
        assert!(run.audit().is_empty());
    }

    #[test]
    fn test_cap_raise_event_fires_once() {
        let mut run = quiet_run();
        run.waves.cap = 10;
        run.state.elapsed = 11.0 * 60.0 - SIM_DT / 2.0;
        tick(&mut run, &TickInput::default(), SIM_DT);
        tick(&mut run, &TickInput::default(), SIM_DT);
        let raised: Vec<_> = run
            .state
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::WaveCapRaised { cap, increase } => Some((*cap, *increase)),
                _ => None,
            })
            .collect();
        assert_eq!(raised, vec![(12, 2)]);
    }

    #[test]
    fn test_chaos_maxed_ends_run_before_anything_moves() {
        let mut run = Run::new(9, Tuning::default());
        let center = run.world.player.body.center() + Vec2::new(300.0, 300.0);
        loose_book(&mut run, 3, center);
        run.state.chaos = run.state.max_chaos - 0.0005;

        let player_before = run.world.player.body.pos;
        let kids_before: Vec<Vec2> = run.world.npcs.iter().map(|n| n.body.pos).collect();
        let input = TickInput {
            movement: Vec2::X,
            ..TickInput::default()
        };
        tick(&mut run, &input, SIM_DT);

        assert_eq!(run.state.chaos, run.state.max_chaos);
        assert_eq!(run.state.outcome, Some(RunOutcome::Lost(LossReason::Chaos)));
        assert_eq!(run.world.player.body.pos, player_before);
        let kids_after: Vec<Vec2> = run.world.npcs.iter().map(|n| n.body.pos).collect();
        assert_eq!(kids_after, kids_before);
        assert!(run.state.events.contains(&GameEvent::RunLost {
            reason: LossReason::Chaos
        }));

        // Nothing happens after the end
        let ticks = run.state.tick;
        tick(&mut run, &input, SIM_DT);
        assert_eq!(run.state.tick, ticks);
    }

    #[test]
    fn test_surviving_the_clock_wins() {
        let mut run = quiet_run();
        run.state.elapsed = run.state.target_time - SIM_DT / 2.0;
        tick(&mut run, &TickInput::default(), SIM_DT);
        assert_eq!(run.state.outcome, Some(RunOutcome::Won));
    }

    #[test]
    fn test_paused_tick_does_nothing() {
        let mut run = Run::new(4, Tuning::default());
        run.state.paused = true;
        let before = run.world.player.body.pos;
        let input = TickInput {
            movement: Vec2::X,
            ..TickInput::default()
        };
        tick(&mut run, &input, SIM_DT);
        assert_eq!(run.state.tick, 0);
        assert_eq!(run.state.elapsed, 0.0);
        assert_eq!(run.world.player.body.pos, before);
    }

    #[test]
    fn test_audit_runs_on_interval() {
        let mut run = quiet_run();
        // Corrupt a slot: the book goes to the floor behind its shelf's back
        run.world.items[40].mark_floor(Vec2::new(60.0, 980.0), Vec2::ZERO, 0.0);
        for _ in 0..AUDIT_INTERVAL_TICKS - 1 {
            tick(&mut run, &TickInput::default(), SIM_DT);
        }
        assert_eq!(run.state.stats.integrity_repairs, 0);
        tick(&mut run, &TickInput::default(), SIM_DT);
        assert_eq!(run.state.stats.integrity_repairs, 1);
    }

    #[test]
    fn test_apply_upgrade_settles_pending_choice() {
        let mut run = quiet_run();
        run.state.pending_upgrades = 1;
        let offered = run.offer_upgrades(3);
        assert_eq!(offered.len(), 3);
        assert!(run.apply_upgrade(offered[0]));
        assert_eq!(run.state.pending_upgrades, 0);
    }

    /// Drive a run with the autopilot, recording chaos and kid behavior
    fn trace(seed: u64, ticks: usize) -> (Vec<f32>, Vec<Vec<(&'static str, Vec2)>>) {
        let mut run = Run::new(seed, Tuning::default());
        let mut chaos = Vec::with_capacity(ticks);
        let mut kids = Vec::with_capacity(ticks);
        for _ in 0..ticks {
            let input = autopilot(&run);
            tick(&mut run, &input, SIM_DT);
            chaos.push(run.state.chaos);
            kids.push(
                run.world
                    .npcs
                    .iter()
                    .map(|n| (n.behavior.name(), n.body.pos))
                    .collect(),
            );
        }
        (chaos, kids)
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = trace(1234, 3_000);
        let b = trace(1234, 3_000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_long_play_keeps_ownership_consistent() {
        let mut run = Run::new(99, Tuning::default());
        let total = run.world.items.len();
        for _ in 0..20_000 {
            let mut input = autopilot(&run);
            if input.choose.is_some() {
                let offered = run.offer_upgrades(3);
                if let Some(&first) = offered.first() {
                    run.apply_upgrade(first);
                }
                input.choose = None;
            }
            tick(&mut run, &input, SIM_DT);
            assert!(run.state.chaos >= 0.0 && run.state.chaos <= run.state.max_chaos);
            if run.state.is_over() {
                break;
            }
        }

        assert!(run.audit().is_empty());
        assert_eq!(run.state.stats.integrity_repairs, 0);
        let (floor, held, shelved) = run.world.item_census();
        assert_eq!(floor + held, run.world.items.iter().filter(|i| !i.is_shelved()).count());
        assert_eq!(floor + held + shelved, total);

        let held_by_player = run
            .world
            .items
            .iter()
            .filter(|i| i.state == ItemState::Held(Holder::Player))
            .count();
        assert_eq!(held_by_player, run.world.player.carried.len());
        for item in &run.world.items {
            if let ItemState::Shelved(c) = item.state {
                let slots = run.world.containers[c.index()]
                    .slots
                    .iter()
                    .filter(|s| **s == Some(item.id))
                    .count();
                assert_eq!(slots, 1);
            }
        }
        assert!(run.world.npcs.len() >= 2);
    }
}
