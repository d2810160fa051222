//! Run lifecycle
//!
//! A registry of named scenes with a suspend stack. The playing scene ticks
//! the run; paused and upgrade sit on top of it and freeze the run while they
//! are up; game over waits for a restart.

use std::collections::BTreeMap;

use crate::error::HostError;
use crate::sim::{GameEvent, Run, TickInput, Upgrade, tick};
use crate::timestep::{FixedTimestep, StepReport};

pub const PLAYING: &str = "playing";
pub const PAUSED: &str = "paused";
pub const UPGRADE: &str = "upgrade";
pub const GAME_OVER: &str = "gameover";

/// Cards shown per level-up
const UPGRADE_CHOICES: usize = 3;

/// What a scene wants the host to do after its update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneCommand {
    Stay,
    Change(String),
    Push(String),
    Pop,
}

pub trait Scene {
    fn enter(&mut self, _run: &mut Run) {}
    fn exit(&mut self, _run: &mut Run) {}
    fn update(&mut self, run: &mut Run, input: &TickInput, dt: f32) -> SceneCommand;
}

/// Start over with the same tuning and the next seed
fn restart(run: &mut Run) {
    let seed = run.seed.wrapping_add(1);
    log::info!("Restarting with seed {seed}");
    *run = Run::new(seed, run.tuning.clone());
}

/// Ticks the run and watches for interrupts
#[derive(Debug, Default)]
pub struct PlayingScene;

impl Scene for PlayingScene {
    fn update(&mut self, run: &mut Run, input: &TickInput, dt: f32) -> SceneCommand {
        if input.pause {
            return SceneCommand::Push(PAUSED.into());
        }
        // A second level-up from one award waits for its card before time moves
        if run.state.pending_upgrades > 0 {
            return SceneCommand::Push(UPGRADE.into());
        }
        tick(run, input, dt);

        if run.state.is_over() {
            SceneCommand::Change(GAME_OVER.into())
        } else if run.state.pending_upgrades > 0 {
            SceneCommand::Push(UPGRADE.into())
        } else {
            SceneCommand::Stay
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PauseItem {
    Resume,
    Restart,
}

const PAUSE_MENU: [PauseItem; 2] = [PauseItem::Resume, PauseItem::Restart];

#[derive(Debug, Default)]
pub struct PausedScene {
    selected: usize,
}

impl Scene for PausedScene {
    fn enter(&mut self, run: &mut Run) {
        self.selected = 0;
        run.state.paused = true;
    }

    fn exit(&mut self, run: &mut Run) {
        run.state.paused = false;
    }

    fn update(&mut self, run: &mut Run, input: &TickInput, _dt: f32) -> SceneCommand {
        // Quick resume with the same key
        if input.pause {
            return SceneCommand::Pop;
        }
        if input.nav_left {
            self.selected = (self.selected + PAUSE_MENU.len() - 1) % PAUSE_MENU.len();
        }
        if input.nav_right {
            self.selected = (self.selected + 1) % PAUSE_MENU.len();
        }
        if let Some(index) = input.choose.filter(|&i| i < PAUSE_MENU.len()) {
            self.selected = index;
        } else if !input.confirm {
            return SceneCommand::Stay;
        }

        match PAUSE_MENU[self.selected] {
            PauseItem::Resume => SceneCommand::Pop,
            PauseItem::Restart => {
                restart(run);
                SceneCommand::Change(PLAYING.into())
            }
        }
    }
}

/// Level-up interrupt: pick one of a few upgrade cards
#[derive(Debug, Default)]
pub struct UpgradeScene {
    offered: Vec<Upgrade>,
    selected: usize,
}

impl Scene for UpgradeScene {
    fn enter(&mut self, run: &mut Run) {
        run.state.paused = true;
        self.selected = 0;
        self.offered = run.offer_upgrades(UPGRADE_CHOICES);
        let player = &run.world.player;
        for upgrade in &self.offered {
            let next = player.upgrade_level(*upgrade) + 1;
            log::debug!(
                "Level {} offer: {} ({})",
                run.state.level,
                upgrade.name(),
                upgrade.describe(next)
            );
        }
    }

    fn exit(&mut self, run: &mut Run) {
        self.offered.clear();
        run.state.paused = false;
    }

    fn update(&mut self, run: &mut Run, input: &TickInput, _dt: f32) -> SceneCommand {
        // Everything is maxed: the level-up is spent with nothing to pick
        if self.offered.is_empty() {
            run.state.pending_upgrades = run.state.pending_upgrades.saturating_sub(1);
            return SceneCommand::Pop;
        }

        let last = self.offered.len() - 1;
        if input.nav_left {
            self.selected = self.selected.saturating_sub(1);
        }
        if input.nav_right {
            self.selected = (self.selected + 1).min(last);
        }
        if let Some(index) = input.choose.filter(|&i| i <= last) {
            self.selected = index;
        } else if !input.confirm {
            return SceneCommand::Stay;
        }

        let upgrade = self.offered[self.selected];
        if run.apply_upgrade(upgrade) {
            SceneCommand::Pop
        } else {
            SceneCommand::Stay
        }
    }
}

/// Waits for the player to start another run
#[derive(Debug, Default)]
pub struct GameOverScene;

impl Scene for GameOverScene {
    fn enter(&mut self, run: &mut Run) {
        let state = &run.state;
        log::info!(
            "Game over: {:?} at {:.0}s, level {}, {} collected, {} returned, {} kids repelled",
            state.outcome,
            state.elapsed,
            state.level,
            state.stats.items_collected,
            state.stats.items_returned,
            state.stats.npcs_repelled
        );
    }

    fn update(&mut self, run: &mut Run, input: &TickInput, _dt: f32) -> SceneCommand {
        if input.confirm || input.interact {
            restart(run);
            SceneCommand::Change(PLAYING.into())
        } else {
            SceneCommand::Stay
        }
    }
}

/// Owns the run and the scene stack, and turns real frames into fixed steps
pub struct Host {
    run: Run,
    scenes: BTreeMap<String, Box<dyn Scene>>,
    current: Option<String>,
    stack: Vec<String>,
    clock: FixedTimestep,
    events: Vec<GameEvent>,
}

impl Host {
    /// Register the default scenes and start playing `run`
    pub fn new(run: Run) -> Self {
        let mut host = Self {
            run,
            scenes: BTreeMap::new(),
            current: None,
            stack: Vec::new(),
            clock: FixedTimestep::default(),
            events: Vec::new(),
        };
        host.register(PLAYING, Box::new(PlayingScene));
        host.register(PAUSED, Box::new(PausedScene::default()));
        host.register(UPGRADE, Box::new(UpgradeScene::default()));
        host.register(GAME_OVER, Box::new(GameOverScene));
        if let Err(err) = host.change_state(PLAYING) {
            log::error!("Could not start: {err}");
        }
        host
    }

    pub fn register(&mut self, name: &str, scene: Box<dyn Scene>) {
        self.scenes.insert(name.to_string(), scene);
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn run_mut(&mut self) -> &mut Run {
        &mut self.run
    }

    /// Name of the scene on top
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Scenes suspended under the current one
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn clock(&self) -> &FixedTimestep {
        &self.clock
    }

    /// Events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replace the current scene, dropping anything suspended
    pub fn change_state(&mut self, name: &str) -> Result<(), HostError> {
        self.check(name)?;
        if let Some(current) = self.current.take() {
            self.exit_scene(&current);
        }
        while let Some(suspended) = self.stack.pop() {
            self.exit_scene(&suspended);
        }
        self.enter_scene(name);
        log::debug!("Scene changed to {name}");
        Ok(())
    }

    /// Suspend the current scene under `name`
    pub fn push_state(&mut self, name: &str) -> Result<(), HostError> {
        self.check(name)?;
        if let Some(current) = self.current.take() {
            self.stack.push(current);
        }
        self.enter_scene(name);
        log::debug!("Scene pushed: {name}");
        Ok(())
    }

    /// Leave the current scene and resume the one underneath
    pub fn pop_state(&mut self) -> Result<(), HostError> {
        let Some(resumed) = self.stack.pop() else {
            return Err(HostError::EmptyStack);
        };
        if let Some(current) = self.current.take() {
            self.exit_scene(&current);
        }
        log::debug!("Scene popped to {resumed}");
        self.current = Some(resumed);
        Ok(())
    }

    /// One fixed step of the current scene
    pub fn update(&mut self, dt: f32, input: &TickInput) {
        let Some(name) = self.current.clone() else {
            return;
        };
        let Some(scene) = self.scenes.get_mut(&name) else {
            return;
        };
        let command = scene.update(&mut self.run, input, dt);
        self.events.extend(self.run.drain_events());

        let result = match command {
            SceneCommand::Stay => Ok(()),
            SceneCommand::Change(next) => self.change_state(&next),
            SceneCommand::Push(next) => self.push_state(&next),
            SceneCommand::Pop => self.pop_state(),
        };
        if let Err(err) = result {
            log::error!("Scene '{name}' transition failed: {err}");
        }
    }

    /// Feed one real frame; edge-triggered input is seen by the first step only
    pub fn frame(&mut self, real_dt: f32, input: &TickInput) -> StepReport {
        let mut input = input.clone();
        let mut clock = std::mem::take(&mut self.clock);
        let report = clock.advance(real_dt, |dt| {
            self.update(dt, &input);
            input.clear_one_shots();
        });
        self.clock = clock;
        report
    }

    fn check(&self, name: &str) -> Result<(), HostError> {
        if self.scenes.contains_key(name) {
            Ok(())
        } else {
            Err(HostError::UnknownScene(name.to_string()))
        }
    }

    fn enter_scene(&mut self, name: &str) {
        if let Some(scene) = self.scenes.get_mut(name) {
            scene.enter(&mut self.run);
        }
        self.current = Some(name.to_string());
    }

    fn exit_scene(&mut self, name: &str) {
        if let Some(scene) = self.scenes.get_mut(name) {
            scene.exit(&mut self.run);
        }
    }
}
