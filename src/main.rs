//! Hush Hour headless runner
//!
//! Plays a seeded run on autopilot through the full host (scenes, fixed
//! timestep, audio cues, frame snapshots) and prints a JSON summary.
//!
//! Usage: hush-hour [--seed N] [--seconds S] [--tuning path.json] [--volume V] [--mute]; see `--help`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::main();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser host; the library is driven by the embedding page
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use clap::Parser;
    use serde::Serialize;

    use hush_hour::audio::{self, LogAudio};
    use hush_hour::host::{GAME_OVER, Host};
    use hush_hour::present::{FrameSnapshot, LogPresenter, Presenter};
    use hush_hour::sim::{RunOutcome, Stats, autopilot};
    use hush_hour::{Run, Tuning};

    /// Display rate the headless loop pretends to run at
    const FRAME_DT: f32 = 1.0 / 50.0;

    #[derive(Parser, Debug)]
    #[command(
        name = "hush-hour",
        version,
        about = "Play a seeded Hush Hour run on autopilot and print a JSON summary"
    )]
    struct Args {
        /// Run seed; the same seed replays the same run
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Simulated seconds to play before stopping
        #[arg(long, default_value_t = 300.0)]
        seconds: f32,
        /// Balance table (JSON) to load instead of the defaults
        #[arg(long)]
        tuning: Option<PathBuf>,
        /// Master volume for logged cues (0.0 - 1.0)
        #[arg(long, default_value_t = 0.8)]
        volume: f32,
        /// Sound effect volume (0.0 - 1.0)
        #[arg(long, default_value_t = 1.0)]
        sfx_volume: f32,
        /// Drop every cue
        #[arg(long)]
        mute: bool,
    }

    fn load_tuning(path: Option<&PathBuf>) -> Tuning {
        let Some(path) = path else {
            return Tuning::default();
        };
        match Tuning::load(path) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::error!("{err}; falling back to default tuning");
                Tuning::default()
            }
        }
    }

    #[derive(Serialize)]
    struct Summary {
        seed: u64,
        outcome: Option<RunOutcome>,
        elapsed: f32,
        ticks: u64,
        chaos: f32,
        level: u32,
        stats: Stats,
        kids: usize,
        books_on_floor: usize,
        books_held: usize,
        books_shelved: usize,
        upgrades: BTreeMap<&'static str, u8>,
        sounds_played: u64,
        fps: u32,
    }

    pub fn main() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let args = Args::parse();
        let tuning = load_tuning(args.tuning.as_ref());
        log::info!(
            "Hush Hour (headless) starting: seed {}, {}s",
            args.seed,
            args.seconds
        );

        let mut host = Host::new(Run::new(args.seed, tuning));
        let mut sound = LogAudio::new();
        sound.set_master_volume(args.volume);
        sound.set_sfx_volume(args.sfx_volume);
        sound.set_muted(args.mute);
        let mut presenter = LogPresenter::new(250);

        // Enough frames to cover the target even if a few are spent in menus
        let max_frames = (args.seconds / FRAME_DT).ceil() as u64 * 2 + 100;
        for _ in 0..max_frames {
            if host.current() == Some(GAME_OVER) || host.run().state.elapsed >= args.seconds {
                break;
            }
            let input = autopilot(host.run());
            let report = host.frame(FRAME_DT, &input);
            audio::dispatch(&mut sound, &host.drain_events());
            presenter.present(&FrameSnapshot::capture(host.run(), report.alpha));
        }

        let run = host.run();
        let (books_on_floor, books_held, books_shelved) = run.world.item_census();
        let summary = Summary {
            seed: run.seed,
            outcome: run.state.outcome,
            elapsed: run.state.elapsed,
            ticks: run.state.tick,
            chaos: run.state.chaos,
            level: run.state.level,
            stats: run.state.stats,
            kids: run.world.npcs.len(),
            books_on_floor,
            books_held,
            books_shelved,
            upgrades: run
                .world
                .player
                .upgrades
                .iter()
                .map(|(upgrade, level)| (upgrade.id(), *level))
                .collect(),
            sounds_played: sound.played(),
            fps: host.clock().fps(),
        };

        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(err) => log::error!("Could not serialize summary: {err}"),
        }
    }

}
