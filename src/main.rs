//! Bomb Grid headless demo
//!
//! Runs one seeded game with a scripted controller for a few seconds and
//! prints the final frame. Usage: `bomb-grid [config.json]`

use std::env;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use bomb_grid::sim::{Direction, GamePhase};
use bomb_grid::{Game, GameConfig};

/// Controller script: (delay before the step in ms, action)
const SCRIPT: &[(u64, Step)] = &[
    (200, Step::Plant),
    (0, Step::Walk(Direction::Down)),
    (400, Step::Walk(Direction::Right)),
    (300, Step::Halt),
    (3000, Step::Walk(Direction::Left)),
    (400, Step::Walk(Direction::Up)),
    (400, Step::Halt),
    (0, Step::Pause),
    (500, Step::Resume),
    (1000, Step::Halt),
];

#[derive(Debug, Clone, Copy)]
enum Step {
    Walk(Direction),
    Halt,
    Plant,
    Pause,
    Resume,
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match env::args().nth(1) {
        Some(path) => GameConfig::load_or_default(path),
        None => GameConfig {
            seed: Some(2024),
            ..GameConfig::default()
        },
    };

    let mut game = Game::new(config);
    let mut last_tick = 0;
    let started = game.start(move |snapshot| {
        if snapshot.tick != last_tick {
            last_tick = snapshot.tick;
            for event in &snapshot.events {
                log::debug!("tick {}: {:?}", snapshot.tick, event);
            }
        }
        Ok(())
    });
    if let Err(err) = started {
        log::error!("Failed to start: {}", err);
        return ExitCode::FAILURE;
    }

    for &(delay_ms, step) in SCRIPT {
        thread::sleep(Duration::from_millis(delay_ms));
        if game.snapshot().phase != GamePhase::Playing {
            break;
        }
        match step {
            Step::Walk(dir) => game.move_hero(dir),
            Step::Halt => game.halt_hero(),
            Step::Plant => game.plant_bomb(),
            Step::Pause => game.pause(),
            Step::Resume => game.resume(),
        }
    }

    game.stop();
    game.join();

    let snapshot = game.snapshot();
    println!("{}", snapshot.render_ascii());
    println!(
        "level {} | {:?} | lives {} | score {} | bombs {} | {} model ticks, {} view ticks",
        snapshot.level,
        snapshot.phase,
        snapshot.hero.lives,
        snapshot.hero.score,
        snapshot.bombs.len(),
        game.model_ticks(),
        game.view_ticks()
    );
    ExitCode::SUCCESS
}
