//! Game session
//!
//! Wires the simulation to the scheduler. The model activity owns the
//! `GameState`; after every tick it publishes an immutable `Snapshot` by
//! swapping an `Arc`. Readers (the view activity and any controller) only
//! ever see whole snapshots. Controller input travels to the model over a
//! channel and is applied at the start of the next model tick.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{LoopError, TickError};
use crate::game_loop::{GameLoop, LoopState, Ticker};
use crate::settings::GameConfig;
use crate::sim::{Bomb, Direction, Entity, GamePhase, GameState, Snapshot, Tile, TickInput, tick};

/// Controller request for the hero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Keep walking in a direction until halted
    Move(Direction),
    Halt,
    PlantBomb,
}

type Published = Arc<RwLock<Arc<Snapshot>>>;

fn read(published: &Published) -> Arc<Snapshot> {
    Arc::clone(&published.read().unwrap_or_else(PoisonError::into_inner))
}

/// Model activity: drains commands, ticks the simulation, publishes
struct Model {
    state: GameState,
    commands: Receiver<Command>,
    held: Option<Direction>,
    published: Published,
}

impl Model {
    fn drain_commands(&mut self) -> TickInput {
        let mut plant_bomb = false;
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Move(dir) => self.held = Some(dir),
                Command::Halt => self.held = None,
                Command::PlantBomb => plant_bomb = true,
            }
        }
        TickInput {
            direction: self.held,
            plant_bomb,
        }
    }

    fn publish(&self) {
        let snapshot = Arc::new(self.state.snapshot());
        *self.published.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

impl Ticker for Model {
    fn tick(&mut self) -> Result<(), TickError> {
        if self.state.phase == GamePhase::LevelComplete {
            self.state.next_level();
            self.held = None;
        }
        let input = self.drain_commands();
        tick(&mut self.state, &input)?;
        self.publish();
        Ok(())
    }
}

/// A running (or ready to run) game
pub struct Game {
    config: GameConfig,
    game_loop: GameLoop,
    commands: Sender<Command>,
    /// Taken by `start()`
    model: Option<Model>,
    published: Published,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("New game (seed {})", seed);
        let state = GameState::new(config.level_params(), seed);
        let published: Published = Arc::new(RwLock::new(Arc::new(state.snapshot())));
        let (commands, receiver) = mpsc::channel();

        Self {
            game_loop: GameLoop::new(config.loop_config()),
            commands,
            model: Some(Model {
                state,
                commands: receiver,
                held: None,
                published: Arc::clone(&published),
            }),
            published,
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Start both activities. `view` is called once per view tick with the
    /// latest published snapshot.
    pub fn start<V>(&mut self, mut view: V) -> Result<(), LoopError>
    where
        V: FnMut(&Snapshot) -> Result<(), TickError> + Send + 'static,
    {
        let Some(model) = self.model.take() else {
            return Err(match self.game_loop.state() {
                Some(LoopState::Stopped) => LoopError::Stopped,
                _ => LoopError::AlreadyStarted,
            });
        };
        let published = Arc::clone(&self.published);
        self.game_loop.start(model, move || view(&read(&published)))
    }

    /// Start with a view activity that does nothing
    pub fn start_headless(&mut self) -> Result<(), LoopError> {
        self.start(|_| Ok(()))
    }

    pub fn pause(&self) {
        self.game_loop.pause();
    }

    pub fn resume(&self) {
        self.game_loop.resume();
    }

    pub fn stop(&self) {
        self.game_loop.stop();
    }

    pub fn is_running(&self) -> bool {
        self.game_loop.is_running()
    }

    pub fn loop_state(&self) -> Option<LoopState> {
        self.game_loop.state()
    }

    /// Wait for the loop threads after `stop()`
    pub fn join(&mut self) {
        self.game_loop.join();
    }

    pub fn model_ticks(&self) -> u64 {
        self.game_loop.model_ticks()
    }

    pub fn view_ticks(&self) -> u64 {
        self.game_loop.view_ticks()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::debug!("Model activity gone, dropping {:?}", command);
        }
    }

    /// Walk in `dir` until `halt_hero()` or another move
    pub fn move_hero(&self, dir: Direction) {
        self.send(Command::Move(dir));
    }

    pub fn halt_hero(&self) {
        self.send(Command::Halt);
    }

    /// Plant on the next model tick; refusal is logged, never fatal
    pub fn plant_bomb(&self) {
        self.send(Command::PlantBomb);
    }

    /// Latest published state
    pub fn snapshot(&self) -> Arc<Snapshot> {
        read(&self.published)
    }

    pub fn tiles(&self) -> Vec<Tile> {
        self.snapshot().tiles().to_vec()
    }

    pub fn power_up_tiles(&self) -> Vec<Tile> {
        self.snapshot().power_up_tiles()
    }

    pub fn planted_bombs(&self) -> Vec<Bomb> {
        self.snapshot().bombs.clone()
    }

    pub fn enemies(&self) -> Vec<Entity> {
        self.snapshot().enemies.clone()
    }

    pub fn hero(&self) -> Entity {
        self.snapshot().hero.clone()
    }

    /// Model ticks per second actually achieved over the last
    /// measurement window; 0 before start, while paused and after stop
    pub fn fps(&self) -> f64 {
        self.game_loop.measured_model_fps()
    }

    /// Configured model ticks per second
    pub fn target_fps(&self) -> u32 {
        self.config.model_fps
    }

    /// View ticks per second actually achieved
    pub fn view_fps(&self) -> f64 {
        self.game_loop.measured_view_fps()
    }

    /// Bomb fuse delay in milliseconds
    pub fn bomb_delay(&self) -> u64 {
        self.snapshot().fuse_ms
    }

    /// Tiles per side
    pub fn level_size(&self) -> usize {
        self.snapshot().level_size()
    }
}
