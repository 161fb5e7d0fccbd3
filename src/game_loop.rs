//! Two-activity game loop scheduler
//!
//! The model activity and the view activity each run on their own thread at
//! their own fixed rate. They share nothing but the RUNNING/PAUSED/STOPPED
//! state (behind a mutex + condvar), a pair of tick counters and the rate
//! each activity actually achieved over its last measurement window.
//!
//! Each cycle measures the time spent in the callback and sleeps for the rest
//! of the period, so a slow tick delays the next one but never triggers a
//! burst of catch-up ticks. Sleeps wake early on `stop()`.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_FPS;
use crate::error::{LoopError, TickError};

/// Scheduler state; STOPPED is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Paused,
    Stopped,
}

/// Which activities a pause suspends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PausePolicy {
    /// Model ticks stop, the view keeps rendering the frozen state
    #[default]
    ModelOnly,
    ModelAndView,
}

/// One periodic activity's callback
pub trait Ticker: Send + 'static {
    fn tick(&mut self) -> Result<(), TickError>;
}

impl<F> Ticker for F
where
    F: FnMut() -> Result<(), TickError> + Send + 'static,
{
    fn tick(&mut self) -> Result<(), TickError> {
        self()
    }
}

/// Scheduler rates and pause behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub model_fps: u32,
    pub view_fps: u32,
    pub pause_policy: PausePolicy,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            model_fps: DEFAULT_FPS,
            view_fps: DEFAULT_FPS,
            pause_policy: PausePolicy::default(),
        }
    }
}

impl LoopConfig {
    pub fn model_period(&self) -> Duration {
        period_for(self.model_fps)
    }

    pub fn view_period(&self) -> Duration {
        period_for(self.view_fps)
    }
}

fn period_for(fps: u32) -> Duration {
    Duration::from_secs(1) / fps.max(1)
}

/// Shortest span the achieved rate is averaged over
const RATE_WINDOW: Duration = Duration::from_millis(500);

/// Counts tick starts and turns them into ticks per second once a full
/// window has elapsed
#[derive(Debug, Default)]
struct RateWindow {
    start: Option<Instant>,
    ticks: u32,
}

impl RateWindow {
    fn record(&mut self, now: Instant) -> Option<f64> {
        let Some(start) = self.start else {
            self.start = Some(now);
            return None;
        };
        self.ticks += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed < RATE_WINDOW {
            return None;
        }
        let rate = f64::from(self.ticks) / elapsed.as_secs_f64();
        self.start = Some(now);
        self.ticks = 0;
        Some(rate)
    }

    /// Forget the current window (after a pause the gap is not a tick)
    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Model,
    View,
}

impl Activity {
    fn name(self) -> &'static str {
        match self {
            Activity::Model => "model",
            Activity::View => "view",
        }
    }

    fn suspended(self, state: Option<LoopState>, policy: PausePolicy) -> bool {
        state == Some(LoopState::Paused) && (self == Activity::Model || policy == PausePolicy::ModelAndView)
    }
}

/// State shared between the owner and both activity threads.
/// `None` means not started yet.
#[derive(Debug, Default)]
struct Control {
    state: Mutex<Option<LoopState>>,
    wake: Condvar,
    model_ticks: AtomicU64,
    view_ticks: AtomicU64,
    /// Last measured rates, stored as `f64` bits
    model_rate: AtomicU64,
    view_rate: AtomicU64,
}

impl Control {
    fn lock(&self) -> MutexGuard<'_, Option<LoopState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> Option<LoopState> {
        *self.lock()
    }

    /// Apply a transition; returns false when it was a no-op
    fn transition(&self, from: &[Option<LoopState>], to: LoopState) -> bool {
        let mut state = self.lock();
        if !from.contains(&*state) {
            return false;
        }
        *state = Some(to);
        drop(state);
        self.wake.notify_all();
        true
    }

    fn stop(&self) -> bool {
        self.transition(&[None, Some(LoopState::Running), Some(LoopState::Paused)], LoopState::Stopped)
    }

    fn counter(&self, activity: Activity) -> &AtomicU64 {
        match activity {
            Activity::Model => &self.model_ticks,
            Activity::View => &self.view_ticks,
        }
    }

    fn rate(&self, activity: Activity) -> &AtomicU64 {
        match activity {
            Activity::Model => &self.model_rate,
            Activity::View => &self.view_rate,
        }
    }

    fn set_rate(&self, activity: Activity, fps: f64) {
        self.rate(activity).store(fps.to_bits(), Ordering::Release);
    }
}

/// Runs a model and a view callback at independent rates
#[derive(Debug, Default)]
pub struct GameLoop {
    config: LoopConfig,
    control: Arc<Control>,
    handles: Vec<JoinHandle<()>>,
}

impl GameLoop {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            control: Arc::default(),
            handles: Vec::new(),
        }
    }

    /// Loop with the given rates and the default pause policy
    pub fn with_rates(model_fps: u32, view_fps: u32) -> Self {
        Self::new(LoopConfig {
            model_fps,
            view_fps,
            ..LoopConfig::default()
        })
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Start both activities. A loop can only be started once.
    pub fn start(&mut self, model: impl Ticker, view: impl Ticker) -> Result<(), LoopError> {
        {
            let mut state = self.control.lock();
            match *state {
                None => *state = Some(LoopState::Running),
                Some(LoopState::Stopped) => return Err(LoopError::Stopped),
                Some(_) => return Err(LoopError::AlreadyStarted),
            }
        }

        let model_handle = self.spawn(Activity::Model, self.config.model_period(), Box::new(model));
        let model_handle = match model_handle {
            Ok(handle) => handle,
            Err(err) => {
                self.control.stop();
                return Err(err);
            }
        };
        self.handles.push(model_handle);

        match self.spawn(Activity::View, self.config.view_period(), Box::new(view)) {
            Ok(handle) => self.handles.push(handle),
            Err(err) => {
                self.control.stop();
                self.join();
                return Err(err);
            }
        }

        log::info!(
            "Game loop started (model {} fps, view {} fps, pause {:?})",
            self.config.model_fps,
            self.config.view_fps,
            self.config.pause_policy
        );
        Ok(())
    }

    fn spawn(&self, activity: Activity, period: Duration, ticker: Box<dyn Ticker>) -> Result<JoinHandle<()>, LoopError> {
        let control = Arc::clone(&self.control);
        let policy = self.config.pause_policy;
        thread::Builder::new()
            .name(format!("{}-loop", activity.name()))
            .spawn(move || run_activity(&control, activity, period, policy, ticker))
            .map_err(LoopError::Spawn)
    }

    /// RUNNING -> PAUSED; no-op in any other state
    pub fn pause(&self) {
        if self.control.transition(&[Some(LoopState::Running)], LoopState::Paused) {
            log::info!("Game loop paused");
        }
    }

    /// PAUSED -> RUNNING; no-op in any other state
    pub fn resume(&self) {
        if self.control.transition(&[Some(LoopState::Paused)], LoopState::Running) {
            log::info!("Game loop resumed");
        }
    }

    /// Move to STOPPED. Both activities exit at their next tick boundary.
    /// Stopping twice (or before start) is harmless.
    pub fn stop(&self) {
        if self.control.stop() {
            log::info!("Game loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == Some(LoopState::Running)
    }

    /// Current state, `None` before `start()`
    pub fn state(&self) -> Option<LoopState> {
        self.control.state()
    }

    /// Model ticks executed so far
    pub fn model_ticks(&self) -> u64 {
        self.control.model_ticks.load(Ordering::Acquire)
    }

    /// View ticks executed so far
    pub fn view_ticks(&self) -> u64 {
        self.control.view_ticks.load(Ordering::Acquire)
    }

    /// Model ticks per second actually achieved, 0 while not ticking
    pub fn measured_model_fps(&self) -> f64 {
        self.measured_fps(Activity::Model)
    }

    /// View ticks per second actually achieved, 0 while not ticking
    pub fn measured_view_fps(&self) -> f64 {
        self.measured_fps(Activity::View)
    }

    fn measured_fps(&self, activity: Activity) -> f64 {
        let state = self.state();
        let active = matches!(state, Some(LoopState::Running | LoopState::Paused))
            && !activity.suspended(state, self.config.pause_policy);
        if !active {
            return 0.0;
        }
        f64::from_bits(self.control.rate(activity).load(Ordering::Acquire))
    }

    /// Wait for both activity threads to exit (call after `stop()`)
    pub fn join(&mut self) {
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("loop").to_string();
            if handle.join().is_err() {
                log::error!("{} thread terminated abnormally", name);
            }
        }
    }
}

impl Drop for GameLoop {
    fn drop(&mut self) {
        self.control.stop();
        self.join();
    }
}

fn run_activity(control: &Control, activity: Activity, period: Duration, policy: PausePolicy, mut ticker: Box<dyn Ticker>) {
    log::debug!("{} activity running every {:?}", activity.name(), period);
    let mut window = RateWindow::default();

    loop {
        {
            let state = control.lock();
            if activity.suspended(*state, policy) {
                window.reset();
                control.set_rate(activity, 0.0);
            }
            let state = control
                .wake
                .wait_while(state, |s| activity.suspended(*s, policy))
                .unwrap_or_else(PoisonError::into_inner);
            if *state == Some(LoopState::Stopped) {
                break;
            }
        }

        let started = Instant::now();
        if let Some(fps) = window.record(started) {
            control.set_rate(activity, fps);
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| ticker.tick()));
        control.counter(activity).fetch_add(1, Ordering::AcqRel);

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) if err.is_unrecoverable() => {
                log::error!("{} tick failed, stopping loop: {}", activity.name(), err);
                control.stop();
                break;
            }
            Ok(Err(err)) => log::warn!("{} tick abandoned: {}", activity.name(), err),
            Err(payload) => log::error!("{} tick panicked: {}", activity.name(), panic_message(&*payload)),
        }

        // Sleep out the rest of the period; never catch up on missed time
        let remaining = period.saturating_sub(started.elapsed());
        let state = control.lock();
        let (state, _) = control
            .wake
            .wait_timeout_while(state, remaining, |s| *s != Some(LoopState::Stopped))
            .unwrap_or_else(PoisonError::into_inner);
        if *state == Some(LoopState::Stopped) {
            break;
        }
    }

    log::debug!(
        "{} activity exited after {} ticks",
        activity.name(),
        control.counter(activity).load(Ordering::Acquire)
    );
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
