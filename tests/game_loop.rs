//! Scheduler timing tests (wall clock; tolerances allow for a busy machine)

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use bomb_grid::game_loop::LoopConfig;
use bomb_grid::{GameLoop, LoopState, PausePolicy, TickError, Ticker};

fn counting() -> (Arc<AtomicU64>, impl Ticker) {
    let count = Arc::new(AtomicU64::new(0));
    let ticks = Arc::clone(&count);
    let ticker = move || -> Result<(), TickError> {
        ticks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };
    (count, ticker)
}

fn sleep_ms(ms: u64) {
    thread::sleep(Duration::from_millis(ms));
}

#[test]
fn test_sixty_fps_pause_and_resume() {
    let (model, model_ticker) = counting();
    let (_, view_ticker) = counting();
    let mut game_loop = GameLoop::with_rates(60, 60);
    game_loop.start(model_ticker, view_ticker).unwrap();

    sleep_ms(1000);
    let running = model.load(Ordering::SeqCst);
    assert!((55..=62).contains(&running), "60 fps for 1s gave {running} ticks");

    game_loop.pause();
    let at_pause = model.load(Ordering::SeqCst);
    sleep_ms(1000);
    let after_pause = model.load(Ordering::SeqCst);
    assert!(after_pause <= at_pause + 1, "{at_pause} -> {after_pause} while paused");

    game_loop.resume();
    sleep_ms(1000);
    let resumed = model.load(Ordering::SeqCst) - after_pause;
    assert!((55..=62).contains(&resumed), "resumed rate gave {resumed} ticks");

    let measured = game_loop.measured_model_fps();
    assert!((55.0..=62.0).contains(&measured), "measured {measured} fps");

    game_loop.stop();
    game_loop.join();
    assert_eq!(game_loop.model_ticks(), model.load(Ordering::SeqCst));
}

#[test]
fn test_view_keeps_ticking_while_model_paused() {
    let (model, model_ticker) = counting();
    let (view, view_ticker) = counting();
    let mut game_loop = GameLoop::with_rates(50, 50);
    game_loop.start(model_ticker, view_ticker).unwrap();
    sleep_ms(100);

    game_loop.pause();
    sleep_ms(20);
    let model_before = model.load(Ordering::SeqCst);
    let view_before = view.load(Ordering::SeqCst);
    sleep_ms(300);
    assert_eq!(model.load(Ordering::SeqCst), model_before);
    assert!(view.load(Ordering::SeqCst) >= view_before + 5);
}

#[test]
fn test_model_and_view_policy_pauses_both() {
    let (view, view_ticker) = counting();
    let mut game_loop = GameLoop::new(LoopConfig {
        model_fps: 50,
        view_fps: 50,
        pause_policy: PausePolicy::ModelAndView,
    });
    game_loop.start(|| -> Result<(), TickError> { Ok(()) }, view_ticker).unwrap();
    sleep_ms(100);

    game_loop.pause();
    sleep_ms(20);
    let view_before = view.load(Ordering::SeqCst);
    sleep_ms(300);
    assert!(view.load(Ordering::SeqCst) <= view_before + 1);

    game_loop.resume();
    sleep_ms(200);
    assert!(view.load(Ordering::SeqCst) >= view_before + 5);
}

#[test]
fn test_stop_halts_within_one_period() {
    let (model, model_ticker) = counting();
    let (view, view_ticker) = counting();
    let mut game_loop = GameLoop::with_rates(60, 30);
    game_loop.start(model_ticker, view_ticker).unwrap();
    sleep_ms(200);

    game_loop.stop();
    let model_at_stop = model.load(Ordering::SeqCst);
    let view_at_stop = view.load(Ordering::SeqCst);
    sleep_ms(200);
    assert!(model.load(Ordering::SeqCst) <= model_at_stop + 1);
    assert!(view.load(Ordering::SeqCst) <= view_at_stop + 1);
    assert!(!game_loop.is_running());

    // Second stop is a no-op
    game_loop.stop();
    assert_eq!(game_loop.state(), Some(LoopState::Stopped));
    game_loop.join();
}

#[test]
fn test_stop_wakes_slow_loop() {
    // 1 fps: the activities spend almost all their time asleep
    let mut game_loop = GameLoop::with_rates(1, 1);
    let (model, model_ticker) = counting();
    game_loop.start(model_ticker, || -> Result<(), TickError> { Ok(()) }).unwrap();
    sleep_ms(50);
    game_loop.stop();

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    thread::spawn(move || {
        game_loop.join();
        let _ = done_tx.send(());
    });
    assert!(done_rx.recv_timeout(Duration::from_millis(500)).is_ok());
    assert_eq!(model.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failing_model_does_not_stop_view() {
    let attempts = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&attempts);
    let (view, view_ticker) = counting();
    let mut game_loop = GameLoop::with_rates(50, 50);
    game_loop
        .start(
            move || -> Result<(), TickError> {
                seen.fetch_add(1, Ordering::SeqCst);
                Err(TickError::Recoverable("bad tick".into()))
            },
            view_ticker,
        )
        .unwrap();

    sleep_ms(300);
    assert!(game_loop.is_running());
    // The failing activity keeps its schedule too
    assert!(attempts.load(Ordering::SeqCst) >= 5);
    assert!(view.load(Ordering::SeqCst) >= 5);
}

#[test]
fn test_panicking_view_does_not_stop_model() {
    let (model, model_ticker) = counting();
    let mut game_loop = GameLoop::with_rates(50, 50);
    game_loop
        .start(model_ticker, || -> Result<(), TickError> { panic!("renderer exploded") })
        .unwrap();

    sleep_ms(300);
    assert!(game_loop.is_running());
    assert!(model.load(Ordering::SeqCst) >= 5);
    assert!(game_loop.view_ticks() >= 5);
}

#[test]
fn test_unrecoverable_error_stops_loop() {
    let (view, view_ticker) = counting();
    let mut ticks = 0;
    let mut game_loop = GameLoop::with_rates(100, 100);
    game_loop
        .start(
            move || {
                ticks += 1;
                if ticks == 3 {
                    return Err(TickError::Unrecoverable("grid corrupted".into()));
                }
                Ok(())
            },
            view_ticker,
        )
        .unwrap();

    sleep_ms(300);
    assert_eq!(game_loop.state(), Some(LoopState::Stopped));
    assert_eq!(game_loop.model_ticks(), 3);
    let view_at_stop = view.load(Ordering::SeqCst);
    sleep_ms(100);
    assert_eq!(view.load(Ordering::SeqCst), view_at_stop);
    game_loop.join();
}

#[test]
fn test_slow_tick_does_not_catch_up() {
    let (view, view_ticker) = counting();
    let mut slow = true;
    let mut game_loop = GameLoop::with_rates(100, 10);
    game_loop
        .start(
            move || -> Result<(), TickError> {
                // First tick overruns by 200ms
                if std::mem::take(&mut slow) {
                    sleep_ms(200);
                }
                Ok(())
            },
            view_ticker,
        )
        .unwrap();

    sleep_ms(500);
    // View rate is unaffected by the model's overrun
    let view_ticks = view.load(Ordering::SeqCst);
    assert!((3..=7).contains(&view_ticks), "view ticked {view_ticks} times");
    // About 30 ticks fit in the 300ms left; catching up would give 50
    let model_ticks = game_loop.model_ticks();
    assert!(model_ticks <= 40, "model ticked {model_ticks} times");
}

#[test]
fn test_start_twice() {
    let mut game_loop = GameLoop::with_rates(30, 30);
    game_loop
        .start(|| -> Result<(), TickError> { Ok(()) }, || -> Result<(), TickError> { Ok(()) })
        .unwrap();
    assert!(matches!(
        game_loop.start(|| -> Result<(), TickError> { Ok(()) }, || -> Result<(), TickError> { Ok(()) }),
        Err(bomb_grid::LoopError::AlreadyStarted)
    ));
}
