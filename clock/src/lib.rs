#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-step simulation clock separating logic ticks from render frames.
//!
//! The host drives the clock by calling [`SimulationClock::frame`] once per
//! rendered frame with a monotonic timestamp. Elapsed real time is scaled by
//! the game speed, accumulated, and drained in fixed logic ticks. Render
//! subscribers run exactly once per frame after the logic ticks.

mod config;
mod stats;

use std::{fmt, time::Duration};

use tracing::{debug, info, warn};

pub use config::{clamp_game_speed, ClockConfig, MAX_GAME_SPEED, MIN_GAME_SPEED};

use stats::RateCounter;

/// Time information handed to logic subscribers for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameTime {
    /// Logic time elapsed since the clock started, including this tick.
    pub elapsed: Duration,
    /// Fixed logic time covered by this tick.
    pub delta: Duration,
    /// Game speed multiplier in effect.
    pub speed: f64,
    /// One-based index of the tick.
    pub tick: u64,
    /// One-based index of the frame executing the tick.
    pub frame: u64,
}

/// Time information handed to render subscribers for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderTime {
    /// Game time elapsed since the clock started, scaled by game speed and frozen while paused.
    pub elapsed: Duration,
    /// Real time since the previous frame.
    pub delta: Duration,
    /// Frames per second measured over the last full window.
    pub fps: f64,
    /// Logic ticks per second measured over the last full window.
    pub tps: f64,
    /// One-based index of the frame.
    pub frame: u64,
}

/// Outcome of a single [`SimulationClock::frame`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Real time since the previous frame.
    pub delta: Duration,
    /// Logic ticks executed during the frame.
    pub ticks: u64,
    /// Ticks discarded because the frame exceeded the catch-up cap.
    pub dropped_ticks: u64,
    /// Whether the frame was processed at all.
    pub processed: bool,
}

/// Handle identifying a registered subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw value of the handle.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription {}", self.0)
    }
}

/// Failure raised while driving the clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// A logic subscriber failed; the rest of the frame was abandoned.
    #[error("{subscription} failed during tick {tick}")]
    Subscriber {
        /// Subscriber that failed.
        subscription: SubscriptionId,
        /// Tick during which the failure happened.
        tick: u64,
        /// Error reported by the subscriber.
        #[source]
        source: anyhow::Error,
    },
}

/// Callback executed once per logic tick with mutable access to the context.
pub type LogicSubscriber<C> = Box<dyn FnMut(&mut C, &GameTime) -> anyhow::Result<()>>;

/// Callback executed once per frame with shared access to the context.
pub type RenderSubscriber<C> = Box<dyn FnMut(&C, &RenderTime)>;

/// Fixed-timestep clock driving logic and render subscribers over a context `C`.
pub struct SimulationClock<C> {
    config: ClockConfig,
    tick_interval: Duration,
    speed: f64,
    running: bool,
    paused: bool,
    last_frame: Option<Duration>,
    accumulator: Duration,
    elapsed: Duration,
    render_elapsed: Duration,
    ticks: u64,
    frames: u64,
    next_subscription: u64,
    logic: Vec<(SubscriptionId, LogicSubscriber<C>)>,
    render: Vec<(SubscriptionId, RenderSubscriber<C>)>,
    fps: RateCounter,
    tps: RateCounter,
}

impl<C> fmt::Debug for SimulationClock<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationClock")
            .field("config", &self.config)
            .field("speed", &self.speed)
            .field("running", &self.running)
            .field("paused", &self.paused)
            .field("elapsed", &self.elapsed)
            .field("ticks", &self.ticks)
            .field("frames", &self.frames)
            .field("logic_subscribers", &self.logic.len())
            .field("render_subscribers", &self.render.len())
            .finish()
    }
}

impl<C> SimulationClock<C> {
    /// Creates a stopped clock.
    #[must_use]
    pub fn new(config: ClockConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            speed: clamp_game_speed(config.game_speed()).unwrap_or(1.0),
            running: false,
            paused: false,
            last_frame: None,
            accumulator: Duration::ZERO,
            elapsed: Duration::ZERO,
            render_elapsed: Duration::ZERO,
            ticks: 0,
            frames: 0,
            next_subscription: 0,
            logic: Vec::new(),
            render: Vec::new(),
            fps: RateCounter::new(config.stats_window()),
            tps: RateCounter::new(config.stats_window()),
            config,
        }
    }

    /// Configuration the clock was built from.
    #[must_use]
    pub const fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Fixed duration of one logic tick.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Starts the clock with `now` as the first frame anchor.
    ///
    /// Returns `false` when the clock was already running.
    pub fn start(&mut self, now: Duration) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.paused = false;
        self.last_frame = Some(now);
        self.accumulator = Duration::ZERO;
        info!(
            tick_rate = self.config.tick_rate().get(),
            speed = self.speed,
            "clock started"
        );
        true
    }

    /// Stops the clock; later frames are ignored until the next start.
    ///
    /// Returns `false` when the clock was not running.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.paused = false;
        self.last_frame = None;
        self.accumulator = Duration::ZERO;
        self.fps.reset();
        self.tps.reset();
        info!(ticks = self.ticks, frames = self.frames, "clock stopped");
        true
    }

    /// Suspends logic ticks while frames keep rendering.
    ///
    /// Returns `false` when the clock is stopped or already paused.
    pub fn pause(&mut self) -> bool {
        if !self.running || self.paused {
            return false;
        }
        self.paused = true;
        self.accumulator = Duration::ZERO;
        debug!(tick = self.ticks, "clock paused");
        true
    }

    /// Resumes logic ticks, re-anchoring at `now` so paused time is not replayed.
    ///
    /// Returns `false` when the clock is stopped or not paused.
    pub fn resume(&mut self, now: Duration) -> bool {
        if !self.running || !self.paused {
            return false;
        }
        self.paused = false;
        self.last_frame = Some(now);
        self.accumulator = Duration::ZERO;
        debug!(tick = self.ticks, "clock resumed");
        true
    }

    /// Reports whether the clock is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Reports whether logic ticks are suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Sets the game speed, clamped to [`MIN_GAME_SPEED`]..=[`MAX_GAME_SPEED`].
    ///
    /// Non-finite requests are ignored. Returns the speed now in effect.
    pub fn set_game_speed(&mut self, speed: f64) -> f64 {
        match clamp_game_speed(speed) {
            Some(applied) => {
                if applied != speed {
                    debug!(requested = speed, applied, "game speed clamped");
                }
                self.speed = applied;
            }
            None => warn!(requested = speed, "ignoring non-finite game speed"),
        }
        self.speed
    }

    /// Game speed multiplier in effect.
    #[must_use]
    pub const fn game_speed(&self) -> f64 {
        self.speed
    }

    /// Logic time elapsed since the clock was created.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Logic ticks executed so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Frames processed so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Most recently published frames per second.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps.rate()
    }

    /// Most recently published logic ticks per second.
    #[must_use]
    pub fn tps(&self) -> f64 {
        self.tps.rate()
    }

    /// Registers a logic subscriber; subscribers run in registration order.
    pub fn subscribe_logic<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&mut C, &GameTime) -> anyhow::Result<()> + 'static,
    {
        let id = self.allocate_subscription();
        let subscriber: LogicSubscriber<C> = Box::new(subscriber);
        self.logic.push((id, subscriber));
        id
    }

    /// Registers a render subscriber; subscribers run in registration order.
    pub fn subscribe_render<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&C, &RenderTime) + 'static,
    {
        let id = self.allocate_subscription();
        let subscriber: RenderSubscriber<C> = Box::new(subscriber);
        self.render.push((id, subscriber));
        id
    }

    /// Removes a subscriber of either kind.
    ///
    /// Returns `false` when the handle is not registered.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        if let Some(index) = self.logic.iter().position(|(id, _)| *id == subscription) {
            drop(self.logic.remove(index));
            return true;
        }
        if let Some(index) = self.render.iter().position(|(id, _)| *id == subscription) {
            drop(self.render.remove(index));
            return true;
        }
        false
    }

    /// Processes one rendered frame observed at the monotonic timestamp `now`.
    ///
    /// Executes every logic tick that became due, bounded by the configured
    /// catch-up cap, then runs every render subscriber once. Scaled time short
    /// of a whole tick carries over to the next frame. A failing logic
    /// subscriber aborts the rest of the frame and is reported as
    /// [`ClockError::Subscriber`]; the clock keeps running.
    pub fn frame(&mut self, now: Duration, context: &mut C) -> Result<FrameReport, ClockError> {
        if !self.running {
            return Ok(FrameReport::default());
        }

        let delta = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_frame = Some(now);
        self.frames += 1;
        if !self.paused {
            self.render_elapsed = self.render_elapsed.saturating_add(delta.mul_f64(self.speed));
        }
        self.fps.record(delta, 1);

        let mut report = FrameReport {
            delta,
            ticks: 0,
            dropped_ticks: 0,
            processed: true,
        };

        if !self.paused {
            let due = self.drain_due_ticks(delta, &mut report);
            for _ in 0..due {
                self.ticks += 1;
                self.elapsed = self.elapsed.saturating_add(self.tick_interval);
                report.ticks += 1;
                let time = GameTime {
                    elapsed: self.elapsed,
                    delta: self.tick_interval,
                    speed: self.speed,
                    tick: self.ticks,
                    frame: self.frames,
                };
                self.run_logic(context, &time)?;
            }
        }
        self.tps.record(delta, report.ticks);

        let time = RenderTime {
            elapsed: self.render_elapsed,
            delta,
            fps: self.fps.rate(),
            tps: self.tps.rate(),
            frame: self.frames,
        };
        for (_, subscriber) in &mut self.render {
            subscriber(&*context, &time);
        }

        Ok(report)
    }

    fn drain_due_ticks(&mut self, delta: Duration, report: &mut FrameReport) -> u64 {
        self.accumulator = self.accumulator.saturating_add(delta.mul_f64(self.speed));
        let interval = self.tick_interval.as_nanos().max(1);
        let due = u64::try_from(self.accumulator.as_nanos() / interval).unwrap_or(u64::MAX);
        let cap = u64::from(self.config.max_ticks_per_frame().get());

        if due > cap {
            report.dropped_ticks = due - cap;
            self.accumulator = Duration::ZERO;
            warn!(
                due,
                executed = cap,
                dropped = report.dropped_ticks,
                "frame exceeded catch-up cap"
            );
            return cap;
        }

        let consumed = u32::try_from(due)
            .ok()
            .and_then(|due| self.tick_interval.checked_mul(due))
            .unwrap_or(self.accumulator);
        self.accumulator = self.accumulator.saturating_sub(consumed);
        due
    }

    fn run_logic(&mut self, context: &mut C, time: &GameTime) -> Result<(), ClockError> {
        for (id, subscriber) in &mut self.logic {
            subscriber(context, time).map_err(|source| {
                warn!(subscription = id.get(), tick = time.tick, error = %source, "logic subscriber failed");
                ClockError::Subscriber {
                    subscription: *id,
                    tick: time.tick,
                    source,
                }
            })?;
        }
        Ok(())
    }

    fn allocate_subscription(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, num::NonZeroU32, rc::Rc};

    #[derive(Debug, Default)]
    struct Recorder {
        ticks: Vec<u64>,
        log: Vec<String>,
    }

    fn millis(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn clock() -> SimulationClock<Recorder> {
        let mut clock = SimulationClock::new(ClockConfig::default());
        let _ = clock.subscribe_logic(|recorder: &mut Recorder, time: &GameTime| {
            recorder.ticks.push(time.tick);
            Ok(())
        });
        clock
    }

    #[test]
    fn hundred_millisecond_frame_runs_three_ticks_at_thirty_hertz() {
        let mut clock = clock();
        let mut recorder = Recorder::default();
        assert!(clock.start(Duration::ZERO));

        let report = clock.frame(millis(100), &mut recorder).expect("frame");

        assert_eq!(report.ticks, 3);
        assert_eq!(report.dropped_ticks, 0);
        assert_eq!(recorder.ticks, vec![1, 2, 3]);
        assert_eq!(clock.elapsed(), clock.tick_interval() * 3);
    }

    #[test]
    fn fractional_time_carries_into_later_frames() {
        let mut clock = clock();
        let mut recorder = Recorder::default();
        let _ = clock.start(Duration::ZERO);

        let ticks: u64 = (1..=10)
            .map(|frame| {
                clock
                    .frame(millis(20 * frame), &mut recorder)
                    .expect("frame")
                    .ticks
            })
            .sum();

        assert_eq!(ticks, 6);
    }

    #[test]
    fn game_speed_scales_logic_time() {
        let mut clock = clock();
        let mut recorder = Recorder::default();
        let _ = clock.start(Duration::ZERO);
        assert_eq!(clock.set_game_speed(2.0), 2.0);

        let report = clock.frame(millis(100), &mut recorder).expect("frame");

        assert_eq!(report.ticks, 6);
    }

    #[test]
    fn game_speed_is_clamped_and_non_finite_requests_ignored() {
        let mut clock: SimulationClock<Recorder> = SimulationClock::new(ClockConfig::default());

        assert_eq!(clock.set_game_speed(10.0), MAX_GAME_SPEED);
        assert_eq!(clock.set_game_speed(0.0), MIN_GAME_SPEED);
        assert_eq!(clock.set_game_speed(f64::NAN), MIN_GAME_SPEED);
        assert_eq!(clock.game_speed(), MIN_GAME_SPEED);

        let clamped = SimulationClock::<Recorder>::new(ClockConfig::default().with_game_speed(9.0));
        assert_eq!(clamped.game_speed(), MAX_GAME_SPEED);
    }

    #[test]
    fn paused_clock_renders_without_ticking_and_resume_skips_paused_time() {
        let mut clock = clock();
        let renders = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&renders);
        let _ = clock.subscribe_render(move |recorder: &Recorder, time: &RenderTime| {
            sink.borrow_mut().push((time.frame, recorder.ticks.len()));
        });
        let elapsed = Rc::new(RefCell::new(Vec::new()));
        let elapsed_sink = Rc::clone(&elapsed);
        let _ = clock.subscribe_render(move |_: &Recorder, time: &RenderTime| {
            elapsed_sink.borrow_mut().push(time.elapsed);
        });
        let mut recorder = Recorder::default();
        let _ = clock.start(Duration::ZERO);

        assert!(clock.pause());
        assert!(!clock.pause());
        let report = clock.frame(millis(500), &mut recorder).expect("frame");
        assert!(report.processed);
        assert_eq!(report.ticks, 0);
        assert_eq!(*renders.borrow(), vec![(1, 0)]);

        assert!(clock.resume(Duration::from_secs(10)));
        assert!(!clock.resume(Duration::from_secs(10)));
        let report = clock
            .frame(Duration::from_secs(10) + millis(100), &mut recorder)
            .expect("frame");

        assert_eq!(report.ticks, 3);
        assert_eq!(recorder.ticks, vec![1, 2, 3]);
        assert_eq!(*renders.borrow(), vec![(1, 0), (2, 3)]);
        assert_eq!(*elapsed.borrow(), vec![Duration::ZERO, millis(100)]);
    }

    #[test]
    fn render_elapsed_freezes_while_paused_and_follows_game_speed() {
        let mut clock = clock();
        let _ = clock.set_game_speed(2.0);
        let elapsed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&elapsed);
        let _ = clock.subscribe_render(move |_: &Recorder, time: &RenderTime| {
            sink.borrow_mut().push(time.elapsed);
        });
        let mut recorder = Recorder::default();
        let _ = clock.start(Duration::ZERO);

        let _ = clock.frame(Duration::from_secs(1), &mut recorder).expect("frame");
        assert!(clock.pause());
        let _ = clock.frame(Duration::from_secs(60), &mut recorder).expect("frame");

        assert_eq!(
            *elapsed.borrow(),
            vec![Duration::from_secs(2), Duration::from_secs(2)]
        );
    }

    #[test]
    fn long_stall_is_capped_and_excess_discarded() {
        let config = ClockConfig::default()
            .with_max_ticks_per_frame(NonZeroU32::new(5).expect("non-zero"));
        let mut clock = SimulationClock::new(config);
        let _ = clock.subscribe_logic(|recorder: &mut Recorder, time: &GameTime| {
            recorder.ticks.push(time.tick);
            Ok(())
        });
        let mut recorder = Recorder::default();
        let _ = clock.start(Duration::ZERO);

        let stalled = clock.frame(Duration::from_secs(10), &mut recorder).expect("frame");
        assert_eq!(stalled.ticks, 5);
        assert_eq!(stalled.dropped_ticks, 295);

        let next = clock
            .frame(Duration::from_secs(10) + millis(100), &mut recorder)
            .expect("frame");
        assert_eq!(next.ticks, 3);
        assert_eq!(recorder.ticks.len(), 8);
    }

    #[test]
    fn start_and_stop_are_idempotent_and_stopped_clock_ignores_frames() {
        let mut clock = clock();
        let mut recorder = Recorder::default();

        assert!(!clock.stop());
        let idle = clock.frame(millis(100), &mut recorder).expect("frame");
        assert!(!idle.processed);

        assert!(clock.start(Duration::ZERO));
        assert!(!clock.start(millis(50)));
        let _ = clock.frame(millis(100), &mut recorder).expect("frame");
        assert!(clock.stop());
        assert!(!clock.stop());

        let ignored = clock.frame(millis(900), &mut recorder).expect("frame");
        assert!(!ignored.processed);
        assert_eq!(clock.ticks(), 3);
        assert_eq!(clock.frames(), 1);
    }

    #[test]
    fn subscribers_run_in_registration_order_until_unsubscribed() {
        let mut clock: SimulationClock<Recorder> = SimulationClock::new(ClockConfig::default());
        let first = clock.subscribe_logic(|recorder: &mut Recorder, _: &GameTime| {
            recorder.log.push("first".to_owned());
            Ok(())
        });
        let _ = clock.subscribe_logic(|recorder: &mut Recorder, _: &GameTime| {
            recorder.log.push("second".to_owned());
            Ok(())
        });
        let mut recorder = Recorder::default();
        let _ = clock.start(Duration::ZERO);

        let _ = clock.frame(millis(34), &mut recorder).expect("frame");
        assert_eq!(recorder.log, vec!["first", "second"]);

        assert!(clock.unsubscribe(first));
        assert!(!clock.unsubscribe(first));
        let _ = clock.frame(millis(68), &mut recorder).expect("frame");
        assert_eq!(recorder.log, vec!["first", "second", "second"]);
    }

    #[test]
    fn failing_subscriber_aborts_the_frame_but_not_the_clock() {
        let mut clock: SimulationClock<Recorder> = SimulationClock::new(ClockConfig::default());
        let failing = clock.subscribe_logic(|_: &mut Recorder, time: &GameTime| {
            if time.tick == 2 {
                anyhow::bail!("broken pipeline");
            }
            Ok(())
        });
        let _ = clock.subscribe_logic(|recorder: &mut Recorder, time: &GameTime| {
            recorder.ticks.push(time.tick);
            Ok(())
        });
        let mut recorder = Recorder::default();
        let _ = clock.start(Duration::ZERO);

        let error = clock
            .frame(millis(100), &mut recorder)
            .expect_err("second tick fails");

        let ClockError::Subscriber {
            subscription, tick, ..
        } = &error;
        assert_eq!(*subscription, failing);
        assert_eq!(*tick, 2);
        assert_eq!(recorder.ticks, vec![1]);
        assert!(clock.is_running());

        let report = clock.frame(millis(200), &mut recorder).expect("frame");
        assert_eq!(report.ticks, 3);
    }

    #[test]
    fn rates_are_published_after_a_full_window() {
        let mut clock = clock();
        let _ = clock.subscribe_render(|_: &Recorder, _: &RenderTime| {});
        let mut recorder = Recorder::default();
        let _ = clock.start(Duration::ZERO);

        for frame in 1..=9 {
            let _ = clock.frame(millis(100 * frame), &mut recorder).expect("frame");
        }
        assert_eq!(clock.fps(), 0.0);

        let _ = clock.frame(millis(1_000), &mut recorder).expect("frame");
        assert!((clock.fps() - 10.0).abs() < 1e-9);
        assert!((clock.tps() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn render_runs_once_per_frame_after_logic() {
        let mut clock = clock();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _ = clock.subscribe_render(move |recorder: &Recorder, time: &RenderTime| {
            sink.borrow_mut().push((time.delta, time.elapsed, recorder.ticks.len()));
        });
        let mut recorder = Recorder::default();
        let _ = clock.start(Duration::ZERO);

        let _ = clock.frame(millis(16), &mut recorder).expect("frame");
        let _ = clock.frame(millis(116), &mut recorder).expect("frame");

        assert_eq!(
            *seen.borrow(),
            vec![(millis(16), millis(16), 0), (millis(100), millis(116), 3)]
        );
    }
}
