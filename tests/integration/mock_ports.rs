//! Mock adapters for integration tests.
//!
//! Every mock hands out shared handles so a test can keep inspecting
//! what the evaluator did after moving the mock into it.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pelletfeed::adapters::print_state::SharedPrintState;
use pelletfeed::app::events::AppEvent;
use pelletfeed::app::ports::{
    Clock, EventSink, OperatingMode, PauseController, ScriptRunner,
};
use pelletfeed::app::service::{Evaluator, PelletSensor};
use pelletfeed::config::SensorConfig;
use pelletfeed::dispatch::EventDispatcher;
use pelletfeed::error::{Collaborator, Error, Result, ScriptError};

// ── ManualClock ───────────────────────────────────────────────

type SleepHook = Box<dyn FnMut(u64) + Send>;

/// Virtual time.  `sleep_until` jumps straight to the deadline after
/// running the optional hook, so suspension points are observable.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
    hook: Arc<Mutex<Option<SleepHook>>>,
    sleeps: Arc<Mutex<Vec<u64>>>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Called with the deadline each time something suspends.
    pub fn on_sleep(&self, hook: impl FnMut(u64) + Send + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn sleeps(&self) -> Vec<u64> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep_until(&self, deadline_ms: u64) -> impl Future<Output = ()> {
        self.sleeps.lock().unwrap().push(deadline_ms);
        if let Some(hook) = self.hook.lock().unwrap().as_mut() {
            hook(deadline_ms);
        }
        self.now.fetch_max(deadline_ms, Ordering::SeqCst);
        std::future::ready(())
    }
}

// ── RecordingRunner ───────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingRunner {
    scripts: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl RecordingRunner {
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }

    pub fn fail_runs(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl ScriptRunner for RecordingRunner {
    fn render(&mut self, template: &str) -> core::result::Result<String, ScriptError> {
        Ok(template.to_string())
    }

    fn run_script(&mut self, script: &str) -> core::result::Result<(), ScriptError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ScriptError::Execution("printer not ready".into()));
        }
        self.scripts.lock().unwrap().push(script.to_string());
        Ok(())
    }
}

// ── RecordingPause ────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingPause {
    requests: Arc<AtomicUsize>,
    missing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl RecordingPause {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn set_missing(&self, missing: bool) {
        self.missing.store(missing, Ordering::SeqCst);
    }
}

impl PauseController for RecordingPause {
    fn request_pause(&mut self) -> Result<()> {
        if self.missing.load(Ordering::SeqCst) {
            return Err(Error::Unavailable(Collaborator::PauseResume));
        }
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type TestSensor = PelletSensor<Arc<SharedPrintState>>;
pub type TestEvaluator =
    Evaluator<Arc<SharedPrintState>, RecordingRunner, RecordingPause, ManualClock, RecordingSink>;

/// A sensor, its evaluator and handles to every mock behind them.
pub struct Rig {
    pub sensor: Arc<TestSensor>,
    pub evaluator: TestEvaluator,
    pub clock: ManualClock,
    pub runner: RecordingRunner,
    pub pause: RecordingPause,
    pub sink: RecordingSink,
    pub print_state: Arc<SharedPrintState>,
}

pub fn test_config() -> SensorConfig {
    SensorConfig {
        name: "hopper".into(),
        runout_gcode: "RUNOUT".into(),
        filled_up_gcode: "FILLED".into(),
        emergency_gcode: "STOP".into(),
        ..SensorConfig::default()
    }
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: &SensorConfig) -> Self {
        let clock = ManualClock::default();
        let runner = RecordingRunner::default();
        let pause = RecordingPause::default();
        let sink = RecordingSink::default();
        let print_state = Arc::new(SharedPrintState::new(0));
        print_state.report(OperatingMode::Printing, 0);

        let sensor = Arc::new(PelletSensor::new(config, print_state.clone(), 0));
        let dispatcher = EventDispatcher::new(config, runner.clone(), pause.clone(), clock.clone());
        let evaluator = Evaluator::new(config, sensor.clone(), dispatcher, sink.clone());

        Self {
            sensor,
            evaluator,
            clock,
            runner,
            pause,
            sink,
            print_state,
        }
    }

    pub fn printing(&self, printing: bool) {
        let mode = if printing {
            OperatingMode::Printing
        } else {
            OperatingMode::Other
        };
        self.print_state.report(mode, self.clock.now_ms());
    }

    /// Run one evaluation at `at_ms`.
    pub fn tick_at(&mut self, at_ms: u64) {
        self.clock.set(at_ms);
        futures_lite::future::block_on(self.evaluator.run_once());
    }

    /// Evaluate every 100 ms from `from_ms` through `to_ms` inclusive.
    pub fn run_span(&mut self, from_ms: u64, to_ms: u64) {
        let mut t = from_ms;
        while t <= to_ms {
            self.tick_at(t);
            t += 100;
        }
    }

    pub fn feeder_on(&self) -> bool {
        self.sensor.feeder().is_on()
    }
}
