//! Application service — the hexagonal core.
//!
//! Two execution contexts share one [`PelletSensor`]:
//!
//! ```text
//!  switch edge ──▶ PelletSensor::observe ──┐            ┌──▶ FeederState
//!  (callback)                              │  lock      │
//!                                   DebounceEngine ◀────┤
//!  Evaluator::run_once ──▶ PelletSensor::evaluate ──┘   │
//!  (periodic task)          │                           │
//!                           └──▶ EventDispatcher ───────┴──▶ ScriptRunner
//! ```
//!
//! The engine sits behind a single blocking mutex.  Every critical
//! section is a short closure that returns a [`Transition`]; the lock is
//! always released before the gate, the dispatcher, or any other
//! collaborator is called.  Transitions raised outside the tick
//! (corrective force-off, emergency) are queued and dispatched by the
//! evaluator ahead of its next tick, so scripts only ever run on the
//! evaluator task.

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{debug, info, warn};

use crate::config::SensorConfig;
use crate::debounce::{DebounceEngine, SensorStatus, Transition};
use crate::dispatch::{EventDispatcher, FeederState, SensorEvent};
use crate::gate::OperatingModeGate;

use super::events::AppEvent;
use super::ports::{Clock, EventSink, PauseController, PrintStateProvider, ScriptRunner};

/// Events queued between evaluator ticks.
const PENDING_DEPTH: usize = 4;

/// Shutdown request for the evaluator task.
pub type ShutdownSignal = Signal<CriticalSectionRawMutex, ()>;

// ───────────────────────────────────────────────────────────────
// PelletSensor
// ───────────────────────────────────────────────────────────────

/// Shared state of one hopper switch.  Wrap in an `Arc` to hand it to
/// both the observation callback and the evaluator.
pub struct PelletSensor<P> {
    name: String,
    engine: Mutex<CriticalSectionRawMutex, RefCell<DebounceEngine>>,
    feeder: FeederState,
    gate: OperatingModeGate<P>,
    pending: Channel<CriticalSectionRawMutex, SensorEvent, PENDING_DEPTH>,
}

impl<P: PrintStateProvider> PelletSensor<P> {
    pub fn new(config: &SensorConfig, provider: P, now_ms: u64) -> Self {
        Self {
            name: config.name.clone(),
            engine: Mutex::new(RefCell::new(DebounceEngine::new(
                config.debounce_interval_ms,
                now_ms,
            ))),
            feeder: FeederState::new(),
            gate: OperatingModeGate::new(provider),
            pending: Channel::new(),
        }
    }

    /// Record a raw switch level.  Callable from any context.
    pub fn observe(&self, raw: bool, now_ms: u64) {
        info!(
            "{}: {}",
            self.name,
            if raw { "Filament Detected" } else { "Filament Not Detected" }
        );

        let printing = self.gate.is_printing(now_ms);
        let feeder_on = self.feeder.is_on();
        let transition = self
            .engine
            .lock(|e| e.borrow_mut().observe(raw, printing, feeder_on));

        if transition == Some(Transition::ForceOff) {
            self.force_off();
        }
    }

    /// Advance the engine.  Debounced transitions are returned for the
    /// caller to dispatch; the corrective path is handled here.
    pub fn evaluate(&self, now_ms: u64) -> Option<Transition> {
        let printing = self.gate.is_printing(now_ms);
        let feeder_on = self.feeder.is_on();
        let transition = self
            .engine
            .lock(|e| e.borrow_mut().tick(now_ms, printing, feeder_on));

        if transition == Some(Transition::ForceOff) {
            self.force_off();
            return None;
        }
        transition
    }

    /// Caller-invoked stop, outside the debounce cycle.  Honoured even
    /// while the sensor is disabled.
    pub fn request_emergency(&self) {
        warn!("{}: emergency requested", self.name);
        self.feeder.set(false);
        self.post(SensorEvent::Emergency);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.engine.lock(|e| e.borrow_mut().set_enabled(enabled));
        info!(
            "{}: sensor {}",
            self.name,
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Instantaneous detection plus the enable flag.
    pub fn get_status(&self, _now_ms: u64) -> SensorStatus {
        self.engine.lock(|e| e.borrow().current_state())
    }

    pub fn is_enabled(&self) -> bool {
        self.engine.lock(|e| e.borrow().state().enabled)
    }

    pub fn feeder(&self) -> &FeederState {
        &self.feeder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next queued event, if any.
    pub fn take_pending(&self) -> Option<SensorEvent> {
        self.pending.try_receive().ok()
    }

    /// Corrective transition: the feeder goes off right away; the
    /// filled-up script follows on the evaluator unless disabled.
    fn force_off(&self) {
        if self.feeder.set(false) {
            info!("{}: not printing, feeder forced off", self.name);
        }
        if self.is_enabled() {
            self.post(SensorEvent::FilledUp);
        } else {
            debug!("{}: disabled, corrective script suppressed", self.name);
        }
    }

    fn post(&self, event: SensorEvent) {
        if self.pending.try_send(event).is_err() {
            warn!("{}: event queue full, dropping {:?}", self.name, event);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Evaluator
// ───────────────────────────────────────────────────────────────

/// Periodic evaluation loop.  Owns the dispatcher, so scripts, pauses
/// and their delays only ever run here.
pub struct Evaluator<P, R, Z, C, E> {
    sensor: Arc<PelletSensor<P>>,
    dispatcher: EventDispatcher<R, Z, C>,
    sink: E,
    tick_ms: u64,
}

impl<P, R, Z, C, E> Evaluator<P, R, Z, C, E>
where
    P: PrintStateProvider,
    R: ScriptRunner,
    Z: PauseController,
    C: Clock,
    E: EventSink,
{
    pub fn new(
        config: &SensorConfig,
        sensor: Arc<PelletSensor<P>>,
        dispatcher: EventDispatcher<R, Z, C>,
        sink: E,
    ) -> Self {
        Self {
            sensor,
            dispatcher,
            sink,
            tick_ms: config.tick_interval_ms,
        }
    }

    /// One evaluation: drain events queued by other contexts, then tick
    /// the engine and dispatch what settled.
    ///
    /// Queued events always predate the tick, so they run first and the
    /// feeder is left at the level of the freshest event.
    pub async fn run_once(&mut self) {
        while let Some(event) = self.sensor.take_pending() {
            self.fire(event, None).await;
        }

        let now_ms = self.dispatcher.clock().now_ms();
        if let Some(transition) = self.sensor.evaluate(now_ms) {
            self.fire(SensorEvent::from(transition), transition.window()).await;
        }
    }

    /// Run at the configured cadence until `shutdown` is signalled.
    ///
    /// Shutdown is only observed between evaluations, so a dispatch is
    /// never left half-applied.
    pub async fn run(&mut self, shutdown: &ShutdownSignal) {
        info!(
            "{}: evaluator started ({} ms cadence)",
            self.sensor.name(),
            self.tick_ms
        );
        self.sink.emit(&AppEvent::Started);

        let mut next_ms = self.dispatcher.clock().now_ms();
        loop {
            self.run_once().await;

            let clock = self.dispatcher.clock();
            next_ms = next_ms.saturating_add(self.tick_ms).max(clock.now_ms());
            let stop = future::or(
                async {
                    shutdown.wait().await;
                    true
                },
                async {
                    clock.sleep_until(next_ms).await;
                    false
                },
            )
            .await;
            if stop {
                break;
            }
        }

        info!("{}: evaluator stopped", self.sensor.name());
        self.sink.emit(&AppEvent::Stopped);
    }

    async fn fire(&mut self, event: SensorEvent, window: Option<(u64, u64)>) {
        match window {
            Some((since_ms, at_ms)) => {
                info!(
                    "{}: debounce interval elapsed {} ms (from {} to {})",
                    self.sensor.name(),
                    at_ms.saturating_sub(since_ms),
                    since_ms,
                    at_ms
                );
                self.sink.emit(&AppEvent::DebounceElapsed { event, since_ms, at_ms });
            }
            None => self.sink.emit(&AppEvent::Dispatched(event)),
        }

        if let Err(error) = self.dispatcher.dispatch(event, self.sensor.feeder()).await {
            self.sink.emit(&AppEvent::ScriptFailed { event, error });
        }
    }
}
