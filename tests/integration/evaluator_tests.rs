//! The evaluator on its own thread, against the real clock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::mock_ports::{RecordingPause, RecordingRunner, RecordingSink, test_config};

use pelletfeed::adapters::print_state::SharedPrintState;
use pelletfeed::adapters::time::MonotonicClock;
use pelletfeed::app::events::AppEvent;
use pelletfeed::app::ports::{Clock, OperatingMode};
use pelletfeed::app::service::{Evaluator, PelletSensor};
use pelletfeed::config::SensorConfig;
use pelletfeed::dispatch::EventDispatcher;
use pelletfeed::scheduler;

fn fast_config() -> SensorConfig {
    SensorConfig {
        debounce_interval_ms: 50,
        tick_interval_ms: 10,
        pause_on_runout: false,
        ..test_config()
    }
}

#[test]
fn spawned_evaluator_fires_and_stops_cleanly() {
    let config = fast_config();
    let clock = MonotonicClock::new();
    let print_state = Arc::new(SharedPrintState::new(0));
    print_state.report(OperatingMode::Printing, clock.now_ms());

    let runner = RecordingRunner::default();
    let sink = RecordingSink::default();
    let sensor = Arc::new(PelletSensor::new(&config, print_state, clock.now_ms()));
    let dispatcher =
        EventDispatcher::new(&config, runner.clone(), RecordingPause::default(), clock);
    let handle = scheduler::spawn(Evaluator::new(&config, sensor.clone(), dispatcher, sink.clone()))
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while runner.scripts().is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(runner.scripts(), vec!["RUNOUT\nM400".to_string()]);
    assert!(sensor.feeder().is_on());

    handle.stop();
    let events = sink.events();
    assert_eq!(events.first(), Some(&AppEvent::Started));
    assert_eq!(events.last(), Some(&AppEvent::Stopped));
}

#[test]
fn dropping_the_handle_stops_the_thread() {
    let config = fast_config();
    let clock = MonotonicClock::new();
    let sink = RecordingSink::default();
    let sensor = Arc::new(PelletSensor::new(
        &config,
        Arc::new(SharedPrintState::new(0)),
        clock.now_ms(),
    ));
    let dispatcher = EventDispatcher::new(
        &config,
        RecordingRunner::default(),
        RecordingPause::default(),
        clock,
    );

    drop(scheduler::spawn(Evaluator::new(&config, sensor, dispatcher, sink.clone())).unwrap());
    assert_eq!(sink.events().last(), Some(&AppEvent::Stopped));
}

#[test]
fn stop_during_pause_delay_completes_the_runout() {
    let config = SensorConfig {
        pause_on_runout: true,
        ..fast_config()
    };
    let clock = MonotonicClock::new();
    let print_state = Arc::new(SharedPrintState::new(0));
    print_state.report(OperatingMode::Printing, clock.now_ms());

    let runner = RecordingRunner::default();
    let pause = RecordingPause::default();
    let sink = RecordingSink::default();
    let sensor = Arc::new(PelletSensor::new(&config, print_state, clock.now_ms()));
    let dispatcher = EventDispatcher::new(&config, runner.clone(), pause.clone(), clock);
    let handle = scheduler::spawn(Evaluator::new(&config, sensor.clone(), dispatcher, sink.clone()))
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while pause.requests() == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(pause.requests(), 1);
    assert!(runner.scripts().is_empty(), "stopped inside the pause delay");

    handle.stop();

    assert_eq!(runner.scripts(), vec!["PAUSE\nRUNOUT\nM400".to_string()]);
    assert!(sensor.feeder().is_on());
    let events = sink.events();
    assert_eq!(events.last(), Some(&AppEvent::Stopped));
    assert!(!events.iter().any(|e| matches!(e, AppEvent::ScriptFailed { .. })));
}
