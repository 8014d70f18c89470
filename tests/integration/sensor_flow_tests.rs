//! End-to-end sensor flows: switch observations through the evaluator to
//! recorded scripts and feeder state, all on virtual time.

use super::mock_ports::{Rig, test_config};

use pelletfeed::app::commands::ControlSurface;
use pelletfeed::app::events::AppEvent;
use pelletfeed::dispatch::SensorEvent;
use pelletfeed::error::ScriptError;

#[test]
fn empty_hopper_at_start_runs_runout_once() {
    let mut rig = Rig::new(&test_config());

    rig.run_span(0, 900);
    assert!(rig.runner.scripts().is_empty(), "nothing before the window closes");

    rig.run_span(1_000, 5_000);
    assert_eq!(rig.runner.scripts(), vec!["PAUSE\nRUNOUT\nM400".to_string()]);
    assert!(rig.feeder_on());
    assert_eq!(rig.pause.requests(), 1);
    assert!(rig.clock.sleeps().contains(&1_500), "pause delay measured on the clock");
}

#[test]
fn chatter_settles_into_one_event() {
    let mut rig = Rig::new(&test_config());
    rig.run_span(0, 1_400);
    assert_eq!(rig.runner.scripts().len(), 1);

    rig.sensor.observe(true, 1_450);
    rig.tick_at(1_500);
    rig.sensor.observe(false, 1_550);
    rig.tick_at(1_600);
    rig.sensor.observe(true, 1_650);
    rig.tick_at(1_700);

    rig.run_span(1_800, 2_600);
    assert_eq!(rig.runner.scripts().len(), 1, "still settling");

    rig.run_span(2_700, 6_000);
    let scripts = rig.runner.scripts();
    assert_eq!(scripts.len(), 2);
    assert_eq!(scripts[1], "FILLED\nM400");
    assert!(!rig.feeder_on());
}

#[test]
fn disabled_sensor_answers_queries_but_runs_nothing() {
    let mut rig = Rig::new(&test_config());
    let sensor = rig.sensor.clone();
    let surface = ControlSurface::new(&sensor);
    surface
        .execute("SET_FILAMENT_SENSOR SENSOR=hopper ENABLE=0", 0)
        .unwrap();

    for (i, level) in [true, false, true, true, false, true].into_iter().enumerate() {
        let t = i as u64 * 700;
        rig.sensor.observe(level, t);
        rig.tick_at(t);
        let reply = surface.execute("QUERY_FILAMENT_SENSOR SENSOR=hopper", t).unwrap();
        let expected = if level {
            "Pellet Sensor hopper: pellet detected"
        } else {
            "Pellet Sensor hopper: pellet not detected"
        };
        assert_eq!(reply.as_deref(), Some(expected));
    }
    rig.run_span(3_600, 8_000);

    assert!(rig.runner.scripts().is_empty());
    assert!(!rig.feeder_on());
}

#[test]
fn re_enabling_fires_the_settled_level() {
    let mut rig = Rig::new(&test_config());
    rig.sensor.set_enabled(false);
    rig.sensor.observe(true, 0);
    rig.run_span(0, 3_000);
    assert!(rig.runner.scripts().is_empty());

    rig.sensor.set_enabled(true);
    rig.tick_at(3_100);
    assert_eq!(rig.runner.scripts(), vec!["FILLED\nM400".to_string()]);
}

#[test]
fn idle_printer_forces_feeder_off() {
    let mut rig = Rig::new(&test_config());
    rig.run_span(0, 1_000);
    assert!(rig.feeder_on());

    rig.printing(false);
    rig.sensor.observe(false, 1_050);
    assert!(!rig.feeder_on(), "feeder off before the evaluator runs");

    rig.tick_at(1_100);
    assert_eq!(
        rig.runner.scripts().last().map(String::as_str),
        Some("FILLED\nM400")
    );
    assert!(rig.sink.events().contains(&AppEvent::Dispatched(SensorEvent::FilledUp)));

    // No runout while idle, however long the hopper stays empty.
    rig.run_span(1_200, 6_000);
    assert!(!rig.feeder_on());
    assert_eq!(rig.runner.scripts().len(), 2);
}

#[test]
fn feeder_resumes_once_printing_restarts() {
    let mut rig = Rig::new(&test_config());
    rig.run_span(0, 1_000);
    rig.printing(false);
    rig.sensor.observe(false, 1_050);
    rig.run_span(1_100, 2_000);
    assert!(!rig.feeder_on());

    rig.printing(true);
    rig.run_span(2_100, 4_000);
    assert!(rig.feeder_on(), "re-armed engine fires the still-empty hopper");
}

#[test]
fn emergency_stops_feeder_even_when_disabled() {
    let mut rig = Rig::new(&test_config());
    rig.run_span(0, 1_000);
    assert!(rig.feeder_on());

    rig.sensor.set_enabled(false);
    rig.sensor.request_emergency();
    assert!(!rig.feeder_on());

    rig.tick_at(1_100);
    assert_eq!(rig.runner.scripts().last().map(String::as_str), Some("STOP\nM400"));
}

#[test]
fn script_failure_does_not_stop_the_cycle() {
    let mut rig = Rig::new(&test_config());
    rig.runner.fail_runs(true);
    rig.run_span(0, 1_000);

    assert!(rig.feeder_on(), "feeder state set before the script runs");
    assert!(rig.sink.events().iter().any(|e| matches!(
        e,
        AppEvent::ScriptFailed {
            event: SensorEvent::Runout,
            error: ScriptError::Execution(_)
        }
    )));

    rig.runner.fail_runs(false);
    rig.sensor.observe(true, 1_050);
    rig.run_span(1_100, 2_100);
    assert_eq!(rig.runner.scripts(), vec!["FILLED\nM400".to_string()]);
}

#[test]
fn missing_pause_controller_still_runs_runout() {
    let mut rig = Rig::new(&test_config());
    rig.pause.set_missing(true);
    rig.run_span(0, 1_000);

    assert_eq!(rig.runner.scripts(), vec!["RUNOUT\nM400".to_string()]);
    assert!(rig.clock.sleeps().is_empty());
}

#[test]
fn observe_during_pause_delay_is_latched() {
    let mut rig = Rig::new(&test_config());
    let sensor = rig.sensor.clone();
    rig.clock.on_sleep(move |deadline| sensor.observe(true, deadline - 250));

    rig.run_span(0, 1_000);

    assert_eq!(rig.runner.scripts(), vec!["PAUSE\nRUNOUT\nM400".to_string()]);
    assert!(rig.sensor.get_status(1_500).filament_detected);
    assert!(rig.sensor.feeder().is_on(), "runout completed after the re-entrant observe");
}

#[test]
fn brief_idle_moment_does_not_leave_feeder_off() {
    let mut rig = Rig::new(&test_config());
    rig.run_span(0, 1_000);
    assert!(rig.feeder_on());

    // Print state drops out for a single observation, then comes back.
    rig.printing(false);
    rig.sensor.observe(false, 1_050);
    assert!(!rig.feeder_on());
    rig.printing(true);

    rig.run_span(1_100, 5_000);
    let scripts = rig.runner.scripts();
    assert_eq!(
        scripts,
        vec![
            "PAUSE\nRUNOUT\nM400".to_string(),
            "FILLED\nM400".to_string(),
            "PAUSE\nRUNOUT\nM400".to_string(),
        ]
    );
    assert!(rig.feeder_on(), "printing with an empty hopper keeps the feeder on");
}

#[test]
fn queued_emergency_runs_before_the_settled_event() {
    let mut rig = Rig::new(&test_config());
    rig.sensor.observe(true, 0);
    rig.run_span(0, 900);

    rig.sensor.request_emergency();
    rig.tick_at(1_000);

    assert_eq!(
        rig.runner.scripts(),
        vec!["STOP\nM400".to_string(), "FILLED\nM400".to_string()]
    );
    let events = rig.sink.events();
    let emergency = events
        .iter()
        .position(|e| *e == AppEvent::Dispatched(SensorEvent::Emergency));
    let settled = events.iter().position(|e| {
        matches!(e, AppEvent::DebounceElapsed { event: SensorEvent::FilledUp, .. })
    });
    assert!(emergency.unwrap() < settled.unwrap());
    assert!(!rig.feeder_on());
}
