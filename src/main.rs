//! Pellet feeder firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  HopperSwitch  FeederRelay  SharedPrintState  MonotonicClock │
//! │  SerialScriptRunner  SerialPauseController  LogEventSink     │
//! │  CommandTable (console)                                      │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ─────────────────       │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  PelletSensor (debounce · gate · feeder state)         │  │
//! │  │  Evaluator (own thread) ─▶ EventDispatcher             │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The main loop polls the switch and the printer's "printing" line,
//! mirrors the feeder state onto the relay and answers console commands.
//! Debounce evaluation and script dispatch run on the evaluator thread.
#![deny(unused_must_use)]

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{Context, Result};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use log::{info, warn};

use pelletfeed::adapters::command_table::CommandTable;
use pelletfeed::adapters::log_sink::LogEventSink;
use pelletfeed::adapters::print_state::SharedPrintState;
use pelletfeed::adapters::serial_script::{SerialPauseController, SerialScriptRunner};
use pelletfeed::adapters::time::MonotonicClock;
use pelletfeed::app::commands::ControlSurface;
use pelletfeed::app::ports::{Clock, OperatingMode};
use pelletfeed::app::service::{Evaluator, PelletSensor};
use pelletfeed::config::SensorConfig;
use pelletfeed::dispatch::EventDispatcher;
use pelletfeed::drivers::relay::FeederRelay;
use pelletfeed::drivers::switch::HopperSwitch;
use pelletfeed::drivers::task_pin::{Core, spawn_on_core};
use pelletfeed::scheduler;

const DEFAULT_CONFIG: &str = include_str!("../config/pelletfeed.json");

/// Main loop period.
const POLL_MS: u32 = 10;

/// The printing line is re-reported every poll; a stuck loop goes stale.
const PRINT_STATE_STALE_MS: u32 = 1_000;

/// Printer's emergency stop; also stops the feeder.
const EMERGENCY_COMMAND: &str = "M112";

type ConsoleLine = heapless::String<96>;

/// Console lines from the reader thread to the main loop.
static CONSOLE: Channel<CriticalSectionRawMutex, ConsoleLine, 4> = Channel::new();

fn spawn_console_reader() -> Result<()> {
    spawn_on_core(Core::Pro, 5, 4, "console-rx\0", || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { continue };
            let mut msg = ConsoleLine::new();
            if msg.push_str(line.trim()).is_err() {
                warn!("Console: line too long, dropped");
                continue;
            }
            if CONSOLE.try_send(msg).is_err() {
                warn!("Console: queue full, dropping line");
            }
        }
    })
    .context("console reader spawn")?;
    Ok(())
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("pelletfeed v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = SensorConfig::from_json(DEFAULT_CONFIG).unwrap_or_else(|e| {
        warn!("Bundled config rejected ({}), using defaults", e);
        SensorConfig::default()
    });

    // ── 3. Hardware ───────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;
    let mut switch = HopperSwitch::new(PinDriver::input(pins.gpio4)?, config.invert_switch);
    let mut relay = FeederRelay::new(PinDriver::output(pins.gpio5)?)?;
    let printing_line = PinDriver::input(pins.gpio6)?;

    // ── 4. Core ───────────────────────────────────────────────
    let clock = MonotonicClock::new();
    let print_state = Arc::new(SharedPrintState::new(PRINT_STATE_STALE_MS));
    let sensor = Arc::new(PelletSensor::new(&config, print_state.clone(), clock.now_ms()));

    let dispatcher = EventDispatcher::new(
        &config,
        SerialScriptRunner::new(std::io::stdout()),
        SerialPauseController::new(std::io::stdout()),
        clock,
    );
    let evaluator = Evaluator::new(
        &config,
        sensor.clone(),
        dispatcher,
        LogEventSink::new(&config.name),
    );
    let evaluator_task = scheduler::spawn(evaluator)?;

    // ── 5. Console ────────────────────────────────────────────
    let surface = ControlSurface::new(&sensor);
    let mut commands = CommandTable::new();
    surface.register(&mut commands);
    for help in commands.help_lines() {
        info!("{}", help);
    }
    spawn_console_reader()?;

    info!("Sensor '{}' ready. Entering poll loop.", sensor.name());

    // ── 6. Poll loop ──────────────────────────────────────────
    loop {
        let now_ms = clock.now_ms();

        if evaluator_task.is_finished() {
            relay.force_off()?;
            anyhow::bail!("evaluator task exited, feeder released");
        }

        let mode = if printing_line.is_high() {
            OperatingMode::Printing
        } else {
            OperatingMode::Other
        };
        print_state.report(mode, now_ms);

        match switch.poll() {
            Ok(Some(level)) => sensor.observe(level, now_ms),
            Ok(None) => {}
            Err(e) => warn!("{}", e),
        }

        match relay.sync(sensor.feeder()) {
            Ok(true) => info!(
                "Feeder relay {}",
                if relay.is_energised() { "on" } else { "off" }
            ),
            Ok(false) => {}
            Err(e) => warn!("{}", e),
        }

        while let Ok(line) = CONSOLE.try_receive() {
            if line.eq_ignore_ascii_case(EMERGENCY_COMMAND) {
                sensor.request_emergency();
                continue;
            }
            let known = line
                .split_whitespace()
                .next()
                .is_some_and(|name| commands.knows(name));
            if !known {
                continue;
            }
            match surface.execute(&line, now_ms) {
                Ok(Some(reply)) => println!("{reply}"),
                Ok(None) => {}
                Err(e) => println!("!! {e}"),
            }
        }

        FreeRtos::delay_ms(POLL_MS);
    }
}
