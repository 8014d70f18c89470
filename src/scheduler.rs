//! Evaluator task placement.
//!
//! The evaluator runs in a dedicated thread on the application core.  The
//! thread drives a single-task `edge_executor::LocalExecutor` under
//! `futures_lite::future::block_on`; `async-io-mini` timers inside the
//! [`Clock`] adapter park it between ticks.
//!
//! ```text
//!  ┌──────────────────────────────────────────────┐
//!  │  pellet-eval thread (Core::App)              │
//!  │  ┌────────────────────────────────────────┐  │
//!  │  │  block_on(LocalExecutor::run(...))     │  │
//!  │  │     Evaluator::run(&shutdown)          │  │
//!  │  │       tick ─▶ dispatch ─▶ sleep_until  │  │
//!  │  └────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;

use log::{info, warn};

use crate::app::ports::{Clock, EventSink, PauseController, PrintStateProvider, ScriptRunner};
use crate::app::service::{Evaluator, ShutdownSignal};
use crate::drivers::task_pin::{Core, spawn_on_core};
use crate::error::{Error, Result};

const EVAL_PRIORITY: u8 = 10;
/// `log` formatting, script rendering and the executor all run on this
/// stack; 16 KB leaves headroom over the formatted status and script text.
const EVAL_STACK_KB: usize = 16;

/// Running evaluator.  Dropping the handle stops the task and joins it.
pub struct EvaluatorHandle {
    shutdown: Arc<ShutdownSignal>,
    thread: Option<JoinHandle<()>>,
}

impl EvaluatorHandle {
    /// Signal shutdown and wait for the in-flight evaluation to finish.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    fn shutdown_and_join(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.shutdown.signal(());
            if thread.join().is_err() {
                warn!("Evaluator thread panicked");
            }
        }
    }
}

impl Drop for EvaluatorHandle {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

/// Move `evaluator` onto its own thread and start the tick loop.
pub fn spawn<P, R, Z, C, E>(mut evaluator: Evaluator<P, R, Z, C, E>) -> Result<EvaluatorHandle>
where
    P: PrintStateProvider + Send + Sync + 'static,
    R: ScriptRunner + Send + 'static,
    Z: PauseController + Send + 'static,
    C: Clock + Send + 'static,
    E: EventSink + Send + 'static,
{
    let shutdown = Arc::new(ShutdownSignal::new());
    let stop = shutdown.clone();

    let thread = spawn_on_core(Core::App, EVAL_PRIORITY, EVAL_STACK_KB, "pellet-eval\0", move || {
        let executor: edge_executor::LocalExecutor<'_, 1> = edge_executor::LocalExecutor::new();
        futures_lite::future::block_on(executor.run(evaluator.run(&stop)));
    })
    .map_err(|e| {
        warn!("Evaluator spawn failed: {}", e);
        Error::Hardware("evaluator thread spawn failed")
    })?;

    info!("Evaluator task spawned");
    Ok(EvaluatorHandle {
        shutdown,
        thread: Some(thread),
    })
}
