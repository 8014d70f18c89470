//! Printer-link script adapter.
//!
//! Sends rendered scripts to the printer host one line at a time over any
//! `io::Write` (UART console on the device, a `Vec<u8>` in tests).  The
//! host's own macro engine does the real templating; rendering here only
//! normalises the text and rejects lines the link cannot carry.

use std::io::Write;

use log::debug;

use crate::app::ports::{PauseController, ScriptRunner};
use crate::error::{Collaborator, Error, Result, ScriptError};

use super::utils::is_printable_ascii;

/// Host action understood by print servers as "pause the job".
pub const PAUSE_ACTION: &str = "//action:pause";

pub struct SerialScriptRunner<W> {
    out: W,
}

impl<W: Write> SerialScriptRunner<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ScriptRunner for SerialScriptRunner<W> {
    fn render(&mut self, template: &str) -> core::result::Result<String, ScriptError> {
        let mut rendered = String::with_capacity(template.len());
        for line in template.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !is_printable_ascii(line) {
                return Err(ScriptError::Render(format!("unprintable line: {line:?}")));
            }
            rendered.push_str(line);
            rendered.push('\n');
        }
        rendered.pop();
        Ok(rendered)
    }

    fn run_script(&mut self, script: &str) -> core::result::Result<(), ScriptError> {
        for line in script.lines().filter(|l| !l.is_empty()) {
            debug!("-> {}", line);
            writeln!(self.out, "{line}").map_err(|e| ScriptError::Execution(e.to_string()))?;
        }
        self.out
            .flush()
            .map_err(|e| ScriptError::Execution(e.to_string()))
    }
}

/// Requests a pause by emitting a host action line.
pub struct SerialPauseController<W> {
    out: W,
}

impl<W: Write> SerialPauseController<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> PauseController for SerialPauseController<W> {
    fn request_pause(&mut self) -> Result<()> {
        writeln!(self.out, "{PAUSE_ACTION}")
            .and_then(|()| self.out.flush())
            .map_err(|e| {
                log::warn!("Pause request not delivered: {}", e);
                Error::Unavailable(Collaborator::PauseResume)
            })
    }
}
