//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements          | Connects to                    |
//! |-----------------|---------------------|--------------------------------|
//! | `command_table` | CommandChannel      | console command registry       |
//! | `log_sink`      | EventSink           | `log` output                   |
//! | `print_state`   | PrintStateProvider  | atomic print-mode cache        |
//! | `serial_script` | ScriptRunner        | printer link (any `io::Write`) |
//! |                 | PauseController     | host action commands           |
//! | `time`          | Clock               | monotonic timer + reactor      |

pub mod command_table;
pub mod log_sink;
pub mod print_state;
pub mod serial_script;
pub mod time;
pub(super) mod utils;
