//! Switch input, feeder output, and task placement.

pub mod relay;
pub mod switch;
pub mod task_pin;
