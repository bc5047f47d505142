//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod auto_off_timer;
pub mod daily_reset;
pub mod poll_loop;

// Re-export main functions
pub use auto_off_timer::auto_off_timer_task;
pub use daily_reset::{daily_reset_task, run_daily_reset};
pub use poll_loop::poll_loop_task;
