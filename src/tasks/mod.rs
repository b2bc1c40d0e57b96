//! Background Tasks Module
//!
//! # Tasks
//! - Retention sweep: drops entries older than the retention horizon
//! - Job polling: bounded, cancellable polling of long-running upstream jobs

mod cleanup;
mod poll;

pub use cleanup::spawn_cleanup_task;
pub use poll::{poll_until_ready, poll_until_ready_with_progress, PollError};
