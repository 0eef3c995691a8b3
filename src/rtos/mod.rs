//! Hardware-agnostic scheduler core

pub mod scheduler;
pub mod tick;
pub mod timer;

// Re-export commonly used types
pub use scheduler::{Callback, Error, Scheduler, TaskState, ThreadHandle};
pub use tick::{PolledClock, SystemTick, Tick, TickSource};
pub use timer::{Delay, NotStarted, ThreadTimer, TimerPoll, TimerState};
