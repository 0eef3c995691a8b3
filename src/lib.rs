//! RTM: ultra lightweight cooperative multithreading for microcontrollers
//!
//! Multiplexes independently-periodic threads onto a single 1 ms tick
//! source through a fixed-size, statically-allocated thread table. No
//! preemption, no priorities, no heap: callbacks run to completion in
//! registration order whenever their period expires.
//!
//! The core is hardware-agnostic; any [`TickSource`] drives it. The
//! `atmega128` feature adds a TC0-based tick interrupt and a demo binary.
//!
//! ```
//! use core::cell::Cell;
//! use rtm::{PolledClock, Scheduler};
//!
//! let millis = Cell::new(0u32);
//! let mut blink = || { /* toggle an LED */ };
//!
//! let mut sched: Scheduler<_, 4> = Scheduler::new(PolledClock::new(|| millis.get()));
//! sched.init();
//! let led = sched.create(500, &mut blink)?;
//!
//! // Host main loop: the clock advances, every due thread gets a turn.
//! millis.set(500);
//! sched.dispatch();
//!
//! sched.suspend(led)?;
//! # Ok::<(), rtm::Error>(())
//! ```
#![no_std]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

pub mod config;
pub mod rtos;

#[cfg(all(feature = "atmega128", target_arch = "avr"))]
pub mod hal;

pub use rtos::scheduler::{Callback, Error, Scheduler, TaskState, ThreadHandle};
pub use rtos::tick::{PolledClock, SystemTick, Tick, TickSource};
pub use rtos::timer::{Delay, NotStarted, ThreadTimer, TimerPoll, TimerState};
