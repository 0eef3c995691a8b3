//! Tick counter and tick sources
//!
//! Everything in the scheduler measures time in ticks, nominally 1 ms.
//! The counter is free-running and wraps; elapsed time must always be
//! computed with wrapping subtraction, which stays correct across the
//! wrap.

use crate::config::TICKS_PER_SECOND;

/// Tick counter value. Wraps modulo `u32::MAX + 1`.
pub type Tick = u32;

/// A monotonically advancing tick counter.
///
/// Concrete sources are selected at configuration time: an
/// interrupt-fed counter ([`SystemTick`], `hal::HardwareTick`) or an
/// externally maintained millisecond clock ([`PolledClock`]).
pub trait TickSource {
    /// Bring up the underlying clock. Called once from `Scheduler::init`,
    /// before any tick is read.
    fn init(&mut self);

    /// Present tick value.
    fn current_tick(&mut self) -> Tick;
}

// Shared counter fed by the platform tick interrupt. Exactly one producer
// (the interrupt handler); readers may be interrupted by it at any point.
// On targets with native 32-bit atomics a relaxed load/store is a single
// machine word and needs no further synchronization. AVR is 8-bit and
// cannot load a u32 in one word, so that port wraps every access in a
// critical section instead.
#[cfg(all(target_arch = "avr", feature = "atmega128"))]
mod count {
    use avr_device::interrupt::{self, Mutex};
    use core::cell::Cell;

    static TICKS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
    static SECONDS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

    pub fn advance() {
        interrupt::free(|cs| {
            let ticks = TICKS.borrow(cs);
            let now = ticks.get().wrapping_add(1);
            ticks.set(now);
            if now != 0 && now % super::TICKS_PER_SECOND == 0 {
                let seconds = SECONDS.borrow(cs);
                seconds.set(seconds.get().wrapping_add(1));
            }
        });
    }

    pub fn now() -> u32 {
        interrupt::free(|cs| TICKS.borrow(cs).get())
    }

    pub fn reset() {
        interrupt::free(|cs| TICKS.borrow(cs).set(0));
    }

    pub fn seconds() -> u32 {
        interrupt::free(|cs| SECONDS.borrow(cs).get())
    }

    pub fn set_seconds(value: u32) {
        interrupt::free(|cs| SECONDS.borrow(cs).set(value));
    }
}

#[cfg(not(all(target_arch = "avr", feature = "atmega128")))]
mod count {
    use core::sync::atomic::{AtomicU32, Ordering};

    static TICKS: AtomicU32 = AtomicU32::new(0);
    static SECONDS: AtomicU32 = AtomicU32::new(0);

    pub fn advance() {
        let now = TICKS.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if now != 0 && now % super::TICKS_PER_SECOND == 0 {
            let seconds = SECONDS.load(Ordering::Relaxed);
            SECONDS.store(seconds.wrapping_add(1), Ordering::Relaxed);
        }
    }

    pub fn now() -> u32 {
        TICKS.load(Ordering::Relaxed)
    }

    pub fn reset() {
        TICKS.store(0, Ordering::Relaxed);
    }

    pub fn seconds() -> u32 {
        SECONDS.load(Ordering::Relaxed)
    }

    pub fn set_seconds(value: u32) {
        SECONDS.store(value, Ordering::Relaxed);
    }
}

/// Advance the shared tick counter by one tick.
///
/// Call from the platform's periodic tick interrupt and nowhere else;
/// the counter has exactly one producer. Every `TICKS_PER_SECOND` ticks
/// the seconds counter advances too.
pub fn advance() {
    count::advance();
}

/// Seconds elapsed since boot (or since [`set_seconds`]), maintained by
/// [`advance`]. Coarse software RTC, unused by the scheduler itself.
pub fn seconds() -> u32 {
    count::seconds()
}

/// Overwrite the seconds counter, e.g. after fetching wall-clock time
/// from a host or an external RTC chip.
pub fn set_seconds(value: u32) {
    count::set_seconds(value);
}

/// Tick source over the shared interrupt-fed counter.
///
/// The platform layer owns the hardware side: it configures a 1 ms
/// interrupt whose handler calls [`advance`]. `init` only zeroes the
/// counter; the seconds counter is wall-clock state and is left alone.
#[derive(Default)]
pub struct SystemTick;

impl TickSource for SystemTick {
    fn init(&mut self) {
        count::reset();
    }

    fn current_tick(&mut self) -> Tick {
        count::now()
    }
}

/// Tick source for platforms that already maintain a millisecond clock,
/// e.g. `millis()` on Arduino cores. Every read resynchronizes from the
/// external clock; no interrupt of our own is involved.
pub struct PolledClock<F> {
    now: F,
}

impl<F: FnMut() -> Tick> PolledClock<F> {
    pub fn new(now: F) -> Self {
        Self { now }
    }
}

impl<F: FnMut() -> Tick> TickSource for PolledClock<F> {
    fn init(&mut self) {
        // The external clock is already running.
    }

    fn current_tick(&mut self) -> Tick {
        (self.now)()
    }
}
