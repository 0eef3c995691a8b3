//! Per-thread software timer
//!
//! Two stored states, stopped and running, plus a snapshot of the tick
//! counter taken at the last start. Expiry queries come in two flavors:
//! continuous (level-triggered, keeps reporting done) and one-shot
//! (self-clearing, reports done once per start).

use ufmt::derive::uDebug;

use crate::rtos::tick::{Tick, TickSource};

/// Stored timer state.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running,
}

/// Result of an expiry query. Returned, never stored.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPoll {
    /// Timer is stopped; no period is being measured.
    Idle,
    /// Running, period not yet expired.
    Busy,
    /// Running and the period has expired.
    Done,
}

/// Error from [`ThreadTimer::wait`]: the timer was never started.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotStarted;

/// Per-thread timer context.
///
/// `last_tick` is only meaningful after a start; `stop` deliberately
/// leaves it in place so `resume` can continue the original measurement.
#[derive(Debug, Clone, Copy)]
pub struct ThreadTimer {
    last_tick: Tick,
    state: TimerState,
}

impl ThreadTimer {
    pub const fn new() -> Self {
        Self {
            last_tick: 0,
            state: TimerState::Stopped,
        }
    }

    /// Snapshot the present tick and start measuring from it.
    pub fn start(&mut self, clock: &mut impl TickSource) {
        self.last_tick = clock.current_tick();
        self.state = TimerState::Running;
    }

    /// Halt expiry checks. The start snapshot is kept.
    pub fn stop(&mut self) {
        self.state = TimerState::Stopped;
    }

    /// Start again **without** rebasing: elapsed time keeps accruing from
    /// the original start snapshot, unlike [`start`](Self::start).
    pub fn resume(&mut self) {
        self.state = TimerState::Running;
    }

    /// Ticks since the last start. Wrapping subtraction keeps the result
    /// correct when the tick counter wraps between start and now.
    pub fn elapsed(&self, clock: &mut impl TickSource) -> Tick {
        clock.current_tick().wrapping_sub(self.last_tick)
    }

    /// Expiry query, continuous flavor: once the period has expired every
    /// further call keeps answering `Done`. Never mutates the timer.
    pub fn check_continuous(&self, clock: &mut impl TickSource, period: Tick) -> TimerPoll {
        if self.state == TimerState::Stopped {
            return TimerPoll::Idle;
        }
        if self.elapsed(clock) >= period {
            TimerPoll::Done
        } else {
            TimerPoll::Busy
        }
    }

    /// Expiry query, one-shot flavor: the first `Done` stops the timer,
    /// so later polls answer `Idle` until it is started or resumed again.
    pub fn check_one_shot(&mut self, clock: &mut impl TickSource, period: Tick) -> TimerPoll {
        let poll = self.check_continuous(clock, period);
        if poll == TimerPoll::Done {
            self.state = TimerState::Stopped;
        }
        poll
    }

    /// Non-blocking wait: `WouldBlock` until the period expires, then `Ok`
    /// exactly once per start. A stopped timer reports [`NotStarted`].
    pub fn wait(
        &mut self,
        clock: &mut impl TickSource,
        period: Tick,
    ) -> nb::Result<(), NotStarted> {
        match self.check_one_shot(clock, period) {
            TimerPoll::Done => Ok(()),
            TimerPoll::Busy => Err(nb::Error::WouldBlock),
            TimerPoll::Idle => Err(nb::Error::Other(NotStarted)),
        }
    }

    /// Busy-wait for `period` ticks. Blocks the calling context outright;
    /// no other work, dispatch included, runs in the meantime.
    pub fn blocking_delay(&mut self, clock: &mut impl TickSource, period: Tick) {
        self.start(clock);
        while self.elapsed(clock) < period {}
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocking millisecond delay provider over any tick source.
pub struct Delay<C> {
    clock: C,
    timer: ThreadTimer,
}

impl<C: TickSource> Delay<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            timer: ThreadTimer::new(),
        }
    }

    /// Release the underlying tick source.
    pub fn free(self) -> C {
        self.clock
    }
}

impl<C: TickSource> embedded_hal::blocking::delay::DelayMs<u16> for Delay<C> {
    fn delay_ms(&mut self, ms: u16) {
        self.timer.blocking_delay(&mut self.clock, Tick::from(ms));
    }
}

impl<C: TickSource> embedded_hal::blocking::delay::DelayMs<u8> for Delay<C> {
    fn delay_ms(&mut self, ms: u8) {
        self.timer.blocking_delay(&mut self.clock, Tick::from(ms));
    }
}
