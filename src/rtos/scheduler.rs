//! Thread registry and cooperative dispatcher
//!
//! A fixed table of periodic threads, each owning a [`ThreadTimer`], all
//! driven from one tick source. `dispatch` sweeps the table in
//! registration order and fires every runnable thread whose period has
//! expired. Threads are registered once and never removed; suspension is
//! the only way to stop one.

use ufmt::derive::uDebug;

use crate::rtos::tick::{Tick, TickSource};
use crate::rtos::timer::{ThreadTimer, TimerPoll};

/// Zero-argument thread body. Must return promptly: a callback that
/// blocks stalls every thread registered after it in the same pass.
pub type Callback<'a> = &'a mut (dyn FnMut() + 'a);

/// Whether the dispatcher considers a thread runnable.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Run,
}

/// Scheduler error codes.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The registry already holds its compile-time maximum of threads.
    RegistryFull,
    /// The handle does not name a registered thread.
    InvalidHandle,
}

/// Stable identifier of a registered thread: its index in the registry,
/// valid for the lifetime of the program.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadHandle(u8);

impl ThreadHandle {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

struct ThreadRecord<'a> {
    state: TaskState,
    period: Tick,
    callback: Callback<'a>,
    timer: ThreadTimer,
}

/// Cooperative scheduler over tick source `C` with room for `N` threads.
///
/// Handles are `u8`-sized like the records they index, which caps the
/// usable capacity at 256 threads.
pub struct Scheduler<'a, C, const N: usize> {
    threads: [Option<ThreadRecord<'a>>; N],
    count: usize,
    clock: C,
}

impl<'a, C: TickSource, const N: usize> Scheduler<'a, C, N> {
    /// Scheduler with an empty registry. Call [`init`](Self::init) once
    /// before anything else.
    pub fn new(clock: C) -> Self {
        Self {
            threads: core::array::from_fn(|_| None),
            count: 0,
            clock,
        }
    }

    /// Clear the registry and bring up the tick source.
    pub fn init(&mut self) {
        self.threads = core::array::from_fn(|_| None);
        self.count = 0;
        self.clock.init();
    }

    /// Register a periodic thread in the next free slot and start its
    /// timer: the first dispatch comes one full period from now. The
    /// returned handle is the slot index, stable forever.
    ///
    /// The callback must not block and cannot call back into this
    /// scheduler (it is exclusively borrowed here for as long as the
    /// scheduler lives). A panicking callback is not contained; under the
    /// firmware profiles (`panic = "abort"`) it halts the system.
    pub fn create(&mut self, period: Tick, callback: Callback<'a>) -> Result<ThreadHandle, Error> {
        if self.count == N {
            return Err(Error::RegistryFull);
        }

        let mut timer = ThreadTimer::new();
        timer.start(&mut self.clock);
        self.threads[self.count] = Some(ThreadRecord {
            state: TaskState::Run,
            period,
            callback,
            timer,
        });

        let handle = ThreadHandle(self.count as u8);
        self.count += 1;
        Ok(handle)
    }

    /// Make the thread ineligible for dispatch. Its timer keeps running:
    /// a thread resumed later than its period fires on the very next
    /// pass. Suspension pauses eligibility, not phase.
    pub fn suspend(&mut self, handle: ThreadHandle) -> Result<(), Error> {
        self.record_mut(handle)?.state = TaskState::Idle;
        Ok(())
    }

    /// Make the thread eligible for dispatch again.
    pub fn resume(&mut self, handle: ThreadHandle) -> Result<(), Error> {
        self.record_mut(handle)?.state = TaskState::Run;
        Ok(())
    }

    /// Fire the thread's callback if its period has expired, then rebase
    /// its timer on the completion instant: the next period starts when
    /// the callback returns, so drift accrues with callback duration.
    pub fn run(&mut self, handle: ThreadHandle) -> Result<(), Error> {
        self.run_at(handle.index())
    }

    /// One dispatch pass: service every runnable thread in registration
    /// order. Earlier threads always go first, so a slow callback delays
    /// everything after it within the pass.
    pub fn dispatch(&mut self) {
        for index in 0..self.count {
            let runnable = matches!(
                &self.threads[index],
                Some(record) if record.state == TaskState::Run
            );
            if runnable {
                // Index is in range, run_at cannot fail here.
                let _ = self.run_at(index);
            }
        }
    }

    /// Number of registered threads.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Compile-time registry capacity.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Dispatch eligibility of a registered thread.
    pub fn state(&self, handle: ThreadHandle) -> Result<TaskState, Error> {
        match self.threads.get(handle.index()) {
            Some(Some(record)) => Ok(record.state),
            _ => Err(Error::InvalidHandle),
        }
    }

    fn run_at(&mut self, index: usize) -> Result<(), Error> {
        // Direct field access keeps the clock borrowable alongside the
        // record.
        let record = match self.threads.get_mut(index) {
            Some(Some(record)) => record,
            _ => return Err(Error::InvalidHandle),
        };

        if record.timer.check_one_shot(&mut self.clock, record.period) == TimerPoll::Done {
            (record.callback)();
            record.timer.start(&mut self.clock);
        }
        Ok(())
    }

    fn record_mut(&mut self, handle: ThreadHandle) -> Result<&mut ThreadRecord<'a>, Error> {
        match self.threads.get_mut(handle.index()) {
            Some(Some(record)) => Ok(record),
            _ => Err(Error::InvalidHandle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtos::tick::PolledClock;
    use core::cell::Cell;

    #[test]
    fn registry_fills_to_capacity_with_consecutive_handles() {
        let now = Cell::new(0u32);
        let mut first = || ();
        let mut second = || ();
        let mut third = || ();

        let mut sched: Scheduler<_, 2> = Scheduler::new(PolledClock::new(|| now.get()));
        sched.init();

        assert_eq!(sched.create(10, &mut first).unwrap().index(), 0);
        assert_eq!(sched.create(10, &mut second).unwrap().index(), 1);
        assert_eq!(sched.create(10, &mut third), Err(Error::RegistryFull));
        assert_eq!(sched.len(), 2);
        assert_eq!(sched.capacity(), 2);
    }

    #[test]
    fn thread_fires_once_per_period() {
        let now = Cell::new(0u32);
        let fires = Cell::new(0u32);
        let mut count_fire = || fires.set(fires.get() + 1);

        let mut sched: Scheduler<_, 4> = Scheduler::new(PolledClock::new(|| now.get()));
        sched.init();
        sched.create(10, &mut count_fire).unwrap();

        sched.dispatch();
        assert_eq!(fires.get(), 0);

        now.set(9);
        sched.dispatch();
        assert_eq!(fires.get(), 0);

        now.set(10);
        sched.dispatch();
        assert_eq!(fires.get(), 1);
        sched.dispatch();
        assert_eq!(fires.get(), 1);

        // Rebased at tick 10: not due again until tick 20.
        now.set(19);
        sched.dispatch();
        assert_eq!(fires.get(), 1);
        now.set(20);
        sched.dispatch();
        assert_eq!(fires.get(), 2);
    }

    #[test]
    fn dispatch_services_threads_in_registration_order() {
        let now = Cell::new(0u32);
        let order = Cell::new(0u32);
        let mut first = || order.set(order.get() * 10 + 1);
        let mut second = || order.set(order.get() * 10 + 2);
        let mut third = || order.set(order.get() * 10 + 3);

        let mut sched: Scheduler<_, 4> = Scheduler::new(PolledClock::new(|| now.get()));
        sched.init();
        sched.create(10, &mut first).unwrap();
        sched.create(10, &mut second).unwrap();
        sched.create(10, &mut third).unwrap();

        now.set(10);
        sched.dispatch();
        assert_eq!(order.get(), 123);
    }

    #[test]
    fn suspended_thread_keeps_its_phase() {
        let now = Cell::new(0u32);
        let fires = Cell::new(0u32);
        let mut count_fire = || fires.set(fires.get() + 1);

        let mut sched: Scheduler<_, 4> = Scheduler::new(PolledClock::new(|| now.get()));
        sched.init();
        let handle = sched.create(10, &mut count_fire).unwrap();

        sched.suspend(handle).unwrap();
        assert_eq!(sched.state(handle).unwrap(), TaskState::Idle);

        // Well past the period while suspended: nothing fires.
        now.set(50);
        sched.dispatch();
        assert_eq!(fires.get(), 0);

        // The timer kept running, so the thread is overdue immediately.
        sched.resume(handle).unwrap();
        sched.dispatch();
        assert_eq!(fires.get(), 1);
    }

    #[test]
    fn run_checks_a_single_thread() {
        let now = Cell::new(0u32);
        let fires = Cell::new(0u32);
        let mut count_fire = || fires.set(fires.get() + 1);

        let mut sched: Scheduler<_, 4> = Scheduler::new(PolledClock::new(|| now.get()));
        sched.init();
        let handle = sched.create(5, &mut count_fire).unwrap();

        sched.run(handle).unwrap();
        assert_eq!(fires.get(), 0);

        now.set(5);
        sched.run(handle).unwrap();
        assert_eq!(fires.get(), 1);
    }

    #[test]
    fn invalid_handles_are_rejected_without_side_effects() {
        let now = Cell::new(0u32);
        let fires = Cell::new(0u32);
        let mut count_fire = || fires.set(fires.get() + 1);

        let mut sched: Scheduler<_, 4> = Scheduler::new(PolledClock::new(|| now.get()));
        sched.init();
        sched.create(10, &mut count_fire).unwrap();

        let bogus = ThreadHandle(7);
        assert_eq!(sched.run(bogus), Err(Error::InvalidHandle));
        assert_eq!(sched.suspend(bogus), Err(Error::InvalidHandle));
        assert_eq!(sched.resume(bogus), Err(Error::InvalidHandle));
        assert_eq!(sched.state(bogus), Err(Error::InvalidHandle));

        // The registered thread is unaffected.
        now.set(10);
        sched.dispatch();
        assert_eq!(fires.get(), 1);
    }

    #[test]
    fn init_empties_a_populated_registry() {
        let now = Cell::new(0u32);
        let mut first = || ();
        let mut second = || ();
        let mut third = || ();

        let mut sched: Scheduler<_, 4> = Scheduler::new(PolledClock::new(|| now.get()));
        sched.init();
        sched.create(10, &mut first).unwrap();
        sched.create(10, &mut second).unwrap();
        assert_eq!(sched.len(), 2);

        sched.init();
        assert!(sched.is_empty());
        // Slots are handed out from the start again.
        assert_eq!(sched.create(10, &mut third).unwrap().index(), 0);
    }
}
