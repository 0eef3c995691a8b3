//! TC0 tick interrupt for the ATmega128
//!
//! Runs Timer0 in CTC mode off the /64 prescaler: 16 MHz / 64 / 250
//! gives a compare match every millisecond. The compare ISR is the sole
//! producer of the shared tick counter.

use avr_device::atmega128::TC0;

use crate::config::CPU_FREQ_HZ;
use crate::rtos::tick::{self, SystemTick, Tick, TickSource};
use crate::rtos::timer::ThreadTimer;

/// Timer0 clock select (CS02:CS00).
const PRESCALE_64: u8 = 0x04;
/// CTC waveform mode (WGM01).
const MODE_CTC: u8 = 1 << 3;
/// Output compare interrupt enable (OCIE0) in TIMSK.
const COMPARE_IRQ: u8 = 1 << 1;

/// Compare value for a 1 ms period: counts 0..=249 at 250 kHz.
const TICK_COMPARE: u8 = (CPU_FREQ_HZ / 64 / 1_000 - 1) as u8;

#[avr_device::interrupt(atmega128)]
fn TIMER0_COMP() {
    tick::advance();
}

/// Tick source backed by the TC0 compare interrupt.
///
/// `init` programs the timer and zeroes the counter; the caller still has
/// to enable interrupts globally before ticks start flowing.
pub struct HardwareTick {
    sys: SystemTick,
}

impl HardwareTick {
    pub const fn new() -> Self {
        Self { sys: SystemTick }
    }
}

impl Default for HardwareTick {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for HardwareTick {
    fn init(&mut self) {
        let tc0 = unsafe { &*TC0::ptr() };
        tc0.tccr0.write(|w| unsafe { w.bits(MODE_CTC | PRESCALE_64) });
        tc0.tcnt0.write(|w| unsafe { w.bits(0) });
        tc0.ocr0.write(|w| unsafe { w.bits(TICK_COMPARE) });
        tc0.timsk.modify(|r, w| unsafe { w.bits(r.bits() | COMPARE_IRQ) });
        self.sys.init();
    }

    fn current_tick(&mut self) -> Tick {
        self.sys.current_tick()
    }
}

/// Busy-wait helper for driver code that has no timer context of its own.
/// The tick interrupt must already be configured and enabled.
pub fn delay_ms(ms: u16) {
    let mut clock = HardwareTick::new();
    let mut timer = ThreadTimer::new();
    timer.blocking_delay(&mut clock, Tick::from(ms));
}
