//! Demo firmware: periodic LED threads on PORTB
#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
mod firmware {
    use panic_halt as _;

    use avr_device::atmega128::Peripherals;
    use rtm::config::MAX_THREADS;
    use rtm::hal::HardwareTick;
    use rtm::Scheduler;

    #[avr_device::entry]
    fn main() -> ! {
        let dp = Peripherals::take().unwrap();
        let portb = dp.PORTB;

        // All of PORTB drives LEDs.
        portb.ddrb.write(|w| unsafe { w.bits(0xFF) });

        let mut blink = || {
            portb.portb.modify(|r, w| unsafe { w.bits(r.bits() ^ 0x01) });
        };
        let mut heartbeat = || {
            portb.portb.modify(|r, w| unsafe { w.bits(r.bits() ^ 0x80) });
        };

        let mut sched: Scheduler<_, MAX_THREADS> = Scheduler::new(HardwareTick::new());
        sched.init();
        sched.create(500, &mut blink).ok();
        sched.create(1_000, &mut heartbeat).ok();

        // Ticks start flowing once interrupts are on.
        unsafe { avr_device::interrupt::enable() };

        loop {
            sched.dispatch();
        }
    }
}

// The demo only makes sense on the MCU; give host builds an empty entry
// point so `--all-features` checks still link.
#[cfg(not(target_arch = "avr"))]
fn main() {}
