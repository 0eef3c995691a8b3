//! Build-time configuration constants

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 16_000_000;

/// Tick resolution in milliseconds
pub const TICK_MS: u32 = 1;

/// Ticks per wall-clock second, used by the software RTC
pub const TICKS_PER_SECOND: u32 = 1_000;

/// Default thread table capacity (each record costs ~20 bytes of RAM)
pub const MAX_THREADS: usize = 8;
