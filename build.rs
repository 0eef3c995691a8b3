use std::env;

fn main() {
    let target = env::var("TARGET").unwrap_or_default();

    // AVR builds need the MCU on the link line so avr-gcc picks the right
    // startup objects and memory layout. Host builds (tests) skip all of it.
    if target.contains("avr") {
        println!("cargo:rustc-link-arg=-mmcu=atmega128");

        // Pass CPU frequency for timing calculations
        println!("cargo:rustc-env=MCU_FREQ_HZ=16000000");
    }
}
