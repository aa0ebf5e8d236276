#![no_main]

use libfuzzer_sys::fuzz_target;
use tty_bridge::TerminalSize;

fuzz_target!(|data: &[u8]| {
    let _ = TerminalSize::from_payload(data);
});
