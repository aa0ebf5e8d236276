#![no_main]

use libfuzzer_sys::fuzz_target;
use tty_bridge::protocol::dispatcher::Dispatcher;
use tty_bridge::{Base64Codec, TerminalSize};

fuzz_target!(|data: &[u8]| {
    // Arbitrary client frames must produce an action or an error, never a panic
    let mut dispatcher = Dispatcher::new(
        Box::new(Base64Codec),
        true,
        TerminalSize { columns: 0, rows: 24 },
    );
    let _ = dispatcher.dispatch(data);
});
