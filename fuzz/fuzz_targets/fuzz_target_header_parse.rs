#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Envelope header parser must not panic on arbitrary input
    let _ = passerelle::core::crypto::parse_header(data);
});
