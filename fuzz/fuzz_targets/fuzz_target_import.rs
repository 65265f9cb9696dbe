#![no_main]
use libfuzzer_sys::fuzz_target;
use passerelle::transfer::format::Format;
use passerelle::transfer::handler::handler_for;

fuzz_target!(|data: &[u8]| {
    let _ = passerelle::transfer::detect::detect_bytes(data, None);
    if let Ok(text) = std::str::from_utf8(data) {
        // Scoring and parsing must not panic, whatever the layout
        for format in Format::ALL {
            let handler = handler_for(format);
            let _ = handler.confidence(text);
            let _ = handler.parse(text);
        }
    }
});
