#![no_main]

use libfuzzer_sys::fuzz_target;
use metaframe_channel::{Acceptance, ResizeChannel, parse_payload};
use metaframe_core::dom::WindowId;
use metaframe_core::location::Location;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Cap length to keep fuzzing fast.
    if text.len() > 4096 {
        return;
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };

    // Decoding must never panic, for the payload itself and for the
    // string-wrapped form that exercises the double-decode path.
    let _ = parse_payload(&value);
    let wrapped = serde_json::Value::String(text.to_owned());
    let _ = parse_payload(&wrapped);

    // The stored size moves exactly when the offer is accepted as a
    // change, and never otherwise.
    let live = WindowId::new(1);
    let mut channel = ResizeChannel::new(Location::new("normal"));
    let before = channel.size();
    match channel.accept(&value, live, live) {
        Acceptance::Resized(size) => assert_eq!(channel.size(), size),
        Acceptance::Unchanged | Acceptance::Dropped => assert_eq!(channel.size(), before),
    }

    // A mismatched originating window must drop every offer.
    let mut foreign = ResizeChannel::new(Location::new("normal"));
    match foreign.accept(&value, WindowId::new(2), live) {
        Acceptance::Resized(size) => panic!("foreign window resized to {size:?}"),
        Acceptance::Unchanged | Acceptance::Dropped => {}
    }
    assert_eq!(foreign.size(), before);
});
