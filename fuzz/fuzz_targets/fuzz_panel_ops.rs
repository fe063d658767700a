#![no_main]

use arbitrary::Arbitrary;
use core::time::Duration;
use libfuzzer_sys::fuzz_target;
use metaframe_core::dom::FrameDom;
use metaframe_harness::MemoryDom;
use metaframe_sync::{PanelConfig, PanelController, PanelEvent};
use serde_json::json;

const FORM: &str = "post";

/// One host-side action against the panel.
#[derive(Arbitrary, Debug)]
enum Op {
    BeginReload { at_secs: u8 },
    CompleteLoad { index: u8, with_form: bool },
    EditField { seed: u8 },
    Message { width: u16, height: u16, wrong_location: bool },
    PollDeadline { at_secs: u16 },
    Teardown,
    Remount,
    ToggleOpen,
}

fuzz_target!(|ops: Vec<Op>| {
    let mut dom = MemoryDom::new();
    let mut controller = PanelController::new(PanelConfig::new(
        "normal",
        "https://legacy.example/post.php?post=1&action=edit",
    ));
    let _ = controller.mount(&mut dom);
    let mut dirty_events: Vec<bool> = Vec::new();

    for op in ops.into_iter().take(64) {
        match op {
            Op::BeginReload { at_secs } => {
                let _ = controller.begin_reload(&mut dom, Duration::from_secs(at_secs.into()));
            }
            Op::CompleteLoad { index, with_form } => {
                let frames = dom.frame_ids();
                if frames.is_empty() {
                    continue;
                }
                let frame = frames[usize::from(index) % frames.len()];
                if with_form {
                    dom.stage_form(frame, FORM, &[("title", "staged")]);
                }
                let loaded = dom.complete_load(frame);
                controller.handle(&mut dom, loaded);
            }
            Op::EditField { seed } => {
                let frames = dom.frame_ids();
                if frames.is_empty() {
                    continue;
                }
                let frame = frames[usize::from(seed) % frames.len()];
                if dom.form_of(frame, FORM).is_some() {
                    let value = format!("edit-{seed}");
                    let edited = dom.edit_field(frame, FORM, "title", &value);
                    controller.handle(&mut dom, edited);
                }
            }
            Op::Message { width, height, wrong_location } => {
                let frames = dom.frame_ids();
                if frames.is_empty() {
                    continue;
                }
                let frame = frames[0];
                if dom.document_body(frame).is_err() {
                    continue;
                }
                let location = if wrong_location { "side" } else { "normal" };
                let payload = json!({
                    "source": "metabox",
                    "location": location,
                    "action": "resize",
                    "width": width,
                    "height": height,
                });
                let message = dom.message_from(frame, payload);
                controller.handle(&mut dom, message);
            }
            Op::PollDeadline { at_secs } => {
                controller.poll_deadline(&mut dom, Duration::from_secs(at_secs.into()));
            }
            Op::Teardown => controller.teardown(&mut dom),
            Op::Remount => {
                let _ = controller.mount(&mut dom);
            }
            Op::ToggleOpen => controller.toggle_open(),
        }

        // A panel never holds more than the original and one clone.
        assert!(dom.frame_count() <= 2, "frame count {}", dom.frame_count());

        for event in controller.drain_events() {
            if let PanelEvent::DirtyChanged { dirty, .. } = event {
                dirty_events.push(dirty);
            }
        }
    }

    // Dirty notifications are transitions, so they strictly alternate
    // starting from clean.
    for pair in dirty_events.windows(2) {
        assert_ne!(pair[0], pair[1], "repeated dirty transition");
    }
    if let Some(first) = dirty_events.first() {
        assert!(*first, "first transition must be clean to dirty");
    }

    // Whatever the sequence did, teardown leaves nothing behind, and no
    // listener was ever reaped by removing the frame under it.
    controller.teardown(&mut dom);
    assert_eq!(dom.frame_count(), 0);
    assert_eq!(dom.listener_ledger().live(), 0);
    assert_eq!(dom.observer_ledger().live(), 0);
    assert_eq!(dom.listener_ledger().died_with_frame, 0);
    assert_eq!(dom.observer_ledger().died_with_frame, 0);
});
