//! Property-based invariant tests for the dirty tracker.
//!
//! These tests verify transition discipline over arbitrary edit sequences:
//!
//! 1. Checks never panic, whatever the edit sequence
//! 2. The reported dirty state always equals live-vs-baseline inequality
//! 3. Emitted transitions strictly alternate, starting with dirty
//! 4. A check that emits nothing leaves the reported state untouched
//! 5. Rebaselining adopts the live data as the new clean state

use metaframe_core::dom::{FrameAttrs, FrameDom, FrameId};
use metaframe_harness::MemoryDom;
use metaframe_sync::{DirtyTracker, DirtyTransition};
use proptest::prelude::*;

const FORM: &str = "post";
const FIELDS: [&str; 3] = ["title", "content", "tag"];

// ── Strategies ──────────────────────────────────────────────────────────

/// One edit: write value `value` (0 is the baseline value) into one of the
/// three tracked fields.
#[derive(Debug, Clone, Copy)]
struct Edit {
    field: usize,
    value: usize,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    (0..FIELDS.len(), 0..4_usize).prop_map(|(field, value)| Edit { field, value })
}

fn baseline_value(field: usize) -> String {
    format!("{}-0", FIELDS[field])
}

fn edited_value(field: usize, value: usize) -> String {
    format!("{}-{value}", FIELDS[field])
}

fn baselined(dom: &mut MemoryDom) -> (FrameId, DirtyTracker) {
    let frame = dom
        .create_frame(&FrameAttrs {
            element_id: "metaframe-normal".to_owned(),
            class_name: "metaframe".to_owned(),
            src: "https://legacy.example/post.php?post=1&metabox=normal".to_owned(),
        })
        .unwrap();
    let entries: Vec<(String, String)> = (0..FIELDS.len())
        .map(|field| (FIELDS[field].to_owned(), baseline_value(field)))
        .collect();
    let borrowed: Vec<(&str, &str)> = entries
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    dom.stage_form(frame, FORM, &borrowed);
    let _ = dom.complete_load(frame);
    let mut tracker = DirtyTracker::new(FORM);
    tracker.rebaseline(dom, frame);
    (frame, tracker)
}

// ── Invariants ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn reported_state_tracks_live_divergence(edits in prop::collection::vec(edit_strategy(), 0..48)) {
        let mut dom = MemoryDom::new();
        let (frame, mut tracker) = baselined(&mut dom);
        let mut live: Vec<String> = (0..FIELDS.len()).map(baseline_value).collect();
        let baseline = live.clone();
        let mut transitions: Vec<DirtyTransition> = Vec::new();

        for edit in edits {
            let value = edited_value(edit.field, edit.value);
            live[edit.field] = value.clone();
            let _ = dom.edit_field(frame, FORM, FIELDS[edit.field], &value);

            let was_dirty = tracker.is_dirty();
            let transition = tracker.check(&dom, frame);
            prop_assert_eq!(tracker.is_dirty(), live != baseline);
            match transition {
                Some(t) => transitions.push(t),
                None => prop_assert_eq!(tracker.is_dirty(), was_dirty),
            }
        }

        // Transitions strictly alternate and the first one is always dirty.
        for pair in transitions.windows(2) {
            prop_assert_ne!(pair[0], pair[1]);
        }
        if let Some(first) = transitions.first() {
            prop_assert_eq!(*first, DirtyTransition::BecameDirty);
        }
    }

    #[test]
    fn rebaseline_makes_the_live_data_clean(edits in prop::collection::vec(edit_strategy(), 1..16)) {
        let mut dom = MemoryDom::new();
        let (frame, mut tracker) = baselined(&mut dom);

        for edit in edits {
            let value = edited_value(edit.field, edit.value);
            let _ = dom.edit_field(frame, FORM, FIELDS[edit.field], &value);
            let _ = tracker.check(&dom, frame);
        }

        tracker.rebaseline(&dom, frame);
        // Whatever the edits did, the fresh baseline matches the live data,
        // so the next check can only report a clean transition or nothing.
        let transition = tracker.check(&dom, frame);
        prop_assert!(transition.is_none() || transition == Some(DirtyTransition::BecameClean));
        prop_assert!(!tracker.is_dirty());
    }
}
