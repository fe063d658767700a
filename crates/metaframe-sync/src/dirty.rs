#![forbid(unsafe_code)]

//! Form divergence tracking with transition-only reporting.
//!
//! The tracker holds the form data captured at the last synchronized
//! moment and compares the live form against it on demand. Comparisons
//! are cheap and frequent; what the host hears about are the two edges
//! that matter: data started differing, or data returned to matching.

use metaframe_core::dom::{FormEntry, FrameDom, FrameId};

/// Ordered form data captured at a known-synchronized moment.
///
/// Compares order-sensitively: the same fields in a different order count
/// as divergence. A snapshot taken while the frame was inaccessible or
/// the form was missing holds no data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormSnapshot(Option<Vec<FormEntry>>);

impl FormSnapshot {
    /// The degenerate snapshot holding no data.
    #[must_use]
    pub const fn empty() -> Self {
        Self(None)
    }

    /// Capture the identified form's current data.
    ///
    /// Degenerates to [`empty`](Self::empty) when the frame is
    /// inaccessible or the form is missing.
    #[must_use]
    pub fn capture(dom: &dyn FrameDom, frame: FrameId, form_id: &str) -> Self {
        Self(dom.form_entries(frame, form_id).ok())
    }

    /// Whether this snapshot holds data.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.0.is_some()
    }

    /// Captured entries, if any.
    #[must_use]
    pub fn entries(&self) -> Option<&[FormEntry]> {
        self.0.as_deref()
    }
}

/// A change in the panel's dirty state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyTransition {
    /// Form data started differing from the snapshot.
    BecameDirty,
    /// Form data returned to matching the snapshot.
    BecameClean,
}

/// Snapshot-based dirty detection for one panel's form.
///
/// The tracker mirrors the last reported state so repeated checks with an
/// unchanged answer stay silent. It never reports divergence it cannot
/// read: when the live form yields no data, checks are inert.
#[derive(Debug, Clone)]
pub struct DirtyTracker {
    form_id: String,
    snapshot: FormSnapshot,
    dirty: bool,
}

impl DirtyTracker {
    /// Create a tracker for the identified form, with no baseline yet.
    #[must_use]
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            snapshot: FormSnapshot::empty(),
            dirty: false,
        }
    }

    /// The form element identifier this tracker reads.
    #[must_use]
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// The last reported dirty state.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The current baseline.
    #[must_use]
    pub const fn snapshot(&self) -> &FormSnapshot {
        &self.snapshot
    }

    /// Replace the baseline with the form's current data.
    ///
    /// Called after a load has installed known-synchronized content. The
    /// reported dirty state is not touched; the next
    /// [`check`](Self::check) reconciles it against the new baseline.
    pub fn rebaseline(&mut self, dom: &dyn FrameDom, frame: FrameId) {
        self.snapshot = FormSnapshot::capture(dom, frame, &self.form_id);
    }

    /// Compare the live form against the baseline and report a transition
    /// if the dirty state changed.
    ///
    /// Unreadable live data (frame inaccessible, form missing) reports
    /// nothing, whatever the baseline holds.
    pub fn check(&mut self, dom: &dyn FrameDom, frame: FrameId) -> Option<DirtyTransition> {
        let current = FormSnapshot::capture(dom, frame, &self.form_id);
        if !current.has_data() {
            return None;
        }
        if current == self.snapshot {
            if self.dirty {
                self.dirty = false;
                return Some(DirtyTransition::BecameClean);
            }
        } else if !self.dirty {
            self.dirty = true;
            return Some(DirtyTransition::BecameDirty);
        }
        None
    }
}
