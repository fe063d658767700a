#![forbid(unsafe_code)]

//! The boundary between panel logic and the host's document tree.
//!
//! # Role in metaframe
//!
//! Everything that touches a real DOM goes through the [`FrameDom`] trait
//! defined here. The synchronization crates never hold node references;
//! they hold opaque handles ([`FrameId`], [`ListenerId`], [`ObserverId`])
//! and ask the backend to act on them. This keeps the panel logic
//! deterministic and testable against an in-memory backend.
//!
//! # Primary responsibilities
//!
//! - Handle types for frames, content windows, listeners, and observers.
//! - The [`FrameDom`] trait: frame lifecycle, form access, visibility and
//!   size mutation, listener/observer registration.
//! - [`DomError`], the failure surface backends report through.
//!
//! # How it fits in the system
//!
//! `metaframe-sync` drives a `FrameDom` when mounting panels and running
//! reload sessions; `metaframe-core::probe` uses it to classify frame
//! accessibility; `metaframe-harness` provides the deterministic in-memory
//! implementation the test suites run against.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Handle to a frame element attached to the host document.
///
/// Handles are allocated by the backend and stay unique for the life of the
/// document; removing a frame retires its handle rather than recycling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(u64);

impl FrameId {
    /// Create a handle from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Identity of a frame's live browsing context.
///
/// A frame is assigned a fresh window identity every time its document
/// navigates, so comparing a stored `WindowId` against the frame's current
/// one detects whether a message really originated from the content that
/// is live right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(u64);

impl WindowId {
    /// Create a window identity from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Handle returned when subscribing a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Create a handle from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Handle returned when attaching a mutation observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Create a handle from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenTarget {
    /// The top-level window embedding the panels.
    TopWindow,
    /// A frame element in the host document.
    Frame(FrameId),
    /// The tracked form inside a frame's document.
    FormIn(FrameId),
}

/// Event class a listener subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Cross-context messages arriving at a window.
    Message,
    /// Document load completion on a frame.
    Load,
    /// Field input inside a form.
    Input,
    /// Committed field changes inside a form.
    Change,
}

bitflags! {
    /// Facets of a subtree a mutation observer reports on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MutationInterest: u8 {
        /// Attribute value changes.
        const ATTRIBUTES = 1 << 0;
        /// Record the previous value on attribute changes.
        const ATTRIBUTE_OLD_VALUE = 1 << 1;
        /// Text node content changes.
        const CHARACTER_DATA = 1 << 2;
        /// Record the previous value on text changes.
        const CHARACTER_DATA_OLD_VALUE = 1 << 3;
        /// Child node insertion and removal.
        const CHILD_LIST = 1 << 4;
        /// Extend coverage to all descendants, not just the target.
        const SUBTREE = 1 << 5;

        /// Full coverage used when watching a form for edits.
        const FORM_TRACKING = Self::ATTRIBUTES.bits()
            | Self::ATTRIBUTE_OLD_VALUE.bits()
            | Self::CHARACTER_DATA.bits()
            | Self::CHARACTER_DATA_OLD_VALUE.bits()
            | Self::CHILD_LIST.bits()
            | Self::SUBTREE.bits();
    }
}

/// Attributes for creating a panel frame element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameAttrs {
    /// Value for the element's `id` attribute.
    pub element_id: String,
    /// CSS class applied to the element.
    pub class_name: String,
    /// Initial document URL.
    pub src: String,
}

/// One form field captured as an ordered (name, value) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormEntry {
    /// The field's `name` attribute.
    pub name: String,
    /// The field's current value.
    pub value: String,
}

impl FormEntry {
    /// Create an entry from a field name and value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Failures reported by a [`FrameDom`] backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The handle does not name a frame attached to the document.
    UnknownFrame { frame: FrameId },
    /// The frame's document belongs to a foreign origin and cannot be read.
    CrossOrigin { frame: FrameId },
    /// The frame exists but its document has not finished loading.
    NotLoaded { frame: FrameId },
    /// An expected element is missing from the frame's document.
    MissingElement { frame: FrameId, element_id: String },
    /// The handle names a listener that is no longer attached.
    StaleListener { listener: ListenerId },
    /// The handle names an observer that is no longer attached.
    StaleObserver { observer: ObserverId },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFrame { frame } => {
                write!(f, "frame {} is not attached to the document", frame.0)
            }
            Self::CrossOrigin { frame } => {
                write!(f, "frame {} document is cross-origin", frame.0)
            }
            Self::NotLoaded { frame } => {
                write!(f, "frame {} document has not loaded", frame.0)
            }
            Self::MissingElement { frame, element_id } => {
                write!(
                    f,
                    "frame {} document has no element {element_id:?}",
                    frame.0
                )
            }
            Self::StaleListener { listener } => {
                write!(f, "listener {} is no longer attached", listener.0)
            }
            Self::StaleObserver { observer } => {
                write!(f, "observer {} is no longer attached", observer.0)
            }
        }
    }
}

impl std::error::Error for DomError {}

/// Host document abstraction: frame lifecycle, form access, and wiring.
///
/// This is the mutation half of the panel boundary. The sync layer calls
/// these methods without knowing whether they land on a browser DOM or on
/// the in-memory test backend. Implementations must keep handle accounting
/// strict: acting on a removed frame or a detached listener is an error,
/// never a silent no-op.
pub trait FrameDom {
    /// Create a frame element from `attrs` and append it to the panel
    /// container, initially shown.
    fn create_frame(&mut self, attrs: &FrameAttrs) -> Result<FrameId, DomError>;

    /// Deep-clone `frame`, descendants included, and insert the clone as
    /// its next sibling.
    ///
    /// The clone copies attributes and document content but receives a
    /// fresh handle and its own browsing context.
    fn clone_frame(&mut self, frame: FrameId) -> Result<FrameId, DomError>;

    /// Detach `frame` from the document and release its browsing context.
    ///
    /// Listeners still attached to the frame die with it; their handles
    /// become stale.
    fn remove_frame(&mut self, frame: FrameId) -> Result<(), DomError>;

    /// Identity of the frame's live content window.
    fn content_window(&self, frame: FrameId) -> Result<WindowId, DomError>;

    /// Touch the frame's document body, verifying it is reachable.
    ///
    /// Fails with [`DomError::CrossOrigin`] when the document belongs to a
    /// foreign origin and with [`DomError::NotLoaded`] before the first
    /// load completes. This is the primitive the access probe builds on.
    fn document_body(&self, frame: FrameId) -> Result<(), DomError>;

    /// Ordered (name, value) pairs of the identified form's fields.
    fn form_entries(&self, frame: FrameId, form_id: &str) -> Result<Vec<FormEntry>, DomError>;

    /// Submit the identified form, navigating the frame with its data.
    fn submit_form(&mut self, frame: FrameId, form_id: &str) -> Result<(), DomError>;

    /// Replace `recipient`'s form node with `donor`'s live form node.
    ///
    /// The donor's node moves, it is not copied; state attached to it
    /// travels along. Afterwards `donor` has no form under `form_id`.
    fn transplant_form(
        &mut self,
        donor: FrameId,
        recipient: FrameId,
        form_id: &str,
    ) -> Result<(), DomError>;

    /// Take the frame out of flow and make it invisible, keeping it loaded.
    ///
    /// Must be reversible by [`reveal_frame`](Self::reveal_frame), which
    /// restores the element's prior style defaults.
    fn conceal_frame(&mut self, frame: FrameId) -> Result<(), DomError>;

    /// Undo a prior conceal, restoring the element's own style defaults.
    fn reveal_frame(&mut self, frame: FrameId) -> Result<(), DomError>;

    /// Toggle the element between display-none and its default display.
    ///
    /// Distinct from conceal/reveal: this is the coarse shown-at-all latch,
    /// not the off-flow hiding used while two frames coexist.
    fn set_frame_display(&mut self, frame: FrameId, shown: bool) -> Result<(), DomError>;

    /// Write the element's width and height attributes in whole units.
    fn set_frame_size(&mut self, frame: FrameId, width: u32, height: u32) -> Result<(), DomError>;

    /// Subscribe to `kind` events at `target`.
    fn add_listener(
        &mut self,
        target: ListenTarget,
        kind: ListenerKind,
    ) -> Result<ListenerId, DomError>;

    /// Remove a previously added listener.
    fn remove_listener(&mut self, listener: ListenerId) -> Result<(), DomError>;

    /// Observe mutations of the identified form's subtree under `interest`.
    fn observe_form(
        &mut self,
        frame: FrameId,
        form_id: &str,
        interest: MutationInterest,
    ) -> Result<ObserverId, DomError>;

    /// Disconnect a previously attached observer.
    fn disconnect_observer(&mut self, observer: ObserverId) -> Result<(), DomError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn frame_id_round_trips_raw_value() {
        let id = FrameId::new(7);
        assert_eq!(id.get(), 7);
        assert_eq!(id, FrameId::new(7));
        assert_ne!(id, FrameId::new(8));
    }

    #[test]
    fn frame_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&FrameId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: FrameId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FrameId::new(42));
    }

    #[test]
    fn form_tracking_covers_every_facet() {
        let interest = MutationInterest::FORM_TRACKING;
        assert!(interest.contains(MutationInterest::ATTRIBUTES));
        assert!(interest.contains(MutationInterest::ATTRIBUTE_OLD_VALUE));
        assert!(interest.contains(MutationInterest::CHARACTER_DATA));
        assert!(interest.contains(MutationInterest::CHARACTER_DATA_OLD_VALUE));
        assert!(interest.contains(MutationInterest::CHILD_LIST));
        assert!(interest.contains(MutationInterest::SUBTREE));
        assert_eq!(interest, MutationInterest::all());
    }

    #[test]
    fn dom_error_messages_name_the_handle() {
        let err = DomError::MissingElement {
            frame: FrameId::new(3),
            element_id: "post".to_owned(),
        };
        assert_eq!(err.to_string(), "frame 3 document has no element \"post\"");

        let err = DomError::UnknownFrame {
            frame: FrameId::new(9),
        };
        assert_eq!(err.to_string(), "frame 9 is not attached to the document");
    }

    #[test]
    fn form_entry_builds_from_str_pairs() {
        let entry = FormEntry::new("title", "Draft");
        assert_eq!(entry.name, "title");
        assert_eq!(entry.value, "Draft");
    }
}
