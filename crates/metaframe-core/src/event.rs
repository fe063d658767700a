#![forbid(unsafe_code)]

//! Canonical host-delivered events.
//!
//! The host owns the real event loop. When the document fires something a
//! panel cares about, the host wraps it as a [`HostEvent`] and feeds it to
//! the controller. Variants carry the originating handle so the controller
//! can route them; events for frames it does not manage are ignored.
//!
//! # Design Notes
//!
//! - Message payloads are carried as raw [`serde_json::Value`] because the
//!   sender may post either a structured object or a JSON-encoded string;
//!   shape validation happens downstream, not here.
//! - Load events are reported per frame; the controller decides whether a
//!   given load belongs to the visible frame, a reload clone, or neither.

use serde_json::Value;

use crate::dom::{FrameId, WindowId};

/// An event the host observed and forwarded to a panel controller.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A cross-context message arrived at the top window.
    Message {
        /// Identity of the window that posted the message.
        origin_window: WindowId,
        /// The message data, object or JSON-encoded string.
        payload: Value,
    },

    /// A frame finished loading its document.
    FrameLoaded {
        /// The frame whose load event fired.
        frame: FrameId,
    },

    /// A mutation observer reported changes under a frame's tracked form.
    FormMutated {
        /// The frame whose form subtree changed.
        frame: FrameId,
    },

    /// An input or change event fired inside a frame's tracked form.
    FormEdited {
        /// The frame whose form received the edit.
        frame: FrameId,
    },
}
