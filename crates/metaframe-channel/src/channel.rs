#![forbid(unsafe_code)]

//! Per-panel message acceptance and size state.
//!
//! A [`ResizeChannel`] belongs to exactly one panel. Every message event the
//! host sees is offered to it; the channel accepts only messages that carry
//! the panel source tag, address this panel's location, and originate from
//! the window that is live inside the tracked frame right now. The triple
//! check keeps one panel's reports from driving another panel's layout and
//! keeps spoofed messages from driving any panel at all.

use metaframe_core::dom::WindowId;
use metaframe_core::geometry::ObservedSize;
use metaframe_core::location::Location;
use serde_json::Value;
use tracing::{debug, trace};

use crate::message::{ACTION_RESIZE, MESSAGE_SOURCE, parse_payload};

/// Outcome of offering one message to [`ResizeChannel::accept`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Acceptance {
    /// Valid resize report with a genuinely different size; the stored
    /// size has been updated to the carried value.
    Resized(ObservedSize),
    /// Valid resize report matching the stored size; nothing changed.
    Unchanged,
    /// Dropped: wrong shape, wrong source, wrong location, foreign
    /// originating window, unhandled action, or missing dimensions.
    Dropped,
}

/// Size synchronization state for one embedded panel.
#[derive(Debug, Clone)]
pub struct ResizeChannel {
    location: Location,
    size: ObservedSize,
}

impl ResizeChannel {
    /// Create a channel for `location`, starting at zero size.
    #[must_use]
    pub fn new(location: Location) -> Self {
        Self {
            location,
            size: ObservedSize::ZERO,
        }
    }

    /// The location this channel accepts reports for.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The last accepted size, zero until a report arrives.
    #[must_use]
    pub const fn size(&self) -> ObservedSize {
        self.size
    }

    /// Offer an inbound message to this channel.
    ///
    /// `origin_window` is the window that posted the message;
    /// `live_window` is the tracked frame's current content window. A
    /// report is accepted only when the payload declares the panel source
    /// tag, addresses this channel's location, and the two windows match.
    /// Accepted reports update the stored size only on an actual change.
    pub fn accept(
        &mut self,
        payload: &Value,
        origin_window: WindowId,
        live_window: WindowId,
    ) -> Acceptance {
        let Some(raw) = parse_payload(payload) else {
            trace!(
                target: "metaframe_channel",
                location = self.location.as_str(),
                "dropped undecodable payload"
            );
            return Acceptance::Dropped;
        };

        if raw.source.as_deref() != Some(MESSAGE_SOURCE) {
            trace!(
                target: "metaframe_channel",
                location = self.location.as_str(),
                "dropped message without panel source tag"
            );
            return Acceptance::Dropped;
        }

        if raw.location.as_deref() != Some(self.location.as_str()) {
            debug!(
                target: "metaframe_channel",
                location = self.location.as_str(),
                addressed = raw.location.as_deref().unwrap_or(""),
                "dropped message addressed to another panel"
            );
            return Acceptance::Dropped;
        }

        if origin_window != live_window {
            debug!(
                target: "metaframe_channel",
                location = self.location.as_str(),
                origin = origin_window.get(),
                live = live_window.get(),
                "dropped message from foreign window"
            );
            return Acceptance::Dropped;
        }

        if raw.action.as_deref() != Some(ACTION_RESIZE) {
            debug!(
                target: "metaframe_channel",
                location = self.location.as_str(),
                action = raw.action.as_deref().unwrap_or(""),
                "dropped message with unhandled action"
            );
            return Acceptance::Dropped;
        }

        let (Some(width), Some(height)) = (raw.width, raw.height) else {
            debug!(
                target: "metaframe_channel",
                location = self.location.as_str(),
                "dropped resize report without both dimensions"
            );
            return Acceptance::Dropped;
        };

        let reported = ObservedSize::new(width, height);
        if reported == self.size {
            trace!(
                target: "metaframe_channel",
                location = self.location.as_str(),
                width,
                height,
                "resize report matches stored size"
            );
            return Acceptance::Unchanged;
        }

        self.size = reported;
        debug!(
            target: "metaframe_channel",
            location = self.location.as_str(),
            width,
            height,
            "accepted resize report"
        );
        Acceptance::Resized(reported)
    }
}
