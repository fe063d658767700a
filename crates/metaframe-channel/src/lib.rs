#![forbid(unsafe_code)]

//! Resize message channel: schema, parsing, and acceptance rules.
//!
//! # Role in metaframe
//! Embedded panel content reports its rendered size by posting structured
//! messages to the top window. This crate decides which of those messages a
//! given panel may trust and keeps that panel's [`ObservedSize`] current.
//!
//! # Primary responsibilities
//! - [`message`]: the wire schema and the permissive payload decoder.
//! - [`channel`]: per-panel acceptance (source tag, location, originating
//!   window) and change detection against the stored size.
//!
//! # How it fits in the system
//! The panel controller in `metaframe-sync` forwards every inbound message
//! event here together with the tracked frame's live window identity; only
//! an accepted, genuinely different size report flows back out as a size
//! change. Everything else is dropped without side effects.
//!
//! [`ObservedSize`]: metaframe_core::geometry::ObservedSize

pub mod channel;
pub mod message;

pub use channel::{Acceptance, ResizeChannel};
pub use message::{ACTION_RESIZE, MESSAGE_SOURCE, RawPanelMessage, parse_payload};
