#![forbid(unsafe_code)]

//! Panel synchronization: dirty tracking, double-buffered reloads, and the
//! host-facing controller.
//!
//! # Role in metaframe
//! This crate holds the state machines that keep one embedded legacy panel
//! honest: whether its form has unsaved edits, how its content is swapped
//! for freshly rendered content without a visible blank, and how all of
//! that is reported to the embedding host.
//!
//! # Primary responsibilities
//! - [`dirty`]: snapshot-based form divergence detection that reports only
//!   transitions, never every check.
//! - [`reload`]: the clone/swap/reap reload session, with explicit
//!   rejection of concurrent sessions and a bounded deadline.
//! - [`panel`]: the [`PanelController`] tying probe, resize channel, dirty
//!   tracker, and reload sessions together behind commands in and drained
//!   events out.
//!
//! # How it fits in the system
//! The host owns the event loop and the clock. It forwards DOM happenings
//! as [`HostEvent`]s, issues commands like
//! [`begin_reload`](panel::PanelController::begin_reload), advances time
//! through [`poll_deadline`](panel::PanelController::poll_deadline), and
//! drains [`PanelEvent`]s to update its own UI state.
//!
//! [`PanelController`]: panel::PanelController
//! [`PanelEvent`]: panel::PanelEvent
//! [`HostEvent`]: metaframe_core::event::HostEvent

pub mod dirty;
pub mod panel;
pub mod reload;

pub use dirty::{DirtyTracker, DirtyTransition, FormSnapshot};
pub use panel::{PanelConfig, PanelController, PanelEvent};
pub use reload::{ReloadCoordinator, ReloadError, ReloadPhase, SessionProgress};
