#![forbid(unsafe_code)]

//! Panel lifecycle controller.
//!
//! # Role in metaframe
//! [`PanelController`] is the host's single handle on one embedded panel.
//! It owns the resize channel, the dirty tracker, and the reload
//! coordinator, wires them to a [`FrameDom`] backend, and turns the
//! host's raw deliveries into panel-level notifications.
//!
//! # Driving model
//! The host pushes commands and events in and drains notifications out;
//! the controller never blocks and never schedules anything itself:
//!
//! 1. [`mount`](PanelController::mount) creates the frame and subscribes
//!    to messages and loads.
//! 2. Every delivery goes through [`handle`](PanelController::handle);
//!    every clock tick through
//!    [`poll_deadline`](PanelController::poll_deadline).
//! 3. [`begin_reload`](PanelController::begin_reload) starts a
//!    double-buffered reload of the embedded content.
//! 4. [`drain_events`](PanelController::drain_events) yields the queued
//!    [`PanelEvent`]s for the host to act on.
//!
//! `handle` is infallible: backend errors on the delivery path are
//! logged and absorbed, because a dropped message or a stale frame is a
//! recognized state, not a caller mistake. Commands return errors.
//!
//! # Form tracking across reloads
//! The live form node travels into the clone halfway through a reload
//! session, taking any listeners attached to it along. Tracking is
//! therefore detached when a session starts and rewired when the session
//! ends, with a fresh snapshot only after a successful reload. A failed
//! session keeps the old snapshot so pending edits still read as dirty.

use core::time::Duration;
use std::collections::VecDeque;

use metaframe_channel::{Acceptance, ResizeChannel};
use metaframe_core::dom::{
    DomError, FrameAttrs, FrameDom, FrameId, ListenTarget, ListenerId, ListenerKind,
    MutationInterest, ObserverId, WindowId,
};
use metaframe_core::event::HostEvent;
use metaframe_core::geometry::ObservedSize;
use metaframe_core::location::Location;
use metaframe_core::probe;
use serde_json::Value;
use tracing::{debug, warn};

use crate::dirty::{DirtyTracker, DirtyTransition};
use crate::reload::{ReloadCoordinator, ReloadError, SessionProgress};

/// Form identifier embedded documents are expected to expose.
pub const DEFAULT_FORM_ID: &str = "post";

/// How long a reload session may stay in flight before it is aborted.
pub const DEFAULT_RELOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Static description of one embedded panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    /// Correlation id for messages, dirty bookkeeping, and reload
    /// targeting.
    pub location: Location,
    /// Legacy-host URL the frame navigates to; the location is appended
    /// as a query parameter.
    pub base_url: String,
    /// Element id given to the frame (default: `metaframe-<location>`).
    pub element_id: String,
    /// Class name given to the frame (default: `metaframe`).
    pub class_name: String,
    /// Identifier of the tracked form inside the embedded document
    /// (default: `post`).
    pub form_id: String,
    /// Deadline for reload sessions (default: 30s).
    pub reload_timeout: Duration,
}

impl PanelConfig {
    /// Create a config for `location` served from `base_url`, with
    /// defaults for everything else.
    pub fn new(location: impl Into<Location>, base_url: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            base_url: base_url.into(),
            element_id: format!("metaframe-{location}"),
            class_name: "metaframe".to_owned(),
            form_id: DEFAULT_FORM_ID.to_owned(),
            reload_timeout: DEFAULT_RELOAD_TIMEOUT,
            location,
        }
    }

    /// Override the frame element id.
    #[must_use]
    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = element_id.into();
        self
    }

    /// Override the frame class name.
    #[must_use]
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Override the tracked form identifier.
    #[must_use]
    pub fn with_form_id(mut self, form_id: impl Into<String>) -> Self {
        self.form_id = form_id.into();
        self
    }

    /// Override the reload session deadline.
    #[must_use]
    pub fn with_reload_timeout(mut self, timeout: Duration) -> Self {
        self.reload_timeout = timeout;
        self
    }

    /// Initial URL for the frame.
    #[must_use]
    pub fn frame_src(&self) -> String {
        format!("{}&metabox={}", self.base_url, self.location)
    }
}

/// Notification drained from the controller's queue.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// The embedded form's data diverged from its snapshot, or returned
    /// to it. Emitted on transitions only.
    DirtyChanged { location: Location, dirty: bool },
    /// A reload session completed and the original frame is current
    /// again.
    Reloaded { location: Location },
    /// A reload session was aborted; the original frame was restored.
    ReloadFailed {
        location: Location,
        error: ReloadError,
    },
    /// A validated resize report changed the observed size. The frame
    /// element has already been resized to match.
    SizeChanged {
        location: Location,
        size: ObservedSize,
    },
}

/// Drives one embedded panel end to end.
#[derive(Debug)]
pub struct PanelController {
    config: PanelConfig,
    channel: ResizeChannel,
    tracker: DirtyTracker,
    coordinator: ReloadCoordinator,
    frame: Option<FrameId>,
    message_listener: Option<ListenerId>,
    load_listener: Option<ListenerId>,
    form_listeners: Vec<ListenerId>,
    form_observer: Option<ObserverId>,
    events: VecDeque<PanelEvent>,
    is_open: bool,
    has_loaded: bool,
}

impl PanelController {
    /// Create a controller from `config`. Nothing touches the backend
    /// until [`mount`](Self::mount).
    #[must_use]
    pub fn new(config: PanelConfig) -> Self {
        let channel = ResizeChannel::new(config.location.clone());
        let tracker = DirtyTracker::new(config.form_id.clone());
        let coordinator = ReloadCoordinator::new(config.form_id.clone(), config.reload_timeout);
        Self {
            config,
            channel,
            tracker,
            coordinator,
            frame: None,
            message_listener: None,
            load_listener: None,
            form_listeners: Vec::new(),
            form_observer: None,
            events: VecDeque::new(),
            is_open: false,
            has_loaded: false,
        }
    }

    /// The configuration this controller was built from.
    #[must_use]
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// The mounted frame, if any.
    #[must_use]
    pub const fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    /// Whether the collapsible panel is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    /// Flip the collapsible panel open state.
    pub fn toggle_open(&mut self) {
        self.is_open = !self.is_open;
    }

    /// Whether the embedded form currently diverges from its snapshot.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// Whether a reload session is in flight.
    #[must_use]
    pub const fn is_reloading(&self) -> bool {
        self.coordinator.is_active()
    }

    /// The last accepted content size, zero until a report arrives.
    #[must_use]
    pub const fn observed_size(&self) -> ObservedSize {
        self.channel.size()
    }

    /// The observed size rounded up to whole display units.
    #[must_use]
    pub fn display_size(&self) -> (u32, u32) {
        self.channel.size().display()
    }

    /// Initial URL for the frame.
    #[must_use]
    pub fn frame_src(&self) -> String {
        self.config.frame_src()
    }

    /// Create the panel frame and subscribe to messages and loads.
    ///
    /// The frame starts display-hidden; the first load event reveals it,
    /// so an empty document is never shown. Mounting twice keeps the
    /// existing frame.
    pub fn mount(&mut self, dom: &mut dyn FrameDom) -> Result<FrameId, DomError> {
        if let Some(frame) = self.frame {
            warn!(
                target: "metaframe_sync::panel",
                location = %self.config.location,
                "mount requested twice, keeping existing frame"
            );
            return Ok(frame);
        }
        let attrs = FrameAttrs {
            element_id: self.config.element_id.clone(),
            class_name: self.config.class_name.clone(),
            src: self.config.frame_src(),
        };
        let frame = dom.create_frame(&attrs)?;
        if let Err(err) = self.wire_subscriptions(dom, frame) {
            let _ = dom.remove_frame(frame);
            return Err(err);
        }
        self.frame = Some(frame);
        self.has_loaded = false;
        self.attach_form_tracking(dom, frame);
        debug!(
            target: "metaframe_sync::panel",
            location = %self.config.location,
            frame = frame.get(),
            "panel mounted"
        );
        Ok(frame)
    }

    /// Feed one host delivery to the controller.
    ///
    /// Never fails; backend errors on this path are logged and absorbed.
    pub fn handle(&mut self, dom: &mut dyn FrameDom, event: HostEvent) {
        match event {
            HostEvent::Message {
                origin_window,
                payload,
            } => self.on_message(dom, origin_window, &payload),
            HostEvent::FrameLoaded { frame } => self.on_frame_loaded(dom, frame),
            HostEvent::FormMutated { frame } | HostEvent::FormEdited { frame } => {
                self.on_form_activity(dom, frame);
            }
        }
    }

    /// Start a double-buffered reload of the embedded content.
    ///
    /// Completion is reported through [`PanelEvent::Reloaded`] or
    /// [`PanelEvent::ReloadFailed`]; a second call before then returns
    /// [`ReloadError::SessionActive`].
    pub fn begin_reload(
        &mut self,
        dom: &mut dyn FrameDom,
        now: Duration,
    ) -> Result<(), ReloadError> {
        let Some(frame) = self.frame else {
            return Err(ReloadError::NotMounted);
        };
        if self.coordinator.is_active() {
            return Err(ReloadError::SessionActive);
        }
        // The live form node travels into the clone mid-session and any
        // listeners on it would go along, so tracking quiesces for the
        // whole session.
        self.detach_form_tracking(dom);
        if let Err(err) = self.coordinator.begin(dom, frame, now) {
            self.attach_form_tracking(dom, frame);
            return Err(err);
        }
        Ok(())
    }

    /// Abort the reload session once its deadline has passed.
    ///
    /// Call on every clock tick; does nothing while the session is within
    /// its deadline or no session is active.
    pub fn poll_deadline(&mut self, dom: &mut dyn FrameDom, now: Duration) {
        if let Some(error) = self.coordinator.poll_deadline(dom, now) {
            self.events.push_back(PanelEvent::ReloadFailed {
                location: self.config.location.clone(),
                error,
            });
            if let Some(frame) = self.frame {
                self.attach_form_tracking(dom, frame);
            }
        }
    }

    /// Release everything the controller holds on the backend.
    ///
    /// Aborts any session, detaches every listener and observer, and
    /// removes the frame. Queued events stay drainable.
    pub fn teardown(&mut self, dom: &mut dyn FrameDom) {
        self.coordinator.abort(dom);
        self.detach_form_tracking(dom);
        if let Some(listener) = self.load_listener.take() {
            if let Err(err) = dom.remove_listener(listener) {
                debug!(target: "metaframe_sync::panel", error = %err, "stale load listener");
            }
        }
        if let Some(listener) = self.message_listener.take() {
            if let Err(err) = dom.remove_listener(listener) {
                debug!(target: "metaframe_sync::panel", error = %err, "stale message listener");
            }
        }
        if let Some(frame) = self.frame.take() {
            if let Err(err) = dom.remove_frame(frame) {
                debug!(target: "metaframe_sync::panel", error = %err, "frame already gone");
            }
            debug!(
                target: "metaframe_sync::panel",
                location = %self.config.location,
                "panel torn down"
            );
        }
        self.has_loaded = false;
    }

    /// Drain all queued notifications in delivery order.
    pub fn drain_events(&mut self) -> impl Iterator<Item = PanelEvent> + '_ {
        self.events.drain(..)
    }

    fn wire_subscriptions(
        &mut self,
        dom: &mut dyn FrameDom,
        frame: FrameId,
    ) -> Result<(), DomError> {
        dom.set_frame_display(frame, false)?;
        let message = dom.add_listener(ListenTarget::TopWindow, ListenerKind::Message)?;
        self.message_listener = Some(message);
        match dom.add_listener(ListenTarget::Frame(frame), ListenerKind::Load) {
            Ok(load) => {
                self.load_listener = Some(load);
                Ok(())
            }
            Err(err) => {
                if let Some(listener) = self.message_listener.take() {
                    let _ = dom.remove_listener(listener);
                }
                Err(err)
            }
        }
    }

    fn on_message(&mut self, dom: &mut dyn FrameDom, origin_window: WindowId, payload: &Value) {
        if self.message_listener.is_none() {
            return;
        }
        let Some(frame) = self.frame else {
            return;
        };
        let live_window = match dom.content_window(frame) {
            Ok(window) => window,
            Err(err) => {
                warn!(
                    target: "metaframe_sync::panel",
                    location = %self.config.location,
                    error = %err,
                    "frame has no content window, dropping message"
                );
                return;
            }
        };
        match self.channel.accept(payload, origin_window, live_window) {
            Acceptance::Resized(size) => {
                let (width, height) = size.display();
                if let Err(err) = dom.set_frame_size(frame, width, height) {
                    warn!(
                        target: "metaframe_sync::panel",
                        location = %self.config.location,
                        error = %err,
                        "failed to apply frame size"
                    );
                }
                self.events.push_back(PanelEvent::SizeChanged {
                    location: self.config.location.clone(),
                    size,
                });
            }
            Acceptance::Unchanged | Acceptance::Dropped => {}
        }
    }

    fn on_frame_loaded(&mut self, dom: &mut dyn FrameDom, loaded: FrameId) {
        match self.coordinator.handle_load(dom, loaded) {
            Ok(SessionProgress::Swapped) => return,
            Ok(SessionProgress::Completed) => {
                self.after_reload(dom);
                return;
            }
            Ok(SessionProgress::Unrelated) => {}
            Err(error) => {
                self.events.push_back(PanelEvent::ReloadFailed {
                    location: self.config.location.clone(),
                    error,
                });
                if let Some(frame) = self.frame {
                    self.attach_form_tracking(dom, frame);
                }
                return;
            }
        }
        if self.coordinator.is_active() {
            // Loads that are not session transitions are left alone while
            // a session runs; tracking is rewired when it ends.
            return;
        }
        let Some(frame) = self.frame else {
            return;
        };
        if loaded != frame {
            return;
        }
        if !self.has_loaded {
            self.has_loaded = true;
            if let Err(err) = dom.set_frame_display(frame, true) {
                warn!(
                    target: "metaframe_sync::panel",
                    location = %self.config.location,
                    error = %err,
                    "failed to reveal frame after first load"
                );
            }
        }
        self.rewire_form_tracking(dom, frame);
    }

    fn on_form_activity(&mut self, dom: &mut dyn FrameDom, frame: FrameId) {
        if self.coordinator.is_active() {
            return;
        }
        if self.frame != Some(frame) {
            return;
        }
        if let Some(transition) = self.tracker.check(dom, frame) {
            self.push_dirty(transition);
        }
    }

    /// The session completed: the original frame carries fresh content
    /// and the transplanted form again.
    fn after_reload(&mut self, dom: &mut dyn FrameDom) {
        let Some(frame) = self.frame else {
            return;
        };
        self.resubscribe_messages(dom);
        self.events.push_back(PanelEvent::Reloaded {
            location: self.config.location.clone(),
        });
        self.rewire_form_tracking(dom, frame);
    }

    /// Drop the message subscription and take a fresh one.
    fn resubscribe_messages(&mut self, dom: &mut dyn FrameDom) {
        if let Some(listener) = self.message_listener.take() {
            if let Err(err) = dom.remove_listener(listener) {
                debug!(target: "metaframe_sync::panel", error = %err, "stale message listener");
            }
        }
        match dom.add_listener(ListenTarget::TopWindow, ListenerKind::Message) {
            Ok(listener) => self.message_listener = Some(listener),
            Err(err) => {
                warn!(
                    target: "metaframe_sync::panel",
                    location = %self.config.location,
                    error = %err,
                    "failed to resubscribe to messages"
                );
            }
        }
    }

    /// Snapshot the form afresh and rewire tracking to the live document.
    fn rewire_form_tracking(&mut self, dom: &mut dyn FrameDom, frame: FrameId) {
        self.detach_form_tracking(dom);
        self.tracker.rebaseline(dom, frame);
        self.attach_form_tracking(dom, frame);
        if let Some(transition) = self.tracker.check(dom, frame) {
            self.push_dirty(transition);
        }
    }

    /// Attach input/change listeners and the structural observer to the
    /// tracked form, skipping silently when the document is not readable
    /// or has no such form.
    fn attach_form_tracking(&mut self, dom: &mut dyn FrameDom, frame: FrameId) {
        if !self.form_listeners.is_empty() || self.form_observer.is_some() {
            return;
        }
        if !probe::is_accessible(dom, frame) {
            debug!(
                target: "metaframe_sync::panel",
                location = %self.config.location,
                "document not readable, skipping form tracking"
            );
            return;
        }
        if dom.form_entries(frame, self.tracker.form_id()).is_err() {
            debug!(
                target: "metaframe_sync::panel",
                location = %self.config.location,
                "document has no tracked form, skipping form tracking"
            );
            return;
        }
        for kind in [ListenerKind::Input, ListenerKind::Change] {
            match dom.add_listener(ListenTarget::FormIn(frame), kind) {
                Ok(listener) => self.form_listeners.push(listener),
                Err(err) => {
                    warn!(
                        target: "metaframe_sync::panel",
                        location = %self.config.location,
                        error = %err,
                        "failed to attach form listener"
                    );
                    self.detach_form_tracking(dom);
                    return;
                }
            }
        }
        match dom.observe_form(frame, self.tracker.form_id(), MutationInterest::FORM_TRACKING) {
            Ok(observer) => self.form_observer = Some(observer),
            Err(err) => {
                warn!(
                    target: "metaframe_sync::panel",
                    location = %self.config.location,
                    error = %err,
                    "failed to attach form observer"
                );
                self.detach_form_tracking(dom);
            }
        }
    }

    /// Remove every form listener and the observer, tolerating handles
    /// that already died with their frame.
    fn detach_form_tracking(&mut self, dom: &mut dyn FrameDom) {
        for listener in self.form_listeners.drain(..) {
            if let Err(err) = dom.remove_listener(listener) {
                debug!(target: "metaframe_sync::panel", error = %err, "stale form listener");
            }
        }
        if let Some(observer) = self.form_observer.take() {
            if let Err(err) = dom.disconnect_observer(observer) {
                debug!(target: "metaframe_sync::panel", error = %err, "stale form observer");
            }
        }
    }

    fn push_dirty(&mut self, transition: DirtyTransition) {
        let dirty = transition == DirtyTransition::BecameDirty;
        debug!(
            target: "metaframe_sync::panel",
            location = %self.config.location,
            dirty,
            "dirty state changed"
        );
        self.events.push_back(PanelEvent::DirtyChanged {
            location: self.config.location.clone(),
            dirty,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaframe_harness::MemoryDom;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const BASE_URL: &str = "https://example.test/metabox.php?post=7";

    fn controller() -> PanelController {
        PanelController::new(PanelConfig::new("normal", BASE_URL))
    }

    #[test]
    fn config_defaults_derive_from_location() {
        let config = PanelConfig::new("normal", BASE_URL);
        assert_eq!(config.element_id, "metaframe-normal");
        assert_eq!(config.class_name, "metaframe");
        assert_eq!(config.form_id, "post");
        assert_eq!(config.reload_timeout, Duration::from_secs(30));
        assert_eq!(
            config.frame_src(),
            "https://example.test/metabox.php?post=7&metabox=normal"
        );
    }

    #[test]
    fn config_builders_override_defaults() {
        let config = PanelConfig::new("side", BASE_URL)
            .with_element_id("legacy-side")
            .with_class_name("legacy")
            .with_form_id("entry")
            .with_reload_timeout(Duration::from_secs(5));
        assert_eq!(config.element_id, "legacy-side");
        assert_eq!(config.class_name, "legacy");
        assert_eq!(config.form_id, "entry");
        assert_eq!(config.reload_timeout, Duration::from_secs(5));
    }

    #[test]
    fn panel_starts_closed_and_toggles() {
        let mut controller = controller();
        assert!(!controller.is_open());
        controller.toggle_open();
        assert!(controller.is_open());
        controller.toggle_open();
        assert!(!controller.is_open());
    }

    #[test]
    fn mount_creates_a_hidden_frame_with_subscriptions() {
        let mut dom = MemoryDom::new();
        let mut controller = controller();

        let frame = controller.mount(&mut dom).unwrap();
        assert_eq!(controller.frame(), Some(frame));
        assert_eq!(dom.frame_count(), 1);
        assert!(!dom.is_displayed(frame));
        assert_eq!(dom.listeners_on(ListenTarget::TopWindow), 1);
        assert_eq!(dom.listeners_on(ListenTarget::Frame(frame)), 1);
        assert_eq!(dom.listeners_of_kind(ListenerKind::Message), 1);
        assert_eq!(dom.listeners_of_kind(ListenerKind::Load), 1);
        assert_eq!(
            dom.frame_src(frame),
            "https://example.test/metabox.php?post=7&metabox=normal"
        );
    }

    #[test]
    fn mounting_twice_keeps_the_existing_frame() {
        let mut dom = MemoryDom::new();
        let mut controller = controller();

        let first = controller.mount(&mut dom).unwrap();
        let second = controller.mount(&mut dom).unwrap();
        assert_eq!(first, second);
        assert_eq!(dom.frame_count(), 1);
        assert_eq!(dom.listeners_of_kind(ListenerKind::Message), 1);
    }

    #[test]
    fn first_load_reveals_the_frame_and_snapshots_the_form() {
        let mut dom = MemoryDom::new();
        let mut controller = controller();
        let frame = controller.mount(&mut dom).unwrap();

        dom.stage_form(frame, "post", &[("title", "Hello")]);
        let loaded = dom.complete_load(frame);
        controller.handle(&mut dom, loaded);

        assert!(dom.is_displayed(frame));
        assert!(!controller.is_dirty());
        assert_eq!(dom.listeners_of_kind(ListenerKind::Input), 1);
        assert_eq!(dom.listeners_of_kind(ListenerKind::Change), 1);
        assert_eq!(dom.observer_ledger().live(), 1);
        assert_eq!(controller.drain_events().count(), 0);
    }

    #[test]
    fn accepted_resize_is_applied_and_reported() {
        let mut dom = MemoryDom::new();
        let mut controller = controller();
        let frame = controller.mount(&mut dom).unwrap();
        dom.stage_form(frame, "post", &[("title", "Hello")]);
        let loaded = dom.complete_load(frame);
        controller.handle(&mut dom, loaded);

        let message = dom.message_from(
            frame,
            json!({
                "source": "metabox",
                "location": "normal",
                "action": "resize",
                "width": 300.2,
                "height": 149.01,
            }),
        );
        controller.handle(&mut dom, message);

        assert_eq!(dom.frame_size(frame), (301, 150));
        assert_eq!(controller.display_size(), (301, 150));
        let events: Vec<_> = controller.drain_events().collect();
        assert_eq!(
            events,
            vec![PanelEvent::SizeChanged {
                location: Location::new("normal"),
                size: ObservedSize::new(300.2, 149.01),
            }]
        );
    }

    #[test]
    fn events_drain_in_delivery_order() {
        let mut dom = MemoryDom::new();
        let mut controller = controller();
        let frame = controller.mount(&mut dom).unwrap();
        dom.stage_form(frame, "post", &[("title", "Hello")]);
        let loaded = dom.complete_load(frame);
        controller.handle(&mut dom, loaded);

        let message = dom.message_from(
            frame,
            json!({
                "source": "metabox",
                "location": "normal",
                "action": "resize",
                "width": 400.0,
                "height": 200.0,
            }),
        );
        controller.handle(&mut dom, message);
        let edited = dom.edit_field(frame, "post", "title", "Changed");
        controller.handle(&mut dom, edited);

        let events: Vec<_> = controller.drain_events().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PanelEvent::SizeChanged { .. }));
        assert_eq!(
            events[1],
            PanelEvent::DirtyChanged {
                location: Location::new("normal"),
                dirty: true,
            }
        );
        assert_eq!(controller.drain_events().count(), 0);
    }

    #[test]
    fn begin_reload_without_mount_is_rejected() {
        let mut dom = MemoryDom::new();
        let mut controller = controller();
        assert_eq!(
            controller.begin_reload(&mut dom, Duration::ZERO),
            Err(ReloadError::NotMounted)
        );
    }

    #[test]
    fn teardown_releases_the_backend_but_keeps_queued_events() {
        let mut dom = MemoryDom::new();
        let mut controller = controller();
        let frame = controller.mount(&mut dom).unwrap();
        dom.stage_form(frame, "post", &[("title", "Hello")]);
        let loaded = dom.complete_load(frame);
        controller.handle(&mut dom, loaded);
        let edited = dom.edit_field(frame, "post", "title", "Changed");
        controller.handle(&mut dom, edited);

        controller.teardown(&mut dom);
        assert_eq!(controller.frame(), None);
        assert_eq!(dom.frame_count(), 0);
        assert_eq!(dom.listener_ledger().live(), 0);
        assert_eq!(dom.observer_ledger().live(), 0);
        assert_eq!(controller.drain_events().count(), 1);
    }
}
