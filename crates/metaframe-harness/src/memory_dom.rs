#![forbid(unsafe_code)]

//! In-memory [`FrameDom`] implementation with strict handle accounting.
//!
//! Model notes, matching how documents behave for the operations panel
//! logic actually performs:
//!
//! - A freshly created frame has a browsing context but no loaded
//!   document; its first [`complete_load`](MemoryDom::complete_load)
//!   installs one. Every load completion mints a fresh [`WindowId`], so
//!   stale-window message checks are observable.
//! - [`submit_form`](FrameDom::submit_form) starts a navigation but keeps
//!   the current document readable until the load completes, the way a
//!   browser keeps the old page visible while fetching.
//! - Cloning a frame deep-copies its document and element state but the
//!   clone gets its own handle and browsing context.
//! - Inspection helpers are omniscient: they read frame state directly and
//!   bypass the access checks the trait methods enforce, and they panic on
//!   unknown handles instead of returning errors.

use std::collections::BTreeMap;

use metaframe_core::dom::{
    DomError, FormEntry, FrameAttrs, FrameDom, FrameId, ListenTarget, ListenerId, ListenerKind,
    MutationInterest, ObserverId, WindowId,
};
use metaframe_core::event::HostEvent;
use serde_json::Value;

/// Attach/detach totals for one class of handle.
///
/// `died_with_frame` counts handles that were still attached when their
/// frame was removed. Panel logic is expected to detach everything first,
/// so tests assert this stays zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttachLedger {
    /// Handles ever attached.
    pub attached: u64,
    /// Handles explicitly detached.
    pub detached: u64,
    /// Handles destroyed implicitly by frame removal.
    pub died_with_frame: u64,
}

impl AttachLedger {
    /// Handles currently attached.
    #[must_use]
    pub const fn live(&self) -> u64 {
        self.attached - self.detached - self.died_with_frame
    }
}

#[derive(Debug, Clone)]
struct FrameState {
    attrs: FrameAttrs,
    window: WindowId,
    loaded: bool,
    pending_load: bool,
    cross_origin: bool,
    concealed: bool,
    displayed: bool,
    size: (u32, u32),
    forms: BTreeMap<String, Vec<FormEntry>>,
    staged: Option<BTreeMap<String, Vec<FormEntry>>>,
}

#[derive(Debug, Clone)]
struct ListenerRecord {
    target: ListenTarget,
    kind: ListenerKind,
}

impl ListenerRecord {
    fn frame(&self) -> Option<FrameId> {
        match self.target {
            ListenTarget::TopWindow => None,
            ListenTarget::Frame(frame) | ListenTarget::FormIn(frame) => Some(frame),
        }
    }
}

#[derive(Debug, Clone)]
struct ObserverRecord {
    frame: FrameId,
}

/// Deterministic in-memory DOM backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryDom {
    frames: BTreeMap<FrameId, FrameState>,
    listeners: BTreeMap<ListenerId, ListenerRecord>,
    observers: BTreeMap<ObserverId, ObserverRecord>,
    next_frame: u64,
    next_window: u64,
    next_listener: u64,
    next_observer: u64,
    listener_ledger: AttachLedger,
    observer_ledger: AttachLedger,
}

impl MemoryDom {
    /// Create an empty document with no frames.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self, frame: FrameId) -> &FrameState {
        self.frames
            .get(&frame)
            .unwrap_or_else(|| panic!("no frame {} in MemoryDom", frame.get()))
    }

    fn state_mut(&mut self, frame: FrameId) -> &mut FrameState {
        self.frames
            .get_mut(&frame)
            .unwrap_or_else(|| panic!("no frame {} in MemoryDom", frame.get()))
    }

    fn accessible(&self, frame: FrameId) -> Result<&FrameState, DomError> {
        let state = self
            .frames
            .get(&frame)
            .ok_or(DomError::UnknownFrame { frame })?;
        if state.cross_origin {
            return Err(DomError::CrossOrigin { frame });
        }
        if !state.loaded {
            return Err(DomError::NotLoaded { frame });
        }
        Ok(state)
    }

    fn accessible_mut(&mut self, frame: FrameId) -> Result<&mut FrameState, DomError> {
        self.accessible(frame)?;
        Ok(self.state_mut(frame))
    }

    fn mint_window(&mut self) -> WindowId {
        self.next_window += 1;
        WindowId::new(self.next_window)
    }

    // ── Document staging and event synthesis ────────────────────────────

    /// Stage the form the frame's next loaded document will contain.
    ///
    /// Staged content replaces any previously staged form for `form_id`
    /// and is installed by the next [`complete_load`](Self::complete_load).
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown.
    pub fn stage_form(&mut self, frame: FrameId, form_id: &str, entries: &[(&str, &str)]) {
        let fields = entries
            .iter()
            .map(|(name, value)| FormEntry::new(*name, *value))
            .collect();
        self.state_mut(frame)
            .staged
            .get_or_insert_with(BTreeMap::new)
            .insert(form_id.to_owned(), fields);
    }

    /// Finish the frame's in-flight navigation (or reload it in place).
    ///
    /// Installs the staged document, or an empty one if nothing was
    /// staged, mints a fresh window identity, and returns the load event
    /// the host would deliver.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown.
    #[must_use]
    pub fn complete_load(&mut self, frame: FrameId) -> HostEvent {
        let window = self.mint_window();
        let state = self.state_mut(frame);
        state.forms = state.staged.take().unwrap_or_default();
        state.loaded = true;
        state.pending_load = false;
        state.window = window;
        HostEvent::FrameLoaded { frame }
    }

    /// Type into a field of a live form, creating the field if absent.
    ///
    /// Edits happen inside the embedded document, so they work even when
    /// the host is denied access. Returns the input event the host would
    /// deliver.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown or not loaded, or the form is missing.
    #[must_use]
    pub fn edit_field(
        &mut self,
        frame: FrameId,
        form_id: &str,
        name: &str,
        value: &str,
    ) -> HostEvent {
        let state = self.state_mut(frame);
        assert!(state.loaded, "frame {} has no document to edit", frame.get());
        let fields = state
            .forms
            .get_mut(form_id)
            .unwrap_or_else(|| panic!("frame {} has no form {form_id:?}", frame.get()));
        match fields.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.value = value.to_owned(),
            None => fields.push(FormEntry::new(name, value)),
        }
        HostEvent::FormEdited { frame }
    }

    /// Remove a field from a live form, a structural change.
    ///
    /// Returns the mutation event the host would deliver.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown or not loaded, or the form or field is
    /// missing.
    #[must_use]
    pub fn remove_field(&mut self, frame: FrameId, form_id: &str, name: &str) -> HostEvent {
        let state = self.state_mut(frame);
        assert!(state.loaded, "frame {} has no document to edit", frame.get());
        let fields = state
            .forms
            .get_mut(form_id)
            .unwrap_or_else(|| panic!("frame {} has no form {form_id:?}", frame.get()));
        let index = fields
            .iter()
            .position(|entry| entry.name == name)
            .unwrap_or_else(|| panic!("form {form_id:?} has no field {name:?}"));
        fields.remove(index);
        HostEvent::FormMutated { frame }
    }

    /// Build the message event the frame's live content would post.
    ///
    /// The originating window is the frame's current one; pair with a
    /// hand-built [`HostEvent::Message`] to simulate stale or foreign
    /// windows.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown or not loaded.
    #[must_use]
    pub fn message_from(&self, frame: FrameId, payload: Value) -> HostEvent {
        let state = self.state(frame);
        assert!(
            state.loaded,
            "frame {} has no document to post from",
            frame.get()
        );
        HostEvent::Message {
            origin_window: state.window,
            payload,
        }
    }

    // ── Failure injection ───────────────────────────────────────────────

    /// Deny or restore the host's access to the frame's document.
    ///
    /// While denied, document reads fail with [`DomError::CrossOrigin`].
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown.
    pub fn deny_document_access(&mut self, frame: FrameId, denied: bool) {
        self.state_mut(frame).cross_origin = denied;
    }

    // ── Inspection ──────────────────────────────────────────────────────

    /// Number of frames currently attached.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Whether `frame` is currently attached.
    #[must_use]
    pub fn contains_frame(&self, frame: FrameId) -> bool {
        self.frames.contains_key(&frame)
    }

    /// Attached frame handles in creation order.
    #[must_use]
    pub fn frame_ids(&self) -> Vec<FrameId> {
        self.frames.keys().copied().collect()
    }

    /// Whether the frame is concealed (off-flow, invisible).
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown.
    #[must_use]
    pub fn is_concealed(&self, frame: FrameId) -> bool {
        self.state(frame).concealed
    }

    /// Whether the frame's display latch is on.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown.
    #[must_use]
    pub fn is_displayed(&self, frame: FrameId) -> bool {
        self.state(frame).displayed
    }

    /// The frame element's current width/height attributes.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown.
    #[must_use]
    pub fn frame_size(&self, frame: FrameId) -> (u32, u32) {
        self.state(frame).size
    }

    /// The frame element's document URL.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown.
    #[must_use]
    pub fn frame_src(&self, frame: FrameId) -> &str {
        &self.state(frame).attrs.src
    }

    /// Whether the frame has a navigation in flight.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown.
    #[must_use]
    pub fn has_pending_load(&self, frame: FrameId) -> bool {
        self.state(frame).pending_load
    }

    /// The fields of a live form, bypassing access checks.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is unknown.
    #[must_use]
    pub fn form_of(&self, frame: FrameId, form_id: &str) -> Option<&[FormEntry]> {
        self.state(frame).forms.get(form_id).map(Vec::as_slice)
    }

    /// Listener attach/detach totals.
    #[must_use]
    pub const fn listener_ledger(&self) -> AttachLedger {
        self.listener_ledger
    }

    /// Observer attach/detach totals.
    #[must_use]
    pub const fn observer_ledger(&self) -> AttachLedger {
        self.observer_ledger
    }

    /// Number of live listeners of one kind, across all targets.
    #[must_use]
    pub fn listeners_of_kind(&self, kind: ListenerKind) -> usize {
        self.listeners
            .values()
            .filter(|record| record.kind == kind)
            .count()
    }

    /// Number of live listeners on one target, any kind.
    #[must_use]
    pub fn listeners_on(&self, target: ListenTarget) -> usize {
        self.listeners
            .values()
            .filter(|record| record.target == target)
            .count()
    }
}

impl FrameDom for MemoryDom {
    fn create_frame(&mut self, attrs: &FrameAttrs) -> Result<FrameId, DomError> {
        self.next_frame += 1;
        let frame = FrameId::new(self.next_frame);
        let window = self.mint_window();
        self.frames.insert(
            frame,
            FrameState {
                attrs: attrs.clone(),
                window,
                loaded: false,
                pending_load: true,
                cross_origin: false,
                concealed: false,
                displayed: true,
                size: (0, 0),
                forms: BTreeMap::new(),
                staged: None,
            },
        );
        Ok(frame)
    }

    fn clone_frame(&mut self, frame: FrameId) -> Result<FrameId, DomError> {
        let source = self
            .frames
            .get(&frame)
            .ok_or(DomError::UnknownFrame { frame })?
            .clone();
        self.next_frame += 1;
        let clone = FrameId::new(self.next_frame);
        let window = self.mint_window();
        self.frames.insert(
            clone,
            FrameState {
                window,
                staged: None,
                ..source
            },
        );
        Ok(clone)
    }

    fn remove_frame(&mut self, frame: FrameId) -> Result<(), DomError> {
        if self.frames.remove(&frame).is_none() {
            return Err(DomError::UnknownFrame { frame });
        }
        let dead_listeners: Vec<ListenerId> = self
            .listeners
            .iter()
            .filter(|(_, record)| record.frame() == Some(frame))
            .map(|(id, _)| *id)
            .collect();
        for id in dead_listeners {
            self.listeners.remove(&id);
            self.listener_ledger.died_with_frame += 1;
        }
        let dead_observers: Vec<ObserverId> = self
            .observers
            .iter()
            .filter(|(_, record)| record.frame == frame)
            .map(|(id, _)| *id)
            .collect();
        for id in dead_observers {
            self.observers.remove(&id);
            self.observer_ledger.died_with_frame += 1;
        }
        Ok(())
    }

    fn content_window(&self, frame: FrameId) -> Result<WindowId, DomError> {
        // A browsing context is reachable even when its document is not.
        self.frames
            .get(&frame)
            .map(|state| state.window)
            .ok_or(DomError::UnknownFrame { frame })
    }

    fn document_body(&self, frame: FrameId) -> Result<(), DomError> {
        self.accessible(frame).map(|_| ())
    }

    fn form_entries(&self, frame: FrameId, form_id: &str) -> Result<Vec<FormEntry>, DomError> {
        let state = self.accessible(frame)?;
        state
            .forms
            .get(form_id)
            .cloned()
            .ok_or_else(|| DomError::MissingElement {
                frame,
                element_id: form_id.to_owned(),
            })
    }

    fn submit_form(&mut self, frame: FrameId, form_id: &str) -> Result<(), DomError> {
        let state = self.accessible_mut(frame)?;
        if !state.forms.contains_key(form_id) {
            return Err(DomError::MissingElement {
                frame,
                element_id: form_id.to_owned(),
            });
        }
        state.pending_load = true;
        Ok(())
    }

    fn transplant_form(
        &mut self,
        donor: FrameId,
        recipient: FrameId,
        form_id: &str,
    ) -> Result<(), DomError> {
        if !self.accessible(donor)?.forms.contains_key(form_id) {
            return Err(DomError::MissingElement {
                frame: donor,
                element_id: form_id.to_owned(),
            });
        }
        if !self.accessible(recipient)?.forms.contains_key(form_id) {
            return Err(DomError::MissingElement {
                frame: recipient,
                element_id: form_id.to_owned(),
            });
        }
        let fields = self
            .state_mut(donor)
            .forms
            .remove(form_id)
            .unwrap_or_default();
        self.state_mut(recipient)
            .forms
            .insert(form_id.to_owned(), fields);
        Ok(())
    }

    fn conceal_frame(&mut self, frame: FrameId) -> Result<(), DomError> {
        if !self.frames.contains_key(&frame) {
            return Err(DomError::UnknownFrame { frame });
        }
        self.state_mut(frame).concealed = true;
        Ok(())
    }

    fn reveal_frame(&mut self, frame: FrameId) -> Result<(), DomError> {
        if !self.frames.contains_key(&frame) {
            return Err(DomError::UnknownFrame { frame });
        }
        self.state_mut(frame).concealed = false;
        Ok(())
    }

    fn set_frame_display(&mut self, frame: FrameId, shown: bool) -> Result<(), DomError> {
        if !self.frames.contains_key(&frame) {
            return Err(DomError::UnknownFrame { frame });
        }
        self.state_mut(frame).displayed = shown;
        Ok(())
    }

    fn set_frame_size(&mut self, frame: FrameId, width: u32, height: u32) -> Result<(), DomError> {
        if !self.frames.contains_key(&frame) {
            return Err(DomError::UnknownFrame { frame });
        }
        self.state_mut(frame).size = (width, height);
        Ok(())
    }

    fn add_listener(
        &mut self,
        target: ListenTarget,
        kind: ListenerKind,
    ) -> Result<ListenerId, DomError> {
        match target {
            ListenTarget::TopWindow => {}
            ListenTarget::Frame(frame) => {
                if !self.frames.contains_key(&frame) {
                    return Err(DomError::UnknownFrame { frame });
                }
            }
            ListenTarget::FormIn(frame) => {
                // The form node lives inside the document; attaching to it
                // requires the document to be readable.
                self.accessible(frame)?;
            }
        }
        self.next_listener += 1;
        let id = ListenerId::new(self.next_listener);
        self.listeners.insert(id, ListenerRecord { target, kind });
        self.listener_ledger.attached += 1;
        Ok(id)
    }

    fn remove_listener(&mut self, listener: ListenerId) -> Result<(), DomError> {
        if self.listeners.remove(&listener).is_none() {
            return Err(DomError::StaleListener { listener });
        }
        self.listener_ledger.detached += 1;
        Ok(())
    }

    fn observe_form(
        &mut self,
        frame: FrameId,
        form_id: &str,
        _interest: MutationInterest,
    ) -> Result<ObserverId, DomError> {
        if !self.accessible(frame)?.forms.contains_key(form_id) {
            return Err(DomError::MissingElement {
                frame,
                element_id: form_id.to_owned(),
            });
        }
        self.next_observer += 1;
        let id = ObserverId::new(self.next_observer);
        self.observers.insert(id, ObserverRecord { frame });
        self.observer_ledger.attached += 1;
        Ok(id)
    }

    fn disconnect_observer(&mut self, observer: ObserverId) -> Result<(), DomError> {
        if self.observers.remove(&observer).is_none() {
            return Err(DomError::StaleObserver { observer });
        }
        self.observer_ledger.detached += 1;
        Ok(())
    }
}
