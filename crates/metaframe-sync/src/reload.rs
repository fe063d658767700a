#![forbid(unsafe_code)]

//! Double-buffered reload sessions.
//!
//! # Role in metaframe
//! Reloading a panel in place would blank it for the whole server round
//! trip. A reload session avoids that by keeping two frames alive: the
//! visible original and a hidden clone that navigates with the pending
//! form data. Visibility swaps only once the clone has finished loading,
//! so the user never sees an empty frame.
//!
//! # Session shape
//! A session walks `Idle → CloningStarted → AwaitingCloneLoad → Swapping →
//! AwaitingOldReload → Idle`. `CloningStarted` and `Swapping` are passed
//! through synchronously inside one command or load delivery; a session at
//! rest is always in `AwaitingCloneLoad` or `AwaitingOldReload`.
//!
//! - **begin**: deep-clone the frame, conceal the clone, insert it next to
//!   the original, and submit the tracked form inside the clone so it
//!   navigates with the pending data.
//! - **clone load**: move the original's live form node into the clone in
//!   place of the clone's own, then reveal the clone and conceal the
//!   original; listen for the original's reload.
//! - **original load**: reveal the original, remove the clone, and report
//!   completion.
//!
//! A second begin while a session is active is rejected, never queued.
//! Every session carries a deadline on the host-advanced clock; a session
//! that outlives it is aborted and reported as failed, so nothing stays
//! stuck waiting for a load event that never comes.
//!
//! Aborting restores the original frame but cannot recover a form that
//! already travelled into the clone; the original gets a fresh form when
//! it next reloads.

use core::time::Duration;
use std::fmt;

use metaframe_core::dom::{DomError, FrameDom, FrameId, ListenTarget, ListenerId, ListenerKind};
use tracing::{debug, warn};

/// Phase of the reload session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadPhase {
    /// No session is active.
    Idle,
    /// The clone exists but has not been submitted yet.
    CloningStarted,
    /// The clone is navigating with the pending form data.
    AwaitingCloneLoad,
    /// The clone has loaded; the visibility swap is in progress.
    Swapping,
    /// The clone is visible; waiting for the original to reload.
    AwaitingOldReload,
}

/// Why a reload session could not run or finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadError {
    /// A session is already active; concurrent reloads are rejected.
    SessionActive,
    /// The panel has no mounted frame to reload.
    NotMounted,
    /// The frame's document cannot be read.
    Inaccessible { frame: FrameId },
    /// A document in the sequence is missing the tracked form.
    MissingForm { frame: FrameId },
    /// The session outlived its deadline and was aborted.
    TimedOut { after: Duration },
    /// The backend failed in a way the sequence cannot interpret.
    Dom(DomError),
}

impl fmt::Display for ReloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionActive => write!(f, "a reload session is already active"),
            Self::NotMounted => write!(f, "no mounted frame to reload"),
            Self::Inaccessible { frame } => {
                write!(f, "frame {} document cannot be read", frame.get())
            }
            Self::MissingForm { frame } => {
                write!(f, "frame {} is missing the tracked form", frame.get())
            }
            Self::TimedOut { after } => {
                write!(f, "reload session timed out after {after:?}")
            }
            Self::Dom(err) => write!(f, "dom operation failed: {err}"),
        }
    }
}

impl std::error::Error for ReloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Dom(err) => Some(err),
            _ => None,
        }
    }
}

/// What a load delivery did to the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionProgress {
    /// The load did not belong to the session.
    Unrelated,
    /// The clone loaded; frames swapped, the original's reload is pending.
    Swapped,
    /// The original reloaded; the session is finished and the clone gone.
    Completed,
}

#[derive(Debug)]
struct Session {
    original: FrameId,
    clone: FrameId,
    phase: ReloadPhase,
    clone_load: Option<ListenerId>,
    original_load: Option<ListenerId>,
    started_at: Duration,
}

/// Drives double-buffered reload sessions for one panel frame.
#[derive(Debug)]
pub struct ReloadCoordinator {
    form_id: String,
    timeout: Duration,
    session: Option<Session>,
}

impl ReloadCoordinator {
    /// Create a coordinator for the identified form with a session
    /// deadline of `timeout`.
    #[must_use]
    pub fn new(form_id: impl Into<String>, timeout: Duration) -> Self {
        Self {
            form_id: form_id.into(),
            timeout,
            session: None,
        }
    }

    /// Whether a session is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Current phase, [`ReloadPhase::Idle`] when no session is active.
    #[must_use]
    pub fn phase(&self) -> ReloadPhase {
        self.session
            .as_ref()
            .map_or(ReloadPhase::Idle, |session| session.phase)
    }

    /// The active session's clone frame, if a session is running.
    #[must_use]
    pub fn active_clone(&self) -> Option<FrameId> {
        self.session.as_ref().map(|session| session.clone)
    }

    /// Start a session for `frame` at monotonic time `now`.
    ///
    /// Fails with [`ReloadError::SessionActive`] if one is already
    /// running, with [`ReloadError::MissingForm`] when the live document
    /// has no tracked form, and with [`ReloadError::Inaccessible`] when
    /// the document cannot be read. On any failure the document is left
    /// exactly as it was.
    pub fn begin(
        &mut self,
        dom: &mut dyn FrameDom,
        frame: FrameId,
        now: Duration,
    ) -> Result<(), ReloadError> {
        if self.session.is_some() {
            return Err(ReloadError::SessionActive);
        }
        // The clone inherits its document from the original, so the form
        // must be there before anything is cloned.
        dom.form_entries(frame, &self.form_id)
            .map_err(Self::structural)?;

        let clone = dom.clone_frame(frame).map_err(ReloadError::Dom)?;
        let mut session = Session {
            original: frame,
            clone,
            phase: ReloadPhase::CloningStarted,
            clone_load: None,
            original_load: None,
            started_at: now,
        };

        if let Err(err) = Self::launch_clone(dom, &mut session, &self.form_id) {
            Self::cleanup(dom, session);
            return Err(err);
        }
        session.phase = ReloadPhase::AwaitingCloneLoad;
        debug!(
            target: "metaframe_sync::reload",
            original = frame.get(),
            clone = clone.get(),
            "reload session started"
        );
        self.session = Some(session);
        Ok(())
    }

    /// Feed a frame load event to the session.
    ///
    /// Returns what the load meant for the session. On `Err` the session
    /// has been aborted and the original frame restored.
    pub fn handle_load(
        &mut self,
        dom: &mut dyn FrameDom,
        frame: FrameId,
    ) -> Result<SessionProgress, ReloadError> {
        let Some(mut session) = self.session.take() else {
            return Ok(SessionProgress::Unrelated);
        };
        if session.phase == ReloadPhase::AwaitingCloneLoad && frame == session.clone {
            match Self::swap(dom, &mut session, &self.form_id) {
                Ok(()) => {
                    self.session = Some(session);
                    Ok(SessionProgress::Swapped)
                }
                Err(err) => {
                    warn!(
                        target: "metaframe_sync::reload",
                        error = %err,
                        "swap failed, aborting reload session"
                    );
                    Self::cleanup(dom, session);
                    Err(err)
                }
            }
        } else if session.phase == ReloadPhase::AwaitingOldReload && frame == session.original {
            match Self::complete(dom, &mut session) {
                Ok(()) => Ok(SessionProgress::Completed),
                Err(err) => {
                    warn!(
                        target: "metaframe_sync::reload",
                        error = %err,
                        "completion failed, aborting reload session"
                    );
                    Self::cleanup(dom, session);
                    Err(err)
                }
            }
        } else {
            self.session = Some(session);
            Ok(SessionProgress::Unrelated)
        }
    }

    /// Abort the session once its deadline has passed.
    ///
    /// Returns the timeout error when a session was aborted, `None` while
    /// the session is within its deadline or no session is active.
    pub fn poll_deadline(&mut self, dom: &mut dyn FrameDom, now: Duration) -> Option<ReloadError> {
        let session = self.session.as_ref()?;
        if now.saturating_sub(session.started_at) < self.timeout {
            return None;
        }
        warn!(
            target: "metaframe_sync::reload",
            original = session.original.get(),
            timeout = ?self.timeout,
            "reload session timed out"
        );
        self.abort(dom);
        Some(ReloadError::TimedOut {
            after: self.timeout,
        })
    }

    /// Tear the session down, restoring the original frame.
    ///
    /// Safe to call with no session active.
    pub fn abort(&mut self, dom: &mut dyn FrameDom) {
        if let Some(session) = self.session.take() {
            debug!(
                target: "metaframe_sync::reload",
                original = session.original.get(),
                clone = session.clone.get(),
                phase = ?session.phase,
                "aborting reload session"
            );
            Self::cleanup(dom, session);
        }
    }

    /// Submit the freshly inserted clone so it navigates with the pending
    /// form data.
    fn launch_clone(
        dom: &mut dyn FrameDom,
        session: &mut Session,
        form_id: &str,
    ) -> Result<(), ReloadError> {
        dom.conceal_frame(session.clone).map_err(ReloadError::Dom)?;
        let listener = dom
            .add_listener(ListenTarget::Frame(session.clone), ListenerKind::Load)
            .map_err(ReloadError::Dom)?;
        session.clone_load = Some(listener);
        dom.submit_form(session.clone, form_id)
            .map_err(Self::structural)
    }

    /// The clone finished loading: move the original's live form into it,
    /// make it the visible frame, and wait for the original's reload.
    fn swap(
        dom: &mut dyn FrameDom,
        session: &mut Session,
        form_id: &str,
    ) -> Result<(), ReloadError> {
        session.phase = ReloadPhase::Swapping;
        if let Some(listener) = session.clone_load.take() {
            dom.remove_listener(listener).map_err(ReloadError::Dom)?;
        }
        dom.transplant_form(session.original, session.clone, form_id)
            .map_err(Self::structural)?;
        dom.reveal_frame(session.clone).map_err(ReloadError::Dom)?;
        dom.conceal_frame(session.original)
            .map_err(ReloadError::Dom)?;
        let listener = dom
            .add_listener(ListenTarget::Frame(session.original), ListenerKind::Load)
            .map_err(ReloadError::Dom)?;
        session.original_load = Some(listener);
        session.phase = ReloadPhase::AwaitingOldReload;
        debug!(
            target: "metaframe_sync::reload",
            original = session.original.get(),
            clone = session.clone.get(),
            "frames swapped, awaiting original reload"
        );
        Ok(())
    }

    /// The original reloaded underneath the visible clone: restore the
    /// original and drop the clone.
    fn complete(dom: &mut dyn FrameDom, session: &mut Session) -> Result<(), ReloadError> {
        if let Some(listener) = session.original_load.take() {
            dom.remove_listener(listener).map_err(ReloadError::Dom)?;
        }
        dom.reveal_frame(session.original)
            .map_err(ReloadError::Dom)?;
        dom.conceal_frame(session.clone).map_err(ReloadError::Dom)?;
        dom.remove_frame(session.clone).map_err(ReloadError::Dom)?;
        debug!(
            target: "metaframe_sync::reload",
            original = session.original.get(),
            "reload session complete"
        );
        Ok(())
    }

    /// Release everything a session holds, best effort.
    ///
    /// Used for rollback, abort, and teardown alike; secondary failures
    /// are ignored because the frames involved may already be gone.
    fn cleanup(dom: &mut dyn FrameDom, session: Session) {
        if let Some(listener) = session.clone_load {
            let _ = dom.remove_listener(listener);
        }
        if let Some(listener) = session.original_load {
            let _ = dom.remove_listener(listener);
        }
        let _ = dom.remove_frame(session.clone);
        let _ = dom.reveal_frame(session.original);
    }

    fn structural(err: DomError) -> ReloadError {
        match err {
            DomError::MissingElement { frame, .. } => ReloadError::MissingForm { frame },
            DomError::CrossOrigin { frame } | DomError::NotLoaded { frame } => {
                ReloadError::Inaccessible { frame }
            }
            other => ReloadError::Dom(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaframe_core::dom::FrameAttrs;
    use metaframe_harness::MemoryDom;
    use pretty_assertions::assert_eq;

    const FORM: &str = "post";
    const TIMEOUT: Duration = Duration::from_secs(30);

    fn mounted(dom: &mut MemoryDom) -> FrameId {
        let frame = dom
            .create_frame(&FrameAttrs {
                element_id: "metaframe-normal".to_owned(),
                class_name: "metaframe".to_owned(),
                src: "https://example.test/metabox.php?post=1&metabox=normal".to_owned(),
            })
            .unwrap();
        dom.stage_form(frame, FORM, &[("title", "Hello")]);
        let _ = dom.complete_load(frame);
        frame
    }

    fn coordinator() -> ReloadCoordinator {
        ReloadCoordinator::new(FORM, TIMEOUT)
    }

    #[test]
    fn begin_clones_conceals_and_submits() {
        let mut dom = MemoryDom::new();
        let frame = mounted(&mut dom);
        let mut coordinator = coordinator();

        coordinator.begin(&mut dom, frame, Duration::ZERO).unwrap();
        assert_eq!(coordinator.phase(), ReloadPhase::AwaitingCloneLoad);
        assert_eq!(dom.frame_count(), 2);

        let clone = coordinator.active_clone().unwrap();
        assert!(dom.is_concealed(clone));
        assert!(!dom.is_concealed(frame));
        assert!(dom.has_pending_load(clone));
        assert!(!dom.has_pending_load(frame));
    }

    #[test]
    fn second_begin_is_rejected() {
        let mut dom = MemoryDom::new();
        let frame = mounted(&mut dom);
        let mut coordinator = coordinator();

        coordinator.begin(&mut dom, frame, Duration::ZERO).unwrap();
        assert_eq!(
            coordinator.begin(&mut dom, frame, Duration::from_secs(1)),
            Err(ReloadError::SessionActive)
        );
        assert_eq!(dom.frame_count(), 2);
    }

    #[test]
    fn begin_without_form_fails_and_leaves_no_clone() {
        let mut dom = MemoryDom::new();
        let frame = mounted(&mut dom);
        let _ = dom.complete_load(frame);
        let mut coordinator = coordinator();

        assert_eq!(
            coordinator.begin(&mut dom, frame, Duration::ZERO),
            Err(ReloadError::MissingForm { frame })
        );
        assert_eq!(coordinator.phase(), ReloadPhase::Idle);
        assert_eq!(dom.frame_count(), 1);
        assert_eq!(dom.listener_ledger().live(), 0);
    }

    #[test]
    fn begin_on_inaccessible_frame_fails() {
        let mut dom = MemoryDom::new();
        let frame = mounted(&mut dom);
        dom.deny_document_access(frame, true);
        let mut coordinator = coordinator();

        assert_eq!(
            coordinator.begin(&mut dom, frame, Duration::ZERO),
            Err(ReloadError::Inaccessible { frame })
        );
        assert_eq!(dom.frame_count(), 1);
    }

    #[test]
    fn clone_load_swaps_visibility_and_moves_the_live_form() {
        let mut dom = MemoryDom::new();
        let frame = mounted(&mut dom);
        let _ = dom.edit_field(frame, FORM, "title", "Pending edit");
        let mut coordinator = coordinator();
        coordinator.begin(&mut dom, frame, Duration::ZERO).unwrap();
        let clone = coordinator.active_clone().unwrap();

        dom.stage_form(clone, FORM, &[("title", "Server render")]);
        let _ = dom.complete_load(clone);
        let progress = coordinator.handle_load(&mut dom, clone).unwrap();
        assert_eq!(progress, SessionProgress::Swapped);
        assert_eq!(coordinator.phase(), ReloadPhase::AwaitingOldReload);

        assert!(!dom.is_concealed(clone));
        assert!(dom.is_concealed(frame));
        // The clone now carries the original's live form node.
        assert_eq!(
            dom.form_of(clone, FORM).unwrap()[0].value,
            "Pending edit".to_owned()
        );
        assert_eq!(dom.form_of(frame, FORM), None);
    }

    #[test]
    fn original_reload_finishes_the_session() {
        let mut dom = MemoryDom::new();
        let frame = mounted(&mut dom);
        let mut coordinator = coordinator();
        coordinator.begin(&mut dom, frame, Duration::ZERO).unwrap();
        let clone = coordinator.active_clone().unwrap();

        dom.stage_form(clone, FORM, &[("title", "Server render")]);
        let _ = dom.complete_load(clone);
        coordinator.handle_load(&mut dom, clone).unwrap();

        dom.stage_form(frame, FORM, &[("title", "Server render")]);
        let _ = dom.complete_load(frame);
        let progress = coordinator.handle_load(&mut dom, frame).unwrap();
        assert_eq!(progress, SessionProgress::Completed);
        assert_eq!(coordinator.phase(), ReloadPhase::Idle);

        assert_eq!(dom.frame_count(), 1);
        assert!(dom.contains_frame(frame));
        assert!(!dom.is_concealed(frame));
        assert_eq!(dom.listener_ledger().live(), 0);
        assert_eq!(dom.listener_ledger().died_with_frame, 0);
    }

    #[test]
    fn unrelated_loads_are_ignored() {
        let mut dom = MemoryDom::new();
        let frame = mounted(&mut dom);
        let mut coordinator = coordinator();

        // No session at all.
        assert_eq!(
            coordinator.handle_load(&mut dom, frame).unwrap(),
            SessionProgress::Unrelated
        );

        coordinator.begin(&mut dom, frame, Duration::ZERO).unwrap();
        // The original reloading before the clone is not a session event.
        let _ = dom.complete_load(frame);
        assert_eq!(
            coordinator.handle_load(&mut dom, frame).unwrap(),
            SessionProgress::Unrelated
        );
        assert_eq!(coordinator.phase(), ReloadPhase::AwaitingCloneLoad);
    }

    #[test]
    fn clone_loading_without_its_form_aborts() {
        let mut dom = MemoryDom::new();
        let frame = mounted(&mut dom);
        let mut coordinator = coordinator();
        coordinator.begin(&mut dom, frame, Duration::ZERO).unwrap();
        let clone = coordinator.active_clone().unwrap();

        // The server answered with a document missing the tracked form.
        let _ = dom.complete_load(clone);
        assert_eq!(
            coordinator.handle_load(&mut dom, clone),
            Err(ReloadError::MissingForm { frame: clone })
        );
        assert_eq!(coordinator.phase(), ReloadPhase::Idle);
        assert_eq!(dom.frame_count(), 1);
        assert!(!dom.is_concealed(frame));
        assert_eq!(dom.listener_ledger().live(), 0);
    }

    #[test]
    fn deadline_aborts_a_stuck_session() {
        let mut dom = MemoryDom::new();
        let frame = mounted(&mut dom);
        let mut coordinator = coordinator();
        coordinator
            .begin(&mut dom, frame, Duration::from_secs(5))
            .unwrap();

        assert_eq!(
            coordinator.poll_deadline(&mut dom, Duration::from_secs(34)),
            None
        );
        assert_eq!(
            coordinator.poll_deadline(&mut dom, Duration::from_secs(35)),
            Some(ReloadError::TimedOut { after: TIMEOUT })
        );
        assert_eq!(coordinator.phase(), ReloadPhase::Idle);
        assert_eq!(dom.frame_count(), 1);
        assert!(!dom.is_concealed(frame));
        assert_eq!(dom.listener_ledger().live(), 0);

        // Nothing left to time out.
        assert_eq!(
            coordinator.poll_deadline(&mut dom, Duration::from_secs(60)),
            None
        );
    }

    #[test]
    fn abort_after_swap_restores_the_original() {
        let mut dom = MemoryDom::new();
        let frame = mounted(&mut dom);
        let mut coordinator = coordinator();
        coordinator.begin(&mut dom, frame, Duration::ZERO).unwrap();
        let clone = coordinator.active_clone().unwrap();
        dom.stage_form(clone, FORM, &[("title", "Server render")]);
        let _ = dom.complete_load(clone);
        coordinator.handle_load(&mut dom, clone).unwrap();

        coordinator.abort(&mut dom);
        assert_eq!(coordinator.phase(), ReloadPhase::Idle);
        assert_eq!(dom.frame_count(), 1);
        assert!(!dom.is_concealed(frame));
        assert_eq!(dom.listener_ledger().live(), 0);
        assert_eq!(dom.listener_ledger().died_with_frame, 0);
    }
}
