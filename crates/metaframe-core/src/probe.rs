#![forbid(unsafe_code)]

//! Frame accessibility probe.
//!
//! An embedded document can be unreadable for several unrelated reasons:
//! the frame was never attached, the document has not loaded yet, or the
//! content navigated somewhere cross-origin. Panel logic never needs to
//! tell these apart; it needs one answer before touching frame internals.

use crate::dom::{FrameDom, FrameId};

/// Whether the frame's document can be read by panel logic.
///
/// Any failure to reach the document body classifies the frame as not
/// accessible, with no further distinction. Callers check this before
/// wiring listeners or reading form data and silently skip setup when it
/// returns `false`.
#[must_use]
pub fn is_accessible(dom: &dyn FrameDom, frame: FrameId) -> bool {
    dom.document_body(frame).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{
        DomError, FormEntry, FrameAttrs, ListenTarget, ListenerId, ListenerKind, MutationInterest,
        ObserverId, WindowId,
    };

    /// Backend stub that only answers body probes.
    struct BodyOnlyDom {
        body: Result<(), DomError>,
    }

    impl FrameDom for BodyOnlyDom {
        fn create_frame(&mut self, _attrs: &FrameAttrs) -> Result<FrameId, DomError> {
            unimplemented!("probe never creates frames")
        }

        fn clone_frame(&mut self, _frame: FrameId) -> Result<FrameId, DomError> {
            unimplemented!("probe never clones frames")
        }

        fn remove_frame(&mut self, _frame: FrameId) -> Result<(), DomError> {
            unimplemented!("probe never removes frames")
        }

        fn content_window(&self, _frame: FrameId) -> Result<WindowId, DomError> {
            unimplemented!("probe never reads windows")
        }

        fn document_body(&self, _frame: FrameId) -> Result<(), DomError> {
            self.body.clone()
        }

        fn form_entries(
            &self,
            _frame: FrameId,
            _form_id: &str,
        ) -> Result<Vec<FormEntry>, DomError> {
            unimplemented!("probe never reads forms")
        }

        fn submit_form(&mut self, _frame: FrameId, _form_id: &str) -> Result<(), DomError> {
            unimplemented!("probe never submits forms")
        }

        fn transplant_form(
            &mut self,
            _donor: FrameId,
            _recipient: FrameId,
            _form_id: &str,
        ) -> Result<(), DomError> {
            unimplemented!("probe never moves forms")
        }

        fn conceal_frame(&mut self, _frame: FrameId) -> Result<(), DomError> {
            unimplemented!("probe never hides frames")
        }

        fn reveal_frame(&mut self, _frame: FrameId) -> Result<(), DomError> {
            unimplemented!("probe never reveals frames")
        }

        fn set_frame_display(&mut self, _frame: FrameId, _shown: bool) -> Result<(), DomError> {
            unimplemented!("probe never toggles display")
        }

        fn set_frame_size(
            &mut self,
            _frame: FrameId,
            _width: u32,
            _height: u32,
        ) -> Result<(), DomError> {
            unimplemented!("probe never sizes frames")
        }

        fn add_listener(
            &mut self,
            _target: ListenTarget,
            _kind: ListenerKind,
        ) -> Result<ListenerId, DomError> {
            unimplemented!("probe never subscribes")
        }

        fn remove_listener(&mut self, _listener: ListenerId) -> Result<(), DomError> {
            unimplemented!("probe never unsubscribes")
        }

        fn observe_form(
            &mut self,
            _frame: FrameId,
            _form_id: &str,
            _interest: MutationInterest,
        ) -> Result<ObserverId, DomError> {
            unimplemented!("probe never observes")
        }

        fn disconnect_observer(&mut self, _observer: ObserverId) -> Result<(), DomError> {
            unimplemented!("probe never disconnects")
        }
    }

    const FRAME: FrameId = FrameId::new(1);

    #[test]
    fn readable_body_is_accessible() {
        let dom = BodyOnlyDom { body: Ok(()) };
        assert!(is_accessible(&dom, FRAME));
    }

    #[test]
    fn cross_origin_body_is_not_accessible() {
        let dom = BodyOnlyDom {
            body: Err(DomError::CrossOrigin { frame: FRAME }),
        };
        assert!(!is_accessible(&dom, FRAME));
    }

    #[test]
    fn unloaded_document_is_not_accessible() {
        let dom = BodyOnlyDom {
            body: Err(DomError::NotLoaded { frame: FRAME }),
        };
        assert!(!is_accessible(&dom, FRAME));
    }

    #[test]
    fn unknown_frame_is_not_accessible() {
        let dom = BodyOnlyDom {
            body: Err(DomError::UnknownFrame { frame: FRAME }),
        };
        assert!(!is_accessible(&dom, FRAME));
    }
}
