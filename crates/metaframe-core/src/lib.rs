#![forbid(unsafe_code)]

//! Core: panel identity, observed geometry, the DOM backend seam, and host
//! events.
//!
//! # Role in metaframe
//! `metaframe-core` defines the vocabulary every other crate speaks. It owns
//! the handle types for frames and their attachments, the [`FrameDom`]
//! backend trait through which synchronization logic drives the embedder's
//! real DOM, and the [`HostEvent`] values the embedder pushes back in.
//!
//! # Primary responsibilities
//! - **Location**: stable correlation id for one embedded panel instance.
//! - **ObservedSize**: content size reported from inside a frame, with the
//!   ceil-and-clamp projection used for frame element attributes.
//! - **FrameDom**: the backend seam (frame lifecycle, form access, listener
//!   and observer registration).
//! - **probe**: uniform "is this embedded document reachable" check.
//!
//! # How it fits in the system
//! `metaframe-channel` validates resize messages against identities defined
//! here; `metaframe-sync` drives a [`FrameDom`] implementation and consumes
//! [`HostEvent`]s; `metaframe-harness` provides the deterministic in-memory
//! backend used by tests.
//!
//! [`FrameDom`]: dom::FrameDom
//! [`HostEvent`]: event::HostEvent

pub mod dom;
pub mod event;
pub mod geometry;
pub mod location;
pub mod probe;
