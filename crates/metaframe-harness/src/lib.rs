#![forbid(unsafe_code)]

//! Deterministic in-memory DOM backend for metaframe tests.
//!
//! # Role in metaframe
//! Panel logic is sans-io: it drives a [`FrameDom`] and consumes
//! [`HostEvent`]s without ever touching a browser. This crate supplies the
//! other half for tests: [`MemoryDom`], a fully deterministic backend that
//! models frames, their documents and forms, navigation, and listener and
//! observer registration, with strict handle accounting.
//!
//! # Primary responsibilities
//! - Implement every [`FrameDom`] operation over plain collections.
//! - Synthesize [`HostEvent`]s (loads, edits, mutations, messages) the way
//!   a real document would deliver them.
//! - Keep attach/detach ledgers so tests can assert that nothing leaks and
//!   nothing is discarded while still wired.
//! - Inject failures: cross-origin denial and withheld load completion.
//!
//! # How it fits in the system
//! `metaframe-sync` uses this crate in its unit and integration tests to
//! drive full panel lifecycles, reload sessions included, with no browser
//! in the loop.
//!
//! [`FrameDom`]: metaframe_core::dom::FrameDom
//! [`HostEvent`]: metaframe_core::event::HostEvent

pub mod memory_dom;

pub use memory_dom::{AttachLedger, MemoryDom};
