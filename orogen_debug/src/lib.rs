// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for orogen
//! diagnostics.
//!
//! This crate provides [`TraceSink`](orogen_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event
//!   output, plus [`pretty::dump_tree`] for scene-tree snapshots.
//! - [`recorder::RecorderSink`] — in-memory event recording.
//! - [`chrome::export_chrome_trace`] — writes Chrome Trace Event Format
//!   JSON from recorded events.

pub mod chrome;
pub mod pretty;
pub mod recorder;
