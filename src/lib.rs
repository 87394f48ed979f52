// Copyright 2021 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paragraph-level directional run resolution for the Unicode Bidirectional Algorithm (UAX #9).
//!
//! This crate implements the paragraph rules (P2/P3) and the explicit formatting rules
//! (X1–X10) of the Unicode Bidirectional Algorithm. Given a sequence of bidi character
//! classifications for a paragraph, [`ParagraphResolver`] produces a per-character embedding
//! level and, as a side effect, streams the paragraph's *isolating runs* to a caller-supplied
//! [`IsolatingRunSink`].
//!
//! What this crate deliberately does **not** do:
//! - decode text from any particular encoding (it consumes `&[BidiClass]`, already classified),
//! - perform weak, neutral, or implicit resolution (rules W1–W7, N0–N2, I1–I2) — that is the job
//!   of whatever [`IsolatingRunSink`] the caller plugs in,
//! - mirror characters, break lines, or shape glyphs,
//! - manage shared ownership of its inputs or outputs; this crate uses ordinary Rust ownership.
//!
//! ## Usage
//!
//! ```
//! use bidi_core::{BidiClass, Level, ParagraphRequest, ParagraphResolver};
//!
//! let types = [BidiClass::L, BidiClass::Lri, BidiClass::R, BidiClass::R, BidiClass::Pdi, BidiClass::L];
//! let request = ParagraphRequest::new(0, types.len(), Level::DEFAULT_LTR);
//! let result = ParagraphResolver::resolve(
//!     &types,
//!     &request,
//!     |_| 1,
//!     &mut bidi_core::NullIsolatingRunSink,
//! );
//!
//! assert_eq!(result.base_level, Level::new(0));
//! assert_eq!(
//!     result.levels,
//!     [Level::new(0), Level::new(0), Level::new(2), Level::new(2), Level::new(0), Level::new(0)]
//! );
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod chain;
mod paragraph;
mod queue;
mod run;
mod stack;
mod types;

pub use chain::{BidiChain, Link};
pub use paragraph::{ParagraphRequest, ParagraphResolver, ParagraphResult};
pub use queue::RunQueue;
pub use run::{LevelRun, RunKind};
pub use stack::StatusStack;
pub use types::{BidiClass, Level};

/// Receives the base [`LevelRun`] of every isolating run produced while resolving a paragraph.
///
/// This is the seam between this crate and whatever performs weak/neutral/implicit resolution
/// (rules W1–W7, N0–N2, I1–I2) on the characters of a completed isolating run. This crate never
/// looks inside the sink; it only guarantees the order and normalization described in
/// [`ParagraphResolver::resolve`].
pub trait IsolatingRunSink {
    /// Called once for the base level run of each isolating run, in paragraph order.
    fn resolve(&mut self, chain: &BidiChain, base_run: &LevelRun);
}

/// An [`IsolatingRunSink`] that does nothing.
///
/// Useful for callers that only need embedding levels (e.g. callers that reorder whole lines
/// without needing character-level bidi categories), and for tests of this crate that only
/// assert on [`ParagraphResult::levels`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NullIsolatingRunSink;

impl IsolatingRunSink for NullIsolatingRunSink {
    fn resolve(&mut self, _chain: &BidiChain, _base_run: &LevelRun) {}
}
