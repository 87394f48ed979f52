// Copyright 2021 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Level runs: maximal spans of chain links sharing one embedding level.

use crate::chain::{BidiChain, LinkRef};
use crate::types::BidiClass;

/// What role a [`LevelRun`] plays with respect to isolates.
///
/// An isolating run is built by following `next` pointers between runs (see
/// [`crate::RunQueue`]); this records, for a single level run, whether it opens an isolate it
/// does not also close (`initiator`), closes one it did not also open (`terminator`), both
/// (`partial`, e.g. `LRI PDI` back to back with nothing in between at that level), or neither
/// (`simple`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunKind {
    initiator: bool,
    terminator: bool,
}

impl RunKind {
    /// Neither opens nor closes an isolate.
    pub fn is_simple(self) -> bool {
        !self.initiator && !self.terminator
    }

    /// Opens an isolate that is not also closed within this same run.
    pub fn is_initiator(self) -> bool {
        self.initiator
    }

    /// Closes an isolate that was not also opened within this same run.
    pub fn is_terminator(self) -> bool {
        self.terminator
    }

    /// Both opens and closes an isolate within the same run.
    pub fn is_partial(self) -> bool {
        self.initiator && self.terminator
    }

    /// Whether [`crate::RunQueue`] should treat this run as belonging to an isolating run
    /// already headed by an earlier initiator, and therefore skip it without handing it to the
    /// [`crate::IsolatingRunSink`] as a base run of its own.
    pub(crate) fn is_attached_terminating(self) -> bool {
        self.terminator && !self.initiator
    }
}

/// A maximal span of [`crate::BidiChain`] links at one embedding level.
///
/// Constructed once a level boundary (or the end of the paragraph) has been found by
/// `determine_levels`; consumed by [`crate::RunQueue`] and ultimately by an
/// [`crate::IsolatingRunSink`].
#[derive(Clone, Copy, Debug)]
pub struct LevelRun {
    first_link: LinkRef,
    last_link: LinkRef,
    sor: BidiClass,
    eor: BidiClass,
    kind: RunKind,
}

impl LevelRun {
    /// Builds a level run spanning `first_link..=last_link`, inspecting the endpoints' types to
    /// classify its [`RunKind`].
    pub(crate) fn new(
        chain: &BidiChain,
        first_link: LinkRef,
        last_link: LinkRef,
        sor: BidiClass,
        eor: BidiClass,
    ) -> Self {
        let initiator = chain.ty(first_link).is_isolate_initiator();
        let terminator = chain.ty(last_link) == BidiClass::Pdi;
        Self {
            first_link,
            last_link,
            sor,
            eor,
            kind: RunKind {
                initiator,
                terminator,
            },
        }
    }

    /// The first link of this run.
    pub fn first_link(&self) -> LinkRef {
        self.first_link
    }

    /// The last link of this run.
    pub fn last_link(&self) -> LinkRef {
        self.last_link
    }

    /// The start-of-run direction: `max(base_level, this run's level)`'s normal bidi type.
    pub fn sor(&self) -> BidiClass {
        self.sor
    }

    /// The end-of-run direction: `max(this run's level, the next run's level)`'s normal bidi
    /// type.
    pub fn eor(&self) -> BidiClass {
        self.eor
    }

    /// This run's isolate role.
    pub fn kind(&self) -> RunKind {
        self.kind
    }
}
