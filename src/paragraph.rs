// Copyright 2021 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The paragraph resolver: populates a [`BidiChain`] from bidi types, determines the paragraph
//! level (P2/P3), runs the X1–X10 status-stack driver, and flattens the result into per-position
//! embedding levels.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::chain::{BidiChain, LinkRef};
use crate::queue::RunQueue;
use crate::run::LevelRun;
use crate::stack::StatusStack;
use crate::types::{BidiClass, Level};
use crate::IsolatingRunSink;

/// A request to resolve one paragraph out of a larger buffer of bidi types.
///
/// `paragraph_offset` and `suggested_length` describe a window into the caller's `types` slice;
/// the resolved paragraph may end earlier, at the first paragraph separator (`B`) found within
/// that window (see [`ParagraphResolver::resolve`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParagraphRequest {
    paragraph_offset: usize,
    suggested_length: usize,
    base_level: Level,
}

impl ParagraphRequest {
    /// Creates a request. `base_level` may be a concrete level or one of
    /// [`Level::DEFAULT_LTR`]/[`Level::DEFAULT_RTL`] to request P2/P3 auto-detection.
    pub const fn new(paragraph_offset: usize, suggested_length: usize, base_level: Level) -> Self {
        Self {
            paragraph_offset,
            suggested_length,
            base_level,
        }
    }
}

/// The result of resolving a paragraph: its resolved base level and per-position embedding
/// levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParagraphResult {
    /// The resolved paragraph embedding level (always a concrete level, never an auto sentinel).
    pub base_level: Level,
    /// One embedding level per input position, `levels.len() == actual_length`.
    pub levels: Vec<Level>,
    /// How many positions of the request's window this paragraph actually consumed.
    pub actual_length: usize,
}

/// Drives one paragraph's resolution from classified bidi types to embedding levels.
///
/// This type has no public constructor or instance methods; [`ParagraphResolver::resolve`] owns
/// a chain, status stack, and run queue for the duration of a single call and discards them on
/// return, mirroring the lifetime of the reference implementation's `ParagraphContext` without
/// needing an explicit create/dispose pair.
#[derive(Debug)]
pub struct ParagraphResolver;

impl ParagraphResolver {
    /// Resolves one paragraph.
    ///
    /// `types` is the full buffer of bidi classifications the request's window indexes into.
    /// `separator_length` is consulted only at the index where a `B` is found (or at the end of
    /// the window, where it is never read as a meaningful separator); it returns how many
    /// positions past that `B` belong to the paragraph (1 for most separators, 2 for CR+LF).
    ///
    /// # Panics (debug builds only)
    ///
    /// Panics if `suggested_length == 0` or the window runs past the end of `types`.
    pub fn resolve(
        types: &[BidiClass],
        request: &ParagraphRequest,
        separator_length: impl Fn(usize) -> u8,
        sink: &mut impl IsolatingRunSink,
    ) -> ParagraphResult {
        debug_assert!(request.suggested_length > 0, "suggested_length must be nonzero");
        debug_assert!(
            request.paragraph_offset + request.suggested_length <= types.len(),
            "paragraph window runs past the end of the input"
        );

        #[cfg(feature = "logging")]
        log::trace!(
            "resolving paragraph at offset {} (suggested length {})",
            request.paragraph_offset,
            request.suggested_length
        );

        let actual_length = determine_boundary(types, request, &separator_length);

        #[cfg(feature = "logging")]
        log::debug!("paragraph boundary: actual_length = {actual_length}");

        let window = &types[request.paragraph_offset..request.paragraph_offset + actual_length];

        let mut chain = BidiChain::new(actual_length + 2);
        populate_chain(&mut chain, window);

        let base_level = determine_paragraph_level(&chain, request.base_level);

        #[cfg(feature = "logging")]
        log::debug!("paragraph level: {base_level:?}");

        let mut stack = StatusStack::new(base_level);
        let mut queue = RunQueue::new();
        determine_levels(&mut chain, &mut stack, &mut queue, base_level, sink);

        let levels = save_levels(&chain, actual_length, base_level);

        #[cfg(feature = "logging")]
        log::trace!("resolved levels: {levels:?}");

        ParagraphResult {
            base_level,
            levels,
            actual_length,
        }
    }
}

/// §4.5.1: scans for the first `B` within the requested window and extends past it by
/// `separator_length`.
fn determine_boundary(
    types: &[BidiClass],
    request: &ParagraphRequest,
    separator_length: &impl Fn(usize) -> u8,
) -> usize {
    let limit = request.paragraph_offset + request.suggested_length;
    let mut index = request.paragraph_offset;
    while index < limit {
        if types[index] == BidiClass::B {
            index += separator_length(index) as usize;
            break;
        }
        index += 1;
    }
    index - request.paragraph_offset
}

/// §4.5.2: builds the chain out of a paragraph's window of bidi types.
///
/// Each link spans either a maximal same-type non-formatting region or a single code point from
/// the isolation/formatting/break set (`B`, `ON`, the embedding/override/isolate initiators,
/// `PDF`, `PDI`).
fn populate_chain(chain: &mut BidiChain, types: &[BidiClass]) {
    let len = types.len();
    let mut index = 0usize;
    let mut prior_index = 0usize;
    let mut scan_type = BidiClass::Nil;

    while index < len {
        let ty = types[index];
        if ty.starts_own_link() {
            if index > prior_index {
                chain.add(scan_type, index - prior_index);
            }
            chain.add(ty, 1);
            prior_index = index + 1;
            scan_type = BidiClass::Nil;
            if ty == BidiClass::B {
                index = len;
                break;
            }
        } else if ty != scan_type {
            if index > prior_index {
                chain.add(scan_type, index - prior_index);
            }
            scan_type = ty;
            prior_index = index;
        }
        index += 1;
    }

    if scan_type != BidiClass::Nil && index > prior_index {
        chain.add(scan_type, index - prior_index);
        prior_index = index;
    }
    chain.add(BidiClass::Nil, len - prior_index);
}

/// §4.5.3: P2/P3 paragraph-level detection, and the FSI sub-scan (with `is_isolate = true`).
///
/// Walks the chain from just past `start`, skipping the contents of nested isolated
/// subsequences, looking for the first strong character at depth zero.
fn determine_base_level(
    chain: &BidiChain,
    start: LinkRef,
    is_isolate: bool,
    default_level: Level,
) -> Level {
    let mut depth: u32 = 0;
    let mut link = chain.next(start);
    while link != BidiChain::ROLLER {
        let ty = chain.ty(link);
        if ty.is_isolate_initiator() {
            depth += 1;
        } else if ty == BidiClass::Pdi {
            if depth > 0 {
                depth -= 1;
            } else if is_isolate {
                break;
            }
        } else if depth == 0 {
            match ty {
                BidiClass::L => return Level::new(0),
                BidiClass::R | BidiClass::Al => return Level::new(1),
                BidiClass::B => break,
                _ => {}
            }
        }
        link = chain.next(link);
    }
    default_level
}

fn determine_paragraph_level(chain: &BidiChain, base_level: Level) -> Level {
    if !base_level.is_auto() {
        return base_level;
    }
    let default_level = if base_level == Level::DEFAULT_RTL {
        Level::new(1)
    } else {
        Level::new(0)
    };
    determine_base_level(chain, BidiChain::ROLLER, false, default_level)
}

/// §4.5.4: the X1–X10 driver. Walks the populated chain, assigning levels, folding
/// BN-equivalents, and streaming completed level runs through `queue` to `sink`.
fn determine_levels(
    chain: &mut BidiChain,
    stack: &mut StatusStack,
    queue: &mut RunQueue,
    base_level: Level,
    sink: &mut impl IsolatingRunSink,
) {
    let mut over_isolate: u32 = 0;
    let mut over_embedding: u32 = 0;
    let mut valid_isolate: u32 = 0;
    let mut sor = BidiClass::Nil;
    let mut prior_level = base_level;
    let mut prior_link = BidiChain::ROLLER;
    let mut first_link: Option<LinkRef> = None;

    let mut link = chain.next(BidiChain::ROLLER);
    while link != BidiChain::ROLLER {
        let ty = chain.ty(link);
        let mut bn_equivalent = false;
        let mut force_finish = false;
        let mut merged = false;

        match ty {
            BidiClass::Rle | BidiClass::Lre | BidiClass::Rlo | BidiClass::Lro => {
                bn_equivalent = true;
                let current = stack.embedding_level();
                let new_level = if matches!(ty, BidiClass::Rle | BidiClass::Rlo) {
                    current.least_greater_odd()
                } else {
                    current.least_greater_even()
                };
                let override_status = match ty {
                    BidiClass::Rlo => BidiClass::R,
                    BidiClass::Lro => BidiClass::L,
                    _ => BidiClass::On,
                };
                push_embedding(
                    stack,
                    new_level,
                    override_status,
                    over_isolate,
                    &mut over_embedding,
                );
            }
            BidiClass::Rli | BidiClass::Lri | BidiClass::Fsi => {
                let containing_level = stack.embedding_level();
                chain.set_level(link, containing_level);
                let new_level = match ty {
                    BidiClass::Rli => containing_level.least_greater_odd(),
                    BidiClass::Lri => containing_level.least_greater_even(),
                    _ => {
                        let sub = determine_base_level(chain, link, true, Level::new(0));
                        if sub.value() == 0 {
                            containing_level.least_greater_even()
                        } else {
                            containing_level.least_greater_odd()
                        }
                    }
                };
                let prior_override = stack.override_status();
                if new_level.value() <= Level::MAX && over_isolate == 0 && over_embedding == 0 {
                    valid_isolate += 1;
                    stack.push(new_level, BidiClass::On, true);
                } else {
                    over_isolate += 1;
                }
                if prior_override != BidiClass::On {
                    chain.set_type(link, prior_override);
                    merged = chain.merge_if_equal(prior_link, link);
                }
            }
            BidiClass::Pdi => {
                if over_isolate > 0 {
                    over_isolate -= 1;
                } else if valid_isolate != 0 {
                    over_embedding = 0;
                    while !stack.isolate_status() {
                        stack.pop();
                    }
                    stack.pop();
                    valid_isolate -= 1;
                }
                chain.set_level(link, stack.embedding_level());
                let override_status = stack.override_status();
                if override_status != BidiClass::On {
                    chain.set_type(link, override_status);
                    merged = chain.merge_if_equal(prior_link, link);
                }
            }
            BidiClass::Pdf => {
                bn_equivalent = true;
                if over_isolate > 0 {
                    // Absorbed by the enclosing overflowed isolate; nothing to pop.
                } else if over_embedding > 0 {
                    over_embedding -= 1;
                } else if !stack.isolate_status() && stack.count() >= 2 {
                    stack.pop();
                }
            }
            BidiClass::B => {
                stack.reset(base_level);
                over_isolate = 0;
                over_embedding = 0;
                valid_isolate = 0;
                chain.set_level(link, base_level);
            }
            BidiClass::Bn => {
                bn_equivalent = true;
            }
            BidiClass::Nil => {
                force_finish = true;
                chain.set_level(link, base_level);
            }
            _ => {
                chain.set_level(link, stack.embedding_level());
                let override_status = stack.override_status();
                if override_status != BidiClass::On {
                    chain.set_type(link, override_status);
                    merged = chain.merge_if_equal(prior_link, link);
                }
            }
        }

        if bn_equivalent {
            chain.set_type(link, BidiClass::Bn);
            chain.abandon_next(prior_link);
            link = chain.next(prior_link);
            continue;
        }

        if merged {
            // `link` has just been spliced into `prior_link`; `prior_link` is still live and
            // must not be advanced (SBParagraph.c's SB_MERGE_LINK_IF_NEEDED `continue`s here).
            link = chain.next(prior_link);
            continue;
        }

        let link_level = chain.level(link);
        if sor == BidiClass::Nil {
            sor = base_level.max(link_level).normal_bidi_type();
            first_link = Some(link);
            prior_level = link_level;
        } else if prior_level != link_level || force_finish {
            let eor = prior_level.max(link_level).normal_bidi_type();
            let run = LevelRun::new(
                chain,
                first_link.expect("sor set implies first_link set"),
                prior_link,
                sor,
                eor,
            );
            queue.enqueue(run);
            process_run(queue, chain, sink, force_finish);
            sor = eor;
            first_link = Some(link);
            prior_level = link_level;
        }

        prior_link = link;
        link = chain.next(link);
    }
}

/// Shared body of X2–X5: pushes a new embedding entry if the computed level and overflow
/// counters allow it, otherwise records the overflow.
fn push_embedding(
    stack: &mut StatusStack,
    new_level: Level,
    override_status: BidiClass,
    over_isolate: u32,
    over_embedding: &mut u32,
) {
    if new_level.value() <= Level::MAX && over_isolate == 0 && *over_embedding == 0 {
        stack.push(new_level, override_status, false);
    } else if over_isolate == 0 {
        *over_embedding += 1;
    }
}

/// Drains the queue into `sink` once a complete isolating-run group has accumulated, per
/// [`RunQueue::should_dequeue`], or unconditionally once the paragraph has ended.
fn process_run(
    queue: &mut RunQueue,
    chain: &BidiChain,
    sink: &mut impl IsolatingRunSink,
    force_finish: bool,
) {
    if !queue.should_dequeue() && !force_finish {
        return;
    }
    while let Some(run) = queue.peek().copied() {
        if !run.kind().is_attached_terminating() {
            sink.resolve(chain, &run);
        }
        queue.dequeue();
    }
}

/// §4.5.5: flattens the chain's per-link levels into one level per source position, including
/// positions folded into BN-equivalent links abandoned by `determine_levels`.
fn save_levels(chain: &BidiChain, actual_length: usize, base_level: Level) -> Vec<Level> {
    let mut levels = vec![Level::new(0); actual_length];
    let mut index = 0usize;
    let mut level = base_level;
    chain.for_each(BidiChain::ROLLER, |link| {
        let offset = chain
            .offset(link)
            .expect("only the roller has no offset, and for_each never yields it");
        while index < offset {
            levels[index] = level;
            index += 1;
        }
        level = chain.level(link);
    });
    while index < actual_length {
        levels[index] = level;
        index += 1;
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullIsolatingRunSink;
    use BidiClass::*;

    fn resolve(types: &[BidiClass], base_level: Level) -> ParagraphResult {
        let request = ParagraphRequest::new(0, types.len(), base_level);
        ParagraphResolver::resolve(types, &request, |_| 1, &mut NullIsolatingRunSink)
    }

    fn levels(values: &[u8]) -> Vec<Level> {
        values.iter().map(|&v| Level::new(v)).collect()
    }

    #[test]
    fn s1_plain_ltr() {
        let result = resolve(&[L, L, L, L], Level::new(0));
        assert_eq!(result.base_level, Level::new(0));
        assert_eq!(result.levels, levels(&[0, 0, 0, 0]));
    }

    #[test]
    fn s2_plain_rtl() {
        let result = resolve(&[R, R, R, R], Level::new(1));
        assert_eq!(result.base_level, Level::new(1));
        assert_eq!(result.levels, levels(&[1, 1, 1, 1]));
    }

    #[test]
    fn s3_p2_auto() {
        // P2/P3 finds the first strong character (`L`) and resolves base level 0. With no
        // explicit formatting code ever pushing a new embedding level, X1-X10 alone (this crate
        // never applies the implicit rules I1/I2) assigns every position the paragraph level.
        let result = resolve(&[On, On, L, R], Level::DEFAULT_LTR);
        assert_eq!(result.base_level, Level::new(0));
        assert_eq!(result.levels, levels(&[0, 0, 0, 0]));
    }

    #[test]
    fn s4_p3_fallback() {
        let result = resolve(&[On, On, On], Level::DEFAULT_RTL);
        assert_eq!(result.base_level, Level::new(1));
        assert_eq!(result.levels, levels(&[1, 1, 1]));
    }

    #[test]
    fn s5_explicit_embedding() {
        let result = resolve(&[L, Rle, R, R, Pdf, L], Level::new(0));
        assert_eq!(result.levels, levels(&[0, 0, 1, 1, 1, 0]));
    }

    #[test]
    fn s6_isolate() {
        let result = resolve(&[L, Lri, R, R, Pdi, L], Level::new(0));
        assert_eq!(result.levels, levels(&[0, 0, 2, 2, 0, 0]));
    }

    #[test]
    fn s7_overflow_embedding() {
        let mut types = vec![L; 2];
        types.push(Rle); // accepted: 124 -> 125
        types.push(Rle); // rejected: would need 127 > LEVEL_MAX
        types.extend([R, R]);
        types.push(Pdf); // pops the over_embedding counter, not the stack
        types.push(Pdf); // pops back to 124
        types.push(L);

        let request = ParagraphRequest::new(0, types.len(), Level::new(124));
        let result = ParagraphResolver::resolve(&types, &request, |_| 1, &mut NullIsolatingRunSink);

        assert_eq!(result.levels[0], Level::new(124));
        assert_eq!(result.levels[1], Level::new(124));
        // Both RLEs and both PDFs are BN-equivalent; the embedded R R sit at level 125.
        assert_eq!(result.levels[4], Level::new(125));
        assert_eq!(result.levels[5], Level::new(125));
        assert_eq!(*result.levels.last().unwrap(), Level::new(124));
    }

    #[test]
    fn boundary_stops_at_paragraph_separator() {
        let types = [L, L, B, R, R];
        let request = ParagraphRequest::new(0, types.len(), Level::new(0));
        let result = ParagraphResolver::resolve(&types, &request, |_| 1, &mut NullIsolatingRunSink);
        assert_eq!(result.actual_length, 3);
        assert_eq!(result.levels, levels(&[0, 0, 0]));
    }

    #[test]
    fn boundary_covers_whole_window_when_no_separator_is_present() {
        // Regression: `determine_boundary` must not run `separator_length` past a window that
        // never contains a `B` (the callback has no "not a separator" sentinel to fall back to).
        let types = [L, L, L, L];
        let request = ParagraphRequest::new(0, types.len(), Level::new(0));
        let result = ParagraphResolver::resolve(&types, &request, |_| 1, &mut NullIsolatingRunSink);
        assert_eq!(result.actual_length, 4);
        assert_eq!(result.levels, levels(&[0, 0, 0, 0]));
    }

    #[test]
    fn multi_link_override_run_merges_without_orphaning_prior_link() {
        // Regression: LRO opens an even embedding, overriding R/ON/AN to L one link at a time.
        // Each override-induced merge must fold into the chain's live predecessor rather than
        // leaving `prior_link` pointing at a node that was just spliced out.
        let result = resolve(&[Lro, R, On, An, Pdf], Level::new(0));
        assert_eq!(result.levels, levels(&[0, 2, 2, 2, 2]));
    }

    #[test]
    fn separator_length_extends_boundary_for_crlf() {
        let types = [L, B, L, L];
        let request = ParagraphRequest::new(0, types.len(), Level::new(0));
        let result =
            ParagraphResolver::resolve(&types, &request, |_| 2, &mut NullIsolatingRunSink);
        assert_eq!(result.actual_length, 3);
    }

    #[test]
    fn fsi_with_no_strong_character_defaults_to_ltr() {
        // FSI ON PDI, at an odd containing level: with no strong character inside, FSI should
        // behave like LRI (default LTR) rather than inheriting the paragraph's own direction.
        let result = resolve(&[Fsi, On, Pdi], Level::new(1));
        // The isolate initiator/terminator sit at the containing level (1); the inner ON, with
        // no strong character found, resolves as though opened by LRI: least-greater-even(1) = 2.
        assert_eq!(result.levels, levels(&[1, 2, 1]));
    }
}
