// Copyright 2021 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The run queue: accumulates level runs until they form a complete isolating-run group.

#[cfg(not(feature = "std"))]
use alloc::collections::VecDeque;
#[cfg(feature = "std")]
use std::collections::VecDeque;

use crate::run::LevelRun;

/// A FIFO of [`LevelRun`]s that tracks, as runs are enqueued, whether the accumulated runs form a
/// complete isolating-run group: either a single run that neither opens nor closes an isolate, or
/// an isolate initiator together with every run up to and including its matching
/// PDI-terminated run (isolates may nest, so this may span several runs).
///
/// Matching is by depth rather than identity: nested isolates close in LIFO order, so a single
/// "how many isolates are currently open" counter is enough to know when the group is complete —
/// the crate never needs to know *which* initiator a given terminator closes, only that the
/// count has returned to zero.
#[derive(Debug, Default)]
pub struct RunQueue {
    runs: VecDeque<LevelRun>,
    open_isolates: usize,
    should_dequeue: bool,
}

impl RunQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            runs: VecDeque::new(),
            open_isolates: 0,
            should_dequeue: false,
        }
    }

    /// Appends `run`, updating the open-isolate depth and [`RunQueue::should_dequeue`].
    pub fn enqueue(&mut self, run: LevelRun) {
        if run.kind().is_initiator() {
            self.open_isolates += 1;
        }
        if run.kind().is_terminator() && self.open_isolates > 0 {
            self.open_isolates -= 1;
        }
        self.runs.push_back(run);
        self.should_dequeue = self.open_isolates == 0;
    }

    /// Drops the head run.
    pub fn dequeue(&mut self) {
        self.runs.pop_front();
    }

    /// The current head run, if any.
    pub fn peek(&self) -> Option<&LevelRun> {
        self.runs.front()
    }

    /// Whether the queue currently holds a complete isolating-run group.
    pub fn should_dequeue(&self) -> bool {
        self.should_dequeue
    }

    /// The number of runs currently queued.
    pub fn count(&self) -> usize {
        self.runs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::BidiChain;
    use crate::types::BidiClass::*;

    fn run(ty_first: crate::types::BidiClass, ty_last: crate::types::BidiClass) -> LevelRun {
        let mut chain = BidiChain::new(4);
        let first = chain.add(ty_first, 1);
        let last = if ty_first == ty_last {
            first
        } else {
            chain.add(ty_last, 1)
        };
        LevelRun::new(&chain, first, last, L, L)
    }

    #[test]
    fn simple_run_completes_immediately() {
        let mut queue = RunQueue::new();
        queue.enqueue(run(L, L));
        assert!(queue.should_dequeue());
        assert_eq!(queue.count(), 1);
    }

    #[test]
    fn initiator_waits_for_matching_terminator() {
        let mut queue = RunQueue::new();
        queue.enqueue(run(Lri, R));
        assert!(!queue.should_dequeue());
        queue.enqueue(run(R, Pdi));
        assert!(queue.should_dequeue());
        assert_eq!(queue.count(), 2);
    }

    #[test]
    fn nested_isolates_complete_only_once_fully_closed() {
        let mut queue = RunQueue::new();
        queue.enqueue(run(Lri, R)); // opens outer
        queue.enqueue(run(Lri, R)); // opens inner
        assert!(!queue.should_dequeue());
        queue.enqueue(run(R, Pdi)); // closes inner
        assert!(!queue.should_dequeue(), "outer isolate still open");
        queue.enqueue(run(R, Pdi)); // closes outer
        assert!(queue.should_dequeue());
    }

    #[test]
    fn dequeue_drops_head() {
        let mut queue = RunQueue::new();
        queue.enqueue(run(L, L));
        queue.enqueue(run(R, R));
        queue.dequeue();
        assert_eq!(queue.count(), 1);
        assert_eq!(queue.peek().unwrap().sor(), L);
    }
}
