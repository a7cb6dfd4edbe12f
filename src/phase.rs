/*
    trackrake
    https://github.com/trackrake/trackrake

    Copyright 2026 trackrake contributors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/phase.rs

    The four composable decode phases a sector layout is built from. Each
    is a small state machine fed one recovered cell at a time:

      - Looper: terminal sentinel, always reports LoopEnd.
      - Skipper: discards a fixed number of cells (gaps).
      - BitSeqFinder: sliding-window search for an exact cell pattern
        (sync fields and address marks), with a deadline.
      - ByteReader: MFM-decodes a fixed number of bytes, discarding clock
        cells after checking them for run-length violations.

    Completed phases hand their product back as an explicit value rather
    than mutating shared state through callbacks.
*/

use std::collections::VecDeque;

use crate::{
    clock::Cell,
    sector::{DecodeEvent, IllegalCellKind},
};

/// What a completed phase produced. Finders and skippers yield `None`;
/// readers yield the assembled bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhaseOutput {
    None,
    Bytes(Vec<u8>),
}

/// Result of feeding one cell to a phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhaseResult {
    /// The phase needs more cells.
    Cooking,
    /// The phase completed; advance the pipeline.
    Done(PhaseOutput),
    /// The phase could not complete within its deadline; abort the sector.
    Failed,
    /// The sentinel phase was reached; the sector is complete.
    LoopEnd,
}

/// Terminal sentinel closing every layout.
#[derive(Clone, Debug, Default)]
pub struct Looper;

impl Looper {
    fn feed(&mut self, _cell: Cell) -> PhaseResult {
        PhaseResult::LoopEnd
    }
}

/// Discards `count` cells, then reports Done. The counter resets itself
/// so the instance can be reused on the next pipeline pass.
#[derive(Clone, Debug)]
pub struct Skipper {
    name: &'static str,
    count: usize,
    counter: usize,
}

impl Skipper {
    pub fn new(name: &'static str, count: usize) -> Skipper {
        Skipper { name, count, counter: 0 }
    }

    fn feed(&mut self, _cell: Cell) -> PhaseResult {
        self.counter += 1;
        if self.counter >= self.count {
            log::trace!("Skipper '{}': skipped {} cells", self.name, self.counter);
            self.counter = 0;
            PhaseResult::Done(PhaseOutput::None)
        }
        else {
            PhaseResult::Cooking
        }
    }
}

/// Sliding-window search for an exact cell-value sequence. Fails once
/// more than `deadline + target.len()` cells have been consumed without
/// a match.
#[derive(Clone, Debug)]
pub struct BitSeqFinder {
    name: &'static str,
    target: Vec<bool>,
    deadline: usize,
    window: VecDeque<bool>,
    ticks: usize,
}

impl BitSeqFinder {
    pub fn new(name: &'static str, target: Vec<bool>, deadline: usize) -> BitSeqFinder {
        let window = VecDeque::with_capacity(target.len() + 1);
        BitSeqFinder {
            name,
            target,
            deadline,
            window,
            ticks: 0,
        }
    }

    fn feed(&mut self, cell: Cell, events: &mut Vec<DecodeEvent>) -> PhaseResult {
        self.window.push_back(cell.bit);

        if self.ticks > self.deadline + self.target.len() {
            self.window.clear();
            self.ticks = 0;
            log::warn!(
                "BitSeqFinder '{}': no match within deadline at sample {}",
                self.name,
                cell.time
            );
            events.push(DecodeEvent::SyncTimeout { phase: self.name });
            return PhaseResult::Failed;
        }

        if self.window.len() == self.target.len() {
            if self.window.iter().eq(self.target.iter()) {
                log::trace!("BitSeqFinder '{}': matched at sample {}", self.name, cell.time);
                self.window.clear();
                self.ticks = 0;
                return PhaseResult::Done(PhaseOutput::None);
            }
            self.window.pop_front();
        }

        self.ticks += 1;
        PhaseResult::Cooking
    }
}

/// MFM byte assembly. Cells alternate clock and data; odd cells are clock
/// bits, checked for run-length violations and discarded, and even cells
/// are data bits shifted in MSB-first. Completes after `byte_count` bytes.
#[derive(Clone, Debug)]
pub struct ByteReader {
    name: &'static str,
    byte_count: usize,
    bytes: Vec<u8>,
    current: u8,
    bit_pos: u8,
    expect_clock: bool,
    clock: bool,
    last_bit: Option<bool>,
}

impl ByteReader {
    pub fn new(name: &'static str, byte_count: usize) -> ByteReader {
        ByteReader {
            name,
            byte_count,
            bytes: Vec::with_capacity(byte_count),
            current: 0,
            bit_pos: 7,
            expect_clock: true,
            clock: false,
            last_bit: None,
        }
    }

    /// Seed the run-length context with the final data bit of the previous
    /// phase, so violations spanning a phase boundary are still caught.
    fn set_last_bit(&mut self, bit: bool) {
        self.last_bit = Some(bit);
    }

    fn feed(&mut self, cell: Cell, events: &mut Vec<DecodeEvent>) -> PhaseResult {
        if self.expect_clock {
            self.clock = cell.bit;
            self.expect_clock = false;
            return PhaseResult::Cooking;
        }
        self.expect_clock = true;

        if let Some(kind) = self.check_cell(cell.bit) {
            log::warn!("ByteReader '{}': MFM illegal cell: {} at sample {}", self.name, kind, cell.time);
            events.push(DecodeEvent::IllegalCell { time: cell.time, kind });
        }

        self.current |= (cell.bit as u8) << self.bit_pos;
        self.last_bit = Some(cell.bit);

        if self.bit_pos > 0 {
            self.bit_pos -= 1;
            return PhaseResult::Cooking;
        }

        self.bytes.push(self.current);
        self.current = 0;
        self.bit_pos = 7;

        if self.bytes.len() == self.byte_count {
            let out = std::mem::take(&mut self.bytes);
            log::trace!("ByteReader '{}': read {} bytes", self.name, out.len());
            PhaseResult::Done(PhaseOutput::Bytes(out))
        }
        else {
            PhaseResult::Cooking
        }
    }

    fn check_cell(&self, data: bool) -> Option<IllegalCellKind> {
        if data && self.clock {
            Some(IllegalCellKind::ClockAndData)
        }
        else if !data && !self.clock && self.last_bit == Some(false) {
            Some(IllegalCellKind::NoClockAfterZero)
        }
        else if !data && self.clock && self.last_bit == Some(true) {
            Some(IllegalCellKind::ClockAfterOne)
        }
        else {
            None
        }
    }
}

/// A layout pipeline slot. Dispatches to the concrete phase kind.
#[derive(Clone, Debug)]
pub enum Phase {
    Looper(Looper),
    Skipper(Skipper),
    Finder(BitSeqFinder),
    Reader(ByteReader),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Looper(_) => "loop end",
            Phase::Skipper(s) => s.name,
            Phase::Finder(f) => f.name,
            Phase::Reader(r) => r.name,
        }
    }

    pub fn feed(&mut self, cell: Cell, events: &mut Vec<DecodeEvent>) -> PhaseResult {
        match self {
            Phase::Looper(p) => p.feed(cell),
            Phase::Skipper(p) => p.feed(cell),
            Phase::Finder(p) => p.feed(cell, events),
            Phase::Reader(p) => p.feed(cell, events),
        }
    }

    /// Called when the pipeline advances into this phase, carrying the
    /// final data bit of the preceding phase.
    pub fn reset_with_last_bit(&mut self, bit: bool) {
        if let Phase::Reader(r) = self {
            r.set_last_bit(bit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(i: usize, bit: bool) -> Cell {
        Cell { time: i as i64, bit }
    }

    fn feed_all(phase: &mut Phase, cells: &[bool]) -> Vec<PhaseResult> {
        let mut events = Vec::new();
        cells
            .iter()
            .enumerate()
            .map(|(i, b)| phase.feed(cell(i, *b), &mut events))
            .collect()
    }

    #[test]
    fn looper_always_ends_the_loop() {
        let mut looper = Phase::Looper(Looper);
        let mut events = Vec::new();
        assert_eq!(looper.feed(cell(0, true), &mut events), PhaseResult::LoopEnd);
        assert_eq!(looper.feed(cell(1, false), &mut events), PhaseResult::LoopEnd);
    }

    #[test]
    fn skipper_counts_and_self_resets() {
        let mut skipper = Phase::Skipper(Skipper::new("gap", 3));
        let results = feed_all(&mut skipper, &[true, false, true]);
        assert_eq!(
            results,
            vec![
                PhaseResult::Cooking,
                PhaseResult::Cooking,
                PhaseResult::Done(PhaseOutput::None)
            ]
        );
        // Reusable immediately after Done.
        let results = feed_all(&mut skipper, &[false, false, false]);
        assert_eq!(results[2], PhaseResult::Done(PhaseOutput::None));
    }

    #[test]
    fn finder_matches_exact_sequence() {
        let target = vec![true, false, true, true];
        let mut finder = Phase::Finder(BitSeqFinder::new("mark", target, 100));
        // Two cells of slack, then the pattern.
        let results = feed_all(&mut finder, &[false, false, true, false, true, true]);
        assert_eq!(results[4], PhaseResult::Cooking);
        assert_eq!(results[5], PhaseResult::Done(PhaseOutput::None));
    }

    #[test]
    fn finder_fails_one_past_deadline() {
        let deadline = 10;
        let target = vec![true; 4];
        let mut finder = Phase::Finder(BitSeqFinder::new("sync", target, deadline));
        let mut events = Vec::new();

        // deadline + target length cells of mismatch are tolerated, plus
        // one more while the counter catches up; the next cell fails.
        for i in 0..deadline + 4 + 1 {
            assert_eq!(finder.feed(cell(i, false), &mut events), PhaseResult::Cooking, "cell {}", i);
        }
        assert_eq!(finder.feed(cell(15, false), &mut events), PhaseResult::Failed);
        assert_eq!(events, vec![DecodeEvent::SyncTimeout { phase: "sync" }]);
    }

    #[test]
    fn finder_succeeds_exactly_at_deadline_boundary() {
        let deadline = 10;
        let target = vec![true; 4];
        let mut finder = Phase::Finder(BitSeqFinder::new("sync", target, deadline));
        let mut events = Vec::new();

        // Mismatches right up to the edge, then a match completing on the
        // last permitted cell.
        for i in 0..deadline + 1 {
            assert_eq!(finder.feed(cell(i, false), &mut events), PhaseResult::Cooking);
        }
        for i in 0..3 {
            assert_eq!(finder.feed(cell(11 + i, true), &mut events), PhaseResult::Cooking);
        }
        assert_eq!(finder.feed(cell(14, true), &mut events), PhaseResult::Done(PhaseOutput::None));
        assert!(events.is_empty());
    }

    #[test]
    fn finder_failure_clears_state_for_reuse() {
        let target = vec![true, true];
        let mut finder = Phase::Finder(BitSeqFinder::new("sync", target, 1));
        let mut events = Vec::new();

        let mut result = PhaseResult::Cooking;
        for i in 0..10 {
            result = finder.feed(cell(i, false), &mut events);
            if result == PhaseResult::Failed {
                break;
            }
        }
        assert_eq!(result, PhaseResult::Failed);

        // After failure the window is empty; an immediate match works.
        assert_eq!(finder.feed(cell(20, true), &mut events), PhaseResult::Cooking);
        assert_eq!(finder.feed(cell(21, true), &mut events), PhaseResult::Done(PhaseOutput::None));
    }

    // Interleave data bits with legal MFM clock bits.
    fn mfm_cells(bytes: &[u8], mut prev: bool) -> Vec<bool> {
        let mut cells = Vec::new();
        for byte in bytes {
            for bit in (0..8).rev() {
                let d = (byte >> bit) & 1 != 0;
                cells.push(!prev && !d);
                cells.push(d);
                prev = d;
            }
        }
        cells
    }

    #[test]
    fn reader_assembles_bytes_msb_first() {
        let mut reader = Phase::Reader(ByteReader::new("data", 2));
        let mut events = Vec::new();
        let cells = mfm_cells(&[0xA5, 0x3C], false);

        let mut done = None;
        for (i, bit) in cells.iter().enumerate() {
            match reader.feed(cell(i, *bit), &mut events) {
                PhaseResult::Cooking => {}
                PhaseResult::Done(out) => done = Some((i, out)),
                other => panic!("unexpected result {:?}", other),
            }
        }
        assert_eq!(done, Some((31, PhaseOutput::Bytes(vec![0xA5, 0x3C]))));
        assert!(events.is_empty());
    }

    #[test]
    fn reader_reports_illegal_cells_without_failing() {
        let mut reader = Phase::Reader(ByteReader::new("data", 1));
        reader.reset_with_last_bit(false);
        let mut events = Vec::new();

        // Clock 1, data 1: two transitions one half-cell apart.
        assert_eq!(reader.feed(cell(0, true), &mut events), PhaseResult::Cooking);
        assert_eq!(reader.feed(cell(1, true), &mut events), PhaseResult::Cooking);
        assert_eq!(
            events,
            vec![DecodeEvent::IllegalCell {
                time: 1,
                kind: IllegalCellKind::ClockAndData,
            }]
        );

        // A 00 pair after the 1 data bit above is legal and leaves the run
        // context at 0.
        assert_eq!(reader.feed(cell(2, false), &mut events), PhaseResult::Cooking);
        assert_eq!(reader.feed(cell(3, false), &mut events), PhaseResult::Cooking);
        assert_eq!(events.len(), 1);

        // A second 00 pair now follows a 0 data bit: run too long.
        assert_eq!(reader.feed(cell(4, false), &mut events), PhaseResult::Cooking);
        assert_eq!(reader.feed(cell(5, false), &mut events), PhaseResult::Cooking);
        assert!(events.contains(&DecodeEvent::IllegalCell {
            time: 5,
            kind: IllegalCellKind::NoClockAfterZero,
        }));
    }

    #[test]
    fn reader_seeds_run_length_context_across_phases() {
        let mut reader = Phase::Reader(ByteReader::new("data", 1));
        // Previous phase ended on a 1 data bit; a 10 pair is now illegal.
        reader.reset_with_last_bit(true);
        let mut events = Vec::new();

        reader.feed(cell(0, true), &mut events);
        reader.feed(cell(1, false), &mut events);
        assert_eq!(
            events,
            vec![DecodeEvent::IllegalCell {
                time: 1,
                kind: IllegalCellKind::ClockAfterOne,
            }]
        );
    }
}
