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

    src/clock.rs

    Digital clock recovery for raw flux captures. A free-running clock
    latches one cell per bit window; every rising edge in the sample stream
    resynchronizes the clock phase, and windows without a transition are
    latched at the predicted tick time instead. This is the standard trick
    for MFM, where a large fraction of bit cells carry no flux transition
    at all.
*/

use crate::TrackRakeError;
use bit_vec::BitVec;

/// One recovered bit cell. `time` is the raw sample index the cell was
/// latched at (plus any configured offset); `bit` is the recovered cell
/// value. Whether a cell is a clock or a data bit is not distinguished
/// here; consumers track the parity themselves.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub time: i64,
    pub bit:  bool,
}

/// Clock recovery configuration. `period` is the expected number of raw
/// samples per bit cell, `margin` the jitter allowed past the predicted
/// tick before the clock free-runs, and `offset` a constant correction
/// applied to emitted timestamps.
#[derive(Copy, Clone, Debug)]
pub struct ClockRecovery {
    period: i64,
    margin: i64,
    offset: i64,
}

impl ClockRecovery {
    pub fn new(period: usize, margin: usize, offset: i64) -> Result<ClockRecovery, TrackRakeError> {
        if period == 0 || margin >= period {
            log::error!("ClockRecovery::new(): bad parameters, period: {} margin: {}", period, margin);
            return Err(TrackRakeError::ParameterError);
        }
        log::debug!(
            "ClockRecovery::new(): period: {} samples, margin: {}, offset: {}",
            period,
            margin,
            offset
        );
        Ok(ClockRecovery {
            period: period as i64,
            margin: margin as i64,
            offset,
        })
    }

    /// Return a lazy cell iterator over a borrowed sample stream. Two runs
    /// over the same samples with the same configuration produce identical
    /// sequences.
    pub fn cells<'a>(&self, samples: &'a BitVec) -> CellIter<'a> {
        CellIter {
            samples: samples.iter(),
            t: 0,
            next_clock: 0,
            prev: true,
            period: self.period,
            margin: self.margin,
            offset: self.offset,
        }
    }

    /// Convenience wrapper collecting the full cell sequence.
    pub fn run(&self, samples: &BitVec) -> Vec<Cell> {
        let cells: Vec<Cell> = self.cells(samples).collect();
        log::debug!(
            "ClockRecovery::run(): {} samples -> {} cells, estimated period {:.4}",
            samples.len(),
            cells.len(),
            ClockRecovery::period_estimate(samples.len(), cells.len())
        );
        cells
    }

    /// Effective samples-per-cell ratio of a finished run, surfaced in the
    /// CLI summary line as a sanity check on the configured period.
    pub fn period_estimate(samples: usize, cells: usize) -> f64 {
        if cells == 0 {
            return 0.0;
        }
        samples as f64 / cells as f64
    }
}

/// Lazy iterator produced by [`ClockRecovery::cells`]. Emission order
/// matches non-decreasing timestamp order.
pub struct CellIter<'a> {
    samples: bit_vec::Iter<'a>,
    t: i64,
    next_clock: i64,
    prev: bool,
    period: i64,
    margin: i64,
    offset: i64,
}

impl Iterator for CellIter<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        for v in self.samples.by_ref() {
            let t = self.t;
            self.t += 1;

            let rising = v && !self.prev;
            self.prev = v;

            if rising {
                // Edges are ground truth. Latch at the edge and restart the
                // clock phase from it.
                self.next_clock = t + self.period;
                return Some(Cell {
                    time: t + self.offset,
                    bit:  v,
                });
            }

            if t >= self.next_clock + self.margin {
                // No edge arrived within tolerance; latch at the predicted
                // tick time and free-run to the next window.
                let cell = Cell {
                    time: self.next_clock + self.offset,
                    bit:  v,
                };
                self.next_clock += self.period;
                return Some(cell);
            }
        }
        None
    }
}
