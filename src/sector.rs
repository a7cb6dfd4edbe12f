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

    src/sector.rs

    The decoded sector record and the structured diagnostic events attached
    to it. Events replace ad-hoc printing: callers can surface, count or
    suppress them as they see fit, and everything is also mirrored to the
    log facade at the point of detection.
*/

use std::fmt::{Display, Formatter};

/// The MFM cell-pair violations a ByteReader can observe. None of these
/// abort a decode; the CRC check has the final word on the field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IllegalCellKind {
    /// Clock and data bit both set: two transitions one half-cell apart.
    ClockAndData,
    /// A 00 cell pair following a 0 data bit: run length too long.
    NoClockAfterZero,
    /// A 10 cell pair following a 1 data bit: spurious clock transition.
    ClockAfterOne,
}

impl Display for IllegalCellKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            IllegalCellKind::ClockAndData => write!(f, "11"),
            IllegalCellKind::NoClockAfterZero => write!(f, "00 after 0"),
            IllegalCellKind::ClockAfterOne => write!(f, "10 after 1"),
        }
    }
}

/// Which CRC field a mismatch was detected in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CrcField {
    Header,
    Data,
}

impl Display for CrcField {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            CrcField::Header => write!(f, "header"),
            CrcField::Data => write!(f, "data"),
        }
    }
}

/// One diagnostic observation made while decoding a sector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeEvent {
    /// An MFM run-length violation at the given raw sample time. Non-fatal.
    IllegalCell { time: i64, kind: IllegalCellKind },
    /// A bit-sequence search ran past its deadline. Aborts the sector.
    SyncTimeout { phase: &'static str },
    /// CRC bytes read from the stream disagree with the computed value.
    CrcMismatch { field: CrcField, read: u64, computed: u64 },
    /// The header ID byte was none of the four known cylinder-MSB codes.
    UnknownIdMark { value: u8 },
    /// The header declares the sector bad at the hardware level.
    BadSectorFlag,
}

impl Display for DecodeEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            DecodeEvent::IllegalCell { time, kind } => {
                write!(f, "MFM illegal cell: {} at sample {}", kind, time)
            }
            DecodeEvent::SyncTimeout { phase } => {
                write!(f, "could not find bit sequence within deadline in phase '{}'", phase)
            }
            DecodeEvent::CrcMismatch { field, read, computed } => {
                write!(f, "{} CRC mismatch: read {:08X}, computed {:08X}", field, read, computed)
            }
            DecodeEvent::UnknownIdMark { value } => {
                write!(f, "unknown header ID mark: {:02X}", value)
            }
            DecodeEvent::BadSectorFlag => write!(f, "sector flagged bad by header"),
        }
    }
}

/// One decoded sector. Built incrementally by a `SectorDecoder`; the CRC
/// and bad flags are only meaningful once the decoder has reported the
/// sector complete.
#[derive(Clone, Debug, Default)]
pub struct Sector {
    pub cylinder: u16,
    pub head: u8,
    pub sector: u8,
    /// Declared-size code from header bits 5-6, normalized to 0..=3.
    pub size_code: u8,
    /// Hardware bad-sector flag from header bit 7.
    pub bad: bool,
    pub data: Vec<u8>,
    pub head_crc_ok: bool,
    pub data_crc_ok: bool,
    pub events: Vec<DecodeEvent>,
}

impl Sector {
    /// A sector is valid when both CRCs checked out and the header did not
    /// declare it bad. Invalid sectors are still retained with their data.
    pub fn is_valid(&self) -> bool {
        self.head_crc_ok && self.data_crc_ok && !self.bad
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Display for Sector {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Sector: {:3}/{}/{:2} - CRC header/data: {}/{}, sector status: {}",
            self.cylinder,
            self.head,
            self.sector,
            if self.head_crc_ok { "OK" } else { "FAILED" },
            if self.data_crc_ok { "OK" } else { "FAILED" },
            if self.bad { "BAD" } else { "OK" }
        )
    }
}
