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

    tests/common/mod.rs

    Common support routines for tests: a small MFM encoder producing
    well-formed synthetic sectors, and a renderer turning cell sequences
    into raw sample streams for end-to-end clock recovery runs.
*/
#![allow(dead_code)]

use bit_vec::BitVec;
use trackrake::{
    crc::CrcEngine,
    formats::{ADDRESS_MARK, A1_CELLS},
    Cell, DataCrcKind, SectorFormat,
};

pub const DATA_MARKER: u8 = 0xFB;
pub const GAP_BYTE: u8 = 0x4E;
pub const SYNC_BYTES: usize = 12;

/// Test clock parameters for rendered captures.
pub const TEST_PERIOD: usize = 8;
pub const TEST_MARGIN: usize = 2;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Encodes bytes into MFM cell pairs, tracking the previous data bit so
/// clock bits follow the run-length rule across field boundaries.
pub struct MfmEncoder {
    prev: bool,
    cells: Vec<bool>,
}

impl MfmEncoder {
    pub fn new() -> MfmEncoder {
        MfmEncoder {
            prev: false,
            cells: Vec::new(),
        }
    }

    pub fn push_byte(&mut self, byte: u8) {
        for bit in (0..8).rev() {
            let d = (byte >> bit) & 1 != 0;
            self.cells.push(!self.prev && !d);
            self.cells.push(d);
            self.prev = d;
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.push_byte(*byte);
        }
    }

    /// A sync field: MFM-encoded zero bytes.
    pub fn push_sync(&mut self, bytes: usize) {
        for _ in 0..bytes {
            self.push_byte(0x00);
        }
    }

    /// Inter-field filler that must not look like sync.
    pub fn push_gap(&mut self, bytes: usize) {
        for _ in 0..bytes {
            self.push_byte(GAP_BYTE);
        }
    }

    /// The A1 address mark with its deliberately missing clock transition.
    pub fn push_mark(&mut self) {
        self.cells.extend_from_slice(&A1_CELLS);
        // 0xA1 ends in a 1 data bit.
        self.prev = true;
    }

    pub fn into_cells(self) -> Vec<bool> {
        self.cells
    }
}

/// A sector to synthesize. `head_crc`/`data_crc` override the correct CRC
/// bytes on the wire when set, for corruption tests.
pub struct SectorSpec {
    pub header: [u8; 4],
    pub payload: Vec<u8>,
    pub head_crc: Option<[u8; 2]>,
    pub data_crc: Option<Vec<u8>>,
}

impl SectorSpec {
    pub fn new(cylinder: u16, head: u8, sector: u8, payload: Vec<u8>) -> SectorSpec {
        SectorSpec {
            header: header_bytes(cylinder, head, sector, false),
            payload,
            head_crc: None,
            data_crc: None,
        }
    }
}

/// Build the four header bytes: ID mark encoding the cylinder MSBs, then
/// cylinder LSB, packed head byte (size code 1 for 512-byte sectors) and
/// sector number.
pub fn header_bytes(cylinder: u16, head: u8, sector: u8, bad: bool) -> [u8; 4] {
    let id_mark = match cylinder / 256 {
        0 => 0xFE,
        1 => 0xFF,
        2 => 0xFC,
        _ => 0xFD,
    };
    let mut packed = (head & 0x07) | 0x20;
    if bad {
        packed |= 0x80;
    }
    [id_mark, (cylinder & 0xFF) as u8, packed, sector]
}

pub fn head_crc_bytes(header: &[u8; 4]) -> [u8; 2] {
    let mut buf = vec![ADDRESS_MARK];
    buf.extend_from_slice(header);
    (CrcEngine::crc16().checksum(&buf) as u16).to_be_bytes()
}

pub fn data_crc_bytes(payload: &[u8], kind: DataCrcKind) -> Vec<u8> {
    let mut buf = vec![ADDRESS_MARK, DATA_MARKER];
    buf.extend_from_slice(payload);
    match kind {
        DataCrcKind::Crc16 => (CrcEngine::crc16().checksum(&buf) as u16).to_be_bytes().to_vec(),
        DataCrcKind::Crc32 => (CrcEngine::crc32().checksum(&buf) as u32).to_be_bytes().to_vec(),
    }
}

/// Append one complete sector to the encoder: sync, header with CRC, gap,
/// sync, marker, payload with CRC, trailing gap.
pub fn encode_sector(enc: &mut MfmEncoder, spec: &SectorSpec, fmt: &SectorFormat) {
    enc.push_sync(SYNC_BYTES);
    enc.push_mark();
    enc.push_bytes(&spec.header);
    let head_crc = spec.head_crc.unwrap_or_else(|| head_crc_bytes(&spec.header));
    enc.push_bytes(&head_crc);

    enc.push_gap(4);
    enc.push_sync(SYNC_BYTES);
    enc.push_mark();
    enc.push_byte(DATA_MARKER);
    enc.push_bytes(&spec.payload);
    let data_crc = spec
        .data_crc
        .clone()
        .unwrap_or_else(|| data_crc_bytes(&spec.payload, fmt.data_crc));
    enc.push_bytes(&data_crc);

    // Comfortably longer than the trailing-gap skip so the loop phase and
    // the next sync search have cells to work with.
    enc.push_gap(20);
}

/// Cell sequence for a whole track, with a short leading gap.
pub fn track_cells(specs: &[SectorSpec], fmt: &SectorFormat) -> Vec<bool> {
    let mut enc = MfmEncoder::new();
    enc.push_gap(1);
    for spec in specs {
        encode_sector(&mut enc, spec, fmt);
    }
    enc.into_cells()
}

/// Wrap raw cell values in timestamped cells, bypassing clock recovery.
pub fn as_cells(values: &[bool]) -> Vec<Cell> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Cell {
            time: i as i64,
            bit: *v,
        })
        .collect()
}

/// Render a cell sequence as a raw sample stream: a cell carrying a flux
/// transition becomes a rising edge at its window start, an empty cell a
/// windowful of zeros.
pub fn render_samples(cells: &[bool], period: usize) -> BitVec {
    let mut samples = BitVec::with_capacity(cells.len() * period);
    for cell in cells {
        samples.push(*cell);
        for _ in 1..period {
            samples.push(false);
        }
    }
    samples
}

/// A 512-byte payload varying by sector number.
pub fn test_payload(sector: u8) -> Vec<u8> {
    (0..512).map(|i| (i as u8).wrapping_mul(7).wrapping_add(sector)).collect()
}
