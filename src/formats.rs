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

    src/formats.rs

    Controller format descriptions. All three supported controllers lay a
    sector out the same way (sync, A1 mark, header, header CRC, gap, sync,
    A1 mark, marker byte, payload, data CRC, gap); they differ only in
    search deadlines, gap lengths and the width of the data CRC, so a
    format is a plain configuration struct consumed by one generic
    SectorDecoder. Deadlines, gaps and skips are in cells, written as
    bytes * bits * half-bits where they derive from field sizes.
*/

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::DEFAULT_SECTOR_SIZE;

/// The address-mark byte prepended to header and data CRC buffers.
pub const ADDRESS_MARK: u8 = 0xA1;

/// 0xA1 with a missing clock transition between bits 4 and 5. The
/// violation is what makes it findable: no legally encoded data produces
/// this cell sequence.
pub const A1_CELLS: [bool; 16] = [
    false, true, false, false, false, true, false, false, true, false, false, false, true, false, false, true,
];

/// Length of the sync pattern searched for, in bytes of encoded zeros.
pub const SYNC_BYTE_LEN: usize = 10;

/// The sync field cell pattern: MFM-encoded zero bytes, one clock
/// transition per cell pair.
pub fn sync_cells() -> Vec<bool> {
    let mut cells = Vec::with_capacity(SYNC_BYTE_LEN * 8 * 2);
    for _ in 0..SYNC_BYTE_LEN * 8 {
        cells.push(true);
        cells.push(false);
    }
    cells
}

/// Width of the CRC field protecting the data payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataCrcKind {
    Crc16,
    Crc32,
}

impl DataCrcKind {
    /// Field width in bytes as it appears on disk.
    pub fn len(&self) -> usize {
        match self {
            DataCrcKind::Crc16 => 2,
            DataCrcKind::Crc32 => 4,
        }
    }
}

/// The disk controllers whose track layouts are built in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DiskController {
    /// Western Digital WD1006V-MM1.
    Wd1006,
    /// Amepol controller built around the Intel C82062, as used in the
    /// MERA-400. The default, matching the original archiving tool.
    #[default]
    Amepol,
    /// Computex controller built around the WD2010, also MERA-400.
    Computex,
}

impl Display for DiskController {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            DiskController::Wd1006 => write!(f, "WD1006V-MM1"),
            DiskController::Amepol => write!(f, "Amepol C82062"),
            DiskController::Computex => write!(f, "Computex WD2010"),
        }
    }
}

impl FromStr for DiskController {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wd1006" | "wd" => Ok(DiskController::Wd1006),
            "amepol" | "c82062" => Ok(DiskController::Amepol),
            "computex" | "wd2010" => Ok(DiskController::Computex),
            _ => Err(format!("unknown controller format: {}", s)),
        }
    }
}

impl DiskController {
    /// The sector layout configuration for this controller.
    pub fn format(&self) -> SectorFormat {
        match self {
            DiskController::Wd1006 => SectorFormat {
                name: "WD1006V-MM1",
                sector_size: DEFAULT_SECTOR_SIZE,
                head_sync_deadline: 18 * 8 * 2,
                head_mark_deadline: 3 * 8 * 2,
                head_gap: 3 * 8 * 2,
                data_sync_deadline: 3 * 8 * 2,
                data_mark_deadline: 3 * 8 * 2,
                data_crc: DataCrcKind::Crc32,
                trailing_gap: 16 * 8 * 2,
            },
            DiskController::Amepol => SectorFormat {
                name: "Amepol C82062",
                sector_size: DEFAULT_SECTOR_SIZE,
                head_sync_deadline: 750,
                head_mark_deadline: 5 * 8 * 2,
                head_gap: 60,
                data_sync_deadline: 5 * 8 * 2,
                data_mark_deadline: 3 * 8 * 2,
                data_crc: DataCrcKind::Crc16,
                trailing_gap: 16 * 8 * 2,
            },
            DiskController::Computex => SectorFormat {
                name: "Computex WD2010",
                sector_size: DEFAULT_SECTOR_SIZE,
                head_sync_deadline: 750,
                head_mark_deadline: 5 * 8 * 2,
                head_gap: 60,
                data_sync_deadline: 5 * 8 * 2,
                data_mark_deadline: 3 * 8 * 2,
                data_crc: DataCrcKind::Crc32,
                trailing_gap: 16 * 8 * 2,
            },
        }
    }
}

/// One controller's sector layout, expressed as data. Shared read-only
/// across every sector decoded with that format; a custom format can be
/// built directly for controllers not covered by [`DiskController`].
#[derive(Clone, Debug)]
pub struct SectorFormat {
    pub name: &'static str,
    /// Payload size in bytes, typically 512.
    pub sector_size: usize,
    /// Search deadline for the header sync field, in cells.
    pub head_sync_deadline: usize,
    /// Search deadline for the header address mark, in cells.
    pub head_mark_deadline: usize,
    /// Cells skipped between header CRC and the data sync search.
    pub head_gap: usize,
    pub data_sync_deadline: usize,
    pub data_mark_deadline: usize,
    pub data_crc: DataCrcKind,
    /// Cells skipped after the data CRC before the layout loops.
    pub trailing_gap: usize,
}
