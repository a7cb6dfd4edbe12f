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

    src/decoder.rs

    The sector decoder: a fixed pipeline of phases built from a
    SectorFormat, driven one cell at a time. Phase products are merged
    into the in-progress Sector record here, according to each pipeline
    slot's field role, so no phase ever mutates shared state on its own.
*/

use crate::{
    clock::Cell,
    crc::CrcEngine,
    formats::{sync_cells, DataCrcKind, SectorFormat, A1_CELLS, ADDRESS_MARK},
    phase::{BitSeqFinder, ByteReader, Looper, Phase, PhaseOutput, PhaseResult, Skipper},
    sector::{CrcField, DecodeEvent, Sector},
    TrackRakeError,
};

/// Which sector field a pipeline slot's product feeds, if any.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum StepRole {
    None,
    HeadMark,
    HeadFields,
    HeadCrc,
    DataMark,
    DataMarker,
    DataBytes,
    DataCrc,
}

struct PipelineStep {
    phase: Phase,
    role: StepRole,
}

impl PipelineStep {
    fn new(phase: Phase, role: StepRole) -> PipelineStep {
        PipelineStep { phase, role }
    }
}

/// Decoder-level result of feeding one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SectorStatus {
    /// Mid-sector; feed more cells.
    Cooking,
    /// A full sector was decoded; take it with [`SectorDecoder::into_sector`].
    Done,
    /// A phase missed its deadline; the sector attempt is abandoned.
    Failed,
}

/// Drives one sector attempt. Use a fresh instance per attempt; nothing
/// carries over across a Done or Failed boundary.
pub struct SectorDecoder {
    steps: Vec<PipelineStep>,
    phase_index: usize,
    last_bit: bool,
    sector: Sector,
    head_crc_buf: Vec<u8>,
    data_crc_buf: Vec<u8>,
    crc16: CrcEngine,
    crc32: CrcEngine,
    data_crc: DataCrcKind,
}

impl SectorDecoder {
    pub fn new(format: &SectorFormat) -> Result<SectorDecoder, TrackRakeError> {
        if format.sector_size == 0 {
            log::error!("SectorDecoder::new(): format '{}' has zero sector size", format.name);
            return Err(TrackRakeError::ParameterError);
        }

        let steps = vec![
            PipelineStep::new(
                Phase::Finder(BitSeqFinder::new("head sync", sync_cells(), format.head_sync_deadline)),
                StepRole::None,
            ),
            PipelineStep::new(
                Phase::Finder(BitSeqFinder::new("head mark", A1_CELLS.to_vec(), format.head_mark_deadline)),
                StepRole::HeadMark,
            ),
            PipelineStep::new(Phase::Reader(ByteReader::new("head fields", 4)), StepRole::HeadFields),
            PipelineStep::new(Phase::Reader(ByteReader::new("head crc", 2)), StepRole::HeadCrc),
            PipelineStep::new(Phase::Skipper(Skipper::new("head gap", format.head_gap)), StepRole::None),
            PipelineStep::new(
                Phase::Finder(BitSeqFinder::new("data sync", sync_cells(), format.data_sync_deadline)),
                StepRole::None,
            ),
            PipelineStep::new(
                Phase::Finder(BitSeqFinder::new("data mark", A1_CELLS.to_vec(), format.data_mark_deadline)),
                StepRole::DataMark,
            ),
            PipelineStep::new(Phase::Reader(ByteReader::new("data marker", 1)), StepRole::DataMarker),
            PipelineStep::new(
                Phase::Reader(ByteReader::new("data", format.sector_size)),
                StepRole::DataBytes,
            ),
            PipelineStep::new(
                Phase::Reader(ByteReader::new("data crc", format.data_crc.len())),
                StepRole::DataCrc,
            ),
            PipelineStep::new(
                Phase::Skipper(Skipper::new("trailing gap", format.trailing_gap)),
                StepRole::None,
            ),
            PipelineStep::new(Phase::Looper(Looper), StepRole::None),
        ];

        Ok(SectorDecoder {
            steps,
            phase_index: 0,
            last_bit: false,
            sector: Sector::default(),
            head_crc_buf: Vec::with_capacity(8),
            data_crc_buf: Vec::with_capacity(format.sector_size + 8),
            crc16: CrcEngine::crc16(),
            crc32: CrcEngine::crc32(),
            data_crc: format.data_crc,
        })
    }

    /// Feed one recovered cell through the current phase.
    pub fn feed(&mut self, cell: Cell) -> SectorStatus {
        let step = &mut self.steps[self.phase_index];
        let role = step.role;

        match step.phase.feed(cell, &mut self.sector.events) {
            PhaseResult::Cooking => SectorStatus::Cooking,
            PhaseResult::Done(output) => {
                self.complete_step(role, output);
                self.phase_index += 1;
                self.steps[self.phase_index].phase.reset_with_last_bit(self.last_bit);
                SectorStatus::Cooking
            }
            PhaseResult::Failed => {
                log::warn!("SectorDecoder: failed in phase '{}'", self.steps[self.phase_index].phase.name());
                self.phase_index = 0;
                SectorStatus::Failed
            }
            PhaseResult::LoopEnd => SectorStatus::Done,
        }
    }

    /// Consume the decoder and take the sector it populated. Meaningful
    /// only after `feed` returned [`SectorStatus::Done`].
    pub fn into_sector(self) -> Sector {
        self.sector
    }

    fn complete_step(&mut self, role: StepRole, output: PhaseOutput) {
        let bytes = match output {
            PhaseOutput::Bytes(bytes) => bytes,
            PhaseOutput::None => Vec::new(),
        };

        match role {
            StepRole::None => {}
            StepRole::HeadMark => {
                self.head_crc_buf.clear();
                self.head_crc_buf.push(ADDRESS_MARK);
                // The A1 mark byte ends in a 1 data bit.
                self.last_bit = true;
            }
            StepRole::HeadFields => {
                self.head_crc_buf.extend_from_slice(&bytes);
                self.update_last_bit(&bytes);
                self.parse_header(&bytes);
            }
            StepRole::HeadCrc => {
                let read = be_value(&bytes);
                let computed = self.crc16.checksum(&self.head_crc_buf);
                if read == computed {
                    self.sector.head_crc_ok = true;
                }
                else {
                    log::warn!("SectorDecoder: header CRC mismatch: read {:04X} computed {:04X}", read, computed);
                    self.sector.events.push(DecodeEvent::CrcMismatch {
                        field: CrcField::Header,
                        read,
                        computed,
                    });
                }
            }
            StepRole::DataMark => {
                self.data_crc_buf.clear();
                self.data_crc_buf.push(ADDRESS_MARK);
                self.last_bit = true;
            }
            StepRole::DataMarker => {
                self.data_crc_buf.extend_from_slice(&bytes);
                self.update_last_bit(&bytes);
            }
            StepRole::DataBytes => {
                self.data_crc_buf.extend_from_slice(&bytes);
                self.update_last_bit(&bytes);
                self.sector.data = bytes;
            }
            StepRole::DataCrc => {
                let read = be_value(&bytes);
                let computed = match self.data_crc {
                    DataCrcKind::Crc16 => self.crc16.checksum(&self.data_crc_buf),
                    DataCrcKind::Crc32 => self.crc32.checksum(&self.data_crc_buf),
                };
                if read == computed {
                    self.sector.data_crc_ok = true;
                }
                else {
                    log::warn!("SectorDecoder: data CRC mismatch: read {:08X} computed {:08X}", read, computed);
                    self.sector.events.push(DecodeEvent::CrcMismatch {
                        field: CrcField::Data,
                        read,
                        computed,
                    });
                }
            }
        }
    }

    fn update_last_bit(&mut self, bytes: &[u8]) {
        if let Some(last) = bytes.last() {
            self.last_bit = last & 1 != 0;
        }
    }

    /// Header field layout: ID mark encoding the cylinder MSBs, cylinder
    /// LSB byte, a packed head/size/bad byte, and the sector number.
    fn parse_header(&mut self, bytes: &[u8]) {
        let base = match bytes[0] {
            0xFE => 0,
            0xFF => 256,
            0xFC => 512,
            0xFD => 768,
            other => {
                // Keep going with the low byte alone; the header CRC will
                // judge whether the field was trustworthy at all.
                log::warn!("SectorDecoder: unknown header ID mark: {:02X}", other);
                self.sector.events.push(DecodeEvent::UnknownIdMark { value: other });
                0
            }
        };

        self.sector.cylinder = base + bytes[1] as u16;
        self.sector.head = bytes[2] & 0b0000_0111;
        self.sector.size_code = (bytes[2] >> 5) & 0b0000_0011;
        self.sector.sector = bytes[3];

        if bytes[2] & 0b1000_0000 != 0 {
            self.sector.bad = true;
            log::warn!(
                "SectorDecoder: sector {}/{}/{} flagged bad by header",
                self.sector.cylinder,
                self.sector.head,
                self.sector.sector
            );
            self.sector.events.push(DecodeEvent::BadSectorFlag);
        }

        log::trace!(
            "SectorDecoder: header: cyl {} head {} sector {} size code {}",
            self.sector.cylinder,
            self.sector.head,
            self.sector.sector,
            self.sector.size_code
        );
    }
}

/// Big-endian integer value of a CRC field as read from the stream.
fn be_value(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}
