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

    src/track.rs

    Track-level orchestration: repeatedly drives fresh sector decoders
    over one recovered cell stream until the expected sector count is
    reached, the stream runs dry, or a decode attempt fails outright.
*/

use std::{collections::BTreeMap, mem};

use crate::{
    clock::Cell,
    decoder::{SectorDecoder, SectorStatus},
    formats::SectorFormat,
    sector::Sector,
    TrackRakeError,
};

/// The sectors recovered from one track, keyed by sector number. Ordered
/// iteration matches the order an image sink expects sectors in.
#[derive(Debug, Default)]
pub struct Track {
    sectors: BTreeMap<u8, Sector>,
    all_valid: bool,
}

impl Track {
    /// True when the expected number of sectors was decoded and every one
    /// of them passed both CRC checks with no bad-sector flag.
    pub fn all_valid(&self) -> bool {
        self.all_valid
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn sector(&self, number: u8) -> Option<&Sector> {
        self.sectors.get(&number)
    }

    /// Sectors in ascending sector-number order.
    pub fn iter(&self) -> impl Iterator<Item = (&u8, &Sector)> {
        self.sectors.iter()
    }

    /// Concatenated payloads in sector-number order, the shape an image
    /// file sink wants.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.sectors.values().map(Sector::len).sum());
        for sector in self.sectors.values() {
            buf.extend_from_slice(&sector.data);
        }
        buf
    }
}

/// Drives sector decoding across a cell stream for one track.
pub struct TrackAssembler {
    format: SectorFormat,
    sectors_per_track: usize,
}

impl TrackAssembler {
    pub fn new(format: SectorFormat, sectors_per_track: usize) -> Result<TrackAssembler, TrackRakeError> {
        if sectors_per_track == 0 {
            log::error!("TrackAssembler::new(): sectors_per_track must be nonzero");
            return Err(TrackRakeError::ParameterError);
        }
        // Validate the format up front by constructing a probe decoder.
        SectorDecoder::new(&format)?;
        log::debug!(
            "TrackAssembler::new(): format '{}', {} sectors per track",
            format.name,
            sectors_per_track
        );
        Ok(TrackAssembler {
            format,
            sectors_per_track,
        })
    }

    /// Decode sectors from `cells` until the expected count is reached (at
    /// which point remaining cells are left unconsumed), the stream ends,
    /// or a phase fails. Data-quality problems never error: they are
    /// reflected in per-sector flags and in `Track::all_valid`. The only
    /// `Err` here is a malformed format configuration.
    pub fn analyze<I: IntoIterator<Item = Cell>>(&self, cells: I) -> Result<Track, TrackRakeError> {
        let mut track = Track {
            sectors: BTreeMap::new(),
            all_valid: true,
        };
        let mut decoder = SectorDecoder::new(&self.format)?;

        for cell in cells {
            match decoder.feed(cell) {
                SectorStatus::Cooking => {}
                SectorStatus::Done => {
                    let fresh = SectorDecoder::new(&self.format)?;
                    let sector = mem::replace(&mut decoder, fresh).into_sector();

                    if sector.is_valid() {
                        log::debug!("TrackAssembler: {}", sector);
                    }
                    else {
                        log::warn!("TrackAssembler: {}", sector);
                        track.all_valid = false;
                    }

                    track.sectors.insert(sector.sector, sector);
                    if track.sectors.len() == self.sectors_per_track {
                        break;
                    }
                }
                SectorStatus::Failed => {
                    log::warn!(
                        "TrackAssembler: sector decode failed, abandoning track with {} of {} sectors",
                        track.sectors.len(),
                        self.sectors_per_track
                    );
                    track.all_valid = false;
                    return Ok(track);
                }
            }
        }

        if track.sectors.len() < self.sectors_per_track {
            log::warn!(
                "TrackAssembler: track incomplete: {} of {} sectors decoded",
                track.sectors.len(),
                self.sectors_per_track
            );
            track.all_valid = false;
        }
        Ok(track)
    }
}
