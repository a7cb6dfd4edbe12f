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
*/

//! trackrake recovers sector data from raw flux-transition captures of MFM
//! hard disk tracks, as produced by sampling the read channel of a Winchester
//! drive at a fixed rate. A self-correcting digital clock turns the sample
//! stream into bit cells, a pipeline of phase decoders walks the cells to
//! extract sync marks, headers and payloads, and CRC checks judge what came
//! out. Three MERA-400 era controller layouts are built in.

pub mod capture;
pub mod clock;
pub mod crc;
pub mod decoder;
pub mod formats;
pub mod phase;
pub mod sector;
pub mod track;

use thiserror::Error;

/// Payload size shared by all stock controller formats.
pub const DEFAULT_SECTOR_SIZE: usize = 512;

/// Default clock recovery parameters, in raw samples. These match the
/// sampling setup the stock WDS captures were made with.
pub const DEFAULT_CLOCK_PERIOD: usize = 11;
pub const DEFAULT_CLOCK_MARGIN: usize = 2;

#[derive(Debug, Error)]
pub enum TrackRakeError {
    #[error("An IO error occurred reading the flux capture: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid parameters were specified to a library function")]
    ParameterError,
}

pub use crate::{
    capture::load_capture,
    clock::{Cell, ClockRecovery},
    crc::CrcEngine,
    decoder::{SectorDecoder, SectorStatus},
    formats::{DataCrcKind, DiskController, SectorFormat},
    sector::{DecodeEvent, Sector},
    track::{Track, TrackAssembler},
};
