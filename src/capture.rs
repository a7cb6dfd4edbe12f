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

    src/capture.rs

    Raw capture loading. A WDS capture file is one sample per bit, packed
    eight to a byte MSB-first; unpacking it is a straight byte-to-bit
    expansion into a BitVec.
*/

use std::path::Path;

use bit_vec::BitVec;

use crate::TrackRakeError;

/// Load a raw flux capture file into a sample bit vector, MSB-first.
pub fn load_capture<P: AsRef<Path>>(path: P) -> Result<BitVec, TrackRakeError> {
    let buf = std::fs::read(path.as_ref())?;
    log::debug!(
        "load_capture(): {}: {} bytes, {} samples",
        path.as_ref().display(),
        buf.len(),
        buf.len() * 8
    );
    Ok(BitVec::from_bytes(&buf))
}
