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

    crates/trackrake-cli/src/main.rs

    Recover one MFM track image from a raw WDS flux capture and write it
    alongside the input with an .img extension.
*/
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use bpaf::*;
use trackrake::{load_capture, ClockRecovery, DiskController, TrackAssembler};

#[derive(Debug, Clone)]
struct Out {
    verbose: bool,
    controller: DiskController,
    period: usize,
    margin: usize,
    offset: i64,
    sectors: usize,
    filename: PathBuf,
}

/// Set up bpaf argument parsing.
fn opts() -> OptionParser<Out> {
    let verbose = short('v')
        .long("verbose")
        .help("Print a diagnostic line for every sector, not just failures")
        .switch();

    let controller = short('f')
        .long("format")
        .help("Controller format: wd1006, amepol or computex")
        .argument::<DiskController>("FORMAT")
        .fallback(DiskController::default());

    let period = short('p')
        .long("period")
        .help("Expected clock period in raw samples")
        .argument::<usize>("PERIOD")
        .fallback(trackrake::DEFAULT_CLOCK_PERIOD);

    let margin = short('m')
        .long("margin")
        .help("Allowed clock jitter in raw samples")
        .argument::<usize>("MARGIN")
        .fallback(trackrake::DEFAULT_CLOCK_MARGIN);

    let offset = long("offset")
        .help("Timestamp correction applied to recovered cells")
        .argument::<i64>("OFFSET")
        .fallback(0);

    let sectors = short('s')
        .long("sectors")
        .help("Expected sectors per track")
        .argument::<usize>("SECTORS")
        .fallback(16);

    let filename = positional::<PathBuf>("FILE").help("WDS flux capture to decode");

    construct!(Out {
        verbose,
        controller,
        period,
        margin,
        offset,
        sectors,
        filename
    })
    .to_options()
    .descr("trackrake: recover an MFM hard disk track image from a flux capture")
}

fn main() {
    env_logger::init();

    let opts = opts().run();

    let samples = match load_capture(&opts.filename) {
        Ok(samples) => samples,
        Err(e) => {
            eprintln!("Error reading capture: {}", e);
            std::process::exit(1);
        }
    };

    let clock = match ClockRecovery::new(opts.period, opts.margin, opts.offset) {
        Ok(clock) => clock,
        Err(e) => {
            eprintln!("Error configuring clock recovery: {}", e);
            std::process::exit(1);
        }
    };
    let cells = clock.run(&samples);
    let period_estimate = ClockRecovery::period_estimate(samples.len(), cells.len());

    let assembler = match TrackAssembler::new(opts.controller.format(), opts.sectors) {
        Ok(assembler) => assembler,
        Err(e) => {
            eprintln!("Error configuring track assembly: {}", e);
            std::process::exit(1);
        }
    };
    let track = match assembler.analyze(cells) {
        Ok(track) => track,
        Err(e) => {
            eprintln!("Error decoding track: {}", e);
            std::process::exit(1);
        }
    };

    for (_, sector) in track.iter() {
        if opts.verbose || !sector.is_valid() {
            println!(" * {}", sector);
            if opts.verbose {
                for event in &sector.events {
                    println!("   - {}", event);
                }
            }
        }
    }

    let out_path = opts.filename.with_extension("img");
    if let Err(e) = write_image(&out_path, &track.to_bytes()) {
        eprintln!("Error writing image {}: {}", out_path.display(), e);
        std::process::exit(1);
    }

    println!(
        "{}: clock period: {:.4} samples, {} sectors{}",
        opts.filename
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| opts.filename.display().to_string()),
        period_estimate,
        track.len(),
        if track.all_valid() { "" } else { " (track decode FAILED)" }
    );
}

fn write_image(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
