//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
#![warn(clippy::disallowed_types)]

use std::{error::Error, path::Path, process::exit};

use huffpack::tools::cli::{init_opts, HuffOpts, Mode};
use huffpack::{decode, encode, verify, HuffError};

use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

fn main() -> Result<(), Box<dyn Error>> {
    // Available log levels are Error, Warn, Info, Debug, Trace
    TermLogger::init(
        LevelFilter::Trace,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let options = match init_opts() {
        Ok(options) => options,
        Err(e) => e.exit(),
    };
    if options.output.is_some() && options.files.len() > 1 {
        error!("--output needs exactly one input file");
        exit(1);
    }

    //----- Figure how what we need to do and go do it
    let mut failures = 0;
    for file in &options.files {
        if let Err(e) = process(&options, Path::new(file)) {
            error!("{}: {}", file, e);
            failures += 1;
        }
    }

    info!("Done.");
    if failures > 0 {
        exit(1);
    }
    Ok(())
}

/// Run the selected mode on one input file.
fn process(options: &HuffOpts, input: &Path) -> Result<(), HuffError> {
    let output = options.output_for(input);
    if let Some(output) = &output {
        if output.exists() && !options.force_overwrite {
            return Err(HuffError::OutputExists(output.clone()));
        }
    }

    match (options.mode, output) {
        (Mode::Encode, Some(output)) => encode(input, &output),
        (Mode::Decode, Some(output)) => decode(input, &output),
        _ => verify(input).map(|_| ()),
    }
}
