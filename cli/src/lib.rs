pub mod config;
pub mod logger;

pub use config::Cli;
pub use logger::{LoggerConfig, UnifiedLogger};

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

use tlog_core::{compile, write_events, Result};

/// Opens the CLI's configured input: a real file, or standard input when the
/// path is exactly `-`.
fn open_input(cli: &Cli) -> io::Result<Box<dyn Read>> {
    if cli.input.as_os_str() == "-" {
        Ok(Box::new(io::stdin()))
    } else {
        Ok(Box::new(File::open(&cli.input)?))
    }
}

/// Opens the CLI's configured output: a real file, or standard output when
/// none was given.
fn open_output(cli: &Cli) -> io::Result<Box<dyn Write>> {
    match &cli.output {
        Some(path) => Ok(Box::new(File::create(path)?)),
        None => Ok(Box::new(io::stdout())),
    }
}

/// Runs one full compile: open input, fold it into compiled events, write
/// them out. Nothing is written to the output sink until the whole compile
/// has succeeded, so a failed run leaves behind a null output sequence
/// rather than a truncated one.
pub fn run(cli: &Cli) -> Result<()> {
    let input = BufReader::new(open_input(cli)?);
    let events = compile(input)?;

    let mut output = BufWriter::new(open_output(cli)?);
    write_events(&events, &mut output)?;
    output.flush()?;
    Ok(())
}
