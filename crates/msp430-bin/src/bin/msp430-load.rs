//! `msp430-load` places a linked image's words into a modeled MSP430 memory
//! map and prints that map.

use std::{path::PathBuf, process};

use argh::FromArgs;
use miette::{Diagnostic, Result};
use msp430_file::{FileReader, Picker};
use msp430_loader::{MemoryMap, DEFAULT_DATA_BASE, DEFAULT_TEXT_BASE};
use thiserror::Error;

/// The `msp430-load` command places a linked image into a modeled memory
/// map and prints it.
#[derive(Debug, FromArgs)]
struct Options {
    /// explain a particular error based on its code (of kind `E...`).
    #[argh(option)]
    explain: Option<String>,

    /// the linked image to load.
    #[argh(positional)]
    input_file: Option<PathBuf>,

    /// the address `.text` is placed at. Defaults to `0x4400`.
    #[argh(option, default = "DEFAULT_TEXT_BASE")]
    text_base: u16,

    /// the address `.data` is placed at. Defaults to `0x1C00`.
    #[argh(option, default = "DEFAULT_DATA_BASE")]
    data_base: u16,
}

#[derive(Error, Diagnostic, Debug)]
enum Error {
    #[error(transparent)]
    Bin(#[from] msp430_bin::Error),

    #[error(transparent)]
    Diagnostics(#[from] msp430_errors::Error),

    #[error(transparent)]
    Object(#[from] msp430_object::Error),

    #[error(transparent)]
    Loader(#[from] msp430_loader::Error),

    #[error("I was not given a linked image to load.")]
    #[diagnostic(code(E002))]
    NoInputFile,

    #[error("I couldn't read `{0}`:\n{1}")]
    #[diagnostic(code(E013))]
    Io(String, std::io::Error),
}

fn parse_options() -> Result<Options, Error> {
    let (command, arguments) = msp430_bin::collect_arguments()?;
    let arguments = arguments.iter().map(String::as_str).collect::<Vec<_>>();

    match Options::from_args(&[&command], &arguments) {
        Ok(options) => Ok(options),
        Err(early_exit) => match early_exit.status {
            Ok(()) => {
                println!("{}", early_exit.output);
                process::exit(0);
            }
            Err(()) => Err(msp430_bin::Error::CommandLine(early_exit.output.trim().to_string()).into()),
        },
    }
}

fn main() -> Result<()> {
    msp430_bin::install_and_configure()?;

    let options = parse_options()?;

    if let Some(error_code) = options.explain {
        println!("{}", msp430_bin::explain(&error_code)?);
        return Ok(());
    }

    let input_file = options.input_file.ok_or(Error::NoInputFile)?;
    let text = Picker::open(&input_file)
        .and_then(FileReader::read_as_string)
        .map_err(|error| Error::Io(input_file.display().to_string(), error))?;
    // Unlike the assembler and linker, the loader tolerates malformed rows
    // in its input: it warns and keeps going, failing only on a region
    // overflow once the image is placed in memory.
    let image = msp430_object::read_lenient(&text);

    let map = MemoryMap::load(&image, options.text_base, options.data_base)?;
    println!("{}", map.render());

    Ok(())
}
