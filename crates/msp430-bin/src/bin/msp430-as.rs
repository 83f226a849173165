//! `msp430-as` assembles one source file into a relocatable object file.

use std::{fs, path::PathBuf, process};

use argh::FromArgs;
use miette::{Diagnostic, Result};
use msp430_file::{FileReader, Picker};
use thiserror::Error;

fn default_output_file() -> PathBuf {
    PathBuf::from("a.obj")
}

/// The `msp430-as` command assembles one MSP430 source file into a
/// relocatable object file.
#[derive(Debug, FromArgs)]
struct Options {
    /// explain a particular error based on its code (of kind `E...`).
    #[argh(option)]
    explain: Option<String>,

    /// the source file to assemble.
    #[argh(positional)]
    input_file: Option<PathBuf>,

    /// specify the name and location of the output file. If not specified,
    /// `a.obj` is used.
    #[argh(option, short = 'o', default = "default_output_file()")]
    output_file: PathBuf,
}

#[derive(Error, Diagnostic, Debug)]
enum Error {
    #[error(transparent)]
    Bin(#[from] msp430_bin::Error),

    #[error("I was not given a source file to assemble.")]
    #[diagnostic(code(E002))]
    NoInputFile,

    #[error(transparent)]
    Assembler(#[from] msp430_asm::Error),

    #[error(transparent)]
    Diagnostics(#[from] msp430_errors::Error),

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
    let source = Picker::open(&input_file)
        .and_then(FileReader::read_as_string)
        .map_err(|error| Error::Io(input_file.display().to_string(), error))?;

    let object = msp430_asm::assemble(&source)?;
    fs::write(&options.output_file, msp430_object::write_object(&object))
        .map_err(|error| Error::Io(options.output_file.display().to_string(), error))?;

    Ok(())
}
