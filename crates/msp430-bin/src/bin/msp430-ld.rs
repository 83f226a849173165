//! `msp430-ld` links relocatable object files into one resolved image.

use std::{fs, path::PathBuf, process};

use argh::FromArgs;
use miette::{Diagnostic, Result};
use msp430_file::{FileReader, Picker};
use msp430_linker::Configuration;
use thiserror::Error;

fn default_output_file() -> PathBuf {
    PathBuf::from("a.linked")
}

/// The `msp430-ld` command links one or more relocatable object files into a
/// single linked image.
#[derive(Debug, FromArgs)]
struct Options {
    /// explain a particular error based on its code (of kind `E...`).
    #[argh(option)]
    explain: Option<String>,

    /// the object files to link, in link order.
    #[argh(positional)]
    input_files: Vec<PathBuf>,

    /// specify the name and location of the output file. If not specified,
    /// `a.linked` is used.
    #[argh(option, short = 'o', default = "default_output_file()")]
    output_file: PathBuf,
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
    Linker(#[from] msp430_linker::Error),

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

    let mut objects = Vec::with_capacity(options.input_files.len());
    for path in &options.input_files {
        let text = Picker::open(path)
            .and_then(FileReader::read_as_string)
            .map_err(|error| Error::Io(path.display().to_string(), error))?;
        let object = msp430_object::read(&text)?;
        let label = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        objects.push((label, object));
    }

    let file_names: Vec<String> = objects.iter().map(|(name, _)| name.clone()).collect();
    let linked = Configuration::new(objects).linker().link()?;

    fs::write(&options.output_file, msp430_object::write_linked_image(&linked, &file_names))
        .map_err(|error| Error::Io(options.output_file.display().to_string(), error))?;

    Ok(())
}
