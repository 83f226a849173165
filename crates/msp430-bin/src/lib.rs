//! Shared command-line plumbing for the `msp430-as`, `msp430-ld`, and
//! `msp430-load` executables: argument collection, the fancy-error hook, and
//! the `--explain` flag.

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_rust_codeblocks)]

use std::{env, ffi::OsString, path::Path};

#[cfg(feature = "fancy-errors")]
use miette::{set_hook, MietteHandlerOpts};
use miette::{Diagnostic, InstallError, Result};
use msp430_errors::Error as ToolchainError;
use thiserror::Error;

/// Error type shared by every binary in this crate.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// An `argv` entry was not valid Unicode.
    #[error("The argument `{0}` contains invalid Unicode data.")]
    InvalidArgumentEncoding(String),

    /// `argv[0]` was missing entirely.
    #[error("The program name is missing from the command-line.")]
    ProgramNameIsMissing,

    /// `argh` rejected the command line.
    #[error("I was not able to read the command-line properly:\n{0}")]
    #[diagnostic(code(E001), help("See the command-line usage with `--help`."))]
    CommandLine(String),
}

/// Collect `argv` as UTF-8 strings, splitting the program name from the rest.
pub fn collect_arguments() -> Result<(String, Vec<String>), Error> {
    let arguments = env::args_os()
        .map(OsString::into_string)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|argument| Error::InvalidArgumentEncoding(argument.to_string_lossy().to_string()))?;

    if arguments.is_empty() {
        return Err(Error::ProgramNameIsMissing);
    }

    let command = Path::new(&arguments[0])
        .file_name()
        .and_then(|file_name| file_name.to_str())
        .unwrap_or(&arguments[0])
        .to_string();

    Ok((command, arguments.into_iter().skip(1).collect()))
}

/// Install the `miette` error report hook.
pub fn install_and_configure() -> Result<(), InstallError> {
    #[cfg(feature = "fancy-errors")]
    set_hook(Box::new(|_| {
        Box::new(
            MietteHandlerOpts::new()
                .with_cause_chain()
                .footer(
                    "For more information about an error, try \
                    `msp430-as|msp430-ld|msp430-load --explain <error>` where \
                    `<error>` has the `E[0-9]{{3}}` pattern."
                        .to_string(),
                )
                .width(85)
                .terminal_links(false)
                .build(),
        )
    }))?;

    Ok(())
}

/// Implement the shared `--explain <CODE>` flag.
pub fn explain(error_code: &str) -> Result<&'static str, ToolchainError> {
    ToolchainError::explain(error_code)
}
