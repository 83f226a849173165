//! `msp430_object` reads and writes the textual relocatable object format
//! produced by the assembler and consumed by the linker, plus the linked
//! image format produced by the linker and consumed by the loader.

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_rust_codeblocks)]

#[cfg(test)]
#[macro_use]
mod test;

mod combinators;
mod model;
mod read;
mod write;

pub use model::*;
pub use read::{read, read_lenient};
pub use write::{write_linked_image, write_object};

use msp430_errors::error;

/// Represent the input type of the parsers: one line of a textual object
/// file, already stripped of its trailing newline.
pub type Input<'a> = &'a str;

/// Represent the result returned by the row parsers.
pub type Result<'a, O> = nom::IResult<Input<'a>, O, nom::error::Error<Input<'a>>>;

error! {
    /// Error type for this crate.
    pub enum Error {
        #[code = E014]
        #[message = "A row in a textual object file is malformed."]
        #[formatted_message("line {0}: malformed row: {1}")]
        #[help = "Object files are produced by the assembler and the linker; hand-edited \
                  files are easy to get wrong. Check the column count and hex formatting."]
        MalformedRow(usize, String),

        #[code = E007]
        #[message = "A relocation references a symbol that is not in the symbol table."]
        #[formatted_message("undefined symbol referenced by a relocation: `{0}`")]
        #[help = "Make sure the defining object file is included, or declare the symbol with \
                  `.global`/`.ref`."]
        UndefinedSymbol(String),
    }
}
