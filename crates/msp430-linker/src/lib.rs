//! `msp430_linker` merges relocatable object files produced by the
//! assembler into one linked image, rebasing sections and patching every
//! relocation in place (spec §4.8).

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_rust_codeblocks)]

mod configuration;
mod linker;

pub use configuration::*;
pub use linker::*;
