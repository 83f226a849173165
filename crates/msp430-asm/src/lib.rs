//! `msp430_asm` is a two-pass assembler for the MSP430 instruction subset:
//! it turns one source file into a relocatable [`msp430_object::ObjectFile`].

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_rust_codeblocks)]

mod context;
mod expr;
mod isa;
mod lexer;
mod macros;
mod operand;
mod pass1;
mod pass2;
mod sections;
mod symbols;

use msp430_errors::error;
use msp430_object::ObjectFile;

error! {
    /// Error type for this crate.
    pub enum Error {
        #[code = E004]
        #[message = "An operand does not match any of the seven addressing-mode syntaxes."]
        #[formatted_message("invalid operand syntax: `{0}`")]
        #[help = "Valid forms are Rn, x(Rn), &addr, a bare label, @Rn, @Rn+, and #imm."]
        BadOperandSyntax(String),

        #[code = E006]
        #[message = "A label is defined more than once in the same translation unit."]
        #[formatted_message("line {1}: `{0}` is already defined")]
        #[help = "Give the second definition a different name, or remove one of them."]
        DuplicateSymbol(String, usize),

        #[code = E007]
        #[message = "A symbol is referenced but never defined, and is not declared external."]
        #[formatted_message("undefined symbol: `{0}`")]
        #[help = "Define the symbol in this file, or declare it with `.ref` if it is external."]
        UndefinedSymbol(String),

        #[code = E011]
        #[message = "A jump target lies outside the 10-bit signed displacement range."]
        #[formatted_message("line {1}: jump target `{0}` is out of range")]
        #[help = "Conditional and unconditional jumps can only reach [-1024, 1023] words away. \
                  Use a `CALL`/`MOV` through a register for longer-range control transfer."]
        JumpOutOfRange(String, usize),

        #[code = E012]
        #[message = "A directive or instruction was given the wrong number or kind of arguments."]
        #[formatted_message("line {1}: bad arguments for `{0}`")]
        #[help = "Check the operand count and addressing modes against the instruction's form."]
        BadDirectiveArguments(String, usize),
    }
}

/// Assemble one source file into a relocatable object.
pub fn assemble(source: &str) -> Result<ObjectFile, Error> {
    let mut context = context::AssemblerContext::default();
    let expanded = context.macros.expand(source);
    let prepared = pass1::run(&mut context, &expanded)?;
    pass2::run(&context, &prepared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_end_to_end() {
        let source = "START:\n\tMOV #4, R5\n\tJMP START\n";
        let object = assemble(source).unwrap();

        assert_eq!(object.text.len(), 3);
        assert!(object.relocations.is_empty());
        assert!(object.symbol("START").is_some());
    }

    #[test]
    fn test_assemble_reports_duplicate_label() {
        let source = "A: NOP\nA: NOP\n";
        assert!(matches!(assemble(source), Err(Error::DuplicateSymbol(_, _))));
    }
}
