//! The state threaded through one assembly run: the macro table and its
//! expansion counter, the symbol table, and the section/location-counter
//! tracker (spec §9 — explicit fields, not process globals).

use crate::macros::MacroTable;
use crate::sections::SectionTable;
use crate::symbols::SymbolTable;

/// Everything a single call to [`crate::assemble`] needs, created fresh per
/// run and never shared across invocations (spec §5).
#[derive(Default)]
pub struct AssemblerContext {
    pub macros: MacroTable,
    pub symbols: SymbolTable,
    pub sections: SectionTable,
}
