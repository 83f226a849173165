use std::collections::HashMap;

use msp430_errors::error;
use msp430_object::{ObjectFile, RelocationEntry, RelocationKind, RelocationStatus, Symbol};

use crate::Configuration;

error! {
    /// Error type for this crate.
    pub enum Error {
        #[code = E002]
        #[message = "No object files were given to link."]
        #[formatted_message("no input files")]
        #[help = "Pass one or more object files: `msp430-ld file1.obj [file2.obj ...] -o out`."]
        NoInputFiles,

        #[code = E008]
        #[message = "Two object files define the same global symbol."]
        #[formatted_message("symbol collision: `{0}` is defined in more than one object file")]
        #[help = "Rename one of the definitions, or mark one `.ref` instead of defining it."]
        SymbolCollision(String),

        #[code = E007]
        #[message = "A relocation references a symbol that is undefined after merging."]
        #[formatted_message("undefined symbol referenced by a relocation: `{0}`")]
        #[help = "Make sure every external symbol is defined by one of the linked object files."]
        UndefinedSymbol(String),

        #[code = E014]
        #[message = "A relocation refers to an address that has no corresponding word."]
        #[formatted_message("relocation at address {0:#06X} has no matching word to patch")]
        #[help = "This points at a bug in the object file that produced the relocation."]
        DanglingRelocation(u16),
    }
}

/// Runs the six-step link algorithm over a [`Configuration`] (spec §4.8).
#[derive(Debug)]
pub struct Linker {
    configuration: Configuration,
}

impl Linker {
    pub(crate) fn with_configuration(configuration: Configuration) -> Self {
        Self { configuration }
    }

    /// Link every configured object file into one [`ObjectFile`] with every
    /// relocation resolved.
    pub fn link(self) -> Result<ObjectFile, Error> {
        if self.configuration.objects.is_empty() {
            return Err(Error::NoInputFiles);
        }

        let mut text = Vec::new();
        let mut data = Vec::new();
        let mut symbols: Vec<Symbol> = Vec::new();
        let mut relocations = Vec::new();

        let mut text_base: u16 = 0x0000;
        let mut data_base: u16 = 0x0200;

        for (file, object) in &self.configuration.objects {
            for (address, word) in &object.text {
                text.push((address.wrapping_add(text_base), *word));
            }
            for (address, word) in &object.data {
                data.push((address.wrapping_add(data_base), *word));
            }

            for symbol in &object.symbols {
                let base = section_base(&symbol.section, text_base, data_base);
                let mut rebased = symbol.clone();
                if rebased.defined {
                    rebased.value = rebased.value.wrapping_add(base);
                }
                rebased.file = Some(file.clone());
                merge_symbol(&mut symbols, rebased)?;
            }

            for relocation in &object.relocations {
                let base = section_base(&relocation.section, text_base, data_base);
                relocations.push(RelocationEntry {
                    offset: relocation.offset.wrapping_add(base),
                    symbol: relocation.symbol.clone(),
                    kind: relocation.kind,
                    section: relocation.section.clone(),
                    file: Some(file.clone()),
                    status: Some(RelocationStatus::Unresolved),
                });
            }

            text_base = text_base.wrapping_add((object.text.len() as u16) * 2);
            data_base = data_base.wrapping_add((object.data.len() as u16) * 2);
        }

        let mut text_index: HashMap<u16, usize> = HashMap::new();
        for (index, (address, _)) in text.iter().enumerate() {
            text_index.insert(*address, index);
        }
        let mut data_index: HashMap<u16, usize> = HashMap::new();
        for (index, (address, _)) in data.iter().enumerate() {
            data_index.insert(*address, index);
        }

        for relocation in &mut relocations {
            let symbol_value = symbols
                .iter()
                .find(|s| s.name == strip_sigils(&relocation.symbol) && s.defined)
                .map(|s| s.value)
                .ok_or_else(|| Error::UndefinedSymbol(relocation.symbol.clone()))?;

            let slot = text_index
                .get(&relocation.offset)
                .map(|&index| &mut text[index])
                .or_else(|| data_index.get(&relocation.offset).map(|&index| &mut data[index]))
                .ok_or(Error::DanglingRelocation(relocation.offset))?;

            slot.1 = match relocation.kind {
                RelocationKind::Absolute16 => symbol_value,
                RelocationKind::PcRelative => {
                    let displacement = (i64::from(symbol_value) - i64::from(relocation.offset) - 2) / 2;
                    slot.1 | ((displacement as u16) & 0x03FF)
                }
            };
            relocation.status = Some(RelocationStatus::Resolved);
        }

        Ok(ObjectFile { text, data, symbols, relocations })
    }
}

fn section_base(section: &msp430_object::Section, text_base: u16, data_base: u16) -> u16 {
    match section {
        msp430_object::Section::Text => text_base,
        _ => data_base,
    }
}

/// Merge one rebased symbol into the running global table, per spec §4.8
/// step 3: two defined entries with the same name collide; a defined entry
/// supersedes an undefined reference with the same name; two undefined
/// references collapse into one.
fn merge_symbol(symbols: &mut Vec<Symbol>, incoming: Symbol) -> Result<(), Error> {
    if let Some(index) = symbols.iter().position(|existing| existing.name == incoming.name) {
        let existing = &symbols[index];
        match (existing.defined, incoming.defined) {
            (true, true) => return Err(Error::SymbolCollision(incoming.name)),
            (false, true) => symbols[index] = incoming,
            (true, false) => {}
            (false, false) => {}
        }
        return Ok(());
    }

    symbols.push(incoming);
    Ok(())
}

/// Relocation entries may reference a symbol with a leading `#`/`@` sigil
/// carried over from the operand syntax; strip it before lookup (spec §4.8
/// step 5).
fn strip_sigils(name: &str) -> &str {
    name.trim_start_matches(['#', '@'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use msp430_object::{Section, SymbolType};

    fn defined_symbol(name: &str, value: u16, section: Section) -> Symbol {
        Symbol {
            name: name.to_string(),
            value,
            r#type: SymbolType::Relative,
            section,
            defined: true,
            is_global: true,
            file: None,
        }
    }

    #[test]
    fn test_link_rejects_empty_input() {
        let error = Configuration::new(Vec::new()).linker().link().unwrap_err();
        assert!(matches!(error, Error::NoInputFiles));
    }

    #[test]
    fn test_link_rebases_two_objects_in_order() {
        let first = ObjectFile {
            text: vec![(0, 0x4303), (2, 0x4303)],
            symbols: vec![defined_symbol("A", 0, Section::Text)],
            ..ObjectFile::default()
        };
        let second = ObjectFile {
            text: vec![(0, 0x4303)],
            symbols: vec![defined_symbol("B", 0, Section::Text)],
            ..ObjectFile::default()
        };

        let linked =
            Configuration::new(vec![("a.obj".to_string(), first), ("b.obj".to_string(), second)])
                .linker()
                .link()
                .unwrap();

        assert_eq!(linked.text, vec![(0, 0x4303), (2, 0x4303), (4, 0x4303)]);
        assert_eq!(linked.symbol("B").unwrap().value, 4);
    }

    #[test]
    fn test_link_rejects_duplicate_global_definition() {
        let first = ObjectFile { symbols: vec![defined_symbol("X", 0, Section::Text)], ..ObjectFile::default() };
        let second = ObjectFile { symbols: vec![defined_symbol("X", 0, Section::Text)], ..ObjectFile::default() };

        let error = Configuration::new(vec![("a.obj".to_string(), first), ("b.obj".to_string(), second)])
            .linker()
            .link()
            .unwrap_err();
        assert!(matches!(error, Error::SymbolCollision(_)));
    }

    #[test]
    fn test_pc_relative_relocation_preserves_opcode_bits() {
        let object = ObjectFile {
            text: vec![(0, 0x3C00)],
            symbols: vec![defined_symbol("TARGET", 10, Section::Text)],
            relocations: vec![RelocationEntry {
                offset: 0,
                symbol: "TARGET".to_string(),
                kind: RelocationKind::PcRelative,
                section: Section::Text,
                file: None,
                status: None,
            }],
            ..ObjectFile::default()
        };

        let linked = Configuration::new(vec![("a.obj".to_string(), object)]).linker().link().unwrap();
        assert_eq!(linked.text[0].1 & 0xFC00, 0x3C00);
        assert_eq!(linked.relocations[0].status, Some(RelocationStatus::Resolved));
    }
}
