//! The Pass 1 symbol table, including the explicit forward-reference
//! placeholder variant and its end-of-pass fixpoint resolution (spec §4.5,
//! §9).

use std::collections::{HashMap, HashSet};

use msp430_object::{Section as ObjectSection, SymbolType};

use crate::sections::Section;

/// A symbol's binding state while Pass 1 is still running.
#[derive(Debug, Clone)]
pub enum Binding {
    /// The symbol has a concrete value.
    Defined { value: u16, is_relative: bool },
    /// The symbol's value depends on other symbols not yet defined.
    Unresolved { depends_on: HashSet<String> },
    /// The symbol is declared external (`.ref`) and is never defined in this
    /// translation unit.
    External,
}

/// One entry in the symbol table.
#[derive(Debug, Clone)]
pub struct Entry {
    pub binding: Binding,
    pub section: Section,
    pub is_global: bool,
    pub is_constant: bool,
}

/// The symbol table built up during Pass 1.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    entries: HashMap<String, Entry>,
}

impl SymbolTable {
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        matches!(self.entries.get(name).map(|entry| &entry.binding), Some(Binding::Defined { .. }))
    }

    /// Bind a label to the current location counter. Returns an error
    /// message if the label was already defined (spec §3, duplicate
    /// definition).
    pub fn define_label(
        &mut self,
        name: &str,
        value: u16,
        section: Section,
    ) -> Result<(), String> {
        if self.is_defined(name) {
            return Err(name.to_string());
        }

        self.entries.insert(
            name.to_string(),
            Entry {
                binding: Binding::Defined { value, is_relative: true },
                section,
                is_global: self.entries.get(name).map(|e| e.is_global).unwrap_or(false),
                is_constant: false,
            },
        );
        Ok(())
    }

    /// Bind a constant (`.equ`/`.set`) expression result.
    pub fn define_constant(&mut self, name: &str, value: u16, is_relative: bool) -> Result<(), String> {
        if self.is_defined(name) {
            return Err(name.to_string());
        }

        self.entries.insert(
            name.to_string(),
            Entry {
                binding: Binding::Defined { value, is_relative },
                section: Section::Text,
                is_global: false,
                is_constant: true,
            },
        );
        Ok(())
    }

    /// Record a forward reference: `name` cannot be resolved yet because it
    /// depends on `depends_on`.
    pub fn defer(&mut self, name: &str, depends_on: HashSet<String>) {
        self.entries.entry(name.to_string()).or_insert_with(|| Entry {
            binding: Binding::Unresolved { depends_on },
            section: Section::Text,
            is_global: false,
            is_constant: false,
        });
    }

    /// Mark an existing entry as a compile-time constant (`.equ`/`.set`),
    /// rather than a section-relative label.
    pub fn mark_constant(&mut self, name: &str) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.is_constant = true;
        }
    }

    /// Mark a symbol as externally declared (`.ref`), creating a placeholder
    /// if it doesn't exist yet.
    pub fn declare_external(&mut self, name: &str) {
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| Entry {
                binding: Binding::External,
                section: Section::Text,
                is_global: false,
                is_constant: false,
            });
    }

    /// Mark a symbol as globally visible (`.global`/`.def`), creating a
    /// placeholder if it doesn't exist yet.
    pub fn declare_global(&mut self, name: &str) {
        match self.entries.get_mut(name) {
            Some(entry) => entry.is_global = true,
            None => {
                self.entries.insert(
                    name.to_string(),
                    Entry {
                        binding: Binding::Unresolved { depends_on: HashSet::new() },
                        section: Section::Text,
                        is_global: true,
                        is_constant: false,
                    },
                );
            }
        }
    }

    /// Repeatedly attempt to resolve every `Unresolved` entry against the
    /// other entries' current bindings until no further progress is made
    /// (the end-of-Pass-1 fixpoint, spec §4.5). Returns the names still
    /// unresolved (either because they depend on an undefined symbol, or
    /// because of a dependency cycle).
    pub fn resolve_forward_references(
        &mut self,
        mut evaluate: impl FnMut(&str, &SymbolTable) -> Result<(u16, bool), HashSet<String>>,
    ) -> Vec<String> {
        loop {
            let pending: Vec<String> = self
                .entries
                .iter()
                .filter(|(_, entry)| matches!(entry.binding, Binding::Unresolved { .. }))
                .map(|(name, _)| name.clone())
                .collect();

            if pending.is_empty() {
                return Vec::new();
            }

            let mut progressed = false;
            for name in &pending {
                match evaluate(name, self) {
                    Ok((value, is_relative)) => {
                        if let Some(entry) = self.entries.get_mut(name) {
                            entry.binding = Binding::Defined { value, is_relative };
                        }
                        progressed = true;
                    }
                    Err(depends_on) => {
                        if let Some(entry) = self.entries.get_mut(name) {
                            entry.binding = Binding::Unresolved { depends_on };
                        }
                    }
                }
            }

            if !progressed {
                return pending;
            }
        }
    }

    /// Render the final symbol table into object-file symbol records.
    pub fn into_object_symbols(self) -> Vec<msp430_object::Symbol> {
        self.entries
            .into_iter()
            .map(|(name, entry)| {
                let (value, defined, r#type) = match entry.binding {
                    Binding::Defined { value, is_relative } => (
                        value,
                        true,
                        if entry.is_constant {
                            SymbolType::Constant
                        } else if is_relative {
                            SymbolType::Relative
                        } else {
                            SymbolType::Absolute
                        },
                    ),
                    Binding::Unresolved { .. } => (0, false, SymbolType::External),
                    Binding::External => (0, false, SymbolType::External),
                };

                msp430_object::Symbol {
                    name,
                    value,
                    r#type,
                    section: to_object_section(&entry.section),
                    defined,
                    is_global: entry.is_global,
                    file: None,
                }
            })
            .collect()
    }
}

fn to_object_section(section: &Section) -> ObjectSection {
    match section {
        Section::Text => ObjectSection::Text,
        Section::Data => ObjectSection::Data,
        Section::Bss => ObjectSection::Bss,
        Section::Named(name) => ObjectSection::Named(name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_label_twice_is_an_error() {
        let mut table = SymbolTable::default();
        table.define_label("START", 0, Section::Text).unwrap();
        assert!(table.define_label("START", 4, Section::Text).is_err());
    }

    #[test]
    fn test_forward_reference_resolves_once_dependency_is_defined() {
        let mut table = SymbolTable::default();
        table.define_label("START", 0x10, Section::Text).unwrap();
        table.defer("LEN", HashSet::from(["END".to_string()]));

        let unresolved = table.resolve_forward_references(|name, symbols| {
            if name == "LEN" {
                match symbols.get("END") {
                    Some(Entry { binding: Binding::Defined { value, .. }, .. }) => Ok((*value, false)),
                    _ => Err(HashSet::from(["END".to_string()])),
                }
            } else {
                unreachable!()
            }
        });
        assert_eq!(unresolved, vec!["LEN".to_string()]);

        table.define_label("END", 0x20, Section::Text).unwrap();
        let unresolved = table.resolve_forward_references(|name, symbols| {
            if name == "LEN" {
                match symbols.get("END") {
                    Some(Entry { binding: Binding::Defined { value, .. }, .. }) => Ok((*value, false)),
                    _ => Err(HashSet::from(["END".to_string()])),
                }
            } else {
                unreachable!()
            }
        });
        assert!(unresolved.is_empty());
        assert!(table.is_defined("LEN"));
    }
}
