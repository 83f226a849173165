//! The textual object/linked-image writer (spec §4.7, §6.2, §6.3). The
//! writer is total: any well-formed [`ObjectFile`] produces parseable
//! output.

use std::fmt::Write as _;

use crate::{ObjectFile, RelocationStatus};

fn render_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Serialize an assembled translation unit: decorative header, `.text`,
/// `.data`, `.symtab`, a `.shstrtab` placeholder, and `.rel.text` when
/// relocations exist.
pub fn write_object(object: &ObjectFile) -> String {
    let mut out = String::new();

    write_header(&mut out, object);
    write_words(&mut out, ".text Section (Machine Code):", &object.text);
    write_words(&mut out, ".data Section (Literals):", &object.data);
    write_symtab(&mut out, object, false);
    writeln!(out, ".shstrtab Section:").unwrap();
    writeln!(out, "(unnamed string table placeholder)").unwrap();
    writeln!(out).unwrap();

    if !object.relocations.is_empty() {
        write_reltext(&mut out, object, false);
    }

    out
}

/// Serialize a linked image: same tables as [`write_object`], plus the
/// `File`/`Status` columns and the linking summary footer (spec §6.3).
pub fn write_linked_image(object: &ObjectFile, input_files: &[String]) -> String {
    let mut out = String::new();

    writeln!(out, "MSP430 Linked Executable").unwrap();
    writeln!(out, "========================").unwrap();
    writeln!(out).unwrap();

    write_words(&mut out, ".text Section (Machine Code):", &object.text);
    write_words(&mut out, ".data Section (Literals):", &object.data);
    write_symtab(&mut out, object, true);

    if !object.relocations.is_empty() {
        write_reltext(&mut out, object, true);
    }

    writeln!(out, "--- Linking Summary ---").unwrap();
    writeln!(out, "Total text instructions: {}", object.text.len()).unwrap();
    writeln!(out, "Total data entries: {}", object.data.len()).unwrap();
    writeln!(out, "Total symbols: {}", object.symbols.len()).unwrap();
    writeln!(out, "Total relocations: {}", object.relocations.len()).unwrap();
    writeln!(out, "Files linked: {}", input_files.join(", ")).unwrap();

    out
}

fn write_header(out: &mut String, object: &ObjectFile) {
    writeln!(out, "ELF Object File").unwrap();
    writeln!(out, "=================").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "ELF Header:").unwrap();
    writeln!(out, "  Magic:   7F 45 4C 46 (ELF)").unwrap();
    writeln!(out, "  Class:   ELF32").unwrap();
    writeln!(out, "  Data:    2's complement, little endian").unwrap();
    writeln!(out, "  Version: 1 (current)").unwrap();
    writeln!(out, "  OS/ABI:  System V ABI").unwrap();
    writeln!(out, "  Type:    REL (Relocatable file)").unwrap();
    writeln!(out, "  Machine: MSP430").unwrap();
    writeln!(out, "  Entry:   0x0000").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "Section Headers:").unwrap();
    writeln!(out, "  [Nr] Name       Type            Addr   Size").unwrap();
    writeln!(out, "  [ 0]            NULL            000000 000000").unwrap();
    writeln!(out, "  [ 1] .text      PROGBITS        000000 {:06X}", object.text.len() * 2)
        .unwrap();
    writeln!(out, "  [ 2] .data      PROGBITS        000200 {:06X}", object.data.len() * 2)
        .unwrap();
    writeln!(out, "  [ 3] .symtab    SYMTAB          000000 {:06X}", object.symbols.len() * 16)
        .unwrap();
    writeln!(out, "  [ 4] .shstrtab  STRTAB          000000 000100").unwrap();
    if !object.relocations.is_empty() {
        writeln!(
            out,
            "  [ 5] .rel.text  REL             000000 {:06X}",
            object.relocations.len() * 8
        )
        .unwrap();
    }
    writeln!(out).unwrap();
}

fn write_words(out: &mut String, title: &str, words: &[(u16, u16)]) {
    writeln!(out, "{title}").unwrap();
    writeln!(out, "Address | Code").unwrap();
    writeln!(out, "--------+------").unwrap();
    for (address, code) in words {
        writeln!(out, "{address:04X}    | {code:04X}").unwrap();
    }
    writeln!(out).unwrap();
}

fn write_symtab(out: &mut String, object: &ObjectFile, with_file: bool) {
    writeln!(out, ".symtab Section (Symbol Table):").unwrap();
    if with_file {
        writeln!(out, "Symbol      | Value | Type      | Section | Defined | Global | File")
            .unwrap();
        writeln!(out, "------------+-------+-----------+---------+---------+--------+----------")
            .unwrap();
    } else {
        writeln!(out, "Symbol      | Value | Type      | Section | Defined | Global").unwrap();
        writeln!(out, "------------+-------+-----------+---------+---------+--------").unwrap();
    }

    for symbol in &object.symbols {
        if with_file {
            writeln!(
                out,
                "{:<11} | {:04X}  | {:<9} | {:<7} | {:<7} | {:<6} | {}",
                symbol.name,
                symbol.value,
                symbol.r#type,
                symbol.section,
                render_bool(symbol.defined),
                render_bool(symbol.is_global),
                symbol.file.as_deref().unwrap_or("N/A"),
            )
            .unwrap();
        } else {
            writeln!(
                out,
                "{:<11} | {:04X}  | {:<9} | {:<7} | {:<7} | {}",
                symbol.name,
                symbol.value,
                symbol.r#type,
                symbol.section,
                render_bool(symbol.defined),
                render_bool(symbol.is_global),
            )
            .unwrap();
        }
    }
    writeln!(out).unwrap();
}

fn write_reltext(out: &mut String, object: &ObjectFile, with_status: bool) {
    writeln!(out, ".rel.text Section (Relocation Entries):").unwrap();
    if with_status {
        writeln!(out, "Offset  | Symbol      | Type        | Section | Status   | File").unwrap();
        writeln!(out, "--------+-------------+-------------+---------+----------+----------")
            .unwrap();
    } else {
        writeln!(out, "Offset  | Symbol     | Type        | Section").unwrap();
        writeln!(out, "-------------------------------------------").unwrap();
    }

    for relocation in &object.relocations {
        if with_status {
            let status = relocation.status.unwrap_or(RelocationStatus::Unresolved);
            writeln!(
                out,
                "{:04X}    | {:<11} | {:<11} | {:<7} | {:<8} | {}",
                relocation.offset,
                relocation.symbol,
                relocation.kind,
                relocation.section,
                status,
                relocation.file.as_deref().unwrap_or("N/A"),
            )
            .unwrap();
        } else {
            writeln!(
                out,
                "{:04X}    | {:<10} | {:<11} | {}",
                relocation.offset, relocation.symbol, relocation.kind, relocation.section,
            )
            .unwrap();
        }
    }
    writeln!(out).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Section, Symbol, SymbolType};

    #[test]
    fn test_write_object_is_parseable() {
        assert_read_write!(ObjectFile {
            text: vec![(0x0000, 0x4034), (0x0002, 0x1234)],
            data: vec![],
            symbols: vec![Symbol {
                name: "START".to_string(),
                value: 0,
                r#type: SymbolType::Code,
                section: Section::Text,
                defined: true,
                is_global: true,
                file: None,
            }],
            relocations: vec![],
        });
    }
}
