//! A defensive textual reader for the object/linked-image format (spec
//! §6.2, §6.3, §9: "parsing must be defensive: reject malformed rows with a
//! line-number diagnostic").

use std::str::FromStr;

use crate::{
    combinators, Error, ObjectFile, RelocationEntry, RelocationKind, RelocationStatus, Section,
    Symbol, SymbolType,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    None,
    Text,
    Data,
    Symtab,
    RelText,
}

/// One row parsed out of a table, tagged with the table it belongs to.
enum Row {
    Text((u16, u16)),
    Data((u16, u16)),
    Symbol(Symbol),
    Relocation(RelocationEntry),
}

fn push_row(object: &mut ObjectFile, row: Row) {
    match row {
        Row::Text(word) => object.text.push(word),
        Row::Data(word) => object.data.push(word),
        Row::Symbol(symbol) => object.symbols.push(symbol),
        Row::Relocation(relocation) => object.relocations.push(relocation),
    }
}

/// Walk `input` line by line, calling `on_row` with every would-be table
/// row. `on_row` decides what a malformed row means: `read` aborts on the
/// first one, `read_lenient` warns and skips it.
fn walk_rows(
    input: &str,
    mut on_row: impl FnMut(usize, Mode, &[&str]) -> std::result::Result<(), Error>,
) -> std::result::Result<(), Error> {
    let mut mode = Mode::None;

    for (line_number, line) in input.lines().enumerate() {
        let line_number = line_number + 1;
        let line = line.trim();

        if line.is_empty() {
            // A blank line ends the current section's table.
            mode = Mode::None;
            continue;
        }

        if let Some(next_mode) = header_mode(line) {
            mode = next_mode;
            continue;
        }

        if line.starts_with('.') {
            // An unrecognized section header; ignore it (spec §6.2).
            mode = Mode::None;
            continue;
        }

        if line.starts_with('-') {
            // The `---` rule under a table header.
            continue;
        }

        let fields = split_fields(line);

        if is_table_header(&fields) {
            continue;
        }

        if mode == Mode::None {
            continue;
        }

        on_row(line_number, mode, &fields)?;
    }

    Ok(())
}

fn parse_row(line_number: usize, mode: Mode, fields: &[&str]) -> std::result::Result<Row, Error> {
    if fields.len() < 2 {
        return Err(malformed(line_number, fields));
    }

    match mode {
        Mode::None => unreachable!("walk_rows filters out Mode::None before calling back"),
        Mode::Text => parse_word(line_number, fields).map(Row::Text),
        Mode::Data => parse_word(line_number, fields).map(Row::Data),
        Mode::Symtab => parse_symbol(line_number, fields).map(Row::Symbol),
        Mode::RelText => parse_relocation(line_number, fields).map(Row::Relocation),
    }
}

/// Read an object file or a linked image from its textual form.
///
/// Both formats share a reader: a linked image's `.symtab` rows carry one
/// extra `File` column and its `.rel.text` rows carry two (`Status`, `File`);
/// the column count alone tells them apart; both shapes are accepted.
///
/// The first malformed row aborts the whole read; the assembler and linker
/// both want this. The loader wants the opposite policy — see
/// [`read_lenient`].
pub fn read(input: &str) -> std::result::Result<ObjectFile, Error> {
    let mut object = ObjectFile::default();

    walk_rows(input, |line_number, mode, fields| {
        push_row(&mut object, parse_row(line_number, mode, fields)?);
        Ok(())
    })?;

    Ok(object)
}

/// Read a linked image the way the loader does: a malformed row is reported
/// to stderr as a warning and skipped, and reading continues to the end of
/// the file rather than aborting.
pub fn read_lenient(input: &str) -> ObjectFile {
    let mut object = ObjectFile::default();

    let _ = walk_rows(input, |line_number, mode, fields| {
        match parse_row(line_number, mode, fields) {
            Ok(row) => push_row(&mut object, row),
            Err(error) => eprintln!("warning: {error}"),
        }
        Ok(())
    });

    object
}

fn header_mode(line: &str) -> Option<Mode> {
    if line.starts_with(".text Section") {
        Some(Mode::Text)
    } else if line.starts_with(".data Section") {
        Some(Mode::Data)
    } else if line.starts_with(".symtab Section") {
        Some(Mode::Symtab)
    } else if line.starts_with(".rel.text Section") {
        Some(Mode::RelText)
    } else {
        None
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split('|').map(str::trim).collect()
}

fn is_table_header(fields: &[&str]) -> bool {
    matches!(fields.first(), Some(&"Address") | Some(&"Symbol") | Some(&"Offset"))
        || fields.first().map(|field| field.starts_with("---")).unwrap_or(false)
}

fn malformed(line_number: usize, line: &[&str]) -> Error {
    Error::MalformedRow(line_number, line.join("|"))
}

fn parse_word(line_number: usize, fields: &[&str]) -> std::result::Result<(u16, u16), Error> {
    let [address, code] = fields else {
        return Err(malformed(line_number, fields));
    };

    let (_, address) =
        combinators::hex16(address).map_err(|_| malformed(line_number, fields))?;
    let (_, code) = combinators::hex16(code).map_err(|_| malformed(line_number, fields))?;

    Ok((address, code))
}

fn parse_symbol(line_number: usize, fields: &[&str]) -> std::result::Result<Symbol, Error> {
    let (name, value, r#type, section, defined, is_global, file) = match fields {
        [name, value, r#type, section, defined, is_global] => {
            (name, value, r#type, section, defined, is_global, None)
        }
        [name, value, r#type, section, defined, is_global, file] => {
            (name, value, r#type, section, defined, is_global, Some(*file))
        }
        _ => return Err(malformed(line_number, fields)),
    };

    let (_, value) = combinators::hex16(value).map_err(|_| malformed(line_number, fields))?;
    let r#type = SymbolType::from_str(r#type).map_err(|_| malformed(line_number, fields))?;
    let section = Section::from_str(section).expect("Section parsing is infallible");
    let (_, defined) = combinators::boolean(defined).map_err(|_| malformed(line_number, fields))?;
    let (_, is_global) =
        combinators::boolean(is_global).map_err(|_| malformed(line_number, fields))?;

    Ok(Symbol {
        name: name.to_string(),
        value,
        r#type,
        section,
        defined,
        is_global,
        file: file.map(str::to_string),
    })
}

fn parse_relocation(
    line_number: usize,
    fields: &[&str],
) -> std::result::Result<RelocationEntry, Error> {
    let (offset, symbol, kind, section, status, file) = match fields {
        [offset, symbol, kind, section] => (offset, symbol, kind, section, None, None),
        [offset, symbol, kind, section, status, file] => {
            (offset, symbol, kind, section, Some(*status), Some(*file))
        }
        _ => return Err(malformed(line_number, fields)),
    };

    let (_, offset) = combinators::hex16(offset).map_err(|_| malformed(line_number, fields))?;
    let (_, symbol) = combinators::identifier(symbol).map_err(|_| malformed(line_number, fields))?;
    let kind = RelocationKind::from_str(kind).map_err(|_| malformed(line_number, fields))?;
    let section = Section::from_str(section).expect("Section parsing is infallible");
    let status = status
        .map(RelocationStatus::from_str)
        .transpose()
        .map_err(|_| malformed(line_number, fields))?;

    Ok(RelocationEntry {
        offset,
        symbol: symbol.to_string(),
        kind,
        section,
        file: file.map(str::to_string),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_round_trips_an_object_file() {
        assert_read_write!(ObjectFile {
            text: vec![(0x0000, 0x4034), (0x0002, 0x1234)],
            data: vec![(0x0200, 0x00ff)],
            symbols: vec![Symbol {
                name: "START".to_string(),
                value: 0x0000,
                r#type: SymbolType::Code,
                section: Section::Text,
                defined: true,
                is_global: false,
                file: None,
            }],
            relocations: vec![RelocationEntry {
                offset: 0x0002,
                symbol: "FUNC".to_string(),
                kind: RelocationKind::Absolute16,
                section: Section::Text,
                file: None,
                status: None,
            }],
        });
    }

    #[test]
    fn test_read_rejects_malformed_row() {
        let input = ".text Section (Machine Code):\nAddress | Code\n---\nnope\n";

        assert!(matches!(read(input), Err(Error::MalformedRow(4, _))));
    }

    #[test]
    fn test_read_ignores_unknown_section_header() {
        let input = ".shstrtab Section\nsome | garbage | not a table\n";

        assert!(read(input).unwrap().text.is_empty());
    }

    #[test]
    fn test_read_lenient_skips_malformed_rows_and_keeps_going() {
        let input = ".text Section (Machine Code):\nAddress | Code\n---\nnope\n0002    | 1234\n";

        let object = read_lenient(input);

        assert_eq!(object.text, vec![(0x0002, 0x1234)]);
    }
}
