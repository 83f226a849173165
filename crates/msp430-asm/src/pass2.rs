//! Pass 2: encode every placed line into instruction words, emitting a
//! relocation wherever an operand depends on a symbol not locally resolved
//! (spec §4.6).

use msp430_object::{ObjectFile, RelocationEntry, RelocationKind, Section as ObjectSection};

use crate::context::AssemblerContext;
use crate::isa::{self, Form};
use crate::lexer::Line;
use crate::operand::{self, Operand, OperandValue, SymbolState};
use crate::pass1::PreparedLine;
use crate::sections::Section;
use crate::symbols::{Binding, SymbolTable};
use crate::Error;

/// Encode every prepared line, returning the finished object file's text and
/// data words plus the relocations Pass 2 had to defer.
pub fn run(context: &AssemblerContext, prepared: &[PreparedLine]) -> Result<ObjectFile, Error> {
    let mut text = Vec::new();
    let mut data = Vec::new();
    let mut relocations = Vec::new();

    for placed in prepared {
        let words = encode_line(&context.symbols, placed)?;
        let target = match placed.section {
            Section::Data => &mut data,
            _ => &mut text,
        };

        for (local_offset, word) in words {
            let address = placed.offset + local_offset;
            if let Some(kind) = word.relocation {
                relocations.push(RelocationEntry {
                    offset: address,
                    symbol: word.symbol.clone().expect("relocation carries a symbol name"),
                    kind,
                    section: to_object_section(&placed.section),
                    file: None,
                    status: None,
                });
            }
            target.push((address, word.value));
        }
    }

    Ok(ObjectFile { text, data, symbols: context.symbols.clone().into_object_symbols(), relocations })
}

fn to_object_section(section: &Section) -> ObjectSection {
    match section {
        Section::Text => ObjectSection::Text,
        Section::Data => ObjectSection::Data,
        Section::Bss => ObjectSection::Bss,
        Section::Named(name) => ObjectSection::Named(name.clone()),
    }
}

/// One encoded word, plus the relocation it requires (if any).
struct EncodedWord {
    value: u16,
    relocation: Option<RelocationKind>,
    symbol: Option<String>,
}

fn plain(value: u16) -> EncodedWord {
    EncodedWord { value, relocation: None, symbol: None }
}

fn encode_line(symbols: &SymbolTable, placed: &PreparedLine) -> Result<Vec<(u16, EncodedWord)>, Error> {
    let line = &placed.line;
    let Some(mnemonic) = &line.mnemonic else {
        return Ok(Vec::new());
    };

    if mnemonic == ".WORD" {
        return encode_word_directive(symbols, line, placed.line_number);
    }

    let (base, byte_mode) = isa::split_suffix(mnemonic);
    let lookup = |name: &str| symbol_state(symbols, name);

    match isa::classify(base) {
        Some(Form::DoubleOperand { opcode }) => {
            let [src, dst] = line.operands.as_slice() else {
                return Err(Error::BadDirectiveArguments(mnemonic.clone(), placed.line_number));
            };
            let src = operand::parse(src, &lookup)?;
            let dst = operand::parse(dst, &lookup)?;

            let ad = if dst.mode_bits() == 0 { 0 } else { 1 };
            let opcode_word = (opcode << 12)
                | (u16::from(src.register_field()) << 8)
                | (ad << 7)
                | ((byte_mode as u16) << 6)
                | (u16::from(src.mode_bits()) << 4)
                | u16::from(dst.register_field());

            let mut words = vec![(0, plain(opcode_word))];
            let mut extension_offset = 2;
            if src.has_extension_word() {
                words.push((extension_offset, extension_word(&src, symbols)?));
                extension_offset += 2;
            }
            if dst.has_extension_word() {
                words.push((extension_offset, extension_word(&dst, symbols)?));
            }
            Ok(words)
        }
        Some(Form::SingleOperand { format: 0b101 }) => {
            // CALL: fixed encoding plus a 16-bit target (spec §4.6).
            let [target] = line.operands.as_slice() else {
                return Err(Error::BadDirectiveArguments(mnemonic.clone(), placed.line_number));
            };
            let operand = operand::parse(target, &lookup)?;
            let word = call_target_word(&operand, symbols);
            Ok(vec![(0, plain(0x1280)), (2, word)])
        }
        Some(Form::SingleOperand { format }) => {
            let [only] = line.operands.as_slice() else {
                return Err(Error::BadDirectiveArguments(mnemonic.clone(), placed.line_number));
            };
            let operand = operand::parse(only, &lookup)?;
            let opcode_word = (0b000100u16 << 10)
                | (format << 7)
                | ((byte_mode as u16) << 6)
                | (u16::from(operand.mode_bits()) << 4)
                | u16::from(operand.register_field());

            let mut words = vec![(0, plain(opcode_word))];
            if operand.has_extension_word() {
                words.push((2, extension_word(&operand, symbols)?));
            }
            Ok(words)
        }
        Some(Form::Jump { base_opcode }) => {
            let [target] = line.operands.as_slice() else {
                return Err(Error::BadDirectiveArguments(mnemonic.clone(), placed.line_number));
            };
            encode_jump(symbols, base_opcode, target, placed)
        }
        Some(Form::Reti) => Ok(vec![(0, plain(0x1300))]),
        Some(Form::Nop) => Ok(vec![(0, plain(0x4303))]),
        None => Err(Error::BadDirectiveArguments(mnemonic.clone(), placed.line_number)),
    }
}

fn encode_word_directive(
    symbols: &SymbolTable,
    line: &Line,
    line_number: usize,
) -> Result<Vec<(u16, EncodedWord)>, Error> {
    let mut words = Vec::with_capacity(line.operands.len());
    for (index, value) in line.operands.iter().enumerate() {
        let offset = (index as u16) * 2;
        let word = match crate::lexer::parse_integer_literal(value) {
            Some(literal) => plain((literal & 0xFFFF) as u16),
            None => match symbol_state(symbols, value) {
                Some(SymbolState::Defined(v)) => plain(v),
                _ => return Err(Error::UndefinedSymbol(value.clone())),
            },
        };
        let _ = line_number;
        words.push((offset, word));
    }
    Ok(words)
}

fn symbol_state(symbols: &SymbolTable, name: &str) -> Option<SymbolState> {
    match symbols.get(name) {
        Some(entry) => match entry.binding {
            Binding::Defined { value, .. } => Some(SymbolState::Defined(value)),
            Binding::Unresolved { .. } | Binding::External => Some(SymbolState::Placeholder),
        },
        None => None,
    }
}

/// Compute the extension word for an operand that carries one (indexed,
/// absolute, symbolic, or immediate). Indexed offsets are always literal and
/// never need a relocation; the others may.
fn extension_word(operand: &Operand, symbols: &SymbolTable) -> Result<EncodedWord, Error> {
    match operand {
        Operand::Indexed { offset, .. } => Ok(plain(*offset as u16)),
        Operand::Absolute(value) | Operand::Immediate(value) => Ok(match value {
            OperandValue::Known(v) => plain(*v),
            OperandValue::Unresolved(name) => relocation_placeholder(RelocationKind::Absolute16, name),
        }),
        Operand::Symbolic(name) => Ok(match symbols.get(name) {
            Some(entry) => match entry.binding {
                Binding::Defined { value, .. } => plain(value),
                _ => relocation_placeholder(RelocationKind::Absolute16, name),
            },
            None => relocation_placeholder(RelocationKind::Absolute16, name),
        }),
        Operand::Register(_) | Operand::Indirect(_) | Operand::IndirectAutoIncrement(_) => {
            unreachable!("these modes never carry an extension word")
        }
    }
}

fn call_target_word(operand: &Operand, symbols: &SymbolTable) -> EncodedWord {
    match operand {
        Operand::Immediate(OperandValue::Known(v)) | Operand::Absolute(OperandValue::Known(v)) => plain(*v),
        Operand::Immediate(OperandValue::Unresolved(name))
        | Operand::Absolute(OperandValue::Unresolved(name)) => {
            relocation_placeholder(RelocationKind::Absolute16, name)
        }
        Operand::Symbolic(name) => match symbols.get(name) {
            Some(entry) => match entry.binding {
                Binding::Defined { value, .. } => plain(value),
                _ => relocation_placeholder(RelocationKind::Absolute16, name),
            },
            None => relocation_placeholder(RelocationKind::Absolute16, name),
        },
        Operand::Register(_)
        | Operand::Indexed { .. }
        | Operand::Indirect(_)
        | Operand::IndirectAutoIncrement(_) => relocation_placeholder(RelocationKind::Absolute16, ""),
    }
}

fn relocation_placeholder(kind: RelocationKind, symbol: &str) -> EncodedWord {
    EncodedWord { value: 0, relocation: Some(kind), symbol: Some(symbol.to_string()) }
}

fn encode_jump(
    symbols: &SymbolTable,
    base_opcode: u16,
    target: &str,
    placed: &PreparedLine,
) -> Result<Vec<(u16, EncodedWord)>, Error> {
    let target = target.trim();

    match symbols.get(target) {
        Some(entry) => match entry.binding {
            Binding::Defined { value: target_offset, .. } => {
                let pc = i64::from(placed.offset) + 2;
                let displacement = (i64::from(target_offset) - pc) / 2;
                if !(-1024..=1023).contains(&displacement) {
                    return Err(Error::JumpOutOfRange(target.to_string(), placed.line_number));
                }
                let word = base_opcode | ((displacement as u16) & 0x03FF);
                Ok(vec![(0, plain(word))])
            }
            _ => Ok(vec![(
                0,
                EncodedWord {
                    value: base_opcode,
                    relocation: Some(RelocationKind::PcRelative),
                    symbol: Some(target.to_string()),
                },
            )]),
        },
        None => Ok(vec![(
            0,
            EncodedWord {
                value: base_opcode,
                relocation: Some(RelocationKind::PcRelative),
                symbol: Some(target.to_string()),
            },
        )]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AssemblerContext;

    #[test]
    fn test_mov_immediate_to_register() {
        let mut context = AssemblerContext::default();
        let prepared = crate::pass1::run(&mut context, "\tMOV #4, R5\n").unwrap();
        let object = run(&context, &prepared).unwrap();

        assert_eq!(object.text.len(), 2);
        // MOV opcode 0x4, src register PC (immediate uses @PC+), As=11, Ad=0, dst R5.
        assert_eq!(object.text[0].1, 0x4035);
        assert_eq!(object.text[1].1, 4);
    }

    #[test]
    fn test_jmp_to_self_is_displacement_minus_one() {
        let mut context = AssemblerContext::default();
        let prepared = crate::pass1::run(&mut context, "HERE: JMP HERE\n").unwrap();
        let object = run(&context, &prepared).unwrap();

        assert_eq!(object.text.len(), 1);
        assert_eq!(object.text[0].1 & 0x03FF, 0x03FF);
        assert!(object.relocations.is_empty());
    }

    #[test]
    fn test_call_to_external_symbol_emits_relocation() {
        let mut context = AssemblerContext::default();
        let prepared = crate::pass1::run(&mut context, "\t.ref FUNC\n\tCALL #FUNC\n").unwrap();
        let object = run(&context, &prepared).unwrap();

        assert_eq!(object.text[0].1, 0x1280);
        assert_eq!(object.relocations.len(), 1);
        assert_eq!(object.relocations[0].symbol, "FUNC");
        assert_eq!(object.relocations[0].kind, RelocationKind::Absolute16);
    }
}
