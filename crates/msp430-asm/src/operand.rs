//! Classifies an operand string into one of the seven MSP430 addressing
//! modes (spec §4.1).

use crate::{lexer::parse_integer_literal, Error};

/// Whether a symbol used in an operand is already resolved.
#[derive(Debug, Clone, Copy)]
pub enum SymbolState {
    /// The symbol has a concrete 16-bit value.
    Defined(u16),
    /// The symbol exists (e.g. via `.global`/`.ref`) but has no value yet —
    /// an external or still-unresolved reference.
    Placeholder,
}

/// A value that is either already known, or waits on a symbol the linker
/// must resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandValue {
    /// The 16-bit value to emit directly.
    Known(u16),
    /// The name of the symbol whose value patches this site.
    Unresolved(String),
}

/// One of the seven addressing modes, with its encoded operand data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `Rn`.
    Register(u8),
    /// `x(Rn)`, with a literal signed offset.
    Indexed { register: u8, offset: i16 },
    /// `&addr`.
    Absolute(OperandValue),
    /// A bare label, PC-relative.
    Symbolic(String),
    /// `@Rn`.
    Indirect(u8),
    /// `@Rn+`.
    IndirectAutoIncrement(u8),
    /// `#imm`.
    Immediate(OperandValue),
}

impl Operand {
    /// The `As`/`Ad` mode-select bits this operand encodes to.
    pub fn mode_bits(&self) -> u8 {
        match self {
            Self::Register(_) => 0b00,
            Self::Indexed { .. } | Self::Absolute(_) | Self::Symbolic(_) => 0b01,
            Self::Indirect(_) => 0b10,
            Self::IndirectAutoIncrement(_) | Self::Immediate(_) => 0b11,
        }
    }

    /// The register field encoded alongside the mode bits.
    pub fn register_field(&self) -> u8 {
        match self {
            Self::Register(register)
            | Self::Indexed { register, .. }
            | Self::Indirect(register)
            | Self::IndirectAutoIncrement(register) => *register,
            Self::Absolute(_) => 2,
            Self::Symbolic(_) => 0,
            Self::Immediate(_) => 0,
        }
    }

    /// Whether this operand emits an extension word.
    pub fn has_extension_word(&self) -> bool {
        matches!(
            self,
            Self::Indexed { .. } | Self::Absolute(_) | Self::Symbolic(_) | Self::Immediate(_)
        )
    }
}

/// Parse one operand, given a symbol lookup for the absolute/immediate/
/// symbolic cases.
pub fn parse(text: &str, lookup: &dyn Fn(&str) -> Option<SymbolState>) -> Result<Operand, Error> {
    let text = text.trim();

    if let Some(inner) = text.strip_prefix('#') {
        return Ok(Operand::Immediate(resolve_value(inner, lookup)));
    }

    if let Some(inner) = text.strip_prefix('&') {
        return Ok(Operand::Absolute(resolve_absolute(inner, lookup)));
    }

    if let Some(inner) = text.strip_prefix('@') {
        if let Some(register_text) = inner.strip_suffix('+') {
            return Ok(Operand::IndirectAutoIncrement(parse_register(register_text, text)?));
        }
        return Ok(Operand::Indirect(parse_register(inner, text)?));
    }

    if let Some(register) = try_parse_register(text) {
        return Ok(Operand::Register(register));
    }

    if let Some((offset_text, register_text)) = parse_indexed(text) {
        let offset: i64 = offset_text
            .parse()
            .map_err(|_| Error::BadOperandSyntax(text.to_string()))?;
        if !(i64::from(i16::MIN)..=i64::from(i16::MAX)).contains(&offset) {
            return Err(Error::BadOperandSyntax(text.to_string()));
        }
        return Ok(Operand::Indexed {
            register: parse_register(register_text, text)?,
            offset: offset as i16,
        });
    }

    if is_bare_label(text) {
        return Ok(Operand::Symbolic(text.to_string()));
    }

    Err(Error::BadOperandSyntax(text.to_string()))
}

fn resolve_value(inner: &str, lookup: &dyn Fn(&str) -> Option<SymbolState>) -> OperandValue {
    if let Some(value) = parse_integer_literal(inner) {
        return OperandValue::Known((value & 0xFFFF) as u16);
    }

    match lookup(inner) {
        Some(SymbolState::Defined(value)) => OperandValue::Known(value),
        _ => OperandValue::Unresolved(inner.to_string()),
    }
}

/// Absolute mode tries the symbol table first, then a numeric literal, and
/// only then falls back to treating the text as an unresolved symbol name —
/// the intended three-way priority from the source (spec §9, open question
/// 1), not the source's own overwrite bug.
fn resolve_absolute(inner: &str, lookup: &dyn Fn(&str) -> Option<SymbolState>) -> OperandValue {
    match lookup(inner) {
        Some(SymbolState::Defined(value)) => OperandValue::Known(value),
        Some(SymbolState::Placeholder) => OperandValue::Unresolved(inner.to_string()),
        None => match parse_integer_literal(inner) {
            Some(value) => OperandValue::Known((value & 0xFFFF) as u16),
            None => OperandValue::Unresolved(inner.to_string()),
        },
    }
}

fn try_parse_register(text: &str) -> Option<u8> {
    let digits = text.strip_prefix('R')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let register: u8 = digits.parse().ok()?;
    (register <= 15).then_some(register)
}

fn parse_register(text: &str, whole_operand: &str) -> Result<u8, Error> {
    try_parse_register(text).ok_or_else(|| Error::BadOperandSyntax(whole_operand.to_string()))
}

fn parse_indexed(text: &str) -> Option<(&str, &str)> {
    let (offset_text, rest) = text.split_once('(')?;
    let register_text = rest.strip_suffix(')')?;

    let valid_offset = !offset_text.is_empty()
        && offset_text.strip_prefix('-').unwrap_or(offset_text).bytes().all(|b| b.is_ascii_digit())
        && !offset_text.strip_prefix('-').unwrap_or(offset_text).is_empty();

    valid_offset.then_some((offset_text, register_text))
}

fn is_bare_label(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_symbols(_: &str) -> Option<SymbolState> {
        None
    }

    #[test]
    fn test_register_mode() {
        assert_eq!(parse("R4", &no_symbols).unwrap(), Operand::Register(4));
    }

    #[test]
    fn test_indexed_mode() {
        assert_eq!(
            parse("4(R5)", &no_symbols).unwrap(),
            Operand::Indexed { register: 5, offset: 4 }
        );
        assert_eq!(
            parse("-2(R5)", &no_symbols).unwrap(),
            Operand::Indexed { register: 5, offset: -2 }
        );
    }

    #[test]
    fn test_absolute_mode_tries_symbol_then_numeric_then_unresolved() {
        let lookup = |name: &str| match name {
            "PORT" => Some(SymbolState::Defined(0x0200)),
            _ => None,
        };

        assert_eq!(
            parse("&PORT", &lookup).unwrap(),
            Operand::Absolute(OperandValue::Known(0x0200))
        );
        assert_eq!(
            parse("&0x0300", &lookup).unwrap(),
            Operand::Absolute(OperandValue::Known(0x0300))
        );
        assert_eq!(
            parse("&UNKNOWN", &lookup).unwrap(),
            Operand::Absolute(OperandValue::Unresolved("UNKNOWN".to_string()))
        );
    }

    #[test]
    fn test_indirect_modes() {
        assert_eq!(parse("@R6", &no_symbols).unwrap(), Operand::Indirect(6));
        assert_eq!(parse("@R6+", &no_symbols).unwrap(), Operand::IndirectAutoIncrement(6));
    }

    #[test]
    fn test_immediate_mode_numeric_and_symbolic() {
        assert_eq!(
            parse("#0x1234", &no_symbols).unwrap(),
            Operand::Immediate(OperandValue::Known(0x1234))
        );
        assert_eq!(
            parse("#'A'", &no_symbols).unwrap(),
            Operand::Immediate(OperandValue::Known(65))
        );

        let lookup = |name: &str| match name {
            "FUNC" => Some(SymbolState::Placeholder),
            _ => None,
        };
        assert_eq!(
            parse("#FUNC", &lookup).unwrap(),
            Operand::Immediate(OperandValue::Unresolved("FUNC".to_string()))
        );
    }

    #[test]
    fn test_symbolic_mode() {
        assert_eq!(parse("LOOP", &no_symbols).unwrap(), Operand::Symbolic("LOOP".to_string()));
    }

    #[test]
    fn test_invalid_operand_is_rejected() {
        assert!(parse("???", &no_symbols).is_err());
    }
}
