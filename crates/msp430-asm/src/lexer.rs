//! Splits one source line into label / mnemonic / operands / comment, and
//! recognizes the four numeric literal forms (spec §6.1).

/// The pieces of one assembly source line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    /// The bound label, if the line opens with `name:`.
    pub label: Option<String>,
    /// The mnemonic or directive, upper-cased.
    pub mnemonic: Option<String>,
    /// The comma-separated operand strings, trimmed, in source order.
    pub operands: Vec<String>,
    /// The trailing comment, if any, without the leading `;`.
    pub comment: Option<String>,
}

/// Split a raw source line.
pub fn split_line(line: &str) -> Line {
    let (code, comment) = split_comment(line);
    let code = code.trim();

    if code.is_empty() {
        return Line { comment, ..Line::default() };
    }

    let (label, rest) = match code.split_once(':') {
        Some((label, rest)) => (Some(label.trim().to_string()), rest.trim()),
        None => (None, code),
    };

    if rest.is_empty() {
        return Line { label, comment, ..Line::default() };
    }

    let (mnemonic, operand_text) = match rest.split_once(char::is_whitespace) {
        Some((mnemonic, operand_text)) => (mnemonic, operand_text.trim()),
        None => (rest, ""),
    };

    let operands = if operand_text.is_empty() {
        Vec::new()
    } else {
        operand_text.split(',').map(|operand| operand.trim().to_string()).collect()
    };

    Line { label, mnemonic: Some(mnemonic.to_ascii_uppercase()), operands, comment }
}

/// Split a line at its first unquoted `;`.
fn split_comment(line: &str) -> (&str, Option<String>) {
    let mut in_char_literal = false;
    let bytes = line.as_bytes();

    for (index, &byte) in bytes.iter().enumerate() {
        match byte {
            b'\'' => in_char_literal = !in_char_literal,
            b';' if !in_char_literal => {
                return (&line[..index], Some(line[index + 1..].trim().to_string()))
            }
            _ => {}
        }
    }

    (line, None)
}

/// Parse one of the four numeric literal forms, or a bare decimal integer.
///
/// Accepts: decimal, `0x…`/`…h` hex, `0b…`/`…b` binary, and `'c'` character
/// literals.
pub fn parse_integer_literal(token: &str) -> Option<i64> {
    let token = token.trim();

    if let Some(inner) = token.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        let mut chars = inner.chars();
        let value = chars.next()? as i64;
        return if chars.next().is_none() { Some(value) } else { None };
    }

    if let Some(digits) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        return i64::from_str_radix(digits, 16).ok();
    }

    if let Some(digits) = token.strip_prefix("0b").or_else(|| token.strip_prefix("0B")) {
        return i64::from_str_radix(digits, 2).ok();
    }

    if let Some(digits) = token.strip_suffix(['h', 'H']) {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return i64::from_str_radix(digits, 16).ok();
        }
    }

    if let Some(digits) = token.strip_suffix(['b', 'B']) {
        if !digits.is_empty() && digits.chars().all(|c| c == '0' || c == '1') {
            return i64::from_str_radix(digits, 2).ok();
        }
    }

    token.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line_with_label_and_operands() {
        let line = split_line("START: MOV #0x1234, R4 ; load constant");

        assert_eq!(line.label.as_deref(), Some("START"));
        assert_eq!(line.mnemonic.as_deref(), Some("MOV"));
        assert_eq!(line.operands, vec!["#0x1234".to_string(), "R4".to_string()]);
        assert_eq!(line.comment.as_deref(), Some("load constant"));
    }

    #[test]
    fn test_split_line_without_label() {
        let line = split_line("    NOP");

        assert_eq!(line.label, None);
        assert_eq!(line.mnemonic.as_deref(), Some("NOP"));
        assert!(line.operands.is_empty());
    }

    #[test]
    fn test_split_comment_ignores_semicolon_in_char_literal() {
        let line = split_line("MOV #';', R5");

        assert_eq!(line.operands, vec!["#';'".to_string(), "R5".to_string()]);
        assert_eq!(line.comment, None);
    }

    #[test]
    fn test_parse_integer_literal() {
        assert_eq!(parse_integer_literal("42"), Some(42));
        assert_eq!(parse_integer_literal("-5"), Some(-5));
        assert_eq!(parse_integer_literal("0x1234"), Some(0x1234));
        assert_eq!(parse_integer_literal("1234h"), Some(0x1234));
        assert_eq!(parse_integer_literal("0b1010"), Some(0b1010));
        assert_eq!(parse_integer_literal("1010b"), Some(0b1010));
        assert_eq!(parse_integer_literal("'A'"), Some(65));
        assert_eq!(parse_integer_literal("not_a_number"), None);
    }
}
