//! Small `nom` parsers for the leaf tokens of a textual object file row.
//! Row-level structure (splitting on `|`, counting columns) lives in
//! [`crate::read`]; this module only validates the content of one field.

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::hex_digit1,
    combinator::{all_consuming, map_res},
};

use crate::{Input, Result};

/// Parse a field as a bare hexadecimal `u16`, with no `0x` prefix.
pub fn hex16(input: Input) -> Result<u16> {
    all_consuming(map_res(hex_digit1, |digits| u16::from_str_radix(digits, 16)))(input)
}

/// Parse a field as `True` or `False`.
pub fn boolean(input: Input) -> Result<bool> {
    all_consuming(nom::branch::alt((
        nom::combinator::value(true, tag("True")),
        nom::combinator::value(false, tag("False")),
    )))(input)
}

/// Parse a field as a bare identifier (symbol name, type name, section name).
pub fn identifier(input: Input) -> Result<Input> {
    all_consuming(take_while1(|c: char| !c.is_whitespace()))(input)
}
