//! Instruction-set tables shared by both passes: which mnemonics exist, what
//! shape they encode to, and their fixed opcode bits (spec §4.6).

/// The three instruction word layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// Two operands, a 4-bit opcode, and the byte/word bit.
    DoubleOperand { opcode: u16 },
    /// One operand and a 3-bit format field.
    SingleOperand { format: u16 },
    /// A conditional or unconditional jump with a 10-bit PC-relative
    /// displacement.
    Jump { base_opcode: u16 },
    /// `RETI`, fixed encoding, no operands.
    Reti,
    /// `NOP`, fixed encoding, no operands.
    Nop,
}

/// Split `MOV.B` into (`MOV`, byte_mode = true); `MOV` into (`MOV`, false).
pub fn split_suffix(mnemonic: &str) -> (&str, bool) {
    if let Some(base) = mnemonic.strip_suffix(".B") {
        (base, true)
    } else if let Some(base) = mnemonic.strip_suffix(".W") {
        (base, false)
    } else {
        (mnemonic, false)
    }
}

/// Look up a mnemonic's encoding shape, given its suffix-stripped base name.
pub fn classify(base: &str) -> Option<Form> {
    let opcode = match base {
        "MOV" => 0x4,
        "ADD" => 0x5,
        "ADDC" => 0x6,
        "SUBC" => 0x7,
        "SUB" => 0x8,
        "CMP" => 0x9,
        "DADD" => 0xA,
        "BIT" => 0xB,
        "BIC" => 0xC,
        "BIS" => 0xD,
        "XOR" => 0xE,
        "AND" => 0xF,
        _ => return classify_single_or_jump(base),
    };
    Some(Form::DoubleOperand { opcode })
}

fn classify_single_or_jump(base: &str) -> Option<Form> {
    let format = match base {
        "RRC" => 0b000,
        "SWPB" => 0b001,
        "RRA" => 0b010,
        "SXT" => 0b011,
        "PUSH" => 0b100,
        "CALL" => 0b101,
        "RETI" => return Some(Form::Reti),
        "NOP" => return Some(Form::Nop),
        _ => return classify_jump(base),
    };
    Some(Form::SingleOperand { format })
}

fn classify_jump(base: &str) -> Option<Form> {
    let base_opcode = match base {
        "JNE" | "JNZ" => 0x2000,
        "JEQ" | "JZ" => 0x2400,
        "JNC" => 0x2800,
        "JC" => 0x2C00,
        "JN" => 0x3000,
        "JGE" => 0x3400,
        "JL" => 0x3800,
        "JMP" => 0x3C00,
        _ => return None,
    };
    Some(Form::Jump { base_opcode })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("MOV.B"), ("MOV", true));
        assert_eq!(split_suffix("MOV"), ("MOV", false));
    }

    #[test]
    fn test_classify_each_form() {
        assert_eq!(classify("MOV"), Some(Form::DoubleOperand { opcode: 0x4 }));
        assert_eq!(classify("CALL"), Some(Form::SingleOperand { format: 0b101 }));
        assert_eq!(classify("JMP"), Some(Form::Jump { base_opcode: 0x3C00 }));
        assert_eq!(classify("RETI"), Some(Form::Reti));
        assert_eq!(classify("NOP"), Some(Form::Nop));
        assert_eq!(classify("BOGUS"), None);
    }
}
