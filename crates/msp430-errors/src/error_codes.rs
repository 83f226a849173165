macro_rules! register_diagnostics {
    ( $( $error_code:ident => $text:literal ),* $(,)* ) => {
        /// An array of `(error_code, diagnostic)`.
        pub static DIAGNOSTICS: &[(&str, &str)] = &[
            $(
                (stringify!($error_code), $text)
            ),*
        ];

        #[cfg(doc)]
        /// This type exists only for documentation purposes. It doesn't exist in the code
        /// otherwise.
        ///
        /// This type has 2 goals:
        ///
        /// 1. To provide an idiomatic Rust documentation for all error codes,
        /// 2. To be able to test error code diagnostics with `cargo test --doc`.
        pub enum Diagnostics {
            $(
                #[doc = $text]
                $error_code
            ),*
        }
    };
}

register_diagnostics! {
    E000 => "The given error code is invalid. Error codes follow the pattern `E[0-9]{3}`.",
    E001 => "The command line could not be parsed. Run the tool with `--help` for usage.",
    E002 => "No input files were given to the tool.",
    E003 => "A numeric literal could not be parsed (bad decimal, hex, binary, or character \
             literal syntax).",
    E004 => "An operand does not match any of the seven MSP430 addressing-mode syntaxes.",
    E005 => "A `.macro` block is missing its closing `.endm`.",
    E006 => "A label is defined more than once within the same translation unit.",
    E007 => "A symbol is referenced but never defined, and it is not declared external.",
    E008 => "Two object files define the same global symbol; this is a symbol collision.",
    E009 => "A constant expression evaluates outside the representable 16-bit range.",
    E010 => "A mixture of relative and absolute symbols in an expression cannot be reduced to \
             a single value.",
    E011 => "A jump target lies outside the signed 10-bit displacement range of [-1024, 1023] \
             words.",
    E012 => "A directive was given the wrong number or kind of arguments.",
    E013 => "An input or output file could not be opened or read.",
    E014 => "An object, linked image, row is malformed and could not be parsed.",
    E015 => "A write to the modeled memory map overflowed the target region's bounds.",
}
