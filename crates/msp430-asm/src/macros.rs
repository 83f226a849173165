//! `.macro`/`.endm` expansion: a pure text transform that runs before Pass 1
//! (spec §4.2).

use std::collections::HashMap;

use crate::lexer::split_line;

/// One `.macro NAME [p1, p2, ...]` ... `.endm` definition.
#[derive(Debug, Clone)]
struct MacroDef {
    parameters: Vec<String>,
    body: Vec<String>,
}

/// Holds every macro defined so far and the expansion counter used to
/// uniquify `name?` local labels (spec §9: kept as explicit state, not a
/// process global).
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: HashMap<String, MacroDef>,
    expansion_count: u32,
}

impl MacroTable {
    /// Run the macro pass over a whole source file, returning the expanded
    /// text with all `.macro` blocks stripped and every call site replaced
    /// by its expansion.
    pub fn expand(&mut self, source: &str) -> String {
        let mut output_lines = Vec::new();
        let mut lines = source.lines().peekable();

        while let Some(raw_line) = lines.next() {
            let line = split_line(raw_line);

            match line.mnemonic.as_deref() {
                Some(".MACRO") => {
                    // The lexer only splits operands on commas, but the name
                    // may be separated from its parameter list by whitespace
                    // alone (`.macro NAME p1, p2`) — normalize both
                    // separators before picking the name off the front.
                    let mut name_and_params: Vec<String> = line
                        .operands
                        .join(" ")
                        .split_whitespace()
                        .map(str::to_string)
                        .collect();
                    let name = name_and_params.remove(0);
                    let mut body = Vec::new();

                    for body_line in lines.by_ref() {
                        if split_line(body_line).mnemonic.as_deref() == Some(".ENDM") {
                            break;
                        }
                        body.push(body_line.to_string());
                    }

                    self.macros.insert(name, MacroDef { parameters: name_and_params, body });
                }
                Some(name) if self.macros.contains_key(name) => {
                    let trailing_comment = line.comment.clone();
                    let expansion = self.expand_call(name, &line.operands, trailing_comment.as_deref());
                    output_lines.extend(expansion);
                }
                _ => output_lines.push(raw_line.to_string()),
            }
        }

        output_lines.join("\n")
    }

    fn expand_call(&mut self, name: &str, args: &[String], trailing_comment: Option<&str>) -> Vec<String> {
        let definition = self.macros.get(name).expect("checked by caller").clone();
        self.expansion_count += 1;
        let suffix = self.expansion_count;

        let bindings: HashMap<&str, &str> = definition
            .parameters
            .iter()
            .map(String::as_str)
            .zip(args.iter().map(String::as_str))
            .collect();

        let mut expanded_non_directive_seen = false;
        let mut result = Vec::with_capacity(definition.body.len());

        for body_line in &definition.body {
            let mut line = substitute(body_line, &bindings, suffix);

            if !expanded_non_directive_seen && split_line(&line).mnemonic.is_some() {
                if let Some(comment) = trailing_comment {
                    if !comment.is_empty() {
                        line.push_str(" ; ");
                        line.push_str(comment);
                    }
                }
                expanded_non_directive_seen = true;
            }

            result.push(line);
        }

        result
    }
}

/// Substitute macro parameters in one body line, in all three documented
/// shapes: bare identifier, `#name` (preserved as an immediate), and
/// `:name:` (preserved as delimiters removed). Identifiers ending in `?` are
/// suffixed `.{suffix}` to uniquify local labels per expansion.
fn substitute(line: &str, bindings: &HashMap<&str, &str>, suffix: u32) -> String {
    let mut output = String::with_capacity(line.len());
    let chars: Vec<char> = line.chars().collect();
    let mut index = 0;

    while index < chars.len() {
        let c = chars[index];

        if c == '#' || c == ':' {
            let start = index + 1;
            let mut end = start;
            while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_' || chars[end] == '?') {
                end += 1;
            }
            if end > start {
                let word: String = chars[start..end].iter().collect();
                let closed = c == ':' && chars.get(end) == Some(&':');
                if c == '#' || closed {
                    output.push(c);
                    output.push_str(&resolve(&word, bindings, suffix));
                    index = if closed { end + 1 } else { end };
                    continue;
                }
            }
            output.push(c);
            index += 1;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = index;
            let mut end = start;
            while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            if end < chars.len() && chars[end] == '?' {
                end += 1;
            }
            let word: String = chars[start..end].iter().collect();
            output.push_str(&resolve(&word, bindings, suffix));
            index = end;
            continue;
        }

        output.push(c);
        index += 1;
    }

    output
}

fn resolve(word: &str, bindings: &HashMap<&str, &str>, suffix: u32) -> String {
    if let Some(stripped) = word.strip_suffix('?') {
        return format!("{stripped}.{suffix}");
    }

    bindings.get(word).map(|value| value.to_string()).unwrap_or_else(|| word.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_parameter_substitution() {
        let mut table = MacroTable::default();
        let source = ".macro DELAY, count\n\tMOV #count, R5\n.endm\n\tDELAY 10\n";
        let expanded = table.expand(source);
        assert!(expanded.contains("MOV #10, R5"));
        assert!(!expanded.contains(".macro"));
    }

    #[test]
    fn test_macro_name_without_trailing_comma_is_not_corrupted() {
        let mut table = MacroTable::default();
        let source = ".macro DELAY p1, p2\n\tMOV #p1, R5\n\tMOV #p2, R6\n.endm\n\tDELAY 10, 20\n";
        let expanded = table.expand(source);
        assert!(expanded.contains("MOV #10, R5"));
        assert!(expanded.contains("MOV #20, R6"));
    }

    #[test]
    fn test_local_label_is_uniqued_per_expansion() {
        let mut table = MacroTable::default();
        let source = ".macro LOOP3\nagain?: DEC R5\n\tJNZ again?\n.endm\n\tLOOP3\n\tLOOP3\n";
        let expanded = table.expand(source);
        assert!(expanded.contains("again.1"));
        assert!(expanded.contains("again.2"));
    }

    #[test]
    fn test_trailing_call_comment_is_appended_to_first_expanded_line() {
        let mut table = MacroTable::default();
        let source = ".macro NOPX\n\tNOP\n\tNOP\n.endm\n\tNOPX ; clear pipeline\n";
        let expanded = table.expand(source);
        let lines: Vec<&str> = expanded.lines().filter(|l| !l.trim().is_empty()).collect();
        assert!(lines[0].contains("clear pipeline"));
        assert!(!lines[1].contains("clear pipeline"));
    }
}
