//! Pass 1: walk the macro-expanded source, bind every label to a location
//! counter, and size every instruction without emitting any words (spec
//! §4.5).

use crate::context::AssemblerContext;
use crate::expr::{evaluate, EvalError, ResolvedSymbol};
use crate::isa::{self, Form};
use crate::lexer::{split_line, Line};
use crate::operand;
use crate::sections::Section;
use crate::Error;

/// A `.equ`/`.set` binding whose expression could not be evaluated yet
/// because it names a symbol not defined at the time the directive ran.
struct PendingConstant {
    name: String,
    expr: String,
    location_counter: i64,
    line_number: usize,
}

/// One source line, annotated with the section and location counter it was
/// encountered at. Pass 2 re-parses the same `line` against this fixed
/// placement rather than re-running Pass 1's bookkeeping.
#[derive(Debug, Clone)]
pub struct PreparedLine {
    pub line_number: usize,
    pub line: Line,
    pub section: Section,
    pub offset: u16,
}

/// Run Pass 1 over macro-expanded source text, populating `context`'s
/// symbol table and returning the placed lines for Pass 2.
pub fn run(context: &mut AssemblerContext, source: &str) -> Result<Vec<PreparedLine>, Error> {
    let mut prepared = Vec::new();
    let mut pending_constants = Vec::new();

    for (index, raw_line) in source.lines().enumerate() {
        let line_number = index + 1;
        let line = split_line(raw_line);

        if let Some(label) = &line.label {
            let section = context.sections.current().clone();
            let offset = context.sections.location_counter();
            context
                .symbols
                .define_label(label, offset, section)
                .map_err(|name| Error::DuplicateSymbol(name, line_number))?;
        }

        let Some(mnemonic) = line.mnemonic.clone() else {
            continue;
        };

        if let Some(size) = handle_directive(context, &mnemonic, &line, line_number, &mut pending_constants)? {
            if size > 0 {
                prepared.push(PreparedLine {
                    line_number,
                    line: line.clone(),
                    section: context.sections.current().clone(),
                    offset: context.sections.advance(size),
                });
            }
            if mnemonic == ".END" {
                break;
            }
            continue;
        }

        let size = instruction_size(&mnemonic, &line, line_number)?;
        let section = context.sections.current().clone();
        let offset = context.sections.advance(size);
        prepared.push(PreparedLine { line_number, line, section, offset });
    }

    resolve_pending_constants(context, pending_constants)?;

    Ok(prepared)
}

/// Fixpoint-resolve `.equ`/`.set` bindings that referenced a symbol not yet
/// defined when the directive first ran (spec §4.5, §9 — forward references
/// are an explicit `Unresolved(depends_on)` binding, resolved by retrying
/// until nothing changes).
fn resolve_pending_constants(
    context: &mut AssemblerContext,
    pending: Vec<PendingConstant>,
) -> Result<(), Error> {
    if pending.is_empty() {
        return Ok(());
    }

    let line_numbers: std::collections::HashMap<String, usize> =
        pending.iter().map(|c| (c.name.clone(), c.line_number)).collect();
    let exprs: std::collections::HashMap<String, (String, i64)> = pending
        .into_iter()
        .map(|c| (c.name.clone(), (c.expr, c.location_counter)))
        .collect();

    for (name, (_, _)) in &exprs {
        context.symbols.defer(name, std::collections::HashSet::new());
    }

    let mut eval_error = None;
    let unresolved = context.symbols.resolve_forward_references(|name, symbols| {
        let (expr, location_counter) = exprs.get(name).expect("deferred names came from `exprs`");
        match evaluate(expr, *location_counter, &|symbol| resolve_symbol_in(symbol, symbols)) {
            Ok(value) => Ok(((value.value & 0xFFFF) as u16, value.is_relative)),
            Err(EvalError::Undefined(depends_on)) => Err(depends_on.into_iter().collect()),
            Err(other) => {
                eval_error = Some(other);
                Err(std::collections::HashSet::new())
            }
        }
    });

    if let Some(error) = eval_error {
        let _ = error;
        return Err(Error::BadDirectiveArguments(".equ".to_string(), 0));
    }

    if let Some(name) = unresolved.into_iter().next() {
        let line_number = line_numbers.get(&name).copied().unwrap_or(0);
        let missing = context
            .symbols
            .get(&name)
            .and_then(|entry| match &entry.binding {
                crate::symbols::Binding::Unresolved { depends_on } => {
                    Some(depends_on.iter().cloned().collect::<Vec<_>>().join(", "))
                }
                _ => None,
            })
            .unwrap_or_default();
        return Err(Error::UndefinedSymbol(format!("{name} (line {line_number}, needs: {missing})")));
    }

    for name in exprs.keys() {
        context.symbols.mark_constant(name);
    }

    Ok(())
}

fn resolve_symbol_in(name: &str, symbols: &crate::symbols::SymbolTable) -> Option<ResolvedSymbol> {
    match symbols.get(name) {
        Some(crate::symbols::Entry {
            binding: crate::symbols::Binding::Defined { value, is_relative },
            ..
        }) => Some(ResolvedSymbol { value: i64::from(*value), is_relative: *is_relative }),
        _ => None,
    }
}

/// Handle a directive line. Returns `Ok(None)` if `mnemonic` is not a
/// directive (the caller should treat the line as an instruction), otherwise
/// the number of bytes the directive itself emits.
fn handle_directive(
    context: &mut AssemblerContext,
    mnemonic: &str,
    line: &Line,
    line_number: usize,
    pending_constants: &mut Vec<PendingConstant>,
) -> Result<Option<u16>, Error> {
    match mnemonic {
        ".TEXT" => {
            context.sections.switch_to(Section::Text);
            Ok(Some(0))
        }
        ".DATA" => {
            context.sections.switch_to(Section::Data);
            Ok(Some(0))
        }
        ".BSS" => {
            context.sections.switch_to(Section::Bss);
            Ok(Some(0))
        }
        ".SECT" => {
            let name = line
                .operands
                .first()
                .ok_or_else(|| Error::BadDirectiveArguments(".sect".to_string(), line_number))?;
            context.sections.switch_to(Section::Named(unquote(name)));
            Ok(Some(0))
        }
        ".USECT" => {
            let [name, size] = line
                .operands
                .as_slice()
            else {
                return Err(Error::BadDirectiveArguments(".usect".to_string(), line_number));
            };
            let size: u16 = size
                .trim()
                .parse()
                .map_err(|_| Error::BadDirectiveArguments(".usect".to_string(), line_number))?;
            context.sections.reserve(Section::Named(unquote(name)), size);
            Ok(Some(0))
        }
        ".ORG" => {
            let address = line
                .operands
                .first()
                .and_then(|value| crate::lexer::parse_integer_literal(value))
                .ok_or_else(|| Error::BadDirectiveArguments(".org".to_string(), line_number))?;
            context.sections.set_location_counter(address as u16);
            Ok(Some(0))
        }
        ".WORD" => {
            if line.operands.is_empty() {
                return Err(Error::BadDirectiveArguments(".word".to_string(), line_number));
            }
            Ok(Some((line.operands.len() as u16) * 2))
        }
        ".GLOBAL" | ".DEF" => {
            for name in &line.operands {
                context.symbols.declare_global(name);
            }
            Ok(Some(0))
        }
        ".REF" => {
            for name in &line.operands {
                context.symbols.declare_external(name);
            }
            Ok(Some(0))
        }
        ".EQU" | ".SET" => {
            let name = line
                .operands
                .first()
                .ok_or_else(|| Error::BadDirectiveArguments(".equ".to_string(), line_number))?;
            let expr = line
                .operands
                .get(1)
                .ok_or_else(|| Error::BadDirectiveArguments(".equ".to_string(), line_number))?;

            let location_counter = i64::from(context.sections.location_counter());
            match evaluate(expr, location_counter, &|symbol| {
                resolve_symbol_for_expr(symbol, context)
            }) {
                Ok(value) => {
                    context
                        .symbols
                        .define_constant(name, (value.value & 0xFFFF) as u16, value.is_relative)
                        .map_err(|name| Error::DuplicateSymbol(name, line_number))?;
                }
                Err(EvalError::Undefined(_)) => {
                    pending_constants.push(PendingConstant {
                        name: name.clone(),
                        expr: expr.clone(),
                        location_counter,
                        line_number,
                    });
                }
                Err(_) => return Err(Error::BadDirectiveArguments(".equ".to_string(), line_number)),
            }
            Ok(Some(0))
        }
        ".END" => Ok(Some(0)),
        _ => Ok(None),
    }
}

fn resolve_symbol_for_expr(name: &str, context: &AssemblerContext) -> Option<ResolvedSymbol> {
    match context.symbols.get(name) {
        Some(crate::symbols::Entry { binding: crate::symbols::Binding::Defined { value, is_relative }, .. }) => {
            Some(ResolvedSymbol { value: i64::from(*value), is_relative: *is_relative })
        }
        _ => None,
    }
}

fn unquote(text: &str) -> String {
    text.trim_matches('"').to_string()
}

/// The number of bytes an instruction line encodes to, without resolving
/// any symbol it references (spec §4.1's extension-word table only depends
/// on operand syntax, never on whether the symbol is known yet).
fn instruction_size(mnemonic: &str, line: &Line, line_number: usize) -> Result<u16, Error> {
    let (base, _byte_mode) = isa::split_suffix(mnemonic);
    let no_symbols = |_: &str| None;

    match isa::classify(base) {
        Some(Form::DoubleOperand { .. }) => {
            let [src, dst] = line.operands.as_slice() else {
                return Err(Error::BadDirectiveArguments(mnemonic.to_string(), line_number));
            };
            let src = operand::parse(src, &no_symbols)?;
            let dst = operand::parse(dst, &no_symbols)?;
            let mut size = 2;
            if src.has_extension_word() {
                size += 2;
            }
            if dst.has_extension_word() {
                size += 2;
            }
            Ok(size)
        }
        Some(Form::SingleOperand { format }) => {
            let [only] = line.operands.as_slice() else {
                return Err(Error::BadDirectiveArguments(mnemonic.to_string(), line_number));
            };
            if format == 0b101 {
                // CALL always takes a fixed-width 16-bit target.
                return Ok(4);
            }
            let operand = operand::parse(only, &no_symbols)?;
            Ok(if operand.has_extension_word() { 4 } else { 2 })
        }
        Some(Form::Jump { .. }) => Ok(2),
        Some(Form::Reti) | Some(Form::Nop) => Ok(2),
        None => Err(Error::BadDirectiveArguments(mnemonic.to_string(), line_number)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass1_sizes_and_binds_labels() {
        let mut context = AssemblerContext::default();
        let source = "START: MOV #4, R5\n\tJMP START\n";
        let prepared = run(&mut context, source).unwrap();

        assert!(context.symbols.is_defined("START"));
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].offset, 0);
        assert_eq!(prepared[1].offset, 4);
    }

    #[test]
    fn test_pass1_rejects_duplicate_label() {
        let mut context = AssemblerContext::default();
        let source = "START: NOP\nSTART: NOP\n";
        assert!(run(&mut context, source).is_err());
    }

    #[test]
    fn test_equ_with_forward_reference_resolves_by_end_of_pass() {
        let mut context = AssemblerContext::default();
        let source = "\t.equ LEN, END-START\nSTART: NOP\nEND: NOP\n";
        run(&mut context, source).unwrap();
        assert!(context.symbols.is_defined("LEN"));
    }
}
