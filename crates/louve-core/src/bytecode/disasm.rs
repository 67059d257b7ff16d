//! disasm.rs — Désassembleur "lisible humain" pour le bytecode Louve.
//!
//! Une ligne par instruction : offset, ligne source (`|` si identique à
//! l'instruction précédente), mnémonique, opérande, et un aperçu de la
//! constante résolue quand l'opérande en désigne une.
//!
//! Le désassembleur est robuste : opcode inconnu et opérande tronqué sont
//! signalés sans paniquer.

use std::fmt::Write as _;

use crate::heap::{Heap, Obj};
use crate::value::Value;

use super::chunk::{u24_from_bytes, Chunk};
use super::op::{Op, Operand};

/// Désassemble un chunk entier sous un titre.
pub fn disassemble(chunk: &Chunk, heap: &Heap, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");
    let mut offset = 0;
    while offset < chunk.code.len() {
        let (line, next) = instruction(chunk, heap, offset);
        out.push_str(&line);
        out.push('\n');
        offset = next;
    }
    out
}

/// Désassemble l'instruction à `offset`. Retourne la ligne produite et
/// l'offset de l'instruction suivante.
pub fn instruction(chunk: &Chunk, heap: &Heap, offset: usize) -> (String, usize) {
    let mut s = String::new();
    let _ = write!(s, "{offset:04} ");

    let line = chunk.get_line(offset);
    if offset > 0 && line == chunk.get_line(offset - 1) {
        s.push_str("   | ");
    } else {
        let _ = write!(s, "{line:4} ");
    }

    let byte = chunk.code[offset];
    let Ok(op) = Op::try_from(byte) else {
        let _ = write!(s, "Unknown opcode {byte}");
        return (s, offset + 1);
    };

    let operand = op.operand();
    if chunk.code.len() < offset + op.size() {
        let _ = write!(s, "{:<7} <truncated>", op.mnemonic());
        return (s, chunk.code.len());
    }

    match operand {
        Operand::None => {
            let _ = write!(s, "{}", op.mnemonic());
        }
        Operand::Const | Operand::ConstLong => {
            let ix = read_index(chunk, offset, operand);
            let _ = write!(s, "{:<7} {ix:4} ; {}", op.mnemonic(), const_preview(chunk, heap, ix));
        }
        Operand::Slot | Operand::SlotLong => {
            let ix = read_index(chunk, offset, operand);
            let _ = write!(s, "{:<7} {ix:4}", op.mnemonic());
        }
        Operand::Jump => {
            let jump = u16::from_le_bytes([chunk.code[offset + 1], chunk.code[offset + 2]]);
            let after = offset + op.size();
            let target = if op.is_backward_jump() {
                after.wrapping_sub(jump as usize)
            } else {
                after + jump as usize
            };
            let _ = write!(s, "{:<7} {jump:4} -> {target:04}", op.mnemonic());
        }
    }

    (s, offset + op.size())
}

fn read_index(chunk: &Chunk, offset: usize, operand: Operand) -> u32 {
    match operand {
        Operand::Const | Operand::Slot => u32::from(chunk.code[offset + 1]),
        _ => u24_from_bytes(
            chunk.code[offset + 1],
            chunk.code[offset + 2],
            chunk.code[offset + 3],
        ),
    }
}

fn const_preview(chunk: &Chunk, heap: &Heap, ix: u32) -> String {
    match chunk.constants.get(ix as usize) {
        Some(Value::Obj(r)) => match heap.get(*r) {
            Obj::Str(s) => format!("\"{}\"", shorten(&s.text, 40)),
        },
        Some(v) => v.display(heap).to_string(),
        None => "<invalid>".into(),
    }
}

fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}…")
    }
}

/* ------------------------------- Tests ------------------------------- */
#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::copy_string;
    use crate::table::Table;

    #[test]
    fn lists_instructions_with_line_markers() {
        let heap = Heap::new();
        let mut c = Chunk::new();
        c.write_constant(&heap, Value::Int(42), 1).unwrap();
        c.write_op(Op::Negate, 1);
        c.write_op(Op::Return, 2);

        let text = disassemble(&c, &heap, "test");
        assert!(text.starts_with("== test ==\n"));
        assert!(text.contains("0000    1 ldc"));
        assert!(text.contains("42"));
        // Même ligne source que l'instruction précédente.
        assert!(text.contains("   | neg"));
        assert!(text.contains("   2 ret"));
    }

    #[test]
    fn string_constants_are_quoted() {
        let mut heap = Heap::new();
        let mut strings = Table::new();
        let s = copy_string(&mut heap, &mut strings, "salut");
        let mut c = Chunk::new();
        c.write_constant(&heap, Value::Obj(s), 1).unwrap();

        let text = disassemble(&c, &heap, "s");
        assert!(text.contains("\"salut\""));
    }

    #[test]
    fn jumps_show_their_target() {
        let heap = Heap::new();
        let mut c = Chunk::new();
        c.write_op(Op::JumpIfFalse, 1);
        c.write(4, 1);
        c.write(0, 1);
        c.write_op(Op::Pop, 1);

        let (line, next) = instruction(&c, &heap, 0);
        assert_eq!(next, 3);
        assert!(line.contains("jz"));
        assert!(line.contains("-> 0007"));
    }

    #[test]
    fn unknown_opcode_does_not_panic() {
        let heap = Heap::new();
        let mut c = Chunk::new();
        c.write(0xEE, 1);
        let (line, next) = instruction(&c, &heap, 0);
        assert!(line.contains("Unknown opcode 238"));
        assert_eq!(next, 1);
    }

    #[test]
    fn truncated_operand_is_reported() {
        let heap = Heap::new();
        let mut c = Chunk::new();
        c.write_op(Op::Constant, 1); // opérande manquant
        let (line, next) = instruction(&c, &heap, 0);
        assert!(line.contains("<truncated>"));
        assert_eq!(next, 1);
    }
}
