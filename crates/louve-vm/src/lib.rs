//! louve-vm — Machine virtuelle à pile du langage Louve
//!
//! Le type [`Vm`] possède tout l'état persistant du runtime : le tas
//! d'objets, la table d'internement des chaînes, les deux tables de
//! globales (mutables et `const`) et la pile de valeurs. Chaque appel à
//! [`Vm::interpret`] compile la source dans un chunk éphémère, l'exécute,
//! puis le libère ; tas, internement et globales survivent d'un appel à
//! l'autre, ce qui donne sa mémoire au REPL.
//!
//! Plusieurs VM indépendantes peuvent coexister : aucun état global.
//!
//! La boucle de dispatch lit un opcode par itération et manipule la pile ;
//! les offsets de saut sont en octets, little-endian. Une erreur runtime
//! écrit son message puis `[line N] in script` sur stderr, vide la pile et
//! interrompt l'exécution.
//!
//! Tracé d'exécution : au niveau `trace` du crate `log`, chaque pas écrit
//! l'état de la pile et l'instruction désassemblée (`RUST_LOG=trace`).

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]

use std::fmt::Write as _;

use log::{log_enabled, trace};
use thiserror::Error;

use louve_compiler::compile;
use louve_core::bytecode::chunk::u24_from_bytes;
use louve_core::bytecode::disasm;
use louve_core::heap::{take_string, Heap};
use louve_core::table::Table;
use louve_core::value::Value;
use louve_core::{Chunk, Op};

/// Capacité initiale de la pile de valeurs ; elle croît ensuite par
/// doublement.
const STACK_DEFAULT: usize = 256;

/// Issue d'un appel à [`Vm::interpret`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

/// Erreurs levées par la boucle d'exécution. Les messages destinés à
/// l'utilisateur suivent la forme historique ; les variantes en minuscules
/// signalent un bytecode incohérent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Operands must be numbers.")]
    NumberOperands,
    #[error("Operand must be a number.")]
    NumberOperand,
    #[error("Operands must be two numbers or two strings.")]
    AddOperands,
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Cannot assign to const variable '{0}'.")]
    ConstAssignment(String),
    #[error("Integer division by zero.")]
    IntegerDivisionByZero,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("bad constant index {0}")]
    BadConstant(usize),
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
    #[error("jump out of range")]
    BadJump,
}

/// Destination des écritures de `print`.
enum Output {
    Stdout,
    Capture(String),
}

enum Flow {
    Continue,
    Return,
}

pub struct Vm {
    heap: Heap,
    strings: Table,
    globals: Table,
    const_globals: Table,
    stack: Vec<Value>,
    output: Output,
    last_error: Option<String>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Vm {
            heap: Heap::new(),
            strings: Table::new(),
            globals: Table::new(),
            const_globals: Table::new(),
            stack: Vec::with_capacity(STACK_DEFAULT),
            output: Output::Stdout,
            last_error: None,
        }
    }

    /// VM dont les `print` sont capturés au lieu d'aller sur stdout.
    /// Récupérer le texte avec [`Vm::take_output`].
    pub fn with_captured_output() -> Self {
        Vm { output: Output::Capture(String::new()), ..Self::new() }
    }

    /// Vide et retourne la sortie capturée. Chaîne vide en mode stdout.
    pub fn take_output(&mut self) -> String {
        match &mut self.output {
            Output::Stdout => String::new(),
            Output::Capture(buf) => std::mem::take(buf),
        }
    }

    /// Message de la dernière erreur runtime, tel qu'écrit sur stderr.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Point d'entrée unique : compile puis exécute `source`. Le chunk vit
    /// le temps de cet appel ; les globales et les chaînes internées
    /// survivent.
    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        let chunk = match compile(source, &mut self.heap, &mut self.strings) {
            Ok(chunk) => chunk,
            Err(_) => return InterpretResult::CompileError,
        };

        match self.run(&chunk) {
            Ok(()) => InterpretResult::Ok,
            Err((error, offset)) => {
                self.runtime_error(&chunk, &error, offset);
                InterpretResult::RuntimeError
            }
        }
    }

    fn runtime_error(&mut self, chunk: &Chunk, error: &RuntimeError, offset: usize) {
        let message = format!("{error}");
        eprintln!("{message}");
        eprintln!("[line {}] in script", chunk.get_line(offset));
        self.last_error = Some(message);
        self.stack.clear();
    }

    fn run(&mut self, chunk: &Chunk) -> Result<(), (RuntimeError, usize)> {
        let mut ip = 0usize;
        loop {
            if log_enabled!(log::Level::Trace) {
                let mut line = String::from("          ");
                for value in &self.stack {
                    let _ = write!(line, "[ {} ]", value.display(&self.heap));
                }
                trace!("{line}");
                let (text, _) = disasm::instruction(chunk, &self.heap, ip);
                trace!("{text}");
            }

            let op_offset = ip;
            match self.step(chunk, &mut ip) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Return) => return Ok(()),
                Err(error) => return Err((error, op_offset)),
            }
        }
    }

    fn step(&mut self, chunk: &Chunk, ip: &mut usize) -> Result<Flow, RuntimeError> {
        let byte = read_byte(&chunk.code, ip);
        let op = Op::try_from(byte).map_err(|_| RuntimeError::UnknownOpcode(byte))?;

        match op {
            Op::Constant => {
                let ix = read_byte(&chunk.code, ip) as usize;
                let value = self.constant(chunk, ix)?;
                self.push(value);
            }
            Op::ConstantLong => {
                let ix = read_u24(&chunk.code, ip);
                let value = self.constant(chunk, ix)?;
                self.push(value);
            }
            Op::Nil => self.push(Value::Nil),
            Op::True => self.push(Value::Bool(true)),
            Op::False => self.push(Value::Bool(false)),
            Op::Pop => {
                self.pop()?;
            }

            Op::Equal => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(Value::Bool(a == b));
            }
            Op::Greater => {
                let (a, b) = self.pop_pair()?;
                let result = match (a, b) {
                    (Value::Int(x), Value::Int(y)) => x > y,
                    _ => {
                        let (x, y) = number_pair(a, b).ok_or(RuntimeError::NumberOperands)?;
                        x > y
                    }
                };
                self.push(Value::Bool(result));
            }
            Op::Less => {
                let (a, b) = self.pop_pair()?;
                let result = match (a, b) {
                    (Value::Int(x), Value::Int(y)) => x < y,
                    _ => {
                        let (x, y) = number_pair(a, b).ok_or(RuntimeError::NumberOperands)?;
                        x < y
                    }
                };
                self.push(Value::Bool(result));
            }

            Op::Add => {
                let (a, b) = self.pop_pair()?;
                match (a, b) {
                    (Value::Obj(ra), Value::Obj(rb)) => {
                        let mut text = String::with_capacity(
                            self.heap.string(ra).text.len() + self.heap.string(rb).text.len(),
                        );
                        text.push_str(&self.heap.string(ra).text);
                        text.push_str(&self.heap.string(rb).text);
                        let r = take_string(&mut self.heap, &mut self.strings, text);
                        self.push(Value::Obj(r));
                    }
                    (Value::Int(x), Value::Int(y)) => self.push(Value::Int(x.wrapping_add(y))),
                    _ => {
                        let (x, y) = number_pair(a, b).ok_or(RuntimeError::AddOperands)?;
                        self.push(Value::Float(x + y));
                    }
                }
            }
            Op::Subtract => {
                let value = self.arithmetic(i64::wrapping_sub, |x, y| x - y)?;
                self.push(value);
            }
            Op::Multiply => {
                let value = self.arithmetic(i64::wrapping_mul, |x, y| x * y)?;
                self.push(value);
            }
            Op::Divide => {
                let (a, b) = self.pop_pair()?;
                match (a, b) {
                    (Value::Int(x), Value::Int(y)) => {
                        if y == 0 {
                            return Err(RuntimeError::IntegerDivisionByZero);
                        }
                        self.push(Value::Int(x.wrapping_div(y)));
                    }
                    _ => {
                        // La division flottante par zéro suit IEEE-754.
                        let (x, y) = number_pair(a, b).ok_or(RuntimeError::NumberOperands)?;
                        self.push(Value::Float(x / y));
                    }
                }
            }

            Op::Not => {
                let value = self.pop()?;
                self.push(Value::Bool(value.is_falsy()));
            }
            Op::Negate => match self.pop()? {
                Value::Int(i) => self.push(Value::Int(i.wrapping_neg())),
                Value::Float(x) => self.push(Value::Float(-x)),
                _ => return Err(RuntimeError::NumberOperand),
            },

            Op::Print => {
                let value = self.pop()?;
                let text = value.display(&self.heap).to_string();
                self.write_line(&text);
            }

            Op::DefineGlobal | Op::DefineGlobalLong
            | Op::DefineGlobalConst | Op::DefineGlobalConstLong => {
                let ix = match op {
                    Op::DefineGlobal | Op::DefineGlobalConst => {
                        read_byte(&chunk.code, ip) as usize
                    }
                    _ => read_u24(&chunk.code, ip),
                };
                let name = self.constant(chunk, ix)?;
                let value = self.peek(0)?;
                self.globals.set(&self.heap, name, value);
                if matches!(op, Op::DefineGlobalConst | Op::DefineGlobalConstLong) {
                    self.const_globals.set(&self.heap, name, Value::Nil);
                }
                self.pop()?;
            }
            Op::GetGlobal | Op::GetGlobalLong => {
                let ix = if op == Op::GetGlobal {
                    read_byte(&chunk.code, ip) as usize
                } else {
                    read_u24(&chunk.code, ip)
                };
                let name = self.constant(chunk, ix)?;
                match self.globals.get(&self.heap, name) {
                    Some(value) => self.push(value),
                    None => return Err(RuntimeError::UndefinedVariable(self.name_text(name))),
                }
            }
            Op::SetGlobal | Op::SetGlobalLong => {
                let ix = if op == Op::SetGlobal {
                    read_byte(&chunk.code, ip) as usize
                } else {
                    read_u24(&chunk.code, ip)
                };
                let name = self.constant(chunk, ix)?;
                if self.const_globals.get(&self.heap, name).is_some() {
                    return Err(RuntimeError::ConstAssignment(self.name_text(name)));
                }
                let value = self.peek(0)?;
                if self.globals.set(&self.heap, name, value) {
                    // L'affectation exige une variable déjà définie : on
                    // retire l'entrée parasite avant de signaler l'erreur.
                    self.globals.delete(&self.heap, name);
                    return Err(RuntimeError::UndefinedVariable(self.name_text(name)));
                }
            }

            Op::GetLocal | Op::GetLocalLong => {
                let slot = if op == Op::GetLocal {
                    read_byte(&chunk.code, ip) as usize
                } else {
                    read_u24(&chunk.code, ip)
                };
                let value = *self.stack.get(slot).ok_or(RuntimeError::StackUnderflow)?;
                self.push(value);
            }
            Op::SetLocal | Op::SetLocalLong => {
                let slot = if op == Op::SetLocal {
                    read_byte(&chunk.code, ip) as usize
                } else {
                    read_u24(&chunk.code, ip)
                };
                let value = self.peek(0)?;
                match self.stack.get_mut(slot) {
                    Some(cell) => *cell = value,
                    None => return Err(RuntimeError::StackUnderflow),
                }
            }

            Op::Jump => {
                let offset = read_u16(&chunk.code, ip) as usize;
                *ip += offset;
            }
            Op::JumpIfFalse => {
                let offset = read_u16(&chunk.code, ip) as usize;
                if self.peek(0)?.is_falsy() {
                    *ip += offset;
                }
            }
            Op::Loop => {
                let offset = read_u16(&chunk.code, ip) as usize;
                *ip = ip.checked_sub(offset).ok_or(RuntimeError::BadJump)?;
            }

            Op::Return => return Ok(Flow::Return),
        }

        Ok(Flow::Continue)
    }

    /* ───────────────────── Pile & helpers ───────────────────── */

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Dépile l'opérande droit puis le gauche.
    fn pop_pair(&mut self) -> Result<(Value, Value), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        Ok((a, b))
    }

    fn peek(&self, distance: usize) -> Result<Value, RuntimeError> {
        self.stack
            .len()
            .checked_sub(1 + distance)
            .map(|i| self.stack[i])
            .ok_or(RuntimeError::StackUnderflow)
    }

    fn constant(&self, chunk: &Chunk, ix: usize) -> Result<Value, RuntimeError> {
        chunk.constants.get(ix).copied().ok_or(RuntimeError::BadConstant(ix))
    }

    /// Arithmétique binaire hors addition : Int×Int reste Int (arithmétique
    /// modulaire), tout mélange est promu en Float.
    fn arithmetic(
        &mut self,
        int_op: fn(i64, i64) -> i64,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Value, RuntimeError> {
        let (a, b) = self.pop_pair()?;
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(x, y))),
            _ => {
                let (x, y) = number_pair(a, b).ok_or(RuntimeError::NumberOperands)?;
                Ok(Value::Float(float_op(x, y)))
            }
        }
    }

    fn name_text(&self, name: Value) -> String {
        name.display(&self.heap).to_string()
    }

    fn write_line(&mut self, text: &str) {
        match &mut self.output {
            Output::Stdout => println!("{text}"),
            Output::Capture(buf) => {
                buf.push_str(text);
                buf.push('\n');
            }
        }
    }
}

/// Promotion numérique des deux opérandes, `None` si l'un n'est pas un
/// nombre.
fn number_pair(a: Value, b: Value) -> Option<(f64, f64)> {
    Some((a.as_number()?, b.as_number()?))
}

/* ───────────────────── Lecture du flot d'octets ───────────────────── */

fn read_byte(code: &[u8], ip: &mut usize) -> u8 {
    let byte = code[*ip];
    *ip += 1;
    byte
}

fn read_u16(code: &[u8], ip: &mut usize) -> u16 {
    let value = u16::from_le_bytes([code[*ip], code[*ip + 1]]);
    *ip += 2;
    value
}

fn read_u24(code: &[u8], ip: &mut usize) -> usize {
    let value = u24_from_bytes(code[*ip], code[*ip + 1], code[*ip + 2]);
    *ip += 3;
    value as usize
}

/* ------------------------------- Tests ------------------------------- */
