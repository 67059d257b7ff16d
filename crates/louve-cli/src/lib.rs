//! louve-cli — Interface en ligne de commande du langage Louve
//!
//! Trois modes :
//! - `louve run script.lv`    : compile et exécute un fichier ;
//! - `louve disasm script.lv` : compile et affiche le bytecode désassemblé ;
//! - `louve` (sans argument)  : REPL, une instruction par ligne, les
//!   globales survivent d'une ligne à l'autre.
//!
//! Codes de sortie du mode `run`, hérités du driver historique :
//! 65 erreur de compilation, 70 erreur runtime, 74 erreur d'E/S.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]

use std::io::{self, BufRead, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;

use louve_core::bytecode::disasm;
use louve_core::heap::Heap;
use louve_core::table::Table;
use louve_vm::{InterpretResult, Vm};

const EX_DATAERR: u8 = 65;
const EX_SOFTWARE: u8 = 70;
const EX_IOERR: u8 = 74;

#[derive(Parser)]
#[command(name = "louve", version, about = "Le langage de script Louve")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Compile et exécute un script `.lv`
    Run { script: PathBuf },
    /// Compile un script et affiche son bytecode désassemblé
    Disasm { script: PathBuf },
    /// Lance la boucle interactive (défaut sans argument)
    Repl,
}

/// Cœur du CLI, séparé de `main` pour rester testable.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::Run { script }) => run_file(&script),
        Some(Command::Disasm { script }) => disasm_file(&script),
        Some(Command::Repl) | None => repl(),
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("impossible de lire {}", path.display()))
}

fn run_file(path: &Path) -> Result<ExitCode> {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("louve: {err:#}");
            return Ok(ExitCode::from(EX_IOERR));
        }
    };

    debug!("exécution de {}", path.display());
    let mut vm = Vm::new();
    let code = match vm.interpret(&source) {
        InterpretResult::Ok => ExitCode::SUCCESS,
        InterpretResult::CompileError => ExitCode::from(EX_DATAERR),
        InterpretResult::RuntimeError => ExitCode::from(EX_SOFTWARE),
    };
    Ok(code)
}

fn disasm_file(path: &Path) -> Result<ExitCode> {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("louve: {err:#}");
            return Ok(ExitCode::from(EX_IOERR));
        }
    };

    let mut heap = Heap::new();
    let mut strings = Table::new();
    match louve_compiler::compile(&source, &mut heap, &mut strings) {
        Ok(chunk) => {
            let title = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            print!("{}", disasm::disassemble(&chunk, &heap, &title));
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => Ok(ExitCode::from(EX_DATAERR)),
    }
}

/// Boucle interactive : une VM unique, les définitions persistent.
fn repl() -> Result<ExitCode> {
    let mut vm = Vm::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF (Ctrl-D)
            println!();
            return Ok(ExitCode::SUCCESS);
        }
        if line.trim().is_empty() {
            continue;
        }

        // Les erreurs sont déjà rapportées sur stderr ; le REPL continue.
        let _ = vm.interpret(&line);
    }
}
