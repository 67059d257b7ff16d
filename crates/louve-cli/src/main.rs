//! louve-cli/src/main.rs
//!
//! Point d'entrée du binaire `louve`.
//! Ici, on se contente de préparer l'environnement (logs) puis on délègue
//! toute la logique à `louve_cli::run()`.
//!
//! Avantages :
//! - `lib.rs` peut être testé en unité (cargo test -p louve-cli)
//! - main.rs reste minimal, juste pour le setup global

use std::process::ExitCode;

fn main() -> ExitCode {
    // Activer les logs si RUST_LOG est défini (RUST_LOG=trace pour suivre
    // l'exécution instruction par instruction).
    env_logger::init();

    match louve_cli::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("louve: {err:#}");
            ExitCode::FAILURE
        }
    }
}
