//! louve-core — Cœur du langage Louve
//!
//! Contient tout ce qu'il faut pour représenter et manipuler le bytecode
//! Louve, sans dépendre du compilateur ni de la VM.
//!
//! ## Modules
//! - `value`    : valeurs dynamiques (`Value`), égalité, hachage FNV-1a.
//! - `heap`     : arène d'objets (`Heap`, `ObjRef`), internement des chaînes.
//! - `table`    : table de hachage à adressage ouvert, clés `Value`.
//! - `bytecode` : format `Chunk`, opcodes `Op`, désassembleur.
//!
//! La propriété clé du modèle mémoire : toutes les chaînes sont internées
//! dans une table possédée par la VM, donc l'égalité d'objets est une
//! égalité de références (`ObjRef`).

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]

pub mod bytecode;
pub mod heap;
pub mod table;
pub mod value;

// ---------- Reexports de confort ----------
pub use bytecode::{chunk::Chunk, op::Op};
pub use heap::{copy_string, take_string, Heap, Obj, ObjRef, StrObj};
pub use table::Table;
pub use value::Value;
