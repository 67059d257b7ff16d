//! louve-compiler — Frontend du langage Louve
//!
//! Chaîne `source → tokens → bytecode` en une seule passe :
//! - [`scanner`] : lexer au niveau octet, paresseux, deux caractères
//!   d'avance, reconnaissance des mots-clés par trie manuel ;
//! - [`compiler`] : parseur Pratt pour les expressions, parseur de
//!   déclarations/instructions, résolution des portées lexicales, émission
//!   directe dans un [`louve_core::Chunk`] (pas d'AST intermédiaire).
//!
//! Le compilateur emprunte le tas et la table d'internement de la VM le
//! temps d'une compilation, pour que les littéraux chaîne et les noms de
//! variables soient internés comme toute autre chaîne du runtime.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]

pub mod compiler;
pub mod scanner;

pub use compiler::{compile, CompileError};
pub use scanner::{Scanner, Token, TokenKind};
