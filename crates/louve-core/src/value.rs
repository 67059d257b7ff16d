//! value.rs — Valeurs dynamiques du langage Louve.
//!
//! - Somme étiquetée : nil, booléen, flottant, entier, référence d'objet.
//! - Égalité structurelle, avec promotion Int/Float en f64 entre variantes.
//! - Hachage FNV-1a 32 bits, total sur toutes les variantes (requis par la
//!   table à adressage ouvert : on ne s'appuie sur aucun `Hash` dérivé).
//! - Affichage via [`Value::display`], qui résout les chaînes dans le tas.

use std::fmt;

use crate::heap::{Heap, Obj, ObjRef};

/// Une valeur au runtime. `Copy` : une référence d'objet est un index
/// dans le tas, pas une possession.
#[derive(Debug, Clone, Copy)]
pub enum Value {
    Nil,
    Bool(bool),
    Float(f64),
    Int(i64),
    Obj(ObjRef),
}

impl Value {
    /// `nil` et `false` sont faux, tout le reste est vrai.
    pub fn is_falsy(&self) -> bool {
        matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Promotion numérique : `Some(f64)` pour Int et Float, `None` sinon.
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Value::Float(x) => Some(x),
            Value::Int(i) => Some(i as f64),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Float(_) | Value::Int(_))
    }

    /// Hachage total. Les chaînes utilisent leur hash pré-calculé, les
    /// autres objets hachent leurs bits d'adresse (index d'arène).
    pub fn hash(&self, heap: &Heap) -> u32 {
        match *self {
            Value::Nil => HASH_NIL,
            Value::Bool(true) => HASH_TRUE,
            Value::Bool(false) => HASH_FALSE,
            Value::Int(i) => fnv1a(&i.to_le_bytes()),
            Value::Float(x) => hash_u64(x.to_bits() ^ (HASH_NIL as u64 + 1)),
            Value::Obj(r) => match heap.get(r) {
                Obj::Str(s) => s.hash,
            },
        }
    }

    /// Adaptateur d'affichage : résout les références de chaîne dans `heap`.
    pub fn display<'h>(&self, heap: &'h Heap) -> DisplayValue<'h> {
        DisplayValue { value: *self, heap }
    }
}

/// Égalité structurelle. Entre variantes le résultat est `false`, sauf
/// Int/Float qui se comparent après promotion en f64. L'égalité d'objets
/// est une égalité de références, valide parce que les chaînes sont
/// internées.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Obj(a), Value::Obj(b)) => a == b,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

/// Affiche une valeur sous sa forme source : `nil`, `true`/`false`,
/// décimal signé pour les entiers, plus-court-aller-retour pour les
/// flottants, octets bruts (sans guillemets) pour les chaînes.
pub struct DisplayValue<'h> {
    value: Value,
    heap: &'h Heap,
}

impl fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Obj(r) => match self.heap.get(r) {
                Obj::Str(s) => f.write_str(&s.text),
            },
        }
    }
}

/* ───────────────────────── Hachage FNV-1a ───────────────────────── */

const FNV_OFFSET: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

/// FNV-1a 32 bits sur une tranche d'octets.
pub(crate) const fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

const fn hash_u64(x: u64) -> u32 {
    fnv1a(&x.to_le_bytes())
}

// Trois constantes distinctes et stables, dérivées du hachage de petites
// sentinelles. Certaines variantes historiques échangeaient true et false ;
// ici true hache la sentinelle de true.
const HASH_NIL: u32 = hash_u64(hash_u64(0) as u64 + 1);
const HASH_FALSE: u32 = hash_u64(hash_u64(1) as u64 + 1);
const HASH_TRUE: u32 = hash_u64(hash_u64(2) as u64 + 1);

/* ------------------------------- Tests ------------------------------- */
