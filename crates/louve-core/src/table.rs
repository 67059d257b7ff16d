//! table.rs — Table de hachage à adressage ouvert, clés `Value`.
//!
//! - Sondage linéaire, facteur de charge 0.75, suppression par pierre
//!   tombale.
//! - Deux compteurs : `count` (entrées vivantes) et `capacity_count`
//!   (vivantes + tombales) ; c'est ce dernier qui déclenche la croissance.
//! - Le sondage traverse les tombales ; seule une case absente dont la
//!   valeur est `Nil` (vraiment vide) termine une recherche infructueuse.
//! - Le hachage d'une clé `Obj` lit le hash mémorisé de la chaîne, d'où le
//!   paramètre `&Heap` sur chaque opération.
//!
//! Utilisée pour l'internement des chaînes (`find_string`), les tables de
//! globales de la VM et le cache de constantes du `Chunk`.

use crate::heap::{Heap, ObjRef};
use crate::value::Value;

const MAX_LOAD_NUM: usize = 3;
const MAX_LOAD_DEN: usize = 4;

#[derive(Debug, Clone, Copy)]
struct Entry {
    present: bool,
    key: Value,
    value: Value,
}

impl Entry {
    const EMPTY: Entry = Entry { present: false, key: Value::Nil, value: Value::Nil };

    // Une tombale : absente, mais sa valeur non-Nil ne termine pas le sondage.
    const TOMBSTONE: Entry = Entry { present: false, key: Value::Nil, value: Value::Bool(true) };

    fn is_truly_empty(&self) -> bool {
        !self.present && matches!(self.value, Value::Nil)
    }
}

#[derive(Debug, Default)]
pub struct Table {
    count: usize,
    capacity_count: usize,
    entries: Vec<Entry>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nombre d'entrées vivantes.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Recherche une clé. `None` si absente.
    pub fn get(&self, heap: &Heap, key: Value) -> Option<Value> {
        if self.count == 0 {
            return None;
        }
        let entry = &self.entries[find_slot(&self.entries, heap, key)];
        if entry.present {
            Some(entry.value)
        } else {
            None
        }
    }

    /// Insère ou remplace. Retourne `true` si la clé est nouvelle.
    pub fn set(&mut self, heap: &Heap, key: Value, value: Value) -> bool {
        if self.capacity_count + 1 > self.entries.len() * MAX_LOAD_NUM / MAX_LOAD_DEN {
            self.grow(heap);
        }

        let slot = find_slot(&self.entries, heap, key);
        let entry = &mut self.entries[slot];
        let is_new = !entry.present;
        if is_new {
            self.count += 1;
            // Réutiliser une tombale ne consomme pas de capacité.
            if matches!(entry.value, Value::Nil) {
                self.capacity_count += 1;
            }
        }
        entry.present = true;
        entry.key = key;
        entry.value = value;
        is_new
    }

    /// Supprime une clé en la remplaçant par une tombale. Seul `count`
    /// décroît : la tombale occupe toujours de la capacité.
    pub fn delete(&mut self, heap: &Heap, key: Value) -> bool {
        if self.count == 0 {
            return false;
        }
        let slot = find_slot(&self.entries, heap, key);
        let entry = &mut self.entries[slot];
        if !entry.present {
            return false;
        }
        self.count -= 1;
        *entry = Entry::TOMBSTONE;
        true
    }

    /// Sondage spécialisé pour l'internement : contourne l'égalité générale
    /// et compare par longueur, hash et contenu. À n'utiliser que sur une
    /// table dont toutes les clés sont des chaînes.
    pub fn find_string(&self, heap: &Heap, text: &str, hash: u32) -> Option<ObjRef> {
        if self.count == 0 {
            return None;
        }
        let capacity = self.entries.len();
        let mut index = hash as usize % capacity;
        loop {
            let entry = &self.entries[index];
            if !entry.present {
                if entry.is_truly_empty() {
                    return None;
                }
            } else if let Value::Obj(r) = entry.key {
                let s = heap.string(r);
                if s.hash == hash && s.text.len() == text.len() && s.text == text {
                    return Some(r);
                }
            }
            index = (index + 1) % capacity;
        }
    }

    /// Croissance : capacité max(8, 2×), re-hachage de toutes les entrées
    /// présentes, les tombales sont abandonnées au passage.
    fn grow(&mut self, heap: &Heap) {
        let capacity = (self.entries.len() * 2).max(8);
        let mut entries = vec![Entry::EMPTY; capacity];

        let mut live = 0;
        for entry in &self.entries {
            if !entry.present {
                continue;
            }
            let slot = find_slot(&entries, heap, entry.key);
            entries[slot] = *entry;
            live += 1;
        }

        self.entries = entries;
        self.count = live;
        self.capacity_count = live;
    }
}

/// Sonde à partir de `hash(key) % capacité` jusqu'à une clé égale ou une
/// case vraiment vide ; retourne la première tombale rencontrée si la clé
/// est absente. Précondition : `entries` n'est pas vide.
fn find_slot(entries: &[Entry], heap: &Heap, key: Value) -> usize {
    let capacity = entries.len();
    let mut index = key.hash(heap) as usize % capacity;
    let mut tombstone: Option<usize> = None;
    loop {
        let entry = &entries[index];
        if !entry.present {
            if entry.is_truly_empty() {
                return tombstone.unwrap_or(index);
            }
            if tombstone.is_none() {
                tombstone = Some(index);
            }
        } else if entry.key == key {
            return index;
        }
        index = (index + 1) % capacity;
    }
}

/* ------------------------------- Tests ------------------------------- */
