//! heap.rs — Tas d'objets de la VM Louve.
//!
//! L'arène remplace la liste chaînée intrusive du modèle C : chaque
//! allocation est un push dans un `Vec<Obj>`, une référence est un index
//! ([`ObjRef`]), et la libération en bloc est le drop de l'arène. Aucune
//! libération individuelle pendant l'exécution.
//!
//! Les points d'entrée d'internement [`copy_string`] / [`take_string`]
//! garantissent l'invariant : au plus un objet par contenu de chaîne.

use crate::table::Table;
use crate::value::{fnv1a, Value};

/// Référence d'objet : un index dans l'arène de la VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjRef(u32);

/// Une chaîne possédée par le tas, avec son hachage pré-calculé.
#[derive(Debug)]
pub struct StrObj {
    pub text: String,
    pub hash: u32,
}

/// Les sortes d'objets alloués sur le tas. Le cœur n'en utilise qu'une.
#[derive(Debug)]
pub enum Obj {
    Str(StrObj),
}

/// L'arène d'objets. Possédée exclusivement par la VM ; le compilateur
/// l'emprunte le temps d'une compilation pour interner littéraux et
/// identifiants.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Obj>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alloue un objet et retourne sa référence. Équivalent du push en
    /// tête de la free-list du modèle C.
    pub fn alloc(&mut self, obj: Obj) -> ObjRef {
        let r = ObjRef(self.objects.len() as u32);
        self.objects.push(obj);
        r
    }

    pub fn get(&self, r: ObjRef) -> &Obj {
        &self.objects[r.0 as usize]
    }

    /// Accès direct à une chaîne du tas.
    pub fn string(&self, r: ObjRef) -> &StrObj {
        match self.get(r) {
            Obj::Str(s) => s,
        }
    }

    /// Nombre d'objets vivants (tout objet alloué vit jusqu'au teardown).
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Interne une chaîne empruntée : si un objet de même contenu existe déjà
/// dans `strings`, retourne sa référence, sinon copie dans le tas et
/// enregistre la nouvelle entrée.
pub fn copy_string(heap: &mut Heap, strings: &mut Table, text: &str) -> ObjRef {
    let hash = fnv1a(text.as_bytes());
    if let Some(r) = strings.find_string(heap, text, hash) {
        return r;
    }
    intern_new(heap, strings, text.to_owned(), hash)
}

/// Interne une chaîne possédée (résultat de concaténation) : adopte le
/// tampon, sauf si un objet égal existe déjà, auquel cas le tampon est
/// simplement abandonné.
pub fn take_string(heap: &mut Heap, strings: &mut Table, text: String) -> ObjRef {
    let hash = fnv1a(text.as_bytes());
    if let Some(r) = strings.find_string(heap, &text, hash) {
        return r;
    }
    intern_new(heap, strings, text, hash)
}

fn intern_new(heap: &mut Heap, strings: &mut Table, text: String, hash: u32) -> ObjRef {
    let r = heap.alloc(Obj::Str(StrObj { text, hash }));
    strings.set(heap, Value::Obj(r), Value::Nil);
    r
}

/* ------------------------------- Tests ------------------------------- */
