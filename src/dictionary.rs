// File: src/dictionary.rs
//
// The VM's two name tables: user-defined blocks and host-installed native
// functions, both keyed by a 64-bit hash of the word text. The maps use
// `nohash-hasher` because the key is already a well-distributed hash —
// running it through a second general-purpose hasher on every lookup would
// be pure waste.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use nohash_hasher::BuildNoHashHasher;

use crate::value::Block;
use crate::vm::Environment;

/// A host-installed callback. Native words interact with the VM only
/// through the [`Environment`] they're handed.
pub type NativeFn = fn(&mut Environment);

/// Hashes a word's UTF-8 bytes with `ahash`, stable for a given input
/// within one process run.
pub fn hash_word(word: &str) -> u64 {
    let mut hasher = ahash::AHasher::default();
    word.hash(&mut hasher);
    hasher.finish()
}

/// The result of resolving a word's hash against the dictionary.
pub enum Lookup {
    Native(NativeFn),
    Block(Rc<Block>),
    Miss,
}

#[derive(Default)]
pub struct Dictionary {
    blocks: HashMap<u64, Rc<Block>, BuildNoHashHasher<u64>>,
    natives: HashMap<u64, NativeFn, BuildNoHashHasher<u64>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            blocks: HashMap::with_hasher(BuildNoHashHasher::default()),
            natives: HashMap::with_hasher(BuildNoHashHasher::default()),
        }
    }

    /// Blesses `block` transitively and installs it under `hash(name)`.
    pub fn define_block(&mut self, name: &str, block: Rc<Block>) {
        block.bless();
        self.blocks.insert(hash_word(name), block);
    }

    pub fn define_native(&mut self, name: &str, f: NativeFn) {
        self.natives.insert(hash_word(name), f);
    }

    /// Native functions take precedence over user blocks sharing a hash,
    /// matching the reference dictionary's lookup order.
    pub fn lookup(&self, hash: u64) -> Lookup {
        if let Some(f) = self.natives.get(&hash) {
            return Lookup::Native(*f);
        }
        if let Some(block) = self.blocks.get(&hash) {
            return Lookup::Block(Rc::clone(block));
        }
        Lookup::Miss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Operation;

    #[test]
    fn native_shadows_block_sharing_a_hash() {
        let mut dict = Dictionary::new();
        dict.define_block("word", Rc::new(Block::new(vec![Operation::Dup])));
        dict.define_native("word", |_env| {});
        assert!(matches!(dict.lookup(hash_word("word")), Lookup::Native(_)));
    }

    #[test]
    fn missing_word_is_a_miss() {
        let dict = Dictionary::new();
        assert!(matches!(dict.lookup(hash_word("nope")), Lookup::Miss));
    }

    #[test]
    fn defining_a_block_blesses_it() {
        let mut dict = Dictionary::new();
        let block = Rc::new(Block::new(vec![]));
        assert!(!block.is_blessed());
        dict.define_block("word", Rc::clone(&block));
        assert!(block.is_blessed());
    }
}
