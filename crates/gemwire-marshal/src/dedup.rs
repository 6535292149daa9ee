//! String dedup index for the lifting path.
//!
//! A hash-trie keyed on a 32-bit DJB2 digest of the byte content, branching
//! four bits per level. Leaves hold up to sixteen entries; a full leaf is
//! split into an interior node at the next shift position. Sharing is an
//! optimisation only; correctness never depends on a hit.

use gemwire_core::{RubyArena, ValueId};

const HASH_SHIFT: u32 = 4;
const FANOUT: usize = 1 << HASH_SHIFT;
const LEAF_MAX: usize = 16;
const HASH_BITS: u32 = 32;

enum Bucket {
    Interior {
        shift: u32,
        children: Box<[Option<Bucket>; FANOUT]>,
    },
    Leaf {
        shift: u32,
        entries: Vec<(u32, ValueId)>,
    },
}

fn empty_children() -> Box<[Option<Bucket>; FANOUT]> {
    Box::new(std::array::from_fn(|_| None))
}

#[derive(Default)]
pub struct StringDedup {
    root: Option<Bucket>,
}

pub fn djb2(bytes: &[u8]) -> u32 {
    let mut hash = 5381u32;
    for &b in bytes {
        hash = hash.wrapping_mul(33).wrapping_add(b as u32);
    }
    hash
}

impl StringDedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a previously inserted string value with exactly these bytes.
    pub fn lookup(&self, arena: &RubyArena, bytes: &[u8]) -> Option<ValueId> {
        let hash = djb2(bytes);
        let mut bucket = self.root.as_ref()?;
        loop {
            match bucket {
                Bucket::Interior { shift, children } => {
                    let index = ((hash >> shift) & (FANOUT as u32 - 1)) as usize;
                    bucket = children[index].as_ref()?;
                }
                Bucket::Leaf { entries, .. } => {
                    return entries
                        .iter()
                        .find(|&&(h, id)| h == hash && arena.string_bytes(id) == Some(bytes))
                        .map(|&(_, id)| id);
                }
            }
        }
    }

    /// Index a string value by its byte content.
    pub fn insert(&mut self, arena: &RubyArena, id: ValueId) {
        let bytes = match arena.string_bytes(id) {
            Some(b) => b,
            None => return,
        };
        let hash = djb2(bytes);
        let root = self
            .root
            .get_or_insert_with(|| Bucket::Interior {
                shift: 0,
                children: empty_children(),
            });
        insert_into(root, hash, id);
    }
}

fn insert_into(bucket: &mut Bucket, hash: u32, id: ValueId) {
    match bucket {
        Bucket::Interior { shift, children } => {
            let child_shift = *shift + HASH_SHIFT;
            let index = ((hash >> *shift) & (FANOUT as u32 - 1)) as usize;
            let child = children[index].get_or_insert_with(|| Bucket::Leaf {
                shift: child_shift,
                entries: Vec::new(),
            });
            insert_into(child, hash, id);
        }
        Bucket::Leaf { shift, entries } => {
            // a leaf at the last shift position cannot split further and
            // simply grows
            if entries.len() < LEAF_MAX || *shift + HASH_SHIFT >= HASH_BITS {
                entries.push((hash, id));
                return;
            }
            let old = std::mem::take(entries);
            let leaf_shift = *shift;
            *bucket = Bucket::Interior {
                shift: leaf_shift,
                children: empty_children(),
            };
            for (h, v) in old {
                insert_into(bucket, h, v);
            }
            insert_into(bucket, hash, id);
        }
    }
}
