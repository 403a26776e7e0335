//! Open-addressed, chained hash table that deduplicates interned strings.
//!
//! Mirrors the design document's §4.5 contract exactly: `h = 31*h + c` over the character
//! range, power-of-two capacity, load factor target 0.75, rehash-by-splitting-each-bucket
//! rather than a full re-hash of every entry (which would reorder entries and is unnecessary
//! since the high bit alone determines which of the two new buckets an entry belongs in).
//!
//! Results are returned as `Rc<str>` rather than `String`: the whole point of the table is to
//! hand out a single shared instance per unique character range, and `Rc` makes "shared" cheap
//! to keep sharing after the table itself is dropped or cleared.

use std::rc::Rc;

const INITIAL_CAPACITY: usize = 16;
const LOAD_FACTOR: f64 = 0.75;

struct Entry {
    hash: u64,
    value: Rc<str>,
}

/// A hash table mapping unique character content to a single shared `Rc<str>` instance.
///
/// Not `Sync`; `Rc` makes it `!Send` as well by design — see the design document's
/// concurrency model (§5): canonical tables are thread-confined, and callers who want to
/// share interned results across threads must provide their own coordination.
pub struct CanonicalStringTable {
    buckets: Vec<Vec<Entry>>,
    mask: usize,
    len: usize,
}

impl Default for CanonicalStringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalStringTable {
    /// Creates an empty table with the default initial capacity.
    pub fn new() -> Self {
        CanonicalStringTable {
            buckets: (0..INITIAL_CAPACITY).map(|_| Vec::new()).collect(),
            mask: INITIAL_CAPACITY - 1,
            len: 0,
        }
    }

    /// Number of distinct strings currently interned.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no strings have been interned yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn hash_chars(chars: &[char]) -> u64 {
        let mut h: u64 = 0;
        for &c in chars {
            h = h.wrapping_mul(31).wrapping_add(c as u64);
        }
        h
    }

    fn hash_str(s: &str) -> u64 {
        let mut h: u64 = 0;
        for c in s.chars() {
            h = h.wrapping_mul(31).wrapping_add(c as u64);
        }
        h
    }

    /// Interns a character range, returning a shared `Rc<str>`. If an equal string was
    /// already interned, the existing instance is returned and nothing is allocated.
    pub fn intern_chars(&mut self, chars: &[char]) -> Rc<str> {
        let hash = Self::hash_chars(chars);
        self.intern_with_hash(hash, chars.iter().copied())
    }

    /// Interns a `&str`, returning a shared `Rc<str>`.
    pub fn intern_str(&mut self, s: &str) -> Rc<str> {
        let hash = Self::hash_str(s);
        self.intern_with_hash(hash, s.chars())
    }

    fn intern_with_hash(&mut self, hash: u64, chars: impl Iterator<Item = char> + Clone) -> Rc<str> {
        let idx = (hash as usize) & self.mask;
        if let Some(found) = self.buckets[idx].iter().find(|e| e.hash == hash && chars_eq(&e.value, chars.clone())) {
            return Rc::clone(&found.value);
        }

        let value: Rc<str> = chars.collect::<String>().into();
        self.buckets[idx].push(Entry { hash, value: Rc::clone(&value) });
        self.len += 1;

        if self.len as f64 > (self.mask + 1) as f64 * LOAD_FACTOR {
            self.rehash();
        }

        value
    }

    /// Doubles capacity and splits each existing bucket into two by the bit just above the
    /// old mask, preserving relative order within each resulting bucket.
    fn rehash(&mut self) {
        let old_capacity = self.mask + 1;
        let new_capacity = old_capacity * 2;
        let new_mask = new_capacity - 1;
        let split_bit = old_capacity;

        let mut new_buckets: Vec<Vec<Entry>> = (0..new_capacity).map(|_| Vec::new()).collect();
        for (old_idx, bucket) in self.buckets.drain(..).enumerate() {
            for entry in bucket {
                let goes_high = (entry.hash as usize) & split_bit != 0;
                let new_idx = if goes_high { old_idx + split_bit } else { old_idx };
                new_buckets[new_idx].push(entry);
            }
        }

        log::trace!("canonical string table rehash: {old_capacity} -> {new_capacity} buckets, {} entries", self.len);

        self.buckets = new_buckets;
        self.mask = new_mask;
    }
}

fn chars_eq(s: &str, mut chars: impl Iterator<Item = char>) -> bool {
    let mut s_chars = s.chars();
    loop {
        match (s_chars.next(), chars.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if a == b => continue,
            _ => return false,
        }
    }
}
