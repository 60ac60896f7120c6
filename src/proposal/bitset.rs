//! Word-packed set of node keys.
//!
//! Proposals store the key `global_index + 1` of every selected node, so bit 0
//! is never set. The helpers operating on raw word slices are shared between
//! the growable [`NodeBitSet`] and the arena-frozen copies of it.

const WORD_BITS: usize = 64;

/// Growable bit set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeBitSet {
    words: Vec<u64>,
}

impl NodeBitSet {
    /// Create empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty set able to hold keys below `bits` without growing.
    pub fn with_capacity(bits: usize) -> Self {
        Self { words: Vec::with_capacity(bits.div_ceil(WORD_BITS)) }
    }

    /// Set a key.
    pub fn insert(&mut self, key: usize) {
        let word = key / WORD_BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (key % WORD_BITS);
    }

    /// Check if key is set.
    pub fn contains(&self, key: usize) -> bool {
        contains(&self.words, key)
    }

    /// Replace the contents with the union of two word slices.
    pub fn assign_union(&mut self, a: &[u64], b: &[u64]) {
        let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
        self.words.clear();
        self.words.extend_from_slice(long);
        for (word, other) in self.words.iter_mut().zip(short) {
            *word |= *other;
        }
        self.trim();
    }

    /// Set union with a word slice.
    pub fn union_with(&mut self, other: &[u64]) {
        if other.len() > self.words.len() {
            self.words.resize(other.len(), 0);
        }
        for (word, other) in self.words.iter_mut().zip(other) {
            *word |= *other;
        }
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Words without trailing zero words.
    pub fn as_words(&self) -> &[u64] {
        trimmed(&self.words)
    }

    fn trim(&mut self) {
        let len = trimmed(&self.words).len();
        self.words.truncate(len);
    }
}

/// Check if `key` is set in `words`.
pub fn contains(words: &[u64], key: usize) -> bool {
    words
        .get(key / WORD_BITS)
        .is_some_and(|word| word & (1u64 << (key % WORD_BITS)) != 0)
}

/// Whether the two sets share a key.
pub fn intersects(a: &[u64], b: &[u64]) -> bool {
    a.iter().zip(b).any(|(x, y)| x & y != 0)
}

/// Number of keys set.
pub fn count(words: &[u64]) -> usize {
    words.iter().map(|word| word.count_ones() as usize).sum()
}

fn trimmed(words: &[u64]) -> &[u64] {
    let len = words.iter().rposition(|word| *word != 0).map_or(0, |last| last + 1);
    &words[..len]
}

/// Iterator over the set keys in increasing order.
pub struct Keys<'w> {
    words: &'w [u64],
    word_idx: usize,
    current: u64,
}

impl<'w> Keys<'w> {
    pub fn new(words: &'w [u64]) -> Self {
        Self { words, word_idx: 0, current: words.first().copied().unwrap_or(0) }
    }
}

impl Iterator for Keys<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current == 0 {
            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
        let bit = self.current.trailing_zeros() as usize;
        self.current &= self.current - 1;
        Some(self.word_idx * WORD_BITS + bit)
    }
}
