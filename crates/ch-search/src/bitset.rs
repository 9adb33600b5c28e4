//! Fixed-size bit set that remembers which words it dirtied.
//!
//! A marked-edge set is sized to the whole edge array but a CH query only
//! touches a few hundred bits.  Clearing just the dirtied words keeps
//! `clear_touched` proportional to the work the query did.

const WORD_BITS: usize = 64;

#[derive(Clone, Debug)]
pub struct BitSet {
    words:   Vec<u64>,
    len:     usize,
    touched: Vec<u32>,
}

impl BitSet {
    pub fn new(len: usize) -> Self {
        Self {
            words:   vec![0; len.div_ceil(WORD_BITS)],
            len,
            touched: Vec::new(),
        }
    }

    /// Number of addressable bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set bit `i`.  Returns `true` if it was previously clear.
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    #[inline]
    pub fn insert(&mut self, i: usize) -> bool {
        assert!(i < self.len, "bit {i} out of range for set of {}", self.len);
        let word = &mut self.words[i / WORD_BITS];
        if *word == 0 {
            self.touched.push((i / WORD_BITS) as u32);
        }
        let mask = 1u64 << (i % WORD_BITS);
        let was_clear = *word & mask == 0;
        *word |= mask;
        was_clear
    }

    #[inline]
    pub fn contains(&self, i: usize) -> bool {
        self.words[i / WORD_BITS] & (1u64 << (i % WORD_BITS)) != 0
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.touched
            .iter()
            .map(|&w| self.words[w as usize].count_ones() as usize)
            .sum()
    }

    /// Clear every word dirtied since the last clear.
    pub fn clear_touched(&mut self) {
        for w in self.touched.drain(..) {
            self.words[w as usize] = 0;
        }
    }

    /// Clear every word regardless of tracking.
    pub fn clear_all(&mut self) {
        self.words.fill(0);
        self.touched.clear();
    }
}
