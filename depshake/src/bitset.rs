//! Arbitrary-width bitset over module ids.
//!
//! Module graphs routinely hold thousands of modules, so the set is backed by
//! a growable vector of 64-bit words. Whole-set operations are `O(words)`,
//! single-bit operations are `O(1)`. Sets of different widths combine as if
//! the shorter one were zero-extended, and equality ignores trailing zero
//! words.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign};

use crate::graph::ModuleId;

const WORD_BITS: usize = u64::BITS as usize;

#[inline]
const fn word_index(bit: usize) -> usize {
    bit / WORD_BITS
}

#[inline]
const fn bit_mask(bit: usize) -> u64 {
    1u64 << (bit % WORD_BITS)
}

/// A set of module ids.
#[derive(Clone, Default)]
pub struct ModuleSet {
    words: Vec<u64>,
}

impl ModuleSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Create an empty set with room for ids `0..bits` without reallocating.
    #[must_use]
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(bits.div_ceil(WORD_BITS)),
        }
    }

    /// Create a set containing exactly `id`.
    #[must_use]
    pub fn singleton(id: ModuleId) -> Self {
        let mut set = Self::new();
        set.insert(id);
        set
    }

    /// Test whether `id` is in the set.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ModuleId) -> bool {
        self.words
            .get(word_index(id))
            .is_some_and(|word| word & bit_mask(id) != 0)
    }

    /// Add `id`, returning `true` if it was not already present.
    pub fn insert(&mut self, id: ModuleId) -> bool {
        let index = word_index(id);
        if index >= self.words.len() {
            self.words.resize(index + 1, 0);
        }
        let word = &mut self.words[index];
        let was_set = *word & bit_mask(id) != 0;
        *word |= bit_mask(id);
        !was_set
    }

    /// Remove `id`, returning `true` if it was present.
    pub fn remove(&mut self, id: ModuleId) -> bool {
        match self.words.get_mut(word_index(id)) {
            Some(word) if *word & bit_mask(id) != 0 => {
                *word &= !bit_mask(id);
                true
            }
            _ => false,
        }
    }

    /// Whether the set has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Smallest element that is `>= from`, if any.
    #[must_use]
    pub fn next_set_bit(&self, from: ModuleId) -> Option<ModuleId> {
        let mut index = word_index(from);
        let first = *self.words.get(index)?;
        let mut word = first & (u64::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                return Some(index * WORD_BITS + word.trailing_zeros() as usize);
            }
            index += 1;
            word = *self.words.get(index)?;
        }
    }

    /// Iterate over the elements in ascending order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: &self.words,
            index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    /// Remove every element of `other` from `self`.
    pub fn difference_with(&mut self, other: &Self) {
        for (word, &rhs) in self.words.iter_mut().zip(&other.words) {
            *word &= !rhs;
        }
    }

    /// Whether every element of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.words.iter().enumerate().all(|(index, &word)| {
            let rhs = other.words.get(index).copied().unwrap_or(0);
            word & !rhs == 0
        })
    }

    /// Whether `self` and `other` share an element.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(&lhs, &rhs)| lhs & rhs != 0)
    }

    fn grow_to(&mut self, words: usize) {
        if self.words.len() < words {
            self.words.resize(words, 0);
        }
    }
}

impl PartialEq for ModuleSet {
    fn eq(&self, other: &Self) -> bool {
        let (long, short) = if self.words.len() >= other.words.len() {
            (&self.words, &other.words)
        } else {
            (&other.words, &self.words)
        };
        long[..short.len()] == short[..] && long[short.len()..].iter().all(|&word| word == 0)
    }
}

impl Eq for ModuleSet {}

impl fmt::Debug for ModuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl BitOrAssign<&ModuleSet> for ModuleSet {
    fn bitor_assign(&mut self, rhs: &ModuleSet) {
        self.grow_to(rhs.words.len());
        for (word, &other) in self.words.iter_mut().zip(&rhs.words) {
            *word |= other;
        }
    }
}

impl BitAndAssign<&ModuleSet> for ModuleSet {
    fn bitand_assign(&mut self, rhs: &ModuleSet) {
        self.words.truncate(rhs.words.len());
        for (word, &other) in self.words.iter_mut().zip(&rhs.words) {
            *word &= other;
        }
    }
}

impl BitXorAssign<&ModuleSet> for ModuleSet {
    fn bitxor_assign(&mut self, rhs: &ModuleSet) {
        self.grow_to(rhs.words.len());
        for (word, &other) in self.words.iter_mut().zip(&rhs.words) {
            *word ^= other;
        }
    }
}

impl BitOr for &ModuleSet {
    type Output = ModuleSet;

    fn bitor(self, rhs: &ModuleSet) -> ModuleSet {
        let mut out = self.clone();
        out |= rhs;
        out
    }
}

impl BitAnd for &ModuleSet {
    type Output = ModuleSet;

    fn bitand(self, rhs: &ModuleSet) -> ModuleSet {
        let mut out = self.clone();
        out &= rhs;
        out
    }
}

impl BitXor for &ModuleSet {
    type Output = ModuleSet;

    fn bitxor(self, rhs: &ModuleSet) -> ModuleSet {
        let mut out = self.clone();
        out ^= rhs;
        out
    }
}

impl FromIterator<ModuleId> for ModuleSet {
    fn from_iter<I: IntoIterator<Item = ModuleId>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<ModuleId> for ModuleSet {
    fn extend<I: IntoIterator<Item = ModuleId>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

impl<'a> IntoIterator for &'a ModuleSet {
    type Item = ModuleId;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Ascending iterator over the elements of a [`ModuleSet`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    words: &'a [u64],
    index: usize,
    current: u64,
}

impl Iterator for Iter<'_> {
    type Item = ModuleId;

    fn next(&mut self) -> Option<ModuleId> {
        while self.current == 0 {
            self.index += 1;
            self.current = *self.words.get(self.index)?;
        }
        let bit = self.current.trailing_zeros() as usize;
        // clear lowest set bit
        self.current &= self.current - 1;
        Some(self.index * WORD_BITS + bit)
    }
}
