//! The INVERTED block representation: a sorted array enumerating the
//! *absent* elements. Used once cardinality climbs past the dense
//! threshold on the high end, mirroring [`super::positive::PositiveStore`]
//! with present/absent semantics flipped.

use core::ops::RangeInclusive;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::arrayops;
use crate::growth;

use super::dense::DenseStore;

/// Size of the element universe a single block covers.
const UNIVERSE: u32 = u32::from(u16::MAX) + 1;

#[derive(Clone, Eq, PartialEq)]
pub(crate) struct InvertedStore {
    /// Present-element count, cached so `len()` doesn't need `UNIVERSE - absent.len()`
    /// recomputed (and so it's available even when absent is briefly inconsistent
    /// mid-mutation).
    present: u32,
    absent: Vec<u16>,
}

impl InvertedStore {
    /// Builds from an already sorted, deduplicated vec of absent elements.
    pub fn from_absent_vec_unchecked(present: u32, absent: Vec<u16>) -> InvertedStore {
        InvertedStore { present, absent }
    }

    pub fn full() -> InvertedStore {
        InvertedStore { present: UNIVERSE, absent: Vec::new() }
    }

    pub fn byte_size(&self) -> usize {
        self.absent.len() * 2
    }

    pub fn absent_slice(&self) -> &[u16] {
        &self.absent
    }

    pub fn len(&self) -> u64 {
        u64::from(self.present)
    }

    pub fn is_empty(&self) -> bool {
        self.present == 0
    }

    pub fn contains(&self, index: u16) -> bool {
        self.absent.binary_search(&index).is_err()
    }

    pub fn contains_range(&self, range: RangeInclusive<u16>) -> bool {
        range.into_iter().all(|i| self.contains(i))
    }

    /// Returns whether the value was newly inserted.
    pub fn insert(&mut self, index: u16) -> bool {
        match self.absent.binary_search(&index) {
            Ok(pos) => {
                self.absent.remove(pos);
                growth::maybe_shrink(&mut self.absent);
                self.present += 1;
                true
            }
            Err(_) => false,
        }
    }

    /// Returns whether the value was present and removed.
    pub fn remove(&mut self, index: u16) -> bool {
        match self.absent.binary_search(&index) {
            Ok(_) => false,
            Err(pos) => {
                growth::reserve_for_growth(&mut self.absent, 1);
                self.absent.insert(pos, index);
                self.present -= 1;
                true
            }
        }
    }

    pub fn insert_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        let before = self.absent.len();
        let (start, end) = (*range.start(), *range.end());
        self.absent.retain(|&v| v < start || v > end);
        growth::maybe_shrink(&mut self.absent);
        let inserted = (before - self.absent.len()) as u64;
        self.present += inserted as u32;
        inserted
    }

    pub fn remove_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        let to_add: Vec<u16> =
            range.into_iter().filter(|v| self.absent.binary_search(v).is_err()).collect();
        if to_add.is_empty() {
            return 0;
        }
        let removed = to_add.len() as u64;
        self.absent = arrayops::union(&self.absent, &to_add);
        self.present -= removed as u32;
        removed
    }

    pub fn min(&self) -> Option<u16> {
        if self.present == 0 {
            return None;
        }
        let mut candidate = 0u16;
        loop {
            if self.absent.binary_search(&candidate).is_err() {
                return Some(candidate);
            }
            candidate = candidate.checked_add(1)?;
        }
    }

    pub fn max(&self) -> Option<u16> {
        if self.present == 0 {
            return None;
        }
        let mut candidate = u16::MAX;
        loop {
            if self.absent.binary_search(&candidate).is_err() {
                return Some(candidate);
            }
            candidate = candidate.checked_sub(1)?;
        }
    }

    pub fn rank(&self, x: u16) -> u64 {
        let absent_le_x = match self.absent.binary_search(&x) {
            Ok(i) => (i + 1) as u64,
            Err(i) => i as u64,
        };
        u64::from(x) + 1 - absent_le_x
    }

    pub fn select(&self, n: u32) -> Option<u16> {
        if n >= self.present {
            return None;
        }
        // Walk the universe skipping absent runs; the absent array bounds
        // how many skips are needed so this stays close to O(absent.len()).
        let mut target = n;
        let mut candidate: u32 = 0;
        for &gap in &self.absent {
            let gap = u32::from(gap);
            if gap < candidate {
                continue;
            }
            let run = gap - candidate;
            if target < run {
                return Some((candidate + target) as u16);
            }
            target -= run;
            candidate = gap + 1;
        }
        Some((candidate + target) as u16)
    }

    pub fn pop_max(&mut self) -> Option<u16> {
        let m = self.max()?;
        self.remove(m);
        Some(m)
    }

    pub fn iter(&self) -> InvertedIter<'_> {
        InvertedIter::new(&self.absent, self.present)
    }

    pub fn to_dense(&self) -> DenseStore {
        let mut dense = DenseStore::full();
        for &v in &self.absent {
            dense.remove(v);
        }
        dense
    }

    pub fn is_subset(&self, other: &InvertedStore) -> bool {
        // present_self ⊆ present_other  <=>  absent_other ⊆ absent_self
        arrayops::is_subset(&other.absent, &self.absent)
    }

    pub fn is_disjoint(&self, other: &InvertedStore) -> bool {
        // Two INVERTED blocks (each missing < 4096 elements out of 65536)
        // can never be disjoint unless the universe itself is tiny, since
        // their present sets each cover more than half the universe.
        self.present == 0 || other.present == 0
    }

    pub fn and_len(&self, other: &InvertedStore) -> u64 {
        u64::from(UNIVERSE) - arrayops::union(&self.absent, &other.absent).len() as u64
    }

    pub fn or_len(&self, other: &InvertedStore) -> u64 {
        u64::from(UNIVERSE) - arrayops::intersect_len(&self.absent, &other.absent)
    }

    /// `INVERTED ∧ INVERTED` stays INVERTED: the intersection of two
    /// "almost everything" sets is "almost everything" minus the union of
    /// what either side was missing.
    pub fn and(&self, other: &InvertedStore) -> InvertedStore {
        let absent = arrayops::union(&self.absent, &other.absent);
        let present = UNIVERSE - absent.len() as u32;
        InvertedStore { present, absent }
    }

    pub fn or(&self, other: &InvertedStore) -> InvertedStore {
        let absent = arrayops::intersect(&self.absent, &other.absent);
        let present = UNIVERSE - absent.len() as u32;
        InvertedStore { present, absent }
    }

    pub fn xor(&self, other: &InvertedStore) -> InvertedStore {
        // ¬A ⊕ ¬B == A ⊕ B: complementing both sides of a symmetric
        // difference cancels out.
        let absent = arrayops::xor(&self.absent, &other.absent);
        let present = UNIVERSE - absent.len() as u32;
        InvertedStore { present, absent }
    }

    /// `present_a \ present_b == absent_b \ absent_a`: subtracting two
    /// "almost everything" sets collapses to a plain array difference of
    /// their small absent lists, which is naturally POSITIVE-shaped.
    pub fn sub_to_present_vec(&self, other: &InvertedStore) -> Vec<u16> {
        arrayops::difference(&other.absent, &self.absent)
    }
}

/// Walks the universe skipping absent runs, from both ends. Each step binary
/// searches the absent array (bounded well below 4096 entries) rather than
/// tracking a running cursor into it, which keeps front/back independent.
pub(crate) struct InvertedIter<'a> {
    absent: &'a [u16],
    front: u32,
    back: u32,
    done: bool,
}

impl<'a> InvertedIter<'a> {
    fn new(absent: &'a [u16], present: u32) -> InvertedIter<'a> {
        if present == 0 {
            InvertedIter { absent, front: 0, back: 0, done: true }
        } else {
            InvertedIter { absent, front: 0, back: u32::from(u16::MAX), done: false }
        }
    }
}

impl<'a> Iterator for InvertedIter<'a> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        if self.done {
            return None;
        }
        loop {
            if self.front > self.back {
                self.done = true;
                return None;
            }
            let candidate = self.front as u16;
            if self.absent.binary_search(&candidate).is_ok() {
                self.front += 1;
                continue;
            }
            if self.front == self.back {
                self.done = true;
            } else {
                self.front += 1;
            }
            return Some(candidate);
        }
    }
}

impl<'a> DoubleEndedIterator for InvertedIter<'a> {
    fn next_back(&mut self) -> Option<u16> {
        if self.done {
            return None;
        }
        loop {
            if self.front > self.back {
                self.done = true;
                return None;
            }
            let candidate = self.back as u16;
            if self.absent.binary_search(&candidate).is_ok() {
                if self.back == self.front {
                    self.done = true;
                    return None;
                }
                self.back -= 1;
                continue;
            }
            if self.front == self.back {
                self.done = true;
            } else {
                self.back -= 1;
            }
            return Some(candidate);
        }
    }
}
