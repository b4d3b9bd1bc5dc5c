//! The per-block `Store`: a closed union of the three block representations
//! and the conversion policy and binary-op dispatch that tie them together.
//!
//! A block always holds exactly one of [`DenseStore`], [`PositiveStore`] or
//! [`InvertedStore`]. Every mutating operation that can change cardinality
//! ends by calling [`convert`], which re-derives the correct representation
//! from the current length — callers never have to reason about the
//! threshold crossings themselves.

pub(crate) mod dense;
pub(crate) mod inverted;
pub(crate) mod positive;

use core::ops::RangeInclusive;

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::arrayops;
use crate::bitops;

use dense::{DenseIter, DenseStore};
use inverted::{InvertedIter, InvertedStore};
use positive::PositiveStore;

/// Below this cardinality a block is POSITIVE; at or above it's DENSE.
pub(crate) const ARRAY_LIMIT: u32 = 4096;
/// Size of the element universe a single block covers.
pub(crate) const UNIVERSE: u32 = u32::from(u16::MAX) + 1;
/// Above this cardinality a block is INVERTED; at or below it's DENSE.
pub(crate) const INVERTED_LIMIT: u32 = UNIVERSE - ARRAY_LIMIT;

#[derive(Clone, Eq, PartialEq)]
pub(crate) enum Store {
    Dense(DenseStore),
    Positive(PositiveStore),
    Inverted(InvertedStore),
}

impl Store {
    pub fn new() -> Store {
        Store::Positive(PositiveStore::new())
    }

    pub fn full() -> Store {
        Store::Inverted(InvertedStore::full())
    }

    pub fn byte_size(&self) -> usize {
        match self {
            Store::Dense(d) => d.byte_size(),
            Store::Positive(p) => p.byte_size(),
            Store::Inverted(i) => i.byte_size(),
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            Store::Dense(d) => d.len(),
            Store::Positive(p) => p.len(),
            Store::Inverted(i) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == u64::from(UNIVERSE)
    }

    pub fn contains(&self, index: u16) -> bool {
        match self {
            Store::Dense(d) => d.contains(index),
            Store::Positive(p) => p.contains(index),
            Store::Inverted(i) => i.contains(index),
        }
    }

    pub fn contains_range(&self, range: RangeInclusive<u16>) -> bool {
        match self {
            Store::Dense(d) => d.contains_range(range),
            Store::Positive(p) => p.contains_range(range),
            Store::Inverted(i) => i.contains_range(range),
        }
    }

    /// Inserts `index`, converting representation if the threshold is
    /// crossed. Returns whether the value was newly inserted.
    pub fn insert(&mut self, index: u16) -> bool {
        let inserted = match self {
            Store::Dense(d) => d.insert(index),
            Store::Positive(p) => p.insert(index),
            Store::Inverted(i) => i.insert(index),
        };
        if inserted {
            convert(self);
        }
        inserted
    }

    /// Returns whether the value was present and removed.
    pub fn remove(&mut self, index: u16) -> bool {
        let removed = match self {
            Store::Dense(d) => d.remove(index),
            Store::Positive(p) => p.remove(index),
            Store::Inverted(i) => i.remove(index),
        };
        if removed {
            convert(self);
        }
        removed
    }

    pub fn insert_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        let n = match self {
            Store::Dense(d) => d.insert_range(range),
            Store::Positive(p) => p.insert_range(range),
            Store::Inverted(i) => i.insert_range(range),
        };
        if n > 0 {
            convert(self);
        }
        n
    }

    pub fn remove_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        let n = match self {
            Store::Dense(d) => d.remove_range(range),
            Store::Positive(p) => p.remove_range(range),
            Store::Inverted(i) => i.remove_range(range),
        };
        if n > 0 {
            convert(self);
        }
        n
    }

    pub fn min(&self) -> Option<u16> {
        match self {
            Store::Dense(d) => d.min(),
            Store::Positive(p) => p.min(),
            Store::Inverted(i) => i.min(),
        }
    }

    pub fn max(&self) -> Option<u16> {
        match self {
            Store::Dense(d) => d.max(),
            Store::Positive(p) => p.max(),
            Store::Inverted(i) => i.max(),
        }
    }

    pub fn rank(&self, x: u16) -> u64 {
        match self {
            Store::Dense(d) => d.rank(x),
            Store::Positive(p) => p.rank(x),
            Store::Inverted(i) => i.rank(x),
        }
    }

    pub fn select(&self, n: u32) -> Option<u16> {
        match self {
            Store::Dense(d) => d.select(n),
            Store::Positive(p) => p.select(n),
            Store::Inverted(i) => i.select(n),
        }
    }

    pub fn pop_max(&mut self) -> Option<u16> {
        let v = match self {
            Store::Dense(d) => d.pop_max(),
            Store::Positive(p) => p.pop_max(),
            Store::Inverted(i) => i.pop_max(),
        };
        if v.is_some() {
            convert(self);
        }
        v
    }

    pub fn iter(&self) -> StoreIter<'_> {
        match self {
            Store::Dense(d) => StoreIter::Dense(d.iter()),
            Store::Positive(p) => StoreIter::Positive(p.iter()),
            Store::Inverted(i) => StoreIter::Inverted(i.iter()),
        }
    }

    pub fn is_subset(&self, other: &Store) -> bool {
        match (self, other) {
            (Store::Dense(a), Store::Dense(b)) => a.is_subset(b),
            (Store::Positive(a), Store::Positive(b)) => a.is_subset(b),
            (Store::Inverted(a), Store::Inverted(b)) => a.is_subset(b),
            _ => arrayops::is_subset(&materialize(self), &materialize(other)),
        }
    }

    pub fn is_disjoint(&self, other: &Store) -> bool {
        match (self, other) {
            (Store::Dense(a), Store::Dense(b)) => a.is_disjoint(b),
            (Store::Positive(a), Store::Positive(b)) => a.is_disjoint(b),
            (Store::Inverted(a), Store::Inverted(b)) => a.is_disjoint(b),
            _ => arrayops::is_disjoint(&materialize(self), &materialize(other)),
        }
    }

    pub fn and_len(&self, other: &Store) -> u64 {
        match (self, other) {
            (Store::Dense(a), Store::Dense(b)) => a.and_len(b),
            (Store::Positive(a), Store::Positive(b)) => a.and_len(b),
            (Store::Inverted(a), Store::Inverted(b)) => a.and_len(b),
            _ => arrayops::intersect_len(&materialize(self), &materialize(other)),
        }
    }

    pub fn or_len(&self, other: &Store) -> u64 {
        match (self, other) {
            (Store::Dense(a), Store::Dense(b)) => a.or_len(b),
            (Store::Positive(a), Store::Positive(b)) => a.or_len(b),
            (Store::Inverted(a), Store::Inverted(b)) => a.or_len(b),
            _ => self.len() + other.len() - self.and_len(other),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

pub(crate) enum StoreIter<'a> {
    Dense(DenseIter<'a>),
    Positive(core::iter::Copied<core::slice::Iter<'a, u16>>),
    Inverted(InvertedIter<'a>),
}

impl<'a> Iterator for StoreIter<'a> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        match self {
            StoreIter::Dense(it) => it.next(),
            StoreIter::Positive(it) => it.next(),
            StoreIter::Inverted(it) => it.next(),
        }
    }
}

impl<'a> DoubleEndedIterator for StoreIter<'a> {
    fn next_back(&mut self) -> Option<u16> {
        match self {
            StoreIter::Dense(it) => it.next_back(),
            StoreIter::Positive(it) => it.next_back(),
            StoreIter::Inverted(it) => it.next_back(),
        }
    }
}

/// Re-derives the correct representation for the store's current length,
/// switching it in place. `DENSE` is the hinge: it converts out to
/// `POSITIVE` below [`ARRAY_LIMIT`] and to `INVERTED` above
/// [`INVERTED_LIMIT`]; `POSITIVE`/`INVERTED` only ever convert back to
/// `DENSE`, never directly into each other.
pub(crate) fn convert(store: &mut Store) {
    match store {
        Store::Dense(d) => {
            if d.len() < u64::from(ARRAY_LIMIT) {
                *store = Store::Positive(d.to_positive());
            } else if d.len() > u64::from(INVERTED_LIMIT) {
                *store = Store::Inverted(d.to_inverted());
            }
        }
        Store::Positive(p) => {
            if p.len() >= u64::from(ARRAY_LIMIT) {
                *store = Store::Dense(p.to_dense());
            }
        }
        Store::Inverted(i) => {
            if i.len() <= u64::from(INVERTED_LIMIT) {
                *store = Store::Dense(i.to_dense());
            }
        }
    }
}

/// Expands any store into its sorted present-element vec. Cheap for
/// DENSE/POSITIVE; for INVERTED this walks the whole universe skipping
/// absent runs, so it's reserved for the mixed-state fallback paths below
/// rather than hot per-element code.
pub(crate) fn materialize(store: &Store) -> Vec<u16> {
    match store {
        Store::Dense(d) => bitops::extract_setbits(d.words()),
        Store::Positive(p) => p.as_slice().to_vec(),
        Store::Inverted(i) => i.iter().collect(),
    }
}

/// Builds the correctly-shaped store from a sorted present-element vec,
/// following the same thresholds as [`convert`].
pub(crate) fn from_present_vec(vec: Vec<u16>) -> Store {
    let card = vec.len() as u32;
    if card < ARRAY_LIMIT {
        Store::Positive(PositiveStore::from_vec_unchecked(vec))
    } else if card <= INVERTED_LIMIT {
        let mut dense = DenseStore::new();
        for v in vec {
            dense.insert(v);
        }
        Store::Dense(dense)
    } else {
        Store::Inverted(InvertedStore::from_absent_vec_unchecked(card, complement(&vec)))
    }
}

/// Sorted present vec -> sorted absent vec, over the full `u16` universe.
fn complement(present: &[u16]) -> Vec<u16> {
    let mut out = Vec::with_capacity(UNIVERSE as usize - present.len());
    let mut i = 0;
    let mut v = 0u16;
    loop {
        if i < present.len() && present[i] == v {
            i += 1;
        } else {
            out.push(v);
        }
        if v == u16::MAX {
            break;
        }
        v += 1;
    }
    out
}

fn as_dense(store: &Store) -> DenseStore {
    match store {
        Store::Dense(d) => d.clone(),
        Store::Positive(p) => p.to_dense(),
        Store::Inverted(i) => i.to_dense(),
    }
}

/// `a ∧ b`.
pub(crate) fn and(a: &Store, b: &Store) -> Store {
    match (a, b) {
        (Store::Dense(da), Store::Dense(db)) => {
            // DENSE∧DENSE counts first: a small intersection is built
            // straight into an array rather than paying for a DENSE clone.
            let count = da.and_len(db);
            if count < u64::from(ARRAY_LIMIT) {
                Store::Positive(PositiveStore::from_vec_unchecked(bitops::extract_intersection(
                    da.words(),
                    db.words(),
                )))
            } else {
                Store::Dense(da.and(db))
            }
        }
        (Store::Positive(pa), Store::Positive(pb)) => {
            let mut r = Store::Positive(pa.and(pb));
            convert(&mut r);
            r
        }
        (Store::Inverted(ia), Store::Inverted(ib)) => {
            let mut r = Store::Inverted(ia.and(ib));
            convert(&mut r);
            r
        }
        (Store::Dense(d), Store::Positive(p)) | (Store::Positive(p), Store::Dense(d)) => {
            let mut r = Store::Positive(PositiveStore::from_vec_unchecked(
                p.as_slice().iter().copied().filter(|&v| d.contains(v)).collect(),
            ));
            convert(&mut r);
            r
        }
        (Store::Dense(d), Store::Inverted(inv)) | (Store::Inverted(inv), Store::Dense(d)) => {
            // present_d ∩ present_inv == present_d with inv's absent bits cleared.
            let mut words = *d.words();
            let mut card = d.len() as i64;
            for &v in inv.absent_slice() {
                card += bitops::unset_bit_and_update_card(&mut words, v);
            }
            let mut r = Store::Dense(DenseStore::from_words_unchecked(card as u64, Box::new(words)));
            convert(&mut r);
            r
        }
        (Store::Positive(p), Store::Inverted(inv)) | (Store::Inverted(inv), Store::Positive(p)) => {
            // present_p ∩ present_inv == present_p minus inv's absent elements.
            let mut r = Store::Positive(PositiveStore::from_vec_unchecked(arrayops::difference(
                p.as_slice(),
                inv.absent_slice(),
            )));
            convert(&mut r);
            r
        }
    }
}

/// `a ∨ b`.
pub(crate) fn or(a: &Store, b: &Store) -> Store {
    match (a, b) {
        (Store::Dense(da), Store::Dense(db)) => {
            let mut r = Store::Dense(da.or(db));
            convert(&mut r);
            r
        }
        (Store::Positive(pa), Store::Positive(pb)) => {
            // POSITIVE∨POSITIVE: build directly into DENSE once the combined
            // size can no longer fit as an array, instead of materializing
            // an oversized array first.
            if pa.len() + pb.len() >= u64::from(ARRAY_LIMIT) {
                let mut words = *bitops::new_words();
                let card = arrayops::union_to_bitmap(pa.as_slice(), pb.as_slice(), &mut words);
                let mut r = Store::Dense(DenseStore::from_words_unchecked(card, Box::new(words)));
                convert(&mut r);
                r
            } else {
                Store::Positive(pa.or(pb))
            }
        }
        (Store::Inverted(ia), Store::Inverted(ib)) => {
            let mut r = Store::Inverted(ia.or(ib));
            convert(&mut r);
            r
        }
        (Store::Dense(d), Store::Positive(p)) | (Store::Positive(p), Store::Dense(d)) => {
            let mut dense = d.clone();
            for &v in p.as_slice() {
                dense.insert(v);
            }
            let mut r = Store::Dense(dense);
            convert(&mut r);
            r
        }
        (Store::Dense(d), Store::Inverted(inv)) | (Store::Inverted(inv), Store::Dense(d)) => {
            // present_d ∪ present_inv: x is absent from the union only if
            // it's absent from d *and* absent from inv, i.e. it's in inv's
            // (small) absent set and not present in d.
            let absent: Vec<u16> =
                inv.absent_slice().iter().copied().filter(|&v| !d.contains(v)).collect();
            let present = UNIVERSE - absent.len() as u32;
            let mut r = Store::Inverted(InvertedStore::from_absent_vec_unchecked(present, absent));
            convert(&mut r);
            r
        }
        (Store::Positive(p), Store::Inverted(inv)) | (Store::Inverted(inv), Store::Positive(p)) => {
            // present_p ∪ present_inv: absent from the union iff absent from
            // inv and not in p.
            let absent = arrayops::difference(inv.absent_slice(), p.as_slice());
            let present = UNIVERSE - absent.len() as u32;
            let mut r = Store::Inverted(InvertedStore::from_absent_vec_unchecked(present, absent));
            convert(&mut r);
            r
        }
    }
}

/// `a Δ b`.
pub(crate) fn xor(a: &Store, b: &Store) -> Store {
    match (a, b) {
        (Store::Dense(da), Store::Dense(db)) => {
            let mut r = Store::Dense(da.xor(db));
            convert(&mut r);
            r
        }
        (Store::Positive(pa), Store::Positive(pb)) => {
            let mut r = Store::Positive(pa.xor(pb));
            convert(&mut r);
            r
        }
        (Store::Inverted(ia), Store::Inverted(ib)) => {
            let mut r = Store::Inverted(ia.xor(ib));
            convert(&mut r);
            r
        }
        // Every mixed pairing converts whichever side isn't already DENSE
        // (both sides, if neither is) and falls through to the DENSE path.
        _ => {
            let da = as_dense(a);
            let db = as_dense(b);
            let mut r = Store::Dense(da.xor(&db));
            convert(&mut r);
            r
        }
    }
}

/// `a \ b`.
pub(crate) fn sub(a: &Store, b: &Store) -> Store {
    match (a, b) {
        (Store::Dense(da), Store::Dense(db)) => {
            let mut r = Store::Dense(da.sub(db));
            convert(&mut r);
            r
        }
        (Store::Positive(pa), Store::Positive(pb)) => Store::Positive(pa.sub(pb)),
        (Store::Inverted(ia), Store::Inverted(ib)) => {
            // present_a \ present_b == absent_b \ absent_a, always small.
            Store::Positive(PositiveStore::from_vec_unchecked(ia.sub_to_present_vec(ib)))
        }
        (Store::Dense(d), Store::Positive(p)) => {
            let mut words = *d.words();
            let mut card = d.len() as i64;
            for &v in p.as_slice() {
                card += bitops::unset_bit_and_update_card(&mut words, v);
            }
            let mut r = Store::Dense(DenseStore::from_words_unchecked(card as u64, Box::new(words)));
            convert(&mut r);
            r
        }
        (Store::Positive(p), Store::Dense(d)) => Store::Positive(PositiveStore::from_vec_unchecked(
            p.as_slice().iter().copied().filter(|&v| !d.contains(v)).collect(),
        )),
        (Store::Dense(d), Store::Inverted(inv)) => {
            // present_d \ present_inv == present_d ∩ absent_inv.
            Store::Positive(PositiveStore::from_vec_unchecked(
                inv.absent_slice().iter().copied().filter(|&v| d.contains(v)).collect(),
            ))
        }
        (Store::Inverted(i), Store::Dense(d)) => {
            // No small closed form here (the result can be arbitrarily
            // shaped); fall through DENSE like the mixed XOR cases do.
            let da = i.to_dense();
            let mut r = Store::Dense(da.sub(d));
            convert(&mut r);
            r
        }
        (Store::Positive(p), Store::Inverted(inv)) => {
            // present_p \ present_inv == present_p ∩ absent_inv.
            Store::Positive(PositiveStore::from_vec_unchecked(arrayops::intersect(
                p.as_slice(),
                inv.absent_slice(),
            )))
        }
        (Store::Inverted(i), Store::Positive(p)) => {
            // present_i \ present_p == complement(absent_i ∪ present_p).
            let absent = arrayops::union(i.absent_slice(), p.as_slice());
            let present = UNIVERSE - absent.len() as u32;
            let mut r = Store::Inverted(InvertedStore::from_absent_vec_unchecked(present, absent));
            convert(&mut r);
            r
        }
    }
}

pub(crate) fn and_assign(a: &mut Store, b: &Store) {
    if let (Store::Dense(da), Store::Dense(db)) = (&mut *a, b) {
        da.and_inplace(db);
        convert(a);
        return;
    }
    *a = and(a, b);
}

pub(crate) fn or_assign(a: &mut Store, b: &Store) {
    if let (Store::Dense(da), Store::Dense(db)) = (&mut *a, b) {
        da.or_inplace(db);
        convert(a);
        return;
    }
    *a = or(a, b);
}

pub(crate) fn xor_assign(a: &mut Store, b: &Store) {
    if let (Store::Dense(da), Store::Dense(db)) = (&mut *a, b) {
        da.xor_inplace(db);
        convert(a);
        return;
    }
    *a = xor(a, b);
}

pub(crate) fn sub_assign(a: &mut Store, b: &Store) {
    if let (Store::Dense(da), Store::Dense(db)) = (&mut *a, b) {
        da.sub_inplace(db);
        convert(a);
        return;
    }
    *a = sub(a, b);
}
