use core::ops::{RangeBounds, RangeInclusive};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::error::{Error, ErrorKind};
use crate::store::Store;
use crate::util;

use super::RoaringBitmap;

impl RoaringBitmap {
    /// Creates an empty bitmap.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_block_rs::RoaringBitmap;
    ///
    /// let rb = RoaringBitmap::new();
    /// ```
    pub fn new() -> RoaringBitmap {
        RoaringBitmap { keys: Vec::new(), data: Vec::new() }
    }

    /// Builds a bitmap from a byte slice interpreted as a bitmap in
    /// least-significant-bit-first order: bit `n` of `bytes` maps to value
    /// `offset + n`.
    ///
    /// # Panics
    ///
    /// Panics if `offset as u64 + bytes.len() as u64 * 8` overflows `u32`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_block_rs::RoaringBitmap;
    ///
    /// let bytes = [0b0000_0101u8, 0b0000_0010];
    /// let rb = RoaringBitmap::from_lsb0_bytes(0, &bytes);
    /// assert!(rb.contains(0));
    /// assert!(!rb.contains(1));
    /// assert!(rb.contains(2));
    /// assert!(rb.contains(9));
    /// assert_eq!(rb.len(), 3);
    /// ```
    pub fn from_lsb0_bytes(offset: u32, bytes: &[u8]) -> RoaringBitmap {
        let mut rb = RoaringBitmap::new();
        for (byte_index, &byte) in bytes.iter().enumerate() {
            if byte == 0 {
                continue;
            }
            let base = (byte_index as u64) * 8 + u64::from(offset);
            for bit in 0..8u64 {
                if byte & (1 << bit) != 0 {
                    let value = u32::try_from(base + bit)
                        .expect("offset + bytes.len() * 8 must be <= 2^32");
                    rb.insert(value);
                }
            }
        }
        rb
    }

    /// Adds `value`, returning whether it was newly inserted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_block_rs::RoaringBitmap;
    ///
    /// let mut rb = RoaringBitmap::new();
    /// assert!(rb.insert(3));
    /// assert!(!rb.insert(3));
    /// ```
    pub fn insert(&mut self, value: u32) -> bool {
        let (key, index) = util::split(value);
        self.get_or_insert_block(key).insert(index)
    }

    /// Adds every value in `range`, returning the number of values newly
    /// inserted.
    pub fn insert_range<R>(&mut self, range: R) -> u64
    where
        R: RangeBounds<u32>,
    {
        let range = match util::convert_range_to_inclusive(range) {
            Ok(range) => range,
            Err(_) => return 0,
        };
        let (start, end) = (*range.start(), *range.end());
        let (start_key, start_index) = util::split(start);
        let (end_key, end_index) = util::split(end);

        let mut inserted = 0;
        for key in start_key..=end_key {
            let lo = if key == start_key { start_index } else { 0 };
            let hi = if key == end_key { end_index } else { u16::MAX };
            inserted += self.get_or_insert_block(key).insert_range(lo..=hi);
        }
        inserted
    }

    /// Removes `value` idempotently, returning whether it was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_block_rs::RoaringBitmap;
    ///
    /// let mut rb = RoaringBitmap::new();
    /// rb.insert(3);
    /// assert!(rb.discard(3));
    /// assert!(!rb.discard(3));
    /// ```
    pub fn discard(&mut self, value: u32) -> bool {
        let (key, index) = util::split(value);
        match self.find_block(key) {
            Ok(i) => {
                let removed = self.data[i].remove(index);
                if removed {
                    self.remove_block_if_empty(i);
                }
                removed
            }
            Err(_) => false,
        }
    }

    /// Removes `value`, failing with [`ErrorKind::NotPresent`] if it wasn't
    /// in the set.
    pub fn remove(&mut self, value: u32) -> Result<(), Error> {
        if self.discard(value) {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::NotPresent))
        }
    }

    /// Removes every value in `range`, returning the number removed.
    pub fn remove_range<R>(&mut self, range: R) -> u64
    where
        R: RangeBounds<u32>,
    {
        let range = match util::convert_range_to_inclusive(range) {
            Ok(range) => range,
            Err(_) => return 0,
        };
        let (start, end) = (*range.start(), *range.end());
        let (start_key, start_index) = util::split(start);
        let (end_key, end_index) = util::split(end);

        let mut removed = 0;
        let mut i = match self.find_block(start_key) {
            Ok(i) | Err(i) => i,
        };
        while i < self.keys.len() && self.keys[i] <= end_key {
            let key = self.keys[i];
            let lo = if key == start_key { start_index } else { 0 };
            let hi = if key == end_key { end_index } else { u16::MAX };
            removed += self.data[i].remove_range(lo..=hi);
            if self.data[i].is_empty() {
                self.remove_block_at(i);
            } else {
                i += 1;
            }
        }
        removed
    }

    /// Returns `true` if `value` is in the set.
    pub fn contains(&self, value: u32) -> bool {
        let (key, index) = util::split(value);
        match self.find_block(key) {
            Ok(i) => self.data[i].contains(index),
            Err(_) => false,
        }
    }

    /// Returns `true` if every value in `range` is in the set.
    pub fn contains_range<R>(&self, range: R) -> bool
    where
        R: RangeBounds<u32>,
    {
        let range = match util::convert_range_to_inclusive(range) {
            Ok(range) => range,
            Err(_) => return true,
        };
        let (start, end) = (*range.start(), *range.end());
        let (start_key, start_index) = util::split(start);
        let (end_key, end_index) = util::split(end);

        for key in start_key..=end_key {
            let lo = if key == start_key { start_index } else { 0 };
            let hi = if key == end_key { end_index } else { u16::MAX };
            match self.find_block(key) {
                Ok(i) => {
                    if !self.data[i].contains_range(lo..=hi) {
                        return false;
                    }
                }
                Err(_) => return false,
            }
        }
        true
    }

    /// Returns the number of values in `range` that are in the set.
    pub fn range_cardinality<R>(&self, range: R) -> u64
    where
        R: RangeBounds<u32>,
    {
        let range = match util::convert_range_to_inclusive(range) {
            Ok(range) => range,
            Err(_) => return 0,
        };
        let (start, end) = (*range.start(), *range.end());
        self.rank(end) - if start == 0 { 0 } else { self.rank(start - 1) }
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.data.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the number of values in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_block_rs::RoaringBitmap;
    ///
    /// let mut rb = RoaringBitmap::new();
    /// rb.insert(3);
    /// rb.insert(4);
    /// assert_eq!(rb.len(), 2);
    /// ```
    pub fn len(&self) -> u64 {
        self.data.iter().map(Store::len).sum()
    }

    pub fn min(&self) -> Option<u32> {
        self.keys.first().copied().map(|key| {
            let low = self.data[0].min().unwrap();
            util::join(key, low)
        })
    }

    pub fn max(&self) -> Option<u32> {
        self.keys.last().copied().map(|key| {
            let low = self.data.last().unwrap().max().unwrap();
            util::join(key, low)
        })
    }

    /// Number of values `<= value`.
    pub fn rank(&self, value: u32) -> u64 {
        let (key, index) = util::split(value);
        let mut rank = 0;
        for (i, &k) in self.keys.iter().enumerate() {
            if k < key {
                rank += self.data[i].len();
            } else if k == key {
                rank += self.data[i].rank(index);
                break;
            } else {
                break;
            }
        }
        rank
    }

    /// The `n`-th smallest value (0-based), failing with
    /// [`ErrorKind::OutOfRange`] if `n >= len()`.
    pub fn select(&self, n: u32) -> Result<u32, Error> {
        let mut remaining = n;
        for (i, &key) in self.keys.iter().enumerate() {
            let block_len = self.data[i].len();
            if u64::from(remaining) < block_len {
                let low = self.data[i].select(remaining).unwrap();
                return Ok(util::join(key, low));
            }
            remaining -= block_len as u32;
        }
        Err(Error::new(ErrorKind::OutOfRange))
    }

    /// Removes and returns the largest value, failing with
    /// [`ErrorKind::Empty`] if the set is empty.
    pub fn pop_max(&mut self) -> Result<u32, Error> {
        let last = self.keys.len().checked_sub(1).ok_or_else(|| Error::new(ErrorKind::Empty))?;
        let key = self.keys[last];
        let low = self.data[last].pop_max().unwrap();
        self.remove_block_if_empty(last);
        Ok(util::join(key, low))
    }

    /// Removes and returns the smallest value, failing with
    /// [`ErrorKind::Empty`] if the set is empty.
    pub fn pop_min(&mut self) -> Result<u32, Error> {
        if self.keys.is_empty() {
            return Err(Error::new(ErrorKind::Empty));
        }
        let key = self.keys[0];
        let low = self.data[0].min().unwrap();
        self.data[0].remove(low);
        self.remove_block_if_empty(0);
        Ok(util::join(key, low))
    }

    /// Restricts the set to `[start, stop)`, dropping anything outside it.
    pub fn clamp(&mut self, start: u32, stop: u32) {
        if start >= stop {
            self.clear();
            return;
        }
        self.remove_range(0..start);
        self.remove_range(stop..=u32::MAX);
    }

    /// Flips (symmetric-difference with) every value in `range`.
    pub fn flip_range<R>(&mut self, range: R)
    where
        R: RangeBounds<u32>,
    {
        let range = match util::convert_range_to_inclusive(range) {
            Ok(range) => range,
            Err(_) => return,
        };
        let (start, end) = (*range.start(), *range.end());
        let (start_key, start_index) = util::split(start);
        let (end_key, end_index) = util::split(end);

        for key in start_key..=end_key {
            let lo = if key == start_key { start_index } else { 0 };
            let hi = if key == end_key { end_index } else { u16::MAX };
            flip_range_in_block(self.get_or_insert_block(key), lo..=hi);
            if let Ok(i) = self.find_block(key) {
                self.remove_block_if_empty(i);
            }
        }
    }
}

impl Default for RoaringBitmap {
    fn default() -> Self {
        RoaringBitmap::new()
    }
}

/// Flips every value of `range` in a block: present becomes absent and
/// vice versa. There's no dedicated store primitive for this (it isn't
/// expressible as a single insert/remove pass), so it's done element by
/// element; blocks are at most 2^16 elements so this stays bounded.
fn flip_range_in_block(store: &mut Store, range: RangeInclusive<u16>) {
    for v in range {
        if store.contains(v) {
            store.remove(v);
        } else {
            store.insert(v);
        }
    }
}
