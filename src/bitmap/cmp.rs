//! Sorted merge over two bitmaps' block keys.

use core::cmp::Ordering;

use crate::store::Store;

use super::RoaringBitmap;

impl RoaringBitmap {
    /// Returns true if the set has no elements in common with `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_block_rs::RoaringBitmap;
    ///
    /// let mut rb1 = RoaringBitmap::new();
    /// let mut rb2 = RoaringBitmap::new();
    /// rb1.insert(1);
    /// assert!(rb1.is_disjoint(&rb2));
    /// rb2.insert(1);
    /// assert!(!rb1.is_disjoint(&rb2));
    /// ```
    pub fn is_disjoint(&self, other: &Self) -> bool {
        Pairs::new(&self.keys, &self.data, &other.keys, &other.data)
            .filter_map(|(a, b)| a.zip(b))
            .all(|(a, b)| a.is_disjoint(b))
    }

    /// Returns `true` if this set is a subset of `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_block_rs::RoaringBitmap;
    ///
    /// let mut rb1 = RoaringBitmap::new();
    /// let mut rb2 = RoaringBitmap::new();
    /// rb1.insert(1);
    /// assert!(!rb1.is_subset(&rb2));
    /// rb2.insert(1);
    /// assert!(rb1.is_subset(&rb2));
    /// rb1.insert(2);
    /// assert!(!rb1.is_subset(&rb2));
    /// ```
    pub fn is_subset(&self, other: &Self) -> bool {
        for (a, b) in Pairs::new(&self.keys, &self.data, &other.keys, &other.data) {
            match (a, b) {
                (None, _) => (),
                (Some(_), None) => return false,
                (Some(a), Some(b)) => {
                    if !a.is_subset(b) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Returns `true` if this set is a superset of `other`.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }
}

/// Walks two `(keys, data)` block lists in key order, yielding a pair of
/// `Option<&Store>` per distinct key: `Some` on the side(s) that have a
/// block at that key, `None` on the side that doesn't.
pub(crate) struct Pairs<'a> {
    left_keys: &'a [u16],
    left_data: &'a [Store],
    right_keys: &'a [u16],
    right_data: &'a [Store],
    li: usize,
    ri: usize,
}

impl<'a> Pairs<'a> {
    pub fn new(
        left_keys: &'a [u16],
        left_data: &'a [Store],
        right_keys: &'a [u16],
        right_data: &'a [Store],
    ) -> Pairs<'a> {
        Pairs { left_keys, left_data, right_keys, right_data, li: 0, ri: 0 }
    }
}

impl<'a> Iterator for Pairs<'a> {
    type Item = (Option<&'a Store>, Option<&'a Store>);

    fn next(&mut self) -> Option<Self::Item> {
        match (self.left_keys.get(self.li), self.right_keys.get(self.ri)) {
            (None, None) => None,
            (Some(_), None) => {
                let out = &self.left_data[self.li];
                self.li += 1;
                Some((Some(out), None))
            }
            (None, Some(_)) => {
                let out = &self.right_data[self.ri];
                self.ri += 1;
                Some((None, Some(out)))
            }
            (Some(&lk), Some(&rk)) => match lk.cmp(&rk) {
                Ordering::Equal => {
                    let out = (Some(&self.left_data[self.li]), Some(&self.right_data[self.ri]));
                    self.li += 1;
                    self.ri += 1;
                    Some(out)
                }
                Ordering::Less => {
                    let out = &self.left_data[self.li];
                    self.li += 1;
                    Some((Some(out), None))
                }
                Ordering::Greater => {
                    let out = &self.right_data[self.ri];
                    self.ri += 1;
                    Some((None, Some(out)))
                }
            },
        }
    }
}
