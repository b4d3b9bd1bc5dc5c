use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::store;

use super::{Pairs, RoaringBitmap};

impl RoaringBitmap {
    /// Cardinality of the intersection with `other`, without building it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_block_rs::RoaringBitmap;
    ///
    /// let a: RoaringBitmap = (1..4).collect();
    /// let b: RoaringBitmap = (3..5).collect();
    /// assert_eq!(a.intersection_len(&b), (&a & &b).len());
    /// ```
    pub fn intersection_len(&self, other: &RoaringBitmap) -> u64 {
        Pairs::new(&self.keys, &self.data, &other.keys, &other.data)
            .filter_map(|(a, b)| a.zip(b))
            .map(|(a, b)| a.and_len(b))
            .sum()
    }

    /// Cardinality of the union with `other`, without building it.
    pub fn union_len(&self, other: &RoaringBitmap) -> u64 {
        self.len() + other.len() - self.intersection_len(other)
    }

    /// Cardinality of the difference with `other`, without building it.
    pub fn difference_len(&self, other: &RoaringBitmap) -> u64 {
        self.len() - self.intersection_len(other)
    }

    /// Cardinality of the symmetric difference with `other`, without
    /// building it.
    pub fn symmetric_difference_len(&self, other: &RoaringBitmap) -> u64 {
        let intersection = self.intersection_len(other);
        self.len() + other.len() - 2 * intersection
    }

    /// Jaccard distance `1 - |A ∩ B| / |A ∪ B|`, `0.0` for two empty sets.
    pub fn jaccard_dist(&self, other: &RoaringBitmap) -> f64 {
        let union = self.union_len(other);
        if union == 0 {
            return 0.0;
        }
        1.0 - (self.intersection_len(other) as f64 / union as f64)
    }
}

impl BitAndAssign<&RoaringBitmap> for RoaringBitmap {
    /// In-place intersection: a classic sorted two-pointer merge over both
    /// key arrays, keeping only matching blocks and dropping any that
    /// intersect to empty.
    fn bitand_assign(&mut self, rhs: &RoaringBitmap) {
        let mut keys = Vec::new();
        let mut data = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.keys.len() && j < rhs.keys.len() {
            match self.keys[i].cmp(&rhs.keys[j]) {
                core::cmp::Ordering::Less => i += 1,
                core::cmp::Ordering::Greater => j += 1,
                core::cmp::Ordering::Equal => {
                    let r = store::and(&self.data[i], &rhs.data[j]);
                    if !r.is_empty() {
                        keys.push(self.keys[i]);
                        data.push(r);
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        self.keys = keys;
        self.data = data;
    }
}

impl BitOrAssign<&RoaringBitmap> for RoaringBitmap {
    /// In-place union: sorted two-pointer merge, copying over any block
    /// that's only on the right.
    fn bitor_assign(&mut self, rhs: &RoaringBitmap) {
        let mut keys = Vec::with_capacity(self.keys.len() + rhs.keys.len());
        let mut data = Vec::with_capacity(self.keys.len() + rhs.keys.len());
        let (mut i, mut j) = (0, 0);
        while i < self.keys.len() && j < rhs.keys.len() {
            match self.keys[i].cmp(&rhs.keys[j]) {
                core::cmp::Ordering::Less => {
                    keys.push(self.keys[i]);
                    data.push(self.data[i].clone());
                    i += 1;
                }
                core::cmp::Ordering::Greater => {
                    keys.push(rhs.keys[j]);
                    data.push(rhs.data[j].clone());
                    j += 1;
                }
                core::cmp::Ordering::Equal => {
                    keys.push(self.keys[i]);
                    data.push(store::or(&self.data[i], &rhs.data[j]));
                    i += 1;
                    j += 1;
                }
            }
        }
        keys.extend_from_slice(&self.keys[i..]);
        data.extend_from_slice(&self.data[i..]);
        keys.extend_from_slice(&rhs.keys[j..]);
        data.extend_from_slice(&rhs.data[j..]);
        self.keys = keys;
        self.data = data;
    }
}

impl BitXorAssign<&RoaringBitmap> for RoaringBitmap {
    /// In-place symmetric difference: sorted two-pointer merge, dropping
    /// any block that XORs to empty.
    fn bitxor_assign(&mut self, rhs: &RoaringBitmap) {
        let mut keys = Vec::with_capacity(self.keys.len() + rhs.keys.len());
        let mut data = Vec::with_capacity(self.keys.len() + rhs.keys.len());
        let (mut i, mut j) = (0, 0);
        while i < self.keys.len() && j < rhs.keys.len() {
            match self.keys[i].cmp(&rhs.keys[j]) {
                core::cmp::Ordering::Less => {
                    keys.push(self.keys[i]);
                    data.push(self.data[i].clone());
                    i += 1;
                }
                core::cmp::Ordering::Greater => {
                    keys.push(rhs.keys[j]);
                    data.push(rhs.data[j].clone());
                    j += 1;
                }
                core::cmp::Ordering::Equal => {
                    let r = store::xor(&self.data[i], &rhs.data[j]);
                    if !r.is_empty() {
                        keys.push(self.keys[i]);
                        data.push(r);
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        keys.extend_from_slice(&self.keys[i..]);
        data.extend_from_slice(&self.data[i..]);
        keys.extend_from_slice(&rhs.keys[j..]);
        data.extend_from_slice(&rhs.data[j..]);
        self.keys = keys;
        self.data = data;
    }
}

impl SubAssign<&RoaringBitmap> for RoaringBitmap {
    /// In-place difference.
    fn sub_assign(&mut self, rhs: &RoaringBitmap) {
        let mut keys = Vec::new();
        let mut data = Vec::new();
        for (i, key) in self.keys.iter().enumerate() {
            let store = match rhs.find_block(*key) {
                Ok(j) => store::sub(&self.data[i], &rhs.data[j]),
                Err(_) => self.data[i].clone(),
            };
            if !store.is_empty() {
                keys.push(*key);
                data.push(store);
            }
        }
        self.keys = keys;
        self.data = data;
    }
}

macro_rules! forward_owned_assign {
    ($assign_trait:ident, $assign_method:ident) => {
        impl $assign_trait<RoaringBitmap> for RoaringBitmap {
            fn $assign_method(&mut self, rhs: RoaringBitmap) {
                $assign_trait::$assign_method(self, &rhs);
            }
        }
    };
}

forward_owned_assign!(BitAndAssign, bitand_assign);
forward_owned_assign!(BitOrAssign, bitor_assign);
forward_owned_assign!(BitXorAssign, bitxor_assign);
forward_owned_assign!(SubAssign, sub_assign);

macro_rules! forward_owned_ops {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident) => {
        impl $trait<RoaringBitmap> for RoaringBitmap {
            type Output = RoaringBitmap;
            fn $method(mut self, rhs: RoaringBitmap) -> RoaringBitmap {
                $assign_trait::$assign_method(&mut self, &rhs);
                self
            }
        }

        impl $trait<&RoaringBitmap> for RoaringBitmap {
            type Output = RoaringBitmap;
            fn $method(mut self, rhs: &RoaringBitmap) -> RoaringBitmap {
                $assign_trait::$assign_method(&mut self, rhs);
                self
            }
        }

        impl $trait<&RoaringBitmap> for &RoaringBitmap {
            type Output = RoaringBitmap;
            fn $method(self, rhs: &RoaringBitmap) -> RoaringBitmap {
                let mut out = self.clone();
                $assign_trait::$assign_method(&mut out, rhs);
                out
            }
        }
    };
}

forward_owned_ops!(BitAnd, bitand, BitAndAssign, bitand_assign);
forward_owned_ops!(BitOr, bitor, BitOrAssign, bitor_assign);
forward_owned_ops!(BitXor, bitxor, BitXorAssign, bitxor_assign);
forward_owned_ops!(Sub, sub, SubAssign, sub_assign);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn and_or_xor_sub_across_blocks() {
        let a: RoaringBitmap = [1u32, 2, 3, 100_000].into_iter().collect();
        let b: RoaringBitmap = [2u32, 3, 4, 100_000, 200_000].into_iter().collect();

        let and: Vec<u32> = (&a & &b).into_iter().collect();
        assert_eq!(and, vec![2, 3, 100_000]);

        let or: Vec<u32> = (&a | &b).into_iter().collect();
        assert_eq!(or, vec![1, 2, 3, 4, 100_000, 200_000]);

        let xor: Vec<u32> = (&a ^ &b).into_iter().collect();
        assert_eq!(xor, vec![1, 4, 200_000]);

        let sub: Vec<u32> = (&a - &b).into_iter().collect();
        assert_eq!(sub, vec![1]);

        assert_eq!(a.intersection_len(&b), 3);
        assert_eq!(a.union_len(&b), 6);
        assert_eq!(a.difference_len(&b), 1);
        assert_eq!(a.symmetric_difference_len(&b), 3);
    }
}
