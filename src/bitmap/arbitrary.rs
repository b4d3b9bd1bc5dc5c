//! A `proptest` strategy for generating bitmaps, used by the property tests
//! in [`super::proptests`] and [`super::serde`].
#![cfg(test)]

use proptest::collection::vec;
use proptest::prelude::*;

use crate::RoaringBitmap;

impl RoaringBitmap {
    /// Generates bitmaps spanning all three block representations: a wide
    /// value range combined with a generous count naturally produces
    /// sparse, dense and near-full blocks in the same bitmap.
    pub(crate) fn arbitrary() -> impl Strategy<Value = RoaringBitmap> {
        vec(any::<u32>(), 0..4096).prop_map(|values| values.into_iter().collect())
    }
}
