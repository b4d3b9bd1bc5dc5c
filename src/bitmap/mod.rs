mod arbitrary;
mod cmp;
mod fmt;
mod inherent;
mod iter;
mod multiops;
mod ops;
mod proptests;
#[cfg(feature = "serde")]
mod serde;
#[cfg(feature = "std")]
pub(crate) mod serialization;
mod statistics;

pub(crate) use self::cmp::Pairs;
pub use self::iter::IntoIter;
pub use self::iter::Iter;
pub use self::multiops::MultiOps;
pub use self::statistics::Statistics;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::store::Store;

/// A compressed bitset over `u32`, backed by per-65536-value blocks that
/// each pick whichever of the three block representations best fits their
/// own cardinality.
///
/// # Examples
///
/// ```rust
/// use roaring_block_rs::RoaringBitmap;
///
/// let mut rb = RoaringBitmap::new();
/// rb.insert(2);
/// rb.insert(3);
/// rb.insert(5);
/// rb.insert(7);
/// assert_eq!(rb.len(), 4);
/// ```
#[derive(Clone, PartialEq)]
pub struct RoaringBitmap {
    pub(crate) keys: Vec<u16>,
    pub(crate) data: Vec<Store>,
}

impl RoaringBitmap {
    /// Binary searches for `key` among the block keys.
    pub(crate) fn find_block(&self, key: u16) -> Result<usize, usize> {
        self.keys.binary_search(&key)
    }

    /// Returns the block for `key`, creating an empty one in sorted position
    /// if it doesn't already exist.
    pub(crate) fn get_or_insert_block(&mut self, key: u16) -> &mut Store {
        let index = match self.find_block(key) {
            Ok(i) => i,
            Err(i) => {
                self.keys.insert(i, key);
                self.data.insert(i, Store::new());
                i
            }
        };
        &mut self.data[index]
    }

    /// Drops the block at `index` if it's now empty. Keeps `keys`/`data` in
    /// sync since they're always indexed together.
    pub(crate) fn remove_block_if_empty(&mut self, index: usize) {
        if self.data[index].is_empty() {
            self.keys.remove(index);
            self.data.remove(index);
        }
    }

    pub(crate) fn remove_block_at(&mut self, index: usize) {
        self.keys.remove(index);
        self.data.remove(index);
    }
}
