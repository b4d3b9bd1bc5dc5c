//! Multi-operand reductions over many bitmaps at once, scheduled to avoid
//! the quadratic blowup of folding left with the binary operators directly.

use core::cmp::{Ordering, Reverse};

#[cfg(not(feature = "std"))]
use alloc::collections::BinaryHeap;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::collections::BinaryHeap;

use crate::RoaringBitmap;

/// Set-algebra reductions over a collection of bitmaps, named after Python's
/// `set.update`/`set.intersection_update`/etc. since this crate's multi-bitmap
/// story intentionally mirrors that API.
pub trait MultiOps<T> {
    type Output;

    /// Union of every bitmap, merged pairwise smallest-first.
    fn update(self) -> Self::Output;

    /// Intersection of every bitmap, folded smallest-first so the
    /// accumulator shrinks (and can short-circuit to empty) as fast as
    /// possible.
    fn intersection_update(self) -> Self::Output;

    /// Difference of the first bitmap minus every other, in iteration order.
    fn difference_update(self) -> Self::Output;

    /// Symmetric difference of every bitmap, in iteration order.
    fn symmetric_difference_update(self) -> Self::Output;
}

impl<I> MultiOps<RoaringBitmap> for I
where
    I: IntoIterator<Item = RoaringBitmap>,
{
    type Output = RoaringBitmap;

    fn update(self) -> RoaringBitmap {
        union_owned(self)
    }

    fn intersection_update(self) -> RoaringBitmap {
        intersection_owned(self)
    }

    fn difference_update(self) -> RoaringBitmap {
        difference_owned(self)
    }

    fn symmetric_difference_update(self) -> RoaringBitmap {
        symmetric_difference_owned(self)
    }
}

impl<'a, I> MultiOps<&'a RoaringBitmap> for I
where
    I: IntoIterator<Item = &'a RoaringBitmap>,
{
    type Output = RoaringBitmap;

    fn update(self) -> RoaringBitmap {
        union_owned(self.into_iter().cloned())
    }

    fn intersection_update(self) -> RoaringBitmap {
        intersection_owned(self.into_iter().cloned())
    }

    fn difference_update(self) -> RoaringBitmap {
        difference_owned(self.into_iter().cloned())
    }

    fn symmetric_difference_update(self) -> RoaringBitmap {
        symmetric_difference_owned(self.into_iter().cloned())
    }
}

/// Orders bitmaps by block count so a min-heap can always merge the two
/// currently-smallest operands, keeping every pairwise union cheap.
struct BySize(RoaringBitmap);

impl BySize {
    fn block_count(&self) -> usize {
        self.0.keys.len()
    }
}

impl PartialEq for BySize {
    fn eq(&self, other: &Self) -> bool {
        self.block_count() == other.block_count()
    }
}

impl Eq for BySize {}

impl PartialOrd for BySize {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BySize {
    fn cmp(&self, other: &Self) -> Ordering {
        self.block_count().cmp(&other.block_count())
    }
}

fn union_owned<I: IntoIterator<Item = RoaringBitmap>>(bitmaps: I) -> RoaringBitmap {
    let mut heap: BinaryHeap<Reverse<BySize>> =
        bitmaps.into_iter().map(|b| Reverse(BySize(b))).collect();

    while heap.len() > 1 {
        let Reverse(a) = heap.pop().unwrap();
        let Reverse(b) = heap.pop().unwrap();
        let merged = a.0 | b.0;
        heap.push(Reverse(BySize(merged)));
    }

    heap.pop().map(|Reverse(b)| b.0).unwrap_or_default()
}

fn intersection_owned<I: IntoIterator<Item = RoaringBitmap>>(bitmaps: I) -> RoaringBitmap {
    let mut items: Vec<RoaringBitmap> = bitmaps.into_iter().collect();
    items.sort_unstable_by_key(|b| b.keys.len());
    let mut iter = items.into_iter();

    match iter.next() {
        Some(mut acc) => {
            for rhs in iter {
                if acc.is_empty() {
                    return acc;
                }
                acc &= &rhs;
            }
            acc
        }
        None => RoaringBitmap::new(),
    }
}

fn difference_owned<I: IntoIterator<Item = RoaringBitmap>>(bitmaps: I) -> RoaringBitmap {
    let mut iter = bitmaps.into_iter();
    match iter.next() {
        Some(mut acc) => {
            for rhs in iter {
                if acc.is_empty() {
                    return acc;
                }
                acc -= &rhs;
            }
            acc
        }
        None => RoaringBitmap::new(),
    }
}

fn symmetric_difference_owned<I: IntoIterator<Item = RoaringBitmap>>(bitmaps: I) -> RoaringBitmap {
    let mut iter = bitmaps.into_iter();
    match iter.next() {
        Some(mut acc) => {
            for rhs in iter {
                acc ^= &rhs;
            }
            acc
        }
        None => RoaringBitmap::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn update_unions_every_bitmap() {
        let bitmaps = vec![
            RoaringBitmap::from_iter([1u32, 2, 3]),
            RoaringBitmap::from_iter([3u32, 4, 70_000]),
            RoaringBitmap::from_iter([70_000, 200_000]),
        ];
        let result: RoaringBitmap = bitmaps.update();
        assert_eq!(result, RoaringBitmap::from_iter([1, 2, 3, 4, 70_000, 200_000]));
    }

    #[test]
    fn intersection_update_shrinks_and_short_circuits() {
        let bitmaps = vec![
            RoaringBitmap::from_iter([1u32, 2, 3, 4]),
            RoaringBitmap::from_iter([2u32, 3, 4]),
            RoaringBitmap::from_iter([5u32, 6]),
        ];
        let result: RoaringBitmap = bitmaps.intersection_update();
        assert!(result.is_empty());
    }

    #[test]
    fn difference_and_symmetric_difference_update() {
        let a = RoaringBitmap::from_iter([1u32, 2, 3]);
        let b = RoaringBitmap::from_iter([2u32, 3]);
        let c = RoaringBitmap::from_iter([3u32, 4]);

        let diff: RoaringBitmap = vec![a.clone(), b.clone(), c.clone()].difference_update();
        assert_eq!(diff, RoaringBitmap::from_iter([1]));

        let xor: RoaringBitmap = vec![a, b, c].symmetric_difference_update();
        assert_eq!(xor, RoaringBitmap::from_iter([1, 4]));
    }
}
