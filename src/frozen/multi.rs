//! Several frozen images packed into one byte region: a small header table
//! of child offsets/sizes followed by the child images themselves, so a
//! group of related bitmaps can be memory-mapped and indexed as a unit.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::error::{Error, ErrorKind};
use crate::frozen::FrozenBitmap;
use crate::store::{self, Store};
use crate::RoaringBitmap;

const ALIGN: usize = 32;
const COUNT_BYTES: usize = 4;
const ENTRY_BYTES: usize = 4;

#[inline]
fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) / align * align
}

/// Builds a multi-bitmap image from a list of bitmaps, computing a single
/// aligned byte region containing the header followed by each child image.
#[derive(Default)]
pub struct FrozenMultiBitmapBuilder {
    children: Vec<RoaringBitmap>,
}

impl FrozenMultiBitmapBuilder {
    pub fn new() -> Self {
        FrozenMultiBitmapBuilder { children: Vec::new() }
    }

    /// Appends a bitmap to the group, returning its index.
    pub fn push(&mut self, bitmap: RoaringBitmap) -> usize {
        self.children.push(bitmap);
        self.children.len() - 1
    }

    /// Encodes the collected bitmaps into a multi-bitmap byte image.
    pub fn build(self) -> Vec<u8> {
        let count = self.children.len();
        let images: Vec<Vec<u8>> = self.children.iter().map(RoaringBitmap::to_frozen_bytes).collect();

        let header_bytes = COUNT_BYTES + count * ENTRY_BYTES * 2;
        let children_start = align_up(header_bytes, ALIGN);

        let mut offsets = Vec::with_capacity(count);
        let mut total = children_start;
        for image in &images {
            offsets.push(total as u32);
            total += align_up(image.len(), ALIGN);
        }

        let mut out = vec![0u8; total];
        out[0..4].copy_from_slice(&(count as u32).to_le_bytes());
        for (i, &offset) in offsets.iter().enumerate() {
            let at = COUNT_BYTES + i * ENTRY_BYTES;
            out[at..at + 4].copy_from_slice(&offset.to_le_bytes());
        }
        for (i, image) in images.iter().enumerate() {
            let at = COUNT_BYTES + count * ENTRY_BYTES + i * ENTRY_BYTES;
            out[at..at + 4].copy_from_slice(&(image.len() as u32).to_le_bytes());
        }
        for (image, &offset) in images.iter().zip(offsets.iter()) {
            let start = offset as usize;
            out[start..start + image.len()].copy_from_slice(image);
        }

        out
    }
}

/// A group of frozen bitmaps borrowed from a single byte region, indexable
/// by position.
pub struct FrozenMultiBitmap<'a> {
    bytes: &'a [u8],
    count: usize,
}

impl<'a> FrozenMultiBitmap<'a> {
    /// Attaches to `bytes`, validating the header table and every child
    /// image before returning. Fails with [`ErrorKind::MalformedImage`] on
    /// any inconsistency.
    pub fn new(bytes: &'a [u8]) -> Result<FrozenMultiBitmap<'a>, Error> {
        if bytes.len() < COUNT_BYTES {
            return Err(malformed("image shorter than the count field"));
        }
        let count = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;

        let header_bytes = COUNT_BYTES + count * ENTRY_BYTES * 2;
        if bytes.len() < header_bytes {
            return Err(malformed("image too short for its offset and size tables"));
        }

        for i in 0..count {
            let (offset, size) = Self::entry(bytes, count, i);
            let end = offset.checked_add(size).ok_or_else(|| malformed("child image size overflows"))?;
            if end > bytes.len() {
                return Err(malformed("child image extends past the end of the region"));
            }
            FrozenBitmap::new(&bytes[offset..end])?;
        }

        Ok(FrozenMultiBitmap { bytes, count })
    }

    fn entry(bytes: &[u8], count: usize, i: usize) -> (usize, usize) {
        let offset_at = COUNT_BYTES + i * ENTRY_BYTES;
        let size_at = COUNT_BYTES + count * ENTRY_BYTES + i * ENTRY_BYTES;
        let offset = u32::from_le_bytes(bytes[offset_at..offset_at + 4].try_into().unwrap()) as usize;
        let size = u32::from_le_bytes(bytes[size_at..size_at + 4].try_into().unwrap()) as usize;
        (offset, size)
    }

    /// Number of bitmaps in the group.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns a frozen view of the bitmap at `index`, or `None` if out of
    /// range.
    pub fn get(&self, index: usize) -> Option<FrozenBitmap<'a>> {
        if index >= self.count {
            return None;
        }
        let (offset, size) = Self::entry(self.bytes, self.count, index);
        // Already validated in `new`.
        Some(FrozenBitmap::new(&self.bytes[offset..offset + size]).unwrap())
    }

    /// Intersects the bitmaps at `indices`, computed entirely against the
    /// mmapped byte region: block keys are walked directly off each child's
    /// header table via `find_block`/`store_at` and folded with
    /// `store::and`, so only the blocks that actually survive the
    /// intersection are ever decoded — no child is materialized into a full
    /// [`RoaringBitmap`]. Smallest child first so the accumulator shrinks
    /// (and can short-circuit to empty) as early as possible. Fails with
    /// [`ErrorKind::OutOfRange`] if any index is out of bounds.
    pub fn intersection(&self, indices: &[usize]) -> Result<RoaringBitmap, Error> {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_by_key(|&i| self.entry_size(i));

        let mut iter = sorted.into_iter();
        let (mut keys, mut data): (Vec<u16>, Vec<Store>) = match iter.next() {
            Some(i) => {
                let first = self.child(i)?;
                let mut keys = Vec::with_capacity(first.block_count());
                let mut data = Vec::with_capacity(first.block_count());
                for b in 0..first.block_count() {
                    keys.push(first.key_at(b));
                    data.push(first.store_at(b));
                }
                (keys, data)
            }
            None => return Ok(RoaringBitmap::new()),
        };

        for i in iter {
            if keys.is_empty() {
                break;
            }
            let child = self.child(i)?;
            let mut new_keys = Vec::with_capacity(keys.len());
            let mut new_data = Vec::with_capacity(data.len());
            for (key, store) in keys.iter().zip(data.iter()) {
                if let Ok(j) = child.find_block(*key) {
                    let merged = store::and(store, &child.store_at(j));
                    if !merged.is_empty() {
                        new_keys.push(*key);
                        new_data.push(merged);
                    }
                }
            }
            keys = new_keys;
            data = new_data;
        }

        Ok(RoaringBitmap { keys, data })
    }

    fn child(&self, index: usize) -> Result<FrozenBitmap<'a>, Error> {
        self.get(index).ok_or_else(|| Error::new(ErrorKind::OutOfRange))
    }

    fn entry_size(&self, index: usize) -> usize {
        if index >= self.count {
            return 0;
        }
        Self::entry(self.bytes, self.count, index).1
    }
}

fn malformed(detail: &'static str) -> Error {
    Error::with_detail(ErrorKind::MalformedImage, detail)
}
