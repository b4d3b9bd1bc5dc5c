//! A read-only bitmap that attaches directly to a byte region — a memory
//! map, a `&[u8]` slice borrowed from a bigger file — without copying or
//! decoding it up front. Block buffers are addressed as offsets relative to
//! the region's start; turning one into usable data means decoding that one
//! block's bytes, not the whole image.
//!
//! This is a different on-disk shape from [`crate::bitmap::serialization`]'s
//! portable format: that one is a lossless interchange format for other
//! Roaring implementations, this one is a layout a reader can borrow
//! in place.

pub mod multi;

use core::hash::{Hash, Hasher};

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec;

use crate::bitmap::RoaringBitmap;
use crate::bitops::WORDS;
use crate::error::{Error, ErrorKind};
use crate::store::dense::DenseStore;
use crate::store::inverted::InvertedStore;
use crate::store::positive::PositiveStore;
use crate::store::{self, Store, ARRAY_LIMIT, INVERTED_LIMIT, UNIVERSE};
use crate::util;

/// All region offsets/sizes land on this boundary.
const ALIGN: usize = 32;
const SIZE_FIELD_BYTES: usize = 4;
const HEADER_BYTES: usize = 16;

const STATE_DENSE: u8 = 0;
const STATE_POSITIVE: u8 = 1;
const STATE_INVERTED: u8 = 2;

#[inline]
fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) / align * align
}

struct BlockHeader {
    state: u8,
    cardinality: u32,
    capacity: u16,
    offset: u64,
}

impl BlockHeader {
    fn encode(&self, out: &mut [u8]) {
        out[0] = self.state;
        out[1..5].copy_from_slice(&self.cardinality.to_le_bytes());
        out[5..7].copy_from_slice(&self.capacity.to_le_bytes());
        out[7] = 0;
        out[8..16].copy_from_slice(&self.offset.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> BlockHeader {
        BlockHeader {
            state: bytes[0],
            cardinality: u32::from_le_bytes(bytes[1..5].try_into().unwrap()),
            capacity: u16::from_le_bytes(bytes[5..7].try_into().unwrap()),
            offset: u64::from_le_bytes(bytes[8..16].try_into().unwrap()),
        }
    }

    /// Byte length of this block's raw buffer, derived from its own fields
    /// rather than trusted as a separate stored value.
    fn buffer_len(&self) -> usize {
        match self.state {
            STATE_DENSE => usize::from(self.capacity) * 8,
            _ => usize::from(self.capacity) * 2,
        }
    }
}

/// Layout of a frozen image: where the key table, header table and buffer
/// region each start, computed the same way by both the writer and the
/// reader.
#[derive(Clone, Copy)]
struct Layout {
    headers_start: usize,
    buffers_start: usize,
}

impl Layout {
    fn new(size: usize) -> Layout {
        let keys_end = SIZE_FIELD_BYTES + size * 2;
        let headers_start = align_up(keys_end, ALIGN);
        let headers_end = headers_start + size * HEADER_BYTES;
        let buffers_start = align_up(headers_end, ALIGN);
        Layout { headers_start, buffers_start }
    }
}

/// An immutable bitmap borrowed from a byte region laid out per the
/// frozen/mmap format.
pub struct FrozenBitmap<'a> {
    bytes: &'a [u8],
    size: usize,
    layout: Layout,
    len: u64,
}

impl<'a> FrozenBitmap<'a> {
    /// Attaches to `bytes`, validating the header table and every block's
    /// declared bounds before returning. Fails with
    /// [`ErrorKind::MalformedImage`] on any inconsistency.
    pub fn new(bytes: &'a [u8]) -> Result<FrozenBitmap<'a>, Error> {
        if bytes.len() < SIZE_FIELD_BYTES {
            return Err(malformed("image shorter than the size field"));
        }
        let size = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let layout = Layout::new(size);
        if bytes.len() < layout.headers_start + size * HEADER_BYTES {
            return Err(malformed("image too short for its key and header tables"));
        }
        if bytes.len() < layout.buffers_start {
            return Err(malformed("image too short for its padded header table"));
        }

        let mut len = 0u64;
        let mut prev_key: Option<u16> = None;
        for i in 0..size {
            let key = read_key(bytes, i);
            if let Some(prev) = prev_key {
                if key <= prev {
                    return Err(malformed("block keys are not strictly increasing"));
                }
            }
            prev_key = Some(key);

            let header = read_header(bytes, &layout, i);
            validate_header(&header)?;

            let end = (header.offset as usize)
                .checked_add(header.buffer_len())
                .ok_or_else(|| malformed("block buffer offset overflows"))?;
            if end > bytes.len() {
                return Err(malformed("block buffer extends past the end of the image"));
            }

            len += u64::from(header.cardinality);
        }

        Ok(FrozenBitmap { bytes, size, layout, len })
    }

    pub(crate) fn key_at(&self, i: usize) -> u16 {
        read_key(self.bytes, i)
    }

    fn header_at(&self, i: usize) -> BlockHeader {
        read_header(self.bytes, &self.layout, i)
    }

    /// Number of blocks in this bitmap's header table.
    pub(crate) fn block_count(&self) -> usize {
        self.size
    }

    pub(crate) fn find_block(&self, key: u16) -> Result<usize, usize> {
        let mut lo = 0usize;
        let mut hi = self.size;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.key_at(mid).cmp(&key) {
                core::cmp::Ordering::Less => lo = mid + 1,
                core::cmp::Ordering::Greater => hi = mid,
                core::cmp::Ordering::Equal => return Ok(mid),
            }
        }
        Err(lo)
    }

    pub(crate) fn store_at(&self, i: usize) -> Store {
        decode_store(self.bytes, &self.header_at(i))
    }

    /// Returns `true` if `value` is in the set.
    pub fn contains(&self, value: u32) -> bool {
        let (key, index) = util::split(value);
        match self.find_block(key) {
            Ok(i) => self.store_at(i).contains(index),
            Err(_) => false,
        }
    }

    /// Number of values in the set.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn min(&self) -> Option<u32> {
        if self.size == 0 {
            return None;
        }
        let low = self.store_at(0).min().unwrap();
        Some(util::join(self.key_at(0), low))
    }

    pub fn max(&self) -> Option<u32> {
        if self.size == 0 {
            return None;
        }
        let last = self.size - 1;
        let low = self.store_at(last).max().unwrap();
        Some(util::join(self.key_at(last), low))
    }

    /// Number of values `<= value`.
    pub fn rank(&self, value: u32) -> u64 {
        let (key, index) = util::split(value);
        let mut rank = 0;
        for i in 0..self.size {
            let k = self.key_at(i);
            if k < key {
                rank += u64::from(self.header_at(i).cardinality);
            } else if k == key {
                rank += self.store_at(i).rank(index);
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
        for i in 0..self.size {
            let block_len = self.header_at(i).cardinality;
            if remaining < block_len {
                let low = self.store_at(i).select(remaining).unwrap();
                return Ok(util::join(self.key_at(i), low));
            }
            remaining -= block_len;
        }
        Err(Error::new(ErrorKind::OutOfRange))
    }

    /// Materializes every element into a mutable bitmap.
    pub fn thaw(&self) -> RoaringBitmap {
        let mut keys = Vec::with_capacity(self.size);
        let mut data = Vec::with_capacity(self.size);
        for i in 0..self.size {
            keys.push(self.key_at(i));
            data.push(self.store_at(i));
        }
        RoaringBitmap { keys, data }
    }

    /// Iterates values in ascending order, decoding one block at a time.
    pub fn iter(&self) -> Iter<'a> {
        Iter { bytes: self.bytes, layout: self.layout, size: self.size, block: 0, current: Vec::new().into_iter() }
    }

    pub(crate) fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> PartialEq for FrozenBitmap<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<'a> Eq for FrozenBitmap<'a> {}

impl<'a> Hash for FrozenBitmap<'a> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.bytes);
    }
}

impl<'a> core::fmt::Debug for FrozenBitmap<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.len() < 16 {
            write!(f, "FrozenBitmap<{:?}>", self.iter().collect::<Vec<u32>>())
        } else {
            write!(
                f,
                "FrozenBitmap<{:?} values between {:?} and {:?}>",
                self.len(),
                self.min().unwrap(),
                self.max().unwrap()
            )
        }
    }
}

/// Iterator over a [`FrozenBitmap`]'s values, decoding one block into a
/// small owned buffer at a time rather than materializing the whole image.
pub struct Iter<'a> {
    bytes: &'a [u8],
    layout: Layout,
    size: usize,
    block: usize,
    current: vec::IntoIter<u32>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            if let Some(v) = self.current.next() {
                return Some(v);
            }
            if self.block >= self.size {
                return None;
            }
            let key = read_key(self.bytes, self.block);
            let header = read_header(self.bytes, &self.layout, self.block);
            let values: Vec<u32> = store::materialize(&decode_store(self.bytes, &header))
                .into_iter()
                .map(|low| util::join(key, low))
                .collect();
            self.current = values.into_iter();
            self.block += 1;
        }
    }
}

impl RoaringBitmap {
    /// Serializes this bitmap into the frozen/mmap byte layout: a reader
    /// can attach to the returned buffer with [`FrozenBitmap::new`] without
    /// any further decoding.
    pub fn to_frozen_bytes(&self) -> Vec<u8> {
        let size = self.data.len();
        let layout = Layout::new(size);

        struct Encoded {
            state: u8,
            cardinality: u32,
            capacity: u16,
            raw: Vec<u8>,
        }

        let mut total = layout.buffers_start;
        let encoded: Vec<Encoded> = self
            .data
            .iter()
            .map(|s| {
                let e = match s {
                    Store::Dense(d) => Encoded {
                        state: STATE_DENSE,
                        cardinality: s.len() as u32,
                        capacity: WORDS as u16,
                        raw: d.words().iter().flat_map(|w| w.to_le_bytes()).collect(),
                    },
                    Store::Positive(p) => Encoded {
                        state: STATE_POSITIVE,
                        cardinality: s.len() as u32,
                        capacity: p.as_slice().len() as u16,
                        raw: p.as_slice().iter().flat_map(|v| v.to_le_bytes()).collect(),
                    },
                    Store::Inverted(i) => Encoded {
                        state: STATE_INVERTED,
                        cardinality: s.len() as u32,
                        capacity: i.absent_slice().len() as u16,
                        raw: i.absent_slice().iter().flat_map(|v| v.to_le_bytes()).collect(),
                    },
                };
                total += align_up(e.raw.len(), ALIGN);
                e
            })
            .collect();

        let mut out = vec![0u8; total];
        out[0..4].copy_from_slice(&(size as u32).to_le_bytes());
        for (i, &key) in self.keys.iter().enumerate() {
            let at = 4 + i * 2;
            out[at..at + 2].copy_from_slice(&key.to_le_bytes());
        }

        let mut offset = layout.buffers_start;
        for (i, e) in encoded.iter().enumerate() {
            let header = BlockHeader {
                state: e.state,
                cardinality: e.cardinality,
                capacity: e.capacity,
                offset: offset as u64,
            };
            let at = layout.headers_start + i * HEADER_BYTES;
            header.encode(&mut out[at..at + HEADER_BYTES]);

            out[offset..offset + e.raw.len()].copy_from_slice(&e.raw);
            offset += align_up(e.raw.len(), ALIGN);
        }

        out
    }
}

fn read_key(bytes: &[u8], i: usize) -> u16 {
    let at = SIZE_FIELD_BYTES + i * 2;
    u16::from_le_bytes(bytes[at..at + 2].try_into().unwrap())
}

fn read_header(bytes: &[u8], layout: &Layout, i: usize) -> BlockHeader {
    let at = layout.headers_start + i * HEADER_BYTES;
    BlockHeader::decode(&bytes[at..at + HEADER_BYTES])
}

fn decode_store(bytes: &[u8], header: &BlockHeader) -> Store {
    let start = header.offset as usize;
    let buf = &bytes[start..start + header.buffer_len()];
    match header.state {
        STATE_DENSE => {
            let mut words = [0u64; WORDS];
            for (w, chunk) in words.iter_mut().zip(buf.chunks_exact(8)) {
                *w = u64::from_le_bytes(chunk.try_into().unwrap());
            }
            Store::Dense(DenseStore::from_words_unchecked(u64::from(header.cardinality), Box::new(words)))
        }
        STATE_POSITIVE => Store::Positive(PositiveStore::from_vec_unchecked(decode_u16_array(buf))),
        _ => {
            Store::Inverted(InvertedStore::from_absent_vec_unchecked(header.cardinality, decode_u16_array(buf)))
        }
    }
}

fn validate_header(header: &BlockHeader) -> Result<(), Error> {
    if header.cardinality == 0 || header.cardinality > UNIVERSE {
        return Err(malformed("block cardinality out of bounds"));
    }
    match header.state {
        STATE_POSITIVE => {
            if header.cardinality >= ARRAY_LIMIT || u32::from(header.capacity) != header.cardinality
            {
                return Err(malformed("positive block cardinality or capacity inconsistent"));
            }
        }
        STATE_DENSE => {
            if header.cardinality < ARRAY_LIMIT
                || header.cardinality > INVERTED_LIMIT
                || usize::from(header.capacity) != WORDS
            {
                return Err(malformed("dense block cardinality or capacity inconsistent"));
            }
        }
        STATE_INVERTED => {
            if header.cardinality <= INVERTED_LIMIT
                || u32::from(header.capacity) != UNIVERSE - header.cardinality
            {
                return Err(malformed("inverted block cardinality or capacity inconsistent"));
            }
        }
        _ => return Err(malformed("unrecognised block state")),
    }
    Ok(())
}

fn decode_u16_array(buf: &[u8]) -> Vec<u16> {
    buf.chunks_exact(2).map(|c| u16::from_le_bytes(c.try_into().unwrap())).collect()
}

fn malformed(detail: &'static str) -> Error {
    Error::with_detail(ErrorKind::MalformedImage, detail)
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> RoaringBitmap {
        let mut rb = RoaringBitmap::new();
        rb.insert_range(0..100); // positive block
        rb.insert_range(70_000..135_000); // dense block
        rb.insert_range(200_000..265_530); // inverted block
        rb
    }

    #[test]
    fn round_trips_through_frozen_bytes() {
        let rb = sample();
        let bytes = rb.to_frozen_bytes();
        let frozen = FrozenBitmap::new(&bytes).unwrap();

        assert_eq!(frozen.len(), rb.len());
        assert_eq!(frozen.min(), rb.min());
        assert_eq!(frozen.max(), rb.max());
        for value in [0u32, 50, 99, 70_000, 100_000, 134_999, 200_000, 265_529] {
            assert_eq!(frozen.contains(value), rb.contains(value));
        }
        assert_eq!(frozen.iter().collect::<Vec<_>>(), rb.iter().collect::<Vec<_>>());
        assert_eq!(frozen.thaw(), rb);
    }

    #[test]
    fn rank_and_select_match_the_mutable_bitmap() {
        let rb = sample();
        let bytes = rb.to_frozen_bytes();
        let frozen = FrozenBitmap::new(&bytes).unwrap();

        assert_eq!(frozen.rank(99), rb.rank(99));
        assert_eq!(frozen.rank(134_999), rb.rank(134_999));
        assert_eq!(frozen.select(0).unwrap(), rb.select(0).unwrap());
        assert_eq!(frozen.select(rb.len() as u32 - 1).unwrap(), rb.select(rb.len() as u32 - 1).unwrap());
        assert!(frozen.select(rb.len() as u32).is_err());
    }

    #[test]
    fn rejects_truncated_images() {
        let rb = sample();
        let bytes = rb.to_frozen_bytes();
        assert!(FrozenBitmap::new(&bytes[..bytes.len() - 1]).is_err());
        assert!(FrozenBitmap::new(&[]).is_err());
    }

    #[test]
    fn rejects_corrupted_header_state() {
        let rb = sample();
        let mut bytes = rb.to_frozen_bytes();
        let layout = Layout::new(rb.data.len());
        bytes[layout.headers_start] = 7; // not a valid state tag
        assert!(FrozenBitmap::new(&bytes).is_err());
    }

    #[test]
    fn rejects_out_of_range_buffer_offset() {
        let rb = sample();
        let mut bytes = rb.to_frozen_bytes();
        let layout = Layout::new(rb.data.len());
        let offset_field = layout.headers_start + 8;
        bytes[offset_field..offset_field + 8].copy_from_slice(&(bytes.len() as u64).to_le_bytes());
        assert!(FrozenBitmap::new(&bytes).is_err());
    }
}
