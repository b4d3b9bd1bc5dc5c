//! A compressed bitset over `u32` using the Roaring bitmap scheme: values
//! are split into a 16-bit block key and a 16-bit in-block index, and each
//! block independently picks whichever of three representations best fits
//! its own cardinality — a dense 65536-bit vector, a sorted array of present
//! values, or a sorted array of absent values.
//!
//! Beyond the mutable [`RoaringBitmap`], the crate also exposes an immutable,
//! byte-addressable [`frozen`] form meant to be read directly out of a
//! memory-mapped file without deserialization, and a [`frozen::multi`]
//! construct for grouping many such bitmaps behind one buffer.
//!
//! ```rust
//! use roaring_block_rs::RoaringBitmap;
//!
//! let mut rb = RoaringBitmap::new();
//! rb.insert(2);
//! rb.insert(3);
//! rb.insert(5);
//! rb.insert(7);
//! assert_eq!(rb.len(), 4);
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod arrayops;
mod bitmap;
mod bitops;
mod error;
mod frozen;
mod growth;
mod store;
mod util;

pub use crate::bitmap::{IntoIter, Iter, MultiOps, RoaringBitmap, Statistics};
pub use crate::error::{Error, ErrorKind, NonSortedIntegers};
pub use crate::frozen::multi::{FrozenMultiBitmap, FrozenMultiBitmapBuilder};
pub use crate::frozen::FrozenBitmap;
