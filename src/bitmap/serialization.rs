//! The standard on-disk Roaring format: a cookie-prefixed, little-endian
//! container table followed by raw per-block values. This is a separate,
//! older format from the frozen/mmap layout in [`crate::frozen`] — kept so
//! images written here stay byte-compatible with the official C/C++, Java
//! and Go implementations.
//!
//! [format]: https://github.com/RoaringBitmap/RoaringFormatSpec

use std::io;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use core::ops::RangeInclusive;

use crate::bitops::WORDS;
use crate::store::dense::DenseStore;
use crate::store::positive::PositiveStore;
use crate::store::{self, Store, ARRAY_LIMIT};

use super::RoaringBitmap;

/// Cookie written by this crate; marks the run-container-free layout.
pub const SERIAL_COOKIE_NO_RUNCONTAINER: u32 = 12346;
/// Low 16 bits of the cookie used by images that may contain run containers.
/// Only accepted on read; this crate never writes run containers.
pub const SERIAL_COOKIE: u16 = 12347;
/// Below this many containers, the legacy format omits the offset table.
pub const NO_OFFSET_THRESHOLD: usize = 4;
const OFFSET_BYTES: usize = 4;

impl RoaringBitmap {
    /// Number of bytes [`Self::serialize_into`] will write.
    pub fn serialized_size(&self) -> usize {
        let header = 8 + 8 * self.data.len();
        let body: usize = self
            .data
            .iter()
            .map(|store| match store {
                Store::Positive(p) => p.as_slice().len() * 2,
                Store::Dense(_) | Store::Inverted(_) => WORDS * 8,
            })
            .sum();
        header + body
    }

    /// Serializes this bitmap into [the standard Roaring on-disk
    /// format][format]. Compatible with the official C/C++, Java and Go
    /// implementations.
    ///
    /// INVERTED blocks have no counterpart in this format and are written
    /// out as DENSE.
    ///
    /// [format]: https://github.com/RoaringBitmap/RoaringFormatSpec
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_block_rs::RoaringBitmap;
    ///
    /// let rb1: RoaringBitmap = (1..4).collect();
    /// let mut bytes = vec![];
    /// rb1.serialize_into(&mut bytes).unwrap();
    /// let rb2 = RoaringBitmap::deserialize_from(&bytes[..]).unwrap();
    /// assert_eq!(rb1, rb2);
    /// ```
    pub fn serialize_into<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(SERIAL_COOKIE_NO_RUNCONTAINER)?;
        writer.write_u32::<LittleEndian>(self.data.len() as u32)?;

        for (&key, store) in self.keys.iter().zip(self.data.iter()) {
            writer.write_u16::<LittleEndian>(key)?;
            writer.write_u16::<LittleEndian>((store.len() - 1) as u16)?;
        }

        let mut offset = (8 + 8 * self.data.len()) as u32;
        for store in &self.data {
            writer.write_u32::<LittleEndian>(offset)?;
            offset += match store {
                Store::Positive(p) => p.as_slice().len() as u32 * 2,
                Store::Dense(_) | Store::Inverted(_) => WORDS as u32 * 8,
            };
        }

        for store in &self.data {
            match store {
                Store::Positive(p) => {
                    for &value in p.as_slice() {
                        writer.write_u16::<LittleEndian>(value)?;
                    }
                }
                Store::Dense(d) => {
                    for &word in d.words().iter() {
                        writer.write_u64::<LittleEndian>(word)?;
                    }
                }
                Store::Inverted(i) => {
                    for &word in i.to_dense().words().iter() {
                        writer.write_u64::<LittleEndian>(word)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Deserializes a bitmap from [the standard Roaring on-disk
    /// format][format], validating each container as it's read. Also accepts
    /// images written with the legacy run-container cookie.
    ///
    /// [format]: https://github.com/RoaringBitmap/RoaringFormatSpec
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_block_rs::RoaringBitmap;
    ///
    /// let rb1: RoaringBitmap = (1..4).collect();
    /// let mut bytes = vec![];
    /// rb1.serialize_into(&mut bytes).unwrap();
    /// let rb2 = RoaringBitmap::deserialize_from(&bytes[..]).unwrap();
    /// assert_eq!(rb1, rb2);
    /// ```
    pub fn deserialize_from<R: io::Read>(reader: R) -> io::Result<RoaringBitmap> {
        Self::deserialize_from_impl(reader, true)
    }

    /// Deserializes a bitmap from [the standard Roaring on-disk
    /// format][format] without validating container contents. Memory safe,
    /// but a malformed image can produce a bitmap with nonsensical contents
    /// rather than an error. Use only on trusted input.
    ///
    /// [format]: https://github.com/RoaringBitmap/RoaringFormatSpec
    pub fn deserialize_unchecked_from<R: io::Read>(reader: R) -> io::Result<RoaringBitmap> {
        Self::deserialize_from_impl(reader, false)
    }

    fn deserialize_from_impl<R: io::Read>(mut reader: R, checked: bool) -> io::Result<RoaringBitmap> {
        let (count, has_offsets, has_run_containers) = {
            let cookie = reader.read_u32::<LittleEndian>()?;
            if cookie == SERIAL_COOKIE_NO_RUNCONTAINER {
                (reader.read_u32::<LittleEndian>()? as usize, true, false)
            } else if (cookie as u16) == SERIAL_COOKIE {
                let count = ((cookie >> 16) + 1) as usize;
                (count, count >= NO_OFFSET_THRESHOLD, true)
            } else {
                return Err(invalid_data("unknown roaring cookie value"));
            }
        };

        if count > usize::from(u16::MAX) + 1 {
            return Err(invalid_data("container count exceeds the key space"));
        }

        let run_container_bitmap = if has_run_containers {
            let mut bitmap = vec![0u8; (count + 7) / 8];
            reader.read_exact(&mut bitmap)?;
            Some(bitmap)
        } else {
            None
        };

        let mut descriptions = Vec::with_capacity(count);
        for _ in 0..count {
            let key = reader.read_u16::<LittleEndian>()?;
            let cardinality = u32::from(reader.read_u16::<LittleEndian>()?) + 1;
            descriptions.push((key, cardinality));
        }

        if has_offsets {
            let mut offsets = vec![0u8; count * OFFSET_BYTES];
            reader.read_exact(&mut offsets)?;
        }

        let mut keys = Vec::with_capacity(count);
        let mut data = Vec::with_capacity(count);

        for (i, (key, cardinality)) in descriptions.into_iter().enumerate() {
            let is_run_container = run_container_bitmap
                .as_ref()
                .map_or(false, |bitmap| bitmap[i / 8] & (1 << (i % 8)) != 0);

            let mut store = if is_run_container {
                read_run_container(&mut reader)?
            } else if cardinality <= ARRAY_LIMIT {
                let mut values = vec![0u16; cardinality as usize];
                reader.read_u16_into::<LittleEndian>(&mut values)?;
                if checked {
                    validate_strictly_increasing(&values)?;
                }
                Store::Positive(PositiveStore::from_vec_unchecked(values))
            } else {
                let mut words = [0u64; WORDS];
                reader.read_u64_into::<LittleEndian>(&mut words)?;
                let len = words.iter().map(|w| u64::from(w.count_ones())).sum();
                Store::Dense(DenseStore::from_words_unchecked(len, Box::new(words)))
            };
            store::convert(&mut store);

            if let Some(&prev) = keys.last() {
                if checked && key <= prev {
                    return Err(invalid_data("container keys are not strictly increasing"));
                }
            }

            keys.push(key);
            data.push(store);
        }

        Ok(RoaringBitmap { keys, data })
    }
}

fn read_run_container<R: io::Read>(reader: &mut R) -> io::Result<Store> {
    let n_runs = reader.read_u16::<LittleEndian>()?;
    let mut store = Store::new();
    for _ in 0..n_runs {
        let start = reader.read_u16::<LittleEndian>()?;
        let length = reader.read_u16::<LittleEndian>()?;
        let end = start
            .checked_add(length)
            .ok_or_else(|| invalid_data("run container interval overflows u16"))?;
        store.insert_range(RangeInclusive::new(start, end));
    }
    store::convert(&mut store);
    Ok(store)
}

fn validate_strictly_increasing(values: &[u16]) -> io::Result<()> {
    if values.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid_data("array container values are not strictly increasing"));
    }
    Ok(())
}

fn invalid_data(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_across_representations() {
        let mut rb = RoaringBitmap::new();
        rb.insert_range(0..100);
        rb.insert_range(70_000..135_000);
        rb.insert_range(200_000..265_530);

        let mut bytes = Vec::new();
        rb.serialize_into(&mut bytes).unwrap();
        assert_eq!(bytes.len(), rb.serialized_size());

        let back = RoaringBitmap::deserialize_from(&bytes[..]).unwrap();
        assert_eq!(rb, back);
    }

    #[test]
    fn deserialize_unchecked_matches_checked_for_valid_input() {
        let rb: RoaringBitmap = (1..4096).collect();
        let mut bytes = Vec::new();
        rb.serialize_into(&mut bytes).unwrap();

        let checked = RoaringBitmap::deserialize_from(&bytes[..]).unwrap();
        let unchecked = RoaringBitmap::deserialize_unchecked_from(&bytes[..]).unwrap();
        assert_eq!(checked, unchecked);
    }

    #[test]
    fn rejects_unknown_cookie() {
        let bytes = [0u8, 0, 0, 0];
        assert!(RoaringBitmap::deserialize_from(&bytes[..]).is_err());
    }

    #[test]
    fn rejects_out_of_order_keys() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&SERIAL_COOKIE_NO_RUNCONTAINER.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        // Two descriptors with the same key, one value each.
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        // Offsets.
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        // Values.
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());

        assert!(RoaringBitmap::deserialize_from(&bytes[..]).is_err());
    }
}
