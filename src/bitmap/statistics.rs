use crate::store::Store;

use super::RoaringBitmap;

/// Detailed statistics on the composition of a bitmap.
#[derive(Clone, Copy, PartialEq, Debug)]
#[non_exhaustive]
pub struct Statistics {
    /// Number of blocks in the bitmap.
    pub n_blocks: u32,
    /// Number of blocks using the positive (sparse array) representation.
    pub n_positive_blocks: u32,
    /// Number of blocks using the dense representation.
    pub n_dense_blocks: u32,
    /// Number of blocks using the inverted representation.
    pub n_inverted_blocks: u32,
    /// Number of values held in positive blocks.
    pub n_values_positive_blocks: u64,
    /// Number of values held in dense blocks.
    pub n_values_dense_blocks: u64,
    /// Number of values held in inverted blocks.
    pub n_values_inverted_blocks: u64,
    /// Number of bytes used by positive blocks.
    pub n_bytes_positive_blocks: u64,
    /// Number of bytes used by dense blocks.
    pub n_bytes_dense_blocks: u64,
    /// Number of bytes used by inverted blocks.
    pub n_bytes_inverted_blocks: u64,
    /// Maximum value stored in the bitmap.
    pub max_value: Option<u32>,
    /// Minimum value stored in the bitmap.
    pub min_value: Option<u32>,
    /// Number of values stored in the bitmap.
    pub cardinality: u64,
}

impl RoaringBitmap {
    /// Returns statistics about the composition of a bitmap.
    ///
    /// ```rust
    /// use roaring_block_rs::RoaringBitmap;
    ///
    /// let bitmap: RoaringBitmap = (1..100).collect();
    /// let statistics = bitmap.statistics();
    ///
    /// assert_eq!(statistics.n_blocks, 1);
    /// assert_eq!(statistics.n_positive_blocks, 1);
    /// assert_eq!(statistics.n_dense_blocks, 0);
    /// assert_eq!(statistics.n_inverted_blocks, 0);
    /// assert_eq!(statistics.cardinality, 99);
    /// assert_eq!(statistics.max_value, Some(99));
    /// assert_eq!(statistics.min_value, Some(1));
    /// ```
    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics {
            n_blocks: 0,
            n_positive_blocks: 0,
            n_dense_blocks: 0,
            n_inverted_blocks: 0,
            n_values_positive_blocks: 0,
            n_values_dense_blocks: 0,
            n_values_inverted_blocks: 0,
            n_bytes_positive_blocks: 0,
            n_bytes_dense_blocks: 0,
            n_bytes_inverted_blocks: 0,
            max_value: self.max(),
            min_value: self.min(),
            cardinality: self.len(),
        };

        for store in &self.data {
            stats.n_blocks += 1;
            let len = store.len();
            let bytes = store.byte_size() as u64;
            match store {
                Store::Positive(_) => {
                    stats.n_positive_blocks += 1;
                    stats.n_values_positive_blocks += len;
                    stats.n_bytes_positive_blocks += bytes;
                }
                Store::Dense(_) => {
                    stats.n_dense_blocks += 1;
                    stats.n_values_dense_blocks += len;
                    stats.n_bytes_dense_blocks += bytes;
                }
                Store::Inverted(_) => {
                    stats.n_inverted_blocks += 1;
                    stats.n_values_inverted_blocks += len;
                    stats.n_bytes_inverted_blocks += bytes;
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn statistics_breaks_down_by_representation() {
        let mut rb = RoaringBitmap::new();
        rb.insert_range(0..100); // positive block
        rb.insert_range(70_000..135_000); // dense block
        rb.insert_range(200_000..265_530); // inverted block

        let stats = rb.statistics();
        assert_eq!(stats.n_blocks, 3);
        assert_eq!(
            stats.n_positive_blocks + stats.n_dense_blocks + stats.n_inverted_blocks,
            stats.n_blocks
        );
        assert_eq!(stats.cardinality, rb.len());
    }
}
