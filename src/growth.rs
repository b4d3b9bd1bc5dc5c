//! Amortised growth/shrink policy shared by the array-backed block states.
//!
//! Buffers double below 1024 elements and grow by 1.25x above that; they
//! are only shrunk (to `len + 4`) once the allocated capacity exceeds
//! twice what's actually needed, so a single removal never triggers a
//! reallocation.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

const DOUBLING_THRESHOLD: usize = 1024;

pub(crate) fn reserve_for_growth(vec: &mut Vec<u16>, additional: usize) {
    let len = vec.len();
    let needed = len + additional;
    if vec.capacity() >= needed {
        return;
    }
    let grown = if len < DOUBLING_THRESHOLD {
        len.saturating_mul(2)
    } else {
        (len as f64 * 1.25) as usize
    };
    let new_cap = grown.max(needed).max(4);
    vec.reserve_exact(new_cap - len);
}

pub(crate) fn maybe_shrink(vec: &mut Vec<u16>) {
    let len = vec.len();
    if vec.capacity() > 2 * len.max(1) {
        vec.shrink_to(len + 4);
    }
}
