//! Byte-level view of plain-old-data values.
//!
//! Every transfer in this crate moves `MPI_BYTE`s. Any type implementing
//! [`Pod`] can be sent: it has no padding, no pointers and every bit pattern is
//! valid, so reinterpreting it as bytes on one process and back on another is
//! sound (between processes sharing the same architecture). No datatype needs
//! to be committed with the runtime.
//!
//! ```
//! use plainmpi::{Pod, Zeroable};
//!
//! #[repr(C)]
//! #[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
//! struct Particle {
//!     position: [f64; 3],
//!     id: u32,
//!     charge: i32,
//! }
//! ```
//!
//! Counts and displacements handed to the variable-count collectives are in
//! elements; the helpers here scale them to bytes and reject values the
//! runtime's `int` counts cannot carry.

pub use bytemuck::{Pod, Zeroable};

use crate::error::{Error, Result};
use std::mem::size_of;

/// Number of bytes occupied by `count` values of `T`, checked against the
/// runtime's `int` count range.
pub(crate) fn byte_len<T: Pod>(count: usize) -> Result<i64> {
    let elem_size = size_of::<T>();
    count
        .checked_mul(elem_size)
        .filter(|&bytes| bytes <= i32::MAX as usize)
        .map(|bytes| bytes as i64)
        .ok_or(Error::CountOverflow {
            count: count as i64,
            elem_size,
        })
}

/// Number of elements in `ranks` blocks of `per_rank` values of `T`,
/// checked so the whole buffer stays addressable.
pub(crate) fn total_len<T: Pod>(per_rank: usize, ranks: i32) -> Result<usize> {
    let elem_size = size_of::<T>();
    per_rank
        .checked_mul(ranks.max(0) as usize)
        .filter(|total| total.checked_mul(elem_size).is_some())
        .ok_or(Error::CountOverflow {
            count: per_rank as i64,
            elem_size,
        })
}

/// Scale per-rank element counts (or displacements) to bytes.
pub(crate) fn scaled<T: Pod>(elements: &[i32]) -> Result<Vec<i32>> {
    let elem_size = size_of::<T>();
    elements
        .iter()
        .map(|&n| {
            if n < 0 {
                return Err(Error::InvalidCount(i64::from(n)));
            }
            (n as usize)
                .checked_mul(elem_size)
                .and_then(|bytes| i32::try_from(bytes).ok())
                .ok_or(Error::CountOverflow {
                    count: i64::from(n),
                    elem_size,
                })
        })
        .collect()
}

/// Displacements that place `counts[i]` elements back to back.
pub(crate) fn default_displacements(counts: &[i32]) -> Result<Vec<i32>> {
    let mut next: i32 = 0;
    counts
        .iter()
        .map(|&n| {
            if n < 0 {
                return Err(Error::InvalidCount(i64::from(n)));
            }
            let at = next;
            next = next.checked_add(n).ok_or(Error::InvalidCount(i64::from(n)))?;
            Ok(at)
        })
        .collect()
}

/// Number of elements a buffer needs so that `counts[i]` elements fit at
/// `displs[i]` for every rank.
pub(crate) fn required_len(counts: &[i32], displs: &[i32]) -> Result<usize> {
    if displs.len() < counts.len() {
        return Err(Error::InvalidBuffer);
    }
    counts
        .iter()
        .zip(displs)
        .try_fold(0usize, |extent, (&n, &d)| {
            if n < 0 {
                return Err(Error::InvalidCount(i64::from(n)));
            }
            if d < 0 {
                return Err(Error::InvalidCount(i64::from(d)));
            }
            if n == 0 {
                return Ok(extent);
            }
            Ok(extent.max(d as usize + n as usize))
        })
}

/// A receive buffer of `count` zeroed values.
pub(crate) fn zeroed_vec<T: Pod>(count: usize) -> Vec<T> {
    vec![T::zeroed(); count]
}

/// The bytes backing `data`.
pub(crate) fn slice_bytes<T: Pod>(data: &[T]) -> &[u8] {
    if size_of::<T>() == 0 {
        return &[];
    }
    bytemuck::cast_slice(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
    struct Sample {
        value: f64,
        id: i32,
        flag: [u8; 4],
    }

    #[test]
    fn byte_len_scales_by_element_size() {
        assert_eq!(byte_len::<u8>(10).unwrap(), 10);
        assert_eq!(byte_len::<f64>(3).unwrap(), 24);
        assert_eq!(byte_len::<Sample>(2).unwrap(), 32);
        assert_eq!(byte_len::<[u32; 4]>(5).unwrap(), 80);
        assert_eq!(byte_len::<f64>(0).unwrap(), 0);
    }

    #[test]
    fn byte_len_rejects_int_overflow() {
        let too_many = (i32::MAX as usize) / 8 + 1;
        match byte_len::<f64>(too_many) {
            Err(Error::CountOverflow { count, elem_size }) => {
                assert_eq!(count, too_many as i64);
                assert_eq!(elem_size, 8);
            }
            other => panic!("expected CountOverflow, got {other:?}"),
        }
        assert!(byte_len::<u8>(i32::MAX as usize).is_ok());
        assert!(byte_len::<u8>(usize::MAX).is_err());
    }

    #[test]
    fn total_len_multiplies_blocks() {
        assert_eq!(total_len::<f64>(3, 4).unwrap(), 12);
        assert_eq!(total_len::<Sample>(0, 8).unwrap(), 0);
        assert_eq!(total_len::<u8>(5, 0).unwrap(), 0);
    }

    #[test]
    fn total_len_rejects_overflow() {
        assert!(matches!(
            total_len::<u8>(usize::MAX / 2, 4),
            Err(Error::CountOverflow { elem_size: 1, .. })
        ));
        // Fits as a count but not as bytes
        assert!(matches!(
            total_len::<u64>(usize::MAX / 16, 4),
            Err(Error::CountOverflow { elem_size: 8, .. })
        ));
    }

    #[test]
    fn scaled_counts() {
        assert_eq!(scaled::<Sample>(&[0, 1, 3]).unwrap(), vec![0, 16, 48]);
        assert_eq!(scaled::<u8>(&[]).unwrap(), Vec::<i32>::new());
        assert!(matches!(
            scaled::<u32>(&[1, -2]),
            Err(Error::InvalidCount(-2))
        ));
        assert!(matches!(
            scaled::<u64>(&[i32::MAX]),
            Err(Error::CountOverflow { .. })
        ));
    }

    #[test]
    fn default_displacements_are_exclusive_prefix_sums() {
        assert_eq!(default_displacements(&[2, 0, 3, 1]).unwrap(), vec![0, 2, 2, 5]);
        assert_eq!(default_displacements(&[]).unwrap(), Vec::<i32>::new());
        assert!(default_displacements(&[1, -1]).is_err());
        assert!(default_displacements(&[i32::MAX, 1, 1]).is_err());
    }

    #[test]
    fn required_len_covers_every_block() {
        // Sequential layout
        assert_eq!(required_len(&[1, 2, 3], &[0, 1, 3]).unwrap(), 6);
        // Blocks reordered: rank 1 first, rank 0 after it
        assert_eq!(required_len(&[2, 2], &[2, 0]).unwrap(), 4);
        // Gaps count toward the extent
        assert_eq!(required_len(&[1, 1], &[0, 9]).unwrap(), 10);
        // Empty blocks do not extend the buffer
        assert_eq!(required_len(&[0, 0, 2], &[50, 40, 0]).unwrap(), 2);
        assert_eq!(required_len(&[], &[]).unwrap(), 0);
    }

    #[test]
    fn required_len_rejects_bad_input() {
        assert!(matches!(
            required_len(&[1, 1], &[0]),
            Err(Error::InvalidBuffer)
        ));
        assert!(matches!(
            required_len(&[1], &[-1]),
            Err(Error::InvalidCount(-1))
        ));
        assert!(matches!(
            required_len(&[-3], &[0]),
            Err(Error::InvalidCount(-3))
        ));
    }

    #[test]
    fn zeroed_vec_is_all_zero_bytes() {
        let v: Vec<Sample> = zeroed_vec(3);
        assert_eq!(v.len(), 3);
        assert!(slice_bytes(&v).iter().all(|&b| b == 0));
    }

    #[test]
    fn slice_bytes_views_the_same_memory() {
        let data = [Sample {
            value: 1.5,
            id: 7,
            flag: *b"ok!\0",
        }];
        let bytes = slice_bytes(&data);
        assert_eq!(bytes.len(), size_of::<Sample>());
        assert_eq!(&bytes[..8], &1.5f64.to_ne_bytes());
        assert_eq!(&bytes[8..12], &7i32.to_ne_bytes());
        assert_eq!(&bytes[12..], b"ok!\0");

        let units = [(), ()];
        assert!(slice_bytes(&units).is_empty());
    }
}
