//! Message envelope information.
//!
//! This module provides the [`Status`] struct returned by receive and probe
//! operations.

use std::mem::size_of;

/// Information about a probed or received message.
///
/// Returned by [`Communicator::receive_into`](crate::Communicator::receive_into)
/// and [`Communicator::probe`](crate::Communicator::probe).
///
/// # Example
///
/// ```no_run
/// # use plainmpi::{Mpi, ANY_SOURCE, ANY_TAG};
/// let mpi = Mpi::init().unwrap();
/// let world = mpi.world();
///
/// // Blocking probe for a message of u64 values from anyone
/// let status = world.probe::<u64>(ANY_SOURCE, ANY_TAG).unwrap();
/// println!("Message from rank {} with tag {}, {} elements",
///          status.source, status.tag, status.count);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Source rank of the message.
    pub source: i32,
    /// Tag of the message.
    pub tag: i32,
    /// Number of whole elements of the probed type in the message.
    pub count: i64,
}

impl Status {
    pub(crate) fn from_bytes<T>(source: i32, tag: i32, bytes: i64) -> Self {
        let count = match size_of::<T>() {
            0 => 0,
            n => bytes / n as i64,
        };
        Status { source, tag, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_in_elements() {
        let s = Status::from_bytes::<u64>(3, 9, 40);
        assert_eq!(s, Status { source: 3, tag: 9, count: 5 });
        assert_eq!(Status::from_bytes::<[u8; 3]>(0, 0, 7).count, 2);
        assert_eq!(Status::from_bytes::<()>(0, 0, 7).count, 0);
    }
}
