//! Request handles for nonblocking point-to-point operations.
//!
//! Both request types own the memory the runtime reads from or writes into,
//! so no borrow of user data outlives the call that started the operation.

use crate::datatype::Pod;
use crate::error::{Error, Result};
use crate::ffi;
use log::{error, trace, warn};
use std::marker::PhantomData;
use std::mem::size_of;
use std::ptr;

/// A handle to a nonblocking send.
///
/// The request keeps its own copy of the payload bytes until the send
/// completes, so the value handed to
/// [`immediate_send`](crate::Communicator::immediate_send) can be dropped or
/// reused right away.
///
/// Dropping an incomplete request waits for the send to finish.
///
/// Requests stay on the thread that created them, like the communicator
/// they were started on.
///
/// # Example
///
/// ```no_run
/// use plainmpi::Mpi;
///
/// let mpi = Mpi::init().unwrap();
/// let world = mpi.world();
///
/// if world.rank() == 0 {
///     let mut request = world.immediate_send([1.0f64, 2.0, 3.0], 1, 0).unwrap();
///
///     // Do other work while the message is in flight...
///
///     request.wait().unwrap();
/// }
/// ```
pub struct SendRequest {
    handle: i64,
    completed: bool,
    // Kept alive until completion; the runtime reads from it.
    _payload: Vec<u8>,
    /// Marker to prevent Send/Sync (request handles index an unsynchronized table)
    _marker: PhantomData<*mut ()>,
}

impl SendRequest {
    pub(crate) fn new(handle: i64, payload: Vec<u8>) -> Self {
        SendRequest {
            handle,
            completed: false,
            _payload: payload,
            _marker: PhantomData,
        }
    }

    /// Get the raw request handle (for advanced use).
    pub fn raw_handle(&self) -> i64 {
        self.handle
    }

    /// Returns true if the send has completed, without blocking.
    pub fn is_completed(&mut self) -> Result<bool> {
        if self.completed {
            return Ok(true);
        }
        self.completed = test(self.handle, ptr::null_mut())?;
        Ok(self.completed)
    }

    /// Block until the data has been sent.
    pub fn wait(&mut self) -> Result<()> {
        if self.completed {
            return Ok(());
        }
        let ret = unsafe { ffi::plainmpi_wait(self.handle, ptr::null_mut()) };
        self.completed = true;
        Error::check(ret)
    }

    /// Wait for all sends in a collection to complete.
    ///
    /// Every request is released whether or not the wait succeeds, so a
    /// failure cannot be retried per request. The error reports the first
    /// failure; the handles involved are logged.
    pub fn wait_all(mut requests: Vec<SendRequest>) -> Result<()> {
        let handles: Vec<i64> = requests
            .iter()
            .filter(|r| !r.completed)
            .map(|r| r.handle)
            .collect();
        if handles.is_empty() {
            return Ok(());
        }

        trace!("waiting on {} send requests", handles.len());
        let ret = unsafe { ffi::plainmpi_waitall(handles.len() as i64, handles.as_ptr()) };
        for request in &mut requests {
            request.completed = true;
        }
        if ret != 0 {
            error!("waiting on send requests {handles:?} failed");
        }
        Error::check(ret)
    }
}

impl Drop for SendRequest {
    fn drop(&mut self) {
        if !self.completed {
            let ret = unsafe { ffi::plainmpi_wait(self.handle, ptr::null_mut()) };
            if ret != 0 {
                warn!(
                    "send request {} failed while waiting on drop: {}",
                    self.handle,
                    Error::from_code(ret)
                );
            }
        }
    }
}

/// A handle to a nonblocking receive of values of type `T`.
///
/// The request owns the heap buffer the runtime writes into. Use
/// [`take`](Self::take) to get the values once the receive completes; it
/// returns only the values that arrived, which may be fewer than were posted.
///
/// Dropping a request whose receive is still pending cancels it.
///
/// # Example
///
/// ```no_run
/// use plainmpi::Mpi;
///
/// let mpi = Mpi::init().unwrap();
/// let world = mpi.world();
///
/// if world.rank() == 1 {
///     let mut request = world.immediate_receive::<[f64; 3]>(0, 0).unwrap();
///     while !request.is_completed().unwrap() {
///         std::thread::yield_now();
///     }
///     let values = request.take_one().unwrap();
///     println!("{values:?}");
/// }
/// ```
pub struct ReceiveRequest<T: Pod> {
    handle: i64,
    completed: bool,
    received_bytes: i64,
    buffer: Vec<T>,
    /// Marker to prevent Send/Sync (request handles index an unsynchronized table)
    _marker: PhantomData<*mut ()>,
}

impl<T: Pod> ReceiveRequest<T> {
    pub(crate) fn new(handle: i64, buffer: Vec<T>) -> Self {
        ReceiveRequest {
            handle,
            completed: false,
            received_bytes: 0,
            buffer,
            _marker: PhantomData,
        }
    }

    /// Get the raw request handle (for advanced use).
    pub fn raw_handle(&self) -> i64 {
        self.handle
    }

    /// Returns true if the receive has completed, without blocking.
    pub fn is_completed(&mut self) -> Result<bool> {
        if self.completed {
            return Ok(true);
        }
        self.completed = test(self.handle, &mut self.received_bytes)?;
        Ok(self.completed)
    }

    /// Block until the data has been received.
    pub fn wait(&mut self) -> Result<()> {
        if self.completed {
            return Ok(());
        }
        let ret = unsafe { ffi::plainmpi_wait(self.handle, &mut self.received_bytes) };
        self.completed = true;
        Error::check(ret)
    }

    /// Number of values that arrived, once the receive has completed.
    pub fn received_count(&self) -> Option<usize> {
        self.completed
            .then(|| arrived::<T>(self.received_bytes, self.buffer.len()))
    }

    /// Wait for the receive if needed and return the values that arrived.
    pub fn take(mut self) -> Result<Vec<T>> {
        self.wait()?;
        let count = arrived::<T>(self.received_bytes, self.buffer.len());
        let mut data = std::mem::take(&mut self.buffer);
        data.truncate(count);
        Ok(data)
    }

    /// Like [`take`](Self::take), for a request started for a single value.
    pub fn take_one(self) -> Result<T> {
        self.take()?.into_iter().next().ok_or(Error::InvalidBuffer)
    }
}

impl<T: Pod> Drop for ReceiveRequest<T> {
    fn drop(&mut self) {
        if !self.completed {
            let ret = unsafe { ffi::plainmpi_cancel(self.handle) };
            if ret != 0 {
                warn!(
                    "receive request {} could not be cancelled: {}",
                    self.handle,
                    Error::from_code(ret)
                );
            }
        }
    }
}

fn test(handle: i64, bytes: *mut i64) -> Result<bool> {
    let mut flag: i32 = 0;
    let ret = unsafe { ffi::plainmpi_test(handle, &mut flag, bytes) };
    Error::check(ret)?;
    Ok(flag != 0)
}

/// Whole values of `T` in `bytes`, capped at the posted length.
fn arrived<T>(bytes: i64, posted: usize) -> usize {
    match size_of::<T>() {
        0 => posted,
        n => ((bytes.max(0) as usize) / n).min(posted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_not_impl_any;

    assert_not_impl_any!(SendRequest: Send, Sync);
    assert_not_impl_any!(ReceiveRequest<u64>: Send, Sync);

    #[test]
    fn arrived_counts_whole_values() {
        assert_eq!(arrived::<u64>(16, 5), 2);
        assert_eq!(arrived::<u64>(20, 5), 2);
        assert_eq!(arrived::<[u8; 3]>(9, 10), 3);
        assert_eq!(arrived::<u32>(0, 4), 0);
    }

    #[test]
    fn arrived_never_exceeds_posted_length() {
        assert_eq!(arrived::<u8>(100, 4), 4);
        assert_eq!(arrived::<u8>(-1, 4), 0);
        assert_eq!(arrived::<()>(0, 3), 3);
    }
}
