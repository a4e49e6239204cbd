//! Communicators: handle ownership, point-to-point and collective transfers.

use crate::datatype::{self, Pod, Zeroable};
use crate::error::{Error, Result};
use crate::ffi;
use crate::request::{ReceiveRequest, SendRequest};
use crate::status::Status;
use crate::Mpi;
use log::{debug, error, trace};
use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

/// Wildcard source rank for receives and probes.
pub const ANY_SOURCE: i32 = -1;

/// Wildcard tag for receives and probes.
pub const ANY_TAG: i32 = -1;

/// Tag for callers that do not need to tell messages apart.
pub const DEFAULT_TAG: i32 = 0;

/// Result of comparing two communicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// Same underlying communicator (a proxy and what it points to).
    Identical,
    /// Same group and rank order, different context (a duplicate).
    Congruent,
    /// Same members, different rank order.
    Similar,
    /// Anything else.
    Unequal,
}

impl Comparison {
    fn from_raw(raw: i32) -> Self {
        match raw {
            ffi::IDENT => Comparison::Identical,
            ffi::CONGRUENT => Comparison::Congruent,
            ffi::SIMILAR => Comparison::Similar,
            _ => Comparison::Unequal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ownership {
    /// Created by duplicate or split; freed on drop.
    Owned,
    /// Refers to a communicator owned elsewhere; never freed.
    Proxy,
}

/// An MPI communicator.
///
/// A communicator is either *owned* (it was created by this crate through
/// [`duplicate`](Self::duplicate) or [`split`](Self::split) and is freed when
/// dropped) or a *proxy* for a communicator owned by someone else, such as
/// `MPI_COMM_WORLD`. Comparing a proxy with what it refers to yields
/// [`Comparison::Identical`]; comparing a duplicate with its source yields
/// [`Comparison::Congruent`].
///
/// Duplicating a proxy produces an owned communicator. Moving a proxy keeps
/// it a proxy.
///
/// Every transfer method is generic over [`Pod`] values, which travel as raw
/// bytes.
///
/// # Example
///
/// ```no_run
/// use plainmpi::Mpi;
///
/// let mpi = Mpi::init().unwrap();
/// let world = mpi.world();
///
/// println!("I am rank {} of {}", world.rank(), world.size());
/// ```
pub struct Communicator {
    handle: i32,
    ownership: Ownership,
    /// Marker to prevent Send/Sync (MPI communicators are not thread-safe)
    _marker: PhantomData<*mut ()>,
}

impl Communicator {
    fn new(handle: i32, ownership: Ownership) -> Self {
        Communicator {
            handle,
            ownership,
            _marker: PhantomData,
        }
    }

    /// Proxy for `MPI_COMM_WORLD`.
    pub(crate) fn world() -> Self {
        Communicator::new(ffi::COMM_WORLD, Ownership::Proxy)
    }

    /// Proxy for `MPI_COMM_SELF`.
    pub(crate) fn self_comm() -> Self {
        Communicator::new(ffi::COMM_SELF, Ownership::Proxy)
    }

    /// Create a proxy identical to the communicator behind `raw`.
    ///
    /// # Safety
    ///
    /// `raw` must come from [`as_raw`](Self::as_raw) on a communicator that
    /// stays alive for as long as the proxy is used. The proxy never frees
    /// the handle.
    pub unsafe fn from_raw_proxy(raw: i32) -> Self {
        Communicator::new(raw, Ownership::Proxy)
    }

    /// Create an owned communicator congruent (but not identical) to the
    /// communicator behind `raw`.
    ///
    /// Borrowing the environment keeps the call on the thread that
    /// initialized MPI.
    pub fn from_raw_duplicate(_mpi: &Mpi, raw: i32) -> Result<Self> {
        Communicator::duplicate_handle(raw)
    }

    fn duplicate_handle(raw: i32) -> Result<Self> {
        let mut new_handle: i32 = 0;
        let ret = unsafe { ffi::plainmpi_comm_dup(raw, &mut new_handle) };
        Error::check(ret)?;
        debug!("duplicated communicator {raw} into {new_handle}");
        Ok(Communicator::new(new_handle, Ownership::Owned))
    }

    /// Get the raw communicator handle.
    ///
    /// This breaks encapsulation; it exists to build proxies and to interface
    /// with code that talks to the shim directly.
    pub fn as_raw(&self) -> i32 {
        self.handle
    }

    /// Returns true if this communicator does not own its handle.
    pub fn is_proxy(&self) -> bool {
        self.ownership == Ownership::Proxy
    }

    /// Get the rank of the calling process in this communicator.
    pub fn rank(&self) -> i32 {
        let mut rank: i32 = 0;
        let ret = unsafe { ffi::plainmpi_comm_rank(self.handle, &mut rank) };
        if ret != 0 {
            error!("rank query on communicator {} failed: {}", self.handle, Error::from_code(ret));
        }
        rank
    }

    /// Get the number of processes in this communicator.
    pub fn size(&self) -> i32 {
        let mut size: i32 = 0;
        let ret = unsafe { ffi::plainmpi_comm_size(self.handle, &mut size) };
        if ret != 0 {
            error!("size query on communicator {} failed: {}", self.handle, Error::from_code(ret));
        }
        size
    }

    /// Get the processor name for this process.
    pub fn processor_name(&self) -> Result<String> {
        let mut buf = [0u8; 256];
        let mut len: i32 = 0;
        let ret = unsafe {
            ffi::plainmpi_get_processor_name(buf.as_mut_ptr().cast(), buf.len() as i32, &mut len)
        };
        Error::check(ret)?;
        let s = std::str::from_utf8(&buf[..len.max(0) as usize])
            .map_err(|_| Error::Internal("Invalid UTF-8 in processor name".into()))?;
        Ok(s.to_string())
    }

    /// Duplicate this communicator.
    ///
    /// The result is owned and congruent to `self`, even when `self` is a
    /// proxy.
    pub fn duplicate(&self) -> Result<Self> {
        Communicator::duplicate_handle(self.handle)
    }

    /// Split this communicator.
    ///
    /// Processes passing the same `color` end up in the same new
    /// communicator, ranked by `key` (ties broken by rank in `self`). A
    /// negative color leaves the calling process out; it gets `None`.
    pub fn split(&self, color: i32, key: i32) -> Result<Option<Self>> {
        let mut new_handle: i32 = ffi::COMM_NONE;
        let ret = unsafe { ffi::plainmpi_comm_split(self.handle, color, key, &mut new_handle) };
        Error::check(ret)?;
        if new_handle == ffi::COMM_NONE {
            debug!("split of communicator {}: color {color} joined no group", self.handle);
            return Ok(None);
        }
        debug!(
            "split communicator {} (color {color}, key {key}) into {new_handle}",
            self.handle
        );
        Ok(Some(Communicator::new(new_handle, Ownership::Owned)))
    }

    /// Compare this communicator with `other`.
    pub fn compare(&self, other: &Communicator) -> Result<Comparison> {
        let mut result: i32 = 0;
        let ret = unsafe { ffi::plainmpi_comm_compare(self.handle, other.handle, &mut result) };
        Error::check(ret)?;
        Ok(Comparison::from_raw(result))
    }

    /// Returns true if both refer to the same underlying communicator.
    pub fn is_identical(&self, other: &Communicator) -> Result<bool> {
        Ok(self.compare(other)? == Comparison::Identical)
    }

    /// Returns true if `other` has the same group and ordering but a
    /// different context, as a duplicate does.
    pub fn is_congruent(&self, other: &Communicator) -> Result<bool> {
        Ok(self.compare(other)? == Comparison::Congruent)
    }

    fn check_root(&self, root: i32) -> Result<()> {
        if root < 0 || root >= self.size() {
            return Err(Error::InvalidRank(root));
        }
        Ok(())
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Barrier synchronization.
    ///
    /// All processes in the communicator must call this function. No process
    /// will return until all processes have entered the barrier.
    pub fn barrier(&self) -> Result<()> {
        let ret = unsafe { ffi::plainmpi_barrier(self.handle) };
        Error::check(ret)
    }

    // ========================================================================
    // Point-to-Point Communication
    // ========================================================================

    /// Send one value to `dest` and block until the buffer can be reused.
    pub fn send<T: Pod>(&self, value: &T, dest: i32, tag: i32) -> Result<()> {
        self.send_slice(std::slice::from_ref(value), dest, tag)
    }

    /// Send a slice of values to `dest`.
    pub fn send_slice<T: Pod>(&self, data: &[T], dest: i32, tag: i32) -> Result<()> {
        let bytes = datatype::byte_len::<T>(data.len())?;
        trace!("send {bytes} bytes to {dest} (tag {tag}) on {}", self.handle);
        let ret = unsafe {
            ffi::plainmpi_send(data.as_ptr().cast::<c_void>(), bytes, dest, tag, self.handle)
        };
        Error::check(ret)
    }

    /// Receive into `buf`, blocking until a matching message arrives.
    ///
    /// Use [`ANY_SOURCE`] and [`ANY_TAG`] as wildcards. The message may hold
    /// fewer values than `buf`; the returned [`Status`] tells how many
    /// arrived. A longer message is a truncation error.
    pub fn receive_into<T: Pod>(&self, buf: &mut [T], source: i32, tag: i32) -> Result<Status> {
        let bytes = datatype::byte_len::<T>(buf.len())?;
        let mut actual_source: i32 = 0;
        let mut actual_tag: i32 = 0;
        let mut actual_bytes: i64 = 0;

        let ret = unsafe {
            ffi::plainmpi_recv(
                buf.as_mut_ptr().cast::<c_void>(),
                bytes,
                source,
                tag,
                self.handle,
                &mut actual_source,
                &mut actual_tag,
                &mut actual_bytes,
            )
        };
        Error::check(ret)?;
        trace!(
            "received {actual_bytes} bytes from {actual_source} (tag {actual_tag}) on {}",
            self.handle
        );
        Ok(Status::from_bytes::<T>(actual_source, actual_tag, actual_bytes))
    }

    /// Receive one value of type `T`.
    pub fn receive<T: Pod>(&self, source: i32, tag: i32) -> Result<T> {
        let mut value = T::zeroed();
        let status = self.receive_into(std::slice::from_mut(&mut value), source, tag)?;
        if status.count != 1 {
            return Err(Error::InvalidCount(status.count));
        }
        Ok(value)
    }

    /// Receive up to `count` values. The result holds what actually arrived.
    pub fn receive_vec<T: Pod>(&self, count: usize, source: i32, tag: i32) -> Result<Vec<T>> {
        let mut data = datatype::zeroed_vec::<T>(count);
        let status = self.receive_into(&mut data, source, tag)?;
        data.truncate(status.count.max(0) as usize);
        Ok(data)
    }

    /// Receive exactly `N` values into a fixed-size array.
    pub fn receive_array<T: Pod, const N: usize>(&self, source: i32, tag: i32) -> Result<[T; N]> {
        self.receive::<[T; N]>(source, tag)
    }

    /// Block until a matching message is available, without receiving it.
    ///
    /// The status count is expressed in elements of `T`.
    pub fn probe<T: Pod>(&self, source: i32, tag: i32) -> Result<Status> {
        let mut actual_source: i32 = 0;
        let mut actual_tag: i32 = 0;
        let mut actual_bytes: i64 = 0;
        let ret = unsafe {
            ffi::plainmpi_probe(
                source,
                tag,
                self.handle,
                &mut actual_source,
                &mut actual_tag,
                &mut actual_bytes,
            )
        };
        Error::check(ret)?;
        Ok(Status::from_bytes::<T>(actual_source, actual_tag, actual_bytes))
    }

    /// Receive a message whose length is not known in advance.
    ///
    /// Probes first, then receives exactly the probed message.
    pub fn receive_any_len<T: Pod>(&self, source: i32, tag: i32) -> Result<(Vec<T>, Status)> {
        let probed = self.probe::<T>(source, tag)?;
        let mut data = datatype::zeroed_vec::<T>(probed.count.max(0) as usize);
        let status = self.receive_into(&mut data, probed.source, probed.tag)?;
        Ok((data, status))
    }

    // ========================================================================
    // Nonblocking Point-to-Point
    // ========================================================================

    /// Start sending `value` to `dest`. The request keeps its own copy.
    pub fn immediate_send<T: Pod>(&self, value: T, dest: i32, tag: i32) -> Result<SendRequest> {
        self.immediate_send_slice(std::slice::from_ref(&value), dest, tag)
    }

    /// Start sending a copy of `data` to `dest`.
    pub fn immediate_send_slice<T: Pod>(
        &self,
        data: &[T],
        dest: i32,
        tag: i32,
    ) -> Result<SendRequest> {
        let bytes = datatype::byte_len::<T>(data.len())?;
        let payload = datatype::slice_bytes(data).to_vec();
        let mut request_handle: i64 = 0;
        let ret = unsafe {
            ffi::plainmpi_isend(
                payload.as_ptr().cast::<c_void>(),
                bytes,
                dest,
                tag,
                self.handle,
                &mut request_handle,
            )
        };
        Error::check(ret)?;
        trace!("isend {bytes} bytes to {dest} (tag {tag}) as request {request_handle}");
        Ok(SendRequest::new(request_handle, payload))
    }

    /// Start receiving one value from `source`.
    pub fn immediate_receive<T: Pod>(&self, source: i32, tag: i32) -> Result<ReceiveRequest<T>> {
        self.immediate_receive_vec(1, source, tag)
    }

    /// Start receiving up to `count` values from `source`.
    pub fn immediate_receive_vec<T: Pod>(
        &self,
        count: usize,
        source: i32,
        tag: i32,
    ) -> Result<ReceiveRequest<T>> {
        let bytes = datatype::byte_len::<T>(count)?;
        let mut buffer = datatype::zeroed_vec::<T>(count);
        let mut request_handle: i64 = 0;
        let ret = unsafe {
            ffi::plainmpi_irecv(
                buffer.as_mut_ptr().cast::<c_void>(),
                bytes,
                source,
                tag,
                self.handle,
                &mut request_handle,
            )
        };
        Error::check(ret)?;
        trace!("irecv {bytes} bytes from {source} (tag {tag}) as request {request_handle}");
        Ok(ReceiveRequest::new(request_handle, buffer))
    }

    // ========================================================================
    // Broadcast
    // ========================================================================

    /// Broadcast `value` from `root`; every process gets the root's value.
    pub fn broadcast<T: Pod>(&self, root: i32, value: T) -> Result<T> {
        let mut value = value;
        self.broadcast_into(std::slice::from_mut(&mut value), root)?;
        Ok(value)
    }

    /// Broadcast a slice in place from `root`.
    ///
    /// Every process must pass a buffer of the same length.
    pub fn broadcast_into<T: Pod>(&self, data: &mut [T], root: i32) -> Result<()> {
        self.check_root(root)?;
        let bytes = datatype::byte_len::<T>(data.len())?;
        let ret = unsafe {
            ffi::plainmpi_bcast(data.as_mut_ptr().cast::<c_void>(), bytes, root, self.handle)
        };
        Error::check(ret)
    }

    /// Broadcast a vector from `root`.
    ///
    /// The root's length is broadcast first, so other processes may pass any
    /// vector (typically empty); they get the root's contents.
    pub fn broadcast_vec<T: Pod>(&self, root: i32, data: Vec<T>) -> Result<Vec<T>> {
        let len = self.broadcast(root, data.len() as u64)?;
        let mut data = if self.rank() == root {
            data
        } else {
            let len = usize::try_from(len).map_err(|_| Error::InvalidCount(len as i64))?;
            datatype::zeroed_vec::<T>(len)
        };
        self.broadcast_into(&mut data, root)?;
        Ok(data)
    }

    // ========================================================================
    // Gather
    // ========================================================================

    /// Gather one value from every process at `root`.
    ///
    /// The root gets `size` values ordered by rank; other processes get an
    /// empty vector.
    pub fn gather<T: Pod>(&self, root: i32, value: T) -> Result<Vec<T>> {
        self.gather_slice(root, std::slice::from_ref(&value))
    }

    /// Gather equally sized slices from every process at `root`.
    pub fn gather_slice<T: Pod>(&self, root: i32, data: &[T]) -> Result<Vec<T>> {
        self.check_root(root)?;
        let bytes = datatype::byte_len::<T>(data.len())?;
        let total = datatype::total_len::<T>(data.len(), self.size())?;
        let mut result = if self.rank() == root {
            datatype::zeroed_vec::<T>(total)
        } else {
            Vec::new()
        };
        let ret = unsafe {
            ffi::plainmpi_gather(
                data.as_ptr().cast::<c_void>(),
                bytes,
                result.as_mut_ptr().cast::<c_void>(),
                bytes,
                root,
                self.handle,
            )
        };
        Error::check(ret)?;
        Ok(result)
    }

    /// Gather one value from every process on every process.
    pub fn all_gather<T: Pod>(&self, value: T) -> Result<Vec<T>> {
        self.all_gather_slice(std::slice::from_ref(&value))
    }

    /// Gather equally sized slices from every process on every process.
    pub fn all_gather_slice<T: Pod>(&self, data: &[T]) -> Result<Vec<T>> {
        let bytes = datatype::byte_len::<T>(data.len())?;
        let total = datatype::total_len::<T>(data.len(), self.size())?;
        let mut result = datatype::zeroed_vec::<T>(total);
        let ret = unsafe {
            ffi::plainmpi_allgather(
                data.as_ptr().cast::<c_void>(),
                bytes,
                result.as_mut_ptr().cast::<c_void>(),
                bytes,
                self.handle,
            )
        };
        Error::check(ret)?;
        Ok(result)
    }

    // ========================================================================
    // Scatter
    // ========================================================================

    /// Scatter `count` values to every process from `root`.
    ///
    /// Rank `i` receives `to_send[i * count..(i + 1) * count]`. Only the
    /// root's `to_send` is read; it must hold at least `count * size` values.
    ///
    /// # Errors
    ///
    /// An out-of-range root or a `count` too large for the runtime fails on
    /// every process. [`Error::InsufficientData`] is raised at the root only;
    /// the other processes have already entered the scatter and stay blocked
    /// in it, so callers must size the root's buffer before calling.
    pub fn scatter<T: Pod>(&self, root: i32, to_send: &[T], count: usize) -> Result<Vec<T>> {
        self.check_root(root)?;
        let bytes = datatype::byte_len::<T>(count)?;
        let required = datatype::total_len::<T>(count, self.size())?;
        if self.rank() == root && to_send.len() < required {
            return Err(Error::InsufficientData {
                required,
                available: to_send.len(),
            });
        }
        let mut result = datatype::zeroed_vec::<T>(count);
        let ret = unsafe {
            ffi::plainmpi_scatter(
                to_send.as_ptr().cast::<c_void>(),
                bytes,
                result.as_mut_ptr().cast::<c_void>(),
                bytes,
                root,
                self.handle,
            )
        };
        Error::check(ret)?;
        Ok(result)
    }

    // ========================================================================
    // Variable-count Collectives
    // ========================================================================

    /// Scatter a different number of values to each process.
    ///
    /// Rank `i` receives `send_counts[i]` values taken from `to_send`
    /// starting at `displacements[i]`. Without displacements the blocks are
    /// taken back to back. Every process passes the same `send_counts`
    /// (at least `size` entries); only the root's `to_send` is read.
    ///
    /// # Errors
    ///
    /// Invalid counts or displacements fail on every process, provided all
    /// of them pass the same values. [`Error::InsufficientData`] is raised at
    /// the root only and leaves the other processes blocked in the scatter.
    pub fn varying_scatter<T: Pod>(
        &self,
        root: i32,
        to_send: &[T],
        send_counts: &[i32],
        displacements: Option<&[i32]>,
    ) -> Result<Vec<T>> {
        self.check_root(root)?;
        let size = self.size() as usize;
        let rank = self.rank();
        let counts = send_counts.get(..size).ok_or(Error::InvalidBuffer)?;
        let displs = layout(counts, displacements)?;
        let required = datatype::required_len(counts, &displs)?;

        if rank == root && to_send.len() < required {
            return Err(Error::InsufficientData {
                required,
                available: to_send.len(),
            });
        }

        let scaled_counts = datatype::scaled::<T>(counts)?;
        let scaled_displs = datatype::scaled::<T>(&displs)?;
        let own = counts[rank as usize] as usize;
        let mut result = datatype::zeroed_vec::<T>(own);
        let ret = unsafe {
            ffi::plainmpi_scatterv(
                to_send.as_ptr().cast::<c_void>(),
                scaled_counts.as_ptr(),
                scaled_displs.as_ptr(),
                result.as_mut_ptr().cast::<c_void>(),
                i64::from(scaled_counts[rank as usize]),
                root,
                self.handle,
            )
        };
        Error::check(ret)?;
        Ok(result)
    }

    /// Gather a different number of values from each process at `root`.
    ///
    /// The root's result holds `receive_counts[i]` values from rank `i`
    /// starting at `displacements[i]` (back to back without displacements);
    /// it is sized to cover every block. Every process passes the same
    /// `receive_counts` and `displacements`. Other processes get an empty
    /// vector.
    ///
    /// # Errors
    ///
    /// Counts and displacements are validated on every process before the
    /// gather starts, so invalid ones fail everywhere instead of leaving the
    /// other processes blocked.
    pub fn varying_gather<T: Pod>(
        &self,
        root: i32,
        data: &[T],
        receive_counts: &[i32],
        displacements: Option<&[i32]>,
    ) -> Result<Vec<T>> {
        self.check_root(root)?;
        let bytes = datatype::byte_len::<T>(data.len())?;
        let size = self.size() as usize;
        let counts = receive_counts.get(..size).ok_or(Error::InvalidBuffer)?;
        let displs = layout(counts, displacements)?;
        let required = datatype::required_len(counts, &displs)?;
        let scaled_counts = datatype::scaled::<T>(counts)?;
        let scaled_displs = datatype::scaled::<T>(&displs)?;

        if self.rank() != root {
            let ret = unsafe {
                ffi::plainmpi_gatherv(
                    data.as_ptr().cast::<c_void>(),
                    bytes,
                    ptr::null_mut(),
                    ptr::null(),
                    ptr::null(),
                    root,
                    self.handle,
                )
            };
            Error::check(ret)?;
            return Ok(Vec::new());
        }

        let mut result = datatype::zeroed_vec::<T>(required);
        let ret = unsafe {
            ffi::plainmpi_gatherv(
                data.as_ptr().cast::<c_void>(),
                bytes,
                result.as_mut_ptr().cast::<c_void>(),
                scaled_counts.as_ptr(),
                scaled_displs.as_ptr(),
                root,
                self.handle,
            )
        };
        Error::check(ret)?;
        Ok(result)
    }

    /// Gather a different number of values from each process on every
    /// process, laid out as in [`varying_gather`](Self::varying_gather).
    pub fn varying_all_gather<T: Pod>(
        &self,
        data: &[T],
        receive_counts: &[i32],
        displacements: Option<&[i32]>,
    ) -> Result<Vec<T>> {
        let size = self.size() as usize;
        let counts = receive_counts.get(..size).ok_or(Error::InvalidBuffer)?;
        let displs = layout(counts, displacements)?;
        let bytes = datatype::byte_len::<T>(data.len())?;
        let mut result = datatype::zeroed_vec::<T>(datatype::required_len(counts, &displs)?);
        let scaled_counts = datatype::scaled::<T>(counts)?;
        let scaled_displs = datatype::scaled::<T>(&displs)?;
        let ret = unsafe {
            ffi::plainmpi_allgatherv(
                data.as_ptr().cast::<c_void>(),
                bytes,
                result.as_mut_ptr().cast::<c_void>(),
                scaled_counts.as_ptr(),
                scaled_displs.as_ptr(),
                self.handle,
            )
        };
        Error::check(ret)?;
        Ok(result)
    }
}

/// Displacements for `counts`: the caller's (truncated to one per rank) or
/// the back-to-back default.
fn layout(counts: &[i32], displacements: Option<&[i32]>) -> Result<Vec<i32>> {
    match displacements {
        Some(displs) => displs
            .get(..counts.len())
            .map(<[i32]>::to_vec)
            .ok_or(Error::InvalidBuffer),
        None => datatype::default_displacements(counts),
    }
}

/// Returns true if `a` and `b` refer to the same underlying communicator.
pub fn are_identical(a: &Communicator, b: &Communicator) -> Result<bool> {
    a.is_identical(b)
}

/// Returns true if `a` and `b` are congruent (same group and order,
/// different context).
pub fn are_congruent(a: &Communicator, b: &Communicator) -> Result<bool> {
    a.is_congruent(b)
}

impl fmt::Debug for Communicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Communicator")
            .field("handle", &self.handle)
            .field("proxy", &self.is_proxy())
            .finish()
    }
}

impl Drop for Communicator {
    fn drop(&mut self) {
        if self.ownership == Ownership::Proxy {
            return;
        }
        let ret = unsafe { ffi::plainmpi_comm_free(self.handle) };
        if ret == 0 {
            debug!("freed communicator {}", self.handle);
        } else {
            error!(
                "failed to free communicator {}: {}",
                self.handle,
                Error::from_code(ret)
            );
        }
    }
}

// Communicators are not Send or Sync by default
// (MPI communicators have thread-safety requirements)

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_not_impl_any;

    assert_not_impl_any!(Communicator: Send, Sync);
    assert_not_impl_any!(Mpi: Send, Sync);
    // `from_raw_duplicate` borrows an `Mpi`; the borrow must not cross threads.
    assert_not_impl_any!(&'static Mpi: Send);

    #[test]
    fn comparison_values_match_c_defines() {
        assert_eq!(Comparison::from_raw(0), Comparison::Identical);
        assert_eq!(Comparison::from_raw(1), Comparison::Congruent);
        assert_eq!(Comparison::from_raw(2), Comparison::Similar);
        assert_eq!(Comparison::from_raw(3), Comparison::Unequal);
        assert_eq!(Comparison::from_raw(42), Comparison::Unequal);
    }

    #[test]
    fn layout_defaults_to_back_to_back() {
        assert_eq!(layout(&[2, 1, 3], None).unwrap(), vec![0, 2, 3]);
    }

    #[test]
    fn layout_uses_one_displacement_per_rank() {
        assert_eq!(layout(&[1, 1], Some(&[4, 0, 9])).unwrap(), vec![4, 0]);
        assert!(matches!(
            layout(&[1, 1, 1], Some(&[0, 1])),
            Err(Error::InvalidBuffer)
        ));
    }

    #[test]
    fn world_and_self_are_proxies() {
        let world = Communicator::world();
        let me = Communicator::self_comm();
        assert!(world.is_proxy());
        assert!(me.is_proxy());
        assert_eq!(world.as_raw(), ffi::COMM_WORLD);
        assert_eq!(me.as_raw(), ffi::COMM_SELF);
        // Dropping proxies never reaches the runtime.
    }

    #[test]
    fn moved_proxy_stays_proxy() {
        let proxy = unsafe { Communicator::from_raw_proxy(7) };
        let moved = proxy;
        assert!(moved.is_proxy());
        assert_eq!(moved.as_raw(), 7);
        assert_eq!(
            format!("{moved:?}"),
            "Communicator { handle: 7, proxy: true }"
        );
    }
}
