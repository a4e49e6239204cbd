//! # plainmpi
//!
//! Move plain-old-data values between MPI processes as raw bytes.
//!
//! This crate wraps an MPI runtime through a thin C layer, providing:
//! - Point-to-point transfers (blocking and nonblocking) of any [`Pod`] type
//! - Broadcast, gather, all-gather, scatter and their variable-count forms
//! - Communicator handles that are either owned (duplicated or split, freed
//!   on drop) or proxies (world, self, raw handles), with identity and
//!   congruence comparison
//!
//! No MPI datatype is ever registered: values are reinterpreted as bytes and
//! sent as `MPI_BYTE`. A struct qualifies once it derives [`Pod`] and
//! [`Zeroable`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use plainmpi::{Mpi, Pod, Zeroable};
//!
//! #[repr(C)]
//! #[derive(Debug, Clone, Copy, Pod, Zeroable)]
//! struct Sample {
//!     value: f64,
//!     rank: i32,
//!     flags: u32,
//! }
//!
//! fn main() -> Result<(), plainmpi::Error> {
//!     let mpi = Mpi::init()?;
//!     let world = mpi.world();
//!
//!     let rank = world.rank();
//!     let mine = Sample { value: rank as f64 * 0.5, rank, flags: 0 };
//!
//!     // Every process gets every sample, ordered by rank
//!     let all = world.all_gather(mine)?;
//!     assert_eq!(all.len(), world.size() as usize);
//!
//!     // Rank 0 decides, everyone learns
//!     let chosen = world.broadcast(0, all[0])?;
//!     println!("Rank {rank}: root's sample is {chosen:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Building
//!
//! The build script compiles `csrc/plainmpi.c` against the MPI installation
//! found through `MPI_PKG_CONFIG`, pkg-config (`mpich`, `ompi`, `mpi`), the
//! `MPICC` wrapper (default `mpicc`), or `CRAY_MPICH_DIR`.
//!
//! ## Logging
//!
//! Lifecycle events (init, finalize, communicator duplication, split and
//! release) are logged at `debug` level and individual transfers at `trace`
//! level through the [`log`] facade. Failures that cannot be returned, such
//! as errors while dropping a handle, are logged at `warn` or `error`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod comm;
mod datatype;
mod error;
mod ffi;
mod request;
mod status;

pub use comm::{
    are_congruent, are_identical, Communicator, Comparison, ANY_SOURCE, ANY_TAG, DEFAULT_TAG,
};
pub use datatype::{Pod, Zeroable};
pub use error::{Error, MpiErrorClass, Result};
pub use request::{ReceiveRequest, SendRequest};
pub use status::Status;

use log::{debug, error};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag tracking whether MPI has been initialized
static MPI_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// MPI thread support levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
pub enum ThreadLevel {
    /// Only single-threaded execution
    Single = 0,
    /// Multi-threaded, but MPI calls only from main thread
    Funneled = 1,
    /// Multi-threaded, but MPI calls serialized by user
    Serialized = 2,
    /// Full multi-threaded support
    Multiple = 3,
}

impl ThreadLevel {
    fn from_raw(raw: i32) -> Self {
        match raw {
            0 => ThreadLevel::Single,
            1 => ThreadLevel::Funneled,
            2 => ThreadLevel::Serialized,
            _ => ThreadLevel::Multiple,
        }
    }
}

/// MPI environment handle.
///
/// This type represents an initialized MPI environment. There can only be one
/// instance of this type at a time. When dropped, it finalizes MPI.
///
/// Initialization switches the world and self communicators to report
/// failures as return codes, so runtime errors surface as [`Error::Mpi`]
/// instead of aborting the job. Communicators created later inherit this.
///
/// # Example
///
/// ```no_run
/// use plainmpi::Mpi;
///
/// let mpi = Mpi::init().expect("Failed to initialize MPI");
/// let world = mpi.world();
/// println!("Running on {} processes", world.size());
/// // MPI is finalized when `mpi` goes out of scope
/// ```
pub struct Mpi {
    /// The thread level that was provided
    thread_level: ThreadLevel,
    /// Marker to make Mpi !Send and !Sync
    _marker: PhantomData<*const ()>,
}

impl Mpi {
    /// Initialize MPI with single-threaded support.
    ///
    /// # Errors
    ///
    /// Returns an error if MPI is already initialized or if initialization fails.
    pub fn init() -> Result<Self> {
        Self::init_thread(ThreadLevel::Single)
    }

    /// Initialize MPI with the specified thread support level.
    ///
    /// The level actually provided can be queried with
    /// [`thread_level()`](Self::thread_level).
    ///
    /// # Errors
    ///
    /// Returns an error if MPI is already initialized or if initialization fails.
    pub fn init_thread(required: ThreadLevel) -> Result<Self> {
        if MPI_INITIALIZED.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyInitialized);
        }

        let mut provided: i32 = 0;
        let ret = unsafe { ffi::plainmpi_init_thread(required as i32, &mut provided) };
        if ret != 0 {
            MPI_INITIALIZED.store(false, Ordering::SeqCst);
            return Err(Error::from_code(ret));
        }

        let thread_level = ThreadLevel::from_raw(provided);
        debug!("MPI initialized (requested {required:?}, provided {thread_level:?})");
        Ok(Mpi {
            thread_level,
            _marker: PhantomData,
        })
    }

    /// Get the thread support level that was provided.
    pub fn thread_level(&self) -> ThreadLevel {
        self.thread_level
    }

    /// Get a proxy identical to `MPI_COMM_WORLD`.
    pub fn world(&self) -> Communicator {
        Communicator::world()
    }

    /// Get a proxy identical to `MPI_COMM_SELF`.
    pub fn self_comm(&self) -> Communicator {
        Communicator::self_comm()
    }

    /// Get an owned communicator congruent (but not identical) to
    /// `MPI_COMM_WORLD`.
    ///
    /// Libraries should communicate on such a duplicate so their messages
    /// never match receives posted by the application on the world
    /// communicator.
    pub fn world_duplicate(&self) -> Result<Communicator> {
        Communicator::world().duplicate()
    }

    /// Get the current wall-clock time.
    ///
    /// This is a high-resolution timer suitable for benchmarking.
    pub fn wtime() -> f64 {
        unsafe { ffi::plainmpi_wtime() }
    }

    /// Get the MPI library version string.
    pub fn version() -> Result<String> {
        let mut buf = vec![0u8; 8192];
        let mut len: i32 = 0;
        let ret = unsafe {
            ffi::plainmpi_get_version(buf.as_mut_ptr().cast(), buf.len() as i32, &mut len)
        };
        Error::check(ret)?;

        buf.truncate(len.max(0) as usize);
        let s = String::from_utf8(buf)
            .map_err(|_| Error::Internal("Invalid UTF-8 in version string".into()))?;
        Ok(s.trim_end_matches(['\0', '\n', ' ']).to_string())
    }

    /// Check if MPI has been initialized.
    pub fn is_initialized() -> bool {
        let mut flag: i32 = 0;
        unsafe { ffi::plainmpi_initialized(&mut flag) };
        flag != 0
    }

    /// Check if MPI has been finalized.
    pub fn is_finalized() -> bool {
        let mut flag: i32 = 0;
        unsafe { ffi::plainmpi_finalized(&mut flag) };
        flag != 0
    }
}

impl Drop for Mpi {
    fn drop(&mut self) {
        // Only finalize if we successfully initialized
        if MPI_INITIALIZED.load(Ordering::SeqCst) {
            let ret = unsafe { ffi::plainmpi_finalize() };
            if ret == 0 {
                debug!("MPI finalized");
            } else {
                error!("MPI finalize failed with code {ret}");
            }
            MPI_INITIALIZED.store(false, Ordering::SeqCst);
        }
    }
}

// Mpi is not Send or Sync - MPI must be used from the thread that initialized it
// (unless thread level is Multiple)
// This is enforced by PhantomData<*const ()> in the struct

#[cfg(test)]
mod tests {
    // Note: anything that talks to the runtime must run under mpiexec, see
    // the test_* programs in demos/:
    // cargo build --examples && mpiexec -n 4 ./target/debug/examples/test_collectives
    use super::ThreadLevel;

    #[test]
    fn thread_levels_are_ordered() {
        assert!(ThreadLevel::Single < ThreadLevel::Funneled);
        assert!(ThreadLevel::Funneled < ThreadLevel::Serialized);
        assert!(ThreadLevel::Serialized < ThreadLevel::Multiple);
    }

    #[test]
    fn thread_level_round_trips_through_raw() {
        for level in [
            ThreadLevel::Single,
            ThreadLevel::Funneled,
            ThreadLevel::Serialized,
            ThreadLevel::Multiple,
        ] {
            assert_eq!(ThreadLevel::from_raw(level as i32), level);
        }
        assert_eq!(ThreadLevel::from_raw(17), ThreadLevel::Multiple);
    }
}
