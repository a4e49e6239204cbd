//! Error types for plainmpi

use crate::ffi;
use thiserror::Error;

/// Result type for MPI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Portable classification of an error reported by the MPI runtime.
///
/// The runtime's `MPI_ERR_*` classes have implementation-specific numeric
/// values; the C shim translates them into these stable variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MpiErrorClass {
    /// Invalid buffer pointer
    Buffer,
    /// Invalid count argument
    Count,
    /// Invalid datatype argument
    Type,
    /// Invalid tag argument
    Tag,
    /// Invalid communicator
    Comm,
    /// Invalid rank
    Rank,
    /// Invalid request handle
    Request,
    /// Invalid root
    Root,
    /// Invalid group
    Group,
    /// Invalid operation
    Op,
    /// Invalid topology
    Topology,
    /// Invalid dimension argument
    Dims,
    /// Invalid argument of some other kind
    Arg,
    /// Unknown error
    Unknown,
    /// Message truncated on receive
    Truncate,
    /// Internal MPI error
    Intern,
    /// Error code is in status
    InStatus,
    /// Pending request
    Pending,
    /// Memory exhausted
    NoMem,
    /// Any other class
    Other,
}

impl MpiErrorClass {
    /// Map a `PLAINMPI_ERRCLASS_*` value from `csrc/plainmpi.h`.
    pub(crate) fn from_raw(raw: i32) -> Self {
        match raw {
            1 => MpiErrorClass::Buffer,
            2 => MpiErrorClass::Count,
            3 => MpiErrorClass::Type,
            4 => MpiErrorClass::Tag,
            5 => MpiErrorClass::Comm,
            6 => MpiErrorClass::Rank,
            7 => MpiErrorClass::Request,
            8 => MpiErrorClass::Root,
            9 => MpiErrorClass::Group,
            10 => MpiErrorClass::Op,
            11 => MpiErrorClass::Topology,
            12 => MpiErrorClass::Dims,
            13 => MpiErrorClass::Arg,
            14 => MpiErrorClass::Unknown,
            15 => MpiErrorClass::Truncate,
            17 => MpiErrorClass::Intern,
            18 => MpiErrorClass::InStatus,
            19 => MpiErrorClass::Pending,
            20 => MpiErrorClass::NoMem,
            _ => MpiErrorClass::Other,
        }
    }
}

/// Error types for MPI operations
#[derive(Error, Debug)]
pub enum Error {
    /// MPI has already been initialized
    #[error("MPI has already been initialized")]
    AlreadyInitialized,

    /// MPI has not been initialized
    #[error("MPI has not been initialized")]
    NotInitialized,

    /// Invalid rank specified
    #[error("Invalid rank: {0}")]
    InvalidRank(i32),

    /// Invalid communicator handle
    #[error("Invalid communicator")]
    InvalidCommunicator,

    /// Invalid request handle
    #[error("Invalid request handle")]
    InvalidRequest,

    /// Invalid buffer provided
    #[error("Invalid buffer")]
    InvalidBuffer,

    /// Invalid count specified
    #[error("Invalid count: {0}")]
    InvalidCount(i64),

    /// An element count does not fit the runtime's byte count
    #[error("{count} elements of {elem_size} bytes exceed the MPI count limit")]
    CountOverflow {
        /// Number of elements requested
        count: i64,
        /// Size of one element in bytes
        elem_size: usize,
    },

    /// The root holds fewer elements than the operation distributes
    #[error("Not enough data to send: {required} elements required, {available} available")]
    InsufficientData {
        /// Elements the operation reads
        required: usize,
        /// Elements provided
        available: usize,
    },

    /// Error reported by the MPI runtime
    #[error("MPI error {code} ({class:?}): {message}")]
    Mpi {
        /// Portable error class
        class: MpiErrorClass,
        /// Raw error code returned by the runtime
        code: i32,
        /// Message from `MPI_Error_string`
        message: String,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an error from a non-zero return code of the C shim.
    ///
    /// Negative codes are raised by the shim itself, positive codes come from
    /// the MPI runtime and are described with `MPI_Error_class` and
    /// `MPI_Error_string`.
    pub fn from_code(code: i32) -> Self {
        match code {
            ffi::ERR_COMM_HANDLE => Error::InvalidCommunicator,
            ffi::ERR_REQUEST_HANDLE => Error::InvalidRequest,
            ffi::ERR_NO_MEMORY => Error::Internal("handle table allocation failed".into()),
            ffi::ERR_COUNT => Error::Internal("byte count exceeds the MPI int range".into()),
            c if c < 0 => Error::Internal(format!("unknown shim error {c}")),
            c => Self::describe(c),
        }
    }

    /// Check a shim return code, returning Ok(()) for success.
    pub fn check(code: i32) -> Result<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(Error::from_code(code))
        }
    }

    /// The runtime error class, if this error came from MPI.
    pub fn class(&self) -> Option<MpiErrorClass> {
        match self {
            Error::Mpi { class, .. } => Some(*class),
            _ => None,
        }
    }

    fn describe(code: i32) -> Self {
        let mut buf = [0u8; 512];
        let mut len: i32 = 0;
        let mut raw_class: i32 = 0;
        let ret = unsafe {
            ffi::plainmpi_error_info(
                code,
                &mut raw_class,
                buf.as_mut_ptr().cast(),
                buf.len() as i32,
                &mut len,
            )
        };
        let message = if ret == 0 {
            let len = (len.max(0) as usize).min(buf.len());
            String::from_utf8_lossy(&buf[..len]).trim_end().to_string()
        } else {
            String::new()
        };
        Error::Mpi {
            class: MpiErrorClass::from_raw(raw_class),
            code,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_code_checks_ok() {
        assert!(Error::check(0).is_ok());
    }

    #[test]
    fn shim_codes_map_to_handle_errors() {
        assert!(matches!(
            Error::from_code(ffi::ERR_COMM_HANDLE),
            Error::InvalidCommunicator
        ));
        assert!(matches!(
            Error::from_code(ffi::ERR_REQUEST_HANDLE),
            Error::InvalidRequest
        ));
        assert!(matches!(
            Error::from_code(ffi::ERR_NO_MEMORY),
            Error::Internal(_)
        ));
        assert!(matches!(
            Error::check(ffi::ERR_COUNT),
            Err(Error::Internal(_))
        ));
        assert!(matches!(Error::from_code(-99), Error::Internal(_)));
    }

    #[test]
    fn error_class_values_match_c_defines() {
        assert_eq!(MpiErrorClass::from_raw(1), MpiErrorClass::Buffer);
        assert_eq!(MpiErrorClass::from_raw(5), MpiErrorClass::Comm);
        assert_eq!(MpiErrorClass::from_raw(6), MpiErrorClass::Rank);
        assert_eq!(MpiErrorClass::from_raw(15), MpiErrorClass::Truncate);
        assert_eq!(MpiErrorClass::from_raw(16), MpiErrorClass::Other);
        assert_eq!(MpiErrorClass::from_raw(20), MpiErrorClass::NoMem);
        assert_eq!(MpiErrorClass::from_raw(0), MpiErrorClass::Other);
        assert_eq!(MpiErrorClass::from_raw(1000), MpiErrorClass::Other);
    }

    #[test]
    fn class_only_for_runtime_errors() {
        let err = Error::Mpi {
            class: MpiErrorClass::Truncate,
            code: 15,
            message: "Message truncated".into(),
        };
        assert_eq!(err.class(), Some(MpiErrorClass::Truncate));
        assert_eq!(Error::InvalidBuffer.class(), None);
    }

    #[test]
    fn display_messages() {
        let err = Error::CountOverflow {
            count: 3,
            elem_size: 8,
        };
        assert_eq!(
            err.to_string(),
            "3 elements of 8 bytes exceed the MPI count limit"
        );
        let err = Error::InsufficientData {
            required: 8,
            available: 4,
        };
        assert_eq!(
            err.to_string(),
            "Not enough data to send: 8 elements required, 4 available"
        );
        let err = Error::Mpi {
            class: MpiErrorClass::Rank,
            code: 6,
            message: "Invalid rank".into(),
        };
        assert_eq!(err.to_string(), "MPI error 6 (Rank): Invalid rank");
    }
}
