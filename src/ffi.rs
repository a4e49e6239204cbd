//! Raw FFI bindings to the byte-level C shim in `csrc/plainmpi.c`.
//!
//! Buffers are `void*` with byte counts; communicators are `int32_t` handles
//! and requests `int64_t` handles into tables owned by the shim. Use the safe
//! wrappers in the parent module.

#![allow(dead_code)]

use std::os::raw::{c_char, c_double, c_int, c_void};

/// Handle of `MPI_COMM_WORLD` in the shim's communicator table.
pub const COMM_WORLD: i32 = 0;
/// Handle of `MPI_COMM_SELF` in the shim's communicator table.
pub const COMM_SELF: i32 = 1;
/// Returned by `plainmpi_comm_split` for processes with an undefined color.
pub const COMM_NONE: i32 = -1;

pub const ERR_COMM_HANDLE: c_int = -1;
pub const ERR_REQUEST_HANDLE: c_int = -2;
pub const ERR_NO_MEMORY: c_int = -3;
pub const ERR_COUNT: c_int = -4;

pub const IDENT: i32 = 0;
pub const CONGRUENT: i32 = 1;
pub const SIMILAR: i32 = 2;
pub const UNEQUAL: i32 = 3;

extern "C" {
    // ============================================================
    // Environment
    // ============================================================

    pub fn plainmpi_init_thread(required: c_int, provided: *mut c_int) -> c_int;
    pub fn plainmpi_finalize() -> c_int;
    pub fn plainmpi_initialized(flag: *mut c_int) -> c_int;
    pub fn plainmpi_finalized(flag: *mut c_int) -> c_int;
    pub fn plainmpi_wtime() -> c_double;
    pub fn plainmpi_get_version(buf: *mut c_char, capacity: i32, len: *mut i32) -> c_int;
    pub fn plainmpi_get_processor_name(buf: *mut c_char, capacity: i32, len: *mut i32) -> c_int;
    pub fn plainmpi_error_info(
        code: c_int,
        error_class: *mut i32,
        buf: *mut c_char,
        capacity: i32,
        len: *mut i32,
    ) -> c_int;

    // ============================================================
    // Communicators
    // ============================================================

    pub fn plainmpi_comm_rank(comm: i32, rank: *mut i32) -> c_int;
    pub fn plainmpi_comm_size(comm: i32, size: *mut i32) -> c_int;
    pub fn plainmpi_comm_dup(comm: i32, newcomm: *mut i32) -> c_int;
    pub fn plainmpi_comm_split(comm: i32, color: i32, key: i32, newcomm: *mut i32) -> c_int;
    pub fn plainmpi_comm_free(comm: i32) -> c_int;
    pub fn plainmpi_comm_compare(a: i32, b: i32, result: *mut i32) -> c_int;
    pub fn plainmpi_barrier(comm: i32) -> c_int;

    // ============================================================
    // Point-to-Point
    // ============================================================

    pub fn plainmpi_send(buf: *const c_void, bytes: i64, dest: i32, tag: i32, comm: i32)
        -> c_int;

    pub fn plainmpi_recv(
        buf: *mut c_void,
        bytes: i64,
        source: i32,
        tag: i32,
        comm: i32,
        actual_source: *mut i32,
        actual_tag: *mut i32,
        actual_bytes: *mut i64,
    ) -> c_int;

    pub fn plainmpi_probe(
        source: i32,
        tag: i32,
        comm: i32,
        actual_source: *mut i32,
        actual_tag: *mut i32,
        actual_bytes: *mut i64,
    ) -> c_int;

    pub fn plainmpi_isend(
        buf: *const c_void,
        bytes: i64,
        dest: i32,
        tag: i32,
        comm: i32,
        request: *mut i64,
    ) -> c_int;

    pub fn plainmpi_irecv(
        buf: *mut c_void,
        bytes: i64,
        source: i32,
        tag: i32,
        comm: i32,
        request: *mut i64,
    ) -> c_int;

    // ============================================================
    // Requests
    // ============================================================

    pub fn plainmpi_wait(request: i64, bytes: *mut i64) -> c_int;
    pub fn plainmpi_test(request: i64, flag: *mut i32, bytes: *mut i64) -> c_int;
    pub fn plainmpi_cancel(request: i64) -> c_int;
    pub fn plainmpi_waitall(count: i64, requests: *const i64) -> c_int;

    // ============================================================
    // Collectives
    // ============================================================

    pub fn plainmpi_bcast(buf: *mut c_void, bytes: i64, root: i32, comm: i32) -> c_int;

    pub fn plainmpi_gather(
        sendbuf: *const c_void,
        sendbytes: i64,
        recvbuf: *mut c_void,
        recvbytes: i64,
        root: i32,
        comm: i32,
    ) -> c_int;

    pub fn plainmpi_allgather(
        sendbuf: *const c_void,
        sendbytes: i64,
        recvbuf: *mut c_void,
        recvbytes: i64,
        comm: i32,
    ) -> c_int;

    pub fn plainmpi_scatter(
        sendbuf: *const c_void,
        sendbytes: i64,
        recvbuf: *mut c_void,
        recvbytes: i64,
        root: i32,
        comm: i32,
    ) -> c_int;

    pub fn plainmpi_gatherv(
        sendbuf: *const c_void,
        sendbytes: i64,
        recvbuf: *mut c_void,
        recvcounts: *const i32,
        displs: *const i32,
        root: i32,
        comm: i32,
    ) -> c_int;

    pub fn plainmpi_scatterv(
        sendbuf: *const c_void,
        sendcounts: *const i32,
        displs: *const i32,
        recvbuf: *mut c_void,
        recvbytes: i64,
        root: i32,
        comm: i32,
    ) -> c_int;

    pub fn plainmpi_allgatherv(
        sendbuf: *const c_void,
        sendbytes: i64,
        recvbuf: *mut c_void,
        recvcounts: *const i32,
        displs: *const i32,
        comm: i32,
    ) -> c_int;
}
