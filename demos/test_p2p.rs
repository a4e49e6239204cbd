//! Integration test for blocking point-to-point operations.
//!
//! Exercises send, send_slice, receive, receive_into, receive_vec,
//! receive_array, probe and receive_any_len with a plain struct, tag
//! matching, wildcards, short messages and error reporting.
//!
//! A custom panic hook calls `std::process::abort()` to prevent MPI hangs.
//!
//! Run with: mpiexec -n 4 ./target/debug/examples/test_p2p

use plainmpi::{Error, Mpi, MpiErrorClass, Pod, Zeroable, ANY_SOURCE, ANY_TAG};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct Record {
    the_int: i32,
    the_char: u8,
    _pad: [u8; 3],
    the_double: f64,
}

impl Record {
    fn sample() -> Self {
        Record {
            the_int: 42,
            the_char: b'K',
            _pad: [0; 3],
            the_double: 6.66,
        }
    }

    fn for_rank(rank: i32) -> Self {
        Record {
            the_int: 2 * rank,
            ..Record::sample()
        }
    }
}

fn main() {
    let mpi = Mpi::init().expect("MPI init failed");

    // Abort instead of unwinding so other ranks do not block forever.
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        std::process::abort();
    }));

    let world = mpi.world();
    let rank = world.rank();
    let size = world.size();

    assert!(size >= 2, "test_p2p requires at least 2 processes");

    // ========================================================================
    // Test 1: send / receive of a single struct
    // ========================================================================
    {
        if rank == 0 {
            world.send(&Record::sample(), 1, 0).expect("send failed");
        } else if rank == 1 {
            let got: Record = world.receive(0, 0).expect("receive failed");
            assert_eq!(got, Record::sample(), "rank 1: struct mismatch");
        }
        world.barrier().expect("barrier failed");
        if rank == 0 {
            println!("PASS: send/receive struct");
        }
    }

    // ========================================================================
    // Test 2: tags select messages regardless of arrival order
    // ========================================================================
    {
        if rank == 0 {
            let first = world
                .immediate_send(Record::for_rank(5), 1, 5)
                .expect("immediate_send tag 5 failed");
            let second = world
                .immediate_send(Record::for_rank(6), 1, 6)
                .expect("immediate_send tag 6 failed");
            drop(second);
            drop(first);
        } else if rank == 1 {
            let six: Record = world.receive(0, 6).expect("receive tag 6 failed");
            let five: Record = world.receive(0, 5).expect("receive tag 5 failed");
            assert_eq!(six.the_int, 12);
            assert_eq!(five.the_int, 10);
        }
        world.barrier().expect("barrier failed");
        if rank == 0 {
            println!("PASS: tag matching");
        }
    }

    // ========================================================================
    // Test 3: wildcards report the actual envelope
    // ========================================================================
    {
        if rank == 0 {
            let mut seen = vec![false; size as usize];
            for _ in 1..size {
                let mut buf = [Record::zeroed()];
                let status = world
                    .receive_into(&mut buf, ANY_SOURCE, ANY_TAG)
                    .expect("wildcard receive failed");
                assert_eq!(status.count, 1);
                assert_eq!(status.tag, 100 + status.source);
                assert_eq!(buf[0], Record::for_rank(status.source));
                seen[status.source as usize] = true;
            }
            assert!(seen[1..].iter().all(|&s| s), "missing senders: {seen:?}");
            println!("PASS: ANY_SOURCE / ANY_TAG");
        } else {
            world
                .send(&Record::for_rank(rank), 0, 100 + rank)
                .expect("send failed");
        }
        world.barrier().expect("barrier failed");
    }

    // ========================================================================
    // Test 4: receive_vec returns only what arrived
    // ========================================================================
    {
        if rank == 0 {
            world
                .send_slice(&[1.5f64, 2.5, 3.5], 1, 4)
                .expect("send_slice failed");
        } else if rank == 1 {
            let got: Vec<f64> = world.receive_vec(10, 0, 4).expect("receive_vec failed");
            assert_eq!(got, vec![1.5, 2.5, 3.5]);
        }
        world.barrier().expect("barrier failed");
        if rank == 0 {
            println!("PASS: receive_vec (short message)");
        }
    }

    // ========================================================================
    // Test 5: fixed-size arrays
    // ========================================================================
    {
        if rank == 0 {
            world
                .send(&[10i32, 20, 30, 40], 1, 5)
                .expect("send array failed");
        } else if rank == 1 {
            let got: [i32; 4] = world.receive_array(0, 5).expect("receive_array failed");
            assert_eq!(got, [10, 20, 30, 40]);
        }
        world.barrier().expect("barrier failed");
        if rank == 0 {
            println!("PASS: receive_array");
        }
    }

    // ========================================================================
    // Test 6: probe + receive_any_len
    // ========================================================================
    {
        let last = size - 1;
        if rank == last {
            let batch: Vec<Record> = (0..7).map(Record::for_rank).collect();
            world.send_slice(&batch, 0, 6).expect("send batch failed");
        } else if rank == 0 {
            let probed = world.probe::<Record>(ANY_SOURCE, 6).expect("probe failed");
            assert_eq!(probed.source, last);
            assert_eq!(probed.count, 7);

            let (batch, status) = world
                .receive_any_len::<Record>(last, 6)
                .expect("receive_any_len failed");
            assert_eq!(status.count, 7);
            assert_eq!(batch.len(), 7);
            for (i, r) in batch.iter().enumerate() {
                assert_eq!(*r, Record::for_rank(i as i32));
            }
        }
        world.barrier().expect("barrier failed");
        if rank == 0 {
            println!("PASS: probe / receive_any_len");
        }
    }

    // ========================================================================
    // Test 7: receive of one value rejects an empty message
    // ========================================================================
    {
        if rank == 0 {
            world
                .send_slice::<u64>(&[], 1, 7)
                .expect("empty send failed");
        } else if rank == 1 {
            match world.receive::<u64>(0, 7) {
                Err(Error::InvalidCount(0)) => {}
                other => panic!("expected InvalidCount(0), got {other:?}"),
            }
        }
        world.barrier().expect("barrier failed");
        if rank == 0 {
            println!("PASS: receive rejects wrong count");
        }
    }

    // ========================================================================
    // Test 8: runtime errors come back as values
    // ========================================================================
    {
        let err = world
            .send(&1u8, size + 10, 0)
            .expect_err("send to a missing rank should fail");
        assert_eq!(err.class(), Some(MpiErrorClass::Rank), "unexpected {err}");
        if rank == 0 {
            println!("PASS: invalid destination -> {err}");
        }

        // Only -1 is a wildcard; other negative tags are rejected by MPI.
        let mut buf = [0u64];
        let err = world
            .receive_into(&mut buf, rank, -5)
            .expect_err("receive with tag -5 should fail");
        assert_eq!(err.class(), Some(MpiErrorClass::Tag), "unexpected {err}");
        if rank == 0 {
            println!("PASS: negative tag is not a wildcard -> {err}");
        }
    }

    world.barrier().expect("barrier failed");
    if rank == 0 {
        println!("\n========================================");
        println!("All point-to-point tests passed!");
        println!("========================================");
    }
}
