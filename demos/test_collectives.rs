//! Integration test for the fixed-count collective operations.
//!
//! Exercises barrier, broadcast, broadcast_into, broadcast_vec, gather,
//! gather_slice, all_gather, all_gather_slice and scatter with a plain
//! struct, plus root validation and the root-side length check of scatter.
//!
//! A custom panic hook calls `std::process::abort()` to prevent MPI hangs.
//!
//! Run with: mpiexec -n 4 ./target/debug/examples/test_collectives

use plainmpi::{Error, Mpi, Pod, Zeroable};

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

    // Abort instead of unwinding so other ranks do not block in a collective.
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        std::process::abort();
    }));

    let world = mpi.world();
    let rank = world.rank();
    let size = world.size();

    assert!(size >= 2, "test_collectives requires at least 2 processes");

    // ========================================================================
    // Test 1: barrier
    // ========================================================================
    {
        world.barrier().expect("barrier failed");
        if rank == 0 {
            println!("PASS: barrier");
        }
    }

    // ========================================================================
    // Test 2: broadcast of a single struct, from the first and last rank
    // ========================================================================
    {
        let mine = if rank == 0 { Record::sample() } else { Record::zeroed() };
        let got = world.broadcast(0, mine).expect("broadcast failed");
        assert_eq!(got, Record::sample(), "rank {rank}: broadcast mismatch");

        let last = size - 1;
        let got = world
            .broadcast(last, Record::for_rank(rank))
            .expect("broadcast from last failed");
        assert_eq!(got, Record::for_rank(last), "rank {rank}: broadcast from last");

        if rank == 0 {
            println!("PASS: broadcast");
        }
    }

    // ========================================================================
    // Test 3: broadcast_into a fixed buffer
    // ========================================================================
    {
        let mut data = [0.0f64; 10];
        if rank == 0 {
            for (i, x) in data.iter_mut().enumerate() {
                *x = (i + 1) as f64;
            }
        }
        world.broadcast_into(&mut data, 0).expect("broadcast_into failed");
        for (i, &x) in data.iter().enumerate() {
            assert!(
                (x - (i + 1) as f64).abs() < f64::EPSILON,
                "rank {rank}: data[{i}] = {x}"
            );
        }
        if rank == 0 {
            println!("PASS: broadcast_into");
        }
    }

    // ========================================================================
    // Test 4: broadcast_vec sends the length first
    // ========================================================================
    {
        let mine: Vec<Record> = if rank == 0 {
            (0..5).map(Record::for_rank).collect()
        } else {
            Vec::new()
        };
        let got = world.broadcast_vec(0, mine).expect("broadcast_vec failed");
        assert_eq!(got.len(), 5, "rank {rank}: broadcast_vec length");
        for (i, r) in got.iter().enumerate() {
            assert_eq!(*r, Record::for_rank(i as i32));
        }

        // An empty vector at the root empties everyone's
        let mine = if rank == 0 { Vec::new() } else { vec![1u32, 2, 3] };
        let got = world.broadcast_vec(0, mine).expect("empty broadcast_vec failed");
        assert!(got.is_empty(), "rank {rank}: expected empty vector");

        if rank == 0 {
            println!("PASS: broadcast_vec");
        }
    }

    // ========================================================================
    // Test 5: an out-of-range root is rejected before reaching MPI
    // ========================================================================
    {
        match world.broadcast(size, 0u8) {
            Err(Error::InvalidRank(r)) => assert_eq!(r, size),
            other => panic!("rank {rank}: expected InvalidRank, got {other:?}"),
        }
        match world.gather(-1, 0u8) {
            Err(Error::InvalidRank(-1)) => {}
            other => panic!("rank {rank}: expected InvalidRank, got {other:?}"),
        }
        if rank == 0 {
            println!("PASS: root validation");
        }
    }

    // ========================================================================
    // Test 6: gather
    // ========================================================================
    {
        let root = 1;
        let got = world
            .gather(root, Record::for_rank(rank))
            .expect("gather failed");
        if rank == root {
            assert_eq!(got.len(), size as usize);
            for (i, r) in got.iter().enumerate() {
                assert_eq!(*r, Record::for_rank(i as i32), "gather[{i}]");
            }
        } else {
            assert!(got.is_empty(), "rank {rank}: non-root gather should be empty");
        }
        if rank == 0 {
            println!("PASS: gather");
        }
    }

    // ========================================================================
    // Test 7: gather_slice
    // ========================================================================
    {
        let send = [rank * 3, rank * 3 + 1, rank * 3 + 2];
        let got = world.gather_slice(0, &send).expect("gather_slice failed");
        if rank == 0 {
            let expected: Vec<i32> = (0..size * 3).collect();
            assert_eq!(got, expected);
            println!("PASS: gather_slice");
        }
    }

    // ========================================================================
    // Test 8: all_gather
    // ========================================================================
    {
        let got = world
            .all_gather(Record::for_rank(rank))
            .expect("all_gather failed");
        assert_eq!(got.len(), size as usize);
        for (i, r) in got.iter().enumerate() {
            assert_eq!(*r, Record::for_rank(i as i32), "rank {rank}: all_gather[{i}]");
        }
        if rank == 0 {
            println!("PASS: all_gather");
        }
    }

    // ========================================================================
    // Test 9: all_gather_slice of arrays
    // ========================================================================
    {
        let send = [[rank as u16; 3], [rank as u16 + 100; 3]];
        let got = world.all_gather_slice(&send).expect("all_gather_slice failed");
        assert_eq!(got.len(), 2 * size as usize);
        for r in 0..size as usize {
            assert_eq!(got[2 * r], [r as u16; 3]);
            assert_eq!(got[2 * r + 1], [r as u16 + 100; 3]);
        }
        if rank == 0 {
            println!("PASS: all_gather_slice");
        }
    }

    // ========================================================================
    // Test 10: scatter with a spare element at the root
    // ========================================================================
    {
        let to_send: Vec<Record> = if rank == 0 {
            (0..2 * size + 1).map(Record::for_rank).collect()
        } else {
            Vec::new()
        };
        let got = world.scatter(0, &to_send, 2).expect("scatter failed");
        assert_eq!(
            got,
            vec![Record::for_rank(2 * rank), Record::for_rank(2 * rank + 1)],
            "rank {rank}: scatter mismatch"
        );
        if rank == 0 {
            println!("PASS: scatter");
        }
    }

    // ========================================================================
    // Test 11: scatter rejects a short send buffer at the root
    // ========================================================================
    {
        // On the self communicator every process is its own root.
        let me = mpi.self_comm();
        match me.scatter(0, &[1.0f32], 2) {
            Err(Error::InsufficientData {
                required: 2,
                available: 1,
            }) => {}
            other => panic!("rank {rank}: expected InsufficientData, got {other:?}"),
        }
        let got = me.scatter(0, &[1.0f32, 2.0], 2).expect("self scatter failed");
        assert_eq!(got, vec![1.0, 2.0]);
        if rank == 0 {
            println!("PASS: scatter length check");
        }
    }

    // ========================================================================
    // Test 12: oversized counts fail everywhere instead of overflowing
    // ========================================================================
    {
        match world.scatter::<u8>(0, &[], usize::MAX / 2) {
            Err(Error::CountOverflow { elem_size: 1, .. }) => {}
            other => panic!("rank {rank}: expected CountOverflow, got {other:?}"),
        }
        if rank == 0 {
            println!("PASS: scatter count overflow");
        }
    }

    world.barrier().expect("barrier failed");
    if rank == 0 {
        println!("\n========================================");
        println!("All collective tests passed!");
        println!("========================================");
    }
}
