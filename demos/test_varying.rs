//! Integration test for the variable-count collectives.
//!
//! Exercises varying_scatter, varying_gather and varying_all_gather with
//! back-to-back layouts, explicit (reordered and gapped) displacements and
//! ranks that contribute nothing.
//!
//! A custom panic hook calls `std::process::abort()` to prevent MPI hangs.
//!
//! Run with: mpiexec -n 4 ./target/debug/examples/test_varying

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
    fn for_rank(rank: i32) -> Self {
        Record {
            the_int: 2 * rank,
            the_char: b'K',
            _pad: [0; 3],
            the_double: 6.66,
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

    assert!(size >= 2, "test_varying requires at least 2 processes");

    // Rank i handles i + 1 elements
    let counts: Vec<i32> = (0..size).map(|r| r + 1).collect();
    let total: i32 = counts.iter().sum();
    let offset_of = |r: i32| -> i32 { counts[..r as usize].iter().sum() };

    // ========================================================================
    // Test 1: varying_scatter, back to back
    // ========================================================================
    {
        let to_send: Vec<Record> = if rank == 0 {
            (0..total).map(Record::for_rank).collect()
        } else {
            Vec::new()
        };
        let got = world
            .varying_scatter(0, &to_send, &counts, None)
            .expect("varying_scatter failed");
        let first = offset_of(rank);
        let expected: Vec<Record> = (first..first + rank + 1).map(Record::for_rank).collect();
        assert_eq!(got, expected, "rank {rank}: varying_scatter mismatch");
        if rank == 0 {
            println!("PASS: varying_scatter");
        }
    }

    // ========================================================================
    // Test 2: varying_scatter with reversed blocks
    // ========================================================================
    {
        // Rank size-1's block comes first in the send buffer
        let displs: Vec<i32> = (0..size)
            .map(|r| (r + 1..size).map(|q| q + 1).sum())
            .collect();
        let to_send: Vec<i32> = if rank == 0 {
            let mut buf = vec![-1; total as usize];
            for r in 0..size {
                for i in 0..=r {
                    buf[(displs[r as usize] + i) as usize] = 100 * r + i;
                }
            }
            buf
        } else {
            Vec::new()
        };
        let got = world
            .varying_scatter(0, &to_send, &counts, Some(&displs))
            .expect("varying_scatter with displacements failed");
        let expected: Vec<i32> = (0..=rank).map(|i| 100 * rank + i).collect();
        assert_eq!(got, expected, "rank {rank}: reversed varying_scatter");
        if rank == 0 {
            println!("PASS: varying_scatter (displacements)");
        }
    }

    // ========================================================================
    // Test 3: varying_gather, back to back
    // ========================================================================
    {
        let mine: Vec<Record> = (0..=rank).map(|i| Record::for_rank(rank * 10 + i)).collect();
        let root = size - 1;
        let got = world
            .varying_gather(root, &mine, &counts, None)
            .expect("varying_gather failed");
        if rank == root {
            assert_eq!(got.len(), total as usize);
            for r in 0..size {
                for i in 0..=r {
                    let at = (offset_of(r) + i) as usize;
                    assert_eq!(got[at], Record::for_rank(r * 10 + i), "gathered[{at}]");
                }
            }
        } else {
            assert!(got.is_empty(), "rank {rank}: non-root should get nothing");
        }
        if rank == 0 {
            println!("PASS: varying_gather");
        }
    }

    // ========================================================================
    // Test 4: varying_gather with gaps between blocks
    // ========================================================================
    {
        // One element per rank, every other slot
        let ones = vec![1; size as usize];
        let displs: Vec<i32> = (0..size).map(|r| 2 * r).collect();
        let got = world
            .varying_gather(0, &[rank as u64 + 1], &ones, Some(&displs))
            .expect("varying_gather with gaps failed");
        if rank == 0 {
            assert_eq!(got.len(), 2 * size as usize - 1);
            for r in 0..size as usize {
                assert_eq!(got[2 * r], r as u64 + 1);
                if 2 * r + 1 < got.len() {
                    assert_eq!(got[2 * r + 1], 0, "gap at {} should stay zeroed", 2 * r + 1);
                }
            }
            println!("PASS: varying_gather (gaps)");
        }
    }

    // ========================================================================
    // Test 5: varying_all_gather
    // ========================================================================
    {
        let mine: Vec<f64> = (0..=rank).map(|i| f64::from(rank) + f64::from(i) / 10.0).collect();
        let got = world
            .varying_all_gather(&mine, &counts, None)
            .expect("varying_all_gather failed");
        assert_eq!(got.len(), total as usize);
        for r in 0..size {
            for i in 0..=r {
                let at = (offset_of(r) + i) as usize;
                let expected = f64::from(r) + f64::from(i) / 10.0;
                assert!(
                    (got[at] - expected).abs() < f64::EPSILON,
                    "rank {rank}: all_gathered[{at}] = {}, expected {expected}",
                    got[at]
                );
            }
        }
        if rank == 0 {
            println!("PASS: varying_all_gather");
        }
    }

    // ========================================================================
    // Test 6: ranks contributing nothing
    // ========================================================================
    {
        // Only odd ranks contribute, two values each
        let sparse: Vec<i32> = (0..size).map(|r| if r % 2 == 1 { 2 } else { 0 }).collect();
        let mine: Vec<i32> = if rank % 2 == 1 { vec![rank, -rank] } else { Vec::new() };
        let got = world
            .varying_all_gather(&mine, &sparse, None)
            .expect("sparse varying_all_gather failed");
        let expected: Vec<i32> = (0..size)
            .filter(|r| r % 2 == 1)
            .flat_map(|r| [r, -r])
            .collect();
        assert_eq!(got, expected, "rank {rank}: sparse all_gather");
        if rank == 0 {
            println!("PASS: varying_all_gather (empty blocks)");
        }
    }

    // ========================================================================
    // Test 7: too few counts are rejected locally
    // ========================================================================
    {
        let short = vec![1; size as usize - 1];
        match world.varying_all_gather(&[0u8], &short, None) {
            Err(Error::InvalidBuffer) => {}
            other => panic!("rank {rank}: expected InvalidBuffer, got {other:?}"),
        }

        // Rejected on the root and on every other rank alike, so nobody is
        // left waiting inside the gather.
        let mut bad = vec![1; size as usize];
        bad[size as usize - 1] = -1;
        match world.varying_gather(0, &[0u8], &bad, None) {
            Err(Error::InvalidCount(-1)) => {}
            other => panic!("rank {rank}: expected InvalidCount(-1), got {other:?}"),
        }
        let ones = vec![1; size as usize];
        match world.varying_gather(0, &[0u8], &ones, Some(&[0])) {
            Err(Error::InvalidBuffer) => {}
            other => panic!("rank {rank}: expected InvalidBuffer, got {other:?}"),
        }
        if rank == 0 {
            println!("PASS: count validation");
        }
    }

    world.barrier().expect("barrier failed");
    if rank == 0 {
        println!("\n========================================");
        println!("All variable-count tests passed!");
        println!("========================================");
    }
}
