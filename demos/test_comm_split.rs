//! Integration test for communicator splitting.
//!
//! Exercises split by color, key ordering, opting out with a negative color,
//! collectives on the resulting communicators and nested splits.
//!
//! Run with: mpiexec -n 4 ./target/debug/examples/test_comm_split

use plainmpi::Mpi;

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

    assert!(size >= 2, "test_comm_split requires at least 2 processes");

    // ========================================================================
    // Test 1: even / odd split
    // ========================================================================
    {
        let color = rank % 2;
        let group = world
            .split(color, rank)
            .expect("split failed")
            .expect("non-negative color should join a group");
        assert!(!group.is_proxy(), "split result should be owned");

        let expected_size = (size + 1 - color) / 2;
        assert_eq!(group.size(), expected_size, "rank {rank}: group size");
        assert_eq!(group.rank(), rank / 2, "rank {rank}: group rank");

        // Every member learns the world ranks of its group
        let members = group.all_gather(rank).expect("all_gather failed");
        let expected: Vec<i32> = (0..size).filter(|r| r % 2 == color).collect();
        assert_eq!(members, expected, "rank {rank}: group members");
        if rank == 0 {
            println!("PASS: split by color");
        }
    }

    // ========================================================================
    // Test 2: key decides the order
    // ========================================================================
    {
        let reversed = world
            .split(7, -rank)
            .expect("split failed")
            .expect("color 7 should join a group");
        assert_eq!(reversed.size(), size);
        assert_eq!(reversed.rank(), size - 1 - rank, "rank {rank}: reversed rank");

        // Rank 0 of the new communicator is the last world rank
        let root_world_rank = reversed.broadcast(0, rank).expect("broadcast failed");
        assert_eq!(root_world_rank, size - 1);
        if rank == 0 {
            println!("PASS: split key ordering");
        }
    }

    // ========================================================================
    // Test 3: a negative color opts out
    // ========================================================================
    {
        let color = if rank == 0 { -1 } else { 3 };
        let group = world.split(color, 0).expect("split failed");
        if rank == 0 {
            assert!(group.is_none(), "rank 0 should be left out");
            println!("PASS: negative color yields None");
        } else {
            let group = group.expect("ranks with color 3 should join");
            assert_eq!(group.size(), size - 1);
            assert_eq!(group.rank(), rank - 1);
            let sum: i32 = group
                .gather(0, rank)
                .expect("gather failed")
                .iter()
                .sum();
            if group.rank() == 0 {
                assert_eq!(sum, (1..size).sum::<i32>());
            }
        }
        world.barrier().expect("barrier failed");
    }

    // ========================================================================
    // Test 4: nested split down to single-member communicators
    // ========================================================================
    {
        let halves = world
            .split(i32::from(rank >= size / 2), rank)
            .expect("split failed")
            .expect("should join a half");
        let single = halves
            .split(halves.rank(), 0)
            .expect("nested split failed")
            .expect("should join a singleton");
        assert_eq!(single.size(), 1);
        assert_eq!(single.rank(), 0);
        assert!(single.is_congruent(&mpi.self_comm()).expect("compare failed"));
        if rank == 0 {
            println!("PASS: nested split");
        }
    }

    world.barrier().expect("barrier failed");
    if rank == 0 {
        println!("\n========================================");
        println!("All comm split tests passed!");
        println!("========================================");
    }
}
