//! Integration test for communicator handles.
//!
//! Exercises proxies and owned communicators: world, self_comm,
//! world_duplicate, duplicate, from_raw_proxy, from_raw_duplicate, compare,
//! is_identical, is_congruent, are_identical and are_congruent, and checks
//! that a duplicate is a separate message space.
//!
//! Run with: mpiexec -n 4 ./target/debug/examples/test_comm_handles

use plainmpi::{are_congruent, are_identical, Communicator, Comparison, Error, Mpi};

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

    assert!(size >= 2, "test_comm_handles requires at least 2 processes");

    // ========================================================================
    // Test 1: two world proxies are identical
    // ========================================================================
    {
        let other = mpi.world();
        assert!(are_identical(&world, &other).expect("compare failed"));
        assert!(!are_congruent(&world, &other).expect("compare failed"));
        assert_eq!(world.compare(&other).unwrap(), Comparison::Identical);
        if rank == 0 {
            println!("PASS: world proxies identical");
        }
    }

    // ========================================================================
    // Test 2: duplicates are owned and congruent, not identical
    // ========================================================================
    {
        let dup = world.duplicate().expect("duplicate failed");
        assert!(!dup.is_proxy(), "duplicate of a proxy should be owned");
        assert!(dup.is_congruent(&world).expect("compare failed"));
        assert!(!dup.is_identical(&world).expect("compare failed"));
        assert_eq!(dup.rank(), rank);
        assert_eq!(dup.size(), size);

        let dup_of_dup = dup.duplicate().expect("duplicate failed");
        assert!(are_congruent(&dup, &dup_of_dup).expect("compare failed"));

        let from_env = mpi.world_duplicate().expect("world_duplicate failed");
        assert!(are_congruent(&world, &from_env).expect("compare failed"));
        assert!(!are_identical(&dup, &from_env).expect("compare failed"));
        if rank == 0 {
            println!("PASS: duplicate / world_duplicate congruent");
        }
    }

    // ========================================================================
    // Test 3: proxies of owned communicators, and moves
    // ========================================================================
    {
        let owned = world.duplicate().expect("duplicate failed");
        let raw = owned.as_raw();

        // SAFETY: `owned` outlives `proxy`.
        let proxy = unsafe { Communicator::from_raw_proxy(raw) };
        assert!(proxy.is_proxy());
        assert!(are_identical(&owned, &proxy).expect("compare failed"));

        // Moving keeps both the handle and the ownership kind
        let moved_owned = owned;
        let moved_proxy = proxy;
        assert_eq!(moved_owned.as_raw(), raw);
        assert!(!moved_owned.is_proxy());
        assert!(moved_proxy.is_proxy());
        assert!(are_identical(&moved_owned, &moved_proxy).expect("compare failed"));

        // Duplicating a proxy gives an owned, congruent communicator
        let from_proxy = moved_proxy.duplicate().expect("duplicate failed");
        assert!(!from_proxy.is_proxy());
        assert!(are_congruent(&from_proxy, &moved_owned).expect("compare failed"));

        let from_raw = Communicator::from_raw_duplicate(&mpi, raw).expect("from_raw_duplicate failed");
        assert!(are_congruent(&from_raw, &moved_owned).expect("compare failed"));

        // The proxy goes first; dropping it never frees the handle
        drop(moved_proxy);
        assert_eq!(moved_owned.size(), size);
        if rank == 0 {
            println!("PASS: proxies and moves");
        }
    }

    // ========================================================================
    // Test 4: self versus world, and a reordered split
    // ========================================================================
    {
        let me = mpi.self_comm();
        assert_eq!(me.compare(&world).unwrap(), Comparison::Unequal);
        assert!(are_identical(&me, &mpi.self_comm()).expect("compare failed"));

        // Same members in reverse order
        let reversed = world
            .split(0, size - rank)
            .expect("split failed")
            .expect("color 0 should join a group");
        assert_eq!(reversed.rank(), size - 1 - rank);
        assert_eq!(reversed.compare(&world).unwrap(), Comparison::Similar);
        if rank == 0 {
            println!("PASS: self / similar comparison");
        }
    }

    // ========================================================================
    // Test 5: a duplicate is a separate message space
    // ========================================================================
    {
        let dup = world.duplicate().expect("duplicate failed");
        if rank == 0 {
            let on_dup = dup.immediate_send(1u32, 1, 0).expect("send on dup failed");
            let on_world = world.immediate_send(2u32, 1, 0).expect("send on world failed");
            drop(on_world);
            drop(on_dup);
        } else if rank == 1 {
            // Same source and tag: only the communicator tells them apart
            let from_world: u32 = world.receive(0, 0).expect("receive on world failed");
            let from_dup: u32 = dup.receive(0, 0).expect("receive on dup failed");
            assert_eq!(from_world, 2);
            assert_eq!(from_dup, 1);
        }
        dup.barrier().expect("barrier failed");
        if rank == 0 {
            println!("PASS: duplicate isolates messages");
        }
    }

    // ========================================================================
    // Test 6: unknown handles are rejected
    // ========================================================================
    {
        match Communicator::from_raw_duplicate(&mpi, 1 << 20) {
            Err(Error::InvalidCommunicator) => {}
            other => panic!("rank {rank}: expected InvalidCommunicator, got {other:?}"),
        }
        if rank == 0 {
            println!("PASS: invalid handle");
        }
    }

    world.barrier().expect("barrier failed");
    if rank == 0 {
        println!("\n========================================");
        println!("All communicator handle tests passed!");
        println!("========================================");
    }
}
