//! Integration test for MPI lifecycle functions.
//!
//! Exercises Mpi::init, the double-init guard, version, wtime,
//! is_initialized, is_finalized, thread_level, world, self_comm and
//! world_duplicate.
//!
//! Run with: mpiexec -n 2 ./target/debug/examples/test_lifecycle

use plainmpi::{Error, Mpi, ThreadLevel};

fn main() {
    let mpi = Mpi::init().expect("MPI init failed");

    // Test is_initialized after init
    assert!(
        Mpi::is_initialized(),
        "is_initialized should be true after init"
    );
    println!("PASS: is_initialized");

    // Test is_finalized before drop
    assert!(
        !Mpi::is_finalized(),
        "is_finalized should be false before drop"
    );
    println!("PASS: is_finalized (false before drop)");

    // A second environment must be refused
    match Mpi::init() {
        Err(Error::AlreadyInitialized) => println!("PASS: second init refused"),
        Err(e) => panic!("second init returned unexpected error: {e}"),
        Ok(_) => panic!("second init should fail"),
    }

    // Test thread_level
    let level = mpi.thread_level();
    assert!(
        level >= ThreadLevel::Single,
        "thread_level should be >= Single"
    );
    println!("PASS: thread_level = {:?}", level);

    // Test version
    let version = Mpi::version().expect("version() failed");
    assert!(!version.is_empty(), "version string should not be empty");
    println!("PASS: version = {}", version.lines().next().unwrap_or_default());

    // Test wtime
    let t1 = Mpi::wtime();
    assert!(t1 > 0.0, "wtime should return positive value");
    let t2 = Mpi::wtime();
    assert!(t2 >= t1, "wtime should be monotonic");
    println!("PASS: wtime = {}", t1);

    // Test world
    let world = mpi.world();
    let rank = world.rank();
    let size = world.size();
    assert!(rank >= 0 && rank < size, "rank should be in [0, size)");
    assert!(size >= 1, "size should be >= 1");
    assert!(world.is_proxy(), "world should be a proxy");
    println!("PASS: world rank={} size={}", rank, size);

    // Test self_comm
    let me = mpi.self_comm();
    assert_eq!(me.rank(), 0, "self rank should be 0");
    assert_eq!(me.size(), 1, "self size should be 1");
    assert!(me.is_proxy(), "self should be a proxy");
    println!("PASS: self_comm");

    // Test world_duplicate
    let dup = mpi.world_duplicate().expect("world_duplicate failed");
    assert!(!dup.is_proxy(), "world duplicate should be owned");
    assert_eq!(dup.rank(), rank);
    assert_eq!(dup.size(), size);
    println!("PASS: world_duplicate");

    // Test processor_name
    let name = world.processor_name().expect("processor_name failed");
    assert!(!name.is_empty(), "processor_name should not be empty");
    println!("PASS: processor_name = {}", name);

    // Owned communicators must be released before finalize
    drop(dup);

    // Mpi drops here, which finalizes MPI
    drop(mpi);
    assert!(Mpi::is_finalized(), "is_finalized should be true after drop");

    if rank == 0 {
        println!("\n========================================");
        println!("All lifecycle tests passed!");
        println!("========================================");
    }
}
