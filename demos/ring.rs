//! Ring communication example - point-to-point transfer of a plain struct.
//!
//! Each process sends a token to the next process in a ring pattern.
//!
//! Run with: mpiexec -n 4 cargo run --example ring

use plainmpi::{Mpi, Pod, Result, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct Token {
    origin: i32,
    hops: i32,
    payload: [f64; 2],
}

fn main() -> Result<()> {
    let mpi = Mpi::init()?;
    let world = mpi.world();

    let rank = world.rank();
    let size = world.size();

    if size < 2 {
        if rank == 0 {
            eprintln!("This example requires at least 2 processes");
        }
        return Ok(());
    }

    // Calculate neighbors in the ring
    let next = (rank + 1) % size;
    let prev = (rank + size - 1) % size;

    let token = Token {
        origin: rank,
        hops: 1,
        payload: [rank as f64 * 100.0 + 1.0, rank as f64 * 100.0 + 2.0],
    };

    println!("Rank {}: sending {:?} to rank {}", rank, token, next);

    // Even ranks send first, then receive
    // Odd ranks receive first, then send
    // This avoids deadlock
    let received: Token = if rank % 2 == 0 {
        world.send(&token, next, 0)?;
        world.receive(prev, 0)?
    } else {
        let received = world.receive(prev, 0)?;
        world.send(&token, next, 0)?;
        received
    };
    println!("Rank {}: received {:?} from rank {}", rank, received, prev);

    let expected = Token {
        origin: prev,
        hops: 1,
        payload: [prev as f64 * 100.0 + 1.0, prev as f64 * 100.0 + 2.0],
    };
    assert_eq!(received, expected, "Data mismatch!");

    world.barrier()?;

    if rank == 0 {
        println!("\nRing communication test passed!");
    }

    Ok(())
}
