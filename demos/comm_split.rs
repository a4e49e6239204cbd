//! Communicator split example.
//!
//! Splits the world into even and odd ranks and broadcasts a per-group value
//! from each group's first member.
//!
//! Run with: mpiexec -n 4 cargo run --example comm_split

use plainmpi::{Mpi, Result};

fn main() -> Result<()> {
    let mpi = Mpi::init()?;
    let world = mpi.world();

    let rank = world.rank();
    let color = rank % 2;

    let group = world
        .split(color, rank)?
        .expect("non-negative colors always join a group");

    let group_rank = group.rank();
    let group_size = group.size();

    // The leader of each group picks a label; everyone in the group learns it
    let label = if group_rank == 0 { [color as u8 + b'A'; 4] } else { [0u8; 4] };
    let label = group.broadcast(0, label)?;

    println!(
        "World rank {}: group {} ({}), rank {} of {}",
        rank,
        color,
        String::from_utf8_lossy(&label),
        group_rank,
        group_size
    );

    assert_eq!(label, [color as u8 + b'A'; 4]);

    world.barrier()?;
    if rank == 0 {
        println!("\nComm split test passed!");
    }

    Ok(())
}
