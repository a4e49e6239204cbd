//! Hello World example - basic MPI initialization and a gather of plain structs.
//!
//! Run with: mpiexec -n 4 cargo run --example hello_world

use plainmpi::{Mpi, Pod, Result, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Greeting {
    rank: i32,
    pid: u32,
    started_at: f64,
}

fn main() -> Result<()> {
    // Initialize MPI
    let mpi = Mpi::init()?;
    let world = mpi.world();

    let rank = world.rank();
    let size = world.size();
    let processor_name = world.processor_name()?;
    let version = Mpi::version()?;

    println!(
        "Hello from rank {} of {} on {} ({})",
        rank,
        size,
        processor_name,
        version.lines().next().unwrap_or_default()
    );

    let greeting = Greeting {
        rank,
        pid: std::process::id(),
        started_at: Mpi::wtime(),
    };
    let greetings = world.gather(0, greeting)?;

    if rank == 0 {
        for g in &greetings {
            println!("  rank {} is pid {} (t={:.6})", g.rank, g.pid, g.started_at);
        }
        assert_eq!(greetings.len(), size as usize);
        println!("\nAll processes reported in. Test passed!");
    }

    // MPI is finalized when `mpi` is dropped
    Ok(())
}
