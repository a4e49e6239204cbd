//! Variable-count gather example.
//!
//! Each rank contributes `rank + 1` readings; rank 0 collects all of them.
//!
//! Run with: mpiexec -n 4 cargo run --example gatherv

use plainmpi::{Mpi, Pod, Result, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct Reading {
    sensor: u32,
    sequence: u32,
    value: f64,
}

fn main() -> Result<()> {
    let mpi = Mpi::init()?;
    let world = mpi.world();

    let rank = world.rank();
    let size = world.size();

    let mine: Vec<Reading> = (0..=rank as u32)
        .map(|i| Reading {
            sensor: rank as u32,
            sequence: i,
            value: f64::from(rank) + f64::from(i) / 10.0,
        })
        .collect();

    // Every rank knows how many readings each rank contributes
    let counts: Vec<i32> = (0..size).map(|r| r + 1).collect();
    let collected = world.varying_gather(0, &mine, &counts, None)?;

    if rank == 0 {
        let total: i32 = counts.iter().sum();
        assert_eq!(collected.len(), total as usize);

        let mut offset = 0;
        for (r, &n) in counts.iter().enumerate() {
            for i in 0..n as usize {
                let reading = collected[offset + i];
                assert_eq!(reading.sensor, r as u32);
                assert_eq!(reading.sequence, i as u32);
            }
            offset += n as usize;
        }

        println!("Rank 0 collected {} readings:", collected.len());
        for reading in &collected {
            println!(
                "  sensor {} #{}: {:.1}",
                reading.sensor, reading.sequence, reading.value
            );
        }
        println!("\nGatherv test passed!");
    } else {
        assert!(collected.is_empty());
    }

    Ok(())
}
