//! Integration test for nonblocking point-to-point operations.
//!
//! Exercises immediate_send, immediate_send_slice, immediate_receive and
//! immediate_receive_vec with SendRequest / ReceiveRequest wait, is_completed,
//! take, take_one, received_count and wait_all, plus short messages and the
//! drop behavior of both request kinds.
//!
//! Run with: mpiexec -n 4 ./target/debug/examples/test_nonblocking

use plainmpi::{Mpi, Pod, SendRequest, Zeroable};

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

    // Abort instead of unwinding so other ranks do not block forever.
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        std::process::abort();
    }));

    let world = mpi.world();
    let rank = world.rank();
    let size = world.size();

    assert!(
        size >= 2,
        "test_nonblocking requires at least 2 processes, got {size}"
    );

    let next = (rank + 1) % size;
    let prev = (rank + size - 1) % size;

    // ========================================================================
    // Test 1: immediate_send / immediate_receive with wait and take_one
    // ========================================================================
    {
        let mut recv = world
            .immediate_receive::<Record>(prev, 100)
            .expect("immediate_receive failed");
        let mut send = world
            .immediate_send(Record::for_rank(rank), next, 100)
            .expect("immediate_send failed");

        send.wait().expect("send wait failed");
        // A second wait is a no-op
        send.wait().expect("second send wait failed");
        recv.wait().expect("receive wait failed");
        assert!(recv.is_completed().expect("is_completed failed"));

        let got = recv.take_one().expect("take_one failed");
        assert_eq!(got, Record::for_rank(prev), "rank {rank}: ring mismatch");
        if rank == 0 {
            println!("PASS: immediate_send / immediate_receive");
        }
    }

    // ========================================================================
    // Test 2: polling with is_completed
    // ========================================================================
    {
        let mut recv = world
            .immediate_receive::<[f64; 2]>(prev, 101)
            .expect("immediate_receive failed");
        let mut send = world
            .immediate_send([f64::from(rank), -f64::from(rank)], next, 101)
            .expect("immediate_send failed");

        let mut polls = 0u64;
        while !recv.is_completed().expect("is_completed failed") {
            polls += 1;
            std::hint::spin_loop();
        }
        while !send.is_completed().expect("is_completed failed") {
            std::hint::spin_loop();
        }

        let got = recv.take_one().expect("take_one failed");
        assert_eq!(got, [f64::from(prev), -f64::from(prev)]);
        if rank == 0 {
            println!("PASS: is_completed polling ({polls} polls)");
        }
    }

    // ========================================================================
    // Test 3: slices and take without an explicit wait
    // ========================================================================
    {
        let recv = world
            .immediate_receive_vec::<Record>(3, prev, 102)
            .expect("immediate_receive_vec failed");
        let batch: Vec<Record> = (0..3).map(|i| Record::for_rank(rank * 3 + i)).collect();
        let send = world
            .immediate_send_slice(&batch, next, 102)
            .expect("immediate_send_slice failed");
        // The request holds its own copy of the payload
        drop(batch);

        let got = recv.take().expect("take failed");
        let expected: Vec<Record> = (0..3).map(|i| Record::for_rank(prev * 3 + i)).collect();
        assert_eq!(got, expected, "rank {rank}: slice mismatch");

        // Dropping an incomplete send waits for it
        drop(send);
        if rank == 0 {
            println!("PASS: immediate_send_slice / immediate_receive_vec / take");
        }
    }

    // ========================================================================
    // Test 4: wait_all over many sends
    // ========================================================================
    {
        if rank == 0 {
            let requests: Vec<SendRequest> = (1..size)
                .map(|dest| {
                    world
                        .immediate_send(dest * 1000, dest, 103)
                        .expect("immediate_send failed")
                })
                .collect();
            SendRequest::wait_all(requests).expect("wait_all failed");
            println!("PASS: wait_all");
        } else {
            let got: i32 = world.receive(0, 103).expect("receive failed");
            assert_eq!(got, rank * 1000);
        }
        world.barrier().expect("barrier failed");
    }

    // ========================================================================
    // Test 5: a short message is not padded
    // ========================================================================
    {
        let mut recv = world
            .immediate_receive_vec::<Record>(5, prev, 105)
            .expect("immediate_receive_vec failed");
        assert_eq!(recv.received_count(), None, "count known before completion");
        let send = world
            .immediate_send_slice(&[Record::for_rank(rank), Record::for_rank(rank + 1)], next, 105)
            .expect("immediate_send_slice failed");

        recv.wait().expect("receive wait failed");
        assert_eq!(recv.received_count(), Some(2));
        let got = recv.take().expect("take failed");
        assert_eq!(
            got,
            vec![Record::for_rank(prev), Record::for_rank(prev + 1)],
            "rank {rank}: short message should yield only what was sent"
        );
        drop(send);

        // Same through polling
        let mut recv = world
            .immediate_receive_vec::<u16>(8, prev, 106)
            .expect("immediate_receive_vec failed");
        let mut send = world
            .immediate_send_slice(&[7u16; 3], next, 106)
            .expect("immediate_send_slice failed");
        while !recv.is_completed().expect("is_completed failed") {
            std::hint::spin_loop();
        }
        send.wait().expect("send wait failed");
        assert_eq!(recv.take().expect("take failed"), vec![7u16; 3]);
        if rank == 0 {
            println!("PASS: take truncates short messages");
        }
    }

    // ========================================================================
    // Test 6: wait_all over a mix of completed and pending sends
    // ========================================================================
    {
        let mut first = world
            .immediate_send(1u8, next, 107)
            .expect("immediate_send failed");
        let second = world
            .immediate_send(2u8, next, 108)
            .expect("immediate_send failed");
        let a: u8 = world.receive(prev, 107).expect("receive failed");
        first.wait().expect("send wait failed");
        let b: u8 = world.receive(prev, 108).expect("receive failed");
        SendRequest::wait_all(vec![first, second]).expect("wait_all failed");
        assert_eq!((a, b), (1, 2));
        world.barrier().expect("barrier failed");
        if rank == 0 {
            println!("PASS: wait_all skips completed requests");
        }
    }

    // ========================================================================
    // Test 7: dropping a pending receive cancels it
    // ========================================================================
    {
        {
            // Nobody ever sends with this tag
            let _orphan = world
                .immediate_receive::<u64>(next, 999)
                .expect("immediate_receive failed");
        }

        // The cancelled receive must not swallow a later message
        let mut recv = world
            .immediate_receive::<u64>(prev, 104)
            .expect("immediate_receive failed");
        let mut send = world
            .immediate_send(rank as u64, next, 104)
            .expect("immediate_send failed");
        send.wait().expect("send wait failed");
        recv.wait().expect("receive wait failed");
        assert_eq!(recv.take_one().expect("take_one failed"), prev as u64);

        world.barrier().expect("barrier failed");
        if rank == 0 {
            println!("PASS: drop cancels pending receive");
        }
    }

    world.barrier().expect("barrier failed");
    if rank == 0 {
        println!("\n========================================");
        println!("All nonblocking tests passed!");
        println!("========================================");
    }
}
