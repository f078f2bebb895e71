//! Integration tests for the pool infrastructure as consumed by a
//! subsystem: the full alloc/populate/publish/mutate/dealloc lifecycle
//! across threads, exercised through the public API only.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

use quasar_3d_engine::quasar3d::pool::{ConcurrentSlotPool, Handle, SlotPool};

// ============================================================================
// SINGLE-THREADED POOL
// ============================================================================

#[test]
fn test_end_to_end_alloc_set_dealloc_reuse() {
    // The canonical lifecycle: three live rows, free the middle one,
    // watch the next alloc land in its slot with fresh contents.
    let mut pool = SlotPool::<(u32, f32), 24>::new();

    let h0 = pool.alloc();
    let h1 = pool.alloc();
    let h2 = pool.alloc();
    pool.set::<0>(h0, 10);
    pool.set::<0>(h1, 20);
    pool.set::<0>(h2, 30);

    pool.dealloc(h1);
    let h3 = pool.alloc();

    assert_eq!(h3.index(), h1.index(), "free-list reuse");
    assert_ne!(h3, h1, "generation separates the lifetimes");
    assert_eq!(*pool.get::<0>(h0), 10);
    assert_eq!(*pool.get::<0>(h2), 30);
    assert_eq!(*pool.get::<0>(h3), 0, "reused slot reads the default, not 20");
    assert_eq!(pool.len(), 3);
}

#[test]
fn test_handles_from_different_generations_never_collide() {
    let mut pool = SlotPool::<(u64,), 16>::new();
    let mut retired = Vec::new();

    // Churn one slot through many lifetimes
    let mut handle = pool.alloc();
    for generation in 0..64u64 {
        pool.set::<0>(handle, generation);
        retired.push(handle);
        pool.dealloc(handle);
        handle = pool.alloc();
        for &old in &retired {
            assert_ne!(old, handle);
            assert!(!pool.is_live(old));
        }
    }
}

// ============================================================================
// CONCURRENT POOL, FULL LIFECYCLE
// ============================================================================

#[test]
fn test_allocate_publish_consume_across_threads() {
    // Producer allocates and populates rows, then publishes the handles
    // through a channel; consumers read them under the row lock.
    let pool = Arc::new(ConcurrentSlotPool::<(u32, u32), 16>::new(128));
    let (sender, receiver) = std::sync::mpsc::channel::<Handle<16>>();

    let producer = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            for value in 0..64u32 {
                let handle = pool.alloc();
                {
                    let mut slot = pool.lock(handle);
                    slot.set::<0>(value);
                    slot.set::<1>(value * 2);
                }
                pool.release(handle);
                sender.send(handle).unwrap();
            }
        })
    };

    let mut seen = 0;
    for handle in receiver {
        let slot = pool.lock(handle);
        let value = *slot.get::<0>();
        assert_eq!(*slot.get::<1>(), value * 2, "row was fully populated before publish");
        seen += 1;
    }
    producer.join().unwrap();
    assert_eq!(seen, 64);
    assert_eq!(pool.len(), 64);
}

#[test]
fn test_mixed_alloc_dealloc_and_row_mutation() {
    // Allocation churn on some threads must not serialize or corrupt
    // per-row mutation on others: the structure lock and the row locks
    // are independent.
    let pool = Arc::new(ConcurrentSlotPool::<(u64,), 16>::new(256));
    let stop = Arc::new(AtomicBool::new(false));

    // A long-lived row that mutator threads hammer
    let shared = pool.alloc();
    pool.release(shared);

    let mutators: Vec<_> = (0..2)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut iterations = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    let mut slot = pool.lock(shared);
                    *slot.get_mut::<0>() += 1;
                    iterations += 1;
                }
                iterations
            })
        })
        .collect();

    let churners: Vec<_> = (0..2)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for _ in 0..500 {
                    let handle = pool.alloc();
                    pool.release(handle);
                    pool.dealloc(handle);
                }
            })
        })
        .collect();

    for churner in churners {
        churner.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);

    let total: u64 = mutators.into_iter().map(|m| m.join().unwrap()).sum();
    let slot = pool.lock(shared);
    assert_eq!(*slot.get::<0>(), total, "every locked increment survived the churn");
}

#[test]
fn test_try_acquire_contention_single_winner() {
    // N threads race try_acquire on one row; exactly one wins each round.
    let pool = Arc::new(ConcurrentSlotPool::<(u32,), 16>::new(8));
    let handle = pool.alloc();
    pool.release(handle);

    for _ in 0..50 {
        let winners = Arc::new(AtomicU32::new(0));
        let barrier = Arc::new(std::sync::Barrier::new(4));
        let racers: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let winners = Arc::clone(&winners);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let won = pool.try_acquire(handle);
                    if won {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                    // Hold until every racer has tried, so a late loser
                    // cannot sneak in after the winner's release.
                    barrier.wait();
                    if won {
                        pool.release(handle);
                    }
                })
            })
            .collect();
        for racer in racers {
            racer.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 1, "exactly one winner per round");
    }
}

#[test]
fn test_free_indices_snapshot_matches_dealloc_order() {
    let pool = ConcurrentSlotPool::<(u32,), 16>::new(8);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let h = pool.alloc();
            pool.release(h);
            h
        })
        .collect();

    pool.dealloc(handles[1]);
    pool.dealloc(handles[3]);
    assert_eq!(pool.free_indices(), vec![1, 3]);
    assert_eq!(pool.len(), 2);
}
