use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

type TestPool = ConcurrentSlotPool<(u32, u64), 16>;

fn published_handle(pool: &TestPool) -> Handle<16> {
    let handle = pool.alloc();
    pool.release(handle);
    handle
}

// ============================================================================
// Allocation
// ============================================================================

#[test]
fn test_alloc_owner_populates_then_releases() {
    let pool = TestPool::new(8);
    let handle = pool.alloc();
    // alloc leaves the calling context as owner
    assert_eq!(pool.owner_of(handle), Some(OwnerToken::current()));
    {
        let mut slot = pool.lock(handle);
        assert!(!slot.acquired(), "we already own the freshly allocated row");
        slot.set::<0>(123);
    }
    assert!(
        pool.owner_of(handle).is_some(),
        "guard on an owned row must not release it"
    );
    pool.release(handle);
    assert!(pool.owner_of(handle).is_none());
}

#[test]
fn test_fresh_rows_read_defaults() {
    let pool = TestPool::new(4);
    let handle = pool.alloc();
    {
        let slot = pool.lock(handle);
        assert_eq!(*slot.get::<0>(), 0);
        assert_eq!(*slot.get::<1>(), 0);
    }
    pool.release(handle);
}

#[test]
fn test_dealloc_then_alloc_reuses_index_with_new_generation() {
    let pool = TestPool::new(4);
    let h1 = published_handle(&pool);
    pool.dealloc(h1);
    let h2 = published_handle(&pool);

    assert_eq!(h2.index(), h1.index());
    assert_ne!(h2, h1);
    assert!(!pool.is_live(h1));
    assert!(pool.is_live(h2));
}

#[test]
fn test_recycled_row_reads_defaults() {
    let pool = TestPool::new(4);
    let h1 = pool.alloc();
    {
        let mut slot = pool.lock(h1);
        slot.set::<0>(999);
    }
    pool.release(h1);
    pool.dealloc(h1);

    let h2 = pool.alloc();
    assert_eq!(h2.index(), h1.index());
    {
        let slot = pool.lock(h2);
        assert_eq!(*slot.get::<0>(), 0, "recycled row must not expose old data");
    }
    pool.release(h2);
}

// ============================================================================
// Capacity bound
// ============================================================================

#[test]
fn test_try_alloc_reports_full() {
    let pool = TestPool::new(2);
    let a = pool.alloc();
    let b = pool.alloc();
    assert!(pool.try_alloc().is_none());
    pool.release(a);
    pool.release(b);
    pool.dealloc(a);
    assert!(pool.try_alloc().is_some(), "dealloc makes room again");
}

#[test]
#[should_panic(expected = "fixed capacity")]
fn test_alloc_past_capacity_panics() {
    let pool = TestPool::new(2);
    let a = pool.alloc();
    let b = pool.alloc();
    pool.release(a);
    pool.release(b);
    pool.alloc();
}

// ============================================================================
// Dealloc contract
// ============================================================================

#[test]
#[should_panic(expected = "still acquired")]
fn test_dealloc_while_acquired_panics() {
    let pool = TestPool::new(2);
    let handle = pool.alloc(); // still owned by us
    pool.dealloc(handle);
}

// ============================================================================
// Scoped guard
// ============================================================================

#[test]
fn test_guard_releases_what_it_acquired() {
    let pool = TestPool::new(2);
    let handle = published_handle(&pool);
    {
        let mut slot = pool.lock(handle);
        assert!(slot.acquired(), "row was unowned, guard performs the acquisition");
        slot.set::<0>(7);
    }
    assert!(pool.owner_of(handle).is_none(), "guard released on drop");
}

#[test]
fn test_nested_guard_does_not_release_outer_ownership() {
    let pool = TestPool::new(2);
    let handle = published_handle(&pool);

    let outer = pool.lock(handle);
    assert!(outer.acquired());
    {
        let inner = pool.lock(handle);
        assert!(!inner.acquired(), "same context: inner guard is a no-op");
    }
    assert_eq!(
        pool.owner_of(handle),
        Some(OwnerToken::current()),
        "inner guard must not have released the row"
    );
    drop(outer);
    assert!(pool.owner_of(handle).is_none());
}

// ============================================================================
// Cross-thread behavior
// ============================================================================

#[test]
fn test_two_threads_never_both_hold_a_row() {
    let pool = Arc::new(TestPool::new(1));
    let handle = published_handle(&pool);
    let in_critical = Arc::new(AtomicBool::new(false));

    let mut workers = Vec::new();
    for _ in 0..4 {
        let pool = Arc::clone(&pool);
        let in_critical = Arc::clone(&in_critical);
        workers.push(thread::spawn(move || {
            for _ in 0..100 {
                let mut slot = pool.lock(handle);
                assert!(slot.acquired());
                assert!(
                    !in_critical.swap(true, Ordering::SeqCst),
                    "mutual exclusion violated"
                );
                let value = *slot.get::<0>();
                slot.set::<0>(value + 1);
                in_critical.store(false, Ordering::SeqCst);
            }
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }
    let slot = pool.lock(handle);
    assert_eq!(*slot.get::<0>(), 400);
}

#[test]
fn test_second_acquire_blocks_until_release() {
    let pool = Arc::new(TestPool::new(1));
    let handle = pool.alloc(); // owned by this thread

    let pool2 = Arc::clone(&pool);
    let waiter = thread::spawn(move || {
        assert!(pool2.acquire(handle), "other thread freshly acquires after release");
        let value = unsafe { *pool2.get::<0>(handle) };
        pool2.release(handle);
        value
    });

    thread::sleep(Duration::from_millis(20));
    unsafe { pool.set::<0>(handle, 55) };
    pool.release(handle);

    assert_eq!(waiter.join().unwrap(), 55);
}

#[test]
fn test_concurrent_allocation_hands_out_unique_indices() {
    let pool = Arc::new(ConcurrentSlotPool::<(u32,), 16>::new(64));
    let mut workers = Vec::new();
    for _ in 0..4 {
        let pool = Arc::clone(&pool);
        workers.push(thread::spawn(move || {
            let mut handles = Vec::new();
            for _ in 0..16 {
                let handle = pool.alloc();
                pool.release(handle);
                handles.push(handle);
            }
            handles
        }));
    }
    let mut seen = std::collections::HashSet::new();
    for worker in workers {
        for handle in worker.join().unwrap() {
            assert!(seen.insert(handle.index()), "index handed out twice");
        }
    }
    assert_eq!(pool.len(), 64);
}
