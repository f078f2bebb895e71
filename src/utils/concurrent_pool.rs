/// Thread-safe, fixed-capacity handle-based object pool.
///
/// The shared counterpart of [`SlotPool`](super::SlotPool), used where
/// the render thread, streaming threads, and job workers allocate and
/// mutate entries of one pool concurrently.
///
/// Two independent critical sections per pool, never collapsed into
/// one:
///
/// 1. a pool-wide *structure lock* (a `Mutex` over the index allocator
///    and the generation table) guarding `alloc`/`dealloc`, held only
///    long enough to pop/push an index, never while touching row
///    contents;
/// 2. a *per-row spin lock* in the [`BoundedColumnStore`] guarding
///    content access to one row. Different rows lock independently, so
///    allocation churn never serializes against unrelated per-row work.
///
/// Capacity is fixed at construction and exceeding it is a fatal
/// contract violation: the point of this pool is predictable,
/// pre-sized storage on latency-critical paths. Use [`try_alloc`] where
/// a checked "pool full" answer is wanted instead.
///
/// `alloc` records the calling context as the row's initial owner, so
/// the caller can populate every column before any other thread can
/// observe the handle; it then calls [`release`](Self::release) (or
/// lets a [`SlotGuard`] do it) to publish the row.
///
/// [`try_alloc`]: Self::try_alloc

use std::sync::Mutex;

use super::bounded_store::{BoundedColumnStore, OwnerToken};
use super::column_store::{ColumnAt, Columns};
use super::handle::Handle;
use super::index_allocator::IndexAllocator;

/// Free-list and generation state behind the structure lock.
struct PoolState {
    indices: IndexAllocator,
    /// Per-row generation, masked to the handle's meta width.
    generations: Vec<u32>,
}

/// Concurrent generation-checked pool over column tuple `C`, with
/// handles split at `INDEX_BITS`.
pub struct ConcurrentSlotPool<C: Columns, const INDEX_BITS: u32 = 24> {
    state: Mutex<PoolState>,
    store: BoundedColumnStore<C>,
    capacity: u32,
}

impl<C: Columns, const INDEX_BITS: u32> ConcurrentSlotPool<C, INDEX_BITS> {
    /// Create a pool with a fixed slot capacity.
    pub fn new(capacity: u32) -> Self {
        assert!(
            capacity as u64 <= Handle::<INDEX_BITS>::MAX_INDEX as u64 + 1,
            "capacity {} exceeds the {}-bit handle index range",
            capacity,
            INDEX_BITS
        );
        Self {
            state: Mutex::new(PoolState {
                indices: IndexAllocator::new(),
                generations: vec![0; capacity as usize],
            }),
            store: BoundedColumnStore::new(capacity as usize),
            capacity,
        }
    }

    /// Allocate a row, or `None` when the pool is full.
    ///
    /// On success the calling context owns the row: populate its columns
    /// (e.g. through [`lock`](Self::lock)), then [`release`](Self::release)
    /// it to publish.
    pub fn try_alloc(&self) -> Option<Handle<INDEX_BITS>> {
        let handle = {
            let mut state = self.state.lock().unwrap();
            if state.indices.len() == self.capacity {
                return None;
            }
            let (index, _fresh) = state.indices.allocate();
            debug_assert!(index < self.capacity);
            Handle::pack(index, state.generations[index as usize])
        };

        // The row is ours by construction: it was free, and nobody else
        // holds its handle yet.
        let row = handle.index() as usize;
        let acquired = self.store.try_acquire(row);
        debug_assert!(acquired, "freshly allocated row {} was already owned", row);
        unsafe { self.store.reset_row(row) };
        Some(handle)
    }

    /// Allocate a row and return its handle.
    ///
    /// Exceeding the fixed capacity is a fatal contract violation.
    pub fn alloc(&self) -> Handle<INDEX_BITS> {
        match self.try_alloc() {
            Some(handle) => handle,
            None => panic!(
                "concurrent slot pool exceeded its fixed capacity of {} slots",
                self.capacity
            ),
        }
    }

    /// Release a row back to the pool.
    ///
    /// The row must be unowned: deallocating a row that some context
    /// still has acquired would leave that context mutating a slot the
    /// free list is about to hand to someone else, so it fails loudly.
    pub fn dealloc(&self, handle: Handle<INDEX_BITS>) {
        let index = handle.index();
        assert!(
            index < self.capacity,
            "dealloc with foreign handle {} (capacity {})",
            handle,
            self.capacity
        );
        assert!(
            self.store.owner_of(index as usize).is_none(),
            "dealloc while row {} is still acquired",
            index
        );
        let mut state = self.state.lock().unwrap();
        debug_assert_eq!(
            state.generations[index as usize],
            handle.meta(),
            "dealloc with stale handle {}",
            handle
        );
        state.generations[index as usize] =
            (state.generations[index as usize] + 1) & Handle::<INDEX_BITS>::META_MASK;
        state.indices.deallocate(index);
    }

    /// Whether `handle` currently names a live row of this pool.
    ///
    /// Subject to the same generation-wrap caveat as the single-threaded
    /// pool, and immediately stale under concurrent dealloc. Diagnostic.
    pub fn is_live(&self, handle: Handle<INDEX_BITS>) -> bool {
        let index = handle.index();
        if index >= self.capacity {
            return false;
        }
        let state = self.state.lock().unwrap();
        state.generations[index as usize] == handle.meta()
            && !state.indices.free_indices().contains(&index)
    }

    // ===== PER-ROW LOCKING =====

    /// Non-blocking acquire of the row `handle` names.
    pub fn try_acquire(&self, handle: Handle<INDEX_BITS>) -> bool {
        debug_assert!(self.is_live(handle), "try_acquire with stale handle {}", handle);
        self.store.try_acquire(handle.index() as usize)
    }

    /// Acquire the row `handle` names, busy-waiting while another
    /// context owns it. Returns whether this call performed the
    /// acquisition (`false` = the caller already owned the row).
    pub fn acquire(&self, handle: Handle<INDEX_BITS>) -> bool {
        debug_assert!(self.is_live(handle), "acquire with stale handle {}", handle);
        self.store.acquire(handle.index() as usize)
    }

    /// Release the row `handle` names. Caller must own it.
    pub fn release(&self, handle: Handle<INDEX_BITS>) {
        self.store.release(handle.index() as usize);
    }

    /// The context currently owning the row, if any (diagnostic).
    pub fn owner_of(&self, handle: Handle<INDEX_BITS>) -> Option<OwnerToken> {
        self.store.owner_of(handle.index() as usize)
    }

    /// Scoped exclusive access to the row `handle` names.
    ///
    /// Construction acquires the row (a no-op when the calling context
    /// already owns it); dropping the guard releases the row iff this
    /// guard's construction performed the acquisition. Nesting guards on
    /// the same row from the same context is allowed, but the outer
    /// scope must outlive the inner ones, the usual discipline for
    /// reentrant scoped locks.
    pub fn lock(&self, handle: Handle<INDEX_BITS>) -> SlotGuard<'_, C> {
        debug_assert!(self.is_live(handle), "lock with stale handle {}", handle);
        let row = handle.index() as usize;
        let acquired = self.store.acquire(row);
        SlotGuard {
            store: &self.store,
            row,
            acquired,
        }
    }

    // ===== UNLOCKED CONTENT ACCESS =====

    /// Read column `K` of the row `handle` names, without locking.
    ///
    /// # Safety
    ///
    /// The calling context must hold the row's lock, or the column must
    /// be immutable since the row was published (written only before the
    /// allocating context released it).
    pub unsafe fn get<const K: usize>(&self, handle: Handle<INDEX_BITS>) -> &<C as ColumnAt<K>>::Element
    where
        C: ColumnAt<K>,
    {
        debug_assert!(self.is_live(handle), "get with stale handle {}", handle);
        self.store.get::<K>(handle.index() as usize)
    }

    /// Overwrite column `K` of the row `handle` names, without locking.
    ///
    /// # Safety
    ///
    /// The calling context must hold the row's lock.
    pub unsafe fn set<const K: usize>(&self, handle: Handle<INDEX_BITS>, value: <C as ColumnAt<K>>::Element)
    where
        C: ColumnAt<K>,
    {
        debug_assert!(self.is_live(handle), "set with stale handle {}", handle);
        self.store.set::<K>(handle.index() as usize, value);
    }

    // ===== BOOKKEEPING =====

    /// Number of live rows
    pub fn len(&self) -> u32 {
        self.state.lock().unwrap().indices.len()
    }

    /// Whether no rows are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed slot capacity
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Snapshot of the currently free indices.
    ///
    /// Diagnostic / defragmentation use; stale as soon as it is taken if
    /// other threads keep allocating.
    pub fn free_indices(&self) -> Vec<u32> {
        self.state.lock().unwrap().indices.free_indices().to_vec()
    }
}

// ===== SCOPED GUARD =====

/// Scoped exclusive access to one pool row.
///
/// Releases the row on drop iff its construction performed the
/// acquisition, so a guard taken on a row the context already owned
/// leaves the outer ownership untouched on every exit path.
pub struct SlotGuard<'a, C: Columns> {
    store: &'a BoundedColumnStore<C>,
    row: usize,
    acquired: bool,
}

impl<'a, C: Columns> SlotGuard<'a, C> {
    /// Whether constructing this guard performed the acquisition
    pub fn acquired(&self) -> bool {
        self.acquired
    }

    /// Read column `K` of the guarded row.
    pub fn get<const K: usize>(&self) -> &<C as ColumnAt<K>>::Element
    where
        C: ColumnAt<K>,
    {
        // Exclusive by the guard's existence: the row stays owned by
        // this context until the outermost guard/acquire releases it.
        unsafe { self.store.get::<K>(self.row) }
    }

    /// Mutable access to column `K` of the guarded row.
    pub fn get_mut<const K: usize>(&mut self) -> &mut <C as ColumnAt<K>>::Element
    where
        C: ColumnAt<K>,
    {
        unsafe { self.store.get_mut::<K>(self.row) }
    }

    /// Overwrite column `K` of the guarded row.
    pub fn set<const K: usize>(&mut self, value: <C as ColumnAt<K>>::Element)
    where
        C: ColumnAt<K>,
    {
        unsafe { self.store.set::<K>(self.row, value) };
    }
}

impl<'a, C: Columns> Drop for SlotGuard<'a, C> {
    fn drop(&mut self) {
        if self.acquired {
            self.store.release(self.row);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "concurrent_pool_tests.rs"]
mod tests;
