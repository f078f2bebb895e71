/// Fixed-capacity SoA storage with per-row ownership and spin locking.
///
/// The thread-safe counterpart of [`ColumnStore`](super::ColumnStore):
/// every row of every column is default-constructed up front and the
/// storage is never reallocated, so references handed out to one thread
/// stay valid while other threads allocate. Each row carries a
/// [`SlotLock`] recording which execution context (if any) currently
/// holds exclusive access.
///
/// Locking is a busy-wait spin: expected hold times are single field
/// writes on GPU-resource bookkeeping, microseconds at most. Debug
/// builds panic when an `acquire` exhausts its spin budget, which is the
/// closest thing a spin lock has to a deadlock detector.
///
/// `get`/`set` perform no implicit locking. Callers bracket all
/// cross-thread content access with `acquire`/`release` themselves (or
/// go through the pool's scoped guard); the store does not serialize
/// those accesses for them.

use std::sync::atomic::{AtomicU64, Ordering};

use super::column_store::{ColumnAt, Columns};

// ===== OWNER TOKENS =====

/// Identifies the execution context holding a row lock.
///
/// Tokens are handed out lazily, one per thread, from a process-wide
/// counter. Token 0 is reserved for "unowned".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct OwnerToken(u64);

static NEXT_OWNER_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static OWNER_TOKEN: u64 = NEXT_OWNER_TOKEN.fetch_add(1, Ordering::Relaxed);
}

impl OwnerToken {
    /// The calling thread's token
    pub fn current() -> Self {
        Self(OWNER_TOKEN.with(|token| *token))
    }

    fn raw(self) -> u64 {
        self.0
    }
}

// ===== SLOT LOCK =====

const UNOWNED: u64 = 0;

/// Spin budget before a blocked `acquire` is declared a deadlock.
#[cfg(debug_assertions)]
const ACQUIRE_SPIN_BUDGET: u64 = 1 << 28;

/// Per-row ownership record and mutual-exclusion primitive.
pub(crate) struct SlotLock {
    owner: AtomicU64,
}

impl SlotLock {
    fn new() -> Self {
        Self {
            owner: AtomicU64::new(UNOWNED),
        }
    }

    fn try_acquire(&self, token: OwnerToken) -> bool {
        self.owner
            .compare_exchange(UNOWNED, token.raw(), Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn acquire(&self, token: OwnerToken) -> bool {
        // Reentrant no-op: the caller already owns this row. Only this
        // thread can have stored its own token, so a relaxed load is
        // conclusive.
        if self.owner.load(Ordering::Relaxed) == token.raw() {
            return false;
        }
        #[cfg(debug_assertions)]
        let mut spins: u64 = 0;
        loop {
            if self.owner.load(Ordering::Relaxed) == UNOWNED && self.try_acquire(token) {
                return true;
            }
            std::hint::spin_loop();
            #[cfg(debug_assertions)]
            {
                spins += 1;
                assert!(
                    spins < ACQUIRE_SPIN_BUDGET,
                    "acquire exhausted its spin budget; row locked by context {} and never released",
                    self.owner.load(Ordering::Relaxed)
                );
            }
        }
    }

    fn release(&self, token: OwnerToken) {
        let previous = self.owner.swap(UNOWNED, Ordering::Release);
        assert!(
            previous == token.raw(),
            "release without matching acquire (owner {}, caller {})",
            previous,
            token.raw()
        );
    }

    fn owner(&self) -> Option<OwnerToken> {
        match self.owner.load(Ordering::Acquire) {
            UNOWNED => None,
            raw => Some(OwnerToken(raw)),
        }
    }
}

// ===== BOUNDED COLUMN STORE =====

/// Fixed-capacity SoA container over column tuple `C`, with a
/// [`SlotLock`] per row.
pub struct BoundedColumnStore<C: Columns> {
    cells: C::CellArrays,
    locks: Box<[SlotLock]>,
    capacity: usize,
}

// Row contents are only touched under the per-row lock (or by the
// allocator before the row is published), which is what makes sharing
// the store across threads sound. Requires the column data itself to be
// sendable between threads.
unsafe impl<C: Columns> Sync for BoundedColumnStore<C> where C::CellArrays: Send {}

impl<C: Columns> BoundedColumnStore<C> {
    /// Create a store with `capacity` default-initialized rows.
    ///
    /// The capacity is final: there is no growth path.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "bounded store needs a non-zero capacity");
        Self {
            cells: C::new_cell_arrays(capacity),
            locks: (0..capacity).map(|_| SlotLock::new()).collect(),
            capacity,
        }
    }

    /// Maximum (and constant) row count
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Non-blocking acquire of `row` for the calling context.
    ///
    /// Succeeds and records the caller as owner iff the row was unowned.
    pub fn try_acquire(&self, row: usize) -> bool {
        self.locks[row].try_acquire(OwnerToken::current())
    }

    /// Acquire `row` for the calling context, busy-waiting while
    /// another context owns it.
    ///
    /// Returns `true` when this call performed the acquisition and
    /// `false` when the calling context already owned the row (the call
    /// is then a no-op; a matching `release` is still owed only once).
    pub fn acquire(&self, row: usize) -> bool {
        self.locks[row].acquire(OwnerToken::current())
    }

    /// Release `row`. The calling context must own it; anything else is
    /// lock misuse and fails loudly.
    pub fn release(&self, row: usize) {
        self.locks[row].release(OwnerToken::current());
    }

    /// The context currently owning `row`, if any (diagnostic).
    pub fn owner_of(&self, row: usize) -> Option<OwnerToken> {
        self.locks[row].owner()
    }

    /// Read column `K` of `row`.
    ///
    /// # Safety
    ///
    /// The caller must hold `row`'s lock (or otherwise be the row's sole
    /// accessor) for as long as the reference lives, and `row` must be
    /// in range. No locking or synchronization is performed here.
    pub unsafe fn get<const K: usize>(&self, row: usize) -> &<C as ColumnAt<K>>::Element
    where
        C: ColumnAt<K>,
    {
        debug_assert!(row < self.capacity, "row {} out of range", row);
        &*<C as ColumnAt<K>>::cells(&self.cells)[row].get()
    }

    /// Mutable access to column `K` of `row`.
    ///
    /// # Safety
    ///
    /// Same contract as [`get`](Self::get), and the caller must ensure
    /// no other reference to this row/column exists while the returned
    /// borrow lives.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut<const K: usize>(&self, row: usize) -> &mut <C as ColumnAt<K>>::Element
    where
        C: ColumnAt<K>,
    {
        debug_assert!(row < self.capacity, "row {} out of range", row);
        &mut *<C as ColumnAt<K>>::cells(&self.cells)[row].get()
    }

    /// Overwrite column `K` of `row`.
    ///
    /// # Safety
    ///
    /// Same contract as [`get_mut`](Self::get_mut).
    pub unsafe fn set<const K: usize>(&self, row: usize, value: <C as ColumnAt<K>>::Element)
    where
        C: ColumnAt<K>,
    {
        debug_assert!(row < self.capacity, "row {} out of range", row);
        *<C as ColumnAt<K>>::cells(&self.cells)[row].get() = value;
    }

    /// Reset every column of `row` to its default value.
    ///
    /// # Safety
    ///
    /// Same contract as [`get_mut`](Self::get_mut).
    pub unsafe fn reset_row(&self, row: usize) {
        debug_assert!(row < self.capacity, "row {} out of range", row);
        C::reset_cell_row(&self.cells, row);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "bounded_store_tests.rs"]
mod tests;
