/// Single-threaded handle-based object pool.
///
/// Composes an [`IndexAllocator`] with a [`ColumnStore`] and a per-row
/// generation counter. `alloc` hands out a [`Handle`] packing the row
/// index with the row's current generation; `dealloc` bumps the
/// generation so a handle captured before the dealloc no longer matches
/// the row after reuse.
///
/// Confined to one logical owner; subsystems that share a pool across
/// threads use [`ConcurrentSlotPool`](super::ConcurrentSlotPool) instead.
///
/// Row contents are NOT cleared on `dealloc`; stale data lingers in the
/// columns while the slot sits on the free list. The next `alloc` that
/// recycles the slot resets every column to its default, so a reused
/// row never exposes the previous object's data.
///
/// Generation checks on `get`/`set` are debug-only: release builds
/// trust callers to discard handles after `dealloc` (see DESIGN.md for
/// the rationale).

use super::column_store::{ColumnAt, ColumnStore, Columns};
use super::handle::Handle;
use super::index_allocator::IndexAllocator;

/// Generation-checked pool over column tuple `C`, with handles split at
/// `INDEX_BITS` (generation in the remaining high bits).
pub struct SlotPool<C: Columns, const INDEX_BITS: u32 = 24> {
    indices: IndexAllocator,
    store: ColumnStore<C>,
    /// Per-row generation, already masked to the handle's meta width.
    generations: Vec<u32>,
    max_slots: Option<u32>,
}

impl<C: Columns, const INDEX_BITS: u32> SlotPool<C, INDEX_BITS> {
    /// Create an unbounded pool (limited only by the handle index range)
    pub fn new() -> Self {
        Self {
            indices: IndexAllocator::new(),
            store: ColumnStore::new(),
            generations: Vec::new(),
            max_slots: None,
        }
    }

    /// Create a pool that asserts a maximum slot count on `alloc`.
    pub fn with_max_slots(max_slots: u32) -> Self {
        assert!(
            max_slots as u64 <= Handle::<INDEX_BITS>::MAX_INDEX as u64 + 1,
            "max_slots {} exceeds the {}-bit handle index range",
            max_slots,
            INDEX_BITS
        );
        Self {
            indices: IndexAllocator::new(),
            store: ColumnStore::new(),
            generations: Vec::new(),
            max_slots: Some(max_slots),
        }
    }

    /// Allocate a row and return its handle.
    ///
    /// Recycles a freed index when one exists, otherwise appends a
    /// default-initialized row to every column. Exceeding the configured
    /// maximum (or the handle index range) is a fatal contract violation.
    pub fn alloc(&mut self) -> Handle<INDEX_BITS> {
        let (index, fresh) = self.indices.allocate();
        if let Some(max) = self.max_slots {
            assert!(index < max, "slot pool exceeded its {} slot maximum", max);
        }
        assert!(
            index <= Handle::<INDEX_BITS>::MAX_INDEX,
            "slot pool exceeded the {}-bit handle index range",
            INDEX_BITS
        );
        if fresh {
            let row = self.store.append_row();
            debug_assert_eq!(row as u32, index);
            self.generations.push(0);
        } else {
            self.store.reset_row(index as usize);
        }
        Handle::pack(index, self.generations[index as usize])
    }

    /// Release a row back to the pool.
    ///
    /// Bumps the row's generation (wrapping within the handle's meta
    /// width), so the handle and any copies of it go stale. The row's
    /// contents are left as-is until the next `alloc` reuses the slot.
    pub fn dealloc(&mut self, handle: Handle<INDEX_BITS>) {
        debug_assert!(
            self.is_live(handle),
            "dealloc with stale or foreign handle {}",
            handle
        );
        let index = handle.index();
        self.generations[index as usize] =
            (self.generations[index as usize] + 1) & Handle::<INDEX_BITS>::META_MASK;
        self.indices.deallocate(index);
    }

    /// Whether `handle` currently names a live row of this pool.
    ///
    /// A stale handle whose generation has wrapped all the way around
    /// (2^META_BITS dealloc/alloc cycles on one index) becomes
    /// indistinguishable from a live one; pick the bit split accordingly.
    pub fn is_live(&self, handle: Handle<INDEX_BITS>) -> bool {
        let index = handle.index() as usize;
        index < self.generations.len()
            && self.generations[index] == handle.meta()
            && !self.indices.free_indices().contains(&handle.index())
    }

    /// Read column `K` of the row `handle` names.
    pub fn get<const K: usize>(&self, handle: Handle<INDEX_BITS>) -> &<C as ColumnAt<K>>::Element
    where
        C: ColumnAt<K>,
    {
        debug_assert!(
            self.is_live(handle),
            "get with stale or foreign handle {}",
            handle
        );
        self.store.get::<K>(handle.index() as usize)
    }

    /// Mutable access to column `K` of the row `handle` names.
    pub fn get_mut<const K: usize>(
        &mut self,
        handle: Handle<INDEX_BITS>,
    ) -> &mut <C as ColumnAt<K>>::Element
    where
        C: ColumnAt<K>,
    {
        debug_assert!(
            self.is_live(handle),
            "get_mut with stale or foreign handle {}",
            handle
        );
        self.store.get_mut::<K>(handle.index() as usize)
    }

    /// Overwrite column `K` of the row `handle` names.
    pub fn set<const K: usize>(&mut self, handle: Handle<INDEX_BITS>, value: <C as ColumnAt<K>>::Element)
    where
        C: ColumnAt<K>,
    {
        *self.get_mut::<K>(handle) = value;
    }

    /// Number of live rows
    pub fn len(&self) -> u32 {
        self.indices.len()
    }

    /// Whether no rows are live
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The currently free row indices (diagnostic / defragmentation use)
    pub fn free_indices(&self) -> &[u32] {
        self.indices.free_indices()
    }
}

impl<C: Columns, const INDEX_BITS: u32> Default for SlotPool<C, INDEX_BITS> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "slot_pool_tests.rs"]
mod tests;
