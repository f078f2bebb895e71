//! Pool infrastructure shared by every resource subsystem.
//!
//! Everything GPU-side or engine-side that the engine exposes through an
//! opaque handle (buffers, textures, command lists, cameras) sits on
//! the allocators in this module:
//!
//! - [`Handle`]: packed 32-bit index + generation/tag value
//! - [`IndexAllocator`]: free-list recycling of row indices
//! - [`ColumnStore`]: growable structure-of-arrays storage
//! - [`SlotPool`]: single-threaded handle pool (index allocator +
//!   columns + generations)
//! - [`BoundedColumnStore`]: fixed-capacity SoA storage with per-row
//!   spin locks
//! - [`ConcurrentSlotPool`]: thread-safe handle pool over the bounded
//!   store, with [`SlotGuard`] for scoped row access
//!
//! Subsystems declare a column tuple, pick a handle bit split, and wrap
//! the generic surface with domain-named functions; the rest of the
//! engine only ever sees the handles.

pub mod bounded_store;
pub mod column_store;
pub mod concurrent_pool;
pub mod handle;
pub mod index_allocator;
pub mod slot_pool;

pub use bounded_store::{BoundedColumnStore, OwnerToken};
pub use column_store::{ColumnAt, ColumnStore, Columns};
pub use concurrent_pool::{ConcurrentSlotPool, SlotGuard};
pub use handle::Handle;
pub use index_allocator::IndexAllocator;
pub use slot_pool::SlotPool;
