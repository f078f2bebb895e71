/// GPU buffer bookkeeping pool.
///
/// Owns one [`SlotPool`] row per live buffer: byte size, usage flags,
/// and the CPU shadow copy that backends upload from. The rest of the
/// engine refers to buffers only through [`BufferHandle`]s; which
/// column index means what is private to this module.
///
/// Single-threaded: buffer creation and updates happen on the render
/// thread. (Textures, which stream from worker threads, use the
/// concurrent pool instead.)

use bitflags::bitflags;
use bytemuck::Pod;

use crate::error::Result;
use crate::utils::{Handle, SlotPool};
use crate::{engine_bail, engine_debug};

// ===== USAGE FLAGS =====

bitflags! {
    /// How a buffer may be bound by the backend
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BufferUsage: u32 {
        const VERTEX       = 1 << 0;
        const INDEX        = 1 << 1;
        const UNIFORM      = 1 << 2;
        const STORAGE      = 1 << 3;
        const TRANSFER_SRC = 1 << 4;
        const TRANSFER_DST = 1 << 5;
    }
}

// ===== DESCRIPTOR =====

/// Descriptor for creating a buffer
pub struct BufferDesc {
    /// Total size in bytes (non-zero)
    pub size: u64,
    /// At least one usage flag
    pub usage: BufferUsage,
}

// ===== POOL =====

/// Handle to a pooled buffer: 24-bit index, 8-bit generation
pub type BufferHandle = Handle<24>;

/// Column layout for the buffer pool
type BufferColumns = (u64, BufferUsage, Vec<u8>);

const COL_SIZE: usize = 0;
const COL_USAGE: usize = 1;
const COL_DATA: usize = 2;

/// Pool of GPU buffer records addressed by [`BufferHandle`]
pub struct BufferPool {
    pool: SlotPool<BufferColumns, 24>,
}

impl BufferPool {
    /// Create an empty buffer pool
    pub fn new() -> Self {
        Self {
            pool: SlotPool::new(),
        }
    }

    /// Create a buffer and return its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor has a zero size or no usage
    /// flags.
    pub fn create_buffer(&mut self, desc: BufferDesc) -> Result<BufferHandle> {
        if desc.size == 0 {
            engine_bail!("quasar3d::BufferPool", "Buffer must have a non-zero size");
        }
        if desc.usage.is_empty() {
            engine_bail!("quasar3d::BufferPool", "Buffer must have at least one usage flag");
        }

        let handle = self.pool.alloc();
        self.pool.set::<{ COL_SIZE }>(handle, desc.size);
        self.pool.set::<{ COL_USAGE }>(handle, desc.usage);
        self.pool.set::<{ COL_DATA }>(handle, vec![0u8; desc.size as usize]);

        engine_debug!(
            "quasar3d::BufferPool",
            "Created buffer {} ({} bytes, {:?})",
            handle,
            desc.size,
            desc.usage
        );
        Ok(handle)
    }

    /// Destroy a buffer, recycling its slot.
    ///
    /// The handle (and any copies of it) become stale.
    pub fn destroy_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::BufferPool", "destroy_buffer with stale handle {}", handle);
        }
        // Drop the shadow allocation now rather than letting it sit in
        // the freed slot until reuse.
        self.pool.set::<{ COL_DATA }>(handle, Vec::new());
        self.pool.dealloc(handle);
        Ok(())
    }

    // ===== ACCESSORS =====

    /// Byte size of a buffer
    pub fn buffer_size(&self, handle: BufferHandle) -> Result<u64> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::BufferPool", "buffer_size with stale handle {}", handle);
        }
        Ok(*self.pool.get::<{ COL_SIZE }>(handle))
    }

    /// Usage flags of a buffer
    pub fn buffer_usage(&self, handle: BufferHandle) -> Result<BufferUsage> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::BufferPool", "buffer_usage with stale handle {}", handle);
        }
        Ok(*self.pool.get::<{ COL_USAGE }>(handle))
    }

    /// The buffer's CPU shadow contents
    pub fn read_buffer(&self, handle: BufferHandle) -> Result<&[u8]> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::BufferPool", "read_buffer with stale handle {}", handle);
        }
        Ok(self.pool.get::<{ COL_DATA }>(handle))
    }

    /// Number of live buffers
    pub fn buffer_count(&self) -> u32 {
        self.pool.len()
    }

    // ===== UPDATES =====

    /// Write plain-old-data elements into the buffer's shadow copy at a
    /// byte offset.
    ///
    /// # Errors
    ///
    /// Returns an error when the handle is stale or the write would run
    /// past the end of the buffer.
    pub fn write_buffer<T: Pod>(
        &mut self,
        handle: BufferHandle,
        offset: u64,
        data: &[T],
    ) -> Result<()> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::BufferPool", "write_buffer with stale handle {}", handle);
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let size = *self.pool.get::<{ COL_SIZE }>(handle);
        let end = offset + bytes.len() as u64;
        if end > size {
            engine_bail!(
                "quasar3d::BufferPool",
                "Write at offset {} with size {} exceeds buffer size {}",
                offset,
                bytes.len(),
                size
            );
        }
        let shadow = self.pool.get_mut::<{ COL_DATA }>(handle);
        shadow[offset as usize..end as usize].copy_from_slice(bytes);
        Ok(())
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "buffer_pool_tests.rs"]
mod tests;
