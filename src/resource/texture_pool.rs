/// Texture bookkeeping pool, shared between the render thread and the
/// streaming threads.
///
/// Backed by a [`ConcurrentSlotPool`] with a 16/16 handle split: the
/// texture pool sees the highest alloc/dealloc churn in the engine
/// (streamed mips come and go), so it gets the widest generation field.
/// Capacity is fixed at construction; texture residency is a budgeted,
/// pre-sized resource.
///
/// Extent, format, mip count and usage are written once by the creating
/// context before the row is published and never change afterwards, so
/// they are readable without taking the row lock. Residency is the
/// mutable column: streaming threads own a row while uploading
/// (`begin_streaming`/`finish_streaming`), and the render thread polls
/// it with [`try_residency`](TexturePool::try_residency), which never
/// blocks behind an in-flight upload.

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::utils::{ConcurrentSlotPool, Handle, OwnerToken};
use crate::{engine_bail, engine_debug, engine_error};

// ===== FORMATS AND FLAGS =====

/// Texel format of a pooled texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFormat {
    #[default]
    Rgba8Unorm,
    Bgra8Unorm,
    Rgba16Float,
    Depth32Float,
}

bitflags! {
    /// How a texture may be bound by the backend
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextureUsage: u32 {
        const SAMPLED       = 1 << 0;
        const STORAGE       = 1 << 1;
        const RENDER_TARGET = 1 << 2;
        const TRANSFER_DST  = 1 << 3;
    }
}

/// Streaming state of a texture's pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Residency {
    /// Created, no pixel data uploaded yet
    #[default]
    NonResident,
    /// A streaming context currently owns the row and is uploading
    Streaming,
    /// Pixel data uploaded, safe to sample
    Resident,
}

// ===== DESCRIPTOR =====

/// Descriptor for creating a texture
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

// ===== POOL =====

/// Handle to a pooled texture: 16-bit index, 16-bit generation
pub type TextureHandle = Handle<16>;

/// Column layout for the texture pool
type TextureColumns = ((u32, u32), TextureFormat, TextureUsage, u32, Residency);

const COL_EXTENT: usize = 0;
const COL_FORMAT: usize = 1;
const COL_USAGE: usize = 2;
const COL_MIPS: usize = 3;
const COL_RESIDENCY: usize = 4;

/// Fixed-capacity pool of texture records addressed by [`TextureHandle`].
///
/// Shared across threads behind an `Arc`.
pub struct TexturePool {
    pool: ConcurrentSlotPool<TextureColumns, 16>,
}

impl TexturePool {
    /// Create a pool with a fixed texture capacity
    pub fn new(capacity: u32) -> Self {
        Self {
            pool: ConcurrentSlotPool::new(capacity),
        }
    }

    /// Create a texture and return its handle.
    ///
    /// The new texture starts [`Residency::NonResident`]; stream pixel
    /// data in with [`begin_streaming`](Self::begin_streaming).
    ///
    /// # Errors
    ///
    /// Returns an error on a degenerate descriptor or when the pool is
    /// full.
    pub fn create_texture(&self, desc: TextureDesc) -> Result<TextureHandle> {
        if desc.width == 0 || desc.height == 0 {
            engine_bail!(
                "quasar3d::TexturePool",
                "Texture extent {}x{} is degenerate",
                desc.width,
                desc.height
            );
        }
        if desc.mip_levels == 0 {
            engine_bail!("quasar3d::TexturePool", "Texture must have at least one mip level");
        }

        let Some(handle) = self.pool.try_alloc() else {
            engine_error!(
                "quasar3d::TexturePool",
                "Texture pool is full ({} slots)",
                self.pool.capacity()
            );
            return Err(Error::PoolExhausted(format!(
                "texture pool is full ({} slots)",
                self.pool.capacity()
            )));
        };

        // We own the freshly allocated row; fill the immutable columns,
        // then publish by releasing.
        {
            let mut slot = self.pool.lock(handle);
            slot.set::<{ COL_EXTENT }>((desc.width, desc.height));
            slot.set::<{ COL_FORMAT }>(desc.format);
            slot.set::<{ COL_USAGE }>(desc.usage);
            slot.set::<{ COL_MIPS }>(desc.mip_levels);
            slot.set::<{ COL_RESIDENCY }>(Residency::NonResident);
        }
        self.pool.release(handle);

        engine_debug!(
            "quasar3d::TexturePool",
            "Created texture {} ({}x{}, {} mips, {:?})",
            handle,
            desc.width,
            desc.height,
            desc.mip_levels,
            desc.format
        );
        Ok(handle)
    }

    /// Destroy a texture, recycling its slot.
    ///
    /// No context may have the row acquired (an in-flight upload must
    /// finish first); violating that is lock misuse and panics.
    pub fn destroy_texture(&self, handle: TextureHandle) -> Result<()> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::TexturePool", "destroy_texture with stale handle {}", handle);
        }
        self.pool.dealloc(handle);
        Ok(())
    }

    // ===== STREAMING =====

    /// Take ownership of a texture's row for a pixel upload.
    ///
    /// Blocks while another streaming context owns the row. Pair with
    /// [`finish_streaming`](Self::finish_streaming) on the same thread.
    pub fn begin_streaming(&self, handle: TextureHandle) -> Result<()> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::TexturePool", "begin_streaming with stale handle {}", handle);
        }
        if !self.pool.acquire(handle) {
            engine_bail!(
                "quasar3d::TexturePool",
                "begin_streaming: texture {} is already being streamed by this context",
                handle
            );
        }
        unsafe { self.pool.set::<{ COL_RESIDENCY }>(handle, Residency::Streaming) };
        Ok(())
    }

    /// Mark the upload complete and publish the texture as resident.
    pub fn finish_streaming(&self, handle: TextureHandle) -> Result<()> {
        if self.pool.owner_of(handle) != Some(OwnerToken::current()) {
            engine_bail!(
                "quasar3d::TexturePool",
                "finish_streaming without begin_streaming on texture {}",
                handle
            );
        }
        unsafe { self.pool.set::<{ COL_RESIDENCY }>(handle, Residency::Resident) };
        self.pool.release(handle);
        Ok(())
    }

    /// The texture's residency, or `None` when its row is currently
    /// owned by a streaming context.
    ///
    /// Non-blocking: the render thread uses this to skip mid-upload
    /// textures instead of stalling on them.
    pub fn try_residency(&self, handle: TextureHandle) -> Result<Option<Residency>> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::TexturePool", "try_residency with stale handle {}", handle);
        }
        if !self.pool.try_acquire(handle) {
            return Ok(None);
        }
        let residency = unsafe { *self.pool.get::<{ COL_RESIDENCY }>(handle) };
        self.pool.release(handle);
        Ok(Some(residency))
    }

    // ===== ACCESSORS (immutable after publish) =====

    /// Width and height in texels
    pub fn texture_extent(&self, handle: TextureHandle) -> Result<(u32, u32)> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::TexturePool", "texture_extent with stale handle {}", handle);
        }
        // Written before the creating context released the row, constant
        // afterwards.
        Ok(unsafe { *self.pool.get::<{ COL_EXTENT }>(handle) })
    }

    /// Texel format
    pub fn texture_format(&self, handle: TextureHandle) -> Result<TextureFormat> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::TexturePool", "texture_format with stale handle {}", handle);
        }
        Ok(unsafe { *self.pool.get::<{ COL_FORMAT }>(handle) })
    }

    /// Usage flags
    pub fn texture_usage(&self, handle: TextureHandle) -> Result<TextureUsage> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::TexturePool", "texture_usage with stale handle {}", handle);
        }
        Ok(unsafe { *self.pool.get::<{ COL_USAGE }>(handle) })
    }

    /// Number of mip levels
    pub fn texture_mip_levels(&self, handle: TextureHandle) -> Result<u32> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::TexturePool", "texture_mip_levels with stale handle {}", handle);
        }
        Ok(unsafe { *self.pool.get::<{ COL_MIPS }>(handle) })
    }

    /// Number of live textures
    pub fn texture_count(&self) -> u32 {
        self.pool.len()
    }

    /// Fixed texture capacity
    pub fn capacity(&self) -> u32 {
        self.pool.capacity()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "texture_pool_tests.rs"]
mod tests;
