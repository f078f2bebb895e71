/// Central resource manager for the engine.
///
/// Owns exactly one pool per resource kind (buffers, textures,
/// cameras, command lists) and the name lookup table for textures
/// streamed from disk. Created once at startup through
/// `Engine::create_resource_manager()` and threaded to call sites from
/// there; the pools themselves stay private so every access goes
/// through a handle.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::engine_bail;
use crate::error::Result;

use super::buffer_pool::BufferPool;
use super::camera_pool::CameraPool;
use super::command_list_pool::CommandListPool;
use super::texture_pool::{TextureDesc, TextureHandle, TexturePool};

/// Default texture pool capacity when none is configured
pub const DEFAULT_TEXTURE_CAPACITY: u32 = 4096;

/// Resource manager singleton (managed by Engine)
pub struct ResourceManager {
    buffers: BufferPool,
    /// Behind an Arc so streaming threads can hold the pool without
    /// holding the manager.
    textures: Arc<TexturePool>,
    cameras: CameraPool,
    command_lists: CommandListPool,
    texture_names: FxHashMap<String, TextureHandle>,
}

impl ResourceManager {
    /// Create a manager with the default texture capacity
    pub fn new() -> Self {
        Self::with_texture_capacity(DEFAULT_TEXTURE_CAPACITY)
    }

    /// Create a manager with a specific texture pool capacity
    pub fn with_texture_capacity(texture_capacity: u32) -> Self {
        Self {
            buffers: BufferPool::new(),
            textures: Arc::new(TexturePool::new(texture_capacity)),
            cameras: CameraPool::new(),
            command_lists: CommandListPool::new(),
            texture_names: FxHashMap::default(),
        }
    }

    // ===== POOL ACCESS =====

    /// The buffer pool
    pub fn buffers(&self) -> &BufferPool {
        &self.buffers
    }

    /// The buffer pool, mutable
    pub fn buffers_mut(&mut self) -> &mut BufferPool {
        &mut self.buffers
    }

    /// The shared texture pool
    pub fn textures(&self) -> &Arc<TexturePool> {
        &self.textures
    }

    /// The camera pool
    pub fn cameras(&self) -> &CameraPool {
        &self.cameras
    }

    /// The camera pool, mutable
    pub fn cameras_mut(&mut self) -> &mut CameraPool {
        &mut self.cameras
    }

    /// The command list pool, mutable
    pub fn command_lists_mut(&mut self) -> &mut CommandListPool {
        &mut self.command_lists
    }

    /// The command list pool
    pub fn command_lists(&self) -> &CommandListPool {
        &self.command_lists
    }

    // ===== NAMED TEXTURES =====

    /// Create a texture under a unique name (typically its asset path).
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken, the descriptor is invalid,
    /// or the texture pool is full.
    pub fn create_named_texture(&mut self, name: &str, desc: TextureDesc) -> Result<TextureHandle> {
        if self.texture_names.contains_key(name) {
            engine_bail!("quasar3d::ResourceManager", "Texture '{}' already exists", name);
        }
        let handle = self.textures.create_texture(desc)?;
        self.texture_names.insert(name.to_string(), handle);
        Ok(handle)
    }

    /// Look up a texture handle by name
    pub fn texture_by_name(&self, name: &str) -> Option<TextureHandle> {
        self.texture_names.get(name).copied()
    }

    /// Destroy a named texture and drop its name.
    pub fn destroy_named_texture(&mut self, name: &str) -> Result<()> {
        let Some(handle) = self.texture_names.remove(name) else {
            engine_bail!("quasar3d::ResourceManager", "Texture '{}' not found", name);
        };
        self.textures.destroy_texture(handle)
    }

    /// Names of all registered textures
    pub fn texture_names(&self) -> Vec<&str> {
        self.texture_names.keys().map(|name| name.as_str()).collect()
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
