//! Resource management module
//!
//! One handle-addressed pool per resource kind, plus the central
//! ResourceManager that owns them. Each pool wraps the generic slot
//! allocators from `utils` with its own column set and domain API.

mod resource_manager;
pub mod buffer_pool;
pub mod camera_pool;
pub mod command_list_pool;
pub mod texture_pool;

pub use resource_manager::{ResourceManager, DEFAULT_TEXTURE_CAPACITY};
pub use buffer_pool::{BufferDesc, BufferHandle, BufferPool, BufferUsage};
pub use camera_pool::{CameraHandle, CameraPool};
pub use command_list_pool::{
    CommandListHandle, CommandListPool, ListState, QueueKind,
};
pub use texture_pool::{
    Residency, TextureDesc, TextureFormat, TextureHandle, TexturePool, TextureUsage,
};
