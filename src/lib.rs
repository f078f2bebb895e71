/*!
# Quasar 3D Engine

Core resource layer of the Quasar 3D rendering engine.

Every GPU-side and engine-side resource (buffers, textures, command
lists, cameras) is exposed to the rest of the engine as a small opaque
handle rather than a pointer. Underneath each handle sits one recurring
primitive: a generation-checked slot allocator over structure-of-arrays
storage, in a single-threaded flavor for per-subsystem data and a
bounded, thread-safe flavor for data shared between the render thread,
streaming threads, and job workers.

## Architecture

- **utils**: the pool infrastructure (`Handle`, `IndexAllocator`,
  `ColumnStore`, `SlotPool`, `BoundedColumnStore`, `ConcurrentSlotPool`)
- **resource**: one pool per resource kind (`BufferPool`, `TexturePool`,
  `CameraPool`, `CommandListPool`) behind the `ResourceManager`
- **Engine**: singleton manager wiring the resource manager and the
  logger together at startup

Backend implementations (Vulkan, Direct3D 12, etc.) consume the handles
and pool records; they live in separate backend crates.
*/

// Internal modules
mod engine;
mod error;
pub mod log;
pub mod resource;
pub mod utils;

// Main quasar3d namespace module
pub mod quasar3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Pool infrastructure sub-module
    pub mod pool {
        pub use crate::utils::*;
    }
}

// Re-export math library at crate root
pub use glam;
