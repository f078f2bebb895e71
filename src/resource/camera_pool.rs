/// Camera pool.
///
/// Cameras are engine-side resources like everything else: a
/// [`SlotPool`] row holding the view and projection matrices plus the
/// viewport rectangle, addressed by a generational [`CameraHandle`].
/// A 16/16 split: a scene rarely needs more than a few dozen cameras,
/// and the wide generation field keeps editor-held handles honest
/// across many create/destroy cycles.

use glam::{Mat4, Vec3, Vec4};

use crate::engine_bail;
use crate::error::Result;
use crate::utils::{Handle, SlotPool};

/// Handle to a pooled camera: 16-bit index, 16-bit generation
pub type CameraHandle = Handle<16>;

/// Column layout: (view, projection, viewport)
type CameraColumns = (Mat4, Mat4, Vec4);

const COL_VIEW: usize = 0;
const COL_PROJECTION: usize = 1;
const COL_VIEWPORT: usize = 2;

/// Pool of cameras addressed by [`CameraHandle`]
pub struct CameraPool {
    pool: SlotPool<CameraColumns, 16>,
}

impl CameraPool {
    /// Create an empty camera pool
    pub fn new() -> Self {
        Self {
            pool: SlotPool::new(),
        }
    }

    /// Create a camera with identity view/projection and a zero viewport
    pub fn create_camera(&mut self) -> CameraHandle {
        self.pool.alloc()
    }

    /// Destroy a camera, recycling its slot
    pub fn destroy_camera(&mut self, handle: CameraHandle) -> Result<()> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::CameraPool", "destroy_camera with stale handle {}", handle);
        }
        self.pool.dealloc(handle);
        Ok(())
    }

    // ===== SETTERS =====

    /// Point the camera at `center` from `eye` (right-handed)
    pub fn set_look_at(
        &mut self,
        handle: CameraHandle,
        eye: Vec3,
        center: Vec3,
        up: Vec3,
    ) -> Result<()> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::CameraPool", "set_look_at with stale handle {}", handle);
        }
        self.pool.set::<{ COL_VIEW }>(handle, Mat4::look_at_rh(eye, center, up));
        Ok(())
    }

    /// Set a right-handed perspective projection
    pub fn set_perspective(
        &mut self,
        handle: CameraHandle,
        fov_y_radians: f32,
        aspect: f32,
        z_near: f32,
        z_far: f32,
    ) -> Result<()> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::CameraPool", "set_perspective with stale handle {}", handle);
        }
        self.pool.set::<{ COL_PROJECTION }>(
            handle,
            Mat4::perspective_rh(fov_y_radians, aspect, z_near, z_far),
        );
        Ok(())
    }

    /// Set the viewport rectangle as (x, y, width, height)
    pub fn set_viewport(&mut self, handle: CameraHandle, viewport: Vec4) -> Result<()> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::CameraPool", "set_viewport with stale handle {}", handle);
        }
        self.pool.set::<{ COL_VIEWPORT }>(handle, viewport);
        Ok(())
    }

    // ===== ACCESSORS =====

    /// The camera's view matrix
    pub fn view(&self, handle: CameraHandle) -> Result<Mat4> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::CameraPool", "view with stale handle {}", handle);
        }
        Ok(*self.pool.get::<{ COL_VIEW }>(handle))
    }

    /// The camera's projection matrix
    pub fn projection(&self, handle: CameraHandle) -> Result<Mat4> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::CameraPool", "projection with stale handle {}", handle);
        }
        Ok(*self.pool.get::<{ COL_PROJECTION }>(handle))
    }

    /// Combined projection * view, ready for a uniform upload
    pub fn view_projection(&self, handle: CameraHandle) -> Result<Mat4> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::CameraPool", "view_projection with stale handle {}", handle);
        }
        Ok(*self.pool.get::<{ COL_PROJECTION }>(handle) * *self.pool.get::<{ COL_VIEW }>(handle))
    }

    /// The camera's viewport rectangle
    pub fn viewport(&self, handle: CameraHandle) -> Result<Vec4> {
        if !self.pool.is_live(handle) {
            engine_bail!("quasar3d::CameraPool", "viewport with stale handle {}", handle);
        }
        Ok(*self.pool.get::<{ COL_VIEWPORT }>(handle))
    }

    /// Number of live cameras
    pub fn camera_count(&self) -> u32 {
        self.pool.len()
    }
}

impl Default for CameraPool {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "camera_pool_tests.rs"]
mod tests;
