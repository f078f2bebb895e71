//! Integration tests for the resource pools working together the way a
//! frame does: cameras feeding uniform buffers, textures streaming in
//! from worker threads, command lists recorded and retired per frame.

use std::sync::Arc;
use std::thread;

use quasar_3d_engine::glam::{Mat4, Vec3, Vec4};
use quasar_3d_engine::quasar3d::resource::{
    BufferDesc, BufferUsage, ListState, QueueKind, Residency, ResourceManager, TextureDesc,
    TextureFormat, TextureUsage,
};

fn texture_desc(size: u32) -> TextureDesc {
    TextureDesc {
        width: size,
        height: size,
        mip_levels: 1,
        format: TextureFormat::Rgba8Unorm,
        usage: TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST,
    }
}

// ============================================================================
// CAMERA → UNIFORM BUFFER
// ============================================================================

#[test]
fn test_camera_matrices_upload_into_uniform_buffer() {
    let mut rm = ResourceManager::with_texture_capacity(8);

    let camera = rm.cameras_mut().create_camera();
    rm.cameras_mut()
        .set_look_at(camera, Vec3::new(0.0, 3.0, 8.0), Vec3::ZERO, Vec3::Y)
        .unwrap();
    rm.cameras_mut()
        .set_perspective(camera, std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 500.0)
        .unwrap();
    rm.cameras_mut()
        .set_viewport(camera, Vec4::new(0.0, 0.0, 1920.0, 1080.0))
        .unwrap();

    let view_projection = rm.cameras().view_projection(camera).unwrap();

    let frame_uniforms = rm
        .buffers_mut()
        .create_buffer(BufferDesc {
            size: 64,
            usage: BufferUsage::UNIFORM | BufferUsage::TRANSFER_DST,
        })
        .unwrap();
    rm.buffers_mut()
        .write_buffer(frame_uniforms, 0, &[view_projection])
        .unwrap();

    let bytes = rm.buffers().read_buffer(frame_uniforms).unwrap();
    let uploaded: Mat4 = read_mat4(bytes);
    assert_eq!(uploaded, view_projection);
}

fn read_mat4(bytes: &[u8]) -> Mat4 {
    let mut floats = [0f32; 16];
    for (i, chunk) in bytes.chunks_exact(4).take(16).enumerate() {
        floats[i] = f32::from_ne_bytes(chunk.try_into().unwrap());
    }
    Mat4::from_cols_array(&floats)
}

// ============================================================================
// TEXTURE STREAMING ALONGSIDE RENDERING
// ============================================================================

#[test]
fn test_streaming_threads_and_render_polling() {
    let mut rm = ResourceManager::with_texture_capacity(64);
    let handles: Vec<_> = (0..16)
        .map(|i| {
            rm.create_named_texture(&format!("textures/tile_{:02}.ktx", i), texture_desc(256))
                .unwrap()
        })
        .collect();

    let textures = Arc::clone(rm.textures());

    // Two streaming workers split the uploads
    let mut streamers = Vec::new();
    for worker in 0..2 {
        let textures = Arc::clone(&textures);
        let batch: Vec<_> = handles
            .iter()
            .copied()
            .skip(worker)
            .step_by(2)
            .collect();
        streamers.push(thread::spawn(move || {
            for handle in batch {
                textures.begin_streaming(handle).unwrap();
                textures.finish_streaming(handle).unwrap();
            }
        }));
    }

    // Render thread: poll until every texture is resident, never
    // blocking behind an in-flight upload.
    let mut resident = std::collections::HashSet::new();
    while resident.len() < handles.len() {
        for &handle in &handles {
            if let Some(Residency::Resident) = textures.try_residency(handle).unwrap() {
                resident.insert(handle);
            }
        }
        thread::yield_now();
    }

    for streamer in streamers {
        streamer.join().unwrap();
    }
    assert_eq!(rm.textures().texture_count(), 16);
}

#[test]
fn test_texture_lookup_survives_pool_churn() {
    let mut rm = ResourceManager::with_texture_capacity(4);

    let a = rm.create_named_texture("a", texture_desc(64)).unwrap();
    rm.destroy_named_texture("a").unwrap();
    let b = rm.create_named_texture("b", texture_desc(32)).unwrap();

    // b reuses a's slot; the stale handle must not resolve through any API
    assert_eq!(b.index(), a.index());
    assert!(rm.textures().texture_extent(a).is_err());
    assert_eq!(rm.textures().texture_extent(b).unwrap(), (32, 32));
    assert_eq!(rm.texture_by_name("a"), None);
    assert_eq!(rm.texture_by_name("b"), Some(b));
}

// ============================================================================
// COMMAND LISTS PER FRAME
// ============================================================================

#[test]
fn test_frame_recording_cycle() {
    let mut rm = ResourceManager::new();

    for _frame in 0..3 {
        let lists = rm.command_lists_mut();
        let shadow = lists.begin_list(QueueKind::Graphics, "shadow");
        let opaque = lists.begin_list(QueueKind::Graphics, "opaque");
        let upload = lists.begin_list(QueueKind::Transfer, "uploads");

        for _ in 0..8 {
            lists.record_command(opaque).unwrap();
        }
        lists.record_command(shadow).unwrap();
        lists.record_command(upload).unwrap();

        lists.submit_list(shadow).unwrap();
        lists.submit_list(opaque).unwrap();
        lists.submit_list(upload).unwrap();

        assert_eq!(lists.list_state(opaque).unwrap(), ListState::Submitted);
        assert_eq!(lists.live_lists(QueueKind::Graphics), 2);

        lists.reset_frame();
        assert_eq!(lists.live_lists(QueueKind::Graphics), 0);
        assert!(lists.list_state(opaque).is_err(), "handles die with the frame");
    }
}

// ============================================================================
// CROSS-POOL HANDLE HYGIENE
// ============================================================================

#[test]
fn test_buffer_and_camera_pools_do_not_share_handles() {
    let mut rm = ResourceManager::new();
    let buffer = rm
        .buffers_mut()
        .create_buffer(BufferDesc {
            size: 16,
            usage: BufferUsage::VERTEX,
        })
        .unwrap();
    let camera = rm.cameras_mut().create_camera();

    // Same raw value does not make them the same object; each pool only
    // answers for its own handles.
    assert_eq!(buffer.index(), camera.index());
    assert_eq!(rm.buffers().buffer_size(buffer).unwrap(), 16);
    assert_eq!(rm.cameras().view(camera).unwrap(), Mat4::IDENTITY);
}
