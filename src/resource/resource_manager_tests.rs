use super::*;
use crate::resource::texture_pool::{TextureFormat, TextureUsage};

fn desc() -> TextureDesc {
    TextureDesc {
        width: 128,
        height: 128,
        mip_levels: 1,
        format: TextureFormat::Rgba8Unorm,
        usage: TextureUsage::SAMPLED,
    }
}

#[test]
fn test_new_manager_is_empty() {
    let rm = ResourceManager::new();
    assert_eq!(rm.buffers().buffer_count(), 0);
    assert_eq!(rm.textures().texture_count(), 0);
    assert_eq!(rm.cameras().camera_count(), 0);
    assert_eq!(rm.textures().capacity(), DEFAULT_TEXTURE_CAPACITY);
}

#[test]
fn test_named_texture_round_trip() {
    let mut rm = ResourceManager::with_texture_capacity(8);
    let h = rm.create_named_texture("textures/stone_albedo.ktx", desc()).unwrap();

    assert_eq!(rm.texture_by_name("textures/stone_albedo.ktx"), Some(h));
    assert_eq!(rm.textures().texture_count(), 1);
    assert_eq!(rm.texture_names(), vec!["textures/stone_albedo.ktx"]);
}

#[test]
fn test_duplicate_name_is_rejected() {
    let mut rm = ResourceManager::with_texture_capacity(8);
    rm.create_named_texture("a", desc()).unwrap();
    assert!(rm.create_named_texture("a", desc()).is_err());
    assert_eq!(rm.textures().texture_count(), 1, "no texture leaked");
}

#[test]
fn test_destroy_named_texture() {
    let mut rm = ResourceManager::with_texture_capacity(8);
    let h = rm.create_named_texture("a", desc()).unwrap();
    rm.destroy_named_texture("a").unwrap();

    assert_eq!(rm.texture_by_name("a"), None);
    assert!(rm.textures().texture_extent(h).is_err(), "handle went stale");
    assert!(rm.destroy_named_texture("a").is_err(), "unknown name");
}

#[test]
fn test_texture_pool_is_shareable() {
    let mut rm = ResourceManager::with_texture_capacity(8);
    let h = rm.create_named_texture("a", desc()).unwrap();

    // A streaming thread would clone this Arc and keep it past the
    // manager borrow.
    let textures = std::sync::Arc::clone(rm.textures());
    textures.begin_streaming(h).unwrap();
    textures.finish_streaming(h).unwrap();
}
