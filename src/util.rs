use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Palette slot for a node name of the form `arch.region.zone.service...`.
///
/// Names with fewer than four segments share slot 0; otherwise the slot is
/// the length of the fourth segment.
pub fn palette_slot(name: &str, palette_len: usize) -> usize {
    if palette_len == 0 {
        return 0;
    }
    match name.split('.').nth(3) {
        Some(segment) => segment.len() % palette_len,
        None => 0,
    }
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
