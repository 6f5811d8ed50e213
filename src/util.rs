use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn format_count(count: u32) -> String {
    const UNITS: [&str; 3] = ["", "k", "M"];

    let mut value = count as f64;
    let mut unit = 0usize;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        count.to_string()
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}

/// Repository name without the owning account prefix.
pub fn short_name(full_name: &str) -> &str {
    full_name
        .split_once('/')
        .map(|(_, rest)| rest)
        .unwrap_or(full_name)
}

pub fn stable_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Two values in `[-1, 1]` derived from `text`, stable across runs.
pub fn stable_pair(text: &str) -> (f32, f32) {
    let hash = stable_hash(text);

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
