// ============================================================================
// TARGET POOL — recycle intermediate render targets across resizes
// ============================================================================

use std::collections::HashMap;

/// Key for pooled targets: (width, height).
type PoolKey = (u32, u32);

/// Pool of ping-pong render targets keyed by size.
///
/// The chain needs two intermediate targets per size.  Dragging the window
/// edge back and forth revisits the same handful of sizes, so released
/// targets are kept and handed out again instead of reallocated.
pub struct TexturePool<T> {
    pool: HashMap<PoolKey, Vec<T>>,
    /// Maximum number of targets to keep per key.
    max_per_key: usize,
}

impl<T> TexturePool<T> {
    pub fn new(max_per_key: usize) -> Self {
        Self { pool: HashMap::new(), max_per_key }
    }

    /// A recycled target of exactly this size, if one is pooled.
    pub fn acquire(&mut self, width: u32, height: u32) -> Option<T> {
        self.pool.get_mut(&(width, height)).and_then(|v| v.pop())
    }

    /// Return a target for reuse.  Dropped when the key is full.
    pub fn release(&mut self, target: T, width: u32, height: u32) {
        let entry = self.pool.entry((width, height)).or_default();
        if entry.len() < self.max_per_key {
            entry.push(target);
        }
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }

    /// Total number of targets currently pooled.
    pub fn pooled_count(&self) -> usize {
        self.pool.values().map(|v| v.len()).sum()
    }
}

impl<T> Default for TexturePool<T> {
    fn default() -> Self {
        Self::new(4)
    }
}
