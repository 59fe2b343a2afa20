use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// 0 is never handed out.
static NEXT_CACHER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a `SpriteAtlasCacher` for the lifetime of the process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacherId(u64);

#[allow(clippy::new_without_default)]
impl CacherId {
    /// Creates a new, unique ID.
    pub fn new() -> Self {
        CacherId(NEXT_CACHER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacherId").field(&self.0).finish()
    }
}

impl fmt::Display for CacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
