use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use guillotiere::euclid::{self, Box2D};
use sprite_cache::Sprite;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId {
    sprite_uuid: Uuid,
}

impl SpriteId {
    pub(crate) fn new() -> Self {
        SpriteId {
            sprite_uuid: Uuid::new_v4(),
        }
    }
}

/// Where a packed sprite sits in the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteRegion {
    pub page_index: u32,
    pub bounds: Box2D<i32, euclid::UnknownUnit>,
    pub uv: Box2D<f32, euclid::UnknownUnit>,
}

impl SpriteRegion {
    pub fn size(&self) -> [u32; 2] {
        [
            (self.bounds.max.x - self.bounds.min.x) as u32,
            (self.bounds.max.y - self.bounds.min.y) as u32,
        ]
    }

    pub fn area(&self) -> u32 {
        self.bounds.area() as u32
    }
}

/// One sprite object handed out by a `PackedSpriteAtlas`.
///
/// Clones share the same object. Once destroyed, an instance stays
/// destroyed and every clone observes it.
#[derive(Clone)]
pub struct SpriteInstance {
    inner: Arc<SpriteInstanceInner>,
}

pub(crate) struct SpriteInstanceInner {
    id: SpriteId,
    name: String,
    region: SpriteRegion,
    alive: AtomicBool,
}

impl SpriteInstance {
    pub(crate) fn new(name: String, region: SpriteRegion) -> Self {
        SpriteInstance {
            inner: Arc::new(SpriteInstanceInner {
                id: SpriteId::new(),
                name,
                region,
                alive: AtomicBool::new(true),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<SpriteInstanceInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn from_inner(inner: Arc<SpriteInstanceInner>) -> Self {
        SpriteInstance { inner }
    }

    /// Returns `true` if this call destroyed the object.
    pub(crate) fn mark_destroyed(&self) -> bool {
        self.inner.alive.swap(false, Ordering::AcqRel)
    }

    pub fn id(&self) -> SpriteId {
        self.inner.id
    }

    pub fn region(&self) -> SpriteRegion {
        self.inner.region
    }

    pub fn page_index(&self) -> u32 {
        self.inner.region.page_index
    }

    pub fn size(&self) -> [u32; 2] {
        self.inner.region.size()
    }

    pub fn uv(&self) -> Box2D<f32, euclid::UnknownUnit> {
        self.inner.region.uv
    }
}

impl SpriteInstanceInner {
    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl Sprite for SpriteInstance {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }
}

impl PartialEq for SpriteInstance {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for SpriteInstance {}

impl Hash for SpriteInstance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for SpriteInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteInstance")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("page_index", &self.inner.region.page_index)
            .field("alive", &self.is_alive())
            .finish()
    }
}
