#![allow(dead_code)]

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use sprite_cache::{
    CLONE_SUFFIX_LEN, CacherRegistry, ReleaseMode, Sprite, SpriteAtlas, SpriteAtlasCacher,
    SpriteReleaser, strip_clone_suffix,
};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Debug)]
pub struct MockSprite {
    inner: Arc<MockSpriteInner>,
}

#[derive(Debug)]
struct MockSpriteInner {
    serial: u64,
    name: String,
    alive: AtomicBool,
}

impl MockSprite {
    pub fn new(name: &str) -> Self {
        MockSprite {
            inner: Arc::new(MockSpriteInner {
                serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
                name: name.to_string(),
                alive: AtomicBool::new(true),
            }),
        }
    }

    pub fn serial(&self) -> u64 {
        self.inner.serial
    }

    /// Destroys the object the way the host would, without going through a releaser.
    pub fn destroy(&self) {
        self.inner.alive.store(false, Ordering::Release);
    }
}

impl PartialEq for MockSprite {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for MockSprite {}

impl Hash for MockSprite {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl Sprite for MockSprite {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::Acquire)
    }
}

/// An atlas that counts how often it is asked for sprites.
///
/// By default every request instantiates a new sprite object. With
/// `stable_instances` the same objects are handed out every time.
pub struct MockAtlas {
    packed: Vec<String>,
    stable: Option<Vec<MockSprite>>,
    aliases: Vec<(String, usize)>,
    repeats: Vec<usize>,
    fill_limit: Option<usize>,
    lookups: Mutex<Vec<String>>,
    bulk_fetches: AtomicUsize,
}

impl MockAtlas {
    pub fn new(packed: &[&str]) -> Self {
        MockAtlas {
            packed: packed.iter().map(|name| name.to_string()).collect(),
            stable: None,
            aliases: Vec::new(),
            repeats: Vec::new(),
            fill_limit: None,
            lookups: Mutex::new(Vec::new()),
            bulk_fetches: AtomicUsize::new(0),
        }
    }

    pub fn stable_instances(mut self) -> Self {
        self.stable = Some(self.packed.iter().map(|name| MockSprite::new(name)).collect());
        self
    }

    /// Makes `alias` resolve to the packed sprite at `index`.
    pub fn alias(mut self, alias: &str, index: usize) -> Self {
        self.aliases.push((alias.to_string(), index));
        self
    }

    /// Hands out the packed sprite at `index` once more at the end of every
    /// bulk fetch, counted in `sprite_count`.
    pub fn repeat_in_bulk(mut self, index: usize) -> Self {
        self.repeats.push(index);
        self
    }

    /// Only fill `limit` slots on a bulk fetch.
    pub fn fill_limit(mut self, limit: usize) -> Self {
        self.fill_limit = Some(limit);
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }

    pub fn lookup_count(&self, name: &str) -> usize {
        self.lookups.lock().iter().filter(|n| *n == name).count()
    }

    pub fn bulk_fetches(&self) -> usize {
        self.bulk_fetches.load(Ordering::Relaxed)
    }

    pub fn stable_sprite(&self, index: usize) -> Option<MockSprite> {
        self.stable.as_ref().and_then(|s| s.get(index).cloned())
    }

    fn instantiate(&self, index: usize) -> MockSprite {
        match &self.stable {
            Some(stable) => stable[index].clone(),
            None => MockSprite::new(&self.packed[index]),
        }
    }
}

impl SpriteAtlas for MockAtlas {
    type Sprite = MockSprite;

    fn get_sprite(&self, name: &str) -> Option<MockSprite> {
        self.lookups.lock().push(name.to_string());

        if let Some((_, index)) = self.aliases.iter().find(|(alias, _)| alias == name) {
            return Some(self.instantiate(*index));
        }
        self.packed
            .iter()
            .position(|packed| strip_clone_suffix(packed, CLONE_SUFFIX_LEN).ok() == Some(name))
            .map(|index| self.instantiate(index))
    }

    fn sprite_count(&self) -> usize {
        self.packed.len() + self.repeats.len()
    }

    fn get_sprites(&self, sprites: &mut [Option<MockSprite>]) -> usize {
        self.bulk_fetches.fetch_add(1, Ordering::Relaxed);
        let limit = self.fill_limit.unwrap_or(usize::MAX);

        let indices = (0..self.packed.len()).chain(self.repeats.iter().copied());
        let mut filled = 0;
        for (slot, index) in sprites.iter_mut().zip(indices).take(limit) {
            *slot = Some(self.instantiate(index));
            filled += 1;
        }
        filled
    }
}

/// Records every release and destroys the sprite.
#[derive(Default)]
pub struct MockReleaser {
    released: Mutex<Vec<(MockSprite, ReleaseMode)>>,
    defer_destruction: bool,
}

impl MockReleaser {
    /// A releaser that leaves deferred releases alive, the way a host does
    /// until the end of the frame.
    pub fn deferring() -> Self {
        MockReleaser {
            defer_destruction: true,
            ..Default::default()
        }
    }

    pub fn release_count(&self) -> usize {
        self.released.lock().len()
    }

    pub fn released_names(&self) -> Vec<String> {
        let mut names = self
            .released
            .lock()
            .iter()
            .map(|(sprite, _)| sprite.name().to_string())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    pub fn modes(&self) -> Vec<ReleaseMode> {
        self.released.lock().iter().map(|(_, mode)| *mode).collect()
    }

    pub fn times_released(&self, sprite: &MockSprite) -> usize {
        self.released.lock().iter().filter(|(s, _)| s == sprite).count()
    }
}

impl SpriteReleaser<MockSprite> for MockReleaser {
    fn release(&self, sprite: MockSprite, mode: ReleaseMode) {
        if !(self.defer_destruction && mode == ReleaseMode::Deferred) {
            sprite.destroy();
        }
        self.released.lock().push((sprite, mode));
    }
}

pub type MockCacher = SpriteAtlasCacher<MockAtlas, Arc<MockReleaser>>;

/// A cacher registered in its own registry so tests never sweep each other.
pub fn cacher(atlas: Option<Arc<MockAtlas>>) -> (Arc<MockCacher>, Arc<MockReleaser>) {
    let releaser = Arc::new(MockReleaser::default());
    let mut builder =
        MockCacher::builder(releaser.clone()).registry(Arc::new(CacherRegistry::new()));
    if let Some(atlas) = atlas {
        builder = builder.atlas(atlas);
    }
    (builder.build(), releaser)
}

pub fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items
}
