use std::sync::Weak;
use std::sync::atomic::{AtomicUsize, Ordering};

use fxhash::FxHashMap;
use log::{debug, trace};
use parking_lot::Mutex;
use sprite_cache::{ReleaseMode, Sprite, SpriteReleaser};

use crate::instance::{SpriteId, SpriteInstance, SpriteInstanceInner, SpriteRegion};

// tracked weak pointers are pruned once the list reaches this size, and
// again whenever it doubles past what survived the last pruning
const PRUNE_THRESHOLD: usize = 64;

/// Owns the lifetime of every sprite object the atlases create.
///
/// Immediate releases destroy the object on the spot. Deferred releases are
/// queued and destroyed by `end_frame`, which the host calls once per frame.
#[derive(Default)]
pub struct SpriteStore {
    instances: Mutex<TrackedInstances>,
    pending: Mutex<FxHashMap<SpriteId, SpriteInstance>>,
    instantiated: AtomicUsize,
    destroyed: AtomicUsize,
}

#[derive(Default)]
struct TrackedInstances {
    weak: Vec<Weak<SpriteInstanceInner>>,
    prune_at: usize,
}

impl TrackedInstances {
    fn push(&mut self, weak: Weak<SpriteInstanceInner>) {
        if self.weak.len() >= self.prune_at.max(PRUNE_THRESHOLD) {
            self.prune();
        }
        self.weak.push(weak);
    }

    fn prune(&mut self) {
        self.weak.retain(|weak| weak.strong_count() > 0);
        self.prune_at = self.weak.len() * 2;
    }
}

impl SpriteStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub(crate) fn instantiate(&self, name: String, region: SpriteRegion) -> SpriteInstance {
        let instance = SpriteInstance::new(name, region);

        self.instances.lock().push(instance.downgrade());
        self.instantiated.fetch_add(1, Ordering::Relaxed);

        instance
    }

    /// Destroys `sprite` now. Returns `false` if it was already destroyed.
    pub fn destroy(&self, sprite: &SpriteInstance) -> bool {
        let destroyed = sprite.mark_destroyed();
        if destroyed {
            self.destroyed.fetch_add(1, Ordering::Relaxed);
            trace!("SpriteStore::destroy: {:?}", sprite.id());
        }
        destroyed
    }

    /// Destroys everything queued by deferred releases and returns how many
    /// objects this call destroyed.
    pub fn end_frame(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending.lock());
        let destroyed = pending.values().filter(|sprite| self.destroy(sprite)).count();
        if destroyed > 0 {
            debug!("SpriteStore::end_frame: destroyed {destroyed} deferred sprite(s)");
        }
        destroyed
    }

    /// Destroys every live object, the way a host tears down its objects
    /// at the end of a run session. Pending releases are dropped.
    pub fn destroy_all(&self) -> usize {
        self.pending.lock().clear();

        let live = std::mem::take(&mut *self.instances.lock())
            .weak
            .into_iter()
            .filter_map(|weak| weak.upgrade())
            .map(SpriteInstance::from_inner)
            .collect::<Vec<_>>();
        let destroyed = live.iter().filter(|sprite| self.destroy(sprite)).count();

        debug!("SpriteStore::destroy_all: destroyed {destroyed} sprite(s)");
        destroyed
    }

    /// Objects that have not been destroyed and are still referenced.
    pub fn live_count(&self) -> usize {
        let mut instances = self.instances.lock();
        instances.prune();
        instances
            .weak
            .iter()
            .filter_map(|weak| weak.upgrade())
            .filter(|inner| inner.is_alive())
            .count()
    }

    /// Weak references currently tracked, dead ones included until the next
    /// pruning.
    pub fn tracked_count(&self) -> usize {
        self.instances.lock().weak.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn instantiated_count(&self) -> usize {
        self.instantiated.load(Ordering::Relaxed)
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed.load(Ordering::Relaxed)
    }
}

impl SpriteReleaser<SpriteInstance> for SpriteStore {
    fn release(&self, sprite: SpriteInstance, mode: ReleaseMode) {
        if !sprite.is_alive() {
            trace!("SpriteStore::release: {:?} already destroyed", sprite.id());
            return;
        }

        match mode {
            ReleaseMode::Immediate => {
                self.destroy(&sprite);
            }
            ReleaseMode::Deferred => {
                self.pending.lock().entry(sprite.id()).or_insert(sprite);
            }
        }
    }
}
