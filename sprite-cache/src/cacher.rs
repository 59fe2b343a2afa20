use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};
use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::atlas::{Sprite, SpriteAtlas, strip_clone_suffix};
use crate::cacher_id::CacherId;
use crate::error::CacheError;
use crate::registry::{CacherRegistry, SweepTarget};
use crate::release::{RunState, SpriteReleaser};

mod builder;

pub use builder::{CacherBuilder, CacherConfig};

/// Memoizes `SpriteAtlas::get_sprite` lookups by name.
///
/// Every handle stored in the table belongs to the cacher, which releases it
/// through `R` on dispose. Misses are cached as `None` so a name that is not
/// packed is asked for only once.
pub struct SpriteAtlasCacher<A: SpriteAtlas, R: SpriteReleaser<A::Sprite>> {
    id: CacherId,
    config: CacherConfig,
    releaser: R,
    registry: Arc<CacherRegistry>,
    state: Mutex<CacherState<A>>,
}

struct CacherState<A: SpriteAtlas> {
    atlas: Option<Arc<A>>,
    table: FxHashMap<String, Option<A::Sprite>>,
}

/// Constructors and information methods.
impl<A: SpriteAtlas, R: SpriteReleaser<A::Sprite>> SpriteAtlasCacher<A, R> {
    /// Creates a cacher with the default config and registers it globally.
    pub fn new(atlas: Option<Arc<A>>, releaser: R) -> Arc<Self> {
        let builder = CacherBuilder::new(releaser);
        match atlas {
            Some(atlas) => builder.atlas(atlas).build(),
            None => builder.build(),
        }
    }

    pub fn builder(releaser: R) -> CacherBuilder<A, R> {
        CacherBuilder::new(releaser)
    }

    pub fn id(&self) -> CacherId {
        self.id
    }

    pub fn config(&self) -> &CacherConfig {
        &self.config
    }

    pub fn releaser(&self) -> &R {
        &self.releaser
    }

    pub fn registry(&self) -> &Arc<CacherRegistry> {
        &self.registry
    }

    pub fn atlas(&self) -> Option<Arc<A>> {
        self.state.lock().atlas.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().table.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().table.contains_key(name)
    }

    /// Snapshot of the whole name to sprite table.
    pub fn table(&self) -> Vec<(String, Option<A::Sprite>)> {
        self.state
            .lock()
            .table
            .iter()
            .map(|(name, sprite)| (name.clone(), sprite.clone()))
            .collect()
    }

    pub fn cached_names(&self) -> Vec<String> {
        self.state.lock().table.keys().cloned().collect()
    }

    pub fn cached_sprites(&self) -> Vec<Option<A::Sprite>> {
        self.state.lock().table.values().cloned().collect()
    }
}

/// Lookup and bulk caching.
impl<A: SpriteAtlas, R: SpriteReleaser<A::Sprite>> SpriteAtlasCacher<A, R> {
    /// Returns the sprite named `name`, asking the atlas only on the first call.
    ///
    /// Without a backing atlas this always returns `None` and caches nothing.
    pub fn get_sprite(&self, name: &str) -> Option<A::Sprite> {
        let mut state = self.state.lock();
        let CacherState { atlas, table } = &mut *state;

        let Some(atlas) = atlas else {
            trace!(
                "SpriteAtlasCacher::get_sprite: cacher={} has no atlas, name={name:?}",
                self.id
            );
            return None;
        };

        if let Some(entry) = table.get(name) {
            if entry.as_ref().is_none_or(Sprite::is_alive) {
                trace!(
                    "SpriteAtlasCacher::get_sprite: cacher={} hit name={name:?} (cached miss: {})",
                    self.id,
                    entry.is_none()
                );
                return entry.clone();
            }
            // destroyed by the host behind our back; it is gone, so do not release it
            warn!(
                "SpriteAtlasCacher::get_sprite: cacher={} dropping destroyed sprite name={name:?}",
                self.id
            );
        }

        let sprite = atlas.get_sprite(name);
        trace!(
            "SpriteAtlasCacher::get_sprite: cacher={} queried atlas name={name:?} found={}",
            self.id,
            sprite.is_some()
        );
        table.insert(name.to_string(), sprite.clone());
        sprite
    }

    /// Replaces the table with every sprite packed in the atlas.
    ///
    /// Names are taken from the fetched instances with the clone suffix
    /// removed. When two instances strip to the same name the later one wins.
    /// On error the table is left as it was.
    pub fn cache_all(&self, state: RunState) -> Result<(), CacheError> {
        let mut guard = self.state.lock();
        let atlas = guard.atlas.clone().ok_or(CacheError::AtlasUnset)?;

        let expected = atlas.sprite_count();
        let mut slots = vec![None; expected];
        atlas.get_sprites(&mut slots);
        let fetched = slots.into_iter().flatten().collect::<Vec<_>>();

        let table = match self.build_table(&fetched, expected) {
            Ok(table) => table,
            Err(err) => {
                let held = guard.table.values().flatten().cloned().collect::<FxHashSet<_>>();
                drop(guard);
                let orphans = unique(fetched.into_iter().filter(|sprite| !held.contains(sprite)));

                warn!(
                    "SpriteAtlasCacher::cache_all: cacher={} failed: {err}; discarding {} fetched sprite(s)",
                    self.id,
                    orphans.len()
                );
                self.release_all(orphans, state);
                return Err(err);
            }
        };

        let cached = table.len();
        let kept = if self.config.release_superseded {
            table.values().flatten().cloned().collect::<FxHashSet<_>>()
        } else {
            FxHashSet::default()
        };
        let previous = std::mem::replace(&mut guard.table, table);
        drop(guard);

        let superseded = if self.config.release_superseded {
            unique(
                previous
                    .into_values()
                    .flatten()
                    .chain(fetched)
                    .filter(|sprite| !kept.contains(sprite)),
            )
        } else {
            Vec::new()
        };

        debug!(
            "SpriteAtlasCacher::cache_all: cacher={} cached {cached} name(s) from {expected} packed sprite(s), releasing {} superseded",
            self.id,
            superseded.len()
        );
        self.release_all(superseded, state);

        Ok(())
    }

    fn build_table(
        &self,
        fetched: &[A::Sprite],
        expected: usize,
    ) -> Result<FxHashMap<String, Option<A::Sprite>>, CacheError> {
        if fetched.len() < expected {
            return Err(CacheError::IncompleteBulkFetch {
                expected,
                filled: fetched.len(),
            });
        }

        let mut table = FxHashMap::default();
        for sprite in fetched {
            let name = strip_clone_suffix(sprite.name(), self.config.clone_suffix_len)?;
            if table.insert(name.to_string(), Some(sprite.clone())).is_some() {
                trace!(
                    "SpriteAtlasCacher::cache_all: cacher={} name={name:?} packed more than once, keeping the last",
                    self.id
                );
            }
        }

        Ok(table)
    }
}

/// Disposal and lifecycle hooks.
impl<A: SpriteAtlas, R: SpriteReleaser<A::Sprite>> SpriteAtlasCacher<A, R> {
    /// Releases every live cached sprite and empties the table.
    ///
    /// Calling this on an empty cacher does nothing.
    pub fn dispose(&self, state: RunState) {
        let drained = {
            let mut guard = self.state.lock();
            if guard.table.is_empty() {
                trace!("SpriteAtlasCacher::dispose: cacher={} already empty", self.id);
                return;
            }
            guard.table.drain().collect::<Vec<_>>()
        };

        let names = drained.len();
        let sprites = unique(drained.into_iter().filter_map(|(_, sprite)| sprite));

        debug!(
            "SpriteAtlasCacher::dispose: cacher={} cleared {names} name(s) (state={state:?})",
            self.id
        );
        self.release_all(sprites, state);
    }

    /// The host activated this cacher.
    pub fn on_enable(&self, state: RunState) {
        trace!("SpriteAtlasCacher::on_enable: cacher={} state={state:?}", self.id);
        if state.is_playing() {
            self.dispose(state);
        }
    }

    /// The host deactivated this cacher.
    pub fn on_disable(&self, state: RunState) {
        trace!("SpriteAtlasCacher::on_disable: cacher={} state={state:?}", self.id);
        if state.is_playing() {
            self.dispose(state);
        }
    }

    /// Points the cacher at another atlas (or none).
    ///
    /// Sprites taken from the old atlas are released first. Setting the same
    /// atlas again keeps the table.
    pub fn set_atlas(&self, atlas: Option<Arc<A>>, state: RunState) {
        let drained = {
            let mut guard = self.state.lock();
            let same = match (&guard.atlas, &atlas) {
                (Some(current), Some(new)) => Arc::ptr_eq(current, new),
                (None, None) => true,
                _ => false,
            };
            if same {
                return;
            }

            debug!(
                "SpriteAtlasCacher::set_atlas: cacher={} switching atlas (has_atlas={})",
                self.id,
                atlas.is_some()
            );
            guard.atlas = atlas;
            guard.table.drain().filter_map(|(_, sprite)| sprite).collect::<Vec<_>>()
        };

        self.release_all(unique(drained), state);
    }

    fn release_all(&self, sprites: Vec<A::Sprite>, state: RunState) {
        let mode = state.release_mode();
        let mut released = 0;
        for sprite in sprites.into_iter().filter(Sprite::is_alive) {
            self.releaser.release(sprite, mode);
            released += 1;
        }
        if released > 0 {
            debug!(
                "SpriteAtlasCacher::release_all: cacher={} released {released} sprite(s) ({mode:?})",
                self.id
            );
        }
    }
}

impl<A: SpriteAtlas, R: SpriteReleaser<A::Sprite>> SweepTarget for SpriteAtlasCacher<A, R> {
    fn cacher_id(&self) -> CacherId {
        self.id
    }

    fn sweep(&self, state: RunState) {
        self.dispose(state);
    }
}

// The cacher owns whatever is left in the table when it goes away.
impl<A: SpriteAtlas, R: SpriteReleaser<A::Sprite>> Drop for SpriteAtlasCacher<A, R> {
    fn drop(&mut self) {
        self.registry.unregister(self.id);

        let mode = self.config.drop_release_mode;
        let sprites = unique(self.state.get_mut().table.drain().filter_map(|(_, sprite)| sprite));

        let mut released = 0;
        for sprite in sprites.into_iter().filter(Sprite::is_alive) {
            self.releaser.release(sprite, mode);
            released += 1;
        }
        trace!(
            "SpriteAtlasCacher::drop: cacher={} released {released} sprite(s) ({mode:?})",
            self.id
        );
    }
}

// a handle cached under two names must still be released once
fn unique<S: Sprite>(sprites: impl IntoIterator<Item = S>) -> Vec<S> {
    let mut seen = FxHashSet::default();
    sprites
        .into_iter()
        .filter(|sprite| seen.insert(sprite.clone()))
        .collect()
}
