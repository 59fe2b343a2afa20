use std::sync::{Arc, Weak};

use fxhash::FxHashMap;
use log::trace;
use parking_lot::Mutex;

use super::{CacherState, SpriteAtlasCacher};
use crate::atlas::{CLONE_SUFFIX_LEN, SpriteAtlas};
use crate::cacher_id::CacherId;
use crate::registry::{CacherRegistry, SweepTarget};
use crate::release::{ReleaseMode, SpriteReleaser};

// --- Constants ---

const RELEASE_SUPERSEDED: bool = true;
const DROP_RELEASE_MODE: ReleaseMode = ReleaseMode::Immediate;

// --- Config ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacherConfig {
    /// Characters stripped from bulk-fetched instance names.
    pub clone_suffix_len: usize,
    /// Release handles that `cache_all` replaces.
    pub release_superseded: bool,
    /// How sprites still cached are released when the cacher is dropped.
    pub drop_release_mode: ReleaseMode,
}

impl Default for CacherConfig {
    fn default() -> Self {
        Self {
            clone_suffix_len: CLONE_SUFFIX_LEN,
            release_superseded: RELEASE_SUPERSEDED,
            drop_release_mode: DROP_RELEASE_MODE,
        }
    }
}

// --- Builder ---

pub struct CacherBuilder<A: SpriteAtlas, R: SpriteReleaser<A::Sprite>> {
    pub(crate) releaser: R,
    pub(crate) atlas: Option<Arc<A>>,
    pub(crate) config: CacherConfig,
    pub(crate) registry: Option<Arc<CacherRegistry>>,
}

impl<A: SpriteAtlas, R: SpriteReleaser<A::Sprite>> CacherBuilder<A, R> {
    pub fn new(releaser: R) -> Self {
        Self {
            releaser,
            atlas: None,
            config: CacherConfig::default(),
            registry: None,
        }
    }

    // --- Settings ---

    pub fn atlas(mut self, atlas: Arc<A>) -> Self {
        self.atlas = Some(atlas);
        self
    }

    pub fn config(mut self, config: CacherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clone_suffix_len(mut self, len: usize) -> Self {
        self.config.clone_suffix_len = len;
        self
    }

    pub fn release_superseded(mut self, release: bool) -> Self {
        self.config.release_superseded = release;
        self
    }

    pub fn drop_release_mode(mut self, mode: ReleaseMode) -> Self {
        self.config.drop_release_mode = mode;
        self
    }

    /// Registers the cacher here instead of in `CacherRegistry::global()`.
    pub fn registry(mut self, registry: Arc<CacherRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    // --- Build ---

    pub fn build(self) -> Arc<SpriteAtlasCacher<A, R>> {
        let registry = self.registry.unwrap_or_else(CacherRegistry::global);
        let id = CacherId::new();

        trace!(
            "CacherBuilder::build: cacher={id} has_atlas={} config={:?}",
            self.atlas.is_some(),
            self.config
        );

        let cacher = Arc::new(SpriteAtlasCacher {
            id,
            config: self.config,
            releaser: self.releaser,
            registry: registry.clone(),
            state: Mutex::new(CacherState {
                atlas: self.atlas,
                table: FxHashMap::default(),
            }),
        });

        let target = Arc::downgrade(&cacher) as Weak<dyn SweepTarget>;
        registry.register(id, target);

        cacher
    }
}
