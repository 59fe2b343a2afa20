use std::sync::{Arc, LazyLock, Weak};

use dashmap::DashMap;
use log::{debug, trace};

use crate::cacher_id::CacherId;
use crate::release::{HostContext, RunState};

static GLOBAL_REGISTRY: LazyLock<Arc<CacherRegistry>> =
    LazyLock::new(|| Arc::new(CacherRegistry::new()));

/// Something the registry can dispose at a session boundary.
pub trait SweepTarget: Send + Sync {
    fn cacher_id(&self) -> CacherId;

    fn sweep(&self, state: RunState);
}

/// Weak back-references to every live cacher.
///
/// Some hosts skip the enable/disable hooks between two run sessions, so
/// cached sprites destroyed at the end of the first session would still be
/// served in the second one. Sweeping the registry when a session starts
/// empties every cacher regardless of which hooks fired.
#[derive(Default)]
pub struct CacherRegistry {
    targets: DashMap<CacherId, Weak<dyn SweepTarget>, fxhash::FxBuildHasher>,
}

impl CacherRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// The process-wide registry cachers join unless built with their own.
    pub fn global() -> Arc<Self> {
        GLOBAL_REGISTRY.clone()
    }

    pub fn register(&self, id: CacherId, target: Weak<dyn SweepTarget>) {
        trace!("CacherRegistry::register: cacher={id}");
        self.targets.insert(id, target);
    }

    /// Returns `true` if `id` was registered.
    pub fn unregister(&self, id: CacherId) -> bool {
        trace!("CacherRegistry::unregister: cacher={id}");
        self.targets.remove(&id).is_some()
    }

    pub fn contains(&self, id: CacherId) -> bool {
        self.targets
            .get(&id)
            .is_some_and(|target| target.strong_count() > 0)
    }

    /// Number of registered cachers that are still alive.
    pub fn len(&self) -> usize {
        self.targets
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disposes every live cacher and returns how many were disposed.
    pub fn sweep(&self, state: RunState) -> usize {
        self.targets.retain(|_, target| target.strong_count() > 0);

        // upgrade first so no shard lock is held while disposing
        let live = self
            .targets
            .iter()
            .filter_map(|entry| entry.value().upgrade())
            .collect::<Vec<_>>();

        for target in &live {
            target.sweep(state);
        }

        debug!(
            "CacherRegistry::sweep: disposed {} cacher(s) (state={state:?})",
            live.len()
        );
        live.len()
    }

    /// Hook for the start of a run session.
    ///
    /// Only editor hosts run more than one session per process, so a
    /// standalone host has nothing stale to clear.
    pub fn on_session_start(&self, context: HostContext) -> usize {
        match context {
            HostContext::Editor => self.sweep(RunState::Playing),
            HostContext::Standalone => {
                trace!("CacherRegistry::on_session_start: standalone host, skipping sweep");
                0
            }
        }
    }
}
