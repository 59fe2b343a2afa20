/// Whether the host is inside a run session or idle in an editing/tooling context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Editing,
    Playing,
}

impl RunState {
    pub fn is_playing(self) -> bool {
        matches!(self, RunState::Playing)
    }

    /// Objects may only be destroyed at once outside a run session.
    pub fn release_mode(self) -> ReleaseMode {
        match self {
            RunState::Editing => ReleaseMode::Immediate,
            RunState::Playing => ReleaseMode::Deferred,
        }
    }
}

/// The kind of process hosting the caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostContext {
    /// Editor or tooling process; sessions can start and stop many times.
    Editor,
    /// Shipped player; one session per process.
    Standalone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseMode {
    /// Destroy the object now.
    Immediate,
    /// Queue the object and destroy it at the end of the current frame.
    Deferred,
}

/// The host's resource-release mechanism.
///
/// Releasing a sprite that is already destroyed must be a no-op.
pub trait SpriteReleaser<S>: Send + Sync + 'static {
    fn release(&self, sprite: S, mode: ReleaseMode);
}

impl<S, R: SpriteReleaser<S> + ?Sized> SpriteReleaser<S> for std::sync::Arc<R> {
    fn release(&self, sprite: S, mode: ReleaseMode) {
        (**self).release(sprite, mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_mode_follows_run_state() {
        assert_eq!(RunState::Editing.release_mode(), ReleaseMode::Immediate);
        assert_eq!(RunState::Playing.release_mode(), ReleaseMode::Deferred);
        assert!(RunState::Playing.is_playing());
        assert!(!RunState::Editing.is_playing());
    }
}
