// per-atlas sprite lookup cache with host-driven disposal.
pub mod atlas;
pub mod cacher;
pub mod cacher_id;
pub mod error;
pub mod registry;
pub mod release;

pub use atlas::{CLONE_SUFFIX, CLONE_SUFFIX_LEN, Sprite, SpriteAtlas, strip_clone_suffix};
pub use cacher::{CacherBuilder, CacherConfig, SpriteAtlasCacher};
pub use cacher_id::CacherId;
pub use error::CacheError;
pub use registry::{CacherRegistry, SweepTarget};
pub use release::{HostContext, ReleaseMode, RunState, SpriteReleaser};
