// in-memory packed atlas and the object store its sprites live in.
pub mod atlas;
pub mod instance;
pub mod store;

pub use atlas::{PackError, PackedSpriteAtlas};
pub use instance::{SpriteId, SpriteInstance, SpriteRegion};
pub use store::SpriteStore;

// re-exports
pub use guillotiere::euclid;
