use std::sync::Arc;

use sprite_atlas::{PackedSpriteAtlas, SpriteStore};
use sprite_cache::{CacheError, CacherRegistry, HostContext, RunState, Sprite, SpriteAtlasCacher};

fn main() -> Result<(), CacheError> {
    let store = Arc::new(SpriteStore::new());
    let atlas = Arc::new(PackedSpriteAtlas::new([256, 256], store.clone()));
    for (name, size) in [("hero_idle", [32, 32]), ("hero_run", [32, 32]), ("coin", [16, 16])] {
        if let Err(err) = atlas.pack(name, size) {
            println!("could not pack {name}: {err}");
        }
    }

    let cacher = SpriteAtlasCacher::new(Some(atlas.clone()), store.clone());
    let registry = CacherRegistry::global();

    // editing: warm the cache
    cacher.cache_all(RunState::Editing)?;
    println!("editing: cached {:?}", cacher.cached_names());

    for session in 1..=2 {
        registry.on_session_start(HostContext::Editor);
        cacher.on_enable(RunState::Playing);
        store.end_frame();

        let hero = cacher.get_sprite("hero_idle");
        let missing = cacher.get_sprite("boss");
        println!(
            "session {session}: hero_idle={:?} boss={:?} live={} fetches={}",
            hero.as_ref().map(|sprite| sprite.name().to_string()),
            missing.as_ref().map(|sprite| sprite.name().to_string()),
            store.live_count(),
            atlas.fetch_count(),
        );

        // the host tears everything down between sessions
        store.destroy_all();
    }

    cacher.dispose(RunState::Editing);
    println!(
        "done: instantiated={} destroyed={}",
        store.instantiated_count(),
        store.destroyed_count()
    );

    Ok(())
}
