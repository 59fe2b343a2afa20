use std::hash::Hash;

use crate::error::CacheError;

/// Marker the packer appends to every instance it hands out, e.g.
/// `"hero_idle(Clone)"`.
pub const CLONE_SUFFIX: &str = "(Clone)";

/// Length of `CLONE_SUFFIX`, counted in characters.
pub const CLONE_SUFFIX_LEN: usize = CLONE_SUFFIX.len();

/// An opaque, externally allocated sprite object.
///
/// Handles are cheap to clone and compare by identity: two handles are equal
/// only if they refer to the same underlying object. `Hash` must agree with
/// that identity.
pub trait Sprite: Clone + Eq + Hash + Send + Sync + 'static {
    /// The name the host gave this instance.
    fn name(&self) -> &str;

    /// `false` once the host has destroyed the underlying object.
    fn is_alive(&self) -> bool;
}

/// A packed atlas the cache reads sprites from.
///
/// The atlas is the source of handles but never tracks or releases the
/// handles it produced. Ownership moves to the caller.
pub trait SpriteAtlas: Send + Sync + 'static {
    type Sprite: Sprite;

    /// Returns a handle for `name`, or `None` if nothing with that name is packed.
    fn get_sprite(&self, name: &str) -> Option<Self::Sprite>;

    /// Number of sprites packed into the atlas.
    fn sprite_count(&self) -> usize;

    /// Fills `sprites` with one handle per packed sprite and returns how many
    /// slots were written.
    fn get_sprites(&self, sprites: &mut [Option<Self::Sprite>]) -> usize;
}

/// Removes the trailing `suffix_len` characters from a packed instance name.
pub fn strip_clone_suffix(name: &str, suffix_len: usize) -> Result<&str, CacheError> {
    if suffix_len == 0 {
        return Ok(name);
    }

    // byte offset of the first suffix character
    let cut = name
        .char_indices()
        .rev()
        .nth(suffix_len - 1)
        .map(|(index, _)| index)
        .ok_or_else(|| CacheError::MalformedSpriteName {
            name: name.to_string(),
            suffix_len,
        })?;

    Ok(&name[..cut])
}
