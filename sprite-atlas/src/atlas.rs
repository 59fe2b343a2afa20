use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fxhash::FxHashMap;
use guillotiere::{AllocId, AtlasAllocator, Size, euclid};
use log::{debug, trace};
use parking_lot::Mutex;
use sprite_cache::{CLONE_SUFFIX, SpriteAtlas};
use thiserror::Error;

use crate::instance::{SpriteInstance, SpriteRegion};
use crate::store::SpriteStore;

/// Named sprite rectangles packed into fixed-size pages.
///
/// The atlas only keeps the layout. Every lookup creates a new
/// `SpriteInstance` in the store, named after the packed sprite with
/// `CLONE_SUFFIX` appended, and never keeps track of it afterwards.
pub struct PackedSpriteAtlas {
    page_size: [u32; 2],
    store: Arc<SpriteStore>,
    state: Mutex<PackedAtlasState>,
    fetches: AtomicUsize,
}

struct PackedAtlasState {
    allocators: Vec<AtlasAllocator>,
    packed: FxHashMap<String, PackedSprite>,
    // packing order, used for bulk fetches
    order: Vec<String>,
}

struct PackedSprite {
    region: SpriteRegion,
    alloc_id: AllocId,
}

/// Constructor and information methods.
impl PackedSpriteAtlas {
    pub fn new(page_size: [u32; 2], store: Arc<SpriteStore>) -> Self {
        Self {
            page_size,
            store,
            state: Mutex::new(PackedAtlasState {
                allocators: Vec::new(),
                packed: FxHashMap::default(),
                order: Vec::new(),
            }),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn page_size(&self) -> [u32; 2] {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.state.lock().allocators.len()
    }

    pub fn store(&self) -> &Arc<SpriteStore> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.state.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().packed.contains_key(name)
    }

    /// Packed names in packing order.
    pub fn names(&self) -> Vec<String> {
        self.state.lock().order.clone()
    }

    pub fn region(&self, name: &str) -> Option<SpriteRegion> {
        self.state.lock().packed.get(name).map(|packed| packed.region)
    }

    /// Number of `get_sprite` and `get_sprites` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

/// Packing and unpacking.
impl PackedSpriteAtlas {
    /// Reserves a `size` rectangle for `name` on the first page with room,
    /// opening a new page when none has any.
    pub fn pack(&self, name: &str, size: [u32; 2]) -> Result<SpriteRegion, PackError> {
        if size[0] == 0 || size[1] == 0 {
            return Err(PackError::EmptySprite);
        }
        if size[0] > self.page_size[0] || size[1] > self.page_size[1] {
            return Err(PackError::TooLarge {
                size,
                page_size: self.page_size,
            });
        }

        let mut state = self.state.lock();
        if state.packed.contains_key(name) {
            return Err(PackError::DuplicateName(name.to_string()));
        }

        let request = Size::new(size[0] as i32, size[1] as i32);

        let mut allocation = None;
        for (page_index, allocator) in state.allocators.iter_mut().enumerate() {
            if let Some(alloc) = allocator.allocate(request) {
                allocation = Some((page_index, alloc));
                break;
            }
        }

        let (page_index, alloc) = match allocation {
            Some(allocation) => allocation,
            None => {
                // every page is full, open a new one
                let mut allocator = AtlasAllocator::new(Size::new(
                    self.page_size[0] as i32,
                    self.page_size[1] as i32,
                ));
                let alloc = allocator.allocate(request).ok_or(PackError::TooLarge {
                    size,
                    page_size: self.page_size,
                })?;
                state.allocators.push(allocator);
                trace!(
                    "PackedSpriteAtlas::pack: opened page {}",
                    state.allocators.len() - 1
                );
                (state.allocators.len() - 1, alloc)
            }
        };

        let min = alloc.rectangle.min;
        let bounds = euclid::Box2D::new(
            min,
            euclid::Point2D::new(min.x + size[0] as i32, min.y + size[1] as i32),
        );
        let uv = euclid::Box2D::new(
            euclid::Point2D::new(
                (bounds.min.x as f32) / (self.page_size[0] as f32),
                (bounds.min.y as f32) / (self.page_size[1] as f32),
            ),
            euclid::Point2D::new(
                (bounds.max.x as f32) / (self.page_size[0] as f32),
                (bounds.max.y as f32) / (self.page_size[1] as f32),
            ),
        );
        let region = SpriteRegion {
            page_index: page_index as u32,
            bounds,
            uv,
        };

        state.packed.insert(
            name.to_string(),
            PackedSprite {
                region,
                alloc_id: alloc.id,
            },
        );
        state.order.push(name.to_string());

        debug!("PackedSpriteAtlas::pack: name={name:?} region={region:?}");
        Ok(region)
    }

    /// Frees the rectangle reserved for `name`.
    ///
    /// Instances already handed out keep their region.
    pub fn unpack(&self, name: &str) -> Result<(), PackError> {
        let mut state = self.state.lock();
        let packed = state
            .packed
            .remove(name)
            .ok_or_else(|| PackError::NotFound(name.to_string()))?;

        state.allocators[packed.region.page_index as usize].deallocate(packed.alloc_id);
        state.order.retain(|packed_name| packed_name != name);

        debug!("PackedSpriteAtlas::unpack: name={name:?}");
        Ok(())
    }

    fn instantiate(&self, name: &str, region: SpriteRegion) -> SpriteInstance {
        self.store.instantiate(format!("{name}{CLONE_SUFFIX}"), region)
    }
}

impl SpriteAtlas for PackedSpriteAtlas {
    type Sprite = SpriteInstance;

    fn get_sprite(&self, name: &str) -> Option<SpriteInstance> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let region = self.region(name)?;
        Some(self.instantiate(name, region))
    }

    fn sprite_count(&self) -> usize {
        self.len()
    }

    fn get_sprites(&self, sprites: &mut [Option<SpriteInstance>]) -> usize {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let packed = {
            let state = self.state.lock();
            state
                .order
                .iter()
                .filter_map(|name| state.packed.get(name).map(|p| (name.clone(), p.region)))
                .collect::<Vec<_>>()
        };

        let mut filled = 0;
        for (slot, (name, region)) in sprites.iter_mut().zip(packed) {
            *slot = Some(self.instantiate(&name, region));
            filled += 1;
        }
        filled
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    #[error("Sprites must be at least one pixel wide and high.")]
    EmptySprite,
    #[error("Sprite of size {size:?} does not fit on a {page_size:?} page.")]
    TooLarge { size: [u32; 2], page_size: [u32; 2] },
    #[error("A sprite named `{0}` is already packed.")]
    DuplicateName(String),
    #[error("No sprite named `{0}` is packed.")]
    NotFound(String),
}
