//! # Entities — The Simulated Objects and Their Frame Pass
//!
//! An [`Entity`] is a sprite plus simulation state: world position, scale,
//! a local bounding box, a kind tag, and an optional [`Behavior`] invoked
//! once per frame. The [`EntityStore`] owns them in spawn order and is
//! append-only — ids are plain indices and stay valid for the session.
//!
//! ## The Behavior Hook
//!
//! A behavior is a boxed trait object that owns whatever per-entity state
//! it needs (an immunity timer, a velocity, an animation phase) and is
//! dropped with its entity — there is no separately managed state blob.
//! During [`tick`] the behavior is taken out of its entity for the duration
//! of the call, so it receives full mutable access to the store through
//! [`TickContext`] without aliasing itself.
//!
//! A behavior must not replace its own entity's behavior from inside
//! `update`, and [`TickContext`] deliberately exposes no way to spawn:
//! the entity list does not change during the pass.
//!
//! ## Per-Frame Ordering
//!
//! [`tick`] makes a single pass over the list. For each entity, in order:
//!
//! 1. its current position is inserted into the index being built for the
//!    *next* frame;
//! 2. its behavior runs, reading input and querying the index settled
//!    during the *previous* frame;
//! 3. its render transform is recomputed from the (possibly just-mutated)
//!    position and scale;
//! 4. its sprite is pushed into the batch.
//!
//! Behaviors therefore never observe a half-built spatial index, and a
//! position change is visible in the same frame's rendering but only in the
//! *next* frame's queries.

use crate::input::InputState;
use crate::math::{Bounds, Vec2, sprite_transform};
use crate::quadtree::Quadtree;
use crate::render::Sprite;
use crate::render::batch::SpriteBatch;

/// Identifies an entity within its [`EntityStore`]. Stable for the whole
/// session (the store is append-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(u32);

impl EntityId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Coarse entity classification, used by behaviors to filter query results
/// (e.g. the player ignoring itself in collision candidates).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Prop,
    Player,
}

/// Per-entity update hook, called once per frame by [`tick`].
pub trait Behavior {
    fn update(&mut self, id: EntityId, ctx: &mut TickContext<'_>);
}

/// A simulated, rendered game object.
pub struct Entity {
    pub sprite: Sprite,
    /// World position of the sprite's center, in pixels.
    pub position: Vec2,
    /// Half-extents of the rendered quad, in pixels.
    pub scale: Vec2,
    /// Carried in the schema but not yet applied to rendering or collision.
    pub rotation: f32,
    /// Collision box in local (entity-relative) space.
    pub bounds: Bounds,
    pub kind: EntityKind,
    pub behavior: Option<Box<dyn Behavior>>,
}

impl Entity {
    /// A prop at `position` with unit half-extents, a unit local box, and
    /// no behavior.
    pub fn new(sprite: Sprite, position: Vec2) -> Self {
        Self {
            sprite,
            position,
            scale: Vec2::ONE,
            rotation: 0.0,
            bounds: Bounds::centered(Vec2::ONE),
            kind: EntityKind::Prop,
            behavior: None,
        }
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }
}

/// AABB overlap test between two entities' world-space boxes. Rotation is
/// not applied to the boxes; touching edges collide.
pub fn collide(a: &Entity, b: &Entity) -> bool {
    a.bounds
        .to_world(a.position)
        .intersects(&b.bounds.to_world(b.position))
}

/// Owns every live entity, in spawn order. Append-only: entities live until
/// the store is dropped, which also drops each behavior and its state.
#[derive(Default)]
pub struct EntityStore {
    entities: Vec<Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity, taking ownership of its behavior state.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = EntityId::from_index(self.entities.len());
        self.entities.push(entity);
        id
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// # Panics
    ///
    /// Panics if the id did not come from this store.
    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    /// # Panics
    ///
    /// Panics if the id did not come from this store.
    pub fn get_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId::from_index(i), e))
    }
}

/// Entity access handed to behaviors: lookups and mutation, no spawning.
pub struct EntityAccess<'a> {
    entities: &'a mut Vec<Entity>,
}

impl EntityAccess<'_> {
    /// # Panics
    ///
    /// Panics if the id did not come from this store.
    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    /// # Panics
    ///
    /// Panics if the id did not come from this store.
    pub fn get_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.index()]
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Everything a [`Behavior`] may touch during its update.
pub struct TickContext<'a> {
    /// Seconds since the previous frame.
    pub dt: f32,
    pub input: &'a InputState,
    /// The spatial index settled during the previous frame. The index being
    /// built this frame is not exposed.
    pub index: &'a Quadtree,
    pub entities: EntityAccess<'a>,
}

impl TickContext<'_> {
    /// The fixed world region covered by the spatial index.
    pub fn world_bounds(&self) -> Bounds {
        self.index.bounds()
    }
}

/// Advance every entity one frame, in spawn order, per the sequence in the
/// module docs. The caller renders the batch afterwards, then swaps `next`
/// in as the settled index and clears the old one.
pub fn tick(
    store: &mut EntityStore,
    previous: &Quadtree,
    next: &mut Quadtree,
    batch: &mut SpriteBatch,
    input: &InputState,
    dt: f32,
) {
    for index in 0..store.entities.len() {
        let id = EntityId::from_index(index);

        let position = store.entities[index].position;
        next.insert(position, id);

        let mut behavior = store.entities[index].behavior.take();
        if let Some(b) = behavior.as_mut() {
            let mut ctx = TickContext {
                dt,
                input,
                index: previous,
                entities: EntityAccess {
                    entities: &mut store.entities,
                },
            };
            b.update(id, &mut ctx);
        }
        store.entities[index].behavior = behavior;

        let entity = &mut store.entities[index];
        entity.sprite.transform = sprite_transform(entity.position, entity.scale);
        batch.push(&entity.sprite);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::render::texture::TextureHandle;

    fn prop(x: f32, y: f32) -> Entity {
        Entity::new(Sprite::new(TextureHandle::WHITE), Vec2::new(x, y))
            .with_bounds(Bounds::centered(Vec2::splat(12.0)))
    }

    fn world() -> Bounds {
        Bounds::new(Vec2::ZERO, Vec2::new(640.0, 480.0))
    }

    #[test]
    fn spawn_order_is_iteration_order() {
        let mut store = EntityStore::new();
        let a = store.spawn(prop(1.0, 0.0));
        let b = store.spawn(prop(2.0, 0.0));
        let c = store.spawn(prop(3.0, 0.0));

        let order: Vec<EntityId> = store.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, b, c]);
        assert_eq!(store.get(b).position.x, 2.0);
    }

    #[test]
    fn collide_is_symmetric() {
        let a = prop(100.0, 100.0);
        let b = prop(110.0, 110.0); // 24x24 boxes, overlapping
        let c = prop(200.0, 200.0); // far away

        assert!(collide(&a, &b));
        assert!(collide(&b, &a));
        assert!(!collide(&a, &c));
        assert!(!collide(&c, &a));
    }

    #[test]
    fn touching_boxes_collide() {
        let a = prop(100.0, 100.0);
        let b = prop(124.0, 100.0); // edges meet exactly at x = 112
        assert!(collide(&a, &b));
        assert!(collide(&b, &a));
    }

    /// Behavior whose state reports when it's dropped.
    struct CountedDrop(Rc<Cell<u32>>);
    impl Behavior for CountedDrop {
        fn update(&mut self, _: EntityId, _: &mut TickContext<'_>) {}
    }
    impl Drop for CountedDrop {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn dropping_the_store_drops_each_behavior_state_once() {
        let drops = Rc::new(Cell::new(0));
        let count = 7;

        let mut store = EntityStore::new();
        for i in 0..count {
            store.spawn(prop(i as f32, 0.0).with_behavior(CountedDrop(drops.clone())));
        }
        // One entity without state must not affect the count.
        store.spawn(prop(99.0, 0.0));

        // A tick (which takes behaviors out and puts them back) must not
        // drop anything.
        let previous = Quadtree::new(world());
        let mut next = Quadtree::new(world());
        let mut batch = SpriteBatch::new();
        tick(&mut store, &previous, &mut next, &mut batch, &InputState::new(), 0.016);
        assert_eq!(drops.get(), 0);

        drop(store);
        assert_eq!(drops.get(), count);
    }

    /// Moves its entity right and records how many index entries it saw.
    struct MoveAndObserve {
        seen: Rc<Cell<usize>>,
    }
    impl Behavior for MoveAndObserve {
        fn update(&mut self, id: EntityId, ctx: &mut TickContext<'_>) {
            self.seen.set(ctx.index.len());
            let entity = ctx.entities.get_mut(id);
            entity.position.x += 10.0;
        }
    }

    #[test]
    fn behaviors_query_the_previous_index_and_populate_the_next() {
        let seen = Rc::new(Cell::new(usize::MAX));
        let mut store = EntityStore::new();
        for i in 0..3 {
            store.spawn(
                prop(50.0 + i as f32 * 100.0, 50.0)
                    .with_behavior(MoveAndObserve { seen: seen.clone() }),
            );
        }

        let mut settled = Quadtree::new(world());
        let mut building = Quadtree::new(world());
        let mut batch = SpriteBatch::new();
        let input = InputState::new();

        // Frame 1: the previous index is empty; the next fills up.
        tick(&mut store, &settled, &mut building, &mut batch, &input, 0.016);
        assert_eq!(seen.get(), 0);
        assert_eq!(building.len(), 3);

        std::mem::swap(&mut settled, &mut building);
        building.clear();
        batch.drain_segments();

        // Frame 2: behaviors now see all three entries from frame 1.
        tick(&mut store, &settled, &mut building, &mut batch, &input, 0.016);
        assert_eq!(seen.get(), 3);
        assert_eq!(building.len(), 3);
    }

    #[test]
    fn position_changes_land_in_the_same_frames_transform() {
        struct Teleport;
        impl Behavior for Teleport {
            fn update(&mut self, id: EntityId, ctx: &mut TickContext<'_>) {
                ctx.entities.get_mut(id).position = Vec2::new(321.0, 123.0);
            }
        }

        let mut store = EntityStore::new();
        store.spawn(
            prop(10.0, 10.0)
                .with_scale(Vec2::new(2.0, 2.0))
                .with_behavior(Teleport),
        );

        let previous = Quadtree::new(world());
        let mut next = Quadtree::new(world());
        let mut batch = SpriteBatch::new();
        tick(&mut store, &previous, &mut next, &mut batch, &InputState::new(), 0.016);

        // The index received the pre-update position...
        let near_old = next.query(Bounds::new(Vec2::new(9.0, 9.0), Vec2::new(11.0, 11.0)));
        assert_eq!(near_old.len(), 1);

        // ...while the submitted transform reflects the post-update one.
        let segments = batch.drain_segments();
        let transform = &segments[0].instances[0].transform;
        assert_eq!(transform[3][0], 321.0);
        assert_eq!(transform[3][1], 123.0);
        assert_eq!(transform[0][0], 2.0);
    }
}
