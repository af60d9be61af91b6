//! Common imports for varde games.

pub use crate::app::{App, Context};
pub use crate::entity::{
    Behavior, Entity, EntityId, EntityKind, EntityStore, TickContext, collide, tick,
};
pub use crate::error::EngineError;
pub use crate::input::{InputState, KeyCode};
pub use crate::math::{Bounds, Mat4, Vec2, Vec4, screen_projection, sprite_transform};
pub use crate::quadtree::Quadtree;
pub use crate::render::batch::{BATCH_CAPACITY, SpriteBatch};
pub use crate::render::texture::{MAX_TEXTURES, TextureHandle};
pub use crate::render::{SPRITE_TEXT, Sprite};

#[cfg(feature = "text")]
pub use crate::render::font::{FontHandle, draw_text};
