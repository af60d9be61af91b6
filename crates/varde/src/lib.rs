//! # Varde — Minimal Real-Time 2D Sprite Engine
//!
//! Varde renders textured sprites through a single instanced pipeline,
//! advances entities with per-frame behavior hooks, and rebuilds a quadtree
//! every frame for proximity queries. Three subsystems carry the design:
//!
//! - the [batching renderer](render): every sprite becomes one instance in
//!   a storage buffer; each filled segment is one draw call, regardless of
//!   how many textures it references;
//! - the [quadtree](quadtree): behaviors in frame N query the index settled
//!   in frame N−1 while the index for frame N+1 is built alongside them;
//! - the [entity pass](entity): one walk of the store per frame handles
//!   index insertion, behavior updates, transform refresh, and batch
//!   submission in a fixed order.
//!
//! Everything is single-threaded and frame-stepped; blocking calls (event
//! polling, present) happen only at frame boundaries.
//!
//! Start with `use varde::prelude::*` and build an [`App`](app::App).

pub mod app;
pub mod entity;
pub mod error;
pub mod input;
pub mod math;
pub mod prelude;
pub mod quadtree;
pub mod render;
pub mod time;

mod window;
