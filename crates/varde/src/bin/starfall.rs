//! Starfall — the varde demo game.
//!
//! Sixteen stars fall down the screen and wrap back to the top at a random
//! column; a WASD-controlled player flashes red for a third of a second
//! when a star hits it, using the previous frame's quadtree to find
//! collision candidates. Set `STARFALL_FONT=/path/to/font.ttf` to draw the
//! text overlay, and `STARFALL_DEBUG=1` to visualize hitboxes and the
//! quadtree cells.

use rand::Rng;
use varde::prelude::*;

const STAR_COUNT: usize = 16;
const FALL_SPEED: f32 = 256.0;
const PLAYER_SPEED: f32 = 128.0;
const IMMUNITY_SECONDS: f32 = 0.33;

/// Falls at a constant speed and wraps to a random column at the top.
struct Fall;

impl Behavior for Fall {
    fn update(&mut self, id: EntityId, ctx: &mut TickContext<'_>) {
        let world = ctx.world_bounds();
        let dt = ctx.dt;
        let entity = ctx.entities.get_mut(id);

        entity.position.y += FALL_SPEED * dt;
        if entity.position.y >= world.max.y {
            entity.position.y = world.min.y;
            entity.position.x = rand::thread_rng().gen_range(world.min.x..world.max.x);
        }
    }
}

/// WASD movement plus a collision-triggered immunity timer.
struct Player {
    immunity: f32,
}

impl Behavior for Player {
    fn update(&mut self, id: EntityId, ctx: &mut TickContext<'_>) {
        // Candidate gathering against last frame's index. The tree stores
        // entity centers, so pad the probe box enough to catch any star
        // whose center sits outside our hitbox while its box overlaps.
        let me = ctx.entities.get(id);
        let probe = me.bounds.to_world(me.position).expand(32.0);

        if self.immunity <= 0.01 {
            for other in ctx.index.query(probe) {
                if other == id {
                    continue;
                }
                let candidate = ctx.entities.get(other);
                if candidate.kind == EntityKind::Player {
                    continue;
                }
                if collide(ctx.entities.get(id), candidate) {
                    self.immunity = IMMUNITY_SECONDS;
                    break;
                }
            }
        }
        self.immunity = (self.immunity - ctx.dt).max(0.0);

        let mut direction = Vec2::ZERO;
        if ctx.input.held(KeyCode::KeyW) {
            direction.y -= 1.0;
        }
        if ctx.input.held(KeyCode::KeyS) {
            direction.y += 1.0;
        }
        if ctx.input.held(KeyCode::KeyA) {
            direction.x -= 1.0;
        }
        if ctx.input.held(KeyCode::KeyD) {
            direction.x += 1.0;
        }

        let dt = ctx.dt;
        let entity = ctx.entities.get_mut(id);
        entity.position += direction * PLAYER_SPEED * dt;
        entity.sprite.color = if self.immunity > 0.0 {
            Vec4::new(1.0, 0.3, 0.3, 1.0)
        } else {
            Vec4::ONE
        };
    }
}

/// A 16x16 white diamond with soft edges.
fn star_pixels() -> Vec<u8> {
    let mut pixels = Vec::with_capacity(16 * 16 * 4);
    for y in 0..16i32 {
        for x in 0..16i32 {
            let distance = (x - 8).abs() + (y - 8).abs();
            let alpha = (255 - distance * 32).clamp(0, 255) as u8;
            pixels.extend_from_slice(&[255, 255, 255, alpha]);
        }
    }
    pixels
}

/// A 16x16 filled square with a darker border.
fn player_pixels() -> Vec<u8> {
    let mut pixels = Vec::with_capacity(16 * 16 * 4);
    for y in 0..16u32 {
        for x in 0..16u32 {
            let border = x == 0 || y == 0 || x == 15 || y == 15;
            let value = if border { 90 } else { 220 };
            pixels.extend_from_slice(&[value, value, 255, 255]);
        }
    }
    pixels
}

fn main() {
    App::new()
        .with_title("starfall")
        .with_size(640, 480)
        .run(|ctx| {
            let star = ctx
                .create_texture_rgba("star", 16, 16, &star_pixels())
                .expect("star texture");
            let player = ctx
                .create_texture_rgba("player", 16, 16, &player_pixels())
                .expect("player texture");

            let world = ctx.world_bounds();
            let mut rng = rand::thread_rng();
            for _ in 0..STAR_COUNT {
                let position = Vec2::new(
                    rng.gen_range(world.min.x..world.max.x),
                    rng.gen_range(world.min.y..world.max.y),
                );
                ctx.spawn(
                    Entity::new(Sprite::new(star), position)
                        .with_scale(Vec2::splat(16.0))
                        .with_bounds(Bounds::centered(Vec2::splat(12.0)))
                        .with_behavior(Fall),
                );
            }

            ctx.spawn(
                Entity::new(Sprite::new(player), world.center())
                    .with_scale(Vec2::splat(32.0))
                    .with_bounds(Bounds::centered(Vec2::splat(32.0)))
                    .with_kind(EntityKind::Player)
                    .with_behavior(Player { immunity: 0.0 }),
            );

            if std::env::var_os("STARFALL_DEBUG").is_some() {
                ctx.set_debug_overlay(true);
            }

            #[cfg(feature = "text")]
            if let Ok(path) = std::env::var("STARFALL_FONT") {
                match std::fs::read(&path) {
                    Ok(bytes) => match ctx.load_font(&bytes, 16.0) {
                        Ok(font) => ctx.set_overlay_text(
                            font,
                            "The quick brown fox jumps over the lazy dog.",
                        ),
                        Err(err) => log::warn!("font '{path}' failed to load: {err}"),
                    },
                    Err(err) => log::warn!("could not read font '{path}': {err}"),
                }
            }
        });
}
