//! Math types, coordinate conventions, and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. Everything here is value-in/value-out; no shared
//! state.
//!
//! ## Conventions (load-bearing, do not change one without the others)
//!
//! - World space is pixel space: origin at the window's top-left corner,
//!   +x right, +y **down**. [`screen_projection`] maps it into clip space.
//! - Sprite geometry is a unit quad spanning [-1, 1]², so an entity's scale
//!   is its *half-extent* in pixels.
//! - Model matrices compose **scale first, then translate**:
//!   `T(position) * S(scale)` in glam's column-vector convention. The
//!   quadtree and collision math assume positions are quad centers, which
//!   only holds under this order.

pub use glam::{Mat4, Vec2, Vec3, Vec4};

/// Build the model matrix for a sprite: scale the unit quad to its
/// half-extents, then move it to `position`.
pub fn sprite_transform(position: Vec2, scale: Vec2) -> Mat4 {
    Mat4::from_translation(position.extend(0.0)) * Mat4::from_scale(scale.extend(1.0))
}

/// Orthographic projection from pixel space into wgpu clip space.
///
/// Maps (0, 0) to the top-left of the viewport and (width, height) to the
/// bottom-right, with z = 0 inside the depth range. Derived from glam's
/// `orthographic_rh` (0..1 depth) rather than copied from any fixed-function
/// formula; the corner mapping is unit-tested below.
pub fn screen_projection(width: f32, height: f32) -> Mat4 {
    Mat4::orthographic_rh(0.0, width, height, 0.0, -1.0, 1.0)
}

/// An axis-aligned rectangle, `min` = top-left, `max` = bottom-right.
///
/// A `Bounds` lives either in *local* space (relative to an entity's
/// position) or *world* space; callers track which. [`Bounds::to_world`]
/// converts the former to the latter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// A box centered on the origin with the given half-extents.
    pub fn centered(half_extents: Vec2) -> Self {
        Self {
            min: -half_extents,
            max: half_extents,
        }
    }

    /// Half-open containment: `min` edges inclusive, `max` edges exclusive.
    ///
    /// This is the quadtree convention — it guarantees a point on a
    /// subdivision boundary lands in exactly one quadrant.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    /// Closed intersection test: touching edges count as overlap.
    ///
    /// This is the collision/query convention.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Translate a local-space box into world space by an entity's position.
    pub fn to_world(&self, offset: Vec2) -> Bounds {
        Bounds {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Grow (or shrink, with a negative argument) the box on every side.
    pub fn expand(&self, by: f32) -> Bounds {
        Bounds {
            min: self.min - Vec2::splat(by),
            max: self.max + Vec2::splat(by),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_scales_before_translating() {
        let m = sprite_transform(Vec2::new(10.0, 20.0), Vec2::new(2.0, 3.0));

        // The quad center maps to the position...
        let center = m.transform_point3(Vec3::ZERO);
        assert_eq!(center, Vec3::new(10.0, 20.0, 0.0));

        // ...and a corner is offset by the half-extents, not by a scaled
        // position (which is what the opposite order would produce).
        let corner = m.transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(corner, Vec3::new(12.0, 23.0, 0.0));
    }

    #[test]
    fn transform_matches_hand_computed_matrix() {
        let m = sprite_transform(Vec2::new(1.0, 0.0), Vec2::new(2.0, 2.0));
        #[rustfmt::skip]
        let expected = Mat4::from_cols_array(&[
            2.0, 0.0, 0.0, 0.0,
            0.0, 2.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            1.0, 0.0, 0.0, 1.0,
        ]);
        assert_eq!(m, expected);
    }

    #[test]
    fn projection_maps_viewport_corners() {
        let p = screen_projection(640.0, 480.0);

        let top_left = p.project_point3(Vec3::ZERO);
        assert!((top_left.x - -1.0).abs() < 1e-6);
        assert!((top_left.y - 1.0).abs() < 1e-6);

        let bottom_right = p.project_point3(Vec3::new(640.0, 480.0, 0.0));
        assert!((bottom_right.x - 1.0).abs() < 1e-6);
        assert!((bottom_right.y - -1.0).abs() < 1e-6);

        // z = 0 must land inside wgpu's 0..1 depth range.
        assert!(top_left.z > 0.0 && top_left.z < 1.0);
    }

    #[test]
    fn contains_is_half_open() {
        let b = Bounds::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert!(b.contains(Vec2::ZERO));
        assert!(b.contains(Vec2::new(9.999, 9.999)));
        assert!(!b.contains(Vec2::new(10.0, 5.0)));
        assert!(!b.contains(Vec2::new(5.0, 10.0)));
        assert!(!b.contains(Vec2::new(-0.001, 5.0)));
    }

    #[test]
    fn intersects_is_closed_and_symmetric() {
        let a = Bounds::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let touching = Bounds::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        let apart = Bounds::new(Vec2::new(10.1, 0.0), Vec2::new(20.0, 10.0));

        assert!(a.intersects(&touching));
        assert!(touching.intersects(&a));
        assert!(!a.intersects(&apart));
        assert!(!apart.intersects(&a));
    }

    #[test]
    fn world_conversion_round_trips() {
        let local = Bounds::new(Vec2::new(-12.0, -12.0), Vec2::new(12.0, 12.0));
        let position = Vec2::new(321.5, -48.25);

        let world = local.to_world(position);
        let back = world.to_world(-position);
        assert_eq!(back, local);
    }

    #[test]
    fn center_and_size() {
        let b = Bounds::new(Vec2::new(2.0, 4.0), Vec2::new(6.0, 10.0));
        assert_eq!(b.center(), Vec2::new(4.0, 7.0));
        assert_eq!(b.size(), Vec2::new(4.0, 6.0));
    }
}
