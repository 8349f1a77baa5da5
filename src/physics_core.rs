use bevy::math::Vec2;

use crate::geometry::Aabb;

/// Height of the probe strip tested under an entity's feet.
pub const FLOOR_PROBE_HEIGHT: f32 = 2.0;

#[derive(Default, Clone, Copy, Debug)]
pub struct PhysicsCounters {
    pub collision_checks: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Discrete -1/0/1 input direction.
pub fn horizontal_direction(left: bool, right: bool) -> f32 {
    let mut dir = 0.0;
    if left {
        dir -= 1.0;
    }
    if right {
        dir += 1.0;
    }
    dir
}

pub fn step_horizontal(bounds: &mut Aabb, direction_x: f32, speed: f32, dt: f32) {
    bounds.translate(direction_x * speed * dt, 0.0);
}

/// Vertical motion is cumulative: gravity feeds `direction.y`, which is then
/// applied as a per-frame displacement without another `dt` factor.
pub fn step_vertical(bounds: &mut Aabb, direction_y: &mut f32, gravity: f32, dt: f32) {
    *direction_y += gravity * dt;
    bounds.translate(0.0, *direction_y);
}

/// Snaps `bounds` out of every overlapping static rectangle along one axis.
///
/// The leading edge is picked from the sign of the velocity on that axis.
/// Any vertical overlap zeroes vertical velocity, including overlaps that
/// happen with zero velocity.
pub fn resolve_axis(
    bounds: &mut Aabb,
    velocity: &mut Vec2,
    statics: &[Aabb],
    axis: Axis,
    counters: &mut PhysicsCounters,
) {
    for solid in statics {
        counters.collision_checks = counters.collision_checks.saturating_add(1);
        if !solid.intersects(bounds) {
            continue;
        }
        match axis {
            Axis::Horizontal => {
                if velocity.x > 0.0 {
                    bounds.set_right(solid.left());
                }
                if velocity.x < 0.0 {
                    bounds.set_left(solid.right());
                }
            }
            Axis::Vertical => {
                if velocity.y > 0.0 {
                    bounds.set_bottom(solid.top());
                }
                if velocity.y < 0.0 {
                    bounds.set_top(solid.bottom());
                }
                velocity.y = 0.0;
            }
        }
    }
}

/// Strip of `FLOOR_PROBE_HEIGHT` whose mid-top sits on the entity's mid-bottom.
pub fn floor_probe(bounds: &Aabb) -> Aabb {
    let foot = bounds.mid_bottom();
    Aabb::new(
        foot.x - bounds.width() / 2.0,
        foot.y,
        bounds.width(),
        FLOOR_PROBE_HEIGHT,
    )
}

/// Grounded when the floor probe overlaps any static rectangle. This is
/// deliberately independent of the vertical collision pass.
pub fn compute_grounded(bounds: &Aabb, statics: &[Aabb], counters: &mut PhysicsCounters) -> bool {
    let probe = floor_probe(bounds);
    statics.iter().any(|solid| {
        counters.collision_checks = counters.collision_checks.saturating_add(1);
        probe.intersects(solid)
    })
}
