use std::time::Duration;

use serde::Serialize;

use crate::animation::Animator;
use crate::components::{Sprite, Tick};
use crate::config::EnemyTuning;
use crate::geometry::Aabb;
use crate::timer::CooldownTimer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EnemyKind {
    Flyer,
    Crawler,
}

impl EnemyKind {
    fn behavior(self) -> &'static EnemyBehavior {
        match self {
            EnemyKind::Flyer => &FLYER,
            EnemyKind::Crawler => &CRAWLER,
        }
    }

    pub fn contact_damage(self, tuning: &EnemyTuning) -> i32 {
        match self {
            EnemyKind::Flyer => tuning.flyer_damage,
            EnemyKind::Crawler => tuning.crawler_damage,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Locomotion {
    /// Drifts left at a constant speed.
    Flyer { speed: f32 },
    /// Walks back and forth inside `patrol`.
    Crawler {
        patrol: Aabb,
        speed: f32,
        direction: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Constraint {
    Keep,
    Despawn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EnemyPhase {
    Alive,
    Dying,
    Removed,
}

struct EnemyBehavior {
    movement: fn(&mut Aabb, &Locomotion, f32),
    constraint: fn(&Aabb, &mut Locomotion, &mut Animator) -> Constraint,
}

const FLYER: EnemyBehavior = EnemyBehavior {
    movement: flyer_move,
    constraint: flyer_constraint,
};

const CRAWLER: EnemyBehavior = EnemyBehavior {
    movement: crawler_move,
    constraint: crawler_constraint,
};

fn flyer_move(bounds: &mut Aabb, locomotion: &Locomotion, dt: f32) {
    if let Locomotion::Flyer { speed } = locomotion {
        bounds.translate(-speed * dt, 0.0);
    }
}

fn flyer_constraint(bounds: &Aabb, _: &mut Locomotion, _: &mut Animator) -> Constraint {
    if bounds.right() <= 0.0 {
        Constraint::Despawn
    } else {
        Constraint::Keep
    }
}

fn crawler_move(bounds: &mut Aabb, locomotion: &Locomotion, dt: f32) {
    if let Locomotion::Crawler {
        speed, direction, ..
    } = locomotion
    {
        bounds.translate(direction * speed * dt, 0.0);
    }
}

// No push-back: the reversed direction walks the crawler inside again next frame.
fn crawler_constraint(bounds: &Aabb, locomotion: &mut Locomotion, anim: &mut Animator) -> Constraint {
    if let Locomotion::Crawler {
        patrol, direction, ..
    } = locomotion
    {
        if !patrol.contains(bounds) {
            *direction = -*direction;
            anim.mirrored = !anim.mirrored;
        }
    }
    Constraint::Keep
}

#[derive(Debug)]
pub struct Enemy {
    pub locomotion: Locomotion,
    pub anim: Animator,
    death_timer: CooldownTimer,
}

impl Enemy {
    pub fn flyer(anim: Animator, speed: f32, tuning: &EnemyTuning) -> Self {
        Self::new(Locomotion::Flyer { speed }, anim, tuning)
    }

    pub fn crawler(anim: Animator, patrol: Aabb, speed: f32, tuning: &EnemyTuning) -> Self {
        Self::new(
            Locomotion::Crawler {
                patrol,
                speed,
                direction: 1.0,
            },
            anim,
            tuning,
        )
    }

    fn new(locomotion: Locomotion, anim: Animator, tuning: &EnemyTuning) -> Self {
        Self {
            locomotion,
            anim: anim.with_speed(tuning.animation_speed),
            death_timer: CooldownTimer::from_millis(tuning.death_timer_ms),
        }
    }

    pub fn kind(&self) -> EnemyKind {
        match self.locomotion {
            Locomotion::Flyer { .. } => EnemyKind::Flyer,
            Locomotion::Crawler { .. } => EnemyKind::Crawler,
        }
    }

    pub fn is_dying(&self) -> bool {
        self.death_timer.is_active()
    }

    /// When the current dying phase began, if any.
    pub fn death_started(&self) -> Option<Duration> {
        self.death_timer.start_time()
    }

    pub fn phase(&self) -> EnemyPhase {
        if self.is_dying() {
            EnemyPhase::Dying
        } else {
            EnemyPhase::Alive
        }
    }

    /// One frame of enemy behavior. `Removed` means the caller must drop the
    /// entity from every group.
    pub fn update(&mut self, sprite: &mut Sprite, tick: Tick) -> EnemyPhase {
        if self.death_timer.update(tick.now) {
            return EnemyPhase::Removed;
        }
        let behavior = self.kind().behavior();
        if !self.is_dying() {
            (behavior.movement)(&mut sprite.bounds, &self.locomotion, tick.dt);
            sprite.frame = self.anim.advance(tick.dt);
        }
        if (behavior.constraint)(&sprite.bounds, &mut self.locomotion, &mut self.anim)
            == Constraint::Despawn
        {
            return EnemyPhase::Removed;
        }
        self.phase()
    }

    /// Enters the dying phase: arms the death timer, freezes the animation and
    /// swaps the current frame for its silhouette.
    pub fn destroy(&mut self, sprite: &mut Sprite, tick: Tick) {
        self.death_timer.activate(tick.now);
        self.anim.speed = 0.0;
        sprite.frame.silhouette = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{frame_set, Frame, FrameId};
    use std::time::Duration;

    fn tick(dt: f32, now_ms: u64) -> Tick {
        Tick {
            dt,
            now: Duration::from_millis(now_ms),
        }
    }

    fn sprite_at(x: f32, y: f32) -> Sprite {
        Sprite {
            bounds: Aabb::new(x, y, 32.0, 16.0),
            frame: Frame::plain(FrameId(1)),
        }
    }

    fn anim() -> Animator {
        Animator::new(frame_set([1, 2, 3])).expect("frames")
    }

    #[test]
    fn flyer_drifts_left_then_despawns() {
        let tuning = EnemyTuning::default();
        let mut flyer = Enemy::flyer(anim(), 200.0, &tuning);
        let mut sprite = sprite_at(100.0, 50.0);
        assert_eq!(flyer.update(&mut sprite, tick(0.1, 16)), EnemyPhase::Alive);
        assert!((sprite.bounds.left() - 80.0).abs() < 1e-4);

        let mut sprite = sprite_at(-30.0, 50.0);
        assert_eq!(flyer.update(&mut sprite, tick(0.1, 32)), EnemyPhase::Removed);
    }

    #[test]
    fn crawler_reverses_and_mirrors_at_patrol_edge() {
        let tuning = EnemyTuning::default();
        let patrol = Aabb::new(0.0, 0.0, 100.0, 16.0);
        let mut crawler = Enemy::crawler(anim(), patrol, 180.0, &tuning);
        let mut sprite = sprite_at(60.0, 0.0);
        crawler.update(&mut sprite, tick(0.1, 100));
        assert!(sprite.bounds.right() > 100.0);
        assert!(crawler.anim.mirrored);
        assert!(matches!(
            crawler.locomotion,
            Locomotion::Crawler { direction, .. } if direction == -1.0
        ));

        crawler.update(&mut sprite, tick(0.1, 200));
        assert!(patrol.contains(&sprite.bounds));
        assert!(sprite.frame.flip_x);
        assert!(crawler.anim.mirrored);
    }

    #[test]
    fn destroyed_enemy_lingers_then_is_removed() {
        let tuning = EnemyTuning::default();
        let patrol = Aabb::new(0.0, 0.0, 500.0, 16.0);
        let mut crawler = Enemy::crawler(anim(), patrol, 180.0, &tuning);
        let mut sprite = sprite_at(100.0, 0.0);
        crawler.update(&mut sprite, tick(0.1, 1000));
        let frozen_frame = sprite.frame.id;
        crawler.destroy(&mut sprite, tick(0.0, 1000));
        assert_eq!(crawler.phase(), EnemyPhase::Dying);
        assert!(sprite.frame.silhouette);

        let held = sprite.bounds;
        assert_eq!(crawler.update(&mut sprite, tick(0.1, 1100)), EnemyPhase::Dying);
        assert_eq!(crawler.update(&mut sprite, tick(0.1, 1199)), EnemyPhase::Dying);
        assert_eq!(sprite.bounds, held);
        assert_eq!(sprite.frame.id, frozen_frame);
        assert!(sprite.frame.silhouette);

        assert_eq!(crawler.update(&mut sprite, tick(0.1, 1200)), EnemyPhase::Removed);
    }

    #[test]
    fn contact_damage_depends_on_kind() {
        let tuning = EnemyTuning::default();
        assert_eq!(EnemyKind::Flyer.contact_damage(&tuning), 20);
        assert_eq!(EnemyKind::Crawler.contact_damage(&tuning), 25);
    }
}
