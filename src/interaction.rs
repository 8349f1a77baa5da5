use bevy::log::debug;

use crate::components::{Body, EntityId, Group, SimEntity, Tick};
use crate::config::{EnemyTuning, RewardTable};
use crate::enemy::EnemyKind;
use crate::events::{EventBus, SimEvent};
use crate::geometry::Aabb;
use crate::registry::Registry;

#[derive(Clone, Copy)]
struct TargetView {
    id: EntityId,
    bounds: Aabb,
    kind: EnemyKind,
    dying: bool,
}

/// Enemies not already marked for removal. Dying enemies are included.
fn enemy_targets(reg: &Registry) -> Vec<TargetView> {
    reg.ids(Group::Enemy)
        .into_iter()
        .filter(|id| !reg.is_pending(*id))
        .filter_map(|id| {
            let entity = reg.get(id)?;
            let enemy = entity.as_enemy()?;
            Some(TargetView {
                id,
                bounds: entity.bounds(),
                kind: enemy.kind(),
                dying: enemy.is_dying(),
            })
        })
        .collect()
}

fn destroy_enemy(entity: &mut SimEntity, tick: Tick) {
    let SimEntity { sprite, body, .. } = entity;
    if let Body::Enemy(enemy) = body {
        enemy.destroy(sprite, tick);
    }
}

/// Bullets against enemies. A projectile that overlaps any enemy is removed,
/// and every enemy it overlaps is destroyed and credited to `player`. A dying
/// enemy still stops bullets: the hit restarts its death timer and counts
/// again.
pub fn projectiles_vs_enemies(
    reg: &mut Registry,
    player: Option<EntityId>,
    rewards: &RewardTable,
    tick: Tick,
    events: &mut EventBus,
) -> u32 {
    let targets = enemy_targets(reg);
    let mut kills = 0;

    for shot_id in reg.ids(Group::Projectile) {
        if reg.is_pending(shot_id) {
            continue;
        }
        let Some(shot_bounds) = reg.get(shot_id).map(SimEntity::bounds) else {
            continue;
        };
        let hits: Vec<TargetView> = targets
            .iter()
            .filter(|t| shot_bounds.intersects(&t.bounds))
            .copied()
            .collect();
        if hits.is_empty() {
            continue;
        }
        reg.kill(shot_id);
        for hit in hits {
            if let Some(entity) = reg.get_mut(hit.id) {
                destroy_enemy(entity, tick);
            }
            if let Some(p) = player
                .and_then(|id| reg.get_mut(id))
                .and_then(SimEntity::as_player_mut)
            {
                p.credit_kill(rewards);
            }
            kills += 1;
            debug!("[Sim] {:?} {:?} shot down by {:?}", hit.kind, hit.id, shot_id);
            events.emit(SimEvent::EnemyDestroyed {
                enemy: hit.id,
                by: shot_id,
                enemy_kind: hit.kind,
            });
        }
    }
    kills
}

/// Enemies touching the player. Damage goes through the player's
/// invulnerability window; a flyer is destroyed by the contact whether or not
/// the damage landed, a crawler keeps walking.
pub fn enemies_vs_player(
    reg: &mut Registry,
    player: EntityId,
    tuning: &EnemyTuning,
    tick: Tick,
    events: &mut EventBus,
) {
    if reg.is_pending(player) {
        return;
    }
    let Some(player_bounds) = reg.get(player).map(SimEntity::bounds) else {
        return;
    };

    for target in enemy_targets(reg) {
        if target.dying || !player_bounds.intersects(&target.bounds) {
            continue;
        }
        let damage = target.kind.contact_damage(tuning);
        let Some(p) = reg.get_mut(player).and_then(SimEntity::as_player_mut) else {
            return;
        };
        if p.take_damage(damage, tick.now) {
            events.emit(SimEvent::PlayerHit {
                by: target.id,
                damage,
                health: p.stats.health,
            });
        }
        if target.kind == EnemyKind::Flyer {
            if let Some(entity) = reg.get_mut(target.id) {
                destroy_enemy(entity, tick);
            }
            events.emit(SimEvent::EnemyDestroyed {
                enemy: target.id,
                by: player,
                enemy_kind: target.kind,
            });
        }
    }
}
