use std::collections::VecDeque;

use bevy::log::warn;
use serde::Serialize;

use crate::collectible::CollectibleKind;
use crate::components::EntityId;
use crate::enemy::EnemyKind;
use crate::portal::{PortalKind, PortalSlot};

const MAX_EVENTS: usize = 500;
const OVERFLOW_LOG_FRAMES: u64 = 60;

/// Gameplay notifications for collaborators outside the core (HUD, sound,
/// the scripted harness).
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimEvent {
    ShotFired {
        projectile: EntityId,
        flash: EntityId,
    },
    EnemyDestroyed {
        enemy: EntityId,
        by: EntityId,
        enemy_kind: EnemyKind,
    },
    EnemyRemoved {
        enemy: EntityId,
    },
    PlayerHit {
        by: EntityId,
        damage: i32,
        health: i32,
    },
    PickupCollected {
        pickup: EntityId,
        item: CollectibleKind,
    },
    PotionUsed {
        health: i32,
    },
    Teleported {
        slot: PortalSlot,
        from: PortalKind,
    },
}

#[derive(Serialize, Clone, Debug)]
pub struct EventRecord {
    pub frame: u64,
    #[serde(flatten)]
    pub event: SimEvent,
}

/// Bounded ring of recent events; the oldest are dropped first.
#[derive(Debug, Default)]
pub struct EventBus {
    pub recent: VecDeque<EventRecord>,
    pub frame: u64,
    pub dropped_events: u64,
    overflow: OverflowLog,
}

/// Drops since the last overflow warning, reported at most once per
/// `OVERFLOW_LOG_FRAMES`.
#[derive(Debug, Default)]
struct OverflowLog {
    pending: u64,
    last_logged: Option<u64>,
}

impl OverflowLog {
    fn record(&mut self, frame: u64, total: u64) {
        self.pending += 1;
        let due = self
            .last_logged
            .map_or(true, |last| frame.saturating_sub(last) >= OVERFLOW_LOG_FRAMES);
        if due {
            warn!(
                "[Sim events] Bus full, dropped {} oldest record(s) ({} total)",
                self.pending, total
            );
            self.pending = 0;
            self.last_logged = Some(frame);
        }
    }
}

impl EventBus {
    pub fn emit(&mut self, event: SimEvent) {
        if self.recent.len() >= MAX_EVENTS && self.recent.pop_front().is_some() {
            self.dropped_events += 1;
            self.overflow.record(self.frame, self.dropped_events);
        }
        self.recent.push_back(EventRecord {
            frame: self.frame,
            event,
        });
    }

    pub fn advance_frame(&mut self) {
        self.frame = self.frame.saturating_add(1);
    }

    /// Records emitted at or after `frame`.
    pub fn since(&self, frame: u64) -> impl Iterator<Item = &EventRecord> {
        self.recent.iter().filter(move |r| r.frame >= frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_bus_tracks_dropped_events() {
        let mut bus = EventBus::default();
        for i in 0..(MAX_EVENTS + 25) {
            bus.emit(SimEvent::PotionUsed { health: i as i32 });
        }
        assert_eq!(bus.recent.len(), MAX_EVENTS);
        assert_eq!(bus.dropped_events, 25);
        assert_eq!(bus.recent[0].event, SimEvent::PotionUsed { health: 25 });
    }

    #[test]
    fn overflow_warning_is_rate_limited() {
        let mut bus = EventBus::default();
        for _ in 0..(MAX_EVENTS + 3) {
            bus.emit(SimEvent::EnemyRemoved { enemy: EntityId(1) });
        }
        assert_eq!(bus.overflow.last_logged, Some(0));
        assert_eq!(bus.overflow.pending, 2);

        for _ in 0..OVERFLOW_LOG_FRAMES {
            bus.advance_frame();
        }
        bus.emit(SimEvent::EnemyRemoved { enemy: EntityId(2) });
        assert_eq!(bus.overflow.last_logged, Some(OVERFLOW_LOG_FRAMES));
        assert_eq!(bus.overflow.pending, 0);
        assert_eq!(bus.dropped_events, 4);
    }

    #[test]
    fn records_carry_frame_and_serialize_flat() {
        let mut bus = EventBus::default();
        bus.advance_frame();
        bus.emit(SimEvent::EnemyRemoved { enemy: EntityId(9) });
        assert_eq!(bus.since(1).count(), 1);
        assert_eq!(bus.since(2).count(), 0);

        let json = serde_json::to_value(&bus.recent[0]).expect("serializes");
        assert_eq!(json["frame"], 1);
        assert_eq!(json["kind"], "enemy_removed");
        assert_eq!(json["enemy"], 9);
    }
}
