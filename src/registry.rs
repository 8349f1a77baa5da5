use std::collections::{BTreeMap, BTreeSet};

use bevy::log::debug;

use crate::components::{Body, EntityId, Group, SimEntity, Sprite};

/// Index-based entity store with group membership and deferred removal.
///
/// `kill` only marks an entity; it stays readable until `flush`, so an
/// iteration snapshot never dangles. Passes that run after a kill should
/// check `is_pending` and skip marked entities.
#[derive(Debug, Default)]
pub struct Registry {
    entities: BTreeMap<EntityId, SimEntity>,
    groups: BTreeMap<Group, BTreeSet<EntityId>>,
    pending: BTreeSet<EntityId>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, sprite: Sprite, body: Body, groups: &[Group]) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        let entity = SimEntity { id, sprite, body };
        let tag = entity.tag();
        if self.entities.insert(id, entity).is_some() {
            panic!("entity id {id:?} assigned twice");
        }
        for group in groups {
            self.groups.entry(*group).or_default().insert(id);
        }
        debug!("[Sim] Spawned {:?} {:?} in {:?}", tag, id, groups);
        id
    }

    /// Marks `id` for removal at the next `flush`. Returns `false` when the
    /// entity is unknown or already marked.
    pub fn kill(&mut self, id: EntityId) -> bool {
        if !self.entities.contains_key(&id) {
            return false;
        }
        self.pending.insert(id)
    }

    pub fn is_pending(&self, id: EntityId) -> bool {
        self.pending.contains(&id)
    }

    /// Drops every marked entity from the store and from all groups.
    pub fn flush(&mut self) -> Vec<SimEntity> {
        let pending = std::mem::take(&mut self.pending);
        let mut removed = Vec::with_capacity(pending.len());
        for id in pending {
            for members in self.groups.values_mut() {
                members.remove(&id);
            }
            if let Some(entity) = self.entities.remove(&id) {
                debug!("[Sim] Removed {:?} {:?}", entity.tag(), id);
                removed.push(entity);
            }
        }
        removed
    }

    /// Snapshot of a group's members in spawn order.
    pub fn ids(&self, group: Group) -> Vec<EntityId> {
        self.groups
            .get(&group)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn in_group(&self, id: EntityId, group: Group) -> bool {
        self.groups
            .get(&group)
            .is_some_and(|members| members.contains(&id))
    }

    pub fn len(&self, group: Group) -> usize {
        self.groups.get(&group).map_or(0, BTreeSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&SimEntity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SimEntity> {
        self.entities.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEntity> {
        self.entities.values()
    }
}
