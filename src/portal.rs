use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::geometry::Aabb;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalKind {
    Entry,
    Exit,
}

/// Static trigger volume. Pairing is done by the level, not by the portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Portal {
    pub kind: PortalKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortalPair {
    pub entry: EntityId,
    pub exit: EntityId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalSlot {
    Primary,
    Secondary,
}

/// Up to two independent pairs per level; absent pairs are `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PortalLinks {
    pub primary: Option<PortalPair>,
    pub secondary: Option<PortalPair>,
}

impl PortalLinks {
    /// Looks up the rectangles of every present pair.
    ///
    /// # Panics
    /// When a present pair names a portal that `lookup` cannot find. A pair is
    /// only ever linked to live portals, so this is a setup bug.
    pub fn resolve(&self, lookup: impl Fn(EntityId) -> Option<Aabb>) -> ResolvedPortals {
        let resolve_pair = |slot: PortalSlot, pair: Option<PortalPair>| {
            pair.map(|pair| {
                let fetch = |id: EntityId| {
                    lookup(id).unwrap_or_else(|| {
                        panic!("{slot:?} portal pair references missing portal {id:?}")
                    })
                };
                PairBounds {
                    entry: fetch(pair.entry),
                    exit: fetch(pair.exit),
                }
            })
        };
        ResolvedPortals {
            primary: resolve_pair(PortalSlot::Primary, self.primary),
            secondary: resolve_pair(PortalSlot::Secondary, self.secondary),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairBounds {
    pub entry: Aabb,
    pub exit: Aabb,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResolvedPortals {
    pub primary: Option<PairBounds>,
    pub secondary: Option<PairBounds>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Teleport {
    pub slot: PortalSlot,
    /// Side of the pair the entity was standing in.
    pub from: PortalKind,
}

/// Warps `bounds` through the first overlapped portal. The secondary pair is
/// checked before the primary one.
///
/// Entering the entry side lands with the bottom edge on the exit portal's
/// top; entering the exit side lands with the top edge on the entry portal's
/// top. The two directions are intentionally not mirror images.
pub fn try_teleport(bounds: &mut Aabb, portals: &ResolvedPortals) -> Option<Teleport> {
    let ordered = [
        (PortalSlot::Secondary, portals.secondary),
        (PortalSlot::Primary, portals.primary),
    ];
    for (slot, pair) in ordered {
        let Some(pair) = pair else {
            continue;
        };
        if bounds.intersects(&pair.entry) {
            bounds.set_center_x(pair.exit.center_x());
            bounds.set_bottom(pair.exit.top());
            return Some(Teleport {
                slot,
                from: PortalKind::Entry,
            });
        } else if bounds.intersects(&pair.exit) {
            bounds.set_center_x(pair.entry.center_x());
            bounds.set_top(pair.entry.top());
            return Some(Teleport {
                slot,
                from: PortalKind::Exit,
            });
        }
    }
    None
}
