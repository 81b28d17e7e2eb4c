//! Trigger evaluation: which zone, if any, does a move newly trip?
//!
//! Zones are checked in the order the host returns them (creation order) and
//! the search stops at the first hit, so at most one zone fires per move even
//! when overlapping zones are crossed together.

use crate::geometry;
use crate::types::{EntitySnapshot, Point};
use crate::zone::{self, Zone};

/// First persisted, enabled, un-fired zone crossed by `entity`'s move from
/// `before` to its current position.
pub fn evaluate<'a>(
    zones: &'a [Zone],
    entity: &EntitySnapshot,
    before: Point,
    grid_size: f32,
) -> Option<&'a Zone> {
    let footprint = entity.footprint.size(grid_size);
    zones
        .iter()
        .filter(|z| z.id.is_some())
        .find(|z| {
            zone::is_zone(z, None)
                && !zone::is_fired(z)
                && geometry::intersects(&z.bounds, before, entity.position, footprint)
        })
}
