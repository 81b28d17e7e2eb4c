//! Tripwire wire protocol.
//!
//! This module owns **every message that crosses the broadcast channel**
//! between peers of a session.
//!
//! ## Channels
//!
//! | Channel           | Direction        | Payload         |
//! |-------------------|------------------|-----------------|
//! | `module.tripwire` | initiator → all  | `TriggerEvent`  |
//!
//! ## Design rules
//!
//! 1. Every struct must be `Serialize + Deserialize` with camelCase JSON, the
//!    host's native casing.
//! 2. Events are self-contained: a peer reproduces every local effect from the
//!    payload alone.
//! 3. No sequence numbers or acknowledgements; delivery is best-effort.
//! 4. New fields must be optional (`#[serde(default)]`) so older peers keep
//!    decoding.

use crate::types::{EntityId, Footprint, Point, SceneId, ZoneId};
use crate::zone::ReactionType;
use serde::{Deserialize, Serialize};

/// A zone fired. Published by the peer whose user moved the token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    pub entity_id: EntityId,
    pub zone_id: ZoneId,
    pub scene_id: SceneId,
    /// Post-move top-left position of the entity; the camera pans here.
    pub position: Point,
    pub reaction_type: ReactionType,
    /// Mover's footprint in grid cells, used to centre the reaction glyph.
    #[serde(default)]
    pub footprint: Footprint,
}

impl TriggerEvent {
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Channel names used by the protocol, as constants.
pub mod channels {
    /// Scoped to this module so other host modules never see our traffic.
    pub const TRIGGER: &str = "module.tripwire";
}
