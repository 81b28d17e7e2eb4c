//! Zone state model: the trigger flags attached to a map tile.
//!
//! `markFired` is the single authoritative mutation. Callers guarantee it runs
//! at most once per zone by checking [`is_fired`] first.

use crate::types::{Rect, ZoneId};
use serde::{Deserialize, Serialize};

/// Active-tool name of the zone placement control.
pub const PLACEMENT_TOOL: &str = "tripwireZone";

/// Tile texture for a zone that has not fired yet.
pub const TEXTURE_STOP: &str = "modules/tripwire/img/tripwire_stop.png";
/// Tile texture for a zone that has fired.
pub const TEXTURE_GO: &str = "modules/tripwire/img/tripwire_go.png";

// ---------------------------------------------------------------------------
// Reaction type
// ---------------------------------------------------------------------------

/// The glyph shown when a zone fires. Numeric codes match the sound assets
/// (`reaction<N>.mp3`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionType {
    #[default]
    None,
    Exclamation,
    Question,
    Info,
}

impl ReactionType {
    pub fn code(&self) -> u8 {
        match self {
            ReactionType::None => 0,
            ReactionType::Exclamation => 1,
            ReactionType::Question => 2,
            ReactionType::Info => 3,
        }
    }

    /// Text rendered for the reaction, `None` for [`ReactionType::None`].
    pub fn glyph(&self) -> Option<&'static str> {
        match self {
            ReactionType::None => None,
            ReactionType::Exclamation => Some("!"),
            ReactionType::Question => Some("?"),
            ReactionType::Info => Some("ⓘ"),
        }
    }
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// Persistent module data stored on the tile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZoneFlags {
    pub enabled: bool,
    pub triggered: bool,
    pub reaction: ReactionType,
    pub script: Option<String>,
}

/// A map tile as seen by this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    /// Host id; `None` while the tile is still being placed.
    #[serde(default)]
    pub id: Option<ZoneId>,
    pub bounds: Rect,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub flags: ZoneFlags,
    #[serde(default)]
    pub texture: Option<String>,
}

impl Zone {
    /// A persisted, enabled, un-fired zone.
    pub fn new(id: impl Into<ZoneId>, bounds: Rect, reaction: ReactionType) -> Self {
        Self {
            id: Some(id.into()),
            bounds,
            rotation: 0.0,
            flags: ZoneFlags {
                enabled: true,
                triggered: false,
                reaction,
                script: None,
            },
            texture: Some(TEXTURE_STOP.into()),
        }
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.flags.script = normalize_script(Some(script.into()));
        self
    }

    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("<unplaced>")
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

/// Is this tile a trigger zone?
///
/// A tile that is still being placed (no id yet) counts when the active tool
/// is the zone placement tool.
pub fn is_zone(zone: &Zone, active_tool: Option<&str>) -> bool {
    if zone.id.is_some() {
        return zone.flags.enabled;
    }
    zone.flags.enabled || active_tool == Some(PLACEMENT_TOOL)
}

pub fn is_fired(zone: &Zone) -> bool {
    zone.flags.triggered
}

/// Mark the zone as fired and swap to the "go" texture.
pub fn mark_fired(zone: &mut Zone) -> &mut Zone {
    zone.flags.triggered = true;
    zone.texture = Some(TEXTURE_GO.into());
    zone
}

pub fn reaction(zone: &Zone) -> ReactionType {
    zone.flags.reaction
}

pub fn script(zone: &Zone) -> Option<&str> {
    zone.flags.script.as_deref()
}

/// Texture a zone should display for its current state.
pub fn texture_for(zone: &Zone) -> &'static str {
    if is_fired(zone) {
        TEXTURE_GO
    } else {
        TEXTURE_STOP
    }
}

// ---------------------------------------------------------------------------
// Placement / update normalisation
// ---------------------------------------------------------------------------

/// Transient fields supplied by the placement form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZoneDraft {
    pub is_zone: bool,
    pub reaction: Option<ReactionType>,
    pub script_id: Option<String>,
}

/// Convert a placement draft into persistent flags before the tile is
/// committed. Returns `false` when the draft is not a zone (tile untouched).
pub fn apply_draft(zone: &mut Zone, draft: &ZoneDraft) -> bool {
    if !draft.is_zone {
        return false;
    }
    zone.flags = ZoneFlags {
        enabled: true,
        triggered: false,
        reaction: draft.reaction.unwrap_or_default(),
        script: normalize_script(draft.script_id.clone()),
    };
    zone.rotation = 0.0;
    zone.texture = Some(TEXTURE_STOP.into());
    true
}

/// Pending host update to an existing tile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZoneUpdate {
    pub rotation: Option<f32>,
    pub reaction: Option<ReactionType>,
    pub script_id: Option<String>,
}

/// Sanitise an update before persistence: enabled zones stay axis-aligned.
/// Returns `true` when a rotation was rejected.
pub fn sanitize_update(zone: &Zone, update: &mut ZoneUpdate) -> bool {
    if !zone.flags.enabled {
        return false;
    }
    match update.rotation {
        Some(r) if r != 0.0 => {
            log::debug!(
                "[tripwire] Rejecting rotation {} on zone {}",
                r,
                zone.id_str()
            );
            update.rotation = Some(0.0);
            true
        }
        _ => false,
    }
}

/// Apply a sanitised update to the zone.
pub fn apply_update(zone: &mut Zone, update: &ZoneUpdate) {
    if let Some(r) = update.rotation {
        zone.rotation = r;
    }
    if let Some(reaction) = update.reaction {
        zone.flags.reaction = reaction;
    }
    if update.script_id.is_some() {
        zone.flags.script = normalize_script(update.script_id.clone());
    }
}

/// `""` and `"0"` are the form's "no script" values.
fn normalize_script(script: Option<String>) -> Option<String> {
    script.filter(|s| !s.is_empty() && s != "0")
}
