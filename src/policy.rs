//! Pure gating predicates over `(role, viewing context, settings)`.
//!
//! Every side effect in the pipeline asks one of these before it runs. None of
//! them touch host state.

use crate::settings::TripwireSettings;
use crate::types::{Disposition, MoveUpdate, Role};
use crate::zone::ReactionType;
use serde::Serialize;

/// Why a move notification was not evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Another peer's user made the move; that peer coordinates it.
    RemoteMove,
    /// The update did not touch `x` or `y`.
    NoMovement,
    Paused,
    /// Authoritative movers are restricted by settings.
    RoleRestricted,
    DispositionNotAllowed,
    /// No pre-move position was cached (lightweight update).
    NoPriorPosition,
}

/// Gate a move notification before any geometry runs. `None` means evaluate.
pub fn move_skip_reason(
    update: &MoveUpdate,
    paused: bool,
    role: Role,
    settings: &TripwireSettings,
) -> Option<SkipReason> {
    if !update.initiated_locally {
        return Some(SkipReason::RemoteMove);
    }
    if paused {
        return Some(SkipReason::Paused);
    }
    if !update.change.is_move() {
        return Some(SkipReason::NoMovement);
    }
    if !is_user_allowed(role, settings) {
        return Some(SkipReason::RoleRestricted);
    }
    if !is_disposition_allowed(update.entity.disposition, settings) {
        return Some(SkipReason::DispositionNotAllowed);
    }
    None
}

pub fn is_user_allowed(role: Role, settings: &TripwireSettings) -> bool {
    !(role.is_authoritative() && settings.restrict_authoritative_role)
}

pub fn is_disposition_allowed(disposition: Disposition, settings: &TripwireSettings) -> bool {
    settings.disposition_allowlist.allows(disposition)
}

// ---------------------------------------------------------------------------
// Effect gating
// ---------------------------------------------------------------------------

/// Local viewing context of a peer when an event arrives.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub viewed_scene: Option<&'a str>,
    pub event_scene: &'a str,
}

impl ViewContext<'_> {
    pub fn is_viewing_event_scene(&self) -> bool {
        self.viewed_scene == Some(self.event_scene)
    }
}

/// May this peer's game be changed (scene switch, pan, reaction) for the event?
pub fn can_change_game(role: Role, view: ViewContext<'_>, settings: &TripwireSettings) -> bool {
    role.is_authoritative() || view.is_viewing_event_scene() || settings.allow_cross_scene_warp
}

pub fn should_switch_scene(view: ViewContext<'_>) -> bool {
    !view.is_viewing_event_scene()
}

pub fn should_pause(role: Role) -> bool {
    role.is_authoritative()
}

pub fn should_commit_zone(role: Role) -> bool {
    role.is_authoritative()
}

pub fn should_fire_script(role: Role) -> bool {
    role.is_authoritative()
}

pub fn should_animate(reaction: ReactionType) -> bool {
    reaction != ReactionType::None
}

pub fn should_play_sound(reaction: ReactionType, settings: &TripwireSettings) -> bool {
    should_animate(reaction) && !settings.disable_sfx
}
