//! Reaction playback: the floating glyph plus its sound.
//!
//! ```text
//! STAGED (alpha 0) → RISE → HOLD_HIGH → BOB_DOWN → BOB_UP → SETTLE → FADE → REMOVED
//! ```
//!
//! Offsets are multiples of one grid cell above the anchor. Each stage starts
//! when the previous tween completes; the glyph is removed after `FADE`.

use crate::host::{GlyphSpec, Renderer, SoundPlayer, TweenTarget};
use crate::types::Point;
use crate::zone::ReactionType;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionStage {
    Staged,
    Rise,
    HoldHigh,
    BobDown,
    BobUp,
    Settle,
    Fade,
    Removed,
}

/// One tween of the sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageStep {
    pub stage: ReactionStage,
    /// Vertical offset in grid cells (negative is up); `None` keeps position.
    pub rise_cells: Option<f32>,
    pub alpha: Option<f32>,
    pub duration: Duration,
}

const fn step(
    stage: ReactionStage,
    rise_cells: Option<f32>,
    alpha: Option<f32>,
    millis: u64,
) -> StageStep {
    StageStep {
        stage,
        rise_cells,
        alpha,
        duration: Duration::from_millis(millis),
    }
}

/// The tween stages between `Staged` and `Removed`, in order.
pub const STAGES: [StageStep; 6] = [
    step(ReactionStage::Rise, Some(-0.25), Some(1.0), 150),
    step(ReactionStage::HoldHigh, Some(-1.25), None, 100),
    step(ReactionStage::BobDown, Some(-0.85), None, 100),
    step(ReactionStage::BobUp, Some(-0.95), None, 45),
    step(ReactionStage::Settle, Some(-0.85), None, 45),
    step(ReactionStage::Fade, None, Some(0.0), 2500),
];

impl StageStep {
    pub fn target(&self, anchor: Point, grid_size: f32) -> TweenTarget {
        TweenTarget {
            position: self
                .rise_cells
                .map(|cells| Point::new(anchor.x, anchor.y + grid_size * cells)),
            alpha: self.alpha,
            duration: self.duration,
        }
    }
}

pub fn font_size(grid_size: f32) -> f32 {
    (grid_size * 0.6).round()
}

pub fn sound_asset(root: &str, reaction: ReactionType) -> String {
    format!("{}/reaction{}.mp3", root.trim_end_matches('/'), reaction.code())
}

/// Run the glyph animation to completion. No-op for [`ReactionType::None`].
pub async fn animate(
    renderer: &dyn Renderer,
    layer: &str,
    reaction: ReactionType,
    anchor: Point,
    grid_size: f32,
) {
    let Some(text) = reaction.glyph() else {
        return;
    };

    let element = renderer.add_glyph(
        layer,
        GlyphSpec {
            text: text.to_string(),
            font_size: font_size(grid_size),
            position: anchor,
            alpha: 0.0,
        },
    );
    log::trace!("[tripwire] glyph {} {:?}", element, ReactionStage::Staged);

    for step in STAGES.iter() {
        renderer.tween(element, step.target(anchor, grid_size)).await;
        log::trace!("[tripwire] glyph {} {:?}", element, step.stage);
    }

    renderer.remove_element(layer, element);
    log::trace!("[tripwire] glyph {} {:?}", element, ReactionStage::Removed);
}

/// Play the reaction sound and wait for it to end. Failures are logged.
pub async fn play_sound(sound: &dyn SoundPlayer, root: &str, reaction: ReactionType, volume: f32) {
    let asset = sound_asset(root, reaction);
    if let Err(e) = sound.play(&asset, volume).await {
        log::warn!("[tripwire] Failed to play {}: {}", asset, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_in_order() {
        let order: Vec<_> = STAGES.iter().map(|s| s.stage).collect();
        assert_eq!(
            order,
            vec![
                ReactionStage::Rise,
                ReactionStage::HoldHigh,
                ReactionStage::BobDown,
                ReactionStage::BobUp,
                ReactionStage::Settle,
                ReactionStage::Fade,
            ]
        );
    }

    #[test]
    fn offsets_scale_with_grid() {
        let t = STAGES[1].target(Point::new(75.0, 75.0), 100.0);
        assert_eq!(t.position, Some(Point::new(75.0, -50.0)));
        assert_eq!(t.alpha, None);

        let fade = STAGES[5].target(Point::new(75.0, 75.0), 100.0);
        assert_eq!(fade.position, None);
        assert_eq!(fade.alpha, Some(0.0));
    }

    #[test]
    fn sound_asset_uses_reaction_code() {
        assert_eq!(
            sound_asset("modules/tripwire/sounds/", ReactionType::Question),
            "modules/tripwire/sounds/reaction2.mp3"
        );
        assert_eq!(font_size(50.0), 30.0);
    }
}
