//! Module settings and runtime tuning.
//!
//! ## Keys (TOML file and/or `TRIPWIRE_*` environment)
//!
//! | Key                            | Default    | Description                                   |
//! |--------------------------------|------------|-----------------------------------------------|
//! | `restrict_authoritative_role`  | `true`     | Authoritative movers never trip zones         |
//! | `allow_cross_scene_warp`       | `false`    | Followers get pulled to the event's scene     |
//! | `disposition_allowlist`        | `friendly` | `friendly`, `friendly_neutral` or `all`       |
//! | `disable_sfx`                  | `false`    | Skip reaction sounds                          |

use crate::types::Disposition;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Which token dispositions may trip a zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DispositionAllowlist {
    #[default]
    Friendly,
    FriendlyNeutral,
    All,
}

impl DispositionAllowlist {
    pub fn allows(&self, disposition: Disposition) -> bool {
        match disposition {
            Disposition::Friendly => true,
            Disposition::Neutral => matches!(self, Self::FriendlyNeutral | Self::All),
            Disposition::Hostile => matches!(self, Self::All),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TripwireSettings {
    pub restrict_authoritative_role: bool,
    pub allow_cross_scene_warp: bool,
    pub disposition_allowlist: DispositionAllowlist,
    pub disable_sfx: bool,
}

impl Default for TripwireSettings {
    fn default() -> Self {
        Self {
            restrict_authoritative_role: true,
            allow_cross_scene_warp: false,
            disposition_allowlist: DispositionAllowlist::Friendly,
            disable_sfx: false,
        }
    }
}

impl TripwireSettings {
    /// Load settings from an optional TOML file, overridden by `TRIPWIRE_*`
    /// environment variables. Missing keys fall back to [`Default`].
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(config::Environment::with_prefix("TRIPWIRE").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

// ---------------------------------------------------------------------------
// Runtime tuning
// ---------------------------------------------------------------------------

/// Timing for the move coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How often to check whether the mover's slide animation has finished.
    pub settle_poll_interval: Duration,
    /// Give up waiting for the slide animation after this long and publish anyway.
    pub settle_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            settle_poll_interval: Duration::from_millis(100),
            settle_timeout: Duration::from_secs(20),
        }
    }
}

/// Presentation parameters for the effect executor.
#[derive(Debug, Clone)]
pub struct EffectConfig {
    pub pan_duration: Duration,
    /// Directory holding `reaction<N>.mp3`.
    pub sound_root: String,
    pub sound_volume: f32,
    /// Render layer the reaction glyph is added to.
    pub reaction_layer: String,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            pan_duration: Duration::from_millis(250),
            sound_root: "modules/tripwire/sounds".into(),
            sound_volume: 0.5,
            reaction_layer: "foreground".into(),
        }
    }
}
