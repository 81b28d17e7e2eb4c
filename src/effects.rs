//! LocalEffectExecutor – what each peer does when a trigger event arrives.
//!
//! Every step is gated by a predicate from [`crate::policy`] over this peer's
//! role, its viewed scene and the current settings:
//!
//! | Step            | Runs when                                          |
//! |-----------------|----------------------------------------------------|
//! | anything at all | authoritative, viewing the scene, or warp allowed  |
//! | scene switch    | not already viewing the event's scene              |
//! | pause           | authoritative                                      |
//! | zone commit     | authoritative and the zone is not yet fired        |
//! | script          | authoritative and the zone has a script            |
//! | camera pan      | always (after the gate)                            |
//! | glyph animation | reaction is not `NONE`                             |
//! | sound           | reaction is not `NONE` and SFX are enabled         |
//!
//! Pan and reaction run concurrently; the handler resolves once both finish.

use crate::channel::TriggerHandler;
use crate::error::{Result, TripwireError};
use crate::host::Collaborators;
use crate::policy::{self, ViewContext};
use crate::protocol::TriggerEvent;
use crate::reaction;
use crate::settings::{EffectConfig, TripwireSettings};
use crate::types::{Point, Role};
use crate::zone::{self, Zone};
use async_trait::async_trait;
use log::{debug, error, warn};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Result of handling one event on this peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutcome {
    /// The peer's game was left untouched.
    Ignored,
    Applied,
}

pub struct LocalEffectExecutor {
    role: Role,
    collaborators: Collaborators,
    settings: Arc<RwLock<TripwireSettings>>,
    config: EffectConfig,
    applied: AtomicU64,
}

impl LocalEffectExecutor {
    pub fn new(
        role: Role,
        collaborators: Collaborators,
        settings: Arc<RwLock<TripwireSettings>>,
        config: EffectConfig,
    ) -> Self {
        Self {
            role,
            collaborators,
            settings,
            config,
            applied: AtomicU64::new(0),
        }
    }

    /// Number of events whose effects ran on this peer.
    pub fn applied_count(&self) -> u64 {
        self.applied.load(Ordering::SeqCst)
    }

    pub async fn on_trigger_event(&self, event: &TriggerEvent) -> Result<EffectOutcome> {
        let host = &self.collaborators.host;
        let viewed = host.viewed_scene();
        let view = ViewContext {
            viewed_scene: viewed.as_deref(),
            event_scene: &event.scene_id,
        };

        let (allowed, sfx) = {
            let settings = self.settings.read();
            (
                policy::can_change_game(self.role, view, &settings),
                policy::should_play_sound(event.reaction_type, &settings),
            )
        };
        if !allowed {
            debug!(
                "[tripwire] Ignoring trigger in scene {} (viewing {:?})",
                event.scene_id, viewed
            );
            return Ok(EffectOutcome::Ignored);
        }

        if policy::should_switch_scene(view) {
            host.view_scene(&event.scene_id).await?;
        }
        let scene = host.scene(&event.scene_id)?;

        if policy::should_pause(self.role) {
            host.set_paused(true).await?;
        }

        // Zone bookkeeping failures must not stop the pan or reaction.
        match host.zone(&event.scene_id, &event.zone_id) {
            Ok(zone) => self.apply_zone_effects(event, zone).await,
            Err(e) => warn!("[tripwire] {}", e),
        }

        let anchor = event
            .position
            .centred(event.footprint.size(scene.grid_size))
            .rounded();
        let scale = self.collaborators.renderer.view_scale().max(1.0);

        tokio::join!(
            self.collaborators
                .renderer
                .animate_pan(event.position, scale, self.config.pan_duration),
            self.play_reaction(event, anchor, scene.grid_size, sfx),
        );

        self.applied.fetch_add(1, Ordering::SeqCst);
        Ok(EffectOutcome::Applied)
    }

    /// Commit the fired flag (if the mover could not) and run the script.
    async fn apply_zone_effects(&self, event: &TriggerEvent, mut zone: Zone) {
        if policy::should_commit_zone(self.role) && !zone::is_fired(&zone) {
            zone::mark_fired(&mut zone);
            if let Err(e) = self
                .collaborators
                .host
                .commit_zone(&event.scene_id, &zone)
                .await
            {
                error!("[tripwire] {}", e);
            }
        }

        if !policy::should_fire_script(self.role) {
            return;
        }
        let Some(script_id) = zone::script(&zone) else {
            return;
        };
        match self.collaborators.scripts.resolve(script_id) {
            Some(script) => {
                if let Err(e) = script.execute().await {
                    let e = TripwireError::Script {
                        script: script_id.to_string(),
                        reason: e.to_string(),
                    };
                    error!("[tripwire] {}", e);
                }
            }
            None => {
                warn!(
                    "[tripwire] Script {} on zone {} no longer exists",
                    script_id, event.zone_id
                );
                self.collaborators
                    .notifier
                    .error("The script triggered by the tripwire zone no longer exists.");
            }
        }
    }

    async fn play_reaction(
        &self,
        event: &TriggerEvent,
        anchor: Point,
        grid_size: f32,
        sfx: bool,
    ) {
        if !policy::should_animate(event.reaction_type) {
            return;
        }
        let animation = reaction::animate(
            self.collaborators.renderer.as_ref(),
            &self.config.reaction_layer,
            event.reaction_type,
            anchor,
            grid_size,
        );
        if sfx {
            tokio::join!(
                animation,
                reaction::play_sound(
                    self.collaborators.sound.as_ref(),
                    &self.config.sound_root,
                    event.reaction_type,
                    self.config.sound_volume,
                ),
            );
        } else {
            animation.await;
        }
    }
}

#[async_trait]
impl TriggerHandler for LocalEffectExecutor {
    async fn handle(&self, event: TriggerEvent) -> Result<()> {
        self.on_trigger_event(&event).await.map(|_| ())
    }
}
