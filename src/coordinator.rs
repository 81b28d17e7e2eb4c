//! MoveCoordinator – turns host move notifications into trigger events.
//!
//! ## Per-entity lifecycle
//!
//! ```text
//! IDLE ──pre-move──▶ AWAITING_MOVE ──move──▶ EVALUATING ─┬─▶ TRIGGERED ─────┐
//!                                                        └─▶ NOT_TRIGGERED ─┴─▶ IDLE
//! ```
//!
//! The cache entry written on pre-move is removed on every exit from
//! `EVALUATING`, including gate rejections, errors and cancellation.
//!
//! On a hit the coordinator, in order:
//! 1. marks and commits the zone (authoritative peer only),
//! 2. waits for the mover's slide animation to settle (bounded poll),
//! 3. publishes a [`TriggerEvent`] on the broadcast channel.

use crate::cache::{CacheCleanup, PositionCache};
use crate::channel::BroadcastChannel;
use crate::error::Result;
use crate::evaluator;
use crate::host::Host;
use crate::policy::{self, SkipReason};
use crate::protocol::TriggerEvent;
use crate::settings::{CoordinatorConfig, TripwireSettings};
use crate::types::{EntitySnapshot, MoveUpdate, Role};
use crate::wait::{await_condition, WaitOutcome};
use crate::zone;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

/// How a single move notification ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Gates rejected the move before evaluation.
    Skipped(SkipReason),
    NotTriggered,
    Triggered(TriggerEvent),
    /// A collaborator failed; already logged.
    Failed,
}

impl MoveOutcome {
    pub fn event(&self) -> Option<&TriggerEvent> {
        match self {
            MoveOutcome::Triggered(event) => Some(event),
            _ => None,
        }
    }
}

pub struct MoveCoordinator {
    role: Role,
    host: Arc<dyn Host>,
    channel: BroadcastChannel,
    settings: Arc<RwLock<TripwireSettings>>,
    config: CoordinatorConfig,
    cache: PositionCache,
}

impl MoveCoordinator {
    pub fn new(
        role: Role,
        host: Arc<dyn Host>,
        channel: BroadcastChannel,
        settings: Arc<RwLock<TripwireSettings>>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            role,
            host,
            channel,
            settings,
            config,
            cache: PositionCache::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    // -----------------------------------------------------------------------
    // Host notifications
    // -----------------------------------------------------------------------

    /// "A move is about to happen": remember where the entity stands now.
    pub fn register_pre_move(&self, entity: &EntitySnapshot) {
        self.cache.register(entity.id.clone(), entity.position);
    }

    /// "A move happened": gate, evaluate, and fire at most one zone.
    ///
    /// Never returns an error; failures are logged and reported as
    /// [`MoveOutcome::Failed`].
    pub async fn coordinate_update(&self, update: &MoveUpdate) -> MoveOutcome {
        let started = Instant::now();
        let _cleanup = CacheCleanup::new(&self.cache, &update.entity.id);

        let outcome = match self.evaluate_and_fire(update).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("[tripwire] {}", e);
                MoveOutcome::Failed
            }
        };

        debug!(
            "[tripwire] `coordinate_update` for {} took {:?}",
            update.entity.id,
            started.elapsed()
        );
        outcome
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    async fn evaluate_and_fire(&self, update: &MoveUpdate) -> Result<MoveOutcome> {
        let entity = &update.entity;

        let skip = {
            let settings = self.settings.read();
            policy::move_skip_reason(update, self.host.is_paused(), self.role, &settings)
        };
        if let Some(reason) = skip {
            return Ok(MoveOutcome::Skipped(reason));
        }

        // Lightweight updates bypass the pre-move notification; nothing to do.
        let Some(before) = self.cache.get(&entity.id) else {
            return Ok(MoveOutcome::Skipped(SkipReason::NoPriorPosition));
        };

        let scene = self.host.scene(&entity.scene_id)?;
        let zones = self.host.zones(&scene.id)?;

        let Some(hit) = evaluator::evaluate(&zones, entity, before, scene.grid_size) else {
            return Ok(MoveOutcome::NotTriggered);
        };
        let mut fired = hit.clone();
        let zone_id = fired.id.clone().unwrap_or_default();

        info!(
            "[tripwire] {} crossed zone {} in scene {}",
            entity.id, zone_id, scene.id
        );

        if policy::should_commit_zone(self.role) {
            zone::mark_fired(&mut fired);
            self.host.commit_zone(&scene.id, &fired).await?;
        }

        self.await_movement_settled(&entity.id).await;

        let event = TriggerEvent {
            entity_id: entity.id.clone(),
            zone_id,
            scene_id: scene.id.clone(),
            position: entity.position,
            reaction_type: zone::reaction(&fired),
            footprint: entity.footprint,
        };
        self.channel.publish(&event).await;

        Ok(MoveOutcome::Triggered(event))
    }

    /// Wait until the host no longer reports a slide animation for the
    /// entity, so peers don't react before the token arrives.
    async fn await_movement_settled(&self, entity_id: &str) {
        let host = self.host.clone();
        let outcome = await_condition(
            || !host.is_animating(entity_id),
            self.config.settle_poll_interval,
            self.config.settle_timeout,
        )
        .await;

        if outcome == WaitOutcome::TimedOut {
            warn!(
                "[tripwire] Movement of {} still animating after {:?}; publishing anyway",
                entity_id, self.config.settle_timeout
            );
        }
    }
}
