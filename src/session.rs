//! SessionContext – everything one peer runs while a scene is active.
//!
//! Built when a scene becomes active, torn down when the scene changes. There
//! is no module-level state: hosts hold the context and route notifications
//! through it.

use crate::channel::{BroadcastChannel, Subscription, Transport, TriggerHandler};
use crate::coordinator::{MoveCoordinator, MoveOutcome};
use crate::effects::LocalEffectExecutor;
use crate::error::Result;
use crate::host::Collaborators;
use crate::settings::{CoordinatorConfig, EffectConfig, TripwireSettings};
use crate::types::{EntitySnapshot, MoveUpdate, Role, SceneId};
use crate::zone::{self, Zone, ZoneDraft, ZoneUpdate};
use log::{debug, info};
use parking_lot::RwLock;
use std::sync::Arc;

/// Construction parameters for a [`SessionContext`].
#[derive(Clone)]
pub struct SessionOptions {
    pub role: Role,
    pub settings: Arc<RwLock<TripwireSettings>>,
    pub coordinator: CoordinatorConfig,
    pub effects: EffectConfig,
}

impl SessionOptions {
    pub fn new(role: Role, settings: TripwireSettings) -> Self {
        Self {
            role,
            settings: Arc::new(RwLock::new(settings)),
            coordinator: CoordinatorConfig::default(),
            effects: EffectConfig::default(),
        }
    }
}

pub struct SessionContext {
    scene_id: SceneId,
    coordinator: MoveCoordinator,
    executor: Arc<LocalEffectExecutor>,
    subscription: Subscription,
}

impl SessionContext {
    /// Activate the pipeline for `scene_id` and start listening for trigger
    /// events.
    pub fn activate(
        scene_id: impl Into<SceneId>,
        options: SessionOptions,
        collaborators: Collaborators,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let scene_id = scene_id.into();
        let channel = BroadcastChannel::new(transport);

        let executor = Arc::new(LocalEffectExecutor::new(
            options.role,
            collaborators.clone(),
            options.settings.clone(),
            options.effects,
        ));
        let subscription = channel.subscribe(executor.clone() as Arc<dyn TriggerHandler>)?;

        let coordinator = MoveCoordinator::new(
            options.role,
            collaborators.host,
            channel,
            options.settings,
            options.coordinator,
        );

        info!(
            "[tripwire] Session active for scene {} as {}",
            scene_id, options.role
        );

        Ok(Self {
            scene_id,
            coordinator,
            executor,
            subscription,
        })
    }

    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    pub fn coordinator(&self) -> &MoveCoordinator {
        &self.coordinator
    }

    pub fn executor(&self) -> &LocalEffectExecutor {
        &self.executor
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.is_active()
    }

    // -----------------------------------------------------------------------
    // Host notification entry points
    // -----------------------------------------------------------------------

    pub fn on_pre_move(&self, entity: &EntitySnapshot) {
        if entity.scene_id != self.scene_id {
            return;
        }
        self.coordinator.register_pre_move(entity);
    }

    pub async fn on_move(&self, update: &MoveUpdate) -> Option<MoveOutcome> {
        if update.entity.scene_id != self.scene_id {
            debug!(
                "[tripwire] Ignoring move of {} in inactive scene {}",
                update.entity.id, update.entity.scene_id
            );
            return None;
        }
        Some(self.coordinator.coordinate_update(update).await)
    }

    /// Normalise placement-form fields before a tile is created.
    pub fn on_zone_pre_create(&self, zone: &mut Zone, draft: &ZoneDraft) -> bool {
        zone::apply_draft(zone, draft)
    }

    /// Sanitise a tile update before it is persisted.
    pub fn on_zone_pre_update(&self, zone: &Zone, update: &mut ZoneUpdate) -> bool {
        zone::sanitize_update(zone, update)
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Stop listening and forget pending pre-move positions.
    pub fn teardown(mut self) {
        self.subscription.unsubscribe();
        self.coordinator.cache().clear();
        info!("[tripwire] Session for scene {} torn down", self.scene_id);
    }
}
