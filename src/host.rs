//! Collaborator contracts the pipeline consumes from the host.
//!
//! The host owns entities, scenes, persistence, rendering, audio and scripts.
//! This crate only decides whether and when to call them.

use crate::error::Result;
use crate::types::{Point, SceneId, SceneInfo};
use crate::zone::Zone;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Entity/document model as seen from one peer.
#[async_trait]
pub trait Host: Send + Sync {
    /// Scene this peer is currently viewing.
    fn viewed_scene(&self) -> Option<SceneId>;

    fn scene(&self, scene_id: &str) -> Result<SceneInfo>;

    /// Switch this peer's view to `scene_id`, resolving once the view is ready.
    async fn view_scene(&self, scene_id: &str) -> Result<()>;

    fn is_paused(&self) -> bool;

    async fn set_paused(&self, paused: bool) -> Result<()>;

    /// Zones of a scene in creation order.
    fn zones(&self, scene_id: &str) -> Result<Vec<Zone>>;

    fn zone(&self, scene_id: &str, zone_id: &str) -> Result<Zone>;

    /// Persist a zone mutation. Only the authoritative peer calls this.
    async fn commit_zone(&self, scene_id: &str, zone: &Zone) -> Result<()>;

    /// Presence flag for the entity's movement animation. There is no
    /// completion event, so callers poll.
    fn is_animating(&self, entity_id: &str) -> bool;
}

/// Identifier of a transient visual element on a render layer.
pub type ElementId = u64;

/// Text glyph added for a reaction.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSpec {
    pub text: String,
    pub font_size: f32,
    /// Anchor point (glyph centre).
    pub position: Point,
    pub alpha: f32,
}

/// Target properties of one tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenTarget {
    pub position: Option<Point>,
    pub alpha: Option<f32>,
    pub duration: Duration,
}

/// Rendering/animation engine.
#[async_trait]
pub trait Renderer: Send + Sync {
    fn add_glyph(&self, layer: &str, glyph: GlyphSpec) -> ElementId;

    fn remove_element(&self, layer: &str, element: ElementId);

    /// Resolves when the tween completes.
    async fn tween(&self, element: ElementId, target: TweenTarget);

    /// Current camera zoom.
    fn view_scale(&self) -> f32;

    async fn animate_pan(&self, to: Point, scale: f32, duration: Duration);
}

#[async_trait]
pub trait SoundPlayer: Send + Sync {
    /// Resolves when playback ends.
    async fn play(&self, asset: &str, volume: f32) -> Result<()>;
}

/// A resolved, executable script.
#[async_trait]
pub trait Script: Send + Sync {
    async fn execute(&self) -> Result<()>;
}

pub trait ScriptEngine: Send + Sync {
    /// `None` when the id no longer resolves. Never errors on a missing id.
    fn resolve(&self, script_id: &str) -> Option<Arc<dyn Script>>;
}

/// Visible, non-fatal user notifications.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Everything a session needs from the host, bundled.
#[derive(Clone)]
pub struct Collaborators {
    pub host: Arc<dyn Host>,
    pub renderer: Arc<dyn Renderer>,
    pub sound: Arc<dyn SoundPlayer>,
    pub scripts: Arc<dyn ScriptEngine>,
    pub notifier: Arc<dyn Notifier>,
}
