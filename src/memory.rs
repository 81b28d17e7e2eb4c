//! In-memory collaborators.
//!
//! `MemoryWorld` is the shared, authoritative store (scenes, zones, pause
//! flag); each peer gets its own `MemoryHost` view of it plus recording
//! renderer/sound/notifier doubles. Used by the simulator binary and tests.

use crate::error::{Result, TripwireError};
use crate::host::{
    Collaborators, ElementId, GlyphSpec, Host, Notifier, Renderer, Script, ScriptEngine,
    SoundPlayer, TweenTarget,
};
use crate::types::{EntityId, Point, SceneId, SceneInfo};
use crate::zone::Zone;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Shared world
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct SceneState {
    info: SceneInfo,
    zones: Vec<Zone>,
}

#[derive(Debug, Default)]
struct WorldState {
    scenes: HashMap<SceneId, SceneState>,
    paused: bool,
    commits: HashMap<String, u32>,
}

/// Durable session state shared by every peer.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    state: Mutex<WorldState>,
}

impl MemoryWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_scene(&self, id: impl Into<SceneId>, grid_size: f32) {
        let id = id.into();
        self.state.lock().scenes.insert(
            id.clone(),
            SceneState {
                info: SceneInfo { id, grid_size },
                zones: Vec::new(),
            },
        );
    }

    /// Append a zone; creation order is evaluation order.
    pub fn add_zone(&self, scene_id: &str, zone: Zone) -> Result<()> {
        let mut state = self.state.lock();
        let scene = state
            .scenes
            .get_mut(scene_id)
            .ok_or_else(|| TripwireError::SceneNotFound(scene_id.to_string()))?;
        scene.zones.push(zone);
        Ok(())
    }

    pub fn zone(&self, scene_id: &str, zone_id: &str) -> Option<Zone> {
        let state = self.state.lock();
        state
            .scenes
            .get(scene_id)?
            .zones
            .iter()
            .find(|z| z.id.as_deref() == Some(zone_id))
            .cloned()
    }

    pub fn zones(&self, scene_id: &str) -> Vec<Zone> {
        self.state
            .lock()
            .scenes
            .get(scene_id)
            .map(|s| s.zones.clone())
            .unwrap_or_default()
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.lock().paused = paused;
    }

    /// How many times a zone has been committed.
    pub fn commit_count(&self, zone_id: &str) -> u32 {
        self.state.lock().commits.get(zone_id).copied().unwrap_or(0)
    }

    fn scene_info(&self, scene_id: &str) -> Result<SceneInfo> {
        self.state
            .lock()
            .scenes
            .get(scene_id)
            .map(|s| s.info.clone())
            .ok_or_else(|| TripwireError::SceneNotFound(scene_id.to_string()))
    }

    fn replace_zone(&self, scene_id: &str, zone: &Zone) -> Result<()> {
        let zone_id = zone.id.clone().unwrap_or_default();
        let mut state = self.state.lock();
        let scene = state
            .scenes
            .get_mut(scene_id)
            .ok_or_else(|| TripwireError::SceneNotFound(scene_id.to_string()))?;
        let slot = scene
            .zones
            .iter_mut()
            .find(|z| z.id.as_deref() == Some(zone_id.as_str()))
            .ok_or_else(|| TripwireError::ZoneNotFound {
                zone: zone_id.clone(),
                scene: scene_id.to_string(),
            })?;
        *slot = zone.clone();
        *state.commits.entry(zone_id).or_default() += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Per-peer host view
// ---------------------------------------------------------------------------

pub struct MemoryHost {
    world: Arc<MemoryWorld>,
    viewed: Mutex<Option<SceneId>>,
    animating: Mutex<HashSet<EntityId>>,
}

impl MemoryHost {
    pub fn new(world: Arc<MemoryWorld>, viewed: Option<&str>) -> Self {
        Self {
            world,
            viewed: Mutex::new(viewed.map(str::to_string)),
            animating: Mutex::new(HashSet::new()),
        }
    }

    pub fn world(&self) -> &Arc<MemoryWorld> {
        &self.world
    }

    pub fn set_animating(&self, entity_id: &str, animating: bool) {
        let mut set = self.animating.lock();
        if animating {
            set.insert(entity_id.to_string());
        } else {
            set.remove(entity_id);
        }
    }
}

#[async_trait]
impl Host for MemoryHost {
    fn viewed_scene(&self) -> Option<SceneId> {
        self.viewed.lock().clone()
    }

    fn scene(&self, scene_id: &str) -> Result<SceneInfo> {
        self.world.scene_info(scene_id)
    }

    async fn view_scene(&self, scene_id: &str) -> Result<()> {
        self.world.scene_info(scene_id)?;
        *self.viewed.lock() = Some(scene_id.to_string());
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.world.is_paused()
    }

    async fn set_paused(&self, paused: bool) -> Result<()> {
        self.world.set_paused(paused);
        Ok(())
    }

    fn zones(&self, scene_id: &str) -> Result<Vec<Zone>> {
        self.world.scene_info(scene_id)?;
        Ok(self.world.zones(scene_id))
    }

    fn zone(&self, scene_id: &str, zone_id: &str) -> Result<Zone> {
        self.world
            .zone(scene_id, zone_id)
            .ok_or_else(|| TripwireError::ZoneNotFound {
                zone: zone_id.to_string(),
                scene: scene_id.to_string(),
            })
    }

    async fn commit_zone(&self, scene_id: &str, zone: &Zone) -> Result<()> {
        self.world.replace_zone(scene_id, zone)
    }

    fn is_animating(&self, entity_id: &str) -> bool {
        self.animating.lock().contains(entity_id)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    AddGlyph {
        layer: String,
        element: ElementId,
        glyph: GlyphSpec,
    },
    Tween {
        element: ElementId,
        target: TweenTarget,
    },
    Remove {
        layer: String,
        element: ElementId,
    },
    Pan {
        to: Point,
        scale: f32,
        duration: Duration,
    },
}

/// Records every call; tweens and pans complete immediately.
#[derive(Debug)]
pub struct RecordingRenderer {
    ops: Mutex<Vec<RenderOp>>,
    next_element: AtomicU64,
    scale: f32,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::with_scale(1.0)
    }
}

impl RecordingRenderer {
    pub fn with_scale(scale: f32) -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            next_element: AtomicU64::new(1),
            scale,
        }
    }

    pub fn ops(&self) -> Vec<RenderOp> {
        self.ops.lock().clone()
    }

    pub fn pans(&self) -> Vec<Point> {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                RenderOp::Pan { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    /// Texts of every glyph added so far.
    pub fn glyphs(&self) -> Vec<String> {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                RenderOp::AddGlyph { glyph, .. } => Some(glyph.text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn removed_count(&self) -> usize {
        self.ops
            .lock()
            .iter()
            .filter(|op| matches!(op, RenderOp::Remove { .. }))
            .count()
    }
}

#[async_trait]
impl Renderer for RecordingRenderer {
    fn add_glyph(&self, layer: &str, glyph: GlyphSpec) -> ElementId {
        let element = self.next_element.fetch_add(1, Ordering::SeqCst);
        self.ops.lock().push(RenderOp::AddGlyph {
            layer: layer.to_string(),
            element,
            glyph,
        });
        element
    }

    fn remove_element(&self, layer: &str, element: ElementId) {
        self.ops.lock().push(RenderOp::Remove {
            layer: layer.to_string(),
            element,
        });
    }

    async fn tween(&self, element: ElementId, target: TweenTarget) {
        self.ops.lock().push(RenderOp::Tween { element, target });
    }

    fn view_scale(&self) -> f32 {
        self.scale
    }

    async fn animate_pan(&self, to: Point, scale: f32, duration: Duration) {
        self.ops.lock().push(RenderOp::Pan {
            to,
            scale,
            duration,
        });
    }
}

// ---------------------------------------------------------------------------
// Sound, scripts, notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingSound {
    played: Mutex<Vec<(String, f32)>>,
}

impl RecordingSound {
    pub fn played(&self) -> Vec<(String, f32)> {
        self.played.lock().clone()
    }
}

#[async_trait]
impl SoundPlayer for RecordingSound {
    async fn play(&self, asset: &str, volume: f32) -> Result<()> {
        self.played.lock().push((asset.to_string(), volume));
        Ok(())
    }
}

/// A script that counts its executions.
#[derive(Debug, Default)]
pub struct CountingScript {
    runs: AtomicU32,
}

impl CountingScript {
    pub fn runs(&self) -> u32 {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Script for CountingScript {
    async fn execute(&self) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryScripts {
    scripts: Mutex<HashMap<String, Arc<CountingScript>>>,
}

impl MemoryScripts {
    /// Register a script under `id` and return a handle for inspection.
    pub fn register(&self, id: impl Into<String>) -> Arc<CountingScript> {
        let script = Arc::new(CountingScript::default());
        self.scripts.lock().insert(id.into(), script.clone());
        script
    }

    pub fn remove(&self, id: &str) {
        self.scripts.lock().remove(id);
    }
}

impl ScriptEngine for MemoryScripts {
    fn resolve(&self, script_id: &str) -> Option<Arc<dyn Script>> {
        self.scripts
            .lock()
            .get(script_id)
            .map(|s| s.clone() as Arc<dyn Script>)
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        log::error!("[tripwire] {}", message);
        self.errors.lock().push(message.to_string());
    }
}

// ---------------------------------------------------------------------------
// Peer bundle
// ---------------------------------------------------------------------------

/// One in-memory peer: typed handles to every double plus the trait bundle.
#[derive(Clone)]
pub struct MemoryPeer {
    pub host: Arc<MemoryHost>,
    pub renderer: Arc<RecordingRenderer>,
    pub sound: Arc<RecordingSound>,
    pub scripts: Arc<MemoryScripts>,
    pub notifier: Arc<RecordingNotifier>,
}

impl MemoryPeer {
    pub fn new(world: Arc<MemoryWorld>, viewed: Option<&str>) -> Self {
        Self {
            host: Arc::new(MemoryHost::new(world, viewed)),
            renderer: Arc::new(RecordingRenderer::default()),
            sound: Arc::new(RecordingSound::default()),
            scripts: Arc::new(MemoryScripts::default()),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            host: self.host.clone(),
            renderer: self.renderer.clone(),
            sound: self.sound.clone(),
            scripts: self.scripts.clone(),
            notifier: self.notifier.clone(),
        }
    }
}
