//! Core map types shared across all modules.

use serde::{Deserialize, Serialize};

pub type EntityId = String;
pub type SceneId = String;
pub type ZoneId = String;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

/// A point in map units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Offset this point by half of `size` (top-left corner → centre).
    pub fn centred(self, size: Size) -> Self {
        Self::new(self.x + size.width / 2.0, self.y + size.height / 2.0)
    }

    pub fn rounded(self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// A width/height pair in map units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// The four edges, clockwise from the top edge.
    pub fn edges(&self) -> [(Point, Point); 4] {
        let tl = Point::new(self.x, self.y);
        let tr = Point::new(self.max_x(), self.y);
        let br = Point::new(self.max_x(), self.max_y());
        let bl = Point::new(self.x, self.max_y());
        [(tl, tr), (tr, br), (br, bl), (bl, tl)]
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.0},{:.0} {:.0}x{:.0}]",
            self.x, self.y, self.width, self.height
        )
    }
}

// ---------------------------------------------------------------------------
// Moving entities
// ---------------------------------------------------------------------------

/// Friendliness classification of a token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Hostile,
    Neutral,
    Friendly,
}

/// Token footprint in grid cells.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Footprint {
    pub width: f32,
    pub height: f32,
}

impl Footprint {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Footprint converted to map units.
    pub fn size(&self, grid_size: f32) -> Size {
        Size::new(self.width * grid_size, self.height * grid_size)
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// Read-only view of a token at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub scene_id: SceneId,
    /// Top-left corner in map units.
    pub position: Point,
    #[serde(default)]
    pub footprint: Footprint,
    pub disposition: Disposition,
}

impl EntitySnapshot {
    /// Centre of the token in map units.
    pub fn centre(&self, grid_size: f32) -> Point {
        self.position.centred(self.footprint.size(grid_size))
    }
}

/// The fields a host update actually touched. `None` means "unchanged".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PositionChange {
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

impl PositionChange {
    pub fn to(point: Point) -> Self {
        Self {
            x: Some(point.x),
            y: Some(point.y),
        }
    }

    pub fn is_move(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }
}

/// A "move happened" notification from the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveUpdate {
    /// Entity state after the move.
    pub entity: EntitySnapshot,
    pub change: PositionChange,
    /// Whether the user of this peer made the move.
    pub initiated_locally: bool,
}

// ---------------------------------------------------------------------------
// Scenes & roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneInfo {
    pub id: SceneId,
    /// Size of one grid cell in map units.
    pub grid_size: f32,
}

/// Which side of the session this peer plays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The single peer allowed to commit zone state and pause the session.
    Authoritative,
    Follower,
}

impl Role {
    pub fn is_authoritative(&self) -> bool {
        matches!(self, Role::Authoritative)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Authoritative => f.write_str("authoritative"),
            Role::Follower => f.write_str("follower"),
        }
    }
}
