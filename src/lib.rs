//! Tripwire
//!
//! One-shot trigger zones on a shared 2D map. When a token's move crosses an
//! un-fired zone, the session pauses, every connected peer pans to the spot
//! and plays the zone's reaction, and the zone is marked fired for good.
//!
//! ## Architecture
//!
//! ```text
//! SessionContext  (session.rs)            ← one per active scene
//!   ├── MoveCoordinator  (coordinator.rs) ← mover side
//!   │     ├── PositionCache  (cache.rs)
//!   │     ├── evaluate       (evaluator.rs) → geometry.rs, zone.rs
//!   │     └── BroadcastChannel (channel.rs) ──publish──┐
//!   └── LocalEffectExecutor  (effects.rs)  ◀─subscribe─┘  every peer
//!         └── reaction.rs (glyph tween sequence + sound)
//! ```
//!
//! Host collaborators (entities, rendering, audio, scripts) are traits in
//! `host.rs`; `memory.rs` provides in-process implementations.

// Pure model and protocol types are always available.
pub mod error;
pub mod evaluator;
pub mod geometry;
pub mod policy;
pub mod protocol;
pub mod settings;
pub mod types;
pub mod zone;

// Async pipeline modules require the `runtime` feature.
#[cfg(feature = "runtime")]
pub mod cache;
#[cfg(feature = "runtime")]
pub mod channel;
#[cfg(feature = "runtime")]
pub mod coordinator;
#[cfg(feature = "runtime")]
pub mod effects;
#[cfg(feature = "runtime")]
pub mod host;
#[cfg(feature = "runtime")]
pub mod memory;
#[cfg(feature = "runtime")]
pub mod reaction;
#[cfg(feature = "runtime")]
pub mod session;
#[cfg(feature = "runtime")]
pub mod wait;

// Convenience re-exports (runtime only)
#[cfg(feature = "runtime")]
pub use channel::{BroadcastChannel, LocalHub, LocalTransport, Transport};
#[cfg(feature = "runtime")]
pub use coordinator::{MoveCoordinator, MoveOutcome};
#[cfg(feature = "runtime")]
pub use effects::{EffectOutcome, LocalEffectExecutor};
#[cfg(feature = "runtime")]
pub use session::{SessionContext, SessionOptions};
pub use error::{Result, TripwireError};
pub use protocol::TriggerEvent;
pub use settings::{DispositionAllowlist, TripwireSettings};
pub use types::{EntitySnapshot, MoveUpdate, Point, Rect, Role};
pub use zone::{ReactionType, Zone};
