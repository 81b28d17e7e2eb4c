//! tripwire-sim binary
//!
//! Runs a scripted multi-peer session in-process: every peer gets its own
//! host view, effect executor and coordinator, all wired to one in-memory
//! broadcast hub. Prints the final zone state and what each peer saw.
//!
//! ## Configuration (env / TOML via `config` crate)
//!
//! | Key                              | Default     | Description                        |
//! |----------------------------------|-------------|------------------------------------|
//! | `TRIPWIRE_SCENARIO`              | *(required)*| Scenario JSON file                 |
//! | `TRIPWIRE_SETTINGS`              | *(none)*    | Settings TOML file                 |
//! | `TRIPWIRE_SETTLE_TIMEOUT_MS`     | `20000`     | Movement-settle polling ceiling    |
//! | `TRIPWIRE_DRAIN_MS`              | `100`       | Wait for peers after each move     |
//! | `TRIPWIRE_DISPOSITION_ALLOWLIST` | `friendly`  | Any settings key, see `settings`   |

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tripwire::memory::{MemoryPeer, MemoryWorld};
use tripwire::settings::{CoordinatorConfig, TripwireSettings};
use tripwire::types::{EntitySnapshot, MoveUpdate, Point, PositionChange, Role};
use tripwire::zone::{self, Zone};
use tripwire::{LocalHub, MoveOutcome, SessionContext, SessionOptions};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "tripwire-sim", about = "Tripwire session simulator", version)]
struct Args {
    /// Scenario JSON file
    #[arg(long, env = "TRIPWIRE_SCENARIO")]
    scenario: PathBuf,

    /// Settings TOML file (keys may also come from TRIPWIRE_* env vars)
    #[arg(long, env = "TRIPWIRE_SETTINGS")]
    settings: Option<PathBuf>,

    /// Ceiling for the movement-settle poll (ms)
    #[arg(long, env = "TRIPWIRE_SETTLE_TIMEOUT_MS", default_value_t = 20_000)]
    settle_timeout_ms: u64,

    /// Time given to peers to process broadcasts after each move (ms)
    #[arg(long, env = "TRIPWIRE_DRAIN_MS", default_value_t = 100)]
    drain_ms: u64,
}

// ---------------------------------------------------------------------------
// Scenario file
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Scenario {
    scenes: Vec<SceneSpec>,
    peers: Vec<PeerSpec>,
    #[serde(default)]
    moves: Vec<MoveSpec>,
}

#[derive(Debug, Deserialize)]
struct SceneSpec {
    id: String,
    grid_size: f32,
    #[serde(default)]
    zones: Vec<Zone>,
}

#[derive(Debug, Deserialize)]
struct PeerSpec {
    id: String,
    role: Role,
    viewing: String,
}

#[derive(Debug, Deserialize)]
struct MoveSpec {
    /// Peer whose user makes the move.
    peer: String,
    from: Point,
    entity: EntitySnapshot,
}

struct Peer {
    id: String,
    doubles: MemoryPeer,
    session: SessionContext,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tripwire=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let settings = TripwireSettings::load(args.settings.as_deref())
        .context("Failed to load tripwire settings")?;
    let raw = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("Failed to read scenario {}", args.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw).context("Invalid scenario JSON")?;

    tracing::info!(
        scenes = scenario.scenes.len(),
        peers = scenario.peers.len(),
        moves = scenario.moves.len(),
        "Starting tripwire-sim"
    );

    tokio::select! {
        result = run(scenario, settings, &args) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("tripwire-sim interrupted (SIGINT)");
            Ok(())
        }
    }
}

async fn run(scenario: Scenario, settings: TripwireSettings, args: &Args) -> Result<()> {
    let world = MemoryWorld::new();
    for scene in &scenario.scenes {
        world.add_scene(scene.id.clone(), scene.grid_size);
        for zone in &scene.zones {
            world.add_zone(&scene.id, zone.clone())?;
        }
    }

    let hub = LocalHub::new();
    let mut options = SessionOptions::new(Role::Follower, settings);
    options.coordinator = CoordinatorConfig {
        settle_timeout: Duration::from_millis(args.settle_timeout_ms),
        ..CoordinatorConfig::default()
    };

    let mut peers = Vec::with_capacity(scenario.peers.len());
    for seat in &scenario.peers {
        let doubles = MemoryPeer::new(world.clone(), Some(seat.viewing.as_str()));
        let session = SessionContext::activate(
            seat.viewing.clone(),
            SessionOptions {
                role: seat.role,
                ..options.clone()
            },
            doubles.collaborators(),
            Arc::new(hub.connect(seat.id.clone())),
        )
        .with_context(|| format!("Failed to start peer {}", seat.id))?;
        peers.push(Peer {
            id: seat.id.clone(),
            doubles,
            session,
        });
    }

    for mv in &scenario.moves {
        let Some(mover) = peers.iter().find(|p| p.id == mv.peer) else {
            bail!("Move references unknown peer {}", mv.peer);
        };

        let mut before = mv.entity.clone();
        before.position = mv.from;
        for peer in &peers {
            peer.session.on_pre_move(&before);
        }

        // The host notifies every peer; only the mover's coordinator acts.
        for peer in &peers {
            let update = MoveUpdate {
                entity: mv.entity.clone(),
                change: PositionChange::to(mv.entity.position),
                initiated_locally: peer.id == mover.id,
            };
            if let Some(outcome) = peer.session.on_move(&update).await {
                if peer.id == mover.id {
                    report_outcome(&peer.id, &mv.entity.id, &outcome);
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(args.drain_ms)).await;
    }

    println!("== zones");
    for scene in &scenario.scenes {
        for z in world.zones(&scene.id) {
            println!(
                "{}/{} {} triggered={} commits={}",
                scene.id,
                z.id_str(),
                z.bounds,
                zone::is_fired(&z),
                world.commit_count(z.id_str())
            );
        }
    }
    println!("paused={}", world.is_paused());

    println!("== peers");
    for peer in &peers {
        let pans: Vec<String> = peer
            .doubles
            .renderer
            .pans()
            .iter()
            .map(|p| p.to_string())
            .collect();
        println!(
            "{} applied={} pans=[{}] glyphs={:?} sounds={:?} notices={:?}",
            peer.id,
            peer.session.executor().applied_count(),
            pans.join(", "),
            peer.doubles.renderer.glyphs(),
            peer.doubles.sound.played(),
            peer.doubles.notifier.errors(),
        );
    }

    for peer in peers {
        peer.session.teardown();
    }
    hub.shutdown();
    Ok(())
}

fn report_outcome(peer: &str, entity: &str, outcome: &MoveOutcome) {
    match outcome {
        MoveOutcome::Triggered(event) => println!(
            "{}: {} tripped zone {} at {}",
            peer, entity, event.zone_id, event.position
        ),
        MoveOutcome::NotTriggered => println!("{}: {} moved, nothing tripped", peer, entity),
        MoveOutcome::Skipped(reason) => println!("{}: {} skipped ({:?})", peer, entity, reason),
        MoveOutcome::Failed => println!("{}: {} failed (see log)", peer, entity),
    }
}
