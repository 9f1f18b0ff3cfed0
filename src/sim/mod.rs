//! Game rules on top of an injected physics engine
//!
//! Everything here is deterministic given a seed and an event sequence:
//! - Seeded RNG only
//! - Virtual millisecond clock, no wall time
//! - Stable iteration order (by body handle, then input order)
//! - No rendering or platform dependencies
//!
//! The engine owns positions and contacts. This module owns tiers, the drop
//! gate, merges, scoring and game over.

pub mod drop;
pub mod game;
pub mod merge;
pub mod registry;
pub mod score;
pub mod settle;
pub mod state;
pub mod tiers;
pub mod timers;
pub mod world;

pub use drop::{DropController, DroppedPiece, choose_initial_tier};
pub use game::{FATAL_NOTICE, GameConfig, Host, InitError, MonsterGame};
pub use merge::{MergeEvent, resolve_collisions};
pub use registry::{BodyRegistry, Origin, PieceEntry};
pub use score::{ScoreUpdate, Scoreboard};
pub use settle::SettleVerdict;
pub use state::{GameState, PendingDrop};
pub use tiers::{TIER_COUNT, TIERS, Tier, TierSpec, Visual, next_tier, tier_of};
pub use timers::{Scheduler, TimerId, TimerTask};
pub use world::{
    BodyHandle, BodyState, CollisionPair, Material, MemoryBody, MemoryWorld, PhysicsWorld,
    PieceSpawn, StaticShape,
};
